//! Targeted regeneration: rewrite one platform's text for one angle.
//!
//! A rewrite reuses exactly what the original run used. The persona comes
//! from the result's stored [`ProductContext`] through the same
//! [`prompts::persona`] call, and the source material is the result's
//! retained context. Nothing is re-detected.

use crate::config::GenerationConfig;
use crate::error::CopyGenError;
use crate::output::{ContentAngle, ContextKind, GenerationResult, Platform, Regenerated, RetainedContext};
use crate::pipeline::encode::EncodedImage;
use crate::pipeline::llm::{self, ModelRequest, TaskPayload};
use crate::pipeline::sanitize::sanitize_response;
use crate::product::ProductContext;
use crate::progress::GenerationStage;
use crate::prompts;
use tracing::info;

/// Rewrite the `platform` text of the angle labelled `angle_label`.
///
/// Makes exactly one model call. The caller decides where the new text goes;
/// see [`regenerate_angle`] for the in-place variant.
pub async fn regenerate(
    context: &RetainedContext<'_>,
    angle_label: &str,
    platform: Platform,
    product_context: &ProductContext,
    config: &GenerationConfig,
) -> Result<Regenerated, CopyGenError> {
    let client = llm::resolve_client(config)?;
    config.notify(|cb| cb.on_stage(GenerationStage::Regenerating));

    let request = ModelRequest {
        persona: prompts::persona(product_context),
        task: regeneration_payload(context, angle_label, platform, config),
        max_tokens: config.regeneration_max_tokens,
        temperature: config.temperature,
    };

    let raw = client.complete(&request).await?;
    let regenerated = parse_regenerated(&raw)?;
    info!(
        "Regenerated {} text for \"{}\" ({} chars)",
        platform,
        angle_label,
        regenerated.new_text.chars().count()
    );
    Ok(regenerated)
}

/// Regenerate one platform of `result.angles[angle_index]` in place.
///
/// Only that one text changes: the sibling platform and every other angle
/// are left as they were. On error `result` is untouched.
pub async fn regenerate_angle<'r>(
    result: &'r mut GenerationResult,
    angle_index: usize,
    platform: Platform,
    config: &GenerationConfig,
) -> Result<&'r ContentAngle, CopyGenError> {
    match rewrite_in_place(result, angle_index, platform, config).await {
        Ok(angle) => {
            config.notify(|cb| cb.on_complete(1));
            Ok(angle)
        }
        Err(e) => {
            config.notify(|cb| cb.on_error(&e.to_string()));
            Err(e)
        }
    }
}

async fn rewrite_in_place<'r>(
    result: &'r mut GenerationResult,
    angle_index: usize,
    platform: Platform,
    config: &GenerationConfig,
) -> Result<&'r ContentAngle, CopyGenError> {
    let total = result.angles.len();
    if angle_index >= total {
        return Err(CopyGenError::AngleOutOfRange {
            index: angle_index,
            total,
        });
    }

    let regenerated = {
        let context = result
            .retained_context()
            .filter(|c| !c.raw.is_empty())
            .ok_or(CopyGenError::RegenerationUnavailable)?;
        regenerate(
            &context,
            &result.angles[angle_index].angle_label,
            platform,
            &result.product_context,
            config,
        )
        .await?
    };

    let angle = &mut result.angles[angle_index];
    angle.set_text(platform, regenerated.new_text);
    Ok(angle)
}

/// Text contexts are inlined; image contexts travel as a high-detail image.
fn regeneration_payload(
    context: &RetainedContext<'_>,
    angle_label: &str,
    platform: Platform,
    config: &GenerationConfig,
) -> TaskPayload {
    match context.kind {
        ContextKind::Text => TaskPayload::Text(prompts::regeneration_text_task(
            context.raw,
            config.regeneration_text_limit,
            platform,
            angle_label,
        )),
        ContextKind::Image | ContextKind::ScannedPdf => {
            let mime = context
                .media_type
                .unwrap_or(default_media_type(context.kind));
            TaskPayload::Multimodal {
                text: prompts::regeneration_task(platform, angle_label),
                images: vec![EncodedImage::new(context.raw, mime)],
            }
        }
    }
}

fn default_media_type(kind: ContextKind) -> &'static str {
    match kind {
        ContextKind::ScannedPdf => "image/png",
        _ => "image/jpeg",
    }
}

fn parse_regenerated(raw: &str) -> Result<Regenerated, CopyGenError> {
    let body = sanitize_response(Some(raw)).ok_or(CopyGenError::EmptyResponse)?;
    let regenerated: Regenerated =
        serde_json::from_str(&body).map_err(|e| CopyGenError::MalformedResponse {
            detail: e.to_string(),
        })?;
    if regenerated.new_text.trim().is_empty() {
        return Err(CopyGenError::EmptyResponse);
    }
    Ok(regenerated)
}
