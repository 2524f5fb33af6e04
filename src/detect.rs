//! Product detection: a cheap call that names the product in a source.
//!
//! Detection only feeds the dynamic persona, so it never fails a run. Any
//! problem (transport, empty reply, bad JSON, blank fields) is logged and
//! papered over with [`ProductDescriptor::fallback`], field by field.

use crate::config::GenerationConfig;
use crate::pipeline::encode::ImageDetail;
use crate::pipeline::extract::SourceContent;
use crate::pipeline::llm::{ModelClient, ModelRequest, TaskPayload};
use crate::pipeline::sanitize::sanitize_response;
use crate::product::ProductDescriptor;
use crate::prompts;
use serde_json::Value;
use tracing::{debug, info, warn};

/// Identify the product in `source`. Never fails.
pub async fn detect_product_info(
    client: &dyn ModelClient,
    source: &SourceContent,
    config: &GenerationConfig,
) -> ProductDescriptor {
    let request = detection_request(source, config);

    let raw = match client.complete(&request).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Product detection call failed, using fallback: {}", e);
            return ProductDescriptor::fallback();
        }
    };

    let descriptor = parse_descriptor(&raw);
    info!(
        "Detected product: {} ({}, {})",
        descriptor.name, descriptor.brand, descriptor.category
    );
    descriptor
}

/// Text sources send an excerpt; image sources resend the first image at low detail.
fn detection_request(source: &SourceContent, config: &GenerationConfig) -> ModelRequest {
    let task = match source {
        SourceContent::PlainText(text) => {
            TaskPayload::Text(prompts::detection_text_task(text, config.detection_text_limit))
        }
        SourceContent::SingleImage(_) | SourceContent::MultiPageImage(_) => {
            let images = source
                .first_image()
                .map(|img| vec![img.clone().with_detail(ImageDetail::Low)])
                .unwrap_or_default();
            TaskPayload::Multimodal {
                text: prompts::DETECTION_INSTRUCTION.to_string(),
                images,
            }
        }
    };

    ModelRequest {
        persona: prompts::DETECTION_PERSONA.to_string(),
        task,
        max_tokens: config.detection_max_tokens,
        temperature: 0.0,
    }
}

/// Parse a detection reply, substituting fallback values for anything unusable.
pub(crate) fn parse_descriptor(raw: &str) -> ProductDescriptor {
    let fallback = ProductDescriptor::fallback();

    let Some(body) = sanitize_response(Some(raw)) else {
        warn!("Product detection returned nothing, using fallback");
        return fallback;
    };

    let value: Value = match serde_json::from_str(&body) {
        Ok(v) => v,
        Err(e) => {
            warn!("Product detection reply is not JSON, using fallback: {}", e);
            return fallback;
        }
    };

    let field = |key: &str, default: String| -> String {
        match value.get(key).and_then(Value::as_str).map(str::trim) {
            Some(s) if !s.is_empty() => s.to_string(),
            _ => {
                debug!("Detection field '{}' missing, using fallback", key);
                default
            }
        }
    };

    ProductDescriptor {
        name: field("name", fallback.name.clone()),
        brand: field("brand", fallback.brand.clone()),
        category: field("category", fallback.category.clone()),
        differentiator: field("differentiator", fallback.differentiator.clone()),
    }
}
