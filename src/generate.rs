//! Generation entry points: one upload in, a set of content angles out.
//!
//! The flow of a run is:
//!
//! ```text
//! resolve client ─▶ extract ─▶ product context ─▶ one call ─▶ sanitize ─▶ parse ─▶ attach context
//!   (no call)      (pdfium)    (detect if dynamic)
//! ```
//!
//! Every failure ends the run with a [`CopyGenError`]; no partial result is
//! ever returned. Callers that want the `{"error": ...}` shape convert with
//! [`crate::output::Outcome::from`].

use crate::config::GenerationConfig;
use crate::detect::detect_product_info;
use crate::error::CopyGenError;
use crate::output::{ContentAngle, ContextKind, GenerationResult};
use crate::pipeline::extract::SourceContent;
use crate::pipeline::input::{self, UploadKind};
use crate::pipeline::llm::{self, ModelClient, ModelRequest, TaskPayload};
use crate::pipeline::sanitize::sanitize_response;
use crate::pipeline::{encode, render};
use crate::product::{ProductContext, ProductMode, PromptStrategy};
use crate::progress::GenerationStage;
use crate::prompts;
use serde::Deserialize;
use std::io::Write;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Generate content angles from already-extracted source material.
///
/// This is the core entry point; [`generate_file`] and
/// [`generate_from_bytes`] extract first and then call it.
///
/// # Errors
/// - [`CopyGenError::EmptyDocument`] for blank text or an empty page list
///   (before any call)
/// - configuration errors when no client can be built (before any call)
/// - [`CopyGenError::Transport`] when the call fails
/// - [`CopyGenError::EmptyResponse`] / [`CopyGenError::MalformedResponse`]
///   when the reply cannot be turned into angles
pub async fn generate_content(
    source: SourceContent,
    mode: ProductMode,
    config: &GenerationConfig,
) -> Result<GenerationResult, CopyGenError> {
    let outcome = generate_from_source(source, mode, config).await;
    report(config, outcome)
}

/// Generate from a local PDF or image. The kind is sniffed from magic bytes.
pub async fn generate_file(
    path: impl AsRef<Path>,
    mode: ProductMode,
    config: &GenerationConfig,
) -> Result<GenerationResult, CopyGenError> {
    let path = path.as_ref();
    info!("Starting generation: {}", path.display());
    let outcome = generate_from_path(path, mode, config).await;
    report(config, outcome)
}

/// Generate from upload bytes held in memory.
///
/// Images are encoded directly. PDF bytes are written to a managed
/// [`tempfile`] for pdfium and removed when this returns.
pub async fn generate_from_bytes(
    bytes: &[u8],
    mode: ProductMode,
    config: &GenerationConfig,
) -> Result<GenerationResult, CopyGenError> {
    let outcome = generate_from_upload(bytes, mode, config).await;
    report(config, outcome)
}

/// Synchronous wrapper around [`generate_file`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_sync(
    path: impl AsRef<Path>,
    mode: ProductMode,
    config: &GenerationConfig,
) -> Result<GenerationResult, CopyGenError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| CopyGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_file(path, mode, config))
}

/// Write a result as pretty JSON.
///
/// Uses atomic write (temp file + rename) so a reader never sees half a file.
pub async fn write_result(
    result: &GenerationResult,
    output_path: impl AsRef<Path>,
) -> Result<(), CopyGenError> {
    let path = output_path.as_ref();
    let json = serde_json::to_string_pretty(result)
        .map_err(|e| CopyGenError::Internal(format!("Failed to serialise result: {e}")))?;

    let write_err = |source: std::io::Error| CopyGenError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("json.tmp");
    tokio::fs::write(&tmp_path, json).await.map_err(write_err)?;
    tokio::fs::rename(&tmp_path, path).await.map_err(write_err)?;
    Ok(())
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn generate_from_source(
    source: SourceContent,
    mode: ProductMode,
    config: &GenerationConfig,
) -> Result<GenerationResult, CopyGenError> {
    let client = llm::resolve_client(config)?;
    run_generation(client.as_ref(), source, mode, config).await
}

async fn generate_from_path(
    path: &Path,
    mode: ProductMode,
    config: &GenerationConfig,
) -> Result<GenerationResult, CopyGenError> {
    let client = llm::resolve_client(config)?;
    config.notify(|cb| cb.on_stage(GenerationStage::Extracting));

    let resolved = input::resolve_local(path)?;
    let source = match resolved.kind {
        UploadKind::Pdf => render::extract_pdf(&resolved.path, config).await?,
        UploadKind::Image => {
            let bytes = tokio::fs::read(&resolved.path).await.map_err(|e| {
                CopyGenError::Internal(format!("Failed to read {}: {e}", path.display()))
            })?;
            SourceContent::SingleImage(encode::encode_upload(&bytes)?)
        }
    };

    run_generation(client.as_ref(), source, mode, config).await
}

async fn generate_from_upload(
    bytes: &[u8],
    mode: ProductMode,
    config: &GenerationConfig,
) -> Result<GenerationResult, CopyGenError> {
    let client = llm::resolve_client(config)?;
    config.notify(|cb| cb.on_stage(GenerationStage::Extracting));

    let source = match input::sniff_upload(bytes)? {
        UploadKind::Image => SourceContent::SingleImage(encode::encode_upload(bytes)?),
        UploadKind::Pdf => {
            let mut tmp = tempfile::NamedTempFile::new()
                .map_err(|e| CopyGenError::Internal(format!("tempfile: {e}")))?;
            tmp.write_all(bytes)
                .map_err(|e| CopyGenError::Internal(format!("tempfile write: {e}")))?;
            // `tmp` is dropped (and the file deleted) once extraction returns.
            render::extract_pdf(tmp.path(), config).await?
        }
    };

    run_generation(client.as_ref(), source, mode, config).await
}

async fn run_generation(
    client: &dyn ModelClient,
    source: SourceContent,
    mode: ProductMode,
    config: &GenerationConfig,
) -> Result<GenerationResult, CopyGenError> {
    let start = Instant::now();
    if source.is_empty() {
        return Err(CopyGenError::EmptyDocument);
    }

    let product_context = resolve_context(client, &source, mode, config).await;
    config.notify(|cb| cb.on_product_resolved(&product_context));

    let count = angle_count(&source, config);
    let request = ModelRequest {
        persona: prompts::persona(&product_context),
        task: generation_task(&source, count, config),
        max_tokens: config.max_tokens,
        temperature: config.temperature,
    };

    config.notify(|cb| cb.on_stage(GenerationStage::Generating));
    debug!(
        "Generation request: {:?} source, {} angles, {} images",
        source.kind(),
        count,
        request.task.images().len()
    );
    let raw = client.complete(&request).await?;
    let angles = parse_angles(&raw)?;
    if angles.len() != count {
        debug!("Model returned {} angles, {} requested", angles.len(), count);
    }

    let (raw_context, context_kind, media_type) = retain_context(source)?;
    info!(
        "Generated {} angles in {:?}",
        angles.len(),
        start.elapsed()
    );

    Ok(GenerationResult {
        angles,
        raw_context: Some(raw_context),
        context_kind,
        media_type,
        product_context,
    })
}

/// Decide the product context for a run.
///
/// Only the dynamic strategy without a pinned product makes a detection call.
async fn resolve_context(
    client: &dyn ModelClient,
    source: &SourceContent,
    mode: ProductMode,
    config: &GenerationConfig,
) -> ProductContext {
    match (config.strategy, mode) {
        (PromptStrategy::Dynamic, ProductMode::Auto) => {
            config.notify(|cb| cb.on_stage(GenerationStage::Detecting));
            ProductContext::detected(detect_product_info(client, source, config).await)
        }
        (_, mode) => ProductContext::catalog(mode),
    }
}

fn angle_count(source: &SourceContent, config: &GenerationConfig) -> usize {
    match source {
        SourceContent::SingleImage(_) => config.image_angle_count,
        SourceContent::PlainText(_) | SourceContent::MultiPageImage(_) => {
            config.document_angle_count
        }
    }
}

fn generation_task(source: &SourceContent, count: usize, config: &GenerationConfig) -> TaskPayload {
    match source {
        SourceContent::PlainText(text) => TaskPayload::Text(prompts::document_text_task(
            text,
            config.document_text_limit,
            count,
        )),
        SourceContent::SingleImage(image) => TaskPayload::Multimodal {
            text: prompts::image_task(count),
            images: vec![image.clone()],
        },
        SourceContent::MultiPageImage(pages) => TaskPayload::Multimodal {
            text: prompts::document_task(count),
            images: pages.clone(),
        },
    }
}

#[derive(Deserialize)]
struct AnglesEnvelope {
    #[serde(alias = "angles")]
    contents: Vec<ContentAngle>,
}

/// Turn a raw reply into angles, in the model's order.
pub(crate) fn parse_angles(raw: &str) -> Result<Vec<ContentAngle>, CopyGenError> {
    let body = sanitize_response(Some(raw)).ok_or(CopyGenError::EmptyResponse)?;
    let envelope: AnglesEnvelope =
        serde_json::from_str(&body).map_err(|e| CopyGenError::MalformedResponse {
            detail: e.to_string(),
        })?;
    if envelope.contents.is_empty() {
        return Err(CopyGenError::MalformedResponse {
            detail: "response contained no content angles".to_string(),
        });
    }
    Ok(envelope.contents)
}

/// What a result keeps for later regeneration.
///
/// Scanned documents keep their first rendered page.
fn retain_context(
    source: SourceContent,
) -> Result<(String, ContextKind, Option<String>), CopyGenError> {
    Ok(match source {
        SourceContent::PlainText(text) => (text, ContextKind::Text, None),
        SourceContent::SingleImage(image) => (image.data, ContextKind::Image, Some(image.mime_type)),
        SourceContent::MultiPageImage(pages) => {
            let first = pages.into_iter().next().ok_or(CopyGenError::EmptyDocument)?;
            (first.data, ContextKind::ScannedPdf, Some(first.mime_type))
        }
    })
}

fn report(
    config: &GenerationConfig,
    outcome: Result<GenerationResult, CopyGenError>,
) -> Result<GenerationResult, CopyGenError> {
    match &outcome {
        Ok(result) => config.notify(|cb| cb.on_complete(result.angles.len())),
        Err(e) => config.notify(|cb| cb.on_error(&e.to_string())),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::encode::EncodedImage;

    #[test]
    fn parse_accepts_fenced_contents() {
        let raw = "```json\n{\"contents\":[{\"angulo\":\"A\",\"instagram\":\"i\",\"linkedin\":\"l\"}]}\n```";
        let angles = parse_angles(raw).unwrap();
        assert_eq!(angles.len(), 1);
        assert_eq!(angles[0].angle_label, "A");
    }

    #[test]
    fn parse_accepts_angles_key() {
        let raw = r#"{"angles":[{"angulo":"A","instagram":"i","linkedin":"l"},{"angulo":"B","instagram":"i","linkedin":"l"}]}"#;
        let labels: Vec<_> = parse_angles(raw)
            .unwrap()
            .into_iter()
            .map(|a| a.angle_label)
            .collect();
        assert_eq!(labels, vec!["A", "B"]);
    }

    #[test]
    fn empty_reply_is_distinct_from_bad_json() {
        assert!(matches!(parse_angles("  "), Err(CopyGenError::EmptyResponse)));
        assert!(matches!(
            parse_angles("{\"contents\": [oops"),
            Err(CopyGenError::MalformedResponse { .. })
        ));
        assert!(matches!(
            parse_angles("{\"contents\": []}"),
            Err(CopyGenError::MalformedResponse { .. })
        ));
    }

    #[test]
    fn scanned_source_keeps_first_page() {
        let pages = vec![
            EncodedImage::new("first", "image/png"),
            EncodedImage::new("second", "image/png"),
        ];
        let (raw, kind, media) = retain_context(SourceContent::MultiPageImage(pages)).unwrap();
        assert_eq!(raw, "first");
        assert_eq!(kind, ContextKind::ScannedPdf);
        assert_eq!(media.as_deref(), Some("image/png"));
    }

    #[test]
    fn angle_counts_follow_source_kind() {
        let config = GenerationConfig::default();
        let img = EncodedImage::new("x", "image/jpeg");
        assert_eq!(angle_count(&SourceContent::SingleImage(img.clone()), &config), 3);
        assert_eq!(angle_count(&SourceContent::MultiPageImage(vec![img]), &config), 5);
        assert_eq!(angle_count(&SourceContent::PlainText("t".into()), &config), 5);
    }

    #[tokio::test]
    async fn write_result_is_atomic_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("result.json");
        let result = GenerationResult {
            angles: vec![ContentAngle {
                angle_label: "A".into(),
                instagram_text: "i".into(),
                linkedin_text: "l".into(),
            }],
            raw_context: Some("texto".into()),
            context_kind: ContextKind::Text,
            media_type: None,
            product_context: ProductContext::catalog(ProductMode::Auto),
        };
        write_result(&result, &path).await.unwrap();
        let back: GenerationResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, result);
        assert!(!path.with_extension("json.tmp").exists());
    }
}
