//! Integration tests for the generation and regeneration pipeline.
//!
//! No network: every model call goes to a scripted [`ModelClient`] that
//! records the requests it receives and replays canned replies in order.
//! PDFs are stood in for by an in-memory [`PageSource`].

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_copygen::prompts;
use edgequake_copygen::{
    extract_source, generate_content, generate_from_bytes, regenerate_angle, ContextKind,
    CopyGenError, EncodedImage, ErrorKind, ExtractionPolicy, GenerationConfig,
    GenerationProgressCallback, GenerationStage, ImageDetail, ModelClient, ModelRequest, Outcome,
    PageSource, Platform, ProductCategory, ProductDescriptor, ProductMode, PromptStrategy,
    SourceContent, TaskPayload,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Replays canned replies and records every request.
struct ScriptedClient {
    replies: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<ModelRequest>>,
}

impl ScriptedClient {
    fn new(replies: Vec<Result<String, String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn replying(replies: &[&str]) -> Arc<Self> {
        Self::new(replies.iter().map(|r| Ok(r.to_string())).collect())
    }

    fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn complete(&self, request: &ModelRequest) -> Result<String, CopyGenError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(CopyGenError::Transport { message }),
            None => Err(CopyGenError::Transport {
                message: "script exhausted".into(),
            }),
        }
    }
}

/// In-memory document; empty strings stand for image-only pages.
struct MemoryPages(Vec<String>);

impl PageSource for MemoryPages {
    fn page_count(&self) -> usize {
        self.0.len()
    }

    fn page_text(&mut self, index: usize) -> Result<String, CopyGenError> {
        Ok(self.0[index].clone())
    }

    fn render_page(&mut self, index: usize) -> Result<EncodedImage, CopyGenError> {
        Ok(EncodedImage::new(format!("cGFnZS0{index}"), "image/png"))
    }
}

fn angles_reply(labels: &[&str]) -> String {
    let contents: Vec<_> = labels
        .iter()
        .map(|l| {
            serde_json::json!({
                "angulo": l,
                "instagram": format!("insta {l}"),
                "linkedin": format!("linkedin {l}"),
            })
        })
        .collect();
    format!(
        "```json\n{}\n```",
        serde_json::json!({ "contents": contents })
    )
}

fn config_with(client: &Arc<ScriptedClient>) -> GenerationConfig {
    GenerationConfig::builder()
        .client(client.clone())
        .build()
        .unwrap()
}

fn text_pdf() -> SourceContent {
    let pages = (1..=3)
        .map(|i| format!("pagina {i} {}", "x".repeat(190)))
        .collect();
    extract_source(&mut MemoryPages(pages), &ExtractionPolicy::default()).unwrap()
}

const JPEG_BYTES: [u8; 12] = [
    0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00, 0x01,
];

// ── Generation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn text_pdf_makes_one_text_call_and_keeps_joined_text() {
    let source = text_pdf();
    let SourceContent::PlainText(ref joined) = source else {
        panic!("expected text-bearing document, got {source:?}");
    };
    let joined = joined.clone();
    assert_eq!(joined.lines().count(), 3);

    let labels = ["A", "B", "C", "D", "E"];
    let client = ScriptedClient::replying(&[&angles_reply(&labels)]);
    let result = generate_content(source, ProductMode::Auto, &config_with(&client))
        .await
        .unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let TaskPayload::Text(ref task) = requests[0].task else {
        panic!("expected a text payload");
    };
    assert!(task.contains(&joined));
    assert!(task.contains("EXATAMENTE 5"));
    assert_eq!(requests[0].max_tokens, 4000);

    assert_eq!(result.context_kind, ContextKind::Text);
    assert_eq!(result.raw_context.as_deref(), Some(joined.as_str()));
    let got: Vec<_> = result.angles.iter().map(|a| a.angle_label.as_str()).collect();
    assert_eq!(got, labels);
}

#[tokio::test]
async fn jpeg_upload_is_sent_and_retained_as_the_same_base64() {
    let client = ScriptedClient::replying(&[&angles_reply(&["A", "B", "C"])]);
    let result = generate_from_bytes(&JPEG_BYTES, ProductMode::Auto, &config_with(&client))
        .await
        .unwrap();

    let b64 = STANDARD.encode(JPEG_BYTES);
    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let images = requests[0].task.images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].data, b64);
    assert_eq!(images[0].mime_type, "image/jpeg");
    assert_eq!(images[0].detail, ImageDetail::High);
    assert!(requests[0].task.text().contains("EXATAMENTE 3"));

    assert_eq!(result.context_kind, ContextKind::Image);
    assert_eq!(result.raw_context.as_deref(), Some(b64.as_str()));
    assert_eq!(result.media_type.as_deref(), Some("image/jpeg"));
}

#[tokio::test]
async fn scanned_pdf_sends_every_page_and_keeps_the_first() {
    let source = extract_source(
        &mut MemoryPages(vec![String::new(), "   ".into(), "logo".into()]),
        &ExtractionPolicy::default(),
    )
    .unwrap();

    let client = ScriptedClient::replying(&[&angles_reply(&["A"])]);
    let result = generate_content(source, ProductMode::Auto, &config_with(&client))
        .await
        .unwrap();

    let requests = client.requests();
    assert_eq!(requests[0].task.images().len(), 3);
    assert!(requests[0].task.text().contains("EXATAMENTE 5"));
    assert_eq!(result.context_kind, ContextKind::ScannedPdf);
    assert_eq!(result.raw_context.as_deref(), Some("cGFnZS00"));
}

#[tokio::test]
async fn catalog_strategy_never_detects() {
    let client = ScriptedClient::replying(&[&angles_reply(&["A"])]);
    let result = generate_content(
        text_pdf(),
        ProductMode::Fixed(ProductCategory::Treadmill),
        &config_with(&client),
    )
    .await
    .unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].persona.contains("ESTEIRA"));
    assert!(result.product_context.detected.is_none());
}

#[tokio::test]
async fn dynamic_strategy_with_pinned_product_uses_catalog_rules() {
    let client = ScriptedClient::replying(&[&angles_reply(&["A"])]);
    let config = GenerationConfig::builder()
        .client(client.clone())
        .strategy(PromptStrategy::Dynamic)
        .build()
        .unwrap();
    generate_content(
        text_pdf(),
        ProductMode::Fixed(ProductCategory::BodyScanner),
        &config,
    )
    .await
    .unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].persona.contains("SCANNER"));
}

#[tokio::test]
async fn dynamic_detection_failure_falls_back_and_generation_continues() {
    let client = ScriptedClient::new(vec![
        Err("connection reset".into()),
        Ok(angles_reply(&["A", "B"])),
    ]);
    let config = GenerationConfig::builder()
        .client(client.clone())
        .strategy(PromptStrategy::Dynamic)
        .build()
        .unwrap();

    let result = generate_content(text_pdf(), ProductMode::Auto, &config)
        .await
        .unwrap();

    assert_eq!(
        result.product_context.detected,
        Some(ProductDescriptor::fallback())
    );
    let requests = client.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].persona, prompts::DETECTION_PERSONA);
    assert!(requests[1].persona.contains("Generic"));
    assert_eq!(result.angles.len(), 2);
}

// ── Errors ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn missing_credentials_fail_before_any_work() {
    let config = GenerationConfig::default();
    let err = generate_content(text_pdf(), ProductMode::Auto, &config)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    let err = generate_from_bytes(b"not an upload", ProductMode::Auto, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, CopyGenError::MissingCredentials { .. }));
}

#[tokio::test]
async fn empty_and_unparseable_replies_are_distinct_errors() {
    let client = ScriptedClient::replying(&["   "]);
    let empty = generate_content(text_pdf(), ProductMode::Auto, &config_with(&client))
        .await
        .unwrap_err();
    assert_eq!(empty.kind(), ErrorKind::EmptyResponse);

    let client = ScriptedClient::replying(&["Claro! Aqui vai: {contents: nope"]);
    let parse = generate_content(text_pdf(), ProductMode::Auto, &config_with(&client))
        .await
        .unwrap_err();
    assert_eq!(parse.kind(), ErrorKind::Parse);
}

#[tokio::test]
async fn failures_render_as_error_objects() {
    let client = ScriptedClient::new(vec![Err("quota exceeded".into())]);
    let outcome = Outcome::from(
        generate_content(text_pdf(), ProductMode::Auto, &config_with(&client)).await,
    );
    let json = serde_json::to_value(&outcome).unwrap();
    let message = json["error"].as_str().unwrap();
    assert!(message.contains("quota exceeded"));
    assert!(json.get("contents").is_none());
}

#[tokio::test]
async fn empty_sources_are_rejected_before_any_call() {
    for source in [
        SourceContent::MultiPageImage(Vec::new()),
        SourceContent::PlainText("  \n ".into()),
    ] {
        let client = ScriptedClient::replying(&[&angles_reply(&["A"])]);
        let err = generate_content(source, ProductMode::Auto, &config_with(&client))
            .await
            .unwrap_err();
        assert!(matches!(err, CopyGenError::EmptyDocument), "got {err:?}");
        assert!(client.requests().is_empty());
    }
}

// ── Regeneration ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn regeneration_replaces_only_the_target_text() {
    let client = ScriptedClient::replying(&[
        &angles_reply(&["A", "B", "C"]),
        r#"{"new_text": "Novo texto magnético"}"#,
    ]);
    let config = config_with(&client);
    let mut result = generate_content(text_pdf(), ProductMode::Auto, &config)
        .await
        .unwrap();
    let before = result.clone();

    let angle = regenerate_angle(&mut result, 1, Platform::Instagram, &config)
        .await
        .unwrap();
    assert_eq!(angle.instagram_text, "Novo texto magnético");

    assert_eq!(result.angles[0], before.angles[0]);
    assert_eq!(result.angles[2], before.angles[2]);
    assert_eq!(result.angles[1].linkedin_text, before.angles[1].linkedin_text);
    assert_eq!(result.angles[1].angle_label, before.angles[1].angle_label);
    assert_eq!(result.raw_context, before.raw_context);
    assert_eq!(result.product_context, before.product_context);
}

#[tokio::test]
async fn regeneration_reuses_the_persona_without_detecting_again() {
    let detection = r#"{"name":"Runner X2","brand":"Acme","category":"Esteira","differentiator":"Silenciosa"}"#;
    let client = ScriptedClient::replying(&[
        detection,
        &angles_reply(&["A", "B"]),
        r#"{"new_text": "reescrito"}"#,
    ]);
    let config = GenerationConfig::builder()
        .client(client.clone())
        .strategy(PromptStrategy::Dynamic)
        .build()
        .unwrap();

    let mut result = generate_content(text_pdf(), ProductMode::Auto, &config)
        .await
        .unwrap();
    regenerate_angle(&mut result, 0, Platform::Linkedin, &config)
        .await
        .unwrap();

    let requests = client.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].persona, requests[1].persona);
    assert_ne!(requests[2].persona, prompts::DETECTION_PERSONA);
    assert!(requests[2].persona.contains("Runner X2"));
    assert_eq!(result.angles[0].linkedin_text, "reescrito");
}

#[tokio::test]
async fn linkedin_rewrite_of_a_text_result_sends_text_only() {
    let client = ScriptedClient::replying(&[
        &angles_reply(&["Foco em ROI", "Foco em Tecnologia 3D"]),
        r#"{"new_text": "Artigo longo"}"#,
    ]);
    let config = config_with(&client);
    let mut result = generate_content(text_pdf(), ProductMode::Auto, &config)
        .await
        .unwrap();
    regenerate_angle(&mut result, 0, Platform::Linkedin, &config)
        .await
        .unwrap();

    let requests = client.requests();
    let TaskPayload::Text(ref task) = requests[1].task else {
        panic!("expected a text payload, got {:?}", requests[1].task);
    };
    assert!(task.contains("Foco em ROI"));
    assert!(task.contains("LINKEDIN"));
    assert!(task.contains(result.raw_context.as_deref().unwrap()));
    assert_eq!(requests[1].max_tokens, 2000);
}

#[tokio::test]
async fn image_rewrite_resends_the_retained_image() {
    let client = ScriptedClient::replying(&[
        &angles_reply(&["A", "B", "C"]),
        r#"{"new_text": "curto"}"#,
    ]);
    let config = config_with(&client);
    let mut result = generate_from_bytes(&JPEG_BYTES, ProductMode::Auto, &config)
        .await
        .unwrap();
    regenerate_angle(&mut result, 2, Platform::Instagram, &config)
        .await
        .unwrap();

    let requests = client.requests();
    let images = requests[1].task.images();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].data, STANDARD.encode(JPEG_BYTES));
    assert_eq!(images[0].mime_type, "image/jpeg");
    assert!(requests[1].task.text().contains("INSTAGRAM"));
}

#[tokio::test]
async fn failed_rewrite_leaves_the_result_untouched() {
    let client = ScriptedClient::replying(&[&angles_reply(&["A"]), "nada de json"]);
    let config = config_with(&client);
    let mut result = generate_content(text_pdf(), ProductMode::Auto, &config)
        .await
        .unwrap();
    let before = result.clone();

    let err = regenerate_angle(&mut result, 0, Platform::Instagram, &config)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert_eq!(result, before);
}

#[tokio::test]
async fn result_without_context_cannot_be_regenerated() {
    let client = ScriptedClient::replying(&[&angles_reply(&["A"])]);
    let config = config_with(&client);
    let mut result = generate_content(text_pdf(), ProductMode::Auto, &config)
        .await
        .unwrap();
    result.raw_context = None;

    let err = regenerate_angle(&mut result, 0, Platform::Instagram, &config)
        .await
        .unwrap_err();
    assert!(matches!(err, CopyGenError::RegenerationUnavailable));
    assert_eq!(client.requests().len(), 1);
}

// ── Progress ─────────────────────────────────────────────────────────────────

#[derive(Default)]
struct StageRecorder {
    stages: Mutex<Vec<GenerationStage>>,
    completed: Mutex<Option<usize>>,
}

impl GenerationProgressCallback for StageRecorder {
    fn on_stage(&self, stage: GenerationStage) {
        self.stages.lock().unwrap().push(stage);
    }

    fn on_complete(&self, angle_count: usize) {
        *self.completed.lock().unwrap() = Some(angle_count);
    }
}

#[tokio::test]
async fn progress_reports_each_stage() {
    let detection = r#"{"name":"Runner X2","brand":"Acme","category":"Esteira","differentiator":"Silenciosa"}"#;
    let client = ScriptedClient::replying(&[detection, &angles_reply(&["A", "B", "C"])]);
    let recorder = Arc::new(StageRecorder::default());
    let config = GenerationConfig::builder()
        .client(client.clone())
        .strategy(PromptStrategy::Dynamic)
        .progress_callback(recorder.clone())
        .build()
        .unwrap();

    generate_from_bytes(&JPEG_BYTES, ProductMode::Auto, &config)
        .await
        .unwrap();

    assert_eq!(
        *recorder.stages.lock().unwrap(),
        vec![
            GenerationStage::Extracting,
            GenerationStage::Detecting,
            GenerationStage::Generating
        ]
    );
    assert_eq!(*recorder.completed.lock().unwrap(), Some(3));
}
