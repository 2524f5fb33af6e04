//! Model calls: the [`ModelClient`] seam and its edgequake-llm implementation.
//!
//! Every model interaction in the crate is one request with a persona
//! (system message) and a task (user message, optionally with images). The
//! orchestrator and the regenerator only ever see [`ModelClient`]; tests plug
//! in a scripted fake and production wraps an
//! [`edgequake_llm::LLMProvider`] in [`ProviderClient`].
//!
//! There is no retry loop here. A transport failure surfaces once as
//! [`CopyGenError::Transport`] and the caller decides what to do.

use crate::config::GenerationConfig;
use crate::error::CopyGenError;
use crate::pipeline::encode::EncodedImage;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

const JSON_OBJECT_FORMAT: &str = "json_object";

/// User-message payload of a model request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPayload {
    /// Instruction text only.
    Text(String),
    /// Instruction text followed by one or more images.
    Multimodal {
        text: String,
        images: Vec<EncodedImage>,
    },
}

impl TaskPayload {
    pub fn text(&self) -> &str {
        match self {
            TaskPayload::Text(text) | TaskPayload::Multimodal { text, .. } => text,
        }
    }

    pub fn images(&self) -> &[EncodedImage] {
        match self {
            TaskPayload::Text(_) => &[],
            TaskPayload::Multimodal { images, .. } => images,
        }
    }
}

/// One model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    /// System message.
    pub persona: String,
    pub task: TaskPayload,
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Anything that can answer a [`ModelRequest`] with raw text.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send the request and return the model's raw reply.
    ///
    /// An empty reply is returned as `Ok("")`; deciding that it is an error
    /// is the caller's job.
    async fn complete(&self, request: &ModelRequest) -> Result<String, CopyGenError>;
}

/// [`ModelClient`] backed by any edgequake-llm provider.
#[derive(Clone)]
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
}

impl ProviderClient {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl ModelClient for ProviderClient {
    async fn complete(&self, request: &ModelRequest) -> Result<String, CopyGenError> {
        let start = Instant::now();
        let messages = build_messages(request);
        let options = build_options(request);

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| CopyGenError::Transport {
                message: e.to_string(),
            })?;

        debug!(
            "Model call: {} input tokens, {} output tokens, {:?}",
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// System message with the persona, then the task as the single user turn.
fn build_messages(request: &ModelRequest) -> Vec<ChatMessage> {
    let user = match &request.task {
        TaskPayload::Text(text) => ChatMessage::user(text.as_str()),
        TaskPayload::Multimodal { text, images } => ChatMessage::user_with_images(
            text.as_str(),
            images.iter().map(to_image_data).collect(),
        ),
    };
    vec![ChatMessage::system(request.persona.as_str()), user]
}

fn to_image_data(image: &EncodedImage) -> ImageData {
    ImageData::new(image.data.clone(), image.mime_type.clone()).with_detail(image.detail.as_str())
}

/// Every reply must be one JSON object; providers with a JSON mode enforce it.
fn build_options(request: &ModelRequest) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(request.temperature),
        max_tokens: Some(request.max_tokens),
        response_format: Some(JSON_OBJECT_FORMAT.to_string()),
        ..Default::default()
    }
}

/// Resolve the client for a run, from most-specific to least-specific.
///
/// 1. `config.client`, used as-is.
/// 2. `config.provider`, wrapped in a [`ProviderClient`].
/// 3. `config.api_key` with the `openai` provider name.
///
/// Nothing is sent before this succeeds, so a missing key never costs a call.
pub fn resolve_client(config: &GenerationConfig) -> Result<Arc<dyn ModelClient>, CopyGenError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    if let Some(ref provider) = config.provider {
        return Ok(Arc::new(ProviderClient::new(Arc::clone(provider))));
    }

    if !config.provider_name.eq_ignore_ascii_case("openai") {
        return Err(CopyGenError::ProviderNotConfigured {
            provider: config.provider_name.clone(),
            hint: "only the openai provider can be built from an API key; \
                   pass a pre-built provider for anything else"
                .to_string(),
        });
    }

    let key = config
        .api_key
        .as_deref()
        .filter(|k| !k.trim().is_empty())
        .ok_or_else(|| CopyGenError::MissingCredentials {
            hint: "set an OpenAI API key in the configuration".to_string(),
        })?;

    let provider = edgequake_llm::OpenAIProvider::new(key).with_model(config.model.as_str());
    debug!("Using openai provider with model {}", config.model);
    Ok(Arc::new(ProviderClient::new(Arc::new(provider))))
}
