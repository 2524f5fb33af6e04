//! Configuration for copy generation.
//!
//! Every knob lives in [`GenerationConfig`], built via
//! [`GenerationConfigBuilder`]. Credentials are part of the config value and
//! nothing else: the library never reads the process environment, so two
//! configs with different keys can be used side by side.

use crate::error::CopyGenError;
use crate::pipeline::extract::ExtractionPolicy;
use crate::pipeline::llm::ModelClient;
use crate::product::PromptStrategy;
use crate::progress::ProgressCallback;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for generation, detection and regeneration calls.
///
/// # Example
/// ```rust
/// use edgequake_copygen::{GenerationConfig, PromptStrategy};
///
/// let config = GenerationConfig::builder()
///     .api_key("sk-test")
///     .strategy(PromptStrategy::Dynamic)
///     .temperature(0.5)
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "gpt-4o");
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// API key for the default OpenAI provider. Never printed by `Debug`.
    pub api_key: Option<String>,

    /// Model identifier. Default: `gpt-4o`.
    pub model: String,

    /// Provider used when only `api_key` is set. Default: `openai`.
    pub provider_name: String,

    /// Pre-constructed edgequake provider. Takes precedence over `api_key`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Pre-constructed model client. Takes precedence over everything else.
    pub client: Option<Arc<dyn ModelClient>>,

    /// Fixed product catalog or dynamic synthesis from detection. Default: catalog.
    pub strategy: PromptStrategy,

    /// Sampling temperature for generation and regeneration. Default: 0.7.
    pub temperature: f32,

    /// Output budget for the generation call. Default: 4000.
    pub max_tokens: usize,

    /// Output budget for the product detection call. Default: 300.
    pub detection_max_tokens: usize,

    /// Output budget for a single-platform rewrite. Default: 2000.
    pub regeneration_max_tokens: usize,

    /// Angles requested for a single image upload. Default: 3.
    pub image_angle_count: usize,

    /// Angles requested for any PDF, scanned or not. Default: 5.
    pub document_angle_count: usize,

    /// Pages considered during classification. Default: 15.
    pub page_limit: usize,

    /// A page is text-bearing above this many characters. Default: 50.
    pub min_page_text_chars: usize,

    /// Longest edge of a rendered page in pixels. Default: 2000.
    pub max_rendered_pixels: u32,

    /// Characters of document text sent for generation. Default: 50 000.
    pub document_text_limit: usize,

    /// Characters of retained text sent for regeneration. Default: 35 000.
    pub regeneration_text_limit: usize,

    /// Characters of document text sent for detection. Default: 4000.
    pub detection_text_limit: usize,

    /// User password for encrypted PDFs.
    pub password: Option<String>,

    /// Directory holding the pdfium shared library. Falls back to `./` then the system.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Stage notifications. See [`crate::progress`].
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o".to_string(),
            provider_name: "openai".to_string(),
            provider: None,
            client: None,
            strategy: PromptStrategy::default(),
            temperature: 0.7,
            max_tokens: 4000,
            detection_max_tokens: 300,
            regeneration_max_tokens: 2000,
            image_angle_count: 3,
            document_angle_count: 5,
            page_limit: 15,
            min_page_text_chars: 50,
            max_rendered_pixels: 2000,
            document_text_limit: 50_000,
            regeneration_text_limit: 35_000,
            detection_text_limit: 4000,
            password: None,
            pdfium_lib_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("client", &self.client.as_ref().map(|_| "<dyn ModelClient>"))
            .field("strategy", &self.strategy)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("detection_max_tokens", &self.detection_max_tokens)
            .field("regeneration_max_tokens", &self.regeneration_max_tokens)
            .field("image_angle_count", &self.image_angle_count)
            .field("document_angle_count", &self.document_angle_count)
            .field("page_limit", &self.page_limit)
            .field("min_page_text_chars", &self.min_page_text_chars)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// The classification limits derived from this config.
    pub fn extraction_policy(&self) -> ExtractionPolicy {
        ExtractionPolicy {
            page_limit: self.page_limit,
            min_page_text_chars: self.min_page_text_chars,
        }
    }

    pub(crate) fn notify<F>(&self, f: F)
    where
        F: FnOnce(&dyn crate::progress::GenerationProgressCallback),
    {
        if let Some(ref cb) = self.progress_callback {
            f(cb.as_ref());
        }
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = name.into();
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn client(mut self, client: Arc<dyn ModelClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn strategy(mut self, strategy: PromptStrategy) -> Self {
        self.config.strategy = strategy;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn detection_max_tokens(mut self, n: usize) -> Self {
        self.config.detection_max_tokens = n;
        self
    }

    pub fn regeneration_max_tokens(mut self, n: usize) -> Self {
        self.config.regeneration_max_tokens = n;
        self
    }

    pub fn image_angle_count(mut self, n: usize) -> Self {
        self.config.image_angle_count = n.clamp(1, 10);
        self
    }

    pub fn document_angle_count(mut self, n: usize) -> Self {
        self.config.document_angle_count = n.clamp(1, 10);
        self
    }

    pub fn page_limit(mut self, n: usize) -> Self {
        self.config.page_limit = n.max(1);
        self
    }

    pub fn min_page_text_chars(mut self, n: usize) -> Self {
        self.config.min_page_text_chars = n;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn document_text_limit(mut self, n: usize) -> Self {
        self.config.document_text_limit = n;
        self
    }

    pub fn regeneration_text_limit(mut self, n: usize) -> Self {
        self.config.regeneration_text_limit = n;
        self
    }

    pub fn detection_text_limit(mut self, n: usize) -> Self {
        self.config.detection_text_limit = n;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn pdfium_lib_path(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(dir.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, CopyGenError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(CopyGenError::InvalidConfig("model must not be empty".into()));
        }
        for (name, value) in [
            ("max_tokens", c.max_tokens),
            ("detection_max_tokens", c.detection_max_tokens),
            ("regeneration_max_tokens", c.regeneration_max_tokens),
        ] {
            if value == 0 {
                return Err(CopyGenError::InvalidConfig(format!("{name} must be ≥ 1")));
            }
        }
        if c.document_text_limit == 0 || c.regeneration_text_limit == 0 {
            return Err(CopyGenError::InvalidConfig(
                "text limits must be ≥ 1 character".into(),
            ));
        }
        if c.api_key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(CopyGenError::InvalidConfig("api_key is blank".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = GenerationConfig::default();
        assert_eq!(c.model, "gpt-4o");
        assert_eq!(c.provider_name, "openai");
        assert_eq!(c.strategy, PromptStrategy::FixedCatalog);
        assert_eq!(c.image_angle_count, 3);
        assert_eq!(c.document_angle_count, 5);
        assert_eq!(c.detection_max_tokens, 300);
        assert_eq!(c.extraction_policy(), ExtractionPolicy::default());
    }

    #[test]
    fn setters_clamp() {
        let c = GenerationConfig::builder()
            .temperature(5.0)
            .image_angle_count(0)
            .page_limit(0)
            .max_rendered_pixels(3)
            .build()
            .unwrap();
        assert_eq!(c.temperature, 2.0);
        assert_eq!(c.image_angle_count, 1);
        assert_eq!(c.page_limit, 1);
        assert_eq!(c.max_rendered_pixels, 100);
    }

    #[test]
    fn build_rejects_zero_budget() {
        let err = GenerationConfig::builder().max_tokens(0).build().unwrap_err();
        assert!(matches!(err, CopyGenError::InvalidConfig(_)));
    }

    #[test]
    fn build_rejects_blank_key() {
        let err = GenerationConfig::builder().api_key("  ").build().unwrap_err();
        assert!(matches!(err, CopyGenError::InvalidConfig(_)));
    }

    #[test]
    fn debug_redacts_secrets() {
        let c = GenerationConfig::builder()
            .api_key("sk-very-secret")
            .password("hunter2")
            .build()
            .unwrap();
        let printed = format!("{c:?}");
        assert!(!printed.contains("sk-very-secret"));
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("<redacted>"));
    }
}
