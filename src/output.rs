//! Result types returned to the presentation layer.
//!
//! [`GenerationResult`] is the orchestrator's output. It carries the generated
//! angles plus everything regeneration needs later: the retained source
//! context and the exact [`ProductContext`] used. Angles are mutated in place
//! by [`crate::regenerate::regenerate_angle`], one platform text at a time.
//!
//! [`Outcome`] is the serialisable, error-as-value wrapper: it renders either
//! the success object or `{"error": "<message>"}`, never both.

use crate::error::CopyGenError;
use crate::product::ProductContext;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Target social platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Linkedin,
}

impl Platform {
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Instagram => "instagram",
            Platform::Linkedin => "linkedin",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "instagram" | "insta" => Ok(Platform::Instagram),
            "linkedin" => Ok(Platform::Linkedin),
            other => Err(format!(
                "unknown platform '{other}' (expected instagram or linkedin)"
            )),
        }
    }
}

/// One strategic content variant with one text per platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentAngle {
    #[serde(rename = "angulo", alias = "angle")]
    pub angle_label: String,
    #[serde(rename = "instagram")]
    pub instagram_text: String,
    #[serde(rename = "linkedin")]
    pub linkedin_text: String,
}

impl ContentAngle {
    /// The text for one platform.
    pub fn text(&self, platform: Platform) -> &str {
        match platform {
            Platform::Instagram => &self.instagram_text,
            Platform::Linkedin => &self.linkedin_text,
        }
    }

    /// Replace the text for one platform, leaving the other untouched.
    pub fn set_text(&mut self, platform: Platform, text: String) {
        match platform {
            Platform::Instagram => self.instagram_text = text,
            Platform::Linkedin => self.linkedin_text = text,
        }
    }
}

/// How to interpret [`GenerationResult::raw_context`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    /// Extracted document text.
    Text,
    /// A base64 image upload.
    Image,
    /// The first rendered page of a scanned PDF, base64.
    ScannedPdf,
}

impl ContextKind {
    /// Whether the retained context is an image payload.
    pub fn is_image(self) -> bool {
        matches!(self, ContextKind::Image | ContextKind::ScannedPdf)
    }
}

/// The orchestrator's output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationResult {
    /// Generated angles, in generation order.
    #[serde(rename = "contents")]
    pub angles: Vec<ContentAngle>,
    /// Source payload retained for regeneration.
    pub raw_context: Option<String>,
    #[serde(rename = "context_type")]
    pub context_kind: ContextKind,
    /// MIME type of an image `raw_context`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<String>,
    /// The product context used; reused unchanged by every regeneration.
    pub product_context: ProductContext,
}

impl GenerationResult {
    /// Borrow the retained context, if regeneration is possible.
    pub fn retained_context(&self) -> Option<RetainedContext<'_>> {
        self.raw_context.as_deref().map(|raw| RetainedContext {
            raw,
            kind: self.context_kind,
            media_type: self.media_type.as_deref(),
        })
    }
}

/// Borrowed view of the source context a result was generated from.
#[derive(Debug, Clone, Copy)]
pub struct RetainedContext<'a> {
    pub raw: &'a str,
    pub kind: ContextKind,
    pub media_type: Option<&'a str>,
}

/// Output of a single-platform rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Regenerated {
    pub new_text: String,
}

/// Error-as-value wrapper for callers that render results without matching on errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outcome<T> {
    Failure { error: String },
    Success(T),
}

impl<T> Outcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Outcome::Failure { error } => Some(error),
            Outcome::Success(_) => None,
        }
    }
}

impl<T> From<Result<T, CopyGenError>> for Outcome<T> {
    fn from(result: Result<T, CopyGenError>) -> Self {
        match result {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::Failure {
                error: e.to_string(),
            },
        }
    }
}
