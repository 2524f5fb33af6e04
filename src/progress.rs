//! Progress-callback trait for generation stage events.
//!
//! Inject an [`Arc<dyn GenerationProgressCallback>`] via
//! [`crate::config::GenerationConfigBuilder::progress_callback`] to learn
//! which stage a run is in. The CLI drives its spinner from this; a web
//! front-end would forward the same events to its status line.
//!
//! # Example
//!
//! ```rust
//! use edgequake_copygen::{GenerationConfig, GenerationProgressCallback, GenerationStage};
//! use std::sync::Arc;
//!
//! struct Printer;
//!
//! impl GenerationProgressCallback for Printer {
//!     fn on_stage(&self, stage: GenerationStage) {
//!         eprintln!("{}", stage.label());
//!     }
//! }
//!
//! let config = GenerationConfig::builder()
//!     .progress_callback(Arc::new(Printer))
//!     .build()
//!     .unwrap();
//! ```

use crate::product::ProductContext;
use std::sync::Arc;

/// Coarse pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationStage {
    /// Reading the upload, classifying and rendering pages.
    Extracting,
    /// The product detection call.
    Detecting,
    /// The main generation call.
    Generating,
    /// A single-platform rewrite.
    Regenerating,
}

impl GenerationStage {
    /// Short human-readable status line.
    pub fn label(self) -> &'static str {
        match self {
            GenerationStage::Extracting => "Reading file",
            GenerationStage::Detecting => "Identifying product",
            GenerationStage::Generating => "Writing copy",
            GenerationStage::Regenerating => "Rewriting text",
        }
    }
}

/// Called by the pipeline as a run moves through its stages.
///
/// All methods have no-op defaults so callers only override what they need.
pub trait GenerationProgressCallback: Send + Sync {
    /// Called when a stage begins.
    fn on_stage(&self, stage: GenerationStage) {
        let _ = stage;
    }

    /// Called once the product context for a run is fixed.
    fn on_product_resolved(&self, context: &ProductContext) {
        let _ = context;
    }

    /// Called after a successful generation.
    fn on_complete(&self, angle_count: usize) {
        let _ = angle_count;
    }

    /// Called when a run ends in an error.
    fn on_error(&self, error: &str) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl GenerationProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::GenerationConfig`].
pub type ProgressCallback = Arc<dyn GenerationProgressCallback>;
