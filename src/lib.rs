//! # edgequake-copygen
//!
//! Turn a product brochure (PDF) or a product photo into ready-to-post
//! marketing copy: a set of content *angles*, each with an Instagram caption
//! and a LinkedIn article.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Input     sniff PDF vs image from magic bytes
//!  ├─ 2. Extract   text-bearing PDF → text; scanned PDF → page images (pdfium)
//!  ├─ 3. Product   fixed catalog, or a cheap detection call (dynamic strategy)
//!  ├─ 4. Generate  one call: persona + task (+ images)
//!  ├─ 5. Recover   strip code fences, parse {"contents": [...]}
//!  └─ 6. Result    angles + retained context for later rewrites
//! ```
//!
//! A result keeps its source context and product context, so a single
//! platform of a single angle can be rewritten later with
//! [`regenerate_angle`] without re-reading the upload.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_copygen::{generate_file, regenerate_angle, GenerationConfig, Platform, ProductMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = GenerationConfig::builder().api_key("sk-...").build()?;
//!     let mut result = generate_file("brochure.pdf", ProductMode::Auto, &config).await?;
//!     for angle in &result.angles {
//!         println!("## {}\n{}\n", angle.angle_label, angle.instagram_text);
//!     }
//!     regenerate_angle(&mut result, 0, Platform::Linkedin, &config).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `copygen` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! ## Errors as values
//!
//! Every entry point returns `Result<_, CopyGenError>`. Front-ends that want
//! the `{"error": "..."}` shape convert with [`Outcome::from`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod detect;
pub mod error;
pub mod generate;
pub mod output;
pub mod pipeline;
pub mod product;
pub mod progress;
pub mod prompts;
pub mod regenerate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use detect::detect_product_info;
pub use error::{CopyGenError, ErrorKind};
pub use generate::{generate_content, generate_file, generate_from_bytes, generate_sync, write_result};
pub use output::{
    ContentAngle, ContextKind, GenerationResult, Outcome, Platform, Regenerated, RetainedContext,
};
pub use pipeline::encode::{EncodedImage, ImageDetail};
pub use pipeline::extract::{extract_source, ExtractionPolicy, PageSource, SourceContent};
pub use pipeline::llm::{ModelClient, ModelRequest, ProviderClient, TaskPayload};
pub use pipeline::sanitize::sanitize_response;
pub use product::{ProductCategory, ProductContext, ProductDescriptor, ProductMode, PromptStrategy};
pub use progress::{GenerationProgressCallback, GenerationStage, NoopProgressCallback, ProgressCallback};
pub use regenerate::{regenerate, regenerate_angle};
