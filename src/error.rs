//! Error types for the edgequake-copygen library.
//!
//! Every fallible operation returns [`CopyGenError`]. The variants group into
//! a handful of [`ErrorKind`]s so the presentation layer can decide how to
//! react (prompt for a key, suggest another file, show the parse detail)
//! without matching on every variant.
//!
//! Product detection failures are deliberately absent: the detector absorbs
//! them and substitutes a fallback descriptor, see [`crate::detect`].
//!
//! For callers that want a serialisable value rather than a `Result`, wrap
//! the result in [`crate::output::Outcome`], which renders any error as
//! `{"error": "<message>"}`.

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the edgequake-copygen library.
#[derive(Debug, Error)]
pub enum CopyGenError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// No credentials and no pre-built provider were supplied.
    #[error("No API key configured.\n{hint}")]
    MissingCredentials { hint: String },

    /// The named provider could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Model response errors ─────────────────────────────────────────────
    /// The model returned no content at all.
    #[error("The model returned an empty response")]
    EmptyResponse,

    /// The sanitised output is not valid JSON or lacks the expected shape.
    #[error("Could not parse the model response: {detail}")]
    MalformedResponse { detail: String },

    /// The call itself failed (network, quota, service fault).
    #[error("LLM call failed: {message}")]
    Transport { message: String },

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The upload is neither a PDF nor a PNG/JPEG image.
    #[error("Unsupported upload: {detail}\nAccepted formats: PDF, PNG, JPEG.")]
    UnsupportedUpload { detail: String },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The upload has no pages, text or image data to work from.
    #[error("The document is empty")]
    EmptyDocument,

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// A rendered page could not be encoded as PNG.
    #[error("Image encoding failed: {0}")]
    ImageEncodingFailed(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, or install it system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Regeneration errors ───────────────────────────────────────────────
    /// The requested angle does not exist in the result.
    #[error("Angle {index} is out of range (result has {total} angles)")]
    AngleOutOfRange { index: usize, total: usize },

    /// The result carries no retained context to regenerate from.
    #[error("This result has no retained source context; regeneration is unavailable")]
    RegenerationUnavailable,

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of a [`CopyGenError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials or provider missing, or invalid settings. Detected before any call.
    Configuration,
    /// The model answered with nothing.
    EmptyResponse,
    /// The model answered, but not with the requested JSON shape.
    Parse,
    /// The model call failed.
    Transport,
    /// The uploaded asset could not be read or classified.
    Input,
    /// Regeneration was requested against an unusable result.
    Regeneration,
    /// Anything else.
    Internal,
}

impl CopyGenError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingCredentials { .. }
            | Self::ProviderNotConfigured { .. }
            | Self::InvalidConfig(_) => ErrorKind::Configuration,
            Self::EmptyResponse => ErrorKind::EmptyResponse,
            Self::MalformedResponse { .. } => ErrorKind::Parse,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::UnsupportedUpload { .. }
            | Self::CorruptPdf { .. }
            | Self::PasswordRequired { .. }
            | Self::WrongPassword { .. }
            | Self::EmptyDocument
            | Self::RasterisationFailed { .. }
            | Self::ImageEncodingFailed(_)
            | Self::PdfiumBindingFailed(_) => ErrorKind::Input,
            Self::AngleOutOfRange { .. } | Self::RegenerationUnavailable => {
                ErrorKind::Regeneration
            }
            Self::OutputWriteFailed { .. } | Self::Internal(_) => ErrorKind::Internal,
        }
    }
}
