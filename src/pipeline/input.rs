//! Input resolution: validate a local upload and decide whether it is a PDF
//! or an image.
//!
//! The decision is made from magic bytes, never from the file extension:
//! uploads arrive with arbitrary names (`temp_1712345.pdf`, `IMG_0042`), and
//! a mislabelled file should fail fast with a clear error rather than inside
//! pdfium.

use crate::error::CopyGenError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// What an upload turned out to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Pdf,
    Image,
}

/// A local upload that exists, is readable, and has a recognised format.
#[derive(Debug, Clone)]
pub struct ResolvedInput {
    pub path: PathBuf,
    pub kind: UploadKind,
}

/// Classify raw upload bytes by their magic number.
pub fn sniff_upload(bytes: &[u8]) -> Result<UploadKind, CopyGenError> {
    if bytes.starts_with(b"%PDF") {
        return Ok(UploadKind::Pdf);
    }
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Png) | Ok(image::ImageFormat::Jpeg) => Ok(UploadKind::Image),
        Ok(other) => Err(CopyGenError::UnsupportedUpload {
            detail: format!("{other:?} images are not accepted"),
        }),
        Err(_) => {
            let mut magic = [0u8; 4];
            let n = bytes.len().min(4);
            magic[..n].copy_from_slice(&bytes[..n]);
            Err(CopyGenError::UnsupportedUpload {
                detail: format!("unrecognised file header {magic:?}"),
            })
        }
    }
}

/// Validate a local file and sniff its kind.
pub fn resolve_local(path: &Path) -> Result<ResolvedInput, CopyGenError> {
    let path = path.to_path_buf();

    if !path.exists() {
        return Err(CopyGenError::FileNotFound { path });
    }

    let mut header = Vec::with_capacity(16);
    match std::fs::File::open(&path) {
        Ok(f) => {
            f.take(16)
                .read_to_end(&mut header)
                .map_err(|e| CopyGenError::Internal(format!("Failed to read header: {e}")))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(CopyGenError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(CopyGenError::FileNotFound { path });
        }
    }

    let kind = sniff_upload(&header)?;
    debug!("Resolved local upload: {} ({:?})", path.display(), kind);
    Ok(ResolvedInput { path, kind })
}
