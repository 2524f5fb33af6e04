//! Image encoding: rendered pages and raw uploads → base64 payloads.
//!
//! Model APIs accept images as base64 data embedded in the request body,
//! together with a `detail` hint. Generation sends images at
//! [`ImageDetail::High`] so small print on spec sheets stays legible;
//! detection resends the same payload at [`ImageDetail::Low`], which costs a
//! single tile.

use crate::error::CopyGenError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tracing::debug;

/// Fidelity hint attached to an image payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageDetail {
    Low,
    #[default]
    High,
}

impl ImageDetail {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageDetail::Low => "low",
            ImageDetail::High => "high",
        }
    }
}

/// A base64-encoded image ready to attach to a model request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodedImage {
    /// Base64 payload (no `data:` prefix).
    pub data: String,
    pub mime_type: String,
    pub detail: ImageDetail,
}

impl EncodedImage {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
            detail: ImageDetail::High,
        }
    }

    /// Same payload with a different fidelity hint.
    pub fn with_detail(mut self, detail: ImageDetail) -> Self {
        self.detail = detail;
        self
    }
}

/// Encode a rendered PDF page as a base64 PNG.
///
/// PNG keeps rendered text crisp; JPEG artefacts make small print unreadable.
pub fn encode_page(img: &DynamicImage) -> Result<EncodedImage, CopyGenError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| CopyGenError::ImageEncodingFailed(e.to_string()))?;

    let b64 = STANDARD.encode(&buf);
    debug!("Encoded page → {} bytes base64", b64.len());

    Ok(EncodedImage::new(b64, "image/png"))
}

/// Encode a raw image upload as-is, after checking it is a PNG or JPEG.
///
/// The bytes are not re-encoded; the returned payload decodes to exactly the
/// uploaded file.
pub fn encode_upload(bytes: &[u8]) -> Result<EncodedImage, CopyGenError> {
    let format = image::guess_format(bytes).map_err(|e| CopyGenError::UnsupportedUpload {
        detail: e.to_string(),
    })?;

    let mime_type = match format {
        ImageFormat::Png | ImageFormat::Jpeg => format.to_mime_type(),
        other => {
            return Err(CopyGenError::UnsupportedUpload {
                detail: format!("{other:?} images are not accepted"),
            })
        }
    };

    let b64 = STANDARD.encode(bytes);
    debug!("Encoded upload ({mime_type}) → {} bytes base64", b64.len());

    Ok(EncodedImage::new(b64, mime_type))
}
