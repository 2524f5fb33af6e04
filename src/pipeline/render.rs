//! PDF access via pdfium: text layer and rasterisation behind [`PageSource`].
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is blocking and keeps
//! thread-local state. [`extract_pdf`] moves the whole classification pass
//! onto Tokio's blocking pool so the async runtime never stalls on it.
//!
//! ## Why cap pixels, not DPI?
//!
//! Brochures come in every page size. `max_rendered_pixels` bounds the longest
//! edge regardless of physical size, which keeps memory and upload size
//! predictable.

use crate::config::GenerationConfig;
use crate::error::CopyGenError;
use crate::pipeline::encode::{encode_page, EncodedImage};
use crate::pipeline::extract::{extract_source, ExtractionPolicy, PageSource, SourceContent};
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Classify and extract a PDF on the blocking pool.
pub async fn extract_pdf(
    pdf_path: &Path,
    config: &GenerationConfig,
) -> Result<SourceContent, CopyGenError> {
    let path = pdf_path.to_path_buf();
    let password = config.password.clone();
    let lib_path = config.pdfium_lib_path.clone();
    let max_pixels = config.max_rendered_pixels;
    let policy = config.extraction_policy();

    tokio::task::spawn_blocking(move || {
        extract_pdf_blocking(&path, password.as_deref(), lib_path.as_deref(), max_pixels, &policy)
    })
    .await
    .map_err(|e| CopyGenError::Internal(format!("Extraction task panicked: {}", e)))?
}

fn extract_pdf_blocking(
    pdf_path: &Path,
    password: Option<&str>,
    lib_path: Option<&Path>,
    max_pixels: u32,
    policy: &ExtractionPolicy,
) -> Result<SourceContent, CopyGenError> {
    let pdfium = bind_pdfium(lib_path)?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| load_error(pdf_path, password, e))?;
    info!("PDF loaded: {} pages", document.pages().len());

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut pages = PdfiumPages {
        document: &document,
        render_config,
    };
    extract_source(&mut pages, policy)
}

/// Bind to pdfium: an explicit directory first, then the working directory, then the system.
fn bind_pdfium(lib_path: Option<&Path>) -> Result<Pdfium, CopyGenError> {
    let bindings = match lib_path {
        Some(dir) => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir)),
        None => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| CopyGenError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

fn load_error(pdf_path: &Path, password: Option<&str>, e: PdfiumError) -> CopyGenError {
    let err_str = format!("{:?}", e);
    let path: PathBuf = pdf_path.to_path_buf();
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            CopyGenError::WrongPassword { path }
        } else {
            CopyGenError::PasswordRequired { path }
        }
    } else {
        CopyGenError::CorruptPdf {
            path,
            detail: err_str,
        }
    }
}

/// A loaded pdfium document exposed as a [`PageSource`].
struct PdfiumPages<'doc, 'lib> {
    document: &'doc PdfDocument<'lib>,
    render_config: PdfRenderConfig,
}

impl<'lib> PdfiumPages<'_, 'lib> {
    fn page(&self, index: usize) -> Result<PdfPage<'lib>, CopyGenError> {
        self.document
            .pages()
            .get(index as u16)
            .map_err(|e| CopyGenError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            })
    }
}

impl PageSource for PdfiumPages<'_, '_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_text(&mut self, index: usize) -> Result<String, CopyGenError> {
        let page = self.page(index)?;
        let text = page.text().map_err(|e| {
            CopyGenError::Internal(format!(
                "Text extraction failed for page {}: {:?}",
                index + 1,
                e
            ))
        })?;
        Ok(text.all())
    }

    fn render_page(&mut self, index: usize) -> Result<EncodedImage, CopyGenError> {
        let page = self.page(index)?;
        let bitmap = page.render_with_config(&self.render_config).map_err(|e| {
            CopyGenError::RasterisationFailed {
                page: index + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            index + 1,
            image.width(),
            image.height()
        );
        encode_page(&image)
    }
}
