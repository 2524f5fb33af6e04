//! Source classification: decide whether a document is text-bearing or
//! scanned, and collect the matching payload.
//!
//! ## Policy
//!
//! Two passes over at most [`ExtractionPolicy::page_limit`] pages:
//!
//! 1. Read the text layer of every considered page. The document is
//!    *text-bearing* iff some page's trimmed text is strictly longer than
//!    [`ExtractionPolicy::min_page_text_chars`] characters.
//! 2. Text-bearing: join the non-empty page texts in page order. Scanned:
//!    render every considered page and keep the images.
//!
//! Deciding globally before collecting means the payload is never a mix of
//! text and images and no page's text is dropped because it came before the
//! first qualifying page. Pages past the limit are never visited.

use crate::error::CopyGenError;
use crate::pipeline::encode::EncodedImage;
use tracing::{debug, info, warn};

/// Page-level access to a document. Implemented over pdfium for real PDFs.
pub trait PageSource {
    /// Total number of pages in the document.
    fn page_count(&self) -> usize;

    /// Extracted text layer of a page (0-indexed).
    fn page_text(&mut self, index: usize) -> Result<String, CopyGenError>;

    /// Rendered image of a page (0-indexed).
    fn render_page(&mut self, index: usize) -> Result<EncodedImage, CopyGenError>;
}

/// Limits applied while classifying a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionPolicy {
    /// Pages beyond this count are ignored entirely. Default: 15.
    pub page_limit: usize,
    /// A page counts as text-bearing above this many characters. Default: 50.
    pub min_page_text_chars: usize,
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self {
            page_limit: 15,
            min_page_text_chars: 50,
        }
    }
}

/// Coarse kind of a [`SourceContent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    PlainText,
    SingleImage,
    MultiPageImage,
}

/// Extracted material driving generation. The variant is fixed at extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceContent {
    /// Text joined from a text-bearing document.
    PlainText(String),
    /// A single uploaded image.
    SingleImage(EncodedImage),
    /// Rendered pages of a scanned document, in page order.
    MultiPageImage(Vec<EncodedImage>),
}

impl SourceContent {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceContent::PlainText(_) => SourceKind::PlainText,
            SourceContent::SingleImage(_) => SourceKind::SingleImage,
            SourceContent::MultiPageImage(_) => SourceKind::MultiPageImage,
        }
    }

    /// True when there is no material to send: blank text or no image data.
    pub fn is_empty(&self) -> bool {
        match self {
            SourceContent::PlainText(text) => text.trim().is_empty(),
            SourceContent::SingleImage(img) => img.data.is_empty(),
            SourceContent::MultiPageImage(pages) => pages.is_empty(),
        }
    }

    /// The first image of an image source.
    pub fn first_image(&self) -> Option<&EncodedImage> {
        match self {
            SourceContent::PlainText(_) => None,
            SourceContent::SingleImage(img) => Some(img),
            SourceContent::MultiPageImage(pages) => pages.first(),
        }
    }
}

/// Whether one page's text layer is substantial enough to call the document text-bearing.
pub fn is_text_page(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() > min_chars
}

/// Classify a document and collect its payload according to `policy`.
pub fn extract_source<S: PageSource + ?Sized>(
    pages: &mut S,
    policy: &ExtractionPolicy,
) -> Result<SourceContent, CopyGenError> {
    let total = pages.page_count();
    let considered = total.min(policy.page_limit);
    if considered == 0 {
        return Err(CopyGenError::EmptyDocument);
    }
    if total > considered {
        debug!("Ignoring pages {}..={} (limit {})", considered + 1, total, policy.page_limit);
    }

    let mut texts = Vec::with_capacity(considered);
    for idx in 0..considered {
        let text = match pages.page_text(idx) {
            Ok(t) => t,
            Err(e) => {
                warn!("Page {}: text extraction failed, treating as empty: {}", idx + 1, e);
                String::new()
            }
        };
        texts.push(text);
    }

    let text_bearing = texts
        .iter()
        .any(|t| is_text_page(t, policy.min_page_text_chars));

    if text_bearing {
        let joined = texts
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        info!(
            "Document is text-bearing: {} pages, {} chars",
            considered,
            joined.chars().count()
        );
        return Ok(SourceContent::PlainText(joined));
    }

    info!("Document looks scanned; rendering {} pages", considered);
    let images = (0..considered)
        .map(|idx| pages.render_page(idx))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(SourceContent::MultiPageImage(images))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// In-memory document that records which pages were touched.
    struct FakePages {
        texts: Vec<String>,
        text_visits: Vec<usize>,
        render_visits: Vec<usize>,
    }

    impl FakePages {
        fn new(texts: Vec<String>) -> Self {
            Self {
                texts,
                text_visits: Vec::new(),
                render_visits: Vec::new(),
            }
        }
    }

    impl PageSource for FakePages {
        fn page_count(&self) -> usize {
            self.texts.len()
        }

        fn page_text(&mut self, index: usize) -> Result<String, CopyGenError> {
            self.text_visits.push(index);
            Ok(self.texts[index].clone())
        }

        fn render_page(&mut self, index: usize) -> Result<EncodedImage, CopyGenError> {
            self.render_visits.push(index);
            Ok(EncodedImage::new(format!("page-{index}"), "image/png"))
        }
    }

    #[test]
    fn fifty_one_chars_flip_to_text() {
        let mut doc = FakePages::new(vec!["x".repeat(51)]);
        let out = extract_source(&mut doc, &ExtractionPolicy::default()).unwrap();
        assert_eq!(out.kind(), SourceKind::PlainText);
        assert!(doc.render_visits.is_empty());
    }

    #[test]
    fn fifty_chars_do_not_flip() {
        let mut doc = FakePages::new(vec!["x".repeat(50)]);
        let out = extract_source(&mut doc, &ExtractionPolicy::default()).unwrap();
        assert_eq!(out.kind(), SourceKind::MultiPageImage);
        assert_eq!(doc.render_visits, vec![0]);
    }

    #[test]
    fn threshold_counts_characters_not_bytes() {
        // 50 two-byte characters: 100 bytes but still not above the threshold.
        let mut doc = FakePages::new(vec!["ç".repeat(50)]);
        let out = extract_source(&mut doc, &ExtractionPolicy::default()).unwrap();
        assert_eq!(out.kind(), SourceKind::MultiPageImage);
    }

    #[test]
    fn surrounding_whitespace_does_not_count() {
        let mut doc = FakePages::new(vec![format!("   {}\n\n\n", "x".repeat(50))]);
        let out = extract_source(&mut doc, &ExtractionPolicy::default()).unwrap();
        assert_eq!(out.kind(), SourceKind::MultiPageImage);
    }

    #[test]
    fn pages_past_the_limit_are_never_visited() {
        let mut doc = FakePages::new(vec![String::new(); 20]);
        let out = extract_source(&mut doc, &ExtractionPolicy::default()).unwrap();
        match out {
            SourceContent::MultiPageImage(pages) => assert_eq!(pages.len(), 15),
            other => panic!("expected images, got {other:?}"),
        }
        assert_eq!(doc.text_visits, (0..15).collect::<Vec<_>>());
        assert_eq!(doc.render_visits, (0..15).collect::<Vec<_>>());
    }

    #[test]
    fn late_text_page_keeps_earlier_short_text() {
        let mut doc = FakePages::new(vec![
            String::new(),
            "capa".into(),
            "y".repeat(80),
        ]);
        let out = extract_source(&mut doc, &ExtractionPolicy::default()).unwrap();
        assert_eq!(
            out,
            SourceContent::PlainText(format!("capa\n{}", "y".repeat(80)))
        );
        assert!(doc.render_visits.is_empty());
    }

    #[test]
    fn empty_document_is_an_error() {
        let mut doc = FakePages::new(vec![]);
        let err = extract_source(&mut doc, &ExtractionPolicy::default()).unwrap_err();
        assert!(matches!(err, CopyGenError::EmptyDocument));
    }
}
