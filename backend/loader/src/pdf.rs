//! PDF loading: pages are rendered through a [`PageRasterizer`] and text is
//! extracted per page with lopdf, both from one scoped temporary copy.

use std::io::Write;
use std::path::Path;

use bytes::Bytes;
use docquery_core::{DocQueryError, Result};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::raster::PageRasterizer;

/// One rendered page, PNG-encoded.
#[derive(Debug, Clone, Serialize)]
pub struct PageImage {
    /// 1-based page number.
    pub page_number: usize,
    pub width: u32,
    pub height: u32,
    #[serde(skip)]
    pub png: Bytes,
}

/// Rendered pages and the concatenated text of a pdf.
#[derive(Debug, Clone, Default)]
pub struct PdfExtraction {
    pub pages: Vec<PageImage>,
    /// Text of all pages joined without a separator; page boundaries are lost.
    pub text: String,
}

impl PdfExtraction {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Page by 1-based number.
    pub fn page(&self, number: usize) -> Option<&PageImage> {
        number.checked_sub(1).and_then(|i| self.pages.get(i))
    }
}

/// Temporary on-disk copy of an upload. Removed when dropped, so every exit
/// path (error return, panic unwind, dropped future) releases it.
struct ScratchPdf {
    file: NamedTempFile,
}

impl ScratchPdf {
    fn write(bytes: &[u8]) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("docquery-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| DocQueryError::ParseError(format!("could not stage pdf: {e}")))?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| DocQueryError::ParseError(format!("could not stage pdf: {e}")))?;
        debug!(path = %file.path().display(), "Staged pdf upload");
        Ok(Self { file })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }
}

pub(crate) fn load_pdf(bytes: &[u8], rasterizer: &dyn PageRasterizer) -> Result<PdfExtraction> {
    let scratch = ScratchPdf::write(bytes)?;

    let pages = rasterizer
        .rasterize(scratch.path())
        .map_err(|e| DocQueryError::ParseError(format!("could not render pdf pages: {e:#}")))?;

    let text = extract_text(scratch.path())?;

    Ok(PdfExtraction { pages, text })
}

fn extract_text(path: &Path) -> Result<String> {
    let document = lopdf::Document::load(path)
        .map_err(|e| DocQueryError::ParseError(format!("invalid pdf: {e}")))?;

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => text.push_str(&page_text),
            Err(e) => warn!(page = page_number, error = %e, "No extractable text on page"),
        }
    }
    Ok(text)
}
