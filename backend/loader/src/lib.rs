//! Document Loader
//!
//! Turns an uploaded file into a normalized in-memory [`Document`]: a typed
//! table for csv/xlsx, or rendered page images plus concatenated text for pdf.

pub mod document;
pub mod kind;
pub mod pdf;
pub mod raster;
pub mod tabular;
pub mod upload;

mod csv_reader;
mod xlsx_reader;

use std::sync::Arc;

use docquery_core::Result;
use tracing::{info, instrument};

pub use document::Document;
pub use kind::DocumentKind;
pub use pdf::{PageImage, PdfExtraction};
pub use raster::{PageRasterizer, PdfiumRasterizer};
pub use tabular::{Cell, Column, ColumnSummary, ColumnType, DataPreview, FilterOp, TabularDataset};
pub use upload::UploadedFile;

/// Number of rows shown in a tabular data preview.
pub const PREVIEW_ROWS: usize = 100;

/// Loads uploads into documents. Holds the page rasterizer used for pdf kinds.
#[derive(Clone)]
pub struct DocumentLoader {
    rasterizer: Arc<dyn PageRasterizer>,
}

impl DocumentLoader {
    pub fn new(rasterizer: Arc<dyn PageRasterizer>) -> Self {
        Self { rasterizer }
    }

    /// Load an uploaded file according to its declared kind.
    pub fn load(&self, file: &UploadedFile) -> Result<Document> {
        self.load_bytes(&file.bytes, file.kind)
    }

    /// Parse raw bytes as the given kind. Blocking; callers on an async
    /// runtime should run this on a blocking thread.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub fn load_bytes(&self, bytes: &[u8], kind: DocumentKind) -> Result<Document> {
        let document = match kind {
            DocumentKind::Csv => Document::Tabular(Arc::new(csv_reader::parse_csv(bytes)?)),
            DocumentKind::Xlsx => Document::Tabular(Arc::new(xlsx_reader::parse_xlsx(bytes)?)),
            DocumentKind::Pdf => Document::Pdf(pdf::load_pdf(bytes, self.rasterizer.as_ref())?),
        };

        match &document {
            Document::Tabular(data) => info!(
                kind = %kind,
                rows = data.row_count(),
                columns = data.column_count(),
                "Loaded tabular document"
            ),
            Document::Pdf(pdf) => info!(
                kind = %kind,
                pages = pdf.page_count(),
                text_chars = pdf.text.chars().count(),
                "Loaded pdf document"
            ),
            Document::None => {}
        }

        Ok(document)
    }
}
