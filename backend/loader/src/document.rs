use std::sync::Arc;

use crate::kind::DocumentKind;
use crate::pdf::PdfExtraction;
use crate::tabular::TabularDataset;

/// The document currently bound to a session. At most one is held at a time.
#[derive(Debug, Clone, Default)]
pub enum Document {
    #[default]
    None,
    Tabular(Arc<TabularDataset>),
    Pdf(PdfExtraction),
}

impl Document {
    pub fn is_loaded(&self) -> bool {
        !matches!(self, Document::None)
    }

    pub fn as_tabular(&self) -> Option<&Arc<TabularDataset>> {
        match self {
            Document::Tabular(data) => Some(data),
            _ => None,
        }
    }

    pub fn as_pdf(&self) -> Option<&PdfExtraction> {
        match self {
            Document::Pdf(pdf) => Some(pdf),
            _ => None,
        }
    }

    /// Short label of the bound variant, for display and logs.
    pub fn kind_label(&self) -> &'static str {
        match self {
            Document::None => "none",
            Document::Tabular(_) => "tabular",
            Document::Pdf(_) => DocumentKind::Pdf.extension(),
        }
    }
}
