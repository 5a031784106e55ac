//! Upload kind detection by file extension.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use docquery_core::DocQueryError;
use serde::{Deserialize, Serialize};

/// The three document kinds a session accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Csv,
    Xlsx,
    Pdf,
}

impl DocumentKind {
    /// Detect the kind from a file name's extension (case-insensitive).
    pub fn from_filename(name: &str) -> Result<Self, DocQueryError> {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        ext.parse()
            .map_err(|_| DocQueryError::UnsupportedKind(name.to_string()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Csv => "csv",
            DocumentKind::Xlsx => "xlsx",
            DocumentKind::Pdf => "pdf",
        }
    }

    pub fn is_tabular(&self) -> bool {
        matches!(self, DocumentKind::Csv | DocumentKind::Xlsx)
    }
}

impl FromStr for DocumentKind {
    type Err = DocQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "csv" => Ok(DocumentKind::Csv),
            "xlsx" => Ok(DocumentKind::Xlsx),
            "pdf" => Ok(DocumentKind::Pdf),
            other => Err(DocQueryError::UnsupportedKind(other.to_string())),
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
