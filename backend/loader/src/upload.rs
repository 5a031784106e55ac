use bytes::Bytes;
use docquery_core::Result;

use crate::kind::DocumentKind;

/// An uploaded file: raw bytes plus the kind declared by its name.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Bytes,
}

impl UploadedFile {
    /// Accept an upload. Unsupported extensions are rejected here, before
    /// any parsing is attempted.
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Result<Self> {
        let name = name.into();
        let kind = DocumentKind::from_filename(&name)?;
        Ok(Self {
            name,
            kind,
            bytes: bytes.into(),
        })
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquery_core::DocQueryError;

    #[test]
    fn unsupported_upload_is_rejected_up_front() {
        let err = UploadedFile::new("image.png", vec![0x89, 0x50]).unwrap_err();
        assert!(matches!(err, DocQueryError::UnsupportedKind(_)));
    }

    #[test]
    fn keeps_name_and_bytes() {
        let file = UploadedFile::new("a.csv", "x\n1\n").unwrap();
        assert_eq!(file.kind, DocumentKind::Csv);
        assert_eq!(file.size(), 4);
    }
}
