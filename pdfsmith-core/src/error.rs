use crate::objects::ObjectId;
use crate::parser::ParseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed document: {0}")]
    Parse(ParseError),

    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    #[error("Page index {index} out of range (document has {page_count} pages)")]
    PageIndexOutOfRange { index: usize, page_count: usize },

    #[error("Object {0} not found")]
    ObjectNotFound(ObjectId),

    #[error("Invalid rotation: {0} degrees (must be a multiple of 90)")]
    InvalidRotation(i64),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No documents to process")]
    EmptyInput,

    #[error("Object {from} refers to missing object {to}")]
    MissingReference { from: ObjectId, to: ObjectId },

    #[error("Dangling reference to {to} from {from}")]
    DanglingReference { from: ObjectId, to: ObjectId },

    #[error("Internal consistency error: {0}")]
    InternalConsistency(String),
}

/// Error categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    MalformedDocument,
    UnsupportedFeature,
    IndexOutOfRange,
    InvalidArgument,
    EmptyInput,
    InternalConsistency,
}

impl PdfError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PdfError::Io(_) => ErrorKind::Io,
            PdfError::Parse(_) | PdfError::MissingReference { .. } => {
                ErrorKind::MalformedDocument
            }
            PdfError::UnsupportedFeature(_) => ErrorKind::UnsupportedFeature,
            PdfError::PageIndexOutOfRange { .. } | PdfError::ObjectNotFound(_) => {
                ErrorKind::IndexOutOfRange
            }
            PdfError::InvalidRotation(_) | PdfError::InvalidArgument(_) => {
                ErrorKind::InvalidArgument
            }
            PdfError::EmptyInput => ErrorKind::EmptyInput,
            PdfError::DanglingReference { .. } | PdfError::InternalConsistency(_) => {
                ErrorKind::InternalConsistency
            }
        }
    }
}

impl From<ParseError> for PdfError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::EncryptionNotSupported => {
                PdfError::UnsupportedFeature("encrypted documents".to_string())
            }
            ParseError::UnsupportedFilter(name) => {
                PdfError::UnsupportedFeature(format!("stream filter /{name}"))
            }
            other => PdfError::Parse(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, PdfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encryption_maps_to_unsupported() {
        let err: PdfError = ParseError::EncryptionNotSupported.into();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn test_syntax_error_maps_to_malformed() {
        let err: PdfError = ParseError::SyntaxError {
            position: 42,
            message: "bad token".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
        assert!(err.to_string().contains("42"));
    }

    #[test]
    fn test_page_index_message() {
        let err = PdfError::PageIndexOutOfRange {
            index: 5,
            page_count: 3,
        };
        assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
        assert_eq!(
            err.to_string(),
            "Page index 5 out of range (document has 3 pages)"
        );
    }

    #[test]
    fn test_dangling_reference_is_internal() {
        let err = PdfError::DanglingReference {
            from: ObjectId::new(1, 0),
            to: ObjectId::new(9, 0),
        };
        assert_eq!(err.kind(), ErrorKind::InternalConsistency);
        assert_eq!(err.to_string(), "Dangling reference to 9 0 R from 1 0 R");
    }

    #[test]
    fn test_missing_reference_is_malformed() {
        let err = PdfError::MissingReference {
            from: ObjectId::new(3, 0),
            to: ObjectId::new(40, 0),
        };
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
        assert_eq!(err.to_string(), "Object 3 0 R refers to missing object 40 0 R");
    }
}
