//! PDF Parser Module
//!
//! Turns a byte buffer into an [`ObjectTable`](crate::objects::ObjectTable)
//! plus trailer: header check, cross-reference chain (tables and streams),
//! object streams and stream filters. Indirect objects are parsed lazily.

pub mod content;
pub mod filters;
pub mod header;
pub mod lexer;
pub mod object_stream;
pub mod objects;
pub mod reader;
pub mod recovery;
pub mod xref;
pub mod xref_stream;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use self::content::{ContentOperation, ContentParser, RawOperation, TextElement};
pub use self::lexer::{Lexer, Token};
pub use self::objects::ObjectParser;

/// Result type for parser operations
pub type ParseResult<T> = Result<T, ParseError>;

/// PDF Parser errors
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid PDF header")]
    InvalidHeader,

    #[error("Syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Unexpected token at position {position}: expected {expected}, found {found}")]
    UnexpectedToken {
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Unexpected end of data at position {position}")]
    UnexpectedEof { position: usize },

    #[error("Invalid object reference: {0} {1} R")]
    InvalidReference(u32, u16),

    #[error("Missing required key: {0}")]
    MissingKey(String),

    #[error("Invalid xref at offset {offset}: {message}")]
    InvalidXRef { offset: usize, message: String },

    #[error("No trailer or startxref found")]
    MissingTrailer,

    #[error("Circular reference detected: {0}")]
    CircularReference(String),

    #[error("Nesting too deep at position {position}")]
    NestingTooDeep { position: usize },

    #[error("Stream decode error: {0}")]
    StreamDecodeError(String),

    #[error("Unsupported filter: {0}")]
    UnsupportedFilter(String),

    #[error("Encryption not supported")]
    EncryptionNotSupported,
}

/// Options controlling how strictly a buffer is parsed.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Recover from wrong stream lengths and rebuild a broken xref by scanning.
    pub lenient: bool,
    /// Parse every indirect object up front instead of on first access.
    pub load_all: bool,
    /// Maximum nesting of arrays and dictionaries.
    pub max_nesting_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self::strict()
    }
}

impl ParseOptions {
    pub fn strict() -> Self {
        Self {
            lenient: false,
            load_all: false,
            max_nesting_depth: 256,
        }
    }

    pub fn lenient() -> Self {
        Self {
            lenient: true,
            ..Self::strict()
        }
    }

    pub fn with_load_all(mut self, load_all: bool) -> Self {
        self.load_all = load_all;
        self
    }

    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }
}
