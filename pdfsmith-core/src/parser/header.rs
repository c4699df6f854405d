//! PDF Header Parser
//!
//! Parses the `%PDF-M.m` signature according to ISO 32000-1 Section 7.5.2.

use super::objects::find_subsequence;
use super::{ParseError, ParseResult};

/// Readers accept the signature anywhere in the first kilobyte.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// PDF Version information
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct PdfVersion {
    pub major: u8,
    pub minor: u8,
}

impl PdfVersion {
    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Parse `"1.7"` style text, as found in the header or a catalog `/Version`.
    pub fn parse(text: &str) -> Option<Self> {
        let (major, minor) = text.trim().split_once('.')?;
        Some(Self::new(major.parse().ok()?, minor.parse().ok()?))
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        Self::new(1, 7)
    }
}

impl std::fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// PDF Header information
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfHeader {
    pub version: PdfVersion,
    /// Offset of `%PDF-`; junk before it shifts every xref offset.
    pub offset: usize,
}

impl PdfHeader {
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        let window = &data[..data.len().min(HEADER_SEARCH_WINDOW)];
        let offset = find_subsequence(window, b"%PDF-").ok_or(ParseError::InvalidHeader)?;

        let rest = &data[offset + 5..];
        let end = rest
            .iter()
            .position(|&b| !(b.is_ascii_digit() || b == b'.'))
            .unwrap_or(rest.len());
        let text = std::str::from_utf8(&rest[..end]).map_err(|_| ParseError::InvalidHeader)?;
        let version = PdfVersion::parse(text).ok_or(ParseError::InvalidHeader)?;

        Ok(Self { version, offset })
    }
}
