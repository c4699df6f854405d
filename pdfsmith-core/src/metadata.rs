//! Document information dictionary helpers
//!
//! Text entries of `/Info` are PDF text strings (PDFDocEncoding or UTF-16BE);
//! dates use the `D:YYYYMMDDHHmmSSOHH'mm'` form of ISO 32000-1 Section 7.9.4.

use crate::objects::{PdfDictionary, PdfObject};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

/// Decoded view of the common `/Info` entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Document subject
    pub subject: Option<String>,
    /// Document keywords
    pub keywords: Option<String>,
    /// Software that created the original document
    pub creator: Option<String>,
    /// Software that produced the PDF
    pub producer: Option<String>,
    pub creation_date: Option<DateTime<FixedOffset>>,
    pub modification_date: Option<DateTime<FixedOffset>>,
}

impl Metadata {
    pub fn from_info(info: &PdfDictionary) -> Self {
        let text = |key: &str| {
            info.get(key)
                .and_then(PdfObject::as_string)
                .map(|s| s.to_text())
        };
        let date = |key: &str| text(key).as_deref().and_then(parse_pdf_date);

        Self {
            title: text("Title"),
            author: text("Author"),
            subject: text("Subject"),
            keywords: text("Keywords"),
            creator: text("Creator"),
            producer: text("Producer"),
            creation_date: date("CreationDate"),
            modification_date: date("ModDate"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Format a timestamp as a PDF date string.
pub fn format_pdf_date(date: DateTime<Utc>) -> String {
    date.format("D:%Y%m%d%H%M%SZ").to_string()
}

/// Parse a PDF date string. Missing trailing fields default to their
/// minimum; a missing offset means UTC.
pub fn parse_pdf_date(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    let text = text.strip_prefix("D:").unwrap_or(text);
    let digits_end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (digits, zone) = text.split_at(digits_end);
    if digits.len() < 4 {
        return None;
    }

    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match digits.get(range) {
            Some(s) if !s.is_empty() => s.parse().ok(),
            _ => Some(default),
        }
    };
    let year: i32 = digits[..4].parse().ok()?;
    let month = field(4..6, 1)?;
    let day = field(6..8, 1)?;
    let hour = field(8..10, 0)?;
    let minute = field(10..12, 0)?;
    let second = field(12..14, 0)?;

    let offset_seconds = match zone.chars().next() {
        Some(sign @ ('+' | '-')) => {
            let rest: String = zone[1..].chars().filter(char::is_ascii_digit).collect();
            let hours: i32 = rest.get(..2).and_then(|s| s.parse().ok()).unwrap_or(0);
            let minutes: i32 = rest.get(2..4).and_then(|s| s.parse().ok()).unwrap_or(0);
            let seconds = hours * 3600 + minutes * 60;
            if sign == '-' {
                -seconds
            } else {
                seconds
            }
        }
        _ => 0,
    };

    let offset = FixedOffset::east_opt(offset_seconds)?;
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second)?;
    offset.from_local_datetime(&naive).single()
}
