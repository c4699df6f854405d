//! PDF operations module
//!
//! High-level operations over whole documents: merging, splitting,
//! reordering, rotating pages and stamping overlays onto them. Operations
//! that produce new documents deep-copy from their sources and never modify
//! them.

mod copy;
pub mod merge;
pub mod overlay;
pub mod reorder;
pub mod rotate;
pub mod split;
pub mod watermark;

pub use merge::merge;
pub use overlay::{overlay, overlay_page};
pub use reorder::{reorder, reverse, select_pages};
pub use rotate::{rotate_pages, RotationAngle};
pub use split::{split, split_into_pages, split_ranges};
pub use watermark::{apply_stamp, watermark, PageContentProducer, StampInstructions, TextStampProducer};

use crate::error::{PdfError, Result};

/// A set of pages to operate on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRange {
    /// All pages
    All,
    /// Single page (0-based index)
    Single(usize),
    /// Range of pages (inclusive, 0-based)
    Range(usize, usize),
    /// List of specific pages (0-based indices)
    List(Vec<usize>),
}

impl PageRange {
    /// Parse a page range from a string
    ///
    /// Examples:
    /// - "all" -> All pages
    /// - "1" -> Single page (converts to 0-based)
    /// - "1-5" -> Range of pages (converts to 0-based)
    /// - "1,3,5" -> List of pages (converts to 0-based)
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.eq_ignore_ascii_case("all") {
            return Ok(PageRange::All);
        }

        if let Ok(page) = s.parse::<usize>() {
            return Ok(PageRange::Single(to_index(page)?));
        }

        if let Some((start, end)) = s.split_once('-') {
            let start = to_index(parse_number(start)?)?;
            let end = to_index(parse_number(end)?)?;
            if start > end {
                return Err(invalid(format!(
                    "Start {} is greater than end {}",
                    start + 1,
                    end + 1
                )));
            }
            return Ok(PageRange::Range(start, end));
        }

        if s.contains(',') {
            let pages = s
                .split(',')
                .map(|p| parse_number(p).and_then(to_index))
                .collect::<Result<Vec<_>>>()?;
            return Ok(PageRange::List(pages));
        }

        Err(invalid(format!("Invalid format: {s}")))
    }

    /// Get the page indices for this range
    pub fn get_indices(&self, total_pages: usize) -> Result<Vec<usize>> {
        let check = |index: usize| {
            if index < total_pages {
                Ok(index)
            } else {
                Err(PdfError::PageIndexOutOfRange {
                    index,
                    page_count: total_pages,
                })
            }
        };

        match self {
            PageRange::All => Ok((0..total_pages).collect()),
            PageRange::Single(idx) => Ok(vec![check(*idx)?]),
            PageRange::Range(start, end) => {
                check(*start)?;
                check(*end)?;
                Ok((*start..=*end).collect())
            }
            PageRange::List(pages) => pages.iter().map(|&page| check(page)).collect(),
        }
    }
}

impl std::str::FromStr for PageRange {
    type Err = PdfError;

    fn from_str(s: &str) -> Result<Self> {
        PageRange::parse(s)
    }
}

fn parse_number(text: &str) -> Result<usize> {
    text.trim()
        .parse::<usize>()
        .map_err(|_| invalid(format!("Invalid page: {}", text.trim())))
}

fn to_index(page: usize) -> Result<usize> {
    page.checked_sub(1)
        .ok_or_else(|| invalid("Page numbers start at 1".to_string()))
}

fn invalid(message: String) -> PdfError {
    PdfError::InvalidArgument(format!("page range: {message}"))
}
