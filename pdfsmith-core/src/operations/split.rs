//! PDF splitting functionality
//!
//! Boundaries partition the pages into contiguous half-open ranges:
//! `[0, b0), [b0, b1), ..., [b_last, page_count)`.

use super::copy::extract_pages;
use crate::document::Document;
use crate::error::{PdfError, Result};
use std::ops::Range;

/// Check `boundaries` against `page_count` and turn them into page ranges.
pub fn split_ranges(page_count: usize, boundaries: &[usize]) -> Result<Vec<Range<usize>>> {
    let mut ranges = Vec::with_capacity(boundaries.len() + 1);
    let mut start = 0;
    for &boundary in boundaries {
        if boundary == 0 || boundary >= page_count {
            return Err(PdfError::InvalidArgument(format!(
                "split boundary {boundary} must lie strictly between 0 and {page_count}"
            )));
        }
        if boundary <= start {
            return Err(PdfError::InvalidArgument(format!(
                "split boundaries must be strictly increasing ({boundary} after {start})"
            )));
        }
        ranges.push(start..boundary);
        start = boundary;
    }
    ranges.push(start..page_count);
    Ok(ranges)
}

/// Split `document` at `boundaries` into independent documents.
pub fn split(document: &Document, boundaries: &[usize]) -> Result<Vec<Document>> {
    let ranges = split_ranges(document.page_count()?, boundaries)?;
    let parts = ranges
        .into_iter()
        .map(|range| {
            tracing::debug!("Building part with pages {:?}", range);
            extract_pages(document, &range.collect::<Vec<_>>())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(parts)
}

/// One document per page.
pub fn split_into_pages(document: &Document) -> Result<Vec<Document>> {
    let boundaries: Vec<usize> = (1..document.page_count()?).collect();
    split(document, &boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::test_helpers::{build_pdf, PdfSource};

    fn four_pages() -> Document {
        Document::parse(build_pdf(&PdfSource::pages(&[
            b"BT (p1) Tj ET",
            b"BT (p2) Tj ET",
            b"BT (p3) Tj ET",
            b"BT (p4) Tj ET",
        ])))
        .unwrap()
    }

    #[test]
    fn test_ranges() {
        assert_eq!(split_ranges(4, &[]).unwrap(), vec![0..4]);
        assert_eq!(split_ranges(4, &[1, 3]).unwrap(), vec![0..1, 1..3, 3..4]);
    }

    #[test]
    fn test_invalid_boundaries() {
        for boundaries in [&[0][..], &[4], &[2, 2], &[3, 1], &[1, 9]] {
            let err = split_ranges(4, boundaries).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "{boundaries:?}");
        }
    }

    #[test]
    fn test_split_parts() {
        let doc = four_pages();
        let parts = split(&doc, &[1, 3]).unwrap();
        let counts: Vec<usize> = parts.iter().map(|p| p.page_count().unwrap()).collect();
        assert_eq!(counts, vec![1, 2, 1]);
        assert_eq!(parts[1].extract_text(1).unwrap(), "p3");
    }

    #[test]
    fn test_split_single_page_document() {
        let doc = Document::parse(build_pdf(&PdfSource::single_page(b"BT (only) Tj ET"))).unwrap();
        assert_eq!(split(&doc, &[]).unwrap().len(), 1);
        assert_eq!(split_into_pages(&doc).unwrap().len(), 1);
        assert_eq!(split(&doc, &[1]).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_split_into_pages() {
        let parts = split_into_pages(&four_pages()).unwrap();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[3].extract_text(0).unwrap(), "p4");
    }
}
