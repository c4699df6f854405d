//! PDF page reordering and selection

use super::copy::extract_pages;
use crate::document::Document;
use crate::error::{PdfError, Result};

/// Build a new document from the pages at `indices`, in that order.
///
/// Indices must be distinct and in range; pages not listed are dropped.
pub fn select_pages(document: &Document, indices: &[usize]) -> Result<Document> {
    let page_count = document.page_count()?;
    let mut seen = vec![false; page_count];
    for &index in indices {
        let slot = seen.get_mut(index).ok_or(PdfError::PageIndexOutOfRange {
            index,
            page_count,
        })?;
        if std::mem::replace(slot, true) {
            return Err(PdfError::InvalidArgument(format!(
                "page {index} selected more than once"
            )));
        }
    }
    extract_pages(document, indices)
}

/// Build a new document with the pages in `order`, which must be a
/// permutation of `0..page_count`.
pub fn reorder(document: &Document, order: &[usize]) -> Result<Document> {
    let page_count = document.page_count()?;
    if order.len() != page_count {
        return Err(PdfError::InvalidArgument(format!(
            "order lists {} pages but the document has {page_count}",
            order.len()
        )));
    }
    if let Some(&index) = order.iter().find(|&&index| index >= page_count) {
        return Err(PdfError::InvalidArgument(format!(
            "page {index} is not in a {page_count}-page document"
        )));
    }
    select_pages(document, order)
}

/// Reverse the page order.
pub fn reverse(document: &Document) -> Result<Document> {
    let order: Vec<usize> = (0..document.page_count()?).rev().collect();
    reorder(document, &order)
}
