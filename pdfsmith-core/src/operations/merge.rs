//! PDF merging functionality
//!
//! Concatenates the pages of several documents into a new one. Every source
//! is deep-copied, so the result shares nothing with its inputs.

use super::copy::{copy_info, ObjectCopier};
use crate::document::Document;
use crate::error::{PdfError, Result};

/// Merge `documents` in order into a new document.
///
/// The first document's `/Info` is kept. The header version is the highest
/// among the sources.
pub fn merge<'a>(documents: impl IntoIterator<Item = &'a Document>) -> Result<Document> {
    let documents: Vec<&Document> = documents.into_iter().collect();
    let Some(first) = documents.first() else {
        return Err(PdfError::EmptyInput);
    };

    let mut dest = Document::new();
    dest.set_version(first.version());

    for (i, source) in documents.iter().enumerate() {
        let page_ids = source.page_ids()?;
        let mut copier = ObjectCopier::new(source);
        copier.copy_pages(&mut dest, &page_ids)?;
        if i == 0 {
            copy_info(&mut copier, source, &mut dest)?;
        }
        if source.version() > dest.version() {
            dest.set_version(source.version());
        }
        tracing::debug!("Merged document {} ({} pages)", i + 1, page_ids.len());
    }

    Ok(dest)
}
