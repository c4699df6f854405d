//! Deep copy of page subgraphs between documents
//!
//! Objects reachable from the copied pages are duplicated into the
//! destination under fresh ids. Inherited page attributes are written onto
//! each copied page so that it no longer depends on the source page tree.
//! References to pages that are not part of the copy, and to page tree
//! nodes, become `null`.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{ObjectId, PdfArray, PdfDictionary, PdfObject, PdfStream};
use crate::page::{Page, INHERITABLE_KEYS};
use std::collections::{HashMap, VecDeque};

pub(crate) struct ObjectCopier<'s> {
    source: &'s Document,
    /// Source id to destination id, for everything copied so far.
    map: HashMap<ObjectId, ObjectId>,
    /// Pages being copied; references to them are kept.
    pages: HashMap<ObjectId, ObjectId>,
    queue: VecDeque<(ObjectId, ObjectId)>,
}

impl<'s> ObjectCopier<'s> {
    pub(crate) fn new(source: &'s Document) -> Self {
        Self {
            source,
            map: HashMap::new(),
            pages: HashMap::new(),
            queue: VecDeque::new(),
        }
    }

    /// Copy the given source pages into `dest`, appending them to its page
    /// tree in order. Returns the new page ids.
    pub(crate) fn copy_pages(
        &mut self,
        dest: &mut Document,
        page_ids: &[ObjectId],
    ) -> Result<Vec<ObjectId>> {
        let parent = dest.pages_root()?;

        // Reserve ids first so pages can refer to each other (annotations, links).
        let mut new_ids = Vec::with_capacity(page_ids.len());
        for &id in page_ids {
            let new_id = dest.objects_mut().add(PdfObject::Null);
            self.pages.insert(id, new_id);
            self.map.insert(id, new_id);
            new_ids.push(new_id);
        }

        for (&id, &new_id) in page_ids.iter().zip(&new_ids) {
            let mut dict = localized_page(self.source, id)?;
            dict.remove("Parent");
            let mut copied = self.translate_dict(dest, &dict)?;
            copied.set("Parent", parent);
            dest.objects_mut().insert(new_id, copied.into());
        }
        self.drain(dest)?;

        dest.attach_pages(&new_ids)?;
        tracing::debug!(
            "Copied {} pages ({} objects) into destination",
            page_ids.len(),
            self.map.len()
        );
        Ok(new_ids)
    }

    /// Copy a value that lives outside the page tree, such as `/Info`.
    pub(crate) fn copy_value(&mut self, dest: &mut Document, value: &PdfObject) -> Result<PdfObject> {
        let copied = self.translate(dest, value)?;
        self.drain(dest)?;
        Ok(copied)
    }

    fn drain(&mut self, dest: &mut Document) -> Result<()> {
        while let Some((source_id, dest_id)) = self.queue.pop_front() {
            let object = self.source.objects().get(source_id)?;
            let copied = self.translate(dest, object)?;
            tracing::trace!("Copied {} as {}", source_id, dest_id);
            dest.objects_mut().insert(dest_id, copied);
        }
        Ok(())
    }

    fn translate(&mut self, dest: &mut Document, value: &PdfObject) -> Result<PdfObject> {
        Ok(match value {
            PdfObject::Reference(id) => self.translate_reference(dest, *id)?,
            PdfObject::Array(arr) => {
                let mut copied = PdfArray::new();
                for item in arr.iter() {
                    copied.push(self.translate(dest, item)?);
                }
                PdfObject::Array(copied)
            }
            PdfObject::Dictionary(dict) => PdfObject::Dictionary(self.translate_dict(dest, dict)?),
            PdfObject::Stream(stream) => PdfObject::Stream(PdfStream::new(
                self.translate_dict(dest, &stream.dict)?,
                stream.data.clone(),
            )),
            other => other.clone(),
        })
    }

    fn translate_dict(&mut self, dest: &mut Document, dict: &PdfDictionary) -> Result<PdfDictionary> {
        let mut copied = PdfDictionary::with_capacity(dict.len());
        for (key, value) in dict.iter() {
            copied.set(key.clone(), self.translate(dest, value)?);
        }
        Ok(copied)
    }

    fn translate_reference(&mut self, dest: &mut Document, id: ObjectId) -> Result<PdfObject> {
        if let Some(&mapped) = self.map.get(&id) {
            return Ok(PdfObject::Reference(mapped));
        }

        let object = match self.source.objects().get(id) {
            Ok(object) => object,
            Err(PdfError::ObjectNotFound(_)) => {
                tracing::warn!("Reference to missing object {} copied as null", id);
                return Ok(PdfObject::Null);
            }
            Err(err) => return Err(err),
        };
        if matches!(
            object.as_dict().and_then(PdfDictionary::get_type),
            Some("Page" | "Pages")
        ) && !matches!(object, PdfObject::Stream(_))
        {
            // Another page or a tree node: not part of this copy.
            return Ok(PdfObject::Null);
        }

        let new_id = dest.objects_mut().add(PdfObject::Null);
        self.map.insert(id, new_id);
        self.queue.push_back((id, new_id));
        Ok(PdfObject::Reference(new_id))
    }
}

/// The page's own dictionary with inherited attributes filled in.
pub(crate) fn localized_page(source: &Document, id: ObjectId) -> Result<PdfDictionary> {
    let page = Page::load(source.objects(), id)?;
    let mut dict = page.dict().clone();
    for key in INHERITABLE_KEYS {
        if dict.contains_key(key) {
            continue;
        }
        if key == "Rotate" {
            let rotation = page.rotation();
            if rotation != 0 {
                dict.set("Rotate", rotation);
            }
        } else if let Some(value) = page.inherited_raw(key) {
            dict.set(key, value.clone());
        }
    }
    Ok(dict)
}

/// Copy the pages at `indices` of `source` into a fresh document.
pub(crate) fn extract_pages(source: &Document, indices: &[usize]) -> Result<Document> {
    let ids = source.page_ids()?;
    let selected = indices
        .iter()
        .map(|&index| {
            ids.get(index).copied().ok_or(PdfError::PageIndexOutOfRange {
                index,
                page_count: ids.len(),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut dest = Document::new();
    dest.set_version(source.version());
    let mut copier = ObjectCopier::new(source);
    copier.copy_pages(&mut dest, &selected)?;
    copy_info(&mut copier, source, &mut dest)?;
    Ok(dest)
}

pub(crate) fn copy_info(
    copier: &mut ObjectCopier<'_>,
    source: &Document,
    dest: &mut Document,
) -> Result<()> {
    if let Some(info) = source.info() {
        let info = PdfObject::Dictionary(info.clone());
        if let PdfObject::Dictionary(copied) = copier.copy_value(dest, &info)? {
            dest.set_info(copied);
        }
    }
    Ok(())
}
