//! PDF File Reader
//!
//! Ties the parser pieces together: header check, xref chain (or recovery),
//! encryption check, and an [`ObjectSource`] that materializes objects for
//! the [`ObjectTable`] on demand.

use super::header::{PdfHeader, PdfVersion};
use super::object_stream::ObjectStream;
use super::objects::ObjectParser;
use super::recovery::rebuild_xref;
use super::xref::{XRefEntry, XRefTable};
use super::{ParseError, ParseOptions, ParseResult};
use crate::error::{PdfError, Result};
use crate::objects::{ObjectId, ObjectTable, PdfDictionary, PdfObject};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

/// The raw bytes of a parsed file plus the caches needed to load objects.
#[derive(Debug)]
pub struct ObjectSource {
    data: Vec<u8>,
    options: ParseOptions,
    header_offset: usize,
    object_streams: Mutex<HashMap<u32, Arc<ObjectStream>>>,
    loading: Mutex<HashSet<ObjectId>>,
}

/// Everything `Document` needs from a parsed buffer.
#[derive(Debug)]
pub struct ParsedFile {
    pub objects: ObjectTable,
    pub trailer: PdfDictionary,
    pub version: PdfVersion,
}

/// Parse `data` into an object table and trailer.
pub fn read_file(data: Vec<u8>, options: &ParseOptions) -> Result<ParsedFile> {
    let header = PdfHeader::parse(&data)?;
    tracing::debug!("PDF version {} (header at {})", header.version, header.offset);

    let xref = match XRefTable::read(&data, options) {
        Ok(xref) => xref,
        Err(err) if options.lenient => {
            tracing::warn!("Cross-reference table unusable ({}), rebuilding", err);
            rebuild_xref(&data, options)?.0
        }
        Err(err) => return Err(err.into()),
    };

    let trailer = xref.trailer().clone();
    if trailer.contains_key("Encrypt") {
        return Err(ParseError::EncryptionNotSupported.into());
    }

    let locations: Vec<(ObjectId, XRefEntry)> = xref.live_objects().collect();
    tracing::debug!("{} live objects in cross-reference table", locations.len());

    let source = Arc::new(ObjectSource {
        data,
        options: options.clone(),
        header_offset: header.offset,
        object_streams: Mutex::new(HashMap::new()),
        loading: Mutex::new(HashSet::new()),
    });
    let objects = ObjectTable::with_source(source, locations);

    if options.load_all {
        objects.load_all()?;
    }

    Ok(ParsedFile {
        objects,
        trailer,
        version: header.version,
    })
}

/// Removes an id from the in-progress set when loading finishes or fails.
struct LoadingGuard<'a> {
    source: &'a ObjectSource,
    id: ObjectId,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        lock(&self.source.loading).remove(&self.id);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl ObjectSource {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Parse the object at `location`.
    pub(crate) fn load(
        &self,
        table: &ObjectTable,
        id: ObjectId,
        location: XRefEntry,
    ) -> Result<PdfObject> {
        if !lock(&self.loading).insert(id) {
            return Err(ParseError::CircularReference(format!("{id} refers to itself while loading")).into());
        }
        let _guard = LoadingGuard { source: self, id };
        tracing::trace!("Loading object {}", id);

        match location {
            XRefEntry::InUse { offset, .. } => self.load_uncompressed(table, id, offset),
            XRefEntry::Compressed {
                stream_number,
                index,
            } => self.load_compressed(table, id, stream_number, index),
            XRefEntry::Free => Err(PdfError::ObjectNotFound(id)),
        }
    }

    fn load_uncompressed(&self, table: &ObjectTable, id: ObjectId, offset: usize) -> Result<PdfObject> {
        let resolve_length = |length_id: ObjectId| {
            table
                .get(length_id)
                .ok()
                .and_then(PdfObject::as_integer)
                .and_then(|n| usize::try_from(n).ok())
        };

        let attempt = |offset: usize| -> ParseResult<PdfObject> {
            let mut parser = ObjectParser::with_options(&self.data, offset, &self.options);
            let (found, object) = parser.parse_indirect_object(&resolve_length)?;
            if found != id {
                return Err(ParseError::InvalidXRef {
                    offset,
                    message: format!("expected object {id}, found {found}"),
                });
            }
            Ok(object)
        };

        match attempt(offset) {
            Ok(object) => Ok(object),
            Err(err) if self.options.lenient && self.header_offset > 0 => {
                tracing::warn!("{}; retrying relative to the header", err);
                Ok(attempt(offset + self.header_offset)?)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn load_compressed(
        &self,
        table: &ObjectTable,
        id: ObjectId,
        stream_number: u32,
        index: u32,
    ) -> Result<PdfObject> {
        let objstm = self.object_stream(table, stream_number)?;

        let index = index as usize;
        let (number, object) = objstm.get(index, &self.options)?;
        if number == id.number() {
            return Ok(object);
        }

        // Some writers get the index wrong; the header tells the truth.
        let actual = objstm.index_of(id.number()).ok_or_else(|| {
            ParseError::InvalidXRef {
                offset: index,
                message: format!("object {id} not in object stream {stream_number}"),
            }
        })?;
        Ok(objstm.get(actual, &self.options)?.1)
    }

    fn object_stream(&self, table: &ObjectTable, stream_number: u32) -> Result<Arc<ObjectStream>> {
        if let Some(cached) = lock(&self.object_streams).get(&stream_number) {
            return Ok(Arc::clone(cached));
        }

        let stream_id = ObjectId::new(stream_number, 0);
        let stream = table.get(stream_id)?.as_stream().ok_or_else(|| {
            ParseError::SyntaxError {
                position: 0,
                message: format!("object stream {stream_id} is not a stream"),
            }
        })?;
        let decoded = table.decode_stream(stream)?;
        let parsed = Arc::new(ObjectStream::parse(stream, decoded)?);
        tracing::debug!("Parsed object stream {} ({} objects)", stream_id, parsed.len());

        lock(&self.object_streams).insert(stream_number, Arc::clone(&parsed));
        Ok(parsed)
    }
}
