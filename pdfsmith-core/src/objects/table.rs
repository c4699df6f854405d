//! Object arena
//!
//! Every indirect object of a document lives in one [`ObjectTable`], keyed by
//! [`ObjectId`]. Objects that came from a parsed file start out as a recorded
//! cross-reference location and are parsed on first access; the result is
//! memoized so later lookups are plain map hits.

use crate::error::{PdfError, Result};
use crate::objects::{ObjectId, PdfObject, PdfStream};
use crate::parser::filters::decode_stream;
use crate::parser::reader::ObjectSource;
use crate::parser::xref::XRefEntry;
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Longest chain of references-to-references followed by [`ObjectTable::resolve`].
const MAX_REFERENCE_CHAIN: usize = 32;

#[derive(Debug)]
struct Slot {
    location: Option<XRefEntry>,
    value: OnceLock<PdfObject>,
    /// Handed out through `get_mut` since it was loaded.
    edited: bool,
}

impl Slot {
    fn loaded(value: PdfObject) -> Self {
        Self {
            location: None,
            value: OnceLock::from(value),
            edited: false,
        }
    }

    fn deferred(location: XRefEntry) -> Self {
        Self {
            location: Some(location),
            value: OnceLock::new(),
            edited: false,
        }
    }
}

#[derive(Debug)]
pub struct ObjectTable {
    slots: BTreeMap<ObjectId, Slot>,
    source: Option<Arc<ObjectSource>>,
    next_number: u32,
}

impl Default for ObjectTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectTable {
    pub fn new() -> Self {
        Self {
            slots: BTreeMap::new(),
            source: None,
            next_number: 1,
        }
    }

    /// A table backed by a parsed file; objects listed in `locations` load lazily.
    pub(crate) fn with_source(
        source: Arc<ObjectSource>,
        locations: impl IntoIterator<Item = (ObjectId, XRefEntry)>,
    ) -> Self {
        let mut table = Self::new();
        for (id, location) in locations {
            table.bump_next_number(id);
            table.slots.insert(id, Slot::deferred(location));
        }
        table.source = Some(source);
        table
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.slots.contains_key(&id)
    }

    /// All object ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.slots.keys().copied()
    }

    /// The object number the next call to [`ObjectTable::add`] will use.
    pub fn next_number(&self) -> u32 {
        self.next_number
    }

    /// Number of objects already materialized.
    pub fn loaded_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }

    /// Look up an object, parsing it from the source buffer on first access.
    pub fn get(&self, id: ObjectId) -> Result<&PdfObject> {
        let slot = self.slots.get(&id).ok_or(PdfError::ObjectNotFound(id))?;
        if let Some(value) = slot.value.get() {
            return Ok(value);
        }

        let (location, source) = match (slot.location, self.source.as_ref()) {
            (Some(location), Some(source)) => (location, source),
            _ => {
                return Err(PdfError::InternalConsistency(format!(
                    "object {id} has neither a value nor a source location"
                )))
            }
        };

        let value = source.load(self, id, location)?;
        // A concurrent reader may have won the race; both parsed the same bytes.
        let _ = slot.value.set(value);
        slot.value
            .get()
            .ok_or_else(|| PdfError::InternalConsistency(format!("object {id} failed to load")))
    }

    /// Mutable access; loads the object first if needed.
    pub fn get_mut(&mut self, id: ObjectId) -> Result<&mut PdfObject> {
        self.get(id)?;
        let slot = self.slots.get_mut(&id).ok_or(PdfError::ObjectNotFound(id))?;
        slot.edited = true;
        slot.value.get_mut().ok_or(PdfError::ObjectNotFound(id))
    }

    /// Whether the parsed file itself has object `from` referring to `to`.
    ///
    /// Objects edited in place are checked against their original bytes;
    /// objects inserted after parsing never count as parsed input.
    pub(crate) fn source_refers_to(&self, from: ObjectId, to: ObjectId) -> bool {
        let Some(slot) = self.slots.get(&from) else {
            return false;
        };
        let (Some(location), Some(source)) = (slot.location, self.source.as_ref()) else {
            return false;
        };
        let mut found = false;
        let mut check = |id: ObjectId| found |= id == to;
        match (slot.edited, slot.value.get()) {
            (false, Some(value)) => value.for_each_reference(&mut check),
            _ => match source.load(self, from, location) {
                Ok(original) => original.for_each_reference(&mut check),
                Err(_) => return false,
            },
        }
        found
    }

    /// Follow references until a direct value is reached.
    pub fn resolve<'a>(&'a self, object: &'a PdfObject) -> Result<&'a PdfObject> {
        let mut current = object;
        for _ in 0..MAX_REFERENCE_CHAIN {
            match current {
                PdfObject::Reference(id) => current = self.get(*id)?,
                other => return Ok(other),
            }
        }
        Err(PdfError::Parse(crate::parser::ParseError::CircularReference(
            format!("reference chain longer than {MAX_REFERENCE_CHAIN}"),
        )))
    }

    /// Insert or replace an object under a fixed id.
    pub fn insert(&mut self, id: ObjectId, object: PdfObject) {
        self.bump_next_number(id);
        self.slots.insert(id, Slot::loaded(object));
    }

    /// Store an object under a fresh id.
    pub fn add(&mut self, object: impl Into<PdfObject>) -> ObjectId {
        let id = ObjectId::new(self.next_number, 0);
        self.insert(id, object.into());
        id
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<PdfObject> {
        self.slots.remove(&id).and_then(|slot| slot.value.into_inner())
    }

    /// Drop every object numbered `number` or above and reuse those numbers.
    pub(crate) fn discard_from(&mut self, number: u32) {
        self.slots.retain(|id, _| id.number() < number);
        if number < self.next_number {
            self.next_number = number.max(1);
        }
    }

    /// Decode a stream, resolving an indirect `/Filter` or `/DecodeParms` first.
    pub fn decode_stream(&self, stream: &PdfStream) -> Result<Vec<u8>> {
        let needs_resolution = ["Filter", "DecodeParms"]
            .iter()
            .any(|key| matches!(stream.dict.get(key), Some(PdfObject::Reference(_))));

        if !needs_resolution {
            return Ok(decode_stream(&stream.data, &stream.dict)?);
        }

        let mut dict = stream.dict.clone();
        for key in ["Filter", "DecodeParms"] {
            if let Some(value) = stream.dict.get(key) {
                dict.set(key, self.resolve(value)?.clone());
            }
        }
        Ok(decode_stream(&stream.data, &dict)?)
    }

    /// Materialize every object. Used for eager parsing.
    pub fn load_all(&self) -> Result<()> {
        for id in self.slots.keys() {
            self.get(*id)?;
        }
        Ok(())
    }

    fn bump_next_number(&mut self, id: ObjectId) {
        if id.number() >= self.next_number {
            self.next_number = id.number().saturating_add(1);
        }
    }
}
