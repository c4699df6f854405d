use crate::objects::{PdfName, PdfObject};
use indexmap::IndexMap;

/// Dictionary keyed by name. Entries keep their insertion order so that
/// serialization is stable from run to run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfDictionary(pub IndexMap<PdfName, PdfObject>);

impl PdfDictionary {
    pub fn new() -> Self {
        Self(IndexMap::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity(capacity))
    }

    pub fn set(&mut self, key: impl Into<PdfName>, value: impl Into<PdfObject>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PdfObject> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut PdfObject> {
        self.0.get_mut(key)
    }

    /// Remove a key while keeping the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<PdfObject> {
        self.0.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &PdfName> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PdfName, &PdfObject)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&PdfName, &mut PdfObject)> {
        self.0.iter_mut()
    }

    /// Value of `/Type`, if it is a name.
    pub fn get_type(&self) -> Option<&str> {
        self.get("Type").and_then(PdfObject::as_name)
    }

    pub fn get_name(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(PdfObject::as_name)
    }

    pub fn get_integer(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(PdfObject::as_integer)
    }

    pub fn get_dict(&self, key: &str) -> Option<&PdfDictionary> {
        match self.get(key) {
            Some(PdfObject::Dictionary(dict)) => Some(dict),
            _ => None,
        }
    }
}

impl FromIterator<(PdfName, PdfObject)> for PdfDictionary {
    fn from_iter<T: IntoIterator<Item = (PdfName, PdfObject)>>(iter: T) -> Self {
        PdfDictionary(iter.into_iter().collect())
    }
}
