use crate::objects::PdfObject;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PdfArray(pub Vec<PdfObject>);

impl PdfArray {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PdfObject> {
        self.0.get(index)
    }

    pub fn push(&mut self, value: impl Into<PdfObject>) {
        self.0.push(value.into());
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PdfObject> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PdfObject> {
        self.0.iter_mut()
    }

    /// Read the array as a rectangle or matrix of numbers.
    pub fn as_numbers(&self) -> Option<Vec<f64>> {
        self.0.iter().map(PdfObject::as_real).collect()
    }
}

impl FromIterator<PdfObject> for PdfArray {
    fn from_iter<T: IntoIterator<Item = PdfObject>>(iter: T) -> Self {
        PdfArray(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a PdfArray {
    type Item = &'a PdfObject;
    type IntoIter = std::slice::Iter<'a, PdfObject>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
