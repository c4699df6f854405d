use crate::objects::{PdfArray, PdfDictionary, PdfStream};
use crate::text::encoding::decode_text_string;
use std::fmt;

/// Identifier of an indirect object: object number plus generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId {
    number: u32,
    generation: u16,
}

impl ObjectId {
    pub fn new(number: u32, generation: u16) -> Self {
        Self { number, generation }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn generation(&self) -> u16 {
        self.generation
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} R", self.number, self.generation)
    }
}

/// A PDF name without the leading slash.
///
/// Names are byte sequences in PDF. Each byte is kept as the char with the
/// same code point (U+0000..U+00FF), so `#xx` escapes round-trip exactly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PdfName(pub String);

impl PdfName {
    pub fn new(name: impl Into<String>) -> Self {
        PdfName(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PdfName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.0)
    }
}

impl std::borrow::Borrow<str> for PdfName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PdfName {
    fn from(s: &str) -> Self {
        PdfName(s.to_string())
    }
}

impl From<String> for PdfName {
    fn from(s: String) -> Self {
        PdfName(s)
    }
}

/// How a string was written in the source, kept so rewrites look familiar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StringFormat {
    #[default]
    Literal,
    Hexadecimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfString {
    bytes: Vec<u8>,
    format: StringFormat,
}

impl PdfString {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: StringFormat::Literal,
        }
    }

    pub fn hex(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            format: StringFormat::Hexadecimal,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> StringFormat {
        self.format
    }

    /// Decode as a PDF text string (UTF-16BE with BOM, UTF-8 with BOM, or PDFDocEncoding).
    pub fn to_text(&self) -> String {
        decode_text_string(&self.bytes)
    }
}

impl From<&str> for PdfString {
    fn from(s: &str) -> Self {
        PdfString::new(s.as_bytes().to_vec())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PdfObject {
    Null,
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(PdfString),
    Name(PdfName),
    Array(PdfArray),
    Dictionary(PdfDictionary),
    Stream(PdfStream),
    Reference(ObjectId),
}

impl PdfObject {
    pub fn is_null(&self) -> bool {
        matches!(self, PdfObject::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PdfObject::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            PdfObject::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Numeric value of an integer or real.
    pub fn as_real(&self) -> Option<f64> {
        match self {
            PdfObject::Real(f) => Some(*f),
            PdfObject::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&PdfString> {
        match self {
            PdfObject::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            PdfObject::Name(n) => Some(n.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&PdfArray> {
        match self {
            PdfObject::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// The dictionary of a dictionary or of a stream.
    pub fn as_dict(&self) -> Option<&PdfDictionary> {
        match self {
            PdfObject::Dictionary(dict) => Some(dict),
            PdfObject::Stream(stream) => Some(&stream.dict),
            _ => None,
        }
    }

    pub fn as_dict_mut(&mut self) -> Option<&mut PdfDictionary> {
        match self {
            PdfObject::Dictionary(dict) => Some(dict),
            PdfObject::Stream(stream) => Some(&mut stream.dict),
            _ => None,
        }
    }

    pub fn as_stream(&self) -> Option<&PdfStream> {
        match self {
            PdfObject::Stream(stream) => Some(stream),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<ObjectId> {
        match self {
            PdfObject::Reference(id) => Some(*id),
            _ => None,
        }
    }

    /// Short label used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            PdfObject::Null => "null",
            PdfObject::Boolean(_) => "boolean",
            PdfObject::Integer(_) => "integer",
            PdfObject::Real(_) => "real",
            PdfObject::String(_) => "string",
            PdfObject::Name(_) => "name",
            PdfObject::Array(_) => "array",
            PdfObject::Dictionary(_) => "dictionary",
            PdfObject::Stream(_) => "stream",
            PdfObject::Reference(_) => "reference",
        }
    }

    /// Visit every indirect reference nested in this value, in written order.
    pub fn for_each_reference(&self, f: &mut impl FnMut(ObjectId)) {
        match self {
            PdfObject::Reference(id) => f(*id),
            PdfObject::Array(arr) => {
                for item in arr.iter() {
                    item.for_each_reference(f);
                }
            }
            PdfObject::Dictionary(dict) => {
                for (_, value) in dict.iter() {
                    value.for_each_reference(f);
                }
            }
            PdfObject::Stream(stream) => {
                for (_, value) in stream.dict.iter() {
                    value.for_each_reference(f);
                }
            }
            _ => {}
        }
    }
}

impl From<bool> for PdfObject {
    fn from(b: bool) -> Self {
        PdfObject::Boolean(b)
    }
}

impl From<i32> for PdfObject {
    fn from(i: i32) -> Self {
        PdfObject::Integer(i as i64)
    }
}

impl From<i64> for PdfObject {
    fn from(i: i64) -> Self {
        PdfObject::Integer(i)
    }
}

impl From<usize> for PdfObject {
    fn from(i: usize) -> Self {
        PdfObject::Integer(i as i64)
    }
}

impl From<f64> for PdfObject {
    fn from(f: f64) -> Self {
        PdfObject::Real(f)
    }
}

impl From<PdfName> for PdfObject {
    fn from(n: PdfName) -> Self {
        PdfObject::Name(n)
    }
}

impl From<PdfString> for PdfObject {
    fn from(s: PdfString) -> Self {
        PdfObject::String(s)
    }
}

impl From<PdfArray> for PdfObject {
    fn from(a: PdfArray) -> Self {
        PdfObject::Array(a)
    }
}

impl From<Vec<PdfObject>> for PdfObject {
    fn from(v: Vec<PdfObject>) -> Self {
        PdfObject::Array(PdfArray(v))
    }
}

impl From<PdfDictionary> for PdfObject {
    fn from(d: PdfDictionary) -> Self {
        PdfObject::Dictionary(d)
    }
}

impl From<PdfStream> for PdfObject {
    fn from(s: PdfStream) -> Self {
        PdfObject::Stream(s)
    }
}

impl From<ObjectId> for PdfObject {
    fn from(id: ObjectId) -> Self {
        PdfObject::Reference(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_display() {
        assert_eq!(ObjectId::new(12, 3).to_string(), "12 3 R");
    }

    #[test]
    fn test_object_id_ordering() {
        assert!(ObjectId::new(1, 5) < ObjectId::new(2, 0));
        assert!(ObjectId::new(2, 0) < ObjectId::new(2, 1));
    }

    #[test]
    fn test_as_real_accepts_integers() {
        assert_eq!(PdfObject::Integer(7).as_real(), Some(7.0));
        assert_eq!(PdfObject::Real(1.5).as_real(), Some(1.5));
        assert_eq!(PdfObject::Null.as_real(), None);
    }

    #[test]
    fn test_for_each_reference_order() {
        let mut dict = PdfDictionary::new();
        dict.set("A", ObjectId::new(3, 0));
        dict.set(
            "B",
            vec![PdfObject::Reference(ObjectId::new(1, 0)), PdfObject::Integer(4)],
        );
        let obj = PdfObject::Dictionary(dict);

        let mut seen = Vec::new();
        obj.for_each_reference(&mut |id| seen.push(id.number()));
        assert_eq!(seen, vec![3, 1]);
    }

    #[test]
    fn test_string_to_text_utf16() {
        let s = PdfString::hex(vec![0xFE, 0xFF, 0x00, 0x48, 0x00, 0x69]);
        assert_eq!(s.to_text(), "Hi");
        assert_eq!(s.format(), StringFormat::Hexadecimal);
    }
}
