use crate::objects::{PdfDictionary, PdfName, PdfObject};
use crate::parser::filters::decode_stream;
use crate::parser::ParseResult;

/// A stream object: its dictionary plus the payload exactly as stored,
/// still encoded with whatever `/Filter` chain the dictionary declares.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfStream {
    pub dict: PdfDictionary,
    pub data: Vec<u8>,
}

impl PdfStream {
    pub fn new(dict: PdfDictionary, data: Vec<u8>) -> Self {
        Self { dict, data }
    }

    /// An unfiltered stream whose `/Length` matches `data`.
    pub fn from_content(data: Vec<u8>) -> Self {
        let mut dict = PdfDictionary::new();
        dict.set("Length", data.len());
        Self { dict, data }
    }

    /// Raw payload, no filters applied.
    pub fn raw_data(&self) -> &[u8] {
        &self.data
    }

    /// Names of the declared filters, in application order.
    pub fn filters(&self) -> Vec<&str> {
        match self.dict.get("Filter") {
            Some(PdfObject::Name(name)) => vec![name.as_str()],
            Some(PdfObject::Array(arr)) => arr.iter().filter_map(PdfObject::as_name).collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_filtered(&self) -> bool {
        !self.filters().is_empty()
    }

    /// Decode the payload through the declared filter chain.
    ///
    /// `/Filter` and `/DecodeParms` must be direct values here; callers holding
    /// an object table should go through `ObjectTable::decode_stream`.
    pub fn decode(&self) -> ParseResult<Vec<u8>> {
        decode_stream(&self.data, &self.dict)
    }

    /// Replace the payload with already-decoded bytes and drop the filter entries.
    pub fn set_decoded(&mut self, data: Vec<u8>) {
        self.dict.remove("Filter");
        self.dict.remove("DecodeParms");
        self.dict.set(PdfName::new("Length"), data.len());
        self.data = data;
    }
}
