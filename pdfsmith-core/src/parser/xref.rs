//! PDF Cross-Reference Table Parser
//!
//! Reads the cross-reference chain according to ISO 32000-1 Section 7.5.4:
//! `startxref` is located by scanning backward from the end of the buffer,
//! then every section is read following `/Prev` (and `/XRefStm` for hybrid
//! files). Sections are visited newest first, so the first entry recorded for
//! an object number wins; that is last-writer-wins in file order.

use super::lexer::{Lexer, Token};
use super::objects::{rfind_subsequence, ObjectParser};
use super::xref_stream::parse_xref_stream;
use super::{ParseError, ParseOptions, ParseResult};
use crate::objects::{ObjectId, PdfDictionary, PdfObject};
use std::collections::{BTreeMap, HashSet};

/// Where an object lives in the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XRefEntry {
    /// Deleted; shadows any older in-use entry for the same number.
    Free,
    /// Uncompressed object at a byte offset.
    InUse { offset: usize, generation: u16 },
    /// Object `index` inside object stream `stream_number`.
    Compressed { stream_number: u32, index: u32 },
}

/// Trailer keys that describe one section rather than the document.
const SECTION_KEYS: [&str; 8] = [
    "Prev", "XRefStm", "Type", "W", "Index", "Length", "Filter", "DecodeParms",
];

/// Cross-reference table merged from every section of the chain.
#[derive(Debug, Clone, Default)]
pub struct XRefTable {
    entries: BTreeMap<u32, XRefEntry>,
    trailer: PdfDictionary,
}

impl XRefTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the whole chain starting at the last `startxref`.
    pub fn read(data: &[u8], options: &ParseOptions) -> ParseResult<Self> {
        let mut table = Self::new();
        let mut offset = find_startxref(data)?;
        let mut visited = HashSet::new();

        loop {
            if !visited.insert(offset) {
                tracing::warn!("Cross-reference chain loops back to offset {}", offset);
                break;
            }

            let (entries, trailer) = read_section(data, offset, options)?;
            tracing::debug!(
                "Read xref section at offset {} with {} entries",
                offset,
                entries.len()
            );
            table.merge_entries(entries);

            if let Some(stream_offset) = offset_value(&trailer, "XRefStm") {
                if visited.insert(stream_offset) {
                    let (entries, _) = read_section(data, stream_offset, options)?;
                    table.merge_entries(entries);
                }
            }

            let prev = offset_value(&trailer, "Prev");
            table.merge_trailer(trailer);
            match prev {
                Some(prev) => offset = prev,
                None => break,
            }
        }

        if !table.trailer.contains_key("Root") {
            return Err(ParseError::MissingKey("Root".to_string()));
        }
        Ok(table)
    }

    /// Record entries from an older section; existing entries are kept.
    pub fn merge_entries(&mut self, entries: impl IntoIterator<Item = (u32, XRefEntry)>) {
        for (number, entry) in entries {
            self.entries.entry(number).or_insert(entry);
        }
    }

    /// Record an entry, replacing whatever was there.
    pub fn set_entry(&mut self, number: u32, entry: XRefEntry) {
        self.entries.insert(number, entry);
    }

    fn merge_trailer(&mut self, trailer: PdfDictionary) {
        for (key, value) in trailer.0 {
            if SECTION_KEYS.contains(&key.as_str()) {
                continue;
            }
            self.trailer.0.entry(key).or_insert(value);
        }
    }

    pub fn set_trailer(&mut self, trailer: PdfDictionary) {
        self.trailer = PdfDictionary::new();
        self.merge_trailer(trailer);
    }

    pub fn trailer(&self) -> &PdfDictionary {
        &self.trailer
    }

    pub fn entry(&self, number: u32) -> Option<XRefEntry> {
        self.entries.get(&number).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Locations of every live object, free entries skipped.
    pub fn live_objects(&self) -> impl Iterator<Item = (ObjectId, XRefEntry)> + '_ {
        self.entries
            .iter()
            .filter_map(|(&number, &entry)| match entry {
                XRefEntry::Free => None,
                XRefEntry::InUse { generation, .. } => {
                    Some((ObjectId::new(number, generation), entry))
                }
                XRefEntry::Compressed { .. } => Some((ObjectId::new(number, 0), entry)),
            })
            .filter(|(id, _)| id.number() != 0)
    }

    /// Object numbers of every object stream referenced by compressed entries.
    pub fn object_stream_numbers(&self) -> Vec<u32> {
        let mut numbers: Vec<u32> = self
            .entries
            .values()
            .filter_map(|entry| match entry {
                XRefEntry::Compressed { stream_number, .. } => Some(*stream_number),
                _ => None,
            })
            .collect();
        numbers.sort_unstable();
        numbers.dedup();
        numbers
    }
}

fn offset_value(dict: &PdfDictionary, key: &str) -> Option<usize> {
    dict.get_integer(key).and_then(|v| usize::try_from(v).ok())
}

/// Offset named by the last `startxref` keyword in the buffer.
pub fn find_startxref(data: &[u8]) -> ParseResult<usize> {
    let position = rfind_subsequence(data, b"startxref").ok_or(ParseError::MissingTrailer)?;
    let mut lexer = Lexer::at(data, position + b"startxref".len());
    match lexer.next_token()? {
        Token::Integer(offset) if offset >= 0 && (offset as usize) < data.len() => {
            Ok(offset as usize)
        }
        other => Err(ParseError::InvalidXRef {
            offset: position,
            message: format!("startxref points at {}", other.describe()),
        }),
    }
}

/// Read one section (table or stream) and its trailer dictionary.
fn read_section(
    data: &[u8],
    offset: usize,
    options: &ParseOptions,
) -> ParseResult<(Vec<(u32, XRefEntry)>, PdfDictionary)> {
    if offset >= data.len() {
        return Err(ParseError::InvalidXRef {
            offset,
            message: "offset beyond end of data".to_string(),
        });
    }

    let mut lexer = Lexer::at(data, offset);
    lexer.skip_whitespace();
    if data[lexer.position()..].starts_with(b"xref") {
        return parse_table_section(data, lexer.position(), options);
    }

    let mut parser = ObjectParser::with_options(data, offset, options);
    let (_, object) = parser
        .parse_indirect_object(&|_| None)
        .map_err(|err| ParseError::InvalidXRef {
            offset,
            message: format!("neither 'xref' nor an xref stream: {err}"),
        })?;

    match object {
        PdfObject::Stream(stream) if stream.dict.get_type() == Some("XRef") => {
            let entries = parse_xref_stream(&stream)?;
            Ok((entries, stream.dict))
        }
        other => Err(ParseError::InvalidXRef {
            offset,
            message: format!("expected an xref stream, found {}", other.type_name()),
        }),
    }
}

fn parse_table_section(
    data: &[u8],
    offset: usize,
    options: &ParseOptions,
) -> ParseResult<(Vec<(u32, XRefEntry)>, PdfDictionary)> {
    let mut lexer = Lexer::at(data, offset);
    lexer.next_token()?; // xref

    let mut entries = Vec::new();
    loop {
        match lexer.next_token()? {
            Token::Trailer => break,
            Token::Integer(first) if first >= 0 => {
                let count = match lexer.next_token()? {
                    Token::Integer(count) if count >= 0 => count,
                    other => return Err(xref_error(&lexer, "subsection count", other)),
                };
                for i in 0..count {
                    let number = u32::try_from(first + i).map_err(|_| ParseError::InvalidXRef {
                        offset: lexer.token_start(),
                        message: "object number out of range".to_string(),
                    })?;
                    entries.push((number, parse_table_entry(&mut lexer)?));
                }
            }
            other => return Err(xref_error(&lexer, "subsection header or 'trailer'", other)),
        }
    }

    let mut parser = ObjectParser::with_options(data, lexer.position(), options);
    match parser.parse_object()? {
        PdfObject::Dictionary(trailer) => Ok((entries, trailer)),
        other => Err(ParseError::InvalidXRef {
            offset: lexer.position(),
            message: format!("trailer is a {}, not a dictionary", other.type_name()),
        }),
    }
}

fn parse_table_entry(lexer: &mut Lexer<'_>) -> ParseResult<XRefEntry> {
    let offset = match lexer.next_token()? {
        Token::Integer(v) if v >= 0 => v as usize,
        other => return Err(xref_error(lexer, "entry offset", other)),
    };
    let generation = match lexer.next_token()? {
        Token::Integer(v) if (0..=u16::MAX as i64).contains(&v) => v as u16,
        other => return Err(xref_error(lexer, "entry generation", other)),
    };
    match lexer.next_token()? {
        // Offset 0 can never hold an object; treat such entries as free.
        Token::Keyword(kind) if kind == "n" && offset > 0 => {
            Ok(XRefEntry::InUse { offset, generation })
        }
        Token::Keyword(kind) if kind == "n" || kind == "f" => Ok(XRefEntry::Free),
        other => Err(xref_error(lexer, "'n' or 'f'", other)),
    }
}

fn xref_error(lexer: &Lexer<'_>, expected: &str, found: Token) -> ParseError {
    ParseError::InvalidXRef {
        offset: lexer.token_start(),
        message: format!("expected {expected}, found {}", found.describe()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::test_helpers::{build_pdf, PdfSource};

    #[test]
    fn test_find_startxref() {
        let data = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \ntrailer\n<<>>\nstartxref\n9\n%%EOF";
        assert_eq!(find_startxref(data).unwrap(), 9);
    }

    #[test]
    fn test_missing_startxref() {
        assert!(matches!(
            find_startxref(b"%PDF-1.4\n1 0 obj\nnull\nendobj\n"),
            Err(ParseError::MissingTrailer)
        ));
    }

    #[test]
    fn test_read_simple_table() {
        let pdf = build_pdf(&PdfSource::single_page(b"BT ET"));
        let table = XRefTable::read(&pdf, &ParseOptions::default()).unwrap();
        assert!(table.trailer().contains_key("Root"));
        assert!(matches!(table.entry(0), Some(XRefEntry::Free)));
        assert!(matches!(table.entry(1), Some(XRefEntry::InUse { .. })));
        assert_eq!(table.live_objects().count(), 4);
    }

    #[test]
    fn test_table_without_root_fails() {
        let data = b"%PDF-1.4\nxref\n0 1\n0000000000 65535 f \ntrailer\n<< /Size 1 >>\nstartxref\n9\n%%EOF";
        assert!(matches!(
            XRefTable::read(data, &ParseOptions::default()),
            Err(ParseError::MissingKey(key)) if key == "Root"
        ));
    }

    #[test]
    fn test_bad_startxref_offset() {
        let data = b"%PDF-1.4\ngarbage here\ntrailer\n<< /Root 1 0 R >>\nstartxref\n9\n%%EOF";
        assert!(matches!(
            XRefTable::read(data, &ParseOptions::default()),
            Err(ParseError::InvalidXRef { .. })
        ));
    }

    #[test]
    fn test_newer_section_wins() {
        let mut table = XRefTable::new();
        table.merge_entries(vec![(3, XRefEntry::InUse { offset: 500, generation: 0 })]);
        table.merge_entries(vec![
            (3, XRefEntry::InUse { offset: 100, generation: 0 }),
            (4, XRefEntry::Free),
        ]);
        assert_eq!(
            table.entry(3),
            Some(XRefEntry::InUse { offset: 500, generation: 0 })
        );
        assert_eq!(table.entry(4), Some(XRefEntry::Free));
    }

    #[test]
    fn test_section_keys_not_merged_into_trailer() {
        let mut table = XRefTable::new();
        let mut newest = PdfDictionary::new();
        newest.set("Root", ObjectId::new(1, 0));
        newest.set("Prev", 100);
        table.merge_trailer(newest);
        let mut older = PdfDictionary::new();
        older.set("Root", ObjectId::new(9, 0));
        older.set("Info", ObjectId::new(5, 0));
        table.merge_trailer(older);

        assert_eq!(
            table.trailer().get("Root"),
            Some(&PdfObject::Reference(ObjectId::new(1, 0)))
        );
        assert!(table.trailer().contains_key("Info"));
        assert!(!table.trailer().contains_key("Prev"));
    }
}
