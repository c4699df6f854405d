//! Cross-reference streams (ISO 32000-1 Section 7.5.8)

use super::xref::XRefEntry;
use super::{ParseError, ParseResult};
use crate::objects::{PdfObject, PdfStream};

/// Decode the entries of a `/Type /XRef` stream.
pub fn parse_xref_stream(stream: &PdfStream) -> ParseResult<Vec<(u32, XRefEntry)>> {
    let dict = &stream.dict;

    let widths: Vec<usize> = dict
        .get("W")
        .and_then(PdfObject::as_array)
        .ok_or_else(|| ParseError::MissingKey("W".to_string()))?
        .iter()
        .map(|w| w.as_integer().and_then(|v| usize::try_from(v).ok()))
        .collect::<Option<Vec<_>>>()
        .filter(|w| w.len() == 3 && w.iter().all(|&n| n <= 8))
        .ok_or_else(|| ParseError::StreamDecodeError("invalid /W array".to_string()))?;

    let size = dict
        .get_integer("Size")
        .ok_or_else(|| ParseError::MissingKey("Size".to_string()))?;

    let ranges: Vec<(i64, i64)> = match dict.get("Index").and_then(PdfObject::as_array) {
        Some(index) => {
            let numbers = index
                .as_numbers()
                .ok_or_else(|| ParseError::StreamDecodeError("invalid /Index array".to_string()))?;
            numbers
                .chunks_exact(2)
                .map(|pair| (pair[0] as i64, pair[1] as i64))
                .collect()
        }
        None => vec![(0, size)],
    };

    let data = stream.decode()?;
    let entry_len: usize = widths.iter().sum();
    if entry_len == 0 {
        return Err(ParseError::StreamDecodeError(
            "xref stream entries have zero width".to_string(),
        ));
    }

    let mut entries = Vec::new();
    let mut rows = data.chunks_exact(entry_len);
    for (first, count) in ranges {
        for i in 0..count.max(0) {
            let Some(row) = rows.next() else {
                tracing::warn!("Xref stream shorter than its /Index declares");
                return Ok(entries);
            };
            let number = u32::try_from(first + i).map_err(|_| {
                ParseError::StreamDecodeError("object number out of range".to_string())
            })?;

            let (type_field, rest) = row.split_at(widths[0]);
            let (field2, field3) = rest.split_at(widths[1]);
            // A zero-width type field defaults to 1 (in use).
            let kind = if widths[0] == 0 { 1 } else { read_be(type_field) };
            let second = read_be(field2);
            let third = read_be(field3);

            let entry = match kind {
                0 => XRefEntry::Free,
                1 => XRefEntry::InUse {
                    offset: second as usize,
                    generation: u16::try_from(third).unwrap_or(0),
                },
                2 => XRefEntry::Compressed {
                    stream_number: u32::try_from(second).map_err(|_| {
                        ParseError::StreamDecodeError("object stream number out of range".into())
                    })?,
                    index: u32::try_from(third).unwrap_or(u32::MAX),
                },
                // Unknown types are references to the null object.
                _ => continue,
            };
            entries.push((number, entry));
        }
    }

    Ok(entries)
}

fn read_be(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}
