//! XRef recovery for damaged files
//!
//! Rebuilds a cross-reference table by scanning the buffer for `N G obj`
//! headers. Only used with [`ParseOptions::lenient`]; strict parsing reports a
//! broken xref instead.

use super::lexer::{is_delimiter, is_whitespace};
use super::object_stream::ObjectStream;
use super::objects::{find_subsequence, rfind_subsequence, ObjectParser};
use super::xref::{XRefEntry, XRefTable};
use super::{ParseError, ParseOptions, ParseResult};
use crate::objects::{PdfDictionary, PdfObject};

/// Recovery statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Object headers found by the scan
    pub objects_found: usize,
    /// Objects found inside object streams
    pub compressed_objects_found: usize,
    /// Whether a `trailer` dictionary was found
    pub trailer_found: bool,
}

/// Rebuild the xref table of `data` from scratch.
pub fn rebuild_xref(data: &[u8], options: &ParseOptions) -> ParseResult<(XRefTable, RecoveryStats)> {
    let mut stats = RecoveryStats::default();
    let mut table = XRefTable::new();
    let options = ParseOptions {
        lenient: true,
        ..options.clone()
    };

    let headers = scan_object_headers(data);
    stats.objects_found = headers.len();
    // Later definitions of the same number win, as with incremental updates.
    for &(number, generation, offset) in &headers {
        table.set_entry(number, XRefEntry::InUse { offset, generation });
    }

    let mut trailer = find_trailer(data, &options);
    stats.trailer_found = trailer.is_some();
    let mut catalog = None;

    for &(number, _, offset) in &headers {
        let mut parser = ObjectParser::with_options(data, offset, &options);
        let Ok((id, object)) = parser.parse_indirect_object(&|_| None) else {
            continue;
        };
        match &object {
            PdfObject::Stream(stream) if stream.dict.get_type() == Some("ObjStm") => {
                let Ok(decoded) = stream.decode() else {
                    continue;
                };
                if let Ok(objstm) = ObjectStream::parse(stream, decoded) {
                    for (index, inner) in objstm.object_numbers().enumerate() {
                        if table.entry(inner).is_none() {
                            table.set_entry(
                                inner,
                                XRefEntry::Compressed {
                                    stream_number: number,
                                    index: index as u32,
                                },
                            );
                            stats.compressed_objects_found += 1;
                        }
                    }
                }
            }
            PdfObject::Stream(stream)
                if stream.dict.get_type() == Some("XRef") && stream.dict.contains_key("Root") =>
            {
                if trailer.is_none() {
                    trailer = Some(stream.dict.clone());
                }
            }
            PdfObject::Dictionary(dict) if dict.get_type() == Some("Catalog") => {
                catalog = Some(id);
            }
            _ => {}
        }
    }

    let mut trailer = trailer.unwrap_or_default();
    if !trailer.contains_key("Root") {
        let root = catalog.ok_or_else(|| ParseError::MissingKey("Root".to_string()))?;
        trailer.set("Root", root);
    }
    table.set_trailer(trailer);

    tracing::warn!(
        "Rebuilt xref table: {} objects, {} in object streams",
        stats.objects_found,
        stats.compressed_objects_found
    );
    Ok((table, stats))
}

/// Every `N G obj` header in the buffer as (number, generation, offset).
fn scan_object_headers(data: &[u8]) -> Vec<(u32, u16, usize)> {
    let mut headers = Vec::new();
    let mut search_from = 0;

    while let Some(found) = find_subsequence(&data[search_from..], b"obj") {
        let keyword = search_from + found;
        search_from = keyword + 3;

        let followed_ok = data.get(keyword + 3).map_or(true, |&b| {
            is_whitespace(b) || is_delimiter(b)
        });
        if !followed_ok {
            continue;
        }
        if let Some(header) = parse_header_before(data, keyword) {
            headers.push(header);
        }
    }

    headers
}

/// Walk backward from `obj` over `<generation> <number>`.
fn parse_header_before(data: &[u8], keyword: usize) -> Option<(u32, u16, usize)> {
    let mut pos = keyword;

    let skip_ws = |mut p: usize| {
        while p > 0 && is_whitespace(data[p - 1]) {
            p -= 1;
        }
        p
    };
    let digits_start = |mut p: usize| {
        while p > 0 && data[p - 1].is_ascii_digit() {
            p -= 1;
        }
        p
    };

    let gen_end = skip_ws(pos);
    if gen_end == pos {
        return None;
    }
    let gen_start = digits_start(gen_end);
    if gen_start == gen_end {
        return None;
    }
    pos = skip_ws(gen_start);
    if pos == gen_start {
        return None;
    }
    let num_end = pos;
    let num_start = digits_start(num_end);
    if num_start == num_end {
        return None;
    }
    if num_start > 0 && !(is_whitespace(data[num_start - 1]) || is_delimiter(data[num_start - 1])) {
        return None;
    }

    let number = std::str::from_utf8(&data[num_start..num_end]).ok()?.parse().ok()?;
    let generation = std::str::from_utf8(&data[gen_start..gen_end]).ok()?.parse().ok()?;
    Some((number, generation, num_start))
}

fn find_trailer(data: &[u8], options: &ParseOptions) -> Option<PdfDictionary> {
    let position = rfind_subsequence(data, b"trailer")?;
    let mut parser = ObjectParser::with_options(data, position + b"trailer".len(), options);
    match parser.parse_object() {
        Ok(PdfObject::Dictionary(dict)) => Some(dict),
        _ => None,
    }
}
