//! PDF Stream Filters
//!
//! Decoding of stream payloads according to ISO 32000-1 Section 7.4.
//! `FlateDecode` (with PNG and TIFF predictors), `ASCIIHexDecode` and
//! `ASCII85Decode` are implemented. Any other filter is reported as
//! [`ParseError::UnsupportedFilter`] when a decode is requested, so callers that
//! only copy streams never trip over it.

use super::{ParseError, ParseResult};
use crate::objects::{PdfDictionary, PdfObject};

#[cfg(feature = "compression")]
use flate2::read::{DeflateDecoder, ZlibDecoder};
#[cfg(feature = "compression")]
use std::io::Read;

/// Filters this module can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    /// ASCII hex decode
    ASCIIHexDecode,

    /// ASCII 85 decode
    ASCII85Decode,

    /// Flate decode (zlib/deflate compression)
    FlateDecode,
}

impl Filter {
    /// Parse filter from its full or abbreviated (inline image) name
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "ASCIIHexDecode" | "AHx" => Some(Filter::ASCIIHexDecode),
            "ASCII85Decode" | "A85" => Some(Filter::ASCII85Decode),
            "FlateDecode" | "Fl" => Some(Filter::FlateDecode),
            _ => None,
        }
    }
}

/// Predictor parameters from `/DecodeParms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    /// 1 = none, 2 = TIFF, 10-15 = PNG
    pub predictor: i64,
    pub columns: usize,
    pub colors: usize,
    pub bits_per_component: usize,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            columns: 1,
            colors: 1,
            bits_per_component: 8,
        }
    }
}

impl DecodeParams {
    fn from_dict(dict: Option<&PdfDictionary>) -> Self {
        let mut params = Self::default();
        let Some(dict) = dict else {
            return params;
        };
        let positive = |key: &str| {
            dict.get_integer(key)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|&v| v > 0)
        };
        if let Some(predictor) = dict.get_integer("Predictor") {
            params.predictor = predictor;
        }
        if let Some(columns) = positive("Columns") {
            params.columns = columns;
        }
        if let Some(colors) = positive("Colors") {
            params.colors = colors;
        }
        if let Some(bpc) = positive("BitsPerComponent") {
            params.bits_per_component = bpc;
        }
        params
    }

    fn pixel_bytes_per_row(&self) -> ParseResult<usize> {
        self.columns
            .checked_mul(self.colors)
            .and_then(|n| n.checked_mul(self.bits_per_component))
            .map(|bits| bits.div_ceil(8))
            .ok_or_else(|| {
                ParseError::StreamDecodeError(format!(
                    "predictor row of {} columns is too large",
                    self.columns
                ))
            })
    }

    fn bytes_per_pixel(&self) -> usize {
        self.colors
            .saturating_mul(self.bits_per_component)
            .div_ceil(8)
            .max(1)
    }
}

/// Decode stream data according to the filters declared in `dict`
pub fn decode_stream(data: &[u8], dict: &PdfDictionary) -> ParseResult<Vec<u8>> {
    let filters: Vec<&str> = match dict.get("Filter") {
        None | Some(PdfObject::Null) => return Ok(data.to_vec()),
        Some(PdfObject::Name(name)) => vec![name.as_str()],
        Some(PdfObject::Array(array)) => {
            let mut names = Vec::with_capacity(array.len());
            for obj in array {
                match obj {
                    PdfObject::Name(name) => names.push(name.as_str()),
                    other => {
                        return Err(ParseError::StreamDecodeError(format!(
                            "Invalid filter entry of type {}",
                            other.type_name()
                        )))
                    }
                }
            }
            names
        }
        Some(other) => {
            return Err(ParseError::StreamDecodeError(format!(
                "Invalid /Filter of type {}",
                other.type_name()
            )))
        }
    };

    let params = decode_params_list(dict, filters.len());

    let mut result = data.to_vec();
    for (index, name) in filters.iter().enumerate() {
        let filter = Filter::from_name(name)
            .ok_or_else(|| ParseError::UnsupportedFilter(name.to_string()))?;
        result = apply_filter(&result, filter, params[index])?;
    }

    Ok(result)
}

/// `/DecodeParms` may be a single dictionary or an array parallel to `/Filter`.
fn decode_params_list(dict: &PdfDictionary, count: usize) -> Vec<DecodeParams> {
    match dict.get("DecodeParms").or_else(|| dict.get("DP")) {
        Some(PdfObject::Dictionary(params)) => {
            let mut list = vec![DecodeParams::default(); count];
            if let Some(first) = list.first_mut() {
                *first = DecodeParams::from_dict(Some(params));
            }
            list
        }
        Some(PdfObject::Array(array)) => (0..count)
            .map(|i| DecodeParams::from_dict(array.get(i).and_then(PdfObject::as_dict)))
            .collect(),
        _ => vec![DecodeParams::default(); count],
    }
}

/// Apply a single filter to data
fn apply_filter(data: &[u8], filter: Filter, params: DecodeParams) -> ParseResult<Vec<u8>> {
    match filter {
        Filter::FlateDecode => {
            let inflated = decode_flate(data)?;
            apply_predictor(&inflated, &params)
        }
        Filter::ASCIIHexDecode => decode_ascii_hex(data),
        Filter::ASCII85Decode => decode_ascii85(data),
    }
}

/// Decode FlateDecode (zlib/deflate) compressed data
#[cfg(feature = "compression")]
fn decode_flate(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut result = Vec::new();
    match ZlibDecoder::new(data).read_to_end(&mut result) {
        Ok(_) => Ok(result),
        Err(zlib_err) => {
            // Some writers emit raw deflate without the zlib header.
            let mut raw = Vec::new();
            if DeflateDecoder::new(data).read_to_end(&mut raw).is_ok() && !raw.is_empty() {
                return Ok(raw);
            }
            if !result.is_empty() {
                tracing::warn!(
                    "Flate stream truncated after {} bytes: {}",
                    result.len(),
                    zlib_err
                );
                return Ok(result);
            }
            Err(ParseError::StreamDecodeError(format!(
                "Flate decode error: {zlib_err}"
            )))
        }
    }
}

#[cfg(not(feature = "compression"))]
fn decode_flate(_data: &[u8]) -> ParseResult<Vec<u8>> {
    Err(ParseError::UnsupportedFilter(
        "FlateDecode (built without the 'compression' feature)".to_string(),
    ))
}

fn apply_predictor(data: &[u8], params: &DecodeParams) -> ParseResult<Vec<u8>> {
    match params.predictor {
        i64::MIN..=1 => Ok(data.to_vec()),
        2 => decode_tiff_predictor(data, params),
        10..=15 => decode_png_predictor(data, params),
        other => Err(ParseError::UnsupportedFilter(format!("predictor {other}"))),
    }
}

fn decode_tiff_predictor(data: &[u8], params: &DecodeParams) -> ParseResult<Vec<u8>> {
    if params.bits_per_component != 8 {
        return Err(ParseError::UnsupportedFilter(format!(
            "TIFF predictor with {} bits per component",
            params.bits_per_component
        )));
    }
    let row_len = params.pixel_bytes_per_row()?;
    let colors = params.colors;
    let mut output = Vec::with_capacity(data.len());

    for row in data.chunks(row_len) {
        let row_start = output.len();
        for (i, &byte) in row.iter().enumerate() {
            let left = if i >= colors {
                output[row_start + i - colors]
            } else {
                0
            };
            output.push(byte.wrapping_add(left));
        }
    }
    Ok(output)
}

fn decode_png_predictor(data: &[u8], params: &DecodeParams) -> ParseResult<Vec<u8>> {
    // No row can hold more bytes than the stream itself.
    let row_len = params.pixel_bytes_per_row()?.min(data.len());
    let bpp = params.bytes_per_pixel();
    let stride = row_len + 1;

    let mut output = Vec::with_capacity(data.len() / stride * row_len);
    let mut previous = vec![0u8; row_len];
    let mut current = vec![0u8; row_len];

    for row in data.chunks(stride) {
        // A short final row is decoded as far as it goes.
        let (&tag, encoded) = match row.split_first() {
            Some(split) => split,
            None => break,
        };
        current[..].fill(0);

        for i in 0..encoded.len() {
            let left = if i >= bpp { current[i - bpp] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };
            let predicted = match tag {
                0 => 0,
                1 => left,
                2 => up,
                3 => ((left as u16 + up as u16) / 2) as u8,
                4 => paeth(left, up, up_left),
                other => {
                    return Err(ParseError::StreamDecodeError(format!(
                        "Invalid PNG predictor tag: {other}"
                    )))
                }
            };
            current[i] = encoded[i].wrapping_add(predicted);
        }

        output.extend_from_slice(&current[..encoded.len()]);
        std::mem::swap(&mut previous, &mut current);
    }

    Ok(output)
}

fn paeth(left: u8, up: u8, up_left: u8) -> u8 {
    let p = left as i16 + up as i16 - up_left as i16;
    let pa = (p - left as i16).abs();
    let pb = (p - up as i16).abs();
    let pc = (p - up_left as i16).abs();
    if pa <= pb && pa <= pc {
        left
    } else if pb <= pc {
        up
    } else {
        up_left
    }
}

/// Decode ASCIIHexDecode data
fn decode_ascii_hex(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len() / 2);
    let mut high: Option<u8> = None;

    for &ch in data {
        if ch == b'>' {
            break;
        }
        if ch.is_ascii_whitespace() {
            continue;
        }
        let value = hex_digit_value(ch).ok_or_else(|| {
            ParseError::StreamDecodeError(format!("Invalid hex digit: {}", ch as char))
        })?;
        match high.take() {
            Some(h) => result.push((h << 4) | value),
            None => high = Some(value),
        }
    }

    // Odd number of digits: pad with 0
    if let Some(h) = high {
        result.push(h << 4);
    }

    Ok(result)
}

fn hex_digit_value(ch: u8) -> Option<u8> {
    match ch {
        b'0'..=b'9' => Some(ch - b'0'),
        b'A'..=b'F' => Some(ch - b'A' + 10),
        b'a'..=b'f' => Some(ch - b'a' + 10),
        _ => None,
    }
}

/// Decode ASCII85Decode data
fn decode_ascii85(data: &[u8]) -> ParseResult<Vec<u8>> {
    let mut body = data;
    if let Some(stripped) = body.strip_prefix(b"<~") {
        body = stripped;
    }

    let mut result = Vec::with_capacity(data.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut count = 0usize;

    let mut iter = body.iter().copied().filter(|b| !b.is_ascii_whitespace());
    while let Some(c) = iter.next() {
        match c {
            b'~' => {
                if iter.next() == Some(b'>') {
                    break;
                }
                return Err(ParseError::StreamDecodeError(
                    "Invalid ASCII85 end marker".to_string(),
                ));
            }
            b'z' if count == 0 => result.extend_from_slice(&[0, 0, 0, 0]),
            b'!'..=b'u' => {
                group[count] = c - b'!';
                count += 1;
                if count == 5 {
                    result.extend_from_slice(&ascii85_value(&group).to_be_bytes());
                    count = 0;
                }
            }
            _ => {
                return Err(ParseError::StreamDecodeError(format!(
                    "Invalid ASCII85 character: {}",
                    c as char
                )))
            }
        }
    }

    if count == 1 {
        return Err(ParseError::StreamDecodeError(
            "ASCII85 final group has a single character".to_string(),
        ));
    }
    if count > 1 {
        for slot in group.iter_mut().skip(count) {
            *slot = 84; // 'u'
        }
        let bytes = ascii85_value(&group).to_be_bytes();
        result.extend_from_slice(&bytes[..count - 1]);
    }

    Ok(result)
}

fn ascii85_value(group: &[u8; 5]) -> u32 {
    let value = group
        .iter()
        .fold(0u64, |acc, &digit| acc * 85 + digit as u64);
    value as u32
}
