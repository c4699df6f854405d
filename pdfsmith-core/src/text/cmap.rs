//! CMap and ToUnicode support for text extraction
//!
//! Implements the subset of ISO 32000-1 Section 9.10.3 (ToUnicode CMaps) needed
//! to turn shown character codes into Unicode: code space ranges, `bfchar`
//! and `bfrange` (both the offset and the array form).

use crate::parser::lexer::{Lexer, Token};
use crate::parser::{ParseError, ParseResult};
use std::collections::HashMap;

/// Character code range from a `begincodespacerange` block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeRange {
    pub start: Vec<u8>,
    pub end: Vec<u8>,
}

impl CodeRange {
    /// Codes match byte by byte: every byte must fall within the bounds at
    /// its position.
    pub fn contains(&self, code: &[u8]) -> bool {
        code.len() == self.start.len()
            && code.len() == self.end.len()
            && code
                .iter()
                .zip(self.start.iter().zip(&self.end))
                .all(|(c, (lo, hi))| lo <= c && c <= hi)
    }
}

#[derive(Debug, Clone)]
enum RangeMapping {
    /// `<lo> <hi> <dst>`: consecutive codes map to `dst`, `dst + 1`, ...
    Offset { lo: Vec<u8>, hi: Vec<u8>, dst: Vec<u16> },
    /// `<lo> <hi> [<d0> <d1> ...]`: one destination per code.
    Array { lo: Vec<u8>, hi: Vec<u8>, dsts: Vec<String> },
}

impl RangeMapping {
    fn bounds(&self) -> (&[u8], &[u8]) {
        match self {
            RangeMapping::Offset { lo, hi, .. } | RangeMapping::Array { lo, hi, .. } => (lo, hi),
        }
    }

    fn lookup(&self, code: &[u8]) -> Option<String> {
        let (lo, hi) = self.bounds();
        if code.len() != lo.len() || code < lo || code > hi {
            return None;
        }
        let offset = (code_value(code) - code_value(lo)) as usize;
        match self {
            RangeMapping::Offset { dst, .. } => {
                let mut units = dst.clone();
                let last = units.last_mut()?;
                *last = last.checked_add(u16::try_from(offset).ok()?)?;
                Some(String::from_utf16_lossy(&units))
            }
            RangeMapping::Array { dsts, .. } => dsts.get(offset).cloned(),
        }
    }
}

/// A parsed ToUnicode CMap
#[derive(Debug, Clone, Default)]
pub struct CMap {
    pub name: Option<String>,
    pub codespace_ranges: Vec<CodeRange>,
    single_mappings: HashMap<Vec<u8>, String>,
    ranges: Vec<RangeMapping>,
}

impl CMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-byte codes, no Unicode mappings.
    pub fn identity_h() -> Self {
        Self {
            name: Some("Identity-H".to_string()),
            codespace_ranges: vec![CodeRange {
                start: vec![0x00, 0x00],
                end: vec![0xFF, 0xFF],
            }],
            ..Self::default()
        }
    }

    /// Parse a CMap program.
    pub fn parse(data: &[u8]) -> ParseResult<Self> {
        let mut cmap = CMap::new();
        let mut lexer = Lexer::new(data);

        loop {
            match lexer.next_token()? {
                Token::Eof => break,
                Token::Name(name) if name == "CMapName" => {
                    if let Token::Name(value) = lexer.next_token()? {
                        cmap.name = Some(value);
                    }
                }
                Token::Keyword(keyword) => match keyword.as_str() {
                    "begincodespacerange" => cmap.parse_codespace(&mut lexer)?,
                    "beginbfchar" => cmap.parse_bfchar(&mut lexer)?,
                    "beginbfrange" => cmap.parse_bfrange(&mut lexer)?,
                    _ => {}
                },
                _ => {}
            }
        }

        tracing::trace!(
            "Parsed CMap {:?}: {} chars, {} ranges",
            cmap.name,
            cmap.single_mappings.len(),
            cmap.ranges.len()
        );
        Ok(cmap)
    }

    fn parse_codespace(&mut self, lexer: &mut Lexer<'_>) -> ParseResult<()> {
        loop {
            match lexer.next_token()? {
                Token::Keyword(k) if k == "endcodespacerange" => return Ok(()),
                Token::HexString(start) => {
                    let end = expect_hex(lexer)?;
                    self.codespace_ranges.push(CodeRange { start, end });
                }
                other => return Err(unexpected(lexer, "code space range", other)),
            }
        }
    }

    fn parse_bfchar(&mut self, lexer: &mut Lexer<'_>) -> ParseResult<()> {
        loop {
            match lexer.next_token()? {
                Token::Keyword(k) if k == "endbfchar" => return Ok(()),
                Token::HexString(src) => {
                    let dst = match lexer.next_token()? {
                        Token::HexString(dst) => utf16_be_to_string(&dst),
                        Token::Name(glyph) => {
                            super::glyph_list::glyph_to_unicode(&glyph).unwrap_or_default()
                        }
                        other => return Err(unexpected(lexer, "bfchar destination", other)),
                    };
                    self.single_mappings.insert(src, dst);
                }
                other => return Err(unexpected(lexer, "bfchar source", other)),
            }
        }
    }

    fn parse_bfrange(&mut self, lexer: &mut Lexer<'_>) -> ParseResult<()> {
        loop {
            let lo = match lexer.next_token()? {
                Token::Keyword(k) if k == "endbfrange" => return Ok(()),
                Token::HexString(lo) => lo,
                other => return Err(unexpected(lexer, "bfrange start", other)),
            };
            let hi = expect_hex(lexer)?;

            match lexer.next_token()? {
                Token::HexString(dst) => {
                    let dst = dst
                        .chunks(2)
                        .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
                        .collect();
                    self.ranges.push(RangeMapping::Offset { lo, hi, dst });
                }
                Token::ArrayStart => {
                    let mut dsts = Vec::new();
                    loop {
                        match lexer.next_token()? {
                            Token::ArrayEnd => break,
                            Token::HexString(dst) => dsts.push(utf16_be_to_string(&dst)),
                            other => return Err(unexpected(lexer, "bfrange array entry", other)),
                        }
                    }
                    self.ranges.push(RangeMapping::Array { lo, hi, dsts });
                }
                other => return Err(unexpected(lexer, "bfrange destination", other)),
            }
        }
    }

    /// Unicode text for one complete character code.
    pub fn lookup(&self, code: &[u8]) -> Option<String> {
        if let Some(text) = self.single_mappings.get(code) {
            return Some(text.clone());
        }
        self.ranges.iter().find_map(|range| range.lookup(code))
    }

    pub fn has_mappings(&self) -> bool {
        !self.single_mappings.is_empty() || !self.ranges.is_empty()
    }

    /// Length in bytes of the code starting at `bytes[0]`.
    ///
    /// Uses the code space ranges; without any, the length of the mapped
    /// source codes decides, defaulting to one byte.
    pub fn code_length(&self, bytes: &[u8]) -> usize {
        if self.codespace_ranges.is_empty() {
            let mapped_len = self
                .single_mappings
                .keys()
                .map(Vec::len)
                .chain(self.ranges.iter().map(|r| r.bounds().0.len()))
                .max()
                .unwrap_or(1);
            return mapped_len.clamp(1, bytes.len().max(1));
        }

        for len in 1..=4.min(bytes.len()) {
            if self
                .codespace_ranges
                .iter()
                .any(|range| range.contains(&bytes[..len]))
            {
                return len;
            }
        }

        // No range matched: consume as many bytes as the shortest range.
        self.codespace_ranges
            .iter()
            .map(|range| range.start.len())
            .min()
            .unwrap_or(1)
            .clamp(1, bytes.len().max(1))
    }
}

fn code_value(code: &[u8]) -> u64 {
    code.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64)
}

fn utf16_be_to_string(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
        .collect();
    String::from_utf16_lossy(&units)
}

fn expect_hex(lexer: &mut Lexer<'_>) -> ParseResult<Vec<u8>> {
    match lexer.next_token()? {
        Token::HexString(bytes) => Ok(bytes),
        other => Err(unexpected(lexer, "hex string", other)),
    }
}

fn unexpected(lexer: &Lexer<'_>, expected: &str, found: Token) -> ParseError {
    ParseError::UnexpectedToken {
        position: lexer.token_start(),
        expected: expected.to_string(),
        found: found.describe(),
    }
}
