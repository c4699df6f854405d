//! PDF Content Stream Parser
//!
//! Content streams are postfix: operands followed by an operator. Parsing
//! happens at two levels:
//!
//! - [`ContentParser::parse_raw`] yields [`RawOperation`]s that keep every
//!   operand as a [`PdfObject`] together with its byte span, so callers can
//!   rewrite individual operands in place (resource renaming).
//! - [`ContentParser::parse`] lifts those into typed [`ContentOperation`]s for
//!   the operators text extraction cares about.

use super::lexer::{is_whitespace, Token};
use super::objects::ObjectParser;
use super::{ParseError, ParseResult};
use crate::objects::PdfObject;
use std::ops::Range;

/// An operand and where it sits in the content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Operand {
    pub value: PdfObject,
    pub span: Range<usize>,
}

/// One operator with its operands, exactly as written.
#[derive(Debug, Clone, PartialEq)]
pub struct RawOperation {
    pub operator: String,
    pub operands: Vec<Operand>,
    /// For `BI`: the operands are the image parameters as alternating key and
    /// value, and this is the span of the binary data between `ID` and `EI`.
    pub inline_data: Option<Range<usize>>,
}

impl RawOperation {
    pub fn operand(&self, index: usize) -> Option<&PdfObject> {
        self.operands.get(index).map(|operand| &operand.value)
    }

    fn number(&self, index: usize) -> Option<f64> {
        self.operand(index).and_then(PdfObject::as_real)
    }

    fn numbers<const N: usize>(&self) -> Option<[f64; N]> {
        if self.operands.len() < N {
            return None;
        }
        let skip = self.operands.len() - N;
        let mut out = [0.0; N];
        for (slot, operand) in out.iter_mut().zip(&self.operands[skip..]) {
            *slot = operand.value.as_real()?;
        }
        Some(out)
    }

    fn last_string(&self) -> Option<Vec<u8>> {
        match self.operands.last().map(|operand| &operand.value) {
            Some(PdfObject::String(s)) => Some(s.as_bytes().to_vec()),
            _ => None,
        }
    }

    fn last_name(&self) -> Option<String> {
        self.operands
            .last()
            .and_then(|operand| operand.value.as_name())
            .map(str::to_string)
    }
}

/// A text element in a TJ array
#[derive(Debug, Clone, PartialEq)]
pub enum TextElement {
    Text(Vec<u8>),
    /// Adjustment in thousandths of text space; positive moves left.
    Spacing(f64),
}

/// Represents a single operator in a PDF content stream
#[derive(Debug, Clone, PartialEq)]
pub enum ContentOperation {
    // Text object operators
    BeginText, // BT
    EndText,   // ET

    // Text state operators
    SetCharSpacing(f64),       // Tc
    SetWordSpacing(f64),       // Tw
    SetHorizontalScaling(f64), // Tz
    SetLeading(f64),           // TL
    SetFont(String, f64),      // Tf
    SetTextRise(f64),          // Ts

    // Text positioning operators
    MoveText(f64, f64),            // Td
    MoveTextSetLeading(f64, f64),  // TD
    SetTextMatrix([f64; 6]),       // Tm
    NextLine,                      // T*

    // Text showing operators
    ShowText(Vec<u8>),                             // Tj
    ShowTextArray(Vec<TextElement>),               // TJ
    NextLineShowText(Vec<u8>),                     // '
    SetSpacingNextLineShowText(f64, f64, Vec<u8>), // "

    // Graphics state operators
    SaveGraphicsState,            // q
    RestoreGraphicsState,         // Q
    SetTransformMatrix([f64; 6]), // cm

    // XObject operators
    PaintXObject(String), // Do

    /// An inline image (`BI ... ID ... EI`).
    InlineImage,

    /// Any operator text extraction does not interpret, or a known operator
    /// with unusable operands.
    Other(String),
}

impl ContentOperation {
    pub fn from_raw(raw: &RawOperation) -> Self {
        Self::typed(raw).unwrap_or_else(|| Self::Other(raw.operator.clone()))
    }

    fn typed(raw: &RawOperation) -> Option<Self> {
        let op = match raw.operator.as_str() {
            "BT" => Self::BeginText,
            "ET" => Self::EndText,
            "Tc" => Self::SetCharSpacing(raw.numbers::<1>()?[0]),
            "Tw" => Self::SetWordSpacing(raw.numbers::<1>()?[0]),
            "Tz" => Self::SetHorizontalScaling(raw.numbers::<1>()?[0]),
            "TL" => Self::SetLeading(raw.numbers::<1>()?[0]),
            "Ts" => Self::SetTextRise(raw.numbers::<1>()?[0]),
            "Tf" => {
                let size = raw.numbers::<1>()?[0];
                let len = raw.operands.len();
                let name = raw.operand(len.checked_sub(2)?)?.as_name()?;
                Self::SetFont(name.to_string(), size)
            }
            "Td" => {
                let [tx, ty] = raw.numbers()?;
                Self::MoveText(tx, ty)
            }
            "TD" => {
                let [tx, ty] = raw.numbers()?;
                Self::MoveTextSetLeading(tx, ty)
            }
            "Tm" => Self::SetTextMatrix(raw.numbers()?),
            "T*" => Self::NextLine,
            "Tj" => Self::ShowText(raw.last_string()?),
            "'" => Self::NextLineShowText(raw.last_string()?),
            "\"" => {
                let len = raw.operands.len();
                let aw = raw.number(len.checked_sub(3)?)?;
                let ac = raw.number(len - 2)?;
                Self::SetSpacingNextLineShowText(aw, ac, raw.last_string()?)
            }
            "TJ" => {
                let array = raw.operands.last()?.value.as_array()?;
                let elements = array
                    .iter()
                    .filter_map(|item| match item {
                        PdfObject::String(s) => Some(TextElement::Text(s.as_bytes().to_vec())),
                        other => other.as_real().map(TextElement::Spacing),
                    })
                    .collect();
                Self::ShowTextArray(elements)
            }
            "q" => Self::SaveGraphicsState,
            "Q" => Self::RestoreGraphicsState,
            "cm" => Self::SetTransformMatrix(raw.numbers()?),
            "Do" => Self::PaintXObject(raw.last_name()?),
            "BI" => Self::InlineImage,
            _ => return None,
        };
        Some(op)
    }
}

/// Content stream parser
pub struct ContentParser<'a> {
    parser: ObjectParser<'a>,
}

impl<'a> ContentParser<'a> {
    pub fn new(content: &'a [u8]) -> Self {
        Self {
            parser: ObjectParser::new(content, 0),
        }
    }

    /// Parse a content stream into typed operations.
    pub fn parse(content: &[u8]) -> ParseResult<Vec<ContentOperation>> {
        Ok(Self::parse_raw(content)?
            .iter()
            .map(ContentOperation::from_raw)
            .collect())
    }

    /// Parse a content stream, failing on the first syntax error.
    pub fn parse_raw(content: &[u8]) -> ParseResult<Vec<RawOperation>> {
        let mut parser = ContentParser::new(content);
        let mut operations = Vec::new();
        while let Some(operation) = parser.next_operation()? {
            operations.push(operation);
        }
        Ok(operations)
    }

    /// Parse as far as possible; returns the operations read before the
    /// first syntax error along with that error.
    pub fn parse_partial(content: &[u8]) -> (Vec<RawOperation>, Option<ParseError>) {
        let mut parser = ContentParser::new(content);
        let mut operations = Vec::new();
        loop {
            match parser.next_operation() {
                Ok(Some(operation)) => operations.push(operation),
                Ok(None) => return (operations, None),
                Err(err) => return (operations, Some(err)),
            }
        }
    }

    /// Read the next operator and its operands. `None` at end of stream;
    /// operands left dangling at the end are dropped.
    pub fn next_operation(&mut self) -> ParseResult<Option<RawOperation>> {
        let mut operands = Vec::new();
        loop {
            let token = self.parser.lexer().next_token()?;
            let start = self.parser.lexer().token_start();
            match token {
                Token::Eof => {
                    if !operands.is_empty() {
                        tracing::debug!("{} trailing operands without operator", operands.len());
                    }
                    return Ok(None);
                }
                Token::Keyword(operator) if operator == "BI" => {
                    return self.inline_image().map(Some);
                }
                Token::Keyword(operator) => {
                    return Ok(Some(RawOperation {
                        operator,
                        operands,
                        inline_data: None,
                    }))
                }
                token @ (Token::ArrayEnd
                | Token::DictEnd
                | Token::Obj
                | Token::EndObj
                | Token::Stream
                | Token::EndStream
                | Token::XRef
                | Token::Trailer
                | Token::StartXRef) => {
                    return Err(ParseError::UnexpectedToken {
                        position: start,
                        expected: "operand or operator".to_string(),
                        found: token.describe(),
                    })
                }
                token => {
                    let value = self.parser.parse_value(token, 0)?;
                    let end = self.parser.position();
                    operands.push(Operand {
                        value,
                        span: start..end,
                    });
                }
            }
        }
    }

    /// `BI <key value>* ID <data> EI`; the `BI` keyword is already consumed.
    fn inline_image(&mut self) -> ParseResult<RawOperation> {
        let mut operands = Vec::new();
        loop {
            let token = self.parser.lexer().next_token()?;
            let start = self.parser.lexer().token_start();
            match token {
                Token::Keyword(keyword) if keyword == "ID" => break,
                Token::Eof => return Err(ParseError::UnexpectedEof { position: start }),
                token => {
                    let value = self.parser.parse_value(token, 0)?;
                    operands.push(Operand {
                        value,
                        span: start..self.parser.position(),
                    });
                }
            }
        }

        let data = self.parser.lexer().data();
        // A single whitespace byte separates ID from the data.
        let data_start = (self.parser.position() + 1).min(data.len());
        let data_end = find_inline_image_end(data, data_start).ok_or(ParseError::SyntaxError {
            position: data_start,
            message: "inline image without 'EI'".to_string(),
        })?;
        self.parser.lexer().set_position(data_end + 2);

        let mut data_end_trimmed = data_end;
        if data_end_trimmed > data_start && is_whitespace(data[data_end_trimmed - 1]) {
            data_end_trimmed -= 1;
        }

        Ok(RawOperation {
            operator: "BI".to_string(),
            operands,
            inline_data: Some(data_start..data_end_trimmed),
        })
    }
}

/// Position of the `EI` that closes inline image data starting at `start`:
/// preceded by whitespace and followed by whitespace or end of stream.
fn find_inline_image_end(data: &[u8], start: usize) -> Option<usize> {
    let mut pos = start;
    while pos + 1 < data.len() {
        if data[pos] == b'E'
            && data[pos + 1] == b'I'
            && pos > start
            && is_whitespace(data[pos - 1])
            && data.get(pos + 2).map_or(true, |&b| is_whitespace(b))
        {
            return Some(pos);
        }
        pos += 1;
    }
    None
}
