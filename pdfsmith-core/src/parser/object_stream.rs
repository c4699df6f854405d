//! Object streams (ISO 32000-1 Section 7.5.7)
//!
//! An object stream packs several non-stream objects into one compressed
//! stream. Its header is `N` pairs of `object-number offset`, followed at
//! `/First` by the objects themselves.

use super::lexer::Token;
use super::objects::ObjectParser;
use super::{ParseError, ParseOptions, ParseResult};
use crate::objects::{PdfObject, PdfStream};

#[derive(Debug, Clone)]
pub struct ObjectStream {
    data: Vec<u8>,
    first: usize,
    offsets: Vec<(u32, usize)>,
}

impl ObjectStream {
    /// Build from a stream whose payload is already decoded.
    pub fn parse(stream: &PdfStream, decoded: Vec<u8>) -> ParseResult<Self> {
        let count = stream
            .dict
            .get_integer("N")
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| ParseError::MissingKey("N".to_string()))?;
        let first = stream
            .dict
            .get_integer("First")
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&first| first <= decoded.len())
            .ok_or_else(|| ParseError::MissingKey("First".to_string()))?;

        let mut parser = ObjectParser::new(&decoded[..first], 0);
        let mut offsets = Vec::with_capacity(count);
        for _ in 0..count {
            let number = parser.lexer().next_token()?;
            let offset = parser.lexer().next_token()?;
            match (number, offset) {
                (Token::Integer(number), Token::Integer(offset)) if number >= 0 && offset >= 0 => {
                    offsets.push((number as u32, offset as usize));
                }
                _ => {
                    return Err(ParseError::SyntaxError {
                        position: parser.position(),
                        message: "invalid object stream header".to_string(),
                    })
                }
            }
        }

        Ok(Self {
            data: decoded,
            first,
            offsets,
        })
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn object_numbers(&self) -> impl Iterator<Item = u32> + '_ {
        self.offsets.iter().map(|(number, _)| *number)
    }

    /// Position of an object number inside this stream.
    pub fn index_of(&self, number: u32) -> Option<usize> {
        self.offsets.iter().position(|(n, _)| *n == number)
    }

    /// Parse the object at `index`, returning its object number with it.
    pub fn get(&self, index: usize, options: &ParseOptions) -> ParseResult<(u32, PdfObject)> {
        let (number, offset) = *self.offsets.get(index).ok_or_else(|| ParseError::SyntaxError {
            position: index,
            message: format!("object stream has only {} objects", self.offsets.len()),
        })?;
        let start = self.first + offset;
        if start > self.data.len() {
            return Err(ParseError::SyntaxError {
                position: start,
                message: "object offset beyond object stream data".to_string(),
            });
        }

        let mut parser = ObjectParser::with_options(&self.data, start, options);
        let object = parser.parse_object()?;
        Ok((number, object))
    }
}
