//! PDF Object Parser
//!
//! Builds [`PdfObject`] values from lexer tokens: direct objects, indirect
//! object definitions (`N G obj ... endobj`) and stream bodies.

use super::lexer::{is_whitespace, Lexer, Token};
use super::{ParseError, ParseOptions, ParseResult};
use crate::objects::{ObjectId, PdfArray, PdfDictionary, PdfName, PdfObject, PdfStream, PdfString};

pub struct ObjectParser<'a> {
    lexer: Lexer<'a>,
    max_depth: usize,
    lenient: bool,
}

impl<'a> ObjectParser<'a> {
    pub fn new(data: &'a [u8], position: usize) -> Self {
        Self::with_options(data, position, &ParseOptions::default())
    }

    pub fn with_options(data: &'a [u8], position: usize, options: &ParseOptions) -> Self {
        Self {
            lexer: Lexer::at(data, position),
            max_depth: options.max_nesting_depth,
            lenient: options.lenient,
        }
    }

    pub fn lexer(&mut self) -> &mut Lexer<'a> {
        &mut self.lexer
    }

    pub fn position(&self) -> usize {
        self.lexer.position()
    }

    /// Parse one direct object.
    pub fn parse_object(&mut self) -> ParseResult<PdfObject> {
        let token = self.lexer.next_token()?;
        self.parse_value(token, 0)
    }

    /// Parse a direct object whose first token has already been read.
    pub fn parse_value(&mut self, token: Token, depth: usize) -> ParseResult<PdfObject> {
        if depth > self.max_depth {
            return Err(ParseError::NestingTooDeep {
                position: self.lexer.token_start(),
            });
        }

        match token {
            Token::Null => Ok(PdfObject::Null),
            Token::Boolean(b) => Ok(PdfObject::Boolean(b)),
            Token::Integer(i) => Ok(self.maybe_reference(i)),
            Token::Real(r) => Ok(PdfObject::Real(r)),
            Token::String(bytes) => Ok(PdfObject::String(PdfString::new(bytes))),
            Token::HexString(bytes) => Ok(PdfObject::String(PdfString::hex(bytes))),
            Token::Name(name) => Ok(PdfObject::Name(PdfName(name))),
            Token::ArrayStart => self.parse_array(depth),
            Token::DictStart => Ok(PdfObject::Dictionary(self.parse_dictionary(depth)?)),
            Token::Eof => Err(ParseError::UnexpectedEof {
                position: self.lexer.token_start(),
            }),
            other => Err(ParseError::UnexpectedToken {
                position: self.lexer.token_start(),
                expected: "object".to_string(),
                found: other.describe(),
            }),
        }
    }

    /// `N G R` becomes a reference; a lone integer stays an integer.
    fn maybe_reference(&mut self, number: i64) -> PdfObject {
        let saved = self.lexer.position();

        if let (Ok(Token::Integer(generation)), Ok(Token::Keyword(keyword))) =
            (self.lexer.next_token(), self.lexer.next_token())
        {
            if keyword == "R" {
                if let (Ok(number), Ok(generation)) =
                    (u32::try_from(number), u16::try_from(generation))
                {
                    return PdfObject::Reference(ObjectId::new(number, generation));
                }
            }
        }

        self.lexer.set_position(saved);
        PdfObject::Integer(number)
    }

    fn parse_array(&mut self, depth: usize) -> ParseResult<PdfObject> {
        let mut array = PdfArray::new();
        loop {
            let token = self.lexer.next_token()?;
            match token {
                Token::ArrayEnd => break,
                Token::Eof => {
                    return Err(ParseError::UnexpectedEof {
                        position: self.lexer.token_start(),
                    })
                }
                token => array.push(self.parse_value(token, depth + 1)?),
            }
        }
        Ok(PdfObject::Array(array))
    }

    fn parse_dictionary(&mut self, depth: usize) -> ParseResult<PdfDictionary> {
        let mut dict = PdfDictionary::new();
        loop {
            let token = self.lexer.next_token()?;
            let key = match token {
                Token::DictEnd => break,
                Token::Name(name) => name,
                other => {
                    return Err(ParseError::UnexpectedToken {
                        position: self.lexer.token_start(),
                        expected: "name or '>>'".to_string(),
                        found: other.describe(),
                    })
                }
            };

            let value_token = self.lexer.next_token()?;
            if value_token == Token::DictEnd && self.lenient {
                dict.set(PdfName(key), PdfObject::Null);
                break;
            }
            let value = self.parse_value(value_token, depth + 1)?;
            dict.set(PdfName(key), value);
        }
        Ok(dict)
    }

    /// Parse `N G obj <value> endobj` starting at the current position.
    ///
    /// `resolve_length` is consulted when a stream's `/Length` is an indirect
    /// reference.
    pub fn parse_indirect_object(
        &mut self,
        resolve_length: &dyn Fn(ObjectId) -> Option<usize>,
    ) -> ParseResult<(ObjectId, PdfObject)> {
        let id = self.parse_object_header()?;
        let token = self.lexer.next_token()?;
        let value = match self.parse_value(token, 0)? {
            PdfObject::Dictionary(dict) if self.lexer.peek_token()? == Token::Stream => {
                self.lexer.next_token()?;
                let data = self.read_stream_body(&dict, resolve_length)?;
                PdfObject::Stream(PdfStream::new(dict, data))
            }
            other => other,
        };

        match self.lexer.next_token()? {
            Token::EndObj => {}
            _ if self.lenient => {
                tracing::warn!("Object {} is missing 'endobj'", id);
            }
            other => {
                return Err(ParseError::UnexpectedToken {
                    position: self.lexer.token_start(),
                    expected: "endobj".to_string(),
                    found: other.describe(),
                })
            }
        }

        Ok((id, value))
    }

    fn parse_object_header(&mut self) -> ParseResult<ObjectId> {
        let start = {
            self.lexer.skip_whitespace();
            self.lexer.position()
        };
        let number = match self.lexer.next_token()? {
            Token::Integer(n) if n >= 0 => n,
            other => {
                return Err(ParseError::UnexpectedToken {
                    position: start,
                    expected: "object number".to_string(),
                    found: other.describe(),
                })
            }
        };
        let generation = match self.lexer.next_token()? {
            Token::Integer(g) if (0..=u16::MAX as i64).contains(&g) => g,
            other => {
                return Err(ParseError::UnexpectedToken {
                    position: self.lexer.token_start(),
                    expected: "generation number".to_string(),
                    found: other.describe(),
                })
            }
        };
        match self.lexer.next_token()? {
            Token::Obj => {}
            other => {
                return Err(ParseError::UnexpectedToken {
                    position: self.lexer.token_start(),
                    expected: "obj".to_string(),
                    found: other.describe(),
                })
            }
        }

        let number = u32::try_from(number).map_err(|_| ParseError::SyntaxError {
            position: start,
            message: format!("object number {number} out of range"),
        })?;
        Ok(ObjectId::new(number, generation as u16))
    }

    fn read_stream_body(
        &mut self,
        dict: &PdfDictionary,
        resolve_length: &dyn Fn(ObjectId) -> Option<usize>,
    ) -> ParseResult<Vec<u8>> {
        let data = self.lexer.data();

        // "stream" must be followed by CRLF or LF; tolerate stray spaces.
        let mut start = self.lexer.position();
        while data.get(start) == Some(&b' ') {
            start += 1;
        }
        self.lexer.set_position(start);
        self.lexer.skip_eol();
        let start = self.lexer.position();

        let declared = match dict.get("Length") {
            Some(PdfObject::Integer(n)) => usize::try_from(*n).ok(),
            Some(PdfObject::Reference(id)) => resolve_length(*id),
            _ => None,
        };

        if let Some(length) = declared {
            let end = start.saturating_add(length);
            if end <= data.len() && endstream_follows(data, end) {
                self.lexer.set_position(end);
                self.expect_endstream()?;
                return Ok(data[start..end].to_vec());
            }
        }

        if !self.lenient {
            return Err(match declared {
                Some(length) => ParseError::SyntaxError {
                    position: start,
                    message: format!("stream /Length {length} does not reach 'endstream'"),
                },
                None => ParseError::MissingKey("Length".to_string()),
            });
        }

        let marker = find_subsequence(&data[start..], b"endstream").ok_or(
            ParseError::UnexpectedEof { position: start },
        )?;
        let mut end = start + marker;
        if end > start && data[end - 1] == b'\n' {
            end -= 1;
        }
        if end > start && data[end - 1] == b'\r' {
            end -= 1;
        }
        tracing::warn!(
            "Recovered stream length {} at offset {} (declared {:?})",
            end - start,
            start,
            declared
        );
        self.lexer.set_position(start + marker);
        self.expect_endstream()?;
        Ok(data[start..end].to_vec())
    }

    fn expect_endstream(&mut self) -> ParseResult<()> {
        match self.lexer.next_token()? {
            Token::EndStream => Ok(()),
            other => Err(ParseError::UnexpectedToken {
                position: self.lexer.token_start(),
                expected: "endstream".to_string(),
                found: other.describe(),
            }),
        }
    }
}

fn endstream_follows(data: &[u8], mut position: usize) -> bool {
    while position < data.len() && is_whitespace(data[position]) {
        position += 1;
    }
    data[position..].starts_with(b"endstream")
}

pub(crate) fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|window| window == needle)
}

pub(crate) fn rfind_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|window| window == needle)
}
