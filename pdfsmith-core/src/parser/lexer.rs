//! PDF Lexer
//!
//! Tokenizes PDF syntax according to ISO 32000-1 Section 7.2. The same lexer
//! serves file structure, content streams and CMaps, so any run of regular
//! characters that is not a number or a structural keyword comes back as
//! [`Token::Keyword`] (operators, `R`, `begincodespacerange`, ...).

use super::{ParseError, ParseResult};

/// PDF Token types
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Boolean: true or false
    Boolean(bool),

    /// Integer number
    Integer(i64),

    /// Real number
    Real(f64),

    /// Literal string `( ... )`, escapes already applied
    String(Vec<u8>),

    /// Hexadecimal string `< ... >`, already decoded to bytes
    HexString(Vec<u8>),

    /// Name object without the slash, `#xx` escapes applied
    Name(String),

    /// Left square bracket [
    ArrayStart,

    /// Right square bracket ]
    ArrayEnd,

    /// Dictionary start <<
    DictStart,

    /// Dictionary end >>
    DictEnd,

    /// Stream keyword
    Stream,

    /// Endstream keyword
    EndStream,

    /// Obj keyword
    Obj,

    /// Endobj keyword
    EndObj,

    /// Xref keyword
    XRef,

    /// Trailer keyword
    Trailer,

    /// StartXRef keyword
    StartXRef,

    /// Null object
    Null,

    /// Any other bare word: content operators, `R`, CMap keywords
    Keyword(String),

    /// End of input
    Eof,
}

impl Token {
    /// Short description for error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Boolean(b) => b.to_string(),
            Token::Integer(i) => i.to_string(),
            Token::Real(r) => r.to_string(),
            Token::String(_) => "string".to_string(),
            Token::HexString(_) => "hex string".to_string(),
            Token::Name(n) => format!("/{n}"),
            Token::ArrayStart => "[".to_string(),
            Token::ArrayEnd => "]".to_string(),
            Token::DictStart => "<<".to_string(),
            Token::DictEnd => ">>".to_string(),
            Token::Stream => "stream".to_string(),
            Token::EndStream => "endstream".to_string(),
            Token::Obj => "obj".to_string(),
            Token::EndObj => "endobj".to_string(),
            Token::XRef => "xref".to_string(),
            Token::Trailer => "trailer".to_string(),
            Token::StartXRef => "startxref".to_string(),
            Token::Null => "null".to_string(),
            Token::Keyword(k) => k.clone(),
            Token::Eof => "end of data".to_string(),
        }
    }
}

pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b'\0' | b'\t' | b'\n' | b'\x0C' | b'\r' | b' ')
}

pub fn is_delimiter(b: u8) -> bool {
    matches!(
        b,
        b'(' | b')' | b'<' | b'>' | b'[' | b']' | b'{' | b'}' | b'/' | b'%'
    )
}

fn is_regular(b: u8) -> bool {
    !is_whitespace(b) && !is_delimiter(b)
}

/// PDF Lexer over an in-memory buffer
pub struct Lexer<'a> {
    data: &'a [u8],
    position: usize,
    token_start: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self::at(data, 0)
    }

    /// A lexer starting at `position`.
    pub fn at(data: &'a [u8], position: usize) -> Self {
        Self {
            data,
            position: position.min(data.len()),
            token_start: position.min(data.len()),
        }
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn set_position(&mut self, position: usize) {
        self.position = position.min(self.data.len());
    }

    /// Offset where the most recently returned token began.
    pub fn token_start(&self) -> usize {
        self.token_start
    }

    pub fn is_eof(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Get the next token
    pub fn next_token(&mut self) -> ParseResult<Token> {
        self.skip_whitespace();
        self.token_start = self.position;

        let ch = match self.peek_byte() {
            Some(ch) => ch,
            None => return Ok(Token::Eof),
        };

        match ch {
            b'/' => self.read_name(),
            b'(' => self.read_literal_string(),
            b'<' => {
                if self.byte_at(self.position + 1) == Some(b'<') {
                    self.position += 2;
                    Ok(Token::DictStart)
                } else {
                    self.read_hex_string()
                }
            }
            b'>' => {
                if self.byte_at(self.position + 1) == Some(b'>') {
                    self.position += 2;
                    Ok(Token::DictEnd)
                } else {
                    Err(ParseError::SyntaxError {
                        position: self.position,
                        message: "Expected '>' after '>'".to_string(),
                    })
                }
            }
            b'[' => {
                self.position += 1;
                Ok(Token::ArrayStart)
            }
            b']' => {
                self.position += 1;
                Ok(Token::ArrayEnd)
            }
            b')' => Err(ParseError::SyntaxError {
                position: self.position,
                message: "Unbalanced ')'".to_string(),
            }),
            b'{' | b'}' => {
                self.position += 1;
                Ok(Token::Keyword((ch as char).to_string()))
            }
            _ => self.read_word(),
        }
    }

    /// Look at the next token without consuming it.
    pub fn peek_token(&mut self) -> ParseResult<Token> {
        let saved = (self.position, self.token_start);
        let token = self.next_token();
        (self.position, self.token_start) = saved;
        token
    }

    /// Skip whitespace and comments.
    pub fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek_byte() {
            if is_whitespace(ch) {
                self.position += 1;
            } else if ch == b'%' {
                while let Some(c) = self.peek_byte() {
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                    self.position += 1;
                }
            } else {
                break;
            }
        }
    }

    /// Consume a single end-of-line marker (CRLF, LF or CR) if present.
    pub fn skip_eol(&mut self) {
        match self.peek_byte() {
            Some(b'\r') => {
                self.position += 1;
                if self.peek_byte() == Some(b'\n') {
                    self.position += 1;
                }
            }
            Some(b'\n') => self.position += 1,
            _ => {}
        }
    }

    fn peek_byte(&self) -> Option<u8> {
        self.data.get(self.position).copied()
    }

    fn byte_at(&self, index: usize) -> Option<u8> {
        self.data.get(index).copied()
    }

    fn read_word(&mut self) -> ParseResult<Token> {
        let start = self.position;
        while matches!(self.peek_byte(), Some(b) if is_regular(b)) {
            self.position += 1;
        }
        let word = &self.data[start..self.position];

        if let Some(number) = parse_number(word) {
            return Ok(number);
        }

        let token = match word {
            b"true" => Token::Boolean(true),
            b"false" => Token::Boolean(false),
            b"null" => Token::Null,
            b"obj" => Token::Obj,
            b"endobj" => Token::EndObj,
            b"stream" => Token::Stream,
            b"endstream" => Token::EndStream,
            b"xref" => Token::XRef,
            b"trailer" => Token::Trailer,
            b"startxref" => Token::StartXRef,
            _ => Token::Keyword(word.iter().map(|&b| b as char).collect()),
        };
        Ok(token)
    }

    fn read_name(&mut self) -> ParseResult<Token> {
        self.position += 1; // '/'
        let mut name = String::new();
        while let Some(b) = self.peek_byte() {
            if !is_regular(b) {
                break;
            }
            if b == b'#' {
                let hi = self.byte_at(self.position + 1).and_then(hex_value);
                let lo = self.byte_at(self.position + 2).and_then(hex_value);
                if let (Some(hi), Some(lo)) = (hi, lo) {
                    name.push(((hi << 4) | lo) as char);
                    self.position += 3;
                    continue;
                }
            }
            name.push(b as char);
            self.position += 1;
        }
        Ok(Token::Name(name))
    }

    fn read_literal_string(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.position += 1; // '('
        let mut bytes = Vec::new();
        let mut depth = 1usize;

        loop {
            let b = self
                .peek_byte()
                .ok_or(ParseError::UnexpectedEof { position: start })?;
            self.position += 1;
            match b {
                b'(' => {
                    depth += 1;
                    bytes.push(b);
                }
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    bytes.push(b);
                }
                b'\\' => self.read_escape(&mut bytes),
                b'\r' => {
                    // Bare CR and CRLF both mean a single LF inside strings.
                    if self.peek_byte() == Some(b'\n') {
                        self.position += 1;
                    }
                    bytes.push(b'\n');
                }
                _ => bytes.push(b),
            }
        }

        Ok(Token::String(bytes))
    }

    fn read_escape(&mut self, bytes: &mut Vec<u8>) {
        let Some(b) = self.peek_byte() else {
            return;
        };
        self.position += 1;
        match b {
            b'n' => bytes.push(b'\n'),
            b'r' => bytes.push(b'\r'),
            b't' => bytes.push(b'\t'),
            b'b' => bytes.push(0x08),
            b'f' => bytes.push(0x0C),
            b'(' | b')' | b'\\' => bytes.push(b),
            b'\r' => {
                if self.peek_byte() == Some(b'\n') {
                    self.position += 1;
                }
            }
            b'\n' => {}
            b'0'..=b'7' => {
                let mut value = (b - b'0') as u32;
                for _ in 0..2 {
                    match self.peek_byte() {
                        Some(d @ b'0'..=b'7') => {
                            value = value * 8 + (d - b'0') as u32;
                            self.position += 1;
                        }
                        _ => break,
                    }
                }
                bytes.push((value & 0xFF) as u8);
            }
            // Unknown escapes drop the backslash.
            other => bytes.push(other),
        }
    }

    fn read_hex_string(&mut self) -> ParseResult<Token> {
        let start = self.position;
        self.position += 1; // '<'
        let mut bytes = Vec::new();
        let mut high: Option<u8> = None;

        loop {
            let b = self
                .peek_byte()
                .ok_or(ParseError::UnexpectedEof { position: start })?;
            self.position += 1;
            if b == b'>' {
                break;
            }
            if is_whitespace(b) {
                continue;
            }
            let value = hex_value(b).ok_or_else(|| ParseError::SyntaxError {
                position: self.position - 1,
                message: format!("Invalid hex digit '{}'", b as char),
            })?;
            match high.take() {
                Some(h) => bytes.push((h << 4) | value),
                None => high = Some(value),
            }
        }

        // An odd trailing digit is padded with 0.
        if let Some(h) = high {
            bytes.push(h << 4);
        }

        Ok(Token::HexString(bytes))
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn parse_number(word: &[u8]) -> Option<Token> {
    let digits = match word.first() {
        Some(b'+') | Some(b'-') => &word[1..],
        _ => word,
    };
    if digits.is_empty() {
        return None;
    }

    let dots = digits.iter().filter(|&&b| b == b'.').count();
    let all_numeric = digits.iter().all(|&b| b.is_ascii_digit() || b == b'.');
    if !all_numeric || dots > 1 || digits == b"." {
        return None;
    }

    let text = std::str::from_utf8(word).ok()?;
    if dots == 0 {
        if let Ok(value) = text.parse::<i64>() {
            return Some(Token::Integer(value));
        }
    }

    // "4." and ".5" are valid PDF reals; Rust's parser accepts both forms.
    text.parse::<f64>().ok().map(Token::Real)
}
