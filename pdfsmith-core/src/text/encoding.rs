//! Single-byte text encodings (ISO 32000-1 Annex D)
//!
//! Decoding tables for the encodings a simple font can name in `/Encoding`,
//! plus PDFDocEncoding for text strings outside content streams.

/// A predefined single-byte encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextEncoding {
    StandardEncoding,
    MacRomanEncoding,
    WinAnsiEncoding,
    PdfDocEncoding,
}

// Code 0x80..=0x9F in WinAnsiEncoding; 0 marks an undefined code.
const WIN_ANSI_HIGH: [u16; 32] = [
    0x20AC, 0, 0x201A, 0x0192, 0x201E, 0x2026, 0x2020, 0x2021, 0x02C6, 0x2030, 0x0160, 0x2039,
    0x0152, 0, 0x017D, 0, 0, 0x2018, 0x2019, 0x201C, 0x201D, 0x2022, 0x2013, 0x2014, 0x02DC,
    0x2122, 0x0161, 0x203A, 0x0153, 0, 0x017E, 0x0178,
];

// Code 0x80..=0xFF in MacRomanEncoding.
const MAC_ROMAN_HIGH: [u16; 128] = [
    0x00C4, 0x00C5, 0x00C7, 0x00C9, 0x00D1, 0x00D6, 0x00DC, 0x00E1, 0x00E0, 0x00E2, 0x00E4,
    0x00E3, 0x00E5, 0x00E7, 0x00E9, 0x00E8, 0x00EA, 0x00EB, 0x00ED, 0x00EC, 0x00EE, 0x00EF,
    0x00F1, 0x00F3, 0x00F2, 0x00F4, 0x00F6, 0x00F5, 0x00FA, 0x00F9, 0x00FB, 0x00FC, 0x2020,
    0x00B0, 0x00A2, 0x00A3, 0x00A7, 0x2022, 0x00B6, 0x00DF, 0x00AE, 0x00A9, 0x2122, 0x00B4,
    0x00A8, 0x2260, 0x00C6, 0x00D8, 0x221E, 0x00B1, 0x2264, 0x2265, 0x00A5, 0x00B5, 0x2202,
    0x2211, 0x220F, 0x03C0, 0x222B, 0x00AA, 0x00BA, 0x03A9, 0x00E6, 0x00F8, 0x00BF, 0x00A1,
    0x00AC, 0x221A, 0x0192, 0x2248, 0x2206, 0x00AB, 0x00BB, 0x2026, 0x00A0, 0x00C0, 0x00C3,
    0x00D5, 0x0152, 0x0153, 0x2013, 0x2014, 0x201C, 0x201D, 0x2018, 0x2019, 0x00F7, 0x25CA,
    0x00FF, 0x0178, 0x2044, 0x00A4, 0x2039, 0x203A, 0xFB01, 0xFB02, 0x2021, 0x00B7, 0x201A,
    0x201E, 0x2030, 0x00C2, 0x00CA, 0x00C1, 0x00CB, 0x00C8, 0x00CD, 0x00CE, 0x00CF, 0x00CC,
    0x00D3, 0x00D4, 0, 0x00D2, 0x00DA, 0x00DB, 0x00D9, 0x0131, 0x02C6, 0x02DC, 0x00AF, 0x02D8,
    0x02D9, 0x02DA, 0x00B8, 0x02DD, 0x02DB, 0x02C7,
];

// Code 0xA0..=0xFF in StandardEncoding.
const STANDARD_HIGH: [u16; 96] = [
    0, 0x00A1, 0x00A2, 0x00A3, 0x2044, 0x00A5, 0x0192, 0x00A7, 0x00A4, 0x0027, 0x201C, 0x00AB,
    0x2039, 0x203A, 0xFB01, 0xFB02, 0, 0x2013, 0x2020, 0x2021, 0x00B7, 0, 0x00B6, 0x2022,
    0x201A, 0x201E, 0x201D, 0x00BB, 0x2026, 0x2030, 0, 0x00BF, 0, 0x0060, 0x00B4, 0x02C6,
    0x02DC, 0x00AF, 0x02D8, 0x02D9, 0x00A8, 0, 0x02DA, 0x00B8, 0, 0x02DD, 0x02DB, 0x02C7,
    0x2014, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x00C6, 0, 0x00AA, 0, 0, 0, 0,
    0x0141, 0x00D8, 0x0152, 0x00BA, 0, 0, 0, 0, 0, 0x00E6, 0, 0, 0, 0x0131, 0, 0, 0x0142,
    0x00F8, 0x0153, 0x00DF, 0, 0, 0, 0,
];

// Code 0x18..=0x1F in PDFDocEncoding.
const PDF_DOC_CONTROL: [u16; 8] = [
    0x02D8, 0x02C7, 0x02C6, 0x02D9, 0x02DD, 0x02DB, 0x02DA, 0x02DC,
];

// Code 0x80..=0xA0 in PDFDocEncoding.
const PDF_DOC_HIGH: [u16; 33] = [
    0x2022, 0x2020, 0x2021, 0x2026, 0x2014, 0x2013, 0x0192, 0x2044, 0x2039, 0x203A, 0x2212,
    0x2030, 0x201E, 0x201C, 0x201D, 0x2018, 0x2019, 0x201A, 0x2122, 0xFB01, 0xFB02, 0x0141,
    0x0152, 0x0160, 0x0178, 0x017D, 0x0131, 0x0142, 0x0153, 0x0161, 0x017E, 0, 0x20AC,
];

fn table_char(value: u16) -> Option<char> {
    if value == 0 {
        None
    } else {
        char::from_u32(value as u32)
    }
}

impl TextEncoding {
    /// Map an `/Encoding` or `/BaseEncoding` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(TextEncoding::StandardEncoding),
            "MacRomanEncoding" => Some(TextEncoding::MacRomanEncoding),
            "WinAnsiEncoding" => Some(TextEncoding::WinAnsiEncoding),
            "PDFDocEncoding" => Some(TextEncoding::PdfDocEncoding),
            _ => None,
        }
    }

    pub fn pdf_name(&self) -> &'static str {
        match self {
            TextEncoding::StandardEncoding => "StandardEncoding",
            TextEncoding::MacRomanEncoding => "MacRomanEncoding",
            TextEncoding::WinAnsiEncoding => "WinAnsiEncoding",
            TextEncoding::PdfDocEncoding => "PDFDocEncoding",
        }
    }

    /// Unicode value of a single code, `None` if the encoding leaves it undefined.
    pub fn decode_byte(&self, byte: u8) -> Option<char> {
        match self {
            TextEncoding::StandardEncoding => match byte {
                0x27 => Some('\u{2019}'),
                0x60 => Some('\u{2018}'),
                0x20..=0x7E => Some(byte as char),
                0xA0..=0xFF => table_char(STANDARD_HIGH[(byte - 0xA0) as usize]),
                _ => None,
            },
            TextEncoding::WinAnsiEncoding => match byte {
                0x20..=0x7E | 0xA0..=0xFF => Some(byte as char),
                0x80..=0x9F => table_char(WIN_ANSI_HIGH[(byte - 0x80) as usize]),
                _ => None,
            },
            TextEncoding::MacRomanEncoding => match byte {
                0x20..=0x7E => Some(byte as char),
                0x80..=0xFF => table_char(MAC_ROMAN_HIGH[(byte - 0x80) as usize]),
                _ => None,
            },
            TextEncoding::PdfDocEncoding => match byte {
                0x18..=0x1F => table_char(PDF_DOC_CONTROL[(byte - 0x18) as usize]),
                0x00..=0x7E => Some(byte as char),
                0x80..=0xA0 => table_char(PDF_DOC_HIGH[(byte - 0x80) as usize]),
                0xAD => None,
                0xA1..=0xFF => Some(byte as char),
                _ => None,
            },
        }
    }

    /// Decode a byte string; undefined codes become U+FFFD.
    pub fn decode(&self, data: &[u8]) -> String {
        data.iter()
            .map(|&b| self.decode_byte(b).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }

    /// The code for `ch`, if the encoding has one.
    pub fn encode_char(&self, ch: char) -> Option<u8> {
        if ch.is_ascii() {
            let byte = ch as u8;
            if self.decode_byte(byte) == Some(ch) {
                return Some(byte);
            }
        }
        (0x80..=0xFF).find(|&b| self.decode_byte(b) == Some(ch))
    }

    /// Encode text for use in a content stream; unmappable characters become `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        text.chars()
            .map(|ch| self.encode_char(ch).unwrap_or(b'?'))
            .collect()
    }
}

/// Decode a PDF text string (Info entries, outline titles, ...).
///
/// UTF-16BE and UTF-8 are recognized by their byte order marks; anything
/// else is PDFDocEncoding.
pub fn decode_text_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks(2)
            .map(|pair| u16::from_be_bytes([pair[0], *pair.get(1).unwrap_or(&0)]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    if let Some(utf8) = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return String::from_utf8_lossy(utf8).into_owned();
    }
    TextEncoding::PdfDocEncoding.decode(bytes)
}

/// Encode text as a PDF text string: PDFDocEncoding when every character has
/// a code there, UTF-16BE with a byte order mark otherwise.
pub fn encode_text_string(text: &str) -> Vec<u8> {
    let doc: Option<Vec<u8>> = text
        .chars()
        .map(|ch| TextEncoding::PdfDocEncoding.encode_char(ch))
        .collect();
    match doc {
        Some(bytes) => bytes,
        None => {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            bytes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_is_shared() {
        for encoding in [
            TextEncoding::WinAnsiEncoding,
            TextEncoding::MacRomanEncoding,
            TextEncoding::PdfDocEncoding,
        ] {
            assert_eq!(encoding.decode(b"Hello, World!"), "Hello, World!");
        }
        assert_eq!(TextEncoding::StandardEncoding.decode(b"Hello"), "Hello");
    }

    #[test]
    fn test_standard_quotes() {
        assert_eq!(TextEncoding::StandardEncoding.decode(b"`it's'"), "\u{2018}it\u{2019}s\u{2019}");
        assert_eq!(TextEncoding::StandardEncoding.decode(&[0xAE, 0xD0]), "\u{FB01}\u{2014}");
    }

    #[test]
    fn test_win_ansi_specials() {
        let enc = TextEncoding::WinAnsiEncoding;
        assert_eq!(enc.decode(&[0x80, 0x93, 0x94, 0xE9]), "\u{20AC}\u{201C}\u{201D}é");
        assert_eq!(enc.decode(&[0x81]), "\u{FFFD}");
        assert_eq!(enc.encode("€ café"), vec![0x80, b' ', b'c', b'a', b'f', 0xE9]);
        assert_eq!(enc.encode("日"), b"?");
    }

    #[test]
    fn test_mac_roman() {
        let enc = TextEncoding::MacRomanEncoding;
        assert_eq!(enc.decode(&[0x8E, 0xA5, 0xDE]), "é•\u{FB01}");
    }

    #[test]
    fn test_text_strings() {
        assert_eq!(decode_text_string(b"Plain"), "Plain");
        assert_eq!(decode_text_string(&[0xFE, 0xFF, 0x00, 0x48, 0x00, 0xE9]), "Hé");
        assert_eq!(decode_text_string(&[0xEF, 0xBB, 0xBF, b'o', b'k']), "ok");
        assert_eq!(decode_text_string(&[0x93]), "\u{FB01}");
    }

    #[test]
    fn test_encode_text_string() {
        assert_eq!(encode_text_string("Report"), b"Report");
        let utf16 = encode_text_string("日本");
        assert_eq!(&utf16[..2], &[0xFE, 0xFF]);
        assert_eq!(decode_text_string(&utf16), "日本");
    }

    #[test]
    fn test_names() {
        assert_eq!(
            TextEncoding::from_name("WinAnsiEncoding"),
            Some(TextEncoding::WinAnsiEncoding)
        );
        assert_eq!(TextEncoding::from_name("Identity-H"), None);
        assert_eq!(TextEncoding::MacRomanEncoding.pdf_name(), "MacRomanEncoding");
    }
}
