//! Character code decoding for text extraction
//!
//! A [`FontDecoder`] is built from a font resource dictionary and turns the
//! bytes of a text-showing operator into glyphs: the Unicode text of each
//! character code plus its advance width. Decoding never fails; codes with no
//! usable mapping become U+FFFD.

use super::cmap::CMap;
use super::encoding::TextEncoding;
use super::glyph_list::glyph_to_unicode;
use super::metrics::glyph_width;
use super::Font;
use crate::objects::{ObjectTable, PdfDictionary, PdfObject};
use std::collections::HashMap;

/// One decoded character code.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedGlyph {
    pub text: String,
    /// Advance width in thousandths of text space.
    pub width: f64,
    /// Single-byte code 32, the only code word spacing applies to.
    pub is_space: bool,
}

#[derive(Debug, Clone)]
enum FontKind {
    /// One byte per code; the table holds the encoding after `/Differences`.
    Simple { table: Vec<Option<String>> },
    /// Type0: code lengths come from the encoding CMap.
    Composite { encoding: CMap },
}

#[derive(Debug, Clone)]
enum Widths {
    Explicit {
        first_char: u32,
        widths: Vec<f64>,
        missing: f64,
    },
    Standard(Font),
    Cid {
        default: f64,
        widths: HashMap<u32, f64>,
    },
    Fixed(f64),
}

#[derive(Debug, Clone)]
pub struct FontDecoder {
    kind: FontKind,
    to_unicode: Option<CMap>,
    widths: Widths,
}

impl Default for FontDecoder {
    fn default() -> Self {
        Self::fallback()
    }
}

const FALLBACK_WIDTH: f64 = 500.0;

impl FontDecoder {
    /// Decoder for text shown without a usable font resource: WinAnsi codes
    /// with an average advance width.
    pub fn fallback() -> Self {
        Self {
            kind: FontKind::Simple {
                table: encoding_table(Some(TextEncoding::WinAnsiEncoding)),
            },
            to_unicode: None,
            widths: Widths::Fixed(FALLBACK_WIDTH),
        }
    }

    /// Decoder for one of the standard 14 fonts with the given encoding.
    pub fn standard(font: Font, encoding: TextEncoding) -> Self {
        Self {
            kind: FontKind::Simple {
                table: encoding_table(Some(encoding)),
            },
            to_unicode: None,
            widths: Widths::Standard(font),
        }
    }

    /// Build a decoder from a font dictionary. Problems with optional parts
    /// (a broken ToUnicode stream, malformed widths) are logged and skipped.
    pub fn from_dict(dict: &PdfDictionary, objects: &ObjectTable) -> Self {
        let to_unicode = load_to_unicode(dict, objects);

        if dict.get_name("Subtype") == Some("Type0") {
            return Self {
                kind: FontKind::Composite {
                    encoding: composite_encoding(dict, objects),
                },
                to_unicode,
                widths: cid_widths(dict, objects),
            };
        }

        let standard = dict.get_name("BaseFont").and_then(Font::from_name);
        let symbolic = standard.is_some_and(|font| font.is_symbolic()) || has_symbolic_flag(dict, objects);

        let encoding_obj = dict.get("Encoding").and_then(|obj| objects.resolve(obj).ok());
        let base_encoding = match encoding_obj {
            Some(PdfObject::Name(name)) => TextEncoding::from_name(name.as_str()),
            Some(PdfObject::Dictionary(enc)) => enc.get_name("BaseEncoding").and_then(TextEncoding::from_name),
            _ => None,
        }
        .or(match (symbolic, dict.get_name("Subtype")) {
            (true, _) => None,
            (false, Some("TrueType")) => Some(TextEncoding::WinAnsiEncoding),
            (false, _) => Some(TextEncoding::StandardEncoding),
        });

        let mut table = encoding_table(base_encoding);
        if let Some(PdfObject::Dictionary(enc)) = encoding_obj {
            if let Some(differences) = enc
                .get("Differences")
                .and_then(|obj| objects.resolve(obj).ok())
                .and_then(PdfObject::as_array)
            {
                apply_differences(&mut table, differences.iter());
            }
        }

        Self {
            kind: FontKind::Simple { table },
            to_unicode,
            widths: simple_widths(dict, objects, standard),
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self.kind, FontKind::Composite { .. })
    }

    /// Split `bytes` into character codes and decode each.
    pub fn decode(&self, bytes: &[u8]) -> Vec<DecodedGlyph> {
        let mut glyphs = Vec::with_capacity(bytes.len());
        let mut pos = 0;

        while pos < bytes.len() {
            let len = match &self.kind {
                FontKind::Simple { .. } => 1,
                FontKind::Composite { encoding } => encoding.code_length(&bytes[pos..]),
            };
            let code = &bytes[pos..(pos + len).min(bytes.len())];
            pos += len;

            let text = self
                .to_unicode
                .as_ref()
                .and_then(|cmap| cmap.lookup(code))
                .or_else(|| self.fallback_text(code))
                .unwrap_or_else(|| char::REPLACEMENT_CHARACTER.to_string());
            let width = self.width(code, &text);

            glyphs.push(DecodedGlyph {
                is_space: code == [b' '],
                text,
                width,
            });
        }

        glyphs
    }

    fn fallback_text(&self, code: &[u8]) -> Option<String> {
        match &self.kind {
            FontKind::Simple { table } => table.get(code[0] as usize).cloned().flatten(),
            // Without a ToUnicode map, treat the code as a Unicode scalar.
            FontKind::Composite { .. } => {
                let value = code.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
                char::from_u32(value)
                    .filter(|ch| !ch.is_control())
                    .map(String::from)
            }
        }
    }

    fn width(&self, code: &[u8], text: &str) -> f64 {
        let value = code.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32);
        match &self.widths {
            Widths::Explicit {
                first_char,
                widths,
                missing,
            } => value
                .checked_sub(*first_char)
                .and_then(|i| widths.get(i as usize))
                .copied()
                .unwrap_or(*missing),
            Widths::Standard(font) => text
                .chars()
                .next()
                .map_or(FALLBACK_WIDTH, |ch| glyph_width(ch, *font) as f64),
            Widths::Cid { default, widths } => widths.get(&value).copied().unwrap_or(*default),
            Widths::Fixed(width) => *width,
        }
    }
}

/// 256 entries; `None` means the code has no Unicode value. Without a base
/// encoding (symbolic fonts) codes map to the Latin-1 character of the same
/// value.
fn encoding_table(encoding: Option<TextEncoding>) -> Vec<Option<String>> {
    (0..=255u8)
        .map(|code| match encoding {
            Some(encoding) => encoding.decode_byte(code).map(String::from),
            None if code >= 0x20 => Some((code as char).to_string()),
            None => None,
        })
        .collect()
}

fn apply_differences<'a>(table: &mut [Option<String>], entries: impl Iterator<Item = &'a PdfObject>) {
    let mut code: Option<usize> = None;
    for entry in entries {
        match entry {
            PdfObject::Integer(n) => code = usize::try_from(*n).ok(),
            PdfObject::Name(name) => {
                if let Some(slot) = code.and_then(|c| table.get_mut(c)) {
                    *slot = glyph_to_unicode(name.as_str());
                    if slot.is_none() {
                        tracing::trace!("No Unicode value for glyph /{}", name.as_str());
                    }
                }
                code = code.map(|c| c + 1);
            }
            _ => {}
        }
    }
}

fn load_to_unicode(dict: &PdfDictionary, objects: &ObjectTable) -> Option<CMap> {
    let stream = dict
        .get("ToUnicode")
        .and_then(|obj| objects.resolve(obj).ok())
        .and_then(PdfObject::as_stream)?;
    let parsed = objects
        .decode_stream(stream)
        .map_err(|e| e.to_string())
        .and_then(|data| CMap::parse(&data).map_err(|e| e.to_string()));
    match parsed {
        Ok(cmap) => Some(cmap),
        Err(err) => {
            tracing::warn!("Ignoring unusable ToUnicode CMap: {}", err);
            None
        }
    }
}

fn composite_encoding(dict: &PdfDictionary, objects: &ObjectTable) -> CMap {
    match dict.get("Encoding").and_then(|obj| objects.resolve(obj).ok()) {
        Some(PdfObject::Name(name)) if name.as_str().starts_with("Identity") => CMap::identity_h(),
        Some(PdfObject::Stream(stream)) => objects
            .decode_stream(stream)
            .ok()
            .and_then(|data| CMap::parse(&data).ok())
            .filter(|cmap| !cmap.codespace_ranges.is_empty())
            .unwrap_or_else(CMap::identity_h),
        other => {
            tracing::warn!(
                "Unsupported composite font encoding {:?}, assuming two-byte codes",
                other.and_then(PdfObject::as_name)
            );
            CMap::identity_h()
        }
    }
}

fn has_symbolic_flag(dict: &PdfDictionary, objects: &ObjectTable) -> bool {
    dict.get("FontDescriptor")
        .and_then(|obj| objects.resolve(obj).ok())
        .and_then(PdfObject::as_dict)
        .and_then(|descriptor| descriptor.get_integer("Flags"))
        .is_some_and(|flags| flags & 4 != 0)
}

fn number(obj: &PdfObject, objects: &ObjectTable) -> Option<f64> {
    objects.resolve(obj).ok().and_then(PdfObject::as_real)
}

fn simple_widths(dict: &PdfDictionary, objects: &ObjectTable, standard: Option<Font>) -> Widths {
    let widths = dict
        .get("Widths")
        .and_then(|obj| objects.resolve(obj).ok())
        .and_then(PdfObject::as_array);
    let first_char = dict.get_integer("FirstChar").and_then(|n| u32::try_from(n).ok());

    match (widths, first_char) {
        (Some(widths), Some(first_char)) => {
            let missing = dict
                .get("FontDescriptor")
                .and_then(|obj| objects.resolve(obj).ok())
                .and_then(PdfObject::as_dict)
                .and_then(|descriptor| descriptor.get("MissingWidth"))
                .and_then(|obj| number(obj, objects))
                .unwrap_or(0.0);
            Widths::Explicit {
                first_char,
                widths: widths
                    .iter()
                    .map(|w| number(w, objects).unwrap_or(missing))
                    .collect(),
                missing,
            }
        }
        _ => match standard {
            Some(font) => Widths::Standard(font),
            None => Widths::Fixed(FALLBACK_WIDTH),
        },
    }
}

/// `/W` entries come as `c [w1 w2 ...]` or `c_first c_last w`.
fn cid_widths(dict: &PdfDictionary, objects: &ObjectTable) -> Widths {
    let descendant = dict
        .get("DescendantFonts")
        .and_then(|obj| objects.resolve(obj).ok())
        .and_then(PdfObject::as_array)
        .and_then(|fonts| fonts.get(0))
        .and_then(|obj| objects.resolve(obj).ok())
        .and_then(PdfObject::as_dict);

    let Some(descendant) = descendant else {
        return Widths::Fixed(1000.0);
    };

    let default = descendant
        .get("DW")
        .and_then(|obj| number(obj, objects))
        .unwrap_or(1000.0);
    let mut widths = HashMap::new();

    if let Some(w) = descendant
        .get("W")
        .and_then(|obj| objects.resolve(obj).ok())
        .and_then(PdfObject::as_array)
    {
        let items: Vec<&PdfObject> = w.iter().collect();
        let mut i = 0;
        while i < items.len() {
            let Some(first) = items[i].as_integer().and_then(|n| u32::try_from(n).ok()) else {
                break;
            };
            match items.get(i + 1).map(|obj| objects.resolve(obj)) {
                Some(Ok(PdfObject::Array(list))) => {
                    for (offset, width) in list.iter().enumerate() {
                        if let Some(width) = number(width, objects) {
                            widths.insert(first + offset as u32, width);
                        }
                    }
                    i += 2;
                }
                Some(Ok(last)) => {
                    let last = last.as_integer().and_then(|n| u32::try_from(n).ok());
                    let width = items.get(i + 2).and_then(|obj| number(obj, objects));
                    if let (Some(last), Some(width)) = (last, width) {
                        for cid in first..=last.min(first.saturating_add(0xFFFF)) {
                            widths.insert(cid, width);
                        }
                    }
                    i += 3;
                }
                _ => break,
            }
        }
    }

    Widths::Cid { default, widths }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{PdfName, PdfStream};

    fn font_dict(entries: &[(&str, PdfObject)]) -> PdfDictionary {
        entries
            .iter()
            .map(|(k, v)| (PdfName::new(*k), v.clone()))
            .collect()
    }

    fn text(decoder: &FontDecoder, bytes: &[u8]) -> String {
        decoder.decode(bytes).into_iter().map(|g| g.text).collect()
    }

    #[test]
    fn test_standard_type1_font() {
        let dict = font_dict(&[
            ("Type", PdfName::new("Font").into()),
            ("Subtype", PdfName::new("Type1").into()),
            ("BaseFont", PdfName::new("Helvetica").into()),
        ]);
        let decoder = FontDecoder::from_dict(&dict, &ObjectTable::new());
        assert_eq!(text(&decoder, b"Hello"), "Hello");
        let glyphs = decoder.decode(b"H ");
        assert_eq!(glyphs[0].width, 722.0);
        assert!(glyphs[1].is_space);
    }

    #[test]
    fn test_differences_override_base_encoding() {
        let differences: Vec<PdfObject> = vec![
            65.into(),
            PdfName::new("eacute").into(),
            PdfName::new("fi").into(),
            200.into(),
            PdfName::new("unknownglyph").into(),
        ];
        let mut encoding = PdfDictionary::new();
        encoding.set("BaseEncoding", PdfName::new("WinAnsiEncoding"));
        encoding.set("Differences", differences);
        let dict = font_dict(&[
            ("Subtype", PdfName::new("Type1").into()),
            ("Encoding", encoding.into()),
        ]);
        let decoder = FontDecoder::from_dict(&dict, &ObjectTable::new());
        assert_eq!(text(&decoder, b"ABC"), "é\u{FB01}C");
        assert_eq!(text(&decoder, &[200]), "\u{FFFD}");
    }

    #[test]
    fn test_explicit_widths() {
        let dict = font_dict(&[
            ("Subtype", PdfName::new("TrueType").into()),
            ("FirstChar", 65.into()),
            ("Widths", vec![PdfObject::Integer(600), PdfObject::Real(450.5)].into()),
        ]);
        let decoder = FontDecoder::from_dict(&dict, &ObjectTable::new());
        let widths: Vec<f64> = decoder.decode(b"ABZ").iter().map(|g| g.width).collect();
        assert_eq!(widths, vec![600.0, 450.5, 0.0]);
    }

    #[test]
    fn test_type0_with_to_unicode() {
        let mut objects = ObjectTable::new();
        let cmap = b"begincodespacerange <0000> <FFFF> endcodespacerange \
            2 beginbfchar <0001> <0048> <0002> <0069> endbfchar"
            .to_vec();
        let to_unicode = objects.add(PdfStream::from_content(cmap));

        let mut descendant = PdfDictionary::new();
        descendant.set("Subtype", PdfName::new("CIDFontType2"));
        descendant.set("DW", 1000);
        descendant.set(
            "W",
            vec![
                PdfObject::Integer(1),
                vec![PdfObject::Integer(700), PdfObject::Integer(300)].into(),
            ],
        );
        let descendant = objects.add(descendant);

        let dict = font_dict(&[
            ("Subtype", PdfName::new("Type0").into()),
            ("Encoding", PdfName::new("Identity-H").into()),
            ("DescendantFonts", vec![PdfObject::Reference(descendant)].into()),
            ("ToUnicode", to_unicode.into()),
        ]);
        let decoder = FontDecoder::from_dict(&dict, &objects);
        assert!(decoder.is_composite());

        let glyphs = decoder.decode(&[0x00, 0x01, 0x00, 0x02, 0x00, 0x09]);
        assert_eq!(glyphs.len(), 3);
        assert_eq!(glyphs[0].text, "H");
        assert_eq!(glyphs[1].text, "i");
        assert_eq!(glyphs[2].text, "\u{FFFD}");
        assert_eq!(glyphs[0].width, 700.0);
        assert_eq!(glyphs[2].width, 1000.0);
    }

    #[test]
    fn test_broken_to_unicode_is_ignored() {
        let mut objects = ObjectTable::new();
        let broken = objects.add(PdfStream::from_content(b"1 beginbfchar <41> 12 endbfchar".to_vec()));
        let dict = font_dict(&[
            ("Subtype", PdfName::new("Type1").into()),
            ("BaseFont", PdfName::new("Courier").into()),
            ("ToUnicode", broken.into()),
        ]);
        let decoder = FontDecoder::from_dict(&dict, &objects);
        assert_eq!(text(&decoder, b"ok"), "ok");
    }

    #[test]
    fn test_fallback_decoder() {
        let decoder = FontDecoder::fallback();
        assert_eq!(text(&decoder, &[b'a', 0x80, 0x01]), "a\u{20AC}\u{FFFD}");
    }
}
