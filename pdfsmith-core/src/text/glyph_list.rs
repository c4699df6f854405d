//! Glyph name to Unicode mapping
//!
//! Covers the names used by the Latin text encodings (the names that show up
//! in `/Differences` arrays in practice) and the `uniXXXX` / `uXXXX[XX]`
//! conventions from the Adobe Glyph List specification.

use std::collections::HashMap;

// Names of codes 0x20..=0x7E in ASCII order.
const ASCII_NAMES: [&str; 95] = [
    "space", "exclam", "quotedbl", "numbersign", "dollar", "percent", "ampersand", "quotesingle",
    "parenleft", "parenright", "asterisk", "plus", "comma", "hyphen", "period", "slash", "zero",
    "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "colon", "semicolon",
    "less", "equal", "greater", "question", "at", "A", "B", "C", "D", "E", "F", "G", "H", "I", "J",
    "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z", "bracketleft",
    "backslash", "bracketright", "asciicircum", "underscore", "grave", "a", "b", "c", "d", "e",
    "f", "g", "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w", "x",
    "y", "z", "braceleft", "bar", "braceright", "asciitilde",
];

// Names of U+00A0..=U+00FF in order.
const LATIN1_NAMES: [&str; 96] = [
    "nbspace", "exclamdown", "cent", "sterling", "currency", "yen", "brokenbar", "section",
    "dieresis", "copyright", "ordfeminine", "guillemotleft", "logicalnot", "sfthyphen",
    "registered", "macron", "degree", "plusminus", "twosuperior", "threesuperior", "acute", "mu",
    "paragraph", "periodcentered", "cedilla", "onesuperior", "ordmasculine", "guillemotright",
    "onequarter", "onehalf", "threequarters", "questiondown", "Agrave", "Aacute", "Acircumflex",
    "Atilde", "Adieresis", "Aring", "AE", "Ccedilla", "Egrave", "Eacute", "Ecircumflex",
    "Edieresis", "Igrave", "Iacute", "Icircumflex", "Idieresis", "Eth", "Ntilde", "Ograve",
    "Oacute", "Ocircumflex", "Otilde", "Odieresis", "multiply", "Oslash", "Ugrave", "Uacute",
    "Ucircumflex", "Udieresis", "Yacute", "Thorn", "germandbls", "agrave", "aacute",
    "acircumflex", "atilde", "adieresis", "aring", "ae", "ccedilla", "egrave", "eacute",
    "ecircumflex", "edieresis", "igrave", "iacute", "icircumflex", "idieresis", "eth", "ntilde",
    "ograve", "oacute", "ocircumflex", "otilde", "odieresis", "divide", "oslash", "ugrave",
    "uacute", "ucircumflex", "udieresis", "yacute", "thorn", "ydieresis",
];

const OTHER_NAMES: &[(&str, char)] = &[
    ("quoteleft", '\u{2018}'),
    ("quoteright", '\u{2019}'),
    ("quotesinglbase", '\u{201A}'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("quotedblbase", '\u{201E}'),
    ("guilsinglleft", '\u{2039}'),
    ("guilsinglright", '\u{203A}'),
    ("endash", '\u{2013}'),
    ("emdash", '\u{2014}'),
    ("dagger", '\u{2020}'),
    ("daggerdbl", '\u{2021}'),
    ("bullet", '\u{2022}'),
    ("ellipsis", '\u{2026}'),
    ("perthousand", '\u{2030}'),
    ("fraction", '\u{2044}'),
    ("Euro", '\u{20AC}'),
    ("trademark", '\u{2122}'),
    ("minus", '\u{2212}'),
    ("florin", '\u{0192}'),
    ("circumflex", '\u{02C6}'),
    ("caron", '\u{02C7}'),
    ("breve", '\u{02D8}'),
    ("dotaccent", '\u{02D9}'),
    ("ring", '\u{02DA}'),
    ("ogonek", '\u{02DB}'),
    ("tilde", '\u{02DC}'),
    ("hungarumlaut", '\u{02DD}'),
    ("dotlessi", '\u{0131}'),
    ("Lslash", '\u{0141}'),
    ("lslash", '\u{0142}'),
    ("OE", '\u{0152}'),
    ("oe", '\u{0153}'),
    ("Scaron", '\u{0160}'),
    ("scaron", '\u{0161}'),
    ("Ydieresis", '\u{0178}'),
    ("Zcaron", '\u{017D}'),
    ("zcaron", '\u{017E}'),
    ("fi", '\u{FB01}'),
    ("fl", '\u{FB02}'),
    ("ff", '\u{FB00}'),
    ("ffi", '\u{FB03}'),
    ("ffl", '\u{FB04}'),
    ("notequal", '\u{2260}'),
    ("infinity", '\u{221E}'),
    ("lessequal", '\u{2264}'),
    ("greaterequal", '\u{2265}'),
    ("partialdiff", '\u{2202}'),
    ("summation", '\u{2211}'),
    ("product", '\u{220F}'),
    ("pi", '\u{03C0}'),
    ("integral", '\u{222B}'),
    ("Omega", '\u{03A9}'),
    ("radical", '\u{221A}'),
    ("approxequal", '\u{2248}'),
    ("Delta", '\u{2206}'),
    ("lozenge", '\u{25CA}'),
    ("nonbreakingspace", '\u{00A0}'),
    ("softhyphen", '\u{00AD}'),
];

lazy_static::lazy_static! {
    static ref GLYPH_TO_UNICODE: HashMap<&'static str, char> = {
        let mut map = HashMap::with_capacity(ASCII_NAMES.len() + LATIN1_NAMES.len() + OTHER_NAMES.len());
        for (i, name) in ASCII_NAMES.iter().enumerate() {
            map.insert(*name, (0x20 + i as u8) as char);
        }
        for (i, name) in LATIN1_NAMES.iter().enumerate() {
            map.insert(*name, (0xA0 + i as u8) as char);
        }
        for &(name, ch) in OTHER_NAMES {
            map.insert(name, ch);
        }
        map
    };
}

/// Unicode text for a glyph name, if it can be determined.
pub fn glyph_to_unicode(name: &str) -> Option<String> {
    if let Some(&ch) = GLYPH_TO_UNICODE.get(name) {
        return Some(ch.to_string());
    }

    // "a.sc", "one.oldstyle": the base name carries the meaning.
    if let Some((base, _)) = name.split_once('.') {
        if !base.is_empty() {
            return glyph_to_unicode(base);
        }
    }

    // "f_f_i": a ligature of its components.
    if name.contains('_') {
        return name
            .split('_')
            .map(glyph_to_unicode)
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat());
    }

    if let Some(hex) = name.strip_prefix("uni") {
        return parse_uni(hex);
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            return u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from);
        }
    }

    None
}

/// `uni` followed by one or more groups of four uppercase hex digits.
fn parse_uni(hex: &str) -> Option<String> {
    if hex.is_empty() || hex.len() % 4 != 0 || !hex.is_ascii() {
        return None;
    }
    let units: Vec<u16> = (0..hex.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).ok())
        .collect::<Option<_>>()?;
    String::from_utf16(&units).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lookups() {
        assert_eq!(glyph_to_unicode("A").as_deref(), Some("A"));
        assert_eq!(glyph_to_unicode("space").as_deref(), Some(" "));
        assert_eq!(glyph_to_unicode("eacute").as_deref(), Some("é"));
        assert_eq!(glyph_to_unicode("quotedblleft").as_deref(), Some("\u{201C}"));
        assert_eq!(glyph_to_unicode("asciitilde").as_deref(), Some("~"));
        assert_eq!(glyph_to_unicode("ydieresis").as_deref(), Some("ÿ"));
    }

    #[test]
    fn test_uni_and_u_forms() {
        assert_eq!(glyph_to_unicode("uni0041").as_deref(), Some("A"));
        assert_eq!(glyph_to_unicode("uni00660069").as_deref(), Some("fi"));
        assert_eq!(glyph_to_unicode("u1F600").as_deref(), Some("\u{1F600}"));
        assert_eq!(glyph_to_unicode("uniZZZZ"), None);
    }

    #[test]
    fn test_suffixes_and_ligatures() {
        assert_eq!(glyph_to_unicode("a.sc").as_deref(), Some("a"));
        assert_eq!(glyph_to_unicode("f_f_i").as_deref(), Some("ffi"));
        assert_eq!(glyph_to_unicode("g123"), None);
    }
}
