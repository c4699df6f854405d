/// The standard 14 Type 1 fonts.
///
/// Every conforming reader has these available, so they never need to be
/// embedded. Text extraction uses them for advance widths when a font
/// dictionary omits `/Widths`; the watermark producer draws with them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Font {
    /// Helvetica (sans-serif)
    Helvetica,
    HelveticaBold,
    HelveticaOblique,
    HelveticaBoldOblique,
    /// Times Roman (serif)
    TimesRoman,
    TimesBold,
    TimesItalic,
    TimesBoldItalic,
    /// Courier (monospace)
    Courier,
    CourierBold,
    CourierOblique,
    CourierBoldOblique,
    Symbol,
    ZapfDingbats,
}

impl Font {
    pub const ALL: [Font; 14] = [
        Font::Helvetica,
        Font::HelveticaBold,
        Font::HelveticaOblique,
        Font::HelveticaBoldOblique,
        Font::TimesRoman,
        Font::TimesBold,
        Font::TimesItalic,
        Font::TimesBoldItalic,
        Font::Courier,
        Font::CourierBold,
        Font::CourierOblique,
        Font::CourierBoldOblique,
        Font::Symbol,
        Font::ZapfDingbats,
    ];

    /// Get the PDF name for this font
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Font::Helvetica => "Helvetica",
            Font::HelveticaBold => "Helvetica-Bold",
            Font::HelveticaOblique => "Helvetica-Oblique",
            Font::HelveticaBoldOblique => "Helvetica-BoldOblique",
            Font::TimesRoman => "Times-Roman",
            Font::TimesBold => "Times-Bold",
            Font::TimesItalic => "Times-Italic",
            Font::TimesBoldItalic => "Times-BoldItalic",
            Font::Courier => "Courier",
            Font::CourierBold => "Courier-Bold",
            Font::CourierOblique => "Courier-Oblique",
            Font::CourierBoldOblique => "Courier-BoldOblique",
            Font::Symbol => "Symbol",
            Font::ZapfDingbats => "ZapfDingbats",
        }
    }

    /// Recognize a `/BaseFont` name, ignoring a subset tag (`ABCDEF+`) and
    /// accepting the common Arial / Times New Roman / Courier New aliases.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = match name.split_once('+') {
            Some((tag, rest)) if tag.len() == 6 && tag.bytes().all(|b| b.is_ascii_uppercase()) => rest,
            _ => name,
        };

        if let Some(font) = Font::ALL.iter().find(|font| font.pdf_name() == name) {
            return Some(*font);
        }

        let font = match name.replace(' ', "").as_str() {
            "Arial" | "ArialMT" => Font::Helvetica,
            "Arial,Bold" | "Arial-BoldMT" => Font::HelveticaBold,
            "Arial,Italic" | "Arial-ItalicMT" => Font::HelveticaOblique,
            "Arial,BoldItalic" | "Arial-BoldItalicMT" => Font::HelveticaBoldOblique,
            "TimesNewRoman" | "TimesNewRomanPSMT" | "Times" => Font::TimesRoman,
            "TimesNewRoman,Bold" | "TimesNewRomanPS-BoldMT" => Font::TimesBold,
            "TimesNewRoman,Italic" | "TimesNewRomanPS-ItalicMT" => Font::TimesItalic,
            "TimesNewRoman,BoldItalic" | "TimesNewRomanPS-BoldItalicMT" => Font::TimesBoldItalic,
            "CourierNew" | "CourierNewPSMT" => Font::Courier,
            "CourierNew,Bold" | "CourierNewPS-BoldMT" => Font::CourierBold,
            _ => return None,
        };
        Some(font)
    }

    /// Check if this font is symbolic (doesn't use text encodings)
    pub fn is_symbolic(&self) -> bool {
        matches!(self, Font::Symbol | Font::ZapfDingbats)
    }
}

impl std::fmt::Display for Font {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.pdf_name())
    }
}
