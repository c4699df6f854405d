use crate::text::Font;
use std::collections::HashMap;

/// Character width information for standard PDF fonts
/// All widths are in 1/1000 of a unit (font size 1.0)
#[derive(Debug, Clone)]
pub struct FontMetrics {
    /// Widths of the printable ASCII range 0x20..=0x7E.
    ascii: [u16; 95],
    default_width: u16,
}

impl FontMetrics {
    fn new(ascii: [u16; 95], default_width: u16) -> Self {
        Self {
            ascii,
            default_width,
        }
    }

    fn monospaced(width: u16) -> Self {
        Self::new([width; 95], width)
    }

    pub fn char_width(&self, ch: char) -> u16 {
        match ch as u32 {
            code @ 0x20..=0x7E => self.ascii[(code - 0x20) as usize],
            _ => self.default_width,
        }
    }
}

#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[rustfmt::skip]
const TIMES_ROMAN: [u16; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

lazy_static::lazy_static! {
    static ref FONT_METRICS: HashMap<Font, FontMetrics> = {
        let mut metrics = HashMap::new();

        let helvetica = FontMetrics::new(HELVETICA, 556);
        let helvetica_bold = FontMetrics::new(HELVETICA_BOLD, 611);
        let times = FontMetrics::new(TIMES_ROMAN, 500);
        let courier = FontMetrics::monospaced(600);

        // Obliques share the upright widths; Times variants reuse Roman.
        metrics.insert(Font::HelveticaOblique, helvetica.clone());
        metrics.insert(Font::Helvetica, helvetica);
        metrics.insert(Font::HelveticaBoldOblique, helvetica_bold.clone());
        metrics.insert(Font::HelveticaBold, helvetica_bold);
        for font in [Font::TimesBold, Font::TimesItalic, Font::TimesBoldItalic] {
            metrics.insert(font, times.clone());
        }
        metrics.insert(Font::TimesRoman, times);
        for font in [Font::CourierBold, Font::CourierOblique, Font::CourierBoldOblique] {
            metrics.insert(font, courier.clone());
        }
        metrics.insert(Font::Courier, courier);

        metrics
    };
}

/// Width of one character in thousandths of the font size.
pub fn glyph_width(ch: char, font: Font) -> u16 {
    match FONT_METRICS.get(&font) {
        Some(metrics) => metrics.char_width(ch),
        // Symbol and ZapfDingbats
        None => 600,
    }
}

/// Measure the width of a text string in a given font and size
pub fn measure_text(text: &str, font: Font, font_size: f64) -> f64 {
    let width_units: u32 = text.chars().map(|ch| glyph_width(ch, font) as u32).sum();
    (width_units as f64 / 1000.0) * font_size
}

/// Measure the width of a single character
pub fn measure_char(ch: char, font: Font, font_size: f64) -> f64 {
    (glyph_width(ch, font) as f64 / 1000.0) * font_size
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helvetica_widths() {
        assert_eq!(glyph_width(' ', Font::Helvetica), 278);
        assert_eq!(glyph_width('@', Font::Helvetica), 1015);
        assert_eq!(glyph_width('~', Font::Helvetica), 584);
        assert_eq!(glyph_width('é', Font::Helvetica), 556);
    }

    #[test]
    fn test_variants_share_tables() {
        assert_eq!(
            glyph_width('W', Font::HelveticaBoldOblique),
            glyph_width('W', Font::HelveticaBold)
        );
        assert_eq!(glyph_width('a', Font::TimesItalic), 444);
    }

    #[test]
    fn test_courier_is_monospaced() {
        assert!((measure_text("iiii", Font::Courier, 10.0) - 24.0).abs() < 1e-9);
        assert!((measure_text("WWWW", Font::CourierBold, 10.0) - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_measure_text() {
        // H(722) + i(222) = 944
        let width = measure_text("Hi", Font::Helvetica, 12.0);
        assert!((width - 11.328).abs() < 1e-9);
        assert!((measure_char('H', Font::Helvetica, 1000.0) - 722.0).abs() < 1e-9);
    }

    #[test]
    fn test_symbolic_fonts_use_fallback() {
        assert_eq!(glyph_width('a', Font::Symbol), 600);
    }
}
