//! Watermarks
//!
//! A [`PageContentProducer`] turns [`StampInstructions`] into a standalone
//! one-page document; [`watermark`] produces that page once and overlays it
//! onto every page of the target.

use super::overlay::overlay;
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{PdfArray, PdfDictionary, PdfName, PdfObject, PdfStream};
use crate::text::{measure_text, Font, TextEncoding};
use crate::writer::format_real;
use std::fmt::Write as _;

/// Drawing instructions for a text stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StampInstructions {
    pub text: String,
    /// A standard 14 font name such as `Helvetica` or `Courier-Bold`.
    pub font_name: String,
    pub font_size: f64,
    /// Counter-clockwise, about the anchor.
    pub rotation_degrees: f64,
    /// 0.0 is black, 1.0 is white.
    pub fill_gray: f64,
    pub fill_alpha: f64,
    pub anchor: (f64, f64),
    pub page_size: (f64, f64),
}

impl Default for StampInstructions {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_name: Font::Helvetica.pdf_name().to_string(),
            font_size: 40.0,
            rotation_degrees: 45.0,
            fill_gray: 0.5,
            fill_alpha: 0.5,
            anchor: (300.0, 500.0),
            page_size: (612.0, 792.0),
        }
    }
}

impl StampInstructions {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_font(mut self, font_name: impl Into<String>) -> Self {
        self.font_name = font_name.into();
        self
    }

    pub fn with_font_size(mut self, font_size: f64) -> Self {
        self.font_size = font_size;
        self
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation_degrees = degrees;
        self
    }

    pub fn with_fill_gray(mut self, gray: f64) -> Self {
        self.fill_gray = gray;
        self
    }

    pub fn with_fill_alpha(mut self, alpha: f64) -> Self {
        self.fill_alpha = alpha;
        self
    }

    pub fn with_anchor(mut self, x: f64, y: f64) -> Self {
        self.anchor = (x, y);
        self
    }

    pub fn with_page_size(mut self, width: f64, height: f64) -> Self {
        self.page_size = (width, height);
        self
    }

    fn validate(&self) -> Result<Font> {
        let font = Font::from_name(&self.font_name).ok_or_else(|| {
            PdfError::InvalidArgument(format!("unknown standard font {}", self.font_name))
        })?;
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(PdfError::InvalidArgument(format!(
                "font size must be positive, got {}",
                self.font_size
            )));
        }
        for (what, value) in [("gray level", self.fill_gray), ("opacity", self.fill_alpha)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PdfError::InvalidArgument(format!(
                    "{what} must be between 0 and 1, got {value}"
                )));
            }
        }
        let (width, height) = self.page_size;
        if !(width > 0.0 && height > 0.0) {
            return Err(PdfError::InvalidArgument(format!(
                "page size must be positive, got {width}x{height}"
            )));
        }
        Ok(font)
    }
}

/// Renders drawing instructions into a standalone single-page document.
pub trait PageContentProducer {
    fn produce(&self, instructions: &StampInstructions) -> Result<Document>;
}

/// Draws the instruction text with a standard 14 font.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStampProducer;

impl TextStampProducer {
    pub fn new() -> Self {
        Self
    }

    fn content(instructions: &StampInstructions, font: Font) -> Vec<u8> {
        let size = instructions.font_size;
        let (x, y) = instructions.anchor;
        let angle = instructions.rotation_degrees.to_radians();
        let (sin, cos) = angle.sin_cos();
        let half_width = measure_text(&instructions.text, font, size) / 2.0;

        let mut ops = String::new();
        let _ = writeln!(ops, "q");
        let _ = writeln!(ops, "/GS1 gs");
        let _ = writeln!(ops, "{} g", format_real(instructions.fill_gray));
        let _ = writeln!(
            ops,
            "{} {} {} {} {} {} cm",
            format_real(cos),
            format_real(sin),
            format_real(-sin),
            format_real(cos),
            format_real(x),
            format_real(y)
        );
        let _ = writeln!(ops, "BT");
        let _ = writeln!(ops, "/F1 {} Tf", format_real(size));
        let _ = writeln!(ops, "{} 0 Td", format_real(-half_width));

        let mut content = ops.into_bytes();
        content.push(b'(');
        for byte in TextEncoding::WinAnsiEncoding.encode(&instructions.text) {
            match byte {
                b'(' | b')' | b'\\' => content.extend_from_slice(&[b'\\', byte]),
                b'\r' => content.extend_from_slice(b"\\r"),
                b'\n' => content.extend_from_slice(b"\\n"),
                _ => content.push(byte),
            }
        }
        content.extend_from_slice(b") Tj\nET\nQ");
        content
    }
}

impl PageContentProducer for TextStampProducer {
    fn produce(&self, instructions: &StampInstructions) -> Result<Document> {
        let font = instructions.validate()?;
        let mut document = Document::new();

        let mut font_dict = PdfDictionary::new();
        font_dict.set("Type", PdfName::new("Font"));
        font_dict.set("Subtype", PdfName::new("Type1"));
        font_dict.set("BaseFont", PdfName::new(font.pdf_name()));
        if !matches!(font, Font::Symbol | Font::ZapfDingbats) {
            font_dict.set("Encoding", PdfName::new("WinAnsiEncoding"));
        }
        let font_id = document.add_object(font_dict);

        let mut state = PdfDictionary::new();
        state.set("Type", PdfName::new("ExtGState"));
        state.set("ca", instructions.fill_alpha);
        state.set("CA", instructions.fill_alpha);
        let state_id = document.add_object(state);

        let mut fonts = PdfDictionary::new();
        fonts.set("F1", font_id);
        let mut states = PdfDictionary::new();
        states.set("GS1", state_id);
        let mut resources = PdfDictionary::new();
        resources.set("Font", fonts);
        resources.set("ExtGState", states);
        resources.set(
            "ProcSet",
            PdfArray(vec![PdfName::new("PDF").into(), PdfName::new("Text").into()]),
        );

        let content = document.add_object(PdfStream::from_content(Self::content(instructions, font)));
        let (width, height) = instructions.page_size;
        let media_box: PdfArray = [0.0, 0.0, width, height]
            .into_iter()
            .map(PdfObject::Real)
            .collect();

        let mut page = PdfDictionary::new();
        page.set("MediaBox", media_box);
        page.set("Resources", resources);
        page.set("Contents", content);
        document.push_page(page)?;
        Ok(document)
    }
}

/// Produce a stamp page once and overlay it onto every page of `document`.
pub fn watermark(
    document: &mut Document,
    producer: &dyn PageContentProducer,
    instructions: &StampInstructions,
) -> Result<()> {
    let stamp = producer.produce(instructions)?;
    apply_stamp(document, &stamp)
}

/// Overlay the single page of `stamp` onto every page of `document`.
pub fn apply_stamp(document: &mut Document, stamp: &Document) -> Result<()> {
    let pages = stamp.page_count()?;
    if pages != 1 {
        return Err(PdfError::InvalidArgument(format!(
            "a stamp document has exactly one page, this one has {pages}"
        )));
    }
    overlay(document, stamp, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::parser::test_helpers::{build_pdf, PdfSource};

    #[test]
    fn test_defaults() {
        let instructions = StampInstructions::new("DRAFT");
        assert_eq!(instructions.font_name, "Helvetica");
        assert_eq!(instructions.font_size, 40.0);
        assert_eq!(instructions.rotation_degrees, 45.0);
        assert_eq!(instructions.anchor, (300.0, 500.0));
        assert_eq!(instructions.page_size, (612.0, 792.0));
    }

    #[test]
    fn test_producer_builds_one_page() {
        let stamp = TextStampProducer
            .produce(&StampInstructions::new("CONFIDENTIAL").with_rotation(0.0))
            .unwrap();
        assert_eq!(stamp.page_count().unwrap(), 1);

        let page = stamp.page(0).unwrap();
        let resources = page.resources().unwrap();
        assert!(resources.get_dict("Font").unwrap().contains_key("F1"));
        let state = resources.get_dict("ExtGState").unwrap().get("GS1").unwrap();
        let state = stamp.objects().resolve(state).unwrap().as_dict().unwrap();
        assert_eq!(state.get("ca").unwrap().as_real(), Some(0.5));
        assert_eq!(stamp.extract_text(0).unwrap(), "CONFIDENTIAL");
    }

    #[test]
    fn test_text_is_centred_on_anchor() {
        let instructions = StampInstructions::new("AB").with_rotation(0.0);
        let content = TextStampProducer::content(&instructions, Font::Courier);
        let content = String::from_utf8(content).unwrap();
        // Courier advances are 600 units, so two glyphs at 40pt are 48pt wide.
        assert!(content.contains("-24 0 Td"), "{content}");
        assert!(content.contains("1 0 0 1 300 500 cm"), "{content}");
    }

    #[test]
    fn test_special_characters_escaped() {
        let instructions = StampInstructions::new("a(b)\\");
        let content = TextStampProducer::content(&instructions, Font::Helvetica);
        assert!(
            content.ends_with(b"(a\\(b\\)\\\\) Tj\nET\nQ"),
            "{}",
            String::from_utf8_lossy(&content)
        );
    }

    #[test]
    fn test_invalid_instructions() {
        let producer = TextStampProducer::new();
        for instructions in [
            StampInstructions::new("x").with_font("Comic Sans"),
            StampInstructions::new("x").with_font_size(0.0),
            StampInstructions::new("x").with_fill_alpha(1.5),
            StampInstructions::new("x").with_fill_gray(-0.1),
        ] {
            let err = producer.produce(&instructions).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_watermark_every_page() {
        let mut doc = Document::parse(build_pdf(&PdfSource::pages(&[
            b"BT 72 720 Td (one) Tj ET",
            b"BT 72 720 Td (two) Tj ET",
        ])))
        .unwrap();
        let instructions = StampInstructions::new("DRAFT").with_rotation(0.0);
        watermark(&mut doc, &TextStampProducer, &instructions).unwrap();

        assert_eq!(doc.extract_text(0).unwrap(), "one\nDRAFT");
        assert_eq!(doc.extract_text(1).unwrap(), "two\nDRAFT");
    }

    #[test]
    fn test_apply_stamp_requires_single_page() {
        let mut doc = Document::parse(build_pdf(&PdfSource::single_page(b""))).unwrap();
        let stamp = Document::parse(build_pdf(&PdfSource::pages(&[b"", b""]))).unwrap();
        let err = apply_stamp(&mut doc, &stamp).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
