//! Text extraction from PDF content streams
//!
//! Interprets the text-showing and text-positioning operators of a content
//! stream (plus `q`/`Q`/`cm` and form XObjects, which move text around) and
//! ignores everything else. Glyph positions are tracked in user space so
//! that line breaks and word gaps can be inferred from geometry.

use super::font_decoder::FontDecoder;
use crate::page::Page;
use crate::error::Result;
use crate::objects::{ObjectTable, PdfDictionary, PdfObject};
use crate::parser::content::{ContentOperation, ContentParser, TextElement};
use std::collections::HashMap;
use unicode_normalization::UnicodeNormalization;

/// Form XObjects nested deeper than this are not entered.
const MAX_FORM_DEPTH: usize = 8;

const IDENTITY: [f64; 6] = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];

/// Text extraction options
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOptions {
    /// Baseline movement, as a fraction of the font size, that starts a new line
    pub newline_threshold: f64,
    /// Horizontal gap, as a fraction of the font size, that becomes a space
    pub space_threshold: f64,
    /// Apply NFKC normalization to the result
    pub normalize_unicode: bool,
}

impl Default for ExtractionOptions {
    fn default() -> Self {
        Self {
            newline_threshold: 0.5,
            space_threshold: 0.2,
            normalize_unicode: false,
        }
    }
}

impl ExtractionOptions {
    pub fn with_newline_threshold(mut self, threshold: f64) -> Self {
        self.newline_threshold = threshold;
        self
    }

    pub fn with_space_threshold(mut self, threshold: f64) -> Self {
        self.space_threshold = threshold;
        self
    }

    pub fn with_normalize_unicode(mut self, normalize: bool) -> Self {
        self.normalize_unicode = normalize;
        self
    }
}

/// Graphics and text state saved by `q` and restored by `Q`.
#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: [f64; 6],
    char_space: f64,
    word_space: f64,
    horizontal_scale: f64,
    leading: f64,
    text_rise: f64,
    font_size: f64,
    font_name: Option<String>,
}

impl GraphicsState {
    fn new(ctm: [f64; 6]) -> Self {
        Self {
            ctm,
            char_space: 0.0,
            word_space: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            text_rise: 0.0,
            font_size: 0.0,
            font_name: None,
        }
    }
}

/// Accumulates output and remembers where the previous glyph ended.
#[derive(Debug, Default)]
struct TextSink {
    text: String,
    /// (x at end of the last glyph, baseline y), in user space
    last: Option<(f64, f64)>,
}

impl TextSink {
    fn separate(&mut self, x: f64, y: f64, size: f64, options: &ExtractionOptions) {
        let Some((last_x, last_y)) = self.last else {
            return;
        };
        let size = if size > 0.0 { size } else { 1.0 };
        let drop = last_y - y;
        if drop > options.newline_threshold * size {
            if !self.text.is_empty() && !self.text.ends_with('\n') {
                self.text.push('\n');
            }
        } else if (-drop > options.newline_threshold * size
            || x - last_x > options.space_threshold * size)
            && !self.text.ends_with(char::is_whitespace)
        {
            // A jump back up the page separates words but starts no line.
            self.text.push(' ');
        }
    }
}

/// Text extractor for PDF pages
#[derive(Debug, Clone, Default)]
pub struct TextExtractor {
    options: ExtractionOptions,
}

impl TextExtractor {
    /// Create a new text extractor with default options
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a text extractor with custom options
    pub fn with_options(options: ExtractionOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ExtractionOptions {
        &self.options
    }

    /// Extract the text of a page.
    ///
    /// Fails only if the page's content cannot be decoded at all (for
    /// example an unsupported filter); glyphs without a Unicode mapping
    /// come out as U+FFFD.
    pub fn extract_page(&self, page: &Page<'_>) -> Result<String> {
        let content = page.contents()?;
        Ok(self.extract_content(&content, page.resources(), page.objects()))
    }

    /// Extract text from raw (decoded) content with the given resources.
    pub fn extract_content(
        &self,
        content: &[u8],
        resources: Option<&PdfDictionary>,
        objects: &ObjectTable,
    ) -> String {
        let mut sink = TextSink::default();
        self.run(content, resources, objects, IDENTITY, 0, &mut sink);

        let text = sink.text.trim_end_matches('\n').to_string();
        if self.options.normalize_unicode {
            text.nfkc().collect()
        } else {
            text
        }
    }

    fn run(
        &self,
        content: &[u8],
        resources: Option<&PdfDictionary>,
        objects: &ObjectTable,
        base_ctm: [f64; 6],
        depth: usize,
        sink: &mut TextSink,
    ) {
        let (raw, error) = ContentParser::parse_partial(content);
        if let Some(err) = error {
            tracing::warn!(
                "Content stream syntax error ({}); extracting the {} operations before it",
                err,
                raw.len()
            );
        }

        let fonts = resources
            .and_then(|r| r.get("Font"))
            .and_then(|obj| objects.resolve(obj).ok())
            .and_then(PdfObject::as_dict);
        let mut decoders: HashMap<String, FontDecoder> = HashMap::new();

        let mut state = GraphicsState::new(base_ctm);
        let mut stack: Vec<GraphicsState> = Vec::new();
        let mut tm = IDENTITY;
        let mut tlm = IDENTITY;

        for op in raw.iter().map(ContentOperation::from_raw) {
            match op {
                ContentOperation::SaveGraphicsState => stack.push(state.clone()),
                ContentOperation::RestoreGraphicsState => {
                    if let Some(saved) = stack.pop() {
                        state = saved;
                    }
                }
                ContentOperation::SetTransformMatrix(m) => state.ctm = multiply(&m, &state.ctm),

                ContentOperation::BeginText => {
                    tm = IDENTITY;
                    tlm = IDENTITY;
                }
                ContentOperation::EndText => {}

                ContentOperation::SetCharSpacing(v) => state.char_space = v,
                ContentOperation::SetWordSpacing(v) => state.word_space = v,
                ContentOperation::SetHorizontalScaling(v) => state.horizontal_scale = v / 100.0,
                ContentOperation::SetLeading(v) => state.leading = v,
                ContentOperation::SetTextRise(v) => state.text_rise = v,
                ContentOperation::SetFont(name, size) => {
                    state.font_size = size;
                    if !decoders.contains_key(&name) {
                        let decoder = fonts
                            .and_then(|fonts| fonts.get(&name))
                            .and_then(|obj| objects.resolve(obj).ok())
                            .and_then(PdfObject::as_dict)
                            .map(|dict| FontDecoder::from_dict(dict, objects))
                            .unwrap_or_else(|| {
                                tracing::warn!("Font /{} not found in resources", name);
                                FontDecoder::fallback()
                            });
                        decoders.insert(name.clone(), decoder);
                    }
                    state.font_name = Some(name);
                }

                ContentOperation::MoveText(tx, ty) => {
                    tlm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &tlm);
                    tm = tlm;
                }
                ContentOperation::MoveTextSetLeading(tx, ty) => {
                    state.leading = -ty;
                    tlm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, ty], &tlm);
                    tm = tlm;
                }
                ContentOperation::SetTextMatrix(m) => {
                    tlm = m;
                    tm = m;
                }
                ContentOperation::NextLine => {
                    tlm = multiply(&[1.0, 0.0, 0.0, 1.0, 0.0, -state.leading], &tlm);
                    tm = tlm;
                }

                ContentOperation::ShowText(bytes) => {
                    let decoder = decoder_for(&decoders, &state);
                    self.show(&bytes, decoder, &state, &mut tm, sink);
                }
                ContentOperation::NextLineShowText(bytes) => {
                    tlm = multiply(&[1.0, 0.0, 0.0, 1.0, 0.0, -state.leading], &tlm);
                    tm = tlm;
                    let decoder = decoder_for(&decoders, &state);
                    self.show(&bytes, decoder, &state, &mut tm, sink);
                }
                ContentOperation::SetSpacingNextLineShowText(aw, ac, bytes) => {
                    state.word_space = aw;
                    state.char_space = ac;
                    tlm = multiply(&[1.0, 0.0, 0.0, 1.0, 0.0, -state.leading], &tlm);
                    tm = tlm;
                    let decoder = decoder_for(&decoders, &state);
                    self.show(&bytes, decoder, &state, &mut tm, sink);
                }
                ContentOperation::ShowTextArray(elements) => {
                    let decoder = decoder_for(&decoders, &state);
                    for element in elements {
                        match element {
                            TextElement::Text(bytes) => {
                                self.show(&bytes, decoder, &state, &mut tm, sink)
                            }
                            TextElement::Spacing(adjustment) => {
                                let tx = -adjustment / 1000.0
                                    * state.font_size
                                    * state.horizontal_scale;
                                tm = multiply(&[1.0, 0.0, 0.0, 1.0, tx, 0.0], &tm);
                            }
                        }
                    }
                }

                ContentOperation::PaintXObject(name) => {
                    self.paint_form(&name, resources, objects, &state, depth, sink);
                }

                _ => {}
            }
        }
    }

    /// Emit the glyphs of one string and advance the text matrix past them.
    fn show(
        &self,
        bytes: &[u8],
        decoder: &FontDecoder,
        state: &GraphicsState,
        tm: &mut [f64; 6],
        sink: &mut TextSink,
    ) {
        let trm = multiply(tm, &state.ctm);
        let (x, y) = transform_point(0.0, state.text_rise, &trm);
        let size = state.font_size * trm[2].hypot(trm[3]);
        sink.separate(x, y, size, &self.options);

        let mut unmapped = 0usize;
        for glyph in decoder.decode(bytes) {
            if glyph.text.contains(char::REPLACEMENT_CHARACTER) {
                unmapped += 1;
            }
            sink.text.push_str(&glyph.text);

            let mut advance = glyph.width / 1000.0 * state.font_size + state.char_space;
            if glyph.is_space {
                advance += state.word_space;
            }
            *tm = multiply(&[1.0, 0.0, 0.0, 1.0, advance * state.horizontal_scale, 0.0], tm);
        }
        if unmapped > 0 {
            tracing::warn!("{} character codes without a Unicode mapping", unmapped);
        }

        let end = multiply(tm, &state.ctm);
        let (end_x, _) = transform_point(0.0, state.text_rise, &end);
        sink.last = Some((end_x, y));
    }

    fn paint_form(
        &self,
        name: &str,
        resources: Option<&PdfDictionary>,
        objects: &ObjectTable,
        state: &GraphicsState,
        depth: usize,
        sink: &mut TextSink,
    ) {
        if depth >= MAX_FORM_DEPTH {
            tracing::warn!("Form XObject /{} nested too deeply, skipped", name);
            return;
        }
        let Some(stream) = resources
            .and_then(|r| r.get("XObject"))
            .and_then(|obj| objects.resolve(obj).ok())
            .and_then(PdfObject::as_dict)
            .and_then(|xobjects| xobjects.get(name))
            .and_then(|obj| objects.resolve(obj).ok())
            .and_then(PdfObject::as_stream)
        else {
            return;
        };
        if stream.dict.get_name("Subtype") != Some("Form") {
            return;
        }

        let content = match objects.decode_stream(stream) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Skipping form XObject /{}: {}", name, err);
                return;
            }
        };
        let matrix = stream
            .dict
            .get("Matrix")
            .and_then(PdfObject::as_array)
            .and_then(|m| m.as_numbers())
            .and_then(|m| <[f64; 6]>::try_from(m).ok())
            .unwrap_or(IDENTITY);
        let form_resources = stream
            .dict
            .get("Resources")
            .and_then(|obj| objects.resolve(obj).ok())
            .and_then(PdfObject::as_dict)
            .or(resources);

        self.run(
            &content,
            form_resources,
            objects,
            multiply(&matrix, &state.ctm),
            depth + 1,
            sink,
        );
    }
}

fn decoder_for<'d>(decoders: &'d HashMap<String, FontDecoder>, state: &GraphicsState) -> &'d FontDecoder {
    lazy_static::lazy_static! {
        static ref FALLBACK: FontDecoder = FontDecoder::fallback();
    }
    state
        .font_name
        .as_ref()
        .and_then(|name| decoders.get(name))
        .unwrap_or(&FALLBACK)
}

/// `a × b` for PDF's row-vector affine matrices.
fn multiply(a: &[f64; 6], b: &[f64; 6]) -> [f64; 6] {
    [
        a[0] * b[0] + a[1] * b[2],
        a[0] * b[1] + a[1] * b[3],
        a[2] * b[0] + a[3] * b[2],
        a[2] * b[1] + a[3] * b[3],
        a[4] * b[0] + a[5] * b[2] + b[4],
        a[4] * b[1] + a[5] * b[3] + b[5],
    ]
}

fn transform_point(x: f64, y: f64, m: &[f64; 6]) -> (f64, f64) {
    (x * m[0] + y * m[2] + m[4], x * m[1] + y * m[3] + m[5])
}
