//! Text support: encodings, fonts, ToUnicode CMaps and text extraction.

pub mod cmap;
pub mod encoding;
mod extraction;
mod font;
mod font_decoder;
pub mod glyph_list;
mod metrics;

pub use cmap::CMap;
pub use encoding::{decode_text_string, encode_text_string, TextEncoding};
pub use extraction::{ExtractionOptions, TextExtractor};
pub use font::Font;
pub use font_decoder::{DecodedGlyph, FontDecoder};
pub use metrics::{glyph_width, measure_char, measure_text};
