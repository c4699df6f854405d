//! # pdfsmith
//!
//! A pure Rust library for reading, editing and writing existing PDF documents.
//!
//! ## Features
//!
//! - **Parsing**: cross-reference tables and streams, object streams, lazy
//!   object loading and an optional lenient mode that rebuilds broken files
//! - **Text Extraction**: font-aware decoding (`/ToUnicode`, simple
//!   encodings, `/Differences`) with layout-based spacing and line breaks
//! - **Page Operations**: rotate, reorder, merge and split
//! - **Overlays**: stamp one page on top of another with collision-free
//!   resource merging, plus a built-in text watermark producer
//! - **Writing**: classic cross-reference output containing only reachable
//!   objects, deterministic unless a modification date is stamped
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdfsmith::{Document, Result};
//! use pdfsmith::operations::{merge, watermark, StampInstructions, TextStampProducer};
//!
//! # fn main() -> Result<()> {
//! let mut report = Document::open("report.pdf")?;
//! println!("{} pages, PDF {}", report.page_count()?, report.version());
//!
//! // Page text, in reading order
//! println!("{}", report.extract_text(0)?);
//!
//! // Turn the first page sideways and stamp every page
//! report.rotate(0, 90)?;
//! let draft = StampInstructions::new("DRAFT");
//! watermark(&mut report, &TextStampProducer, &draft)?;
//!
//! let appendix = Document::open("appendix.pdf")?;
//! let combined = merge([&report, &appendix])?;
//! combined.save("combined.pdf")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`objects`] - PDF values and the object table
//! - [`parser`] - Byte-level parsing: lexer, cross-reference, content streams
//! - [`document`] - The editable document and its page tree
//! - [`page`] - Read-only page view with attribute inheritance
//! - [`text`] - Fonts, encodings and text extraction
//! - [`operations`] - Merge, split, reorder, rotate, overlay and watermark
//! - [`writer`] - Serialization back to bytes

pub mod document;
pub mod error;
pub mod metadata;
pub mod objects;
pub mod operations;
pub mod page;
pub mod parser;
pub mod text;
pub mod writer;

pub use document::Document;
pub use error::{ErrorKind, PdfError, Result};
pub use metadata::Metadata;
pub use objects::{ObjectId, PdfArray, PdfDictionary, PdfName, PdfObject, PdfStream, PdfString};
pub use page::Page;
pub use parser::header::PdfVersion;
pub use parser::{ContentOperation, ContentParser, ParseOptions};
pub use text::{ExtractionOptions, TextExtractor};
pub use writer::{PdfWriter, WriterConfig};

pub use operations::{
    apply_stamp, merge, overlay, overlay_page, reorder, reverse, rotate_pages, select_pages,
    split, split_into_pages, watermark, PageContentProducer, PageRange, StampInstructions,
    TextStampProducer,
};

/// Current version of pdfsmith
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Parse a document from bytes with the default (strict) options.
pub fn parse(bytes: impl Into<Vec<u8>>) -> Result<Document> {
    Document::parse(bytes)
}
