//! Text extraction through the public API

mod common;

use common::{build_pdf, pages_pdf, stream};
use pdfsmith::{Document, ErrorKind, ExtractionOptions};
use pretty_assertions::assert_eq;

/// Catalog, page tree, one page using font `/F1` = object 5, its content (4).
fn page_with_font(font: &str, content: &[u8], extra: Vec<Vec<u8>>) -> Document {
    let mut objects = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>".to_vec(),
        stream("", content),
        font.as_bytes().to_vec(),
    ];
    objects.extend(extra);
    Document::parse(build_pdf("1.4", &objects, "")).unwrap()
}

#[test]
fn test_hello_with_standard_encoding() {
    let doc = Document::parse(pages_pdf(&["BT /F1 24 Tf 100 700 Td (Hello) Tj ET"])).unwrap();
    assert_eq!(doc.extract_text(0).unwrap(), "Hello");
}

#[test]
fn test_page_index_out_of_range() {
    let doc = Document::parse(pages_pdf(&["BT ET", "BT ET"])).unwrap();
    let err = doc.extract_text(2).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IndexOutOfRange);
}

#[test]
fn test_lines_and_words() {
    let content = "BT /F1 12 Tf 72 720 Td (First line) Tj 0 -14 Td (Second) Tj 200 0 Td (far) Tj ET";
    let doc = Document::parse(pages_pdf(&[content])).unwrap();
    assert_eq!(doc.extract_text(0).unwrap(), "First line\nSecond far");
}

#[test]
fn test_graphics_operators_are_ignored() {
    let content = "q 1 0 0 RG 0 0 m 100 100 l S Q BT /F1 12 Tf (text) Tj ET 0 0 100 100 re f";
    let doc = Document::parse(pages_pdf(&[content])).unwrap();
    assert_eq!(doc.extract_text(0).unwrap(), "text");
}

#[test]
fn test_type0_font_with_to_unicode() {
    let cmap = b"/CIDInit /ProcSet findresource begin\n12 dict begin\nbegincmap\n\
1 begincodespacerange <0000> <FFFF> endcodespacerange\n\
2 beginbfchar\n<0001> <0048>\n<0002> <0069>\nendbfchar\n\
1 beginbfrange\n<0010> <0012> <0041>\nendbfrange\n\
endcmap\nCMapName currentdict /CMap defineresource pop\nend\nend";
    let doc = page_with_font(
        "<< /Type /Font /Subtype /Type0 /BaseFont /Custom /Encoding /Identity-H /ToUnicode 6 0 R >>",
        b"BT /F1 12 Tf 72 720 Td <00010002> Tj 0 -20 Td <001000110012> Tj ET",
        vec![stream("", cmap)],
    );
    assert_eq!(doc.extract_text(0).unwrap(), "Hi\nABC");
}

#[test]
fn test_differences_encoding() {
    let doc = page_with_font(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Custom /Encoding << /Type /Encoding /BaseEncoding /WinAnsiEncoding /Differences [65 /eacute /germandbls] >> >>",
        b"BT /F1 12 Tf (ABC) Tj ET",
        Vec::new(),
    );
    assert_eq!(doc.extract_text(0).unwrap(), "\u{e9}\u{df}C");
}

#[test]
fn test_unmappable_codes_do_not_fail() {
    let doc = page_with_font(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Custom /Encoding << /Differences [65 /notaglyphname] >> >>",
        b"BT /F1 12 Tf (AB) Tj ET",
        Vec::new(),
    );
    assert_eq!(doc.extract_text(0).unwrap(), "\u{FFFD}B");
}

#[test]
fn test_content_array_and_hex_filter() {
    let objects = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /Contents [4 0 R 5 0 R] >>".to_vec(),
        stream("", b"BT 72 720 Td (one) Tj"),
        // "(two) Tj ET"
        stream("/Filter /ASCIIHexDecode", b"2874776F2920546A204554>"),
    ];
    let doc = Document::parse(build_pdf("1.4", &objects, "")).unwrap();
    assert_eq!(doc.extract_text(0).unwrap(), "onetwo");
}

#[cfg(feature = "compression")]
#[test]
fn test_flate_compressed_content() {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(b"BT /F1 12 Tf 72 720 Td (compressed) Tj ET")
        .unwrap();
    let data = encoder.finish().unwrap();

    let objects = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>".to_vec(),
        stream("/Filter /FlateDecode", &data),
    ];
    let doc = Document::parse(build_pdf("1.4", &objects, "")).unwrap();
    assert_eq!(doc.extract_text(0).unwrap(), "compressed");
}

#[test]
fn test_unsupported_filter_fails_extraction_only() {
    let objects = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>".to_vec(),
        stream("/Filter /JBIG2Decode", b"opaque"),
    ];
    let doc = Document::parse(build_pdf("1.4", &objects, "")).unwrap();
    let err = doc.extract_text(0).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedFeature);

    // Structural operations pass the stream through untouched.
    let copy = pdfsmith::merge([&doc]).unwrap();
    let reparsed = Document::parse(copy.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed.page_count().unwrap(), 1);
}

#[test]
fn test_unicode_normalization_option() {
    let doc = page_with_font(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Custom /Encoding << /Differences [65 /fi] >> >>",
        b"BT /F1 12 Tf (Ane) Tj ET",
        Vec::new(),
    );
    assert_eq!(doc.extract_text(0).unwrap(), "\u{FB01}ne");

    let options = ExtractionOptions::default().with_normalize_unicode(true);
    assert_eq!(doc.extract_text_with_options(0, options).unwrap(), "fine");
}
