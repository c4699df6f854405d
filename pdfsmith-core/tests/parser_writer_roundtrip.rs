//! Parse, write and re-parse documents, checking that nothing observable changes.

mod common;

use chrono::{TimeZone, Utc};
use common::{build_pdf, labelled, page_texts, pages_pdf, stream};
use pdfsmith::{Document, PdfDictionary, PdfObject, PdfString, WriterConfig};
use pretty_assertions::assert_eq;

#[test]
fn test_roundtrip_preserves_pages_and_text() {
    let original = labelled(3);
    let bytes = original.to_bytes().unwrap();
    let reparsed = Document::parse(bytes).unwrap();

    assert_eq!(reparsed.page_count().unwrap(), 3);
    assert_eq!(page_texts(&reparsed), page_texts(&original));
}

#[test]
fn test_roundtrip_preserves_rotation_and_boxes() {
    let mut doc = labelled(2);
    doc.rotate(1, 270).unwrap();
    let reparsed = Document::parse(doc.to_bytes().unwrap()).unwrap();

    let page = reparsed.page(1).unwrap();
    assert_eq!(page.rotation(), 270);
    assert_eq!(page.media_box(), [0.0, 0.0, 612.0, 792.0]);
    assert_eq!(reparsed.page(0).unwrap().rotation(), 0);
}

#[test]
fn test_writer_output_is_deterministic() {
    let doc = labelled(4);
    assert_eq!(doc.to_bytes().unwrap(), doc.to_bytes().unwrap());

    let reparsed = Document::parse(doc.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed.to_bytes().unwrap(), doc.to_bytes().unwrap());
}

#[test]
fn test_unreachable_objects_are_dropped() {
    let mut objects = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /MediaBox [0 0 200 200] /Contents 4 0 R >>".to_vec(),
        stream("", b"BT (kept) Tj ET"),
    ];
    objects.push(b"(orphan string)".to_vec());
    objects.push(stream("", b"orphan stream"));
    let doc = Document::parse(build_pdf("1.4", &objects, "")).unwrap();
    assert_eq!(doc.objects().len(), 6);

    let reparsed = Document::parse(doc.to_bytes().unwrap()).unwrap();
    assert_eq!(reparsed.objects().len(), 4);
    assert_eq!(reparsed.extract_text(0).unwrap(), "kept");
}

#[test]
fn test_written_file_has_classic_structure() {
    let bytes = labelled(1).to_bytes().unwrap();
    let text = String::from_utf8_lossy(&bytes);

    assert!(text.starts_with("%PDF-1.4\n"));
    assert!(text.contains("\nxref\n0 "));
    assert!(text.contains("0000000000 65535 f \n"));
    assert!(text.contains("/ID ["));
    assert!(text.trim_end().ends_with("%%EOF"));
}

#[test]
fn test_version_override() {
    let doc = labelled(1);
    let bytes = doc
        .to_bytes_with_config(&WriterConfig::default().with_version("1.7"))
        .unwrap();
    assert!(bytes.starts_with(b"%PDF-1.7\n"));
    assert_eq!(Document::parse(bytes).unwrap().version().to_string(), "1.7");
}

#[test]
fn test_modification_date_stamped() {
    let date = Utc.with_ymd_and_hms(2024, 3, 9, 16, 5, 0).unwrap();
    let bytes = labelled(1)
        .to_bytes_with_config(&WriterConfig::default().with_modification_date(date))
        .unwrap();

    let doc = Document::parse(bytes).unwrap();
    let modified = doc.metadata().modification_date.unwrap();
    assert_eq!(modified.with_timezone(&Utc), date);
}

#[test]
fn test_metadata_survives_roundtrip() {
    let mut doc = labelled(1);
    let mut info = PdfDictionary::new();
    info.set("Title", PdfString::from("Quarterly Report"));
    info.set("Author", PdfString::from("Finance"));
    doc.set_info(info);

    let reparsed = Document::parse(doc.to_bytes().unwrap()).unwrap();
    let metadata = reparsed.metadata();
    assert_eq!(metadata.title.as_deref(), Some("Quarterly Report"));
    assert_eq!(metadata.author.as_deref(), Some("Finance"));
}

#[test]
fn test_streams_keep_their_bytes() {
    let binary: Vec<u8> = (0u8..=255).collect();
    let objects = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_vec(),
        b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R /Resources << /XObject << /Im1 5 0 R >> >> >>"
            .to_vec(),
        stream("", b"q 10 0 0 10 0 0 cm /Im1 Do Q"),
        stream(
            "/Type /XObject /Subtype /Image /Width 16 /Height 16 /ColorSpace /DeviceGray /BitsPerComponent 8",
            &binary,
        ),
    ];
    let doc = Document::parse(build_pdf("1.4", &objects, "")).unwrap();
    let reparsed = Document::parse(doc.to_bytes().unwrap()).unwrap();

    let page = reparsed.page(0).unwrap();
    let xobjects = page.resources().unwrap().get_dict("XObject").unwrap();
    let image = reparsed.objects().resolve(xobjects.get("Im1").unwrap()).unwrap();
    match image {
        PdfObject::Stream(stream) => assert_eq!(stream.raw_data(), &binary[..]),
        other => panic!("expected image stream, found {}", other.type_name()),
    }
}

#[test]
fn test_save_and_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("saved.pdf");

    let doc = Document::parse(pages_pdf(&["BT /F1 12 Tf (saved) Tj ET"])).unwrap();
    doc.save(&path).unwrap();

    let reopened = Document::open(&path).unwrap();
    assert_eq!(reopened.extract_text(0).unwrap(), "saved");
}
