//! Shared fixtures: small hand-assembled PDFs with correct xref offsets.

#![allow(dead_code)]

use pdfsmith::Document;

/// Assemble a classic-xref PDF from object bodies numbered from 1.
pub fn build_pdf(version: &str, objects: &[Vec<u8>], trailer_extra: &str) -> Vec<u8> {
    let mut pdf = format!("%PDF-{version}\n").into_bytes();
    pdf.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R {trailer_extra} >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

/// A stream object body with a correct `/Length`.
pub fn stream(extra: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!("<< /Length {} {extra} >>\nstream\n", data.len()).into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

/// Catalog (1), page tree (2), a shared Helvetica font `/F1` (3), then a
/// page and its content stream per entry of `contents`.
pub fn pages_pdf(contents: &[&str]) -> Vec<u8> {
    let kids: Vec<String> = (0..contents.len())
        .map(|i| format!("{} 0 R", 4 + 2 * i))
        .collect();
    let mut objects = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 612 792] >>",
            kids.join(" "),
            contents.len()
        )
        .into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
    ];
    for (i, content) in contents.iter().enumerate() {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                5 + 2 * i
            )
            .into_bytes(),
        );
        objects.push(stream("", content.as_bytes()));
    }
    build_pdf("1.4", &objects, "")
}

/// A document whose page `i` shows the text `label(i)`.
pub fn labelled(count: usize) -> Document {
    let contents: Vec<String> = (0..count)
        .map(|i| format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", label(i)))
        .collect();
    let contents: Vec<&str> = contents.iter().map(String::as_str).collect();
    Document::parse(pages_pdf(&contents)).expect("fixture parses")
}

pub fn label(index: usize) -> String {
    format!("Page {}", index + 1)
}

/// Text of every page, in order.
pub fn page_texts(document: &Document) -> Vec<String> {
    (0..document.page_count().expect("page count"))
        .map(|i| document.extract_text(i).expect("text"))
        .collect()
}
