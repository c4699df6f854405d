//! Helpers for building small, well-formed test PDFs with correct offsets

/// Object bodies (without the `N 0 obj` wrapper) numbered from 1.
#[derive(Debug, Clone)]
pub struct PdfSource {
    pub version: String,
    pub objects: Vec<Vec<u8>>,
    /// Extra entries appended to the trailer dictionary.
    pub trailer_extra: String,
}

impl PdfSource {
    pub fn new(objects: Vec<Vec<u8>>) -> Self {
        Self {
            version: "1.4".to_string(),
            objects,
            trailer_extra: String::new(),
        }
    }

    /// Catalog, page tree, one Letter-size page, and its content stream.
    pub fn single_page(content: &[u8]) -> Self {
        Self::pages(&[content])
    }

    /// One page per entry of `contents`: objects 1 and 2 are the catalog and
    /// the page tree, then each page is followed by its content stream.
    pub fn pages(contents: &[&[u8]]) -> Self {
        let kids: Vec<String> = (0..contents.len())
            .map(|i| format!("{} 0 R", 3 + 2 * i))
            .collect();

        let mut objects = vec![
            b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} /MediaBox [0 0 612 792] >>",
                kids.join(" "),
                contents.len()
            )
            .into_bytes(),
        ];
        for (i, content) in contents.iter().enumerate() {
            objects.push(format!("<< /Type /Page /Parent 2 0 R /Contents {} 0 R >>", 4 + 2 * i).into_bytes());
            objects.push(stream_body("", content));
        }
        Self::new(objects)
    }
}

/// `<< /Length n extra >>\nstream\n...\nendstream`
pub fn stream_body(extra_dict: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!("<< /Length {} {} >>\nstream\n", data.len(), extra_dict).into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

/// Serialize `source` with a classic xref table.
pub fn build_pdf(source: &PdfSource) -> Vec<u8> {
    let mut pdf = format!("%PDF-{}\n", source.version).into_bytes();
    let mut offsets = Vec::with_capacity(source.objects.len());

    for (i, body) in source.objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }

    let xref_start = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1);
    for offset in &offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    xref.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R {} >>\nstartxref\n{}\n%%EOF\n",
        offsets.len() + 1,
        source.trailer_extra,
        xref_start
    ));
    pdf.extend_from_slice(xref.as_bytes());
    pdf
}
