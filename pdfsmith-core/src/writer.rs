//! PDF serializer
//!
//! Writes every object reachable from the catalog (and `/Info`) under fresh
//! sequential numbers, followed by a classic cross-reference table. The same
//! document always produces the same bytes unless a modification date is
//! configured.

use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::metadata::format_pdf_date;
use crate::objects::{ObjectId, PdfDictionary, PdfObject, PdfString, StringFormat};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::io::Write;

/// Output settings.
#[derive(Debug, Clone, Default)]
pub struct WriterConfig {
    /// Header version; defaults to the document's version.
    pub version: Option<String>,
    /// Stamped into `/Info` as `/ModDate` when set.
    pub modification_date: Option<DateTime<Utc>>,
}

impl WriterConfig {
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_modification_date(mut self, date: DateTime<Utc>) -> Self {
        self.modification_date = Some(date);
        self
    }
}

pub struct PdfWriter<W: Write> {
    writer: W,
    config: WriterConfig,
    xref_positions: Vec<u64>,
    current_position: u64,
    digest: md5::Context,
}

impl<W: Write> PdfWriter<W> {
    pub fn new(writer: W, config: WriterConfig) -> Self {
        Self {
            writer,
            config,
            xref_positions: Vec::new(),
            current_position: 0,
            digest: md5::Context::new(),
        }
    }

    pub fn new_with_writer(writer: W) -> Self {
        Self::new(writer, WriterConfig::default())
    }

    pub fn write_document(&mut self, document: &Document) -> Result<()> {
        let (order, numbers) = collect_reachable(document)?;

        let info_number = document.info_id().and_then(|id| numbers.get(&id).copied());
        let info_override = self.info_override(document);
        // An Info dictionary created only for /ModDate goes after everything else.
        let extra_info = match (info_number, &info_override) {
            (None, Some(_)) => Some(order.len() as u32 + 1),
            _ => None,
        };

        self.write_header(document)?;

        for id in &order {
            let object = document.objects().get(*id)?;
            let number = numbers[id];
            match (&info_override, Some(number) == info_number) {
                (Some(info), true) => {
                    self.write_object(number, &PdfObject::Dictionary(info.clone()), &numbers)?
                }
                _ => self.write_object(number, object, &numbers)?,
            }
        }
        if let (Some(number), Some(info)) = (extra_info, &info_override) {
            self.write_object(number, &PdfObject::Dictionary(info.clone()), &numbers)?;
        }

        let xref_position = self.current_position;
        self.write_xref()?;
        self.write_trailer(
            numbers[&document.root()],
            info_number.or(extra_info),
            document.file_id(),
            xref_position,
        )?;
        self.writer.flush()?;

        tracing::debug!(
            "Wrote {} objects, {} bytes",
            self.xref_positions.len(),
            self.current_position
        );
        Ok(())
    }

    fn info_override(&self, document: &Document) -> Option<PdfDictionary> {
        let date = self.config.modification_date?;
        let mut info = document.info().cloned().unwrap_or_default();
        info.set("ModDate", PdfString::from(format_pdf_date(date).as_str()));
        Some(info)
    }

    fn write_header(&mut self, document: &Document) -> Result<()> {
        let version = self
            .config
            .version
            .clone()
            .unwrap_or_else(|| document.version().to_string());
        self.write_bytes(format!("%PDF-{version}\n").as_bytes())?;
        // Binary comment to ensure file is treated as binary
        self.write_bytes(&[b'%', 0xE2, 0xE3, 0xCF, 0xD3, b'\n'])?;
        Ok(())
    }

    fn write_object(
        &mut self,
        number: u32,
        object: &PdfObject,
        numbers: &HashMap<ObjectId, u32>,
    ) -> Result<()> {
        self.xref_positions.push(self.current_position);
        tracing::trace!("Writing object {} at {}", number, self.current_position);

        let mut buffer = format!("{number} 0 obj\n").into_bytes();
        serialize_object(object, numbers, &mut buffer)?;
        buffer.extend_from_slice(b"\nendobj\n");
        self.write_bytes(&buffer)
    }

    fn write_xref(&mut self) -> Result<()> {
        let mut xref = format!("xref\n0 {}\n", self.xref_positions.len() + 1);
        xref.push_str("0000000000 65535 f \n");
        for position in &self.xref_positions {
            xref.push_str(&format!("{:010} {:05} n \n", position, 0));
        }
        self.write_bytes(xref.as_bytes())
    }

    fn write_trailer(
        &mut self,
        root: u32,
        info: Option<u32>,
        source_id: Option<&[u8]>,
        xref_position: u64,
    ) -> Result<()> {
        let digest = self.digest.clone().compute().0.to_vec();
        let first = source_id.map(<[u8]>::to_vec).unwrap_or_else(|| digest.clone());

        let mut trailer = format!("trailer\n<<\n/Size {}\n/Root {} 0 R\n", self.xref_positions.len() + 1, root);
        if let Some(info) = info {
            trailer.push_str(&format!("/Info {info} 0 R\n"));
        }
        trailer.push_str(&format!("/ID [<{}> <{}>]\n>>\n", to_hex(&first), to_hex(&digest)));
        trailer.push_str(&format!("startxref\n{xref_position}\n%%EOF\n"));
        self.write_bytes(trailer.as_bytes())
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.writer.write_all(data)?;
        self.digest.consume(data);
        self.current_position += data.len() as u64;
        Ok(())
    }
}

/// Breadth-first walk from the catalog and `/Info`, assigning numbers from 1.
fn collect_reachable(document: &Document) -> Result<(Vec<ObjectId>, HashMap<ObjectId, u32>)> {
    let objects = document.objects();
    let mut order = Vec::new();
    let mut numbers = HashMap::new();
    let mut queue = VecDeque::new();

    let roots = std::iter::once(document.root()).chain(document.info_id());
    for root in roots {
        if !objects.contains(root) {
            return Err(PdfError::InternalConsistency(format!(
                "trailer names missing object {root}"
            )));
        }
        numbers.insert(root, order.len() as u32 + 1);
        order.push(root);
        queue.push_back(root);
    }

    while let Some(from) = queue.pop_front() {
        let object = objects.get(from)?;
        let mut missing = None;
        for_each_written_reference(object, &mut |to| {
            if numbers.contains_key(&to) || missing.is_some() {
                return;
            }
            if !objects.contains(to) {
                missing = Some(to);
                return;
            }
            numbers.insert(to, order.len() as u32 + 1);
            order.push(to);
            queue.push_back(to);
        });
        if let Some(to) = missing {
            if objects.source_refers_to(from, to) {
                return Err(PdfError::MissingReference { from, to });
            }
            return Err(PdfError::DanglingReference { from, to });
        }
    }

    Ok((order, numbers))
}

/// Like [`PdfObject::for_each_reference`], minus a stream's `/Length`, which
/// is always written as a direct integer.
fn for_each_written_reference(object: &PdfObject, f: &mut impl FnMut(ObjectId)) {
    match object {
        PdfObject::Stream(stream) => {
            for (key, value) in stream.dict.iter() {
                if key.as_str() != "Length" {
                    value.for_each_reference(f);
                }
            }
        }
        other => other.for_each_reference(f),
    }
}

/// Serialize one value, renumbering references through `numbers`.
pub(crate) fn serialize_object(
    object: &PdfObject,
    numbers: &HashMap<ObjectId, u32>,
    out: &mut Vec<u8>,
) -> Result<()> {
    match object {
        PdfObject::Null => out.extend_from_slice(b"null"),
        PdfObject::Boolean(b) => out.extend_from_slice(if *b { b"true" } else { b"false" }),
        PdfObject::Integer(i) => out.extend_from_slice(i.to_string().as_bytes()),
        PdfObject::Real(f) => out.extend_from_slice(format_real(*f).as_bytes()),
        PdfObject::String(s) => write_string(s, out),
        PdfObject::Name(n) => write_name(n.as_str(), out),
        PdfObject::Array(arr) => {
            out.push(b'[');
            for (i, item) in arr.iter().enumerate() {
                if i > 0 {
                    out.push(b' ');
                }
                serialize_object(item, numbers, out)?;
            }
            out.push(b']');
        }
        PdfObject::Dictionary(dict) => write_dictionary(dict, numbers, out)?,
        PdfObject::Stream(stream) => {
            let mut dict = stream.dict.clone();
            dict.set("Length", stream.data.len());
            write_dictionary(&dict, numbers, out)?;
            out.extend_from_slice(b"\nstream\n");
            out.extend_from_slice(&stream.data);
            out.extend_from_slice(b"\nendstream");
        }
        PdfObject::Reference(id) => {
            let number = numbers.get(id).ok_or_else(|| {
                PdfError::InternalConsistency(format!("reference {id} was not numbered"))
            })?;
            out.extend_from_slice(format!("{number} 0 R").as_bytes());
        }
    }
    Ok(())
}

fn write_dictionary(
    dict: &PdfDictionary,
    numbers: &HashMap<ObjectId, u32>,
    out: &mut Vec<u8>,
) -> Result<()> {
    out.extend_from_slice(b"<<");
    for (key, value) in dict.iter() {
        out.push(b'\n');
        write_name(key.as_str(), out);
        out.push(b' ');
        serialize_object(value, numbers, out)?;
    }
    out.extend_from_slice(b"\n>>");
    Ok(())
}

/// Six fractional digits at most, without trailing zeros.
pub(crate) fn format_real(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let text = format!("{value:.6}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Write `/name`, escaping delimiters, `#` and bytes outside `!`..`~`.
pub(crate) fn write_name(name: &str, out: &mut Vec<u8>) {
    out.push(b'/');
    let mut buffer = [0u8; 4];
    for ch in name.chars() {
        // Chars up to U+00FF stand for single name bytes.
        let bytes: &[u8] = match u8::try_from(ch as u32) {
            Ok(byte) => {
                buffer[0] = byte;
                &buffer[..1]
            }
            Err(_) => ch.encode_utf8(&mut buffer).as_bytes(),
        };
        for &byte in bytes {
            let needs_escape = !(0x21..=0x7E).contains(&byte)
                || byte == b'#'
                || crate::parser::lexer::is_delimiter(byte);
            if needs_escape {
                out.extend_from_slice(format!("#{byte:02X}").as_bytes());
            } else {
                out.push(byte);
            }
        }
    }
}

fn write_string(string: &PdfString, out: &mut Vec<u8>) {
    match string.format() {
        StringFormat::Hexadecimal => {
            out.push(b'<');
            out.extend_from_slice(to_hex(string.as_bytes()).as_bytes());
            out.push(b'>');
        }
        StringFormat::Literal => {
            out.push(b'(');
            for &byte in string.as_bytes() {
                match byte {
                    b'(' | b')' | b'\\' => out.extend_from_slice(&[b'\\', byte]),
                    b'\r' => out.extend_from_slice(b"\\r"),
                    _ => out.push(byte),
                }
            }
            out.push(b')');
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::objects::{PdfName, PdfStream};
    use chrono::TimeZone;

    fn serialize(object: &PdfObject) -> String {
        let mut out = Vec::new();
        serialize_object(object, &HashMap::new(), &mut out).unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }

    fn sample_document() -> Document {
        let mut doc = Document::new();
        let content = doc.add_object(PdfStream::from_content(
            b"BT /F1 12 Tf 72 720 Td (Hello) Tj ET".to_vec(),
        ));
        let mut page = PdfDictionary::new();
        page.set("Contents", content);
        doc.push_page(page).unwrap();
        doc
    }

    #[test]
    fn test_format_real() {
        assert_eq!(format_real(1.5), "1.5");
        assert_eq!(format_real(2.0), "2");
        assert_eq!(format_real(0.1234567), "0.123457");
        assert_eq!(format_real(-0.0000001), "0");
        assert_eq!(format_real(f64::NAN), "0");
    }

    #[test]
    fn test_name_escaping() {
        assert_eq!(serialize(&PdfName::new("Type").into()), "/Type");
        assert_eq!(serialize(&PdfName::new("A B#(x)").into()), "/A#20B#23#28x#29");
        assert_eq!(serialize(&PdfName::new("caf\u{e9}").into()), "/caf#E9");
    }

    #[test]
    fn test_string_escaping() {
        let literal = PdfString::new(b"a(b)\\c\r".to_vec());
        assert_eq!(serialize(&literal.into()), "(a\\(b\\)\\\\c\\r)");
        let hex = PdfString::hex(vec![0xFE, 0xFF, 0x00, 0x41]);
        assert_eq!(serialize(&hex.into()), "<FEFF0041>");
    }

    #[test]
    fn test_stream_length_is_rewritten() {
        let mut stream = PdfStream::from_content(b"abc".to_vec());
        stream.dict.set("Length", ObjectId::new(9, 0));
        let text = serialize(&stream.into());
        assert_eq!(text, "<<\n/Length 3\n>>\nstream\nabc\nendstream");
    }

    #[test]
    fn test_output_structure() {
        let bytes = sample_document().to_bytes().unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-1.7\n%"));
        assert!(text.contains("1 0 obj\n<<\n/Type /Catalog\n/Pages 2 0 R\n>>"));
        assert!(text.contains("xref\n0 5\n0000000000 65535 f \n"));
        assert!(text.contains("/Size 5\n/Root 1 0 R\n/ID [<"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let bytes = sample_document().to_bytes().unwrap();
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let xref_start = text.rfind("xref\n").unwrap();
        let entries: Vec<usize> = text[xref_start..]
            .lines()
            .skip(3)
            .take(4)
            .map(|line| line[..10].parse().unwrap())
            .collect();
        for (i, offset) in entries.iter().enumerate() {
            assert!(text[*offset..].starts_with(&format!("{} 0 obj", i + 1)));
        }
    }

    #[test]
    fn test_deterministic_output() {
        let doc = sample_document();
        assert_eq!(doc.to_bytes().unwrap(), doc.to_bytes().unwrap());
    }

    #[test]
    fn test_unreachable_objects_dropped() {
        let mut doc = sample_document();
        doc.add_object(PdfObject::Integer(7));
        let bytes = doc.to_bytes().unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("/Size 5\n"));
    }

    #[test]
    fn test_dangling_reference() {
        let mut doc = sample_document();
        let page = doc.page_id(0).unwrap();
        doc.objects_mut()
            .get_mut(page)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Annots", vec![PdfObject::Reference(ObjectId::new(99, 0))]);
        let err = doc.to_bytes().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalConsistency);
        assert!(matches!(err, PdfError::DanglingReference { from, .. } if from == page));
    }

    #[test]
    fn test_missing_reference_in_parsed_input() {
        let mut source = crate::parser::test_helpers::PdfSource::pages(&[b"BT ET"]);
        source.objects[2] = b"<< /Type /Page /Parent 2 0 R /Contents 4 0 R /Thumb 40 0 R >>".to_vec();
        let mut doc = Document::parse(crate::parser::test_helpers::build_pdf(&source)).unwrap();
        let page = doc.page_id(0).unwrap();

        let err = doc.to_bytes().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
        assert!(matches!(err, PdfError::MissingReference { from, to }
            if from == page && to == ObjectId::new(40, 0)));

        // Still the file's own reference after an unrelated edit.
        doc.rotate(0, 90).unwrap();
        let err = doc.to_bytes().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
    }

    #[test]
    fn test_dangling_reference_added_to_parsed_page() {
        let source = crate::parser::test_helpers::PdfSource::pages(&[b"BT ET"]);
        let mut doc = Document::parse(crate::parser::test_helpers::build_pdf(&source)).unwrap();
        let page = doc.page_id(0).unwrap();
        doc.objects_mut()
            .get_mut(page)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Thumb", ObjectId::new(40, 0));

        let err = doc.to_bytes().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InternalConsistency);
    }

    #[test]
    fn test_modification_date_and_version() {
        let doc = sample_document();
        let date = Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap();
        let config = WriterConfig::default()
            .with_version("2.0")
            .with_modification_date(date);
        let bytes = doc.to_bytes_with_config(&config).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-2.0\n"));
        assert!(text.contains("/ModDate (D:20260102030405Z)"));
        assert!(text.contains("/Info 5 0 R"));
    }

    #[test]
    fn test_source_id_kept() {
        let mut source = crate::parser::test_helpers::PdfSource::pages(&[b"BT ET"]);
        source.trailer_extra = "/ID [<0102> <0304>]".to_string();
        let doc = Document::parse(crate::parser::test_helpers::build_pdf(&source)).unwrap();
        let text = String::from_utf8_lossy(&doc.to_bytes().unwrap()).into_owned();
        assert!(text.contains("/ID [<0102> <"));
        assert!(!text.contains("<0304>"));
    }
}
