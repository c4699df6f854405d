//! Parse / write / extract benchmarks
//!
//! Run with: `cargo bench --bench roundtrip`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use pdfsmith::operations::{merge, split_into_pages, watermark, StampInstructions, TextStampProducer};
use pdfsmith::Document;

/// A document with `pages` pages of a few dozen text lines each.
fn sample_pdf(pages: usize) -> Vec<u8> {
    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        Vec::new(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>".to_vec(),
    ];
    let mut kids = Vec::with_capacity(pages);
    for page in 0..pages {
        let mut content = String::from("BT /F1 10 Tf 72 740 Td 12 TL\n");
        for line in 0..50 {
            content.push_str(&format!("(Page {page} line {line}: lorem ipsum dolor sit amet) Tj T*\n"));
        }
        content.push_str("ET");

        let page_id = objects.len() + 1;
        kids.push(format!("{page_id} 0 R"));
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                page_id + 1
            )
            .into_bytes(),
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }
    objects[1] = format!(
        "<< /Type /Pages /Kids [{}] /Count {pages} /MediaBox [0 0 612 792] >>",
        kids.join(" ")
    )
    .into_bytes();

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n", i + 1).as_bytes());
        pdf.extend_from_slice(body);
        pdf.extend_from_slice(b"\nendobj\n");
    }
    let xref = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

fn bench_parse_and_write(c: &mut Criterion) {
    let mut group = c.benchmark_group("roundtrip");
    for pages in [1, 10, 100] {
        let pdf = sample_pdf(pages);
        group.bench_with_input(BenchmarkId::new("parse", pages), &pdf, |b, pdf| {
            b.iter(|| {
                let doc = Document::parse(black_box(pdf.clone())).unwrap();
                black_box(doc.page_count().unwrap())
            })
        });

        let doc = Document::parse(pdf.clone()).unwrap();
        group.bench_with_input(BenchmarkId::new("write", pages), &doc, |b, doc| {
            b.iter(|| black_box(doc.to_bytes().unwrap()))
        });
    }
    group.finish();
}

fn bench_extract_text(c: &mut Criterion) {
    let doc = Document::parse(sample_pdf(10)).unwrap();
    c.bench_function("extract_text_10_pages", |b| {
        b.iter(|| {
            for i in 0..10 {
                black_box(doc.extract_text(i).unwrap());
            }
        })
    });
}

fn bench_operations(c: &mut Criterion) {
    let doc = Document::parse(sample_pdf(20)).unwrap();

    c.bench_function("split_20_pages", |b| {
        b.iter(|| black_box(split_into_pages(&doc).unwrap()))
    });

    let parts = split_into_pages(&doc).unwrap();
    c.bench_function("merge_20_parts", |b| {
        b.iter(|| black_box(merge(parts.iter()).unwrap()))
    });

    let instructions = StampInstructions::new("CONFIDENTIAL");
    c.bench_function("watermark_20_pages", |b| {
        b.iter(|| {
            let mut copy = Document::parse(sample_pdf(20)).unwrap();
            watermark(&mut copy, &TextStampProducer, black_box(&instructions)).unwrap();
            black_box(copy)
        })
    });
}

criterion_group!(
    benches,
    bench_parse_and_write,
    bench_extract_text,
    bench_operations
);
criterion_main!(benches);
