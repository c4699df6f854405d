//! Property-based tests for document operations and parser robustness

mod common;

use common::{labelled, page_texts};
use pdfsmith::operations::{merge, split};
use pdfsmith::{ContentParser, Document, ParseOptions};
use proptest::prelude::*;

fn right_angle() -> impl Strategy<Value = i64> {
    (-8i64..8).prop_map(|n| n * 90)
}

/// Page count plus a strictly increasing set of valid boundaries.
fn document_and_boundaries() -> impl Strategy<Value = (usize, Vec<usize>)> {
    (1usize..7).prop_flat_map(|count| {
        let boundaries = proptest::collection::btree_set(1..count.max(2), 0..count);
        (Just(count), boundaries).prop_map(|(count, set)| {
            (count, set.into_iter().filter(|&b| b < count).collect())
        })
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn rotating_by_full_turns_is_identity(start in right_angle(), turns in -3i64..4) {
        let mut doc = labelled(1);
        doc.rotate(0, start).unwrap();
        let before = doc.page(0).unwrap().rotation();
        doc.rotate(0, turns * 360).unwrap();
        prop_assert_eq!(doc.page(0).unwrap().rotation(), before);
    }

    #[test]
    fn rotations_compose(a in right_angle(), b in right_angle()) {
        let mut twice = labelled(1);
        twice.rotate(0, a).unwrap();
        twice.rotate(0, b).unwrap();

        let mut once = labelled(1);
        once.rotate(0, (a + b).rem_euclid(360)).unwrap();

        prop_assert_eq!(twice.page(0).unwrap().rotation(), once.page(0).unwrap().rotation());
    }

    #[test]
    fn non_right_angles_rejected(degrees in any::<i32>().prop_filter("not a right angle", |d| d % 90 != 0)) {
        let mut doc = labelled(1);
        prop_assert!(doc.rotate(0, degrees as i64).is_err());
        prop_assert_eq!(doc.page(0).unwrap().rotation(), 0);
    }

    #[test]
    fn merge_of_split_restores_pages((count, boundaries) in document_and_boundaries()) {
        let doc = labelled(count);
        let parts = split(&doc, &boundaries).unwrap();
        prop_assert_eq!(parts.len(), boundaries.len() + 1);

        let rejoined = merge(parts.iter()).unwrap();
        prop_assert_eq!(rejoined.page_count().unwrap(), count);
        prop_assert_eq!(page_texts(&rejoined), page_texts(&doc));
    }

    #[test]
    fn merge_page_count_adds_up(a in 1usize..5, b in 1usize..5) {
        let merged = merge([&labelled(a), &labelled(b)]).unwrap();
        prop_assert_eq!(merged.page_count().unwrap(), a + b);
    }

    #[test]
    fn roundtrip_preserves_rotation_and_text(count in 1usize..5, angle in right_angle()) {
        let mut doc = labelled(count);
        doc.rotate_all(angle).unwrap();
        let reparsed = Document::parse(doc.to_bytes().unwrap()).unwrap();

        let rotations = |d: &Document| -> Vec<i64> {
            d.pages().unwrap().iter().map(|p| p.rotation()).collect()
        };
        prop_assert_eq!(rotations(&reparsed), rotations(&doc));
        prop_assert_eq!(page_texts(&reparsed), page_texts(&doc));
        prop_assert_eq!(reparsed.to_bytes().unwrap(), doc.to_bytes().unwrap());
    }

    #[test]
    fn parser_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut data = b"%PDF-1.4\n".to_vec();
        data.extend_from_slice(&bytes);
        for options in [ParseOptions::strict(), ParseOptions::lenient().with_load_all(true)] {
            if let Ok(doc) = Document::parse_with_options(data.clone(), &options) {
                if let Ok(count) = doc.page_count() {
                    for i in 0..count {
                        let _ = doc.extract_text(i);
                    }
                }
            }
        }
    }

    #[test]
    fn content_parser_never_panics(content in "[ -~\n]{0,200}") {
        let _ = ContentParser::parse(content.as_bytes());
    }
}
