//! Page view over the object table
//!
//! A [`Page`] borrows a page dictionary together with the table that owns it.
//! `MediaBox`, `CropBox`, `Resources` and `Rotate` are inheritable: when a
//! page does not define one, the value is looked up on its `/Parent` chain.

use crate::error::{PdfError, Result};
use crate::objects::{ObjectId, ObjectTable, PdfDictionary, PdfObject};
use std::collections::HashSet;

/// Attributes a page may inherit from its ancestors in the page tree.
pub const INHERITABLE_KEYS: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// US Letter, used when neither the page nor an ancestor has a `/MediaBox`.
pub const DEFAULT_MEDIA_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// Guards against `/Parent` loops in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// A read-only view of one page.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    objects: &'a ObjectTable,
    id: ObjectId,
    dict: &'a PdfDictionary,
}

impl<'a> Page<'a> {
    pub(crate) fn load(objects: &'a ObjectTable, id: ObjectId) -> Result<Self> {
        let dict = objects.get(id)?.as_dict().ok_or_else(|| {
            PdfError::Parse(crate::parser::ParseError::SyntaxError {
                position: 0,
                message: format!("page {id} is not a dictionary"),
            })
        })?;
        Ok(Self { objects, id, dict })
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The page's own dictionary, without inherited entries.
    pub fn dict(&self) -> &'a PdfDictionary {
        self.dict
    }

    pub fn objects(&self) -> &'a ObjectTable {
        self.objects
    }

    /// The unresolved value of `key`, from the page or its nearest ancestor.
    pub fn inherited_raw(&self, key: &str) -> Option<&'a PdfObject> {
        if let Some(value) = self.dict.get(key) {
            return Some(value);
        }

        let mut visited = HashSet::from([self.id]);
        let mut node = self.dict;
        for _ in 0..MAX_TREE_DEPTH {
            let parent_id = node.get("Parent")?.as_reference()?;
            if !visited.insert(parent_id) {
                tracing::warn!("Page tree loop through {} while looking up /{}", parent_id, key);
                return None;
            }
            node = self.objects.get(parent_id).ok()?.as_dict()?;
            if let Some(value) = node.get(key) {
                return Some(value);
            }
        }
        None
    }

    /// The resolved value of an inheritable attribute.
    pub fn inherited(&self, key: &str) -> Option<&'a PdfObject> {
        self.inherited_raw(key)
            .and_then(|value| self.objects.resolve(value).ok())
    }

    pub fn media_box(&self) -> [f64; 4] {
        self.rectangle("MediaBox").unwrap_or(DEFAULT_MEDIA_BOX)
    }

    pub fn crop_box(&self) -> Option<[f64; 4]> {
        self.rectangle("CropBox")
    }

    pub fn width(&self) -> f64 {
        let [llx, _, urx, _] = self.media_box();
        (urx - llx).abs()
    }

    pub fn height(&self) -> f64 {
        let [_, lly, _, ury] = self.media_box();
        (ury - lly).abs()
    }

    fn rectangle(&self, key: &str) -> Option<[f64; 4]> {
        let numbers = self.inherited(key)?.as_array()?.as_numbers()?;
        <[f64; 4]>::try_from(numbers).ok()
    }

    /// Rotation in degrees, normalized to 0, 90, 180 or 270.
    ///
    /// A `/Rotate` that is not a multiple of 90 is treated as 0.
    pub fn rotation(&self) -> i64 {
        let Some(value) = self.inherited("Rotate") else {
            return 0;
        };
        let degrees = match value {
            PdfObject::Integer(n) => *n,
            PdfObject::Real(r) if r.fract() == 0.0 => *r as i64,
            other => {
                tracing::warn!("Page {} has a non-integer /Rotate ({})", self.id, other.type_name());
                return 0;
            }
        };
        if degrees.rem_euclid(90) != 0 {
            tracing::warn!("Page {} has /Rotate {} which is not a multiple of 90", self.id, degrees);
            return 0;
        }
        degrees.rem_euclid(360)
    }

    pub fn resources(&self) -> Option<&'a PdfDictionary> {
        self.inherited("Resources").and_then(PdfObject::as_dict)
    }

    /// References to the page's content streams, in drawing order.
    pub fn content_refs(&self) -> Vec<&'a PdfObject> {
        match self.dict.get("Contents") {
            None => Vec::new(),
            Some(contents) => match self.objects.resolve(contents) {
                Ok(PdfObject::Array(parts)) => parts.iter().collect(),
                _ => vec![contents],
            },
        }
    }

    /// The decoded content of the page; several streams are joined with a
    /// newline so that tokens at their boundaries stay separate.
    pub fn contents(&self) -> Result<Vec<u8>> {
        let mut content = Vec::new();
        for (i, part) in self.content_refs().into_iter().enumerate() {
            let stream = match self.objects.resolve(part)? {
                PdfObject::Stream(stream) => stream,
                PdfObject::Null => continue,
                other => {
                    return Err(PdfError::Parse(crate::parser::ParseError::SyntaxError {
                        position: 0,
                        message: format!(
                            "page {} has a {} where a content stream belongs",
                            self.id,
                            other.type_name()
                        ),
                    }))
                }
            };
            if i > 0 {
                content.push(b'\n');
            }
            content.extend_from_slice(&self.objects.decode_stream(stream)?);
        }
        Ok(content)
    }
}

/// Check that `degrees` is a whole number of quarter turns.
pub fn validate_rotation(degrees: i64) -> Result<()> {
    if degrees.rem_euclid(90) == 0 {
        Ok(())
    } else {
        Err(PdfError::InvalidRotation(degrees))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::objects::{PdfName, PdfStream};

    /// Pages node 1 with a page 2 beneath it.
    fn tree(mut parent: PdfDictionary, mut page: PdfDictionary) -> ObjectTable {
        let mut objects = ObjectTable::new();
        parent.set("Type", PdfName::new("Pages"));
        parent.set("Kids", vec![PdfObject::Reference(ObjectId::new(2, 0))]);
        parent.set("Count", 1);
        objects.insert(ObjectId::new(1, 0), parent.into());

        page.set("Type", PdfName::new("Page"));
        page.set("Parent", ObjectId::new(1, 0));
        objects.insert(ObjectId::new(2, 0), page.into());
        objects
    }

    fn dict(entries: &[(&str, PdfObject)]) -> PdfDictionary {
        entries
            .iter()
            .map(|(k, v)| (PdfName::new(*k), v.clone()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let objects = tree(PdfDictionary::new(), PdfDictionary::new());
        let page = Page::load(&objects, ObjectId::new(2, 0)).unwrap();
        assert_eq!(page.media_box(), DEFAULT_MEDIA_BOX);
        assert_eq!(page.rotation(), 0);
        assert!(page.resources().is_none());
        assert!(page.contents().unwrap().is_empty());
    }

    #[test]
    fn test_inherited_attributes() {
        let media_box: Vec<PdfObject> = vec![0.into(), 0.into(), 595.into(), 842.into()];
        let objects = tree(
            dict(&[("MediaBox", media_box.into()), ("Rotate", 90.into())]),
            PdfDictionary::new(),
        );
        let page = Page::load(&objects, ObjectId::new(2, 0)).unwrap();
        assert_eq!(page.media_box(), [0.0, 0.0, 595.0, 842.0]);
        assert_eq!(page.rotation(), 90);
        assert_eq!(page.width(), 595.0);
    }

    #[test]
    fn test_own_value_wins() {
        let objects = tree(
            dict(&[("Rotate", 90.into())]),
            dict(&[("Rotate", (-90).into())]),
        );
        let page = Page::load(&objects, ObjectId::new(2, 0)).unwrap();
        assert_eq!(page.rotation(), 270);
    }

    #[test]
    fn test_invalid_rotate_is_zero() {
        let objects = tree(PdfDictionary::new(), dict(&[("Rotate", 45.into())]));
        let page = Page::load(&objects, ObjectId::new(2, 0)).unwrap();
        assert_eq!(page.rotation(), 0);
    }

    #[test]
    fn test_parent_loop_terminates() {
        let mut objects = tree(PdfDictionary::new(), PdfDictionary::new());
        objects
            .get_mut(ObjectId::new(1, 0))
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Parent", ObjectId::new(2, 0));
        let page = Page::load(&objects, ObjectId::new(2, 0)).unwrap();
        assert!(page.inherited("Resources").is_none());
    }

    #[test]
    fn test_contents_array_joined() {
        let mut objects = tree(PdfDictionary::new(), PdfDictionary::new());
        let a = objects.add(PdfStream::from_content(b"BT".to_vec()));
        let b = objects.add(PdfStream::from_content(b"ET".to_vec()));
        objects
            .get_mut(ObjectId::new(2, 0))
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Contents", vec![PdfObject::Reference(a), PdfObject::Reference(b)]);
        let page = Page::load(&objects, ObjectId::new(2, 0)).unwrap();
        assert_eq!(page.contents().unwrap(), b"BT\nET");
    }

    #[test]
    fn test_unknown_filter_is_unsupported() {
        let mut objects = tree(PdfDictionary::new(), PdfDictionary::new());
        let mut stream = PdfStream::from_content(b"xx".to_vec());
        stream.dict.set("Filter", PdfName::new("JBIG2Decode"));
        let content = objects.add(stream);
        objects
            .get_mut(ObjectId::new(2, 0))
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Contents", content);
        let page = Page::load(&objects, ObjectId::new(2, 0)).unwrap();
        assert_eq!(page.contents().unwrap_err().kind(), ErrorKind::UnsupportedFeature);
    }

    #[test]
    fn test_validate_rotation() {
        for degrees in [0, 90, -90, 180, 270, 360, 720, -450] {
            assert!(validate_rotation(degrees).is_ok(), "{degrees}");
        }
        assert_eq!(validate_rotation(45).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }
}
