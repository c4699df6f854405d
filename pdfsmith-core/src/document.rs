use crate::error::{PdfError, Result};
use crate::metadata::Metadata;
use crate::objects::{ObjectId, ObjectTable, PdfArray, PdfDictionary, PdfName, PdfObject};
use crate::page::{validate_rotation, Page};
use crate::parser::header::PdfVersion;
use crate::parser::reader::read_file;
use crate::parser::{ParseError, ParseOptions};
use crate::text::{ExtractionOptions, TextExtractor};
use crate::writer::{PdfWriter, WriterConfig};
use std::collections::HashSet;
use std::path::Path;

/// Page trees deeper than this are treated as corrupt.
const MAX_PAGE_TREE_DEPTH: usize = 256;

/// A PDF document: the object table plus the handful of trailer entries
/// that tie it together.
///
/// # Example
///
/// ```rust,no_run
/// use pdfsmith::Document;
///
/// # fn main() -> pdfsmith::Result<()> {
/// let mut doc = Document::open("input.pdf")?;
/// println!("{} pages", doc.page_count()?);
///
/// doc.rotate(0, 90)?;
/// println!("{}", doc.extract_text(0)?);
///
/// doc.save("rotated.pdf")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Document {
    objects: ObjectTable,
    root: ObjectId,
    info: Option<ObjectId>,
    file_id: Option<Vec<u8>>,
    version: PdfVersion,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document: a catalog and a page tree without kids.
    pub fn new() -> Self {
        let mut objects = ObjectTable::new();

        let mut pages = PdfDictionary::new();
        pages.set("Type", PdfName::new("Pages"));
        pages.set("Kids", PdfArray::new());
        pages.set("Count", 0);
        let pages_id = objects.add(pages);

        let mut catalog = PdfDictionary::new();
        catalog.set("Type", PdfName::new("Catalog"));
        catalog.set("Pages", pages_id);
        let root = objects.add(catalog);

        Self {
            objects,
            root,
            info: None,
            file_id: None,
            version: PdfVersion::default(),
        }
    }

    /// Parse a document with the default (strict) options.
    pub fn parse(data: impl Into<Vec<u8>>) -> Result<Self> {
        Self::parse_with_options(data, &ParseOptions::default())
    }

    pub fn parse_with_options(data: impl Into<Vec<u8>>, options: &ParseOptions) -> Result<Self> {
        let parsed = read_file(data.into(), options)?;
        let mut objects = parsed.objects;
        let trailer = parsed.trailer;

        let root = trailer
            .get("Root")
            .and_then(PdfObject::as_reference)
            .ok_or_else(|| ParseError::MissingKey("Root".to_string()))?;
        let catalog = objects.get(root)?.as_dict().ok_or_else(|| ParseError::SyntaxError {
            position: 0,
            message: format!("catalog {root} is not a dictionary"),
        })?;
        if catalog.get("Pages").and_then(PdfObject::as_reference).is_none() {
            return Err(ParseError::MissingKey("Pages".to_string()).into());
        }

        let mut version = parsed.version;
        if let Some(catalog_version) = catalog.get_name("Version").and_then(PdfVersion::parse) {
            version = version.max(catalog_version);
        }

        let info = match trailer.get("Info") {
            Some(PdfObject::Reference(id)) if objects.contains(*id) => Some(*id),
            Some(PdfObject::Dictionary(dict)) => Some(objects.add(dict.clone())),
            _ => None,
        };

        let file_id = trailer
            .get("ID")
            .and_then(PdfObject::as_array)
            .and_then(|id| id.get(0))
            .and_then(PdfObject::as_string)
            .map(|s| s.as_bytes().to_vec());

        tracing::debug!(
            "Parsed PDF {} with {} objects, catalog {}",
            version,
            objects.len(),
            root
        );

        Ok(Self {
            objects,
            root,
            info,
            file_id,
            version,
        })
    }

    /// Read and parse a file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::parse(std::fs::read(path)?)
    }

    /// Serialize with the default writer settings.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        self.to_bytes_with_config(&WriterConfig::default())
    }

    pub fn to_bytes_with_config(&self, config: &WriterConfig) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        PdfWriter::new(&mut buffer, config.clone()).write_document(self)?;
        Ok(buffer)
    }

    /// Serialize and write to a file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    pub fn objects(&self) -> &ObjectTable {
        &self.objects
    }

    pub fn objects_mut(&mut self) -> &mut ObjectTable {
        &mut self.objects
    }

    /// Id of the document catalog.
    pub fn root(&self) -> ObjectId {
        self.root
    }

    pub fn catalog(&self) -> Result<&PdfDictionary> {
        self.objects
            .get(self.root)?
            .as_dict()
            .ok_or_else(|| PdfError::InternalConsistency("catalog is not a dictionary".into()))
    }

    pub fn version(&self) -> PdfVersion {
        self.version
    }

    pub fn set_version(&mut self, version: PdfVersion) {
        self.version = version;
    }

    /// First element of the trailer `/ID`, when the source had one.
    pub fn file_id(&self) -> Option<&[u8]> {
        self.file_id.as_deref()
    }

    pub fn info_id(&self) -> Option<ObjectId> {
        self.info
    }

    /// The document information dictionary.
    pub fn info(&self) -> Option<&PdfDictionary> {
        self.objects.get(self.info?).ok()?.as_dict()
    }

    pub fn set_info(&mut self, info: PdfDictionary) {
        match self.info {
            Some(id) => self.objects.insert(id, info.into()),
            None => self.info = Some(self.objects.add(info)),
        }
    }

    pub fn metadata(&self) -> Metadata {
        self.info().map(Metadata::from_info).unwrap_or_default()
    }

    /// Store an object under a fresh id.
    pub fn add_object(&mut self, object: impl Into<PdfObject>) -> ObjectId {
        self.objects.add(object)
    }

    /// Root node of the page tree.
    pub fn pages_root(&self) -> Result<ObjectId> {
        self.catalog()?
            .get("Pages")
            .and_then(PdfObject::as_reference)
            .ok_or_else(|| ParseError::MissingKey("Pages".to_string()).into())
    }

    /// Page ids in document order: depth-first, left to right over `/Kids`.
    pub fn page_ids(&self) -> Result<Vec<ObjectId>> {
        let root = self.pages_root()?;
        let mut pages = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(root, 0usize)];

        while let Some((id, depth)) = stack.pop() {
            if !visited.insert(id) {
                return Err(ParseError::CircularReference(format!("page tree node {id}")).into());
            }
            if depth > MAX_PAGE_TREE_DEPTH {
                return Err(ParseError::NestingTooDeep { position: 0 }.into());
            }

            let node = match self.objects.get(id) {
                Ok(PdfObject::Dictionary(dict)) => dict,
                Ok(other) => {
                    return Err(ParseError::SyntaxError {
                        position: 0,
                        message: format!("page tree node {id} is a {}", other.type_name()),
                    }
                    .into())
                }
                Err(PdfError::ObjectNotFound(_)) => {
                    return Err(ParseError::InvalidReference(id.number(), id.generation()).into())
                }
                Err(err) => return Err(err),
            };

            let kids = match node.get_type() {
                Some("Page") => None,
                _ => node.get("Kids"),
            };
            match kids {
                None => pages.push(id),
                Some(kids) => {
                    let kids = self.objects.resolve(kids)?.as_array().ok_or_else(|| {
                        ParseError::SyntaxError {
                            position: 0,
                            message: format!("/Kids of {id} is not an array"),
                        }
                    })?;
                    for kid in kids.iter().rev() {
                        let kid = kid.as_reference().ok_or_else(|| ParseError::SyntaxError {
                            position: 0,
                            message: format!("/Kids of {id} holds a direct object"),
                        })?;
                        stack.push((kid, depth + 1));
                    }
                }
            }
        }

        Ok(pages)
    }

    pub fn page_count(&self) -> Result<usize> {
        Ok(self.page_ids()?.len())
    }

    /// Id of the page at `index`.
    pub fn page_id(&self, index: usize) -> Result<ObjectId> {
        let ids = self.page_ids()?;
        ids.get(index)
            .copied()
            .ok_or(PdfError::PageIndexOutOfRange {
                index,
                page_count: ids.len(),
            })
    }

    pub fn page(&self, index: usize) -> Result<Page<'_>> {
        Page::load(&self.objects, self.page_id(index)?)
    }

    pub fn pages(&self) -> Result<Vec<Page<'_>>> {
        self.page_ids()?
            .into_iter()
            .map(|id| Page::load(&self.objects, id))
            .collect()
    }

    /// Append a page dictionary as the last kid of the page tree root.
    pub fn push_page(&mut self, mut page: PdfDictionary) -> Result<ObjectId> {
        let pages_root = self.pages_root()?;
        page.set("Type", PdfName::new("Page"));
        page.set("Parent", pages_root);
        let id = self.objects.add(page);
        self.attach_pages(&[id])?;
        Ok(id)
    }

    /// Add existing page objects, already parented to the root, as kids.
    pub(crate) fn attach_pages(&mut self, ids: &[ObjectId]) -> Result<()> {
        let pages_root = self.pages_root()?;
        let root = self.objects.get(pages_root)?.as_dict().ok_or_else(|| {
            PdfError::InternalConsistency(format!("page tree root {pages_root} is not a dictionary"))
        })?;

        let mut kids = match root.get("Kids").map(|kids| self.objects.resolve(kids)) {
            Some(Ok(PdfObject::Array(kids))) => kids.clone(),
            _ => PdfArray::new(),
        };
        for id in ids {
            kids.push(*id);
        }
        let count = root.get_integer("Count").unwrap_or(0) + ids.len() as i64;

        let root = self.objects.get_mut(pages_root)?.as_dict_mut().ok_or_else(|| {
            PdfError::InternalConsistency(format!("page tree root {pages_root} is not a dictionary"))
        })?;
        root.set("Kids", kids);
        root.set("Count", count);
        Ok(())
    }

    /// Rotate one page by `degrees`, writing `/Rotate` on the page itself.
    pub fn rotate(&mut self, index: usize, degrees: i64) -> Result<()> {
        validate_rotation(degrees)?;
        let page = self.page(index)?;
        let id = page.id();
        let rotation = (page.rotation() + degrees).rem_euclid(360);
        self.set_rotation(id, rotation)
    }

    /// Rotate every page by `degrees`; nothing changes if the angle is invalid.
    pub fn rotate_all(&mut self, degrees: i64) -> Result<()> {
        let indices: Vec<usize> = (0..self.page_count()?).collect();
        self.rotate_pages(&indices, degrees)
    }

    /// Rotate the pages at `indices`. All indices are checked first.
    pub fn rotate_pages(&mut self, indices: &[usize], degrees: i64) -> Result<()> {
        validate_rotation(degrees)?;
        let ids = self.page_ids()?;
        let mut updates = Vec::with_capacity(indices.len());
        for &index in indices {
            let id = *ids.get(index).ok_or(PdfError::PageIndexOutOfRange {
                index,
                page_count: ids.len(),
            })?;
            let rotation = Page::load(&self.objects, id)?.rotation();
            updates.push((id, (rotation + degrees).rem_euclid(360)));
        }

        for (id, rotation) in updates {
            self.set_rotation(id, rotation)?;
        }
        tracing::debug!("Rotated {} pages by {} degrees", indices.len(), degrees);
        Ok(())
    }

    fn set_rotation(&mut self, page: ObjectId, rotation: i64) -> Result<()> {
        let dict = self.objects.get_mut(page)?.as_dict_mut().ok_or_else(|| {
            PdfError::InternalConsistency(format!("page {page} is not a dictionary"))
        })?;
        dict.set("Rotate", rotation);
        Ok(())
    }

    /// Extract the text of the page at `index` with default options.
    pub fn extract_text(&self, index: usize) -> Result<String> {
        self.extract_text_with_options(index, ExtractionOptions::default())
    }

    pub fn extract_text_with_options(
        &self,
        index: usize,
        options: ExtractionOptions,
    ) -> Result<String> {
        TextExtractor::with_options(options).extract_page(&self.page(index)?)
    }
}
