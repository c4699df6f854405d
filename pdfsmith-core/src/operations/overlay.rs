//! Page overlays
//!
//! Stamps the content of one page on top of another. The result draws the
//! base page's content unchanged, then the overlay's content between `q` and
//! `Q`. Resources are unioned per category (`/Font`, `/XObject`, ...); an
//! overlay resource whose name is already taken by a different base resource
//! is renamed to `<name>_<n>`, and the overlay content is rewritten to use
//! the new name.

use super::copy::ObjectCopier;
use crate::document::Document;
use crate::error::{PdfError, Result};
use crate::objects::{ObjectId, PdfArray, PdfDictionary, PdfObject, PdfStream};
use crate::parser::content::{ContentParser, Operand, RawOperation};
use crate::writer::write_name;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::ops::Range;

/// Resource categories whose entries are named from content streams.
const NAMED_CATEGORIES: [&str; 7] = [
    "Font",
    "XObject",
    "ExtGState",
    "ColorSpace",
    "Pattern",
    "Shading",
    "Properties",
];

/// Per category, old name to new name.
type Renames = BTreeMap<String, BTreeMap<String, String>>;

/// Overlay page `stamp_index` of `stamp` onto every page of `base`.
///
/// Either every page receives the overlay or `base` is left as it was.
pub fn overlay(base: &mut Document, stamp: &Document, stamp_index: usize) -> Result<()> {
    let targets = base.page_ids()?;
    let plans = plan_overlay(base, &targets, stamp, stamp_index)?;
    commit(base, plans)?;
    tracing::debug!("Overlaid {} pages", targets.len());
    Ok(())
}

/// Overlay page `stamp_index` of `stamp` onto page `page_index` of `base`.
pub fn overlay_page(
    base: &mut Document,
    page_index: usize,
    stamp: &Document,
    stamp_index: usize,
) -> Result<()> {
    let target = base.page_id(page_index)?;
    let plans = plan_overlay(base, &[target], stamp, stamp_index)?;
    commit(base, plans)
}

/// Work out the new `/Contents` and `/Resources` of every target page
/// without touching the pages. Objects copied from `stamp` are discarded
/// again if any page cannot be planned.
fn plan_overlay(
    base: &mut Document,
    targets: &[ObjectId],
    stamp: &Document,
    stamp_index: usize,
) -> Result<Vec<PagePlan>> {
    let first_new = base.objects().next_number();
    let prepared = match PreparedOverlay::new(base, stamp, stamp_index) {
        Ok(prepared) => prepared,
        Err(err) => {
            base.objects_mut().discard_from(first_new);
            return Err(err);
        }
    };

    let view: &Document = base;
    let plans: Result<Vec<PagePlan>> = targets
        .iter()
        .map(|&page_id| prepared.plan(view, page_id))
        .collect();
    if plans.is_err() {
        base.objects_mut().discard_from(first_new);
    }
    plans
}

fn commit(base: &mut Document, plans: Vec<PagePlan>) -> Result<()> {
    let mut streams: HashMap<Vec<u8>, ObjectId> = HashMap::new();
    for plan in plans {
        let overlay_id = match streams.get(&plan.content) {
            Some(id) => *id,
            None => {
                let id = base.add_object(PdfStream::from_content(plan.content.clone()));
                streams.insert(plan.content, id);
                id
            }
        };

        let mut contents = PdfArray::new();
        for part in plan.base_contents {
            match part {
                PdfObject::Reference(_) => contents.push(part),
                PdfObject::Stream(stream) => contents.push(base.add_object(stream)),
                _ => {}
            }
        }
        contents.push(overlay_id);

        let page_id = plan.page_id;
        let dict = base
            .objects_mut()
            .get_mut(page_id)?
            .as_dict_mut()
            .ok_or_else(|| PdfError::InternalConsistency(format!("page {page_id} is not a dictionary")))?;
        dict.set("Contents", contents);
        dict.set("Resources", plan.resources);
    }
    Ok(())
}

/// The new state of one base page.
struct PagePlan {
    page_id: ObjectId,
    base_contents: Vec<PdfObject>,
    resources: PdfDictionary,
    /// Overlay content wrapped in `q`/`Q`, names already rewritten.
    content: Vec<u8>,
}

/// The overlay page with its resources already copied into the base document.
struct PreparedOverlay {
    resources: PdfDictionary,
    content: Vec<u8>,
    operations: Option<Vec<RawOperation>>,
}

impl PreparedOverlay {
    fn new(base: &mut Document, stamp: &Document, stamp_index: usize) -> Result<Self> {
        let page = stamp.page(stamp_index)?;
        let content = page.contents()?;
        let resources = page.resources().cloned().unwrap_or_default();

        // Parse now so that a broken overlay fails before the base changes.
        let operations = if content.is_empty() {
            None
        } else {
            Some(ContentParser::parse_raw(&content)?)
        };

        let mut copier = ObjectCopier::new(stamp);
        let resources = match copier.copy_value(base, &PdfObject::Dictionary(resources))? {
            PdfObject::Dictionary(dict) => dict,
            _ => PdfDictionary::new(),
        };
        Ok(Self {
            resources,
            content,
            operations,
        })
    }

    fn plan(&self, base: &Document, page_id: ObjectId) -> Result<PagePlan> {
        let page = crate::page::Page::load(base.objects(), page_id)?;
        let base_resources = page.resources().cloned().unwrap_or_default();
        let base_contents: Vec<PdfObject> = page.content_refs().into_iter().cloned().collect();

        let (resources, renames) = merge_resources(&base_resources, &self.resources, base)?;
        let content = match &self.operations {
            Some(operations) => rewrite_names(&self.content, operations, &renames),
            None => Vec::new(),
        };
        if !renames.is_empty() {
            tracing::debug!("Renamed overlay resources on page {}: {:?}", page_id, renames);
        }

        let mut wrapped = b"q\n".to_vec();
        wrapped.extend_from_slice(&content);
        wrapped.extend_from_slice(b"\nQ\n");
        Ok(PagePlan {
            page_id,
            base_contents,
            resources,
            content: wrapped,
        })
    }
}

/// Union `overlay` into `base`, renaming overlay entries that collide.
fn merge_resources(
    base: &PdfDictionary,
    overlay: &PdfDictionary,
    document: &Document,
) -> Result<(PdfDictionary, Renames)> {
    let objects = document.objects();
    let mut merged = base.clone();
    let mut renames = Renames::new();

    for (key, value) in overlay.iter() {
        let category = key.as_str();
        if category == "ProcSet" {
            merged.set("ProcSet", union_proc_sets(merged.get("ProcSet"), value, document)?);
            continue;
        }
        if !NAMED_CATEGORIES.contains(&category) {
            if !merged.contains_key(category) {
                merged.set(key.clone(), value.clone());
            }
            continue;
        }

        let Some(overlay_entries) = objects.resolve(value)?.as_dict() else {
            continue;
        };
        let mut entries = match merged.get(category) {
            Some(existing) => objects
                .resolve(existing)?
                .as_dict()
                .cloned()
                .unwrap_or_default(),
            None => PdfDictionary::new(),
        };

        let mut taken: HashSet<String> = entries
            .keys()
            .chain(overlay_entries.keys())
            .map(|name| name.as_str().to_string())
            .collect();
        for (name, resource) in overlay_entries.iter() {
            match entries.get(name.as_str()) {
                None => entries.set(name.clone(), resource.clone()),
                Some(existing) if existing == resource => {}
                Some(_) => {
                    let fresh = fresh_name(name.as_str(), &taken);
                    taken.insert(fresh.clone());
                    entries.set(fresh.as_str(), resource.clone());
                    renames
                        .entry(category.to_string())
                        .or_default()
                        .insert(name.as_str().to_string(), fresh);
                }
            }
        }
        merged.set(key.clone(), entries);
    }

    Ok((merged, renames))
}

fn fresh_name(name: &str, taken: &HashSet<String>) -> String {
    (1..)
        .map(|n| format!("{name}_{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| name.to_string())
}

fn union_proc_sets(
    base: Option<&PdfObject>,
    overlay: &PdfObject,
    document: &Document,
) -> Result<PdfObject> {
    let objects = document.objects();
    let mut names: Vec<PdfObject> = Vec::new();
    for value in base.into_iter().chain(std::iter::once(overlay)) {
        if let Some(array) = objects.resolve(value)?.as_array() {
            for name in array.iter() {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
    }
    Ok(PdfObject::Array(PdfArray(names)))
}

/// Category of each resource-name operand of `op`.
fn resource_operands(op: &RawOperation) -> Vec<(&Operand, &'static str)> {
    let name_at = |index: usize, category: &'static str| {
        op.operands
            .get(index)
            .filter(|operand| matches!(operand.value, PdfObject::Name(_)))
            .map(|operand| (operand, category))
    };

    match op.operator.as_str() {
        "Tf" => name_at(0, "Font").into_iter().collect(),
        "Do" => name_at(0, "XObject").into_iter().collect(),
        "gs" => name_at(0, "ExtGState").into_iter().collect(),
        "cs" | "CS" => name_at(0, "ColorSpace").into_iter().collect(),
        "sh" => name_at(0, "Shading").into_iter().collect(),
        "scn" | "SCN" => name_at(op.operands.len().saturating_sub(1), "Pattern")
            .into_iter()
            .collect(),
        "BDC" | "DP" => name_at(1, "Properties").into_iter().collect(),
        "BI" => op
            .operands
            .chunks(2)
            .filter(|pair| matches!(pair[0].value.as_name(), Some("CS" | "ColorSpace")))
            .filter_map(|pair| pair.get(1))
            .filter(|operand| matches!(operand.value, PdfObject::Name(_)))
            .map(|operand| (operand, "ColorSpace"))
            .collect(),
        _ => Vec::new(),
    }
}

/// Replace renamed resource names in `content`, leaving every other byte as is.
fn rewrite_names(content: &[u8], operations: &[RawOperation], renames: &Renames) -> Vec<u8> {
    if renames.is_empty() {
        return content.to_vec();
    }

    let mut edits: Vec<(Range<usize>, &str)> = Vec::new();
    for op in operations {
        for (operand, category) in resource_operands(op) {
            let Some(name) = operand.value.as_name() else {
                continue;
            };
            if let Some(new_name) = renames.get(category).and_then(|names| names.get(name)) {
                edits.push((operand.span.clone(), new_name));
            }
        }
    }
    edits.sort_by_key(|(span, _)| span.start);

    let mut out = Vec::with_capacity(content.len() + edits.len() * 4);
    let mut cursor = 0;
    for (span, new_name) in edits {
        out.extend_from_slice(&content[cursor..span.start]);
        write_name(new_name, &mut out);
        cursor = span.end;
    }
    out.extend_from_slice(&content[cursor..]);
    out
}
