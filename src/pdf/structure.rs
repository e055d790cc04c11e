//! Document structure backed by lopdf
//!
//! The outline tree, named destinations and page references are pulled out
//! of the file once at open time. The parsed `lopdf::Document` is not kept
//! around, so the result can be shared freely across resolver threads.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use log::{debug, warn};
use lopdf::{Dictionary, Object, ObjectId};

use super::document::{DocumentError, DocumentOutline};
use super::types::{DestEntry, Destination, OutlineNode, PageRef};

/// Guard against pathological or cyclic outline/name trees
const MAX_TREE_DEPTH: usize = 64;
/// Longest chain of indirect references followed when resolving an object
const MAX_REFERENCE_CHAIN: usize = 8;

/// Structural view of a PDF file
#[derive(Debug, Default)]
pub struct LopdfOutline {
    outline: Option<Vec<OutlineNode>>,
    named_dests: HashMap<String, Vec<DestEntry>>,
    page_refs: Vec<PageRef>,
}

impl LopdfOutline {
    /// Parse a PDF file and extract its structure
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let doc = lopdf::Document::load(path)?;
        Ok(Self::from_document(&doc))
    }

    /// Extract structure from an already parsed document
    #[must_use]
    pub fn from_document(doc: &lopdf::Document) -> Self {
        let page_refs = doc
            .get_pages()
            .values()
            .map(|&(num, generation)| PageRef::new(num, generation))
            .collect::<Vec<_>>();

        let outline = collect_outline(doc);
        let named_dests = collect_named_dests(doc);

        debug!(
            "Loaded document structure: {} pages, {} outline items, {} named destinations",
            page_refs.len(),
            outline
                .as_ref()
                .map_or(0, |o| o.iter().map(OutlineNode::node_count).sum::<usize>()),
            named_dests.len()
        );

        Self {
            outline,
            named_dests,
            page_refs,
        }
    }

    #[must_use]
    pub fn page_count(&self) -> usize {
        self.page_refs.len()
    }
}

impl DocumentOutline for LopdfOutline {
    fn outline(&self) -> Result<Option<Vec<OutlineNode>>, DocumentError> {
        Ok(self.outline.clone())
    }

    fn destination(&self, name: &str) -> Result<Vec<DestEntry>, DocumentError> {
        match self.named_dests.get(name) {
            Some(entries) => Ok(entries.clone()),
            None => {
                debug!("Unknown named destination {name:?}");
                Ok(Vec::new())
            }
        }
    }

    fn page_index(&self, page_ref: &PageRef) -> Result<usize, DocumentError> {
        self.page_refs
            .iter()
            .position(|r| r == page_ref)
            .ok_or(DocumentError::UnknownPageRef(*page_ref))
    }
}

/// Follow indirect references until a direct object is reached
fn resolve<'a>(doc: &'a lopdf::Document, mut obj: &'a Object) -> Option<&'a Object> {
    for _ in 0..MAX_REFERENCE_CHAIN {
        match obj {
            Object::Reference(id) => obj = doc.get_object(*id).ok()?,
            other => return Some(other),
        }
    }
    None
}

fn resolve_dict<'a>(doc: &'a lopdf::Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj)?.as_dict().ok()
}

fn dict_entry<'a>(
    doc: &'a lopdf::Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Object> {
    resolve(doc, dict.get(key).ok()?)
}

/// Decode a PDF text string: UTF-16BE with BOM, else UTF-8 (BOM optional), else Latin-1
pub(crate) fn decode_text(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }

    // PDF 2.0 UTF-8 text strings carry a BOM
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn collect_outline(doc: &lopdf::Document) -> Option<Vec<OutlineNode>> {
    let catalog = doc.catalog().ok()?;
    let outlines = catalog
        .get(b"Outlines")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))?;

    let first = match outlines.get(b"First") {
        Ok(Object::Reference(id)) => *id,
        _ => return Some(Vec::new()),
    };

    let mut visited = HashSet::new();
    Some(walk_outline_siblings(doc, first, 0, &mut visited))
}

fn walk_outline_siblings(
    doc: &lopdf::Document,
    first: ObjectId,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
) -> Vec<OutlineNode> {
    let mut nodes = Vec::new();
    let mut current = Some(first);

    while let Some(id) = current {
        if !visited.insert(id) {
            warn!("Outline item {id:?} visited twice, stopping sibling walk");
            break;
        }

        let Some(dict) = doc.get_object(id).ok().and_then(|o| o.as_dict().ok()) else {
            break;
        };

        let title = match dict_entry(doc, dict, b"Title") {
            Some(Object::String(bytes, _)) => Some(decode_text(bytes)),
            _ => None,
        };

        let dest = outline_destination(doc, dict);

        let items = match dict.get(b"First") {
            Ok(Object::Reference(child)) if depth + 1 < MAX_TREE_DEPTH => {
                Some(walk_outline_siblings(doc, *child, depth + 1, visited))
            }
            _ => None,
        };

        nodes.push(OutlineNode { title, dest, items });

        current = match dict.get(b"Next") {
            Ok(Object::Reference(next)) => Some(*next),
            _ => None,
        };
    }

    nodes
}

/// `/Dest` takes precedence over a `/GoTo` action
fn outline_destination(doc: &lopdf::Document, item: &Dictionary) -> Option<Destination> {
    if let Some(dest) = item.get(b"Dest").ok().and_then(|d| destination_from(doc, d)) {
        return Some(dest);
    }

    let action = item.get(b"A").ok().and_then(|a| resolve_dict(doc, a))?;
    match action.get(b"S") {
        Ok(Object::Name(kind)) if kind.as_slice() == b"GoTo" => {
            action.get(b"D").ok().and_then(|d| destination_from(doc, d))
        }
        _ => None,
    }
}

fn destination_from(doc: &lopdf::Document, obj: &Object) -> Option<Destination> {
    match resolve(doc, obj)? {
        Object::String(bytes, _) | Object::Name(bytes) if bytes.is_empty() => None,
        Object::String(bytes, _) => Some(Destination::Named(decode_text(bytes))),
        Object::Name(name) => Some(Destination::Named(
            String::from_utf8_lossy(name).into_owned(),
        )),
        Object::Array(entries) => Some(Destination::Direct(
            entries.iter().map(dest_entry).collect(),
        )),
        Object::Dictionary(dict) => dict.get(b"D").ok().and_then(|d| destination_from(doc, d)),
        _ => None,
    }
}

/// Entries keep references unresolved: a page reference is the object id
/// of the page itself.
fn dest_entry(obj: &Object) -> DestEntry {
    match obj {
        Object::Reference((num, generation)) => DestEntry::PageRef(PageRef::new(*num, *generation)),
        Object::Name(name) => DestEntry::Name(String::from_utf8_lossy(name).into_owned()),
        Object::Integer(i) => DestEntry::Number(*i as f64),
        Object::Real(r) => DestEntry::Number(f64::from(*r)),
        Object::Null => DestEntry::Null,
        _ => DestEntry::Other,
    }
}

/// Named destination value: an array, or a dictionary with `/D`
fn named_dest_entries(doc: &lopdf::Document, value: &Object) -> Option<Vec<DestEntry>> {
    match resolve(doc, value)? {
        Object::Array(entries) => Some(entries.iter().map(dest_entry).collect()),
        Object::Dictionary(dict) => named_dest_entries(doc, dict.get(b"D").ok()?),
        _ => None,
    }
}

fn collect_named_dests(doc: &lopdf::Document) -> HashMap<String, Vec<DestEntry>> {
    let mut dests = HashMap::new();
    let Ok(catalog) = doc.catalog() else {
        return dests;
    };

    // Name tree under /Names /Dests (PDF 1.2+)
    if let Some(tree) = dict_entry(doc, catalog, b"Names")
        .and_then(|n| n.as_dict().ok())
        .and_then(|names| dict_entry(doc, names, b"Dests"))
        .and_then(|d| d.as_dict().ok())
    {
        walk_name_tree(doc, tree, 0, &mut dests);
    }

    // Legacy /Dests dictionary; the name tree wins on conflicts
    if let Some(legacy) = dict_entry(doc, catalog, b"Dests").and_then(|d| d.as_dict().ok()) {
        for (key, value) in legacy.iter() {
            if let Some(entries) = named_dest_entries(doc, value) {
                dests
                    .entry(String::from_utf8_lossy(key).into_owned())
                    .or_insert(entries);
            }
        }
    }

    dests
}

fn walk_name_tree(
    doc: &lopdf::Document,
    node: &Dictionary,
    depth: usize,
    dests: &mut HashMap<String, Vec<DestEntry>>,
) {
    if depth >= MAX_TREE_DEPTH {
        warn!("Name tree deeper than {MAX_TREE_DEPTH} levels, ignoring the rest");
        return;
    }

    if let Some(Object::Array(pairs)) = dict_entry(doc, node, b"Names") {
        for pair in pairs.chunks_exact(2) {
            let Some(Object::String(key, _)) = resolve(doc, &pair[0]) else {
                continue;
            };
            if let Some(entries) = named_dest_entries(doc, &pair[1]) {
                dests.entry(decode_text(key)).or_insert(entries);
            }
        }
    }

    if let Some(Object::Array(kids)) = dict_entry(doc, node, b"Kids") {
        for kid in kids {
            if let Some(kid) = resolve_dict(doc, kid) {
                walk_name_tree(doc, kid, depth + 1, dests);
            }
        }
    }
}
