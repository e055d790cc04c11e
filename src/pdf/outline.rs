//! Outline to table-of-contents conversion

use std::panic::{self, AssertUnwindSafe};

use log::{debug, error, warn};
use rayon::prelude::*;

use super::document::{DocumentError, DocumentOutline};
use super::types::{DestEntry, Destination, Link, OutlineNode, PageRef, TocEntry};

/// Fetch the document outline and convert it to a link tree.
///
/// Any failure at this level degrades to an empty table of contents.
pub fn load_toc<D: DocumentOutline + ?Sized>(doc: &D) -> Vec<Link> {
    match doc.outline() {
        Ok(outline) => resolve_toc(doc, outline.as_deref()),
        Err(e) => {
            error!("Failed to read document outline: {e}");
            Vec::new()
        }
    }
}

/// Convert a raw outline into a link tree with the same shape.
///
/// An absent outline yields an empty list. A panic anywhere in the pass
/// discards the partial tree.
pub fn resolve_toc<D: DocumentOutline + ?Sized>(
    doc: &D,
    outline: Option<&[OutlineNode]>,
) -> Vec<Link> {
    let Some(outline) = outline else {
        debug!("Document has no outline");
        return Vec::new();
    };

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        outline
            .par_iter()
            .map(|node| outline_item_to_link(node, doc))
            .collect::<Vec<_>>()
    }));

    match result {
        Ok(toc) => toc,
        Err(_) => {
            error!("Failed to convert outline to table of contents");
            Vec::new()
        }
    }
}

/// Convert one outline node and its subtree
pub fn outline_item_to_link<D: DocumentOutline + ?Sized>(node: &OutlineNode, doc: &D) -> Link {
    let href = node.dest.as_ref().and_then(|dest| match resolve_href(dest, doc) {
        Ok(href) => href,
        Err(e) => {
            warn!(
                "Could not resolve destination of outline item {:?}: {e}",
                node.title.as_deref().unwrap_or_default()
            );
            None
        }
    });

    let children = node.items.as_ref().map_or_else(Vec::new, |items| {
        items
            .par_iter()
            .map(|item| outline_item_to_link(item, doc))
            .collect()
    });

    Link {
        title: node.title.clone().unwrap_or_default(),
        href,
        children,
    }
}

fn resolve_href<D: DocumentOutline + ?Sized>(
    dest: &Destination,
    doc: &D,
) -> Result<Option<String>, DocumentError> {
    let page_ref = match dest {
        Destination::Named(name) if name.is_empty() => None,
        Destination::Named(name) => select_page_ref(&doc.destination(name)?),
        Destination::Direct(entries) => select_page_ref(entries),
    };

    match page_ref {
        Some(page_ref) => Ok(Some(doc.page_index(&page_ref)?.to_string())),
        None => Ok(None),
    }
}

/// Pick the page reference from a destination list.
///
/// The last well-formed reference wins; entries after a placeholder
/// reference are treated as corrections.
#[must_use]
pub fn select_page_ref(entries: &[DestEntry]) -> Option<PageRef> {
    entries.iter().rev().find_map(DestEntry::page_ref)
}

/// Flatten a link tree depth-first into display rows
#[must_use]
pub fn flatten_toc(toc: &[Link]) -> Vec<TocEntry> {
    let mut entries = Vec::new();
    flatten_links(toc, 0, &mut entries);
    entries
}

fn flatten_links(links: &[Link], level: usize, entries: &mut Vec<TocEntry>) {
    for link in links {
        entries.push(TocEntry {
            title: link.title.clone(),
            level,
            page: link.page_index(),
        });
        if !link.children.is_empty() {
            flatten_links(&link.children, level + 1, entries);
        }
    }
}
