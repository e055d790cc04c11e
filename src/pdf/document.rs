//! Document capabilities the reader mounts on top of
//!
//! Structure queries (outline, named destinations, page tree) and page
//! rendering are split into separate traits: structure is shared across
//! threads while resolving the outline, rendering stays on the render
//! worker that opened the document.

use super::surface::Surface;
use super::types::{DestEntry, OutlineNode, PageRef, Viewport};

/// Errors from document backends
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("PDF structure: {0}")]
    Structure(#[from] lopdf::Error),

    #[error("no page object for reference {0}")]
    UnknownPageRef(PageRef),

    #[error("invalid page ordinal {0}")]
    InvalidPage(u32),

    #[error("{detail}")]
    Generic { detail: String },
}

impl DocumentError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Structural view of an open document
pub trait DocumentOutline: Send + Sync {
    /// Raw outline tree; `None` when the document has no outline
    fn outline(&self) -> Result<Option<Vec<OutlineNode>>, DocumentError>;

    /// Destination list registered under `name`; empty when unknown
    fn destination(&self, name: &str) -> Result<Vec<DestEntry>, DocumentError>;

    /// Zero-based index of the page object `page_ref` points at
    fn page_index(&self, page_ref: &PageRef) -> Result<usize, DocumentError>;
}

/// Source of renderable pages
pub trait PageRenderer {
    type Page: RenderPage;

    /// Load the page at a 1-based ordinal
    fn page(&self, ordinal: u32) -> Result<Self::Page, DocumentError>;
}

/// A loaded page
pub trait RenderPage {
    /// Page frame at the given scale; scale 1.0 is the intrinsic size
    fn viewport(&self, scale: f32) -> Result<Viewport, DocumentError>;

    /// Rasterize the page into the surface's backing store
    fn render(&self, surface: &mut Surface, viewport: &Viewport) -> Result<(), DocumentError>;
}
