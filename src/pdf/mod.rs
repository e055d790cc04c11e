//! PDF mounting infrastructure

pub mod bridge;
pub mod document;
pub mod mount;
pub mod outline;
#[cfg(feature = "pdf")]
pub mod render;
pub mod structure;
pub mod surface;
mod types;

pub use bridge::{BridgeRequest, PageBridge, RenderPolicy, fit_width_scale, render_page_into};
pub use document::{DocumentError, DocumentOutline, PageRenderer, RenderPage};
#[cfg(feature = "pdf")]
pub use mount::mount;
pub use mount::{ReaderMount, mount_with};
pub use outline::{flatten_toc, load_toc, outline_item_to_link, resolve_toc, select_page_ref};
#[cfg(feature = "pdf")]
pub use render::MupdfRenderer;
pub use structure::LopdfOutline;
pub use surface::Surface;
pub use types::*;

/// Default container size when none is configured
pub const DEFAULT_CONTAINER_WIDTH: u32 = 800;
pub const DEFAULT_CONTAINER_HEIGHT: u32 = 1000;
