//! Reader mount - one open document with its TOC and render bridge

use std::sync::{Arc, Mutex};

use flume::Receiver;
use log::info;

use super::bridge::{PageBridge, RenderPolicy};
use super::document::{DocumentError, DocumentOutline, PageRenderer};
use super::outline::load_toc;
use super::surface::Surface;
use super::types::{ContainerSize, Link};

/// A mounted document.
///
/// The table of contents is built once at mount time. Dropping the mount
/// stops the render worker and closes both channels.
pub struct ReaderMount {
    toc: Vec<Link>,
    bridge: PageBridge,
}

impl ReaderMount {
    #[must_use]
    pub fn toc(&self) -> &[Link] {
        &self.toc
    }

    /// Request side of the render bridge
    #[must_use]
    pub fn bridge(&self) -> &PageBridge {
        &self.bridge
    }

    /// Navigate to a 1-based page ordinal
    pub fn request_page(&self, ordinal: u32) {
        self.bridge.request_page(ordinal);
    }

    #[must_use]
    pub fn completions(&self) -> &Receiver<u32> {
        self.bridge.completions()
    }

    #[must_use]
    pub fn surface(&self) -> Arc<Mutex<Surface>> {
        self.bridge.surface()
    }
}

/// Mount a PDF file into a container of the given size.
///
/// Fails only when the page renderer cannot open the file. A structure the
/// outline reader cannot parse leaves the mount without a TOC.
#[cfg(feature = "pdf")]
pub fn mount(
    container: ContainerSize,
    path: &std::path::Path,
    policy: RenderPolicy,
) -> anyhow::Result<ReaderMount> {
    use anyhow::Context;

    use super::render::MupdfRenderer;
    use super::structure::LopdfOutline;

    // MuPDF repairs broken cross-reference tables that lopdf rejects
    let structure = LopdfOutline::open(path).unwrap_or_else(|e| {
        log::warn!("Failed to read document structure of {path:?}, mounting without TOC: {e}");
        LopdfOutline::default()
    });
    let toc = load_toc(&structure);

    let render_path = path.to_path_buf();
    let bridge = PageBridge::spawn_opened(
        move || MupdfRenderer::open(&render_path),
        Surface::for_container(container),
        policy,
    )
    .with_context(|| format!("Failed to open {path:?}"))?;

    Ok(assemble(container, toc, bridge))
}

/// Mount with caller-supplied backends
pub fn mount_with<D, R, F>(
    container: ContainerSize,
    structure: &D,
    open_renderer: F,
    policy: RenderPolicy,
) -> ReaderMount
where
    D: DocumentOutline + ?Sized,
    R: PageRenderer + 'static,
    F: FnOnce() -> Result<R, DocumentError> + Send + 'static,
{
    let toc = load_toc(structure);
    let bridge = PageBridge::spawn(open_renderer, Surface::for_container(container), policy);
    assemble(container, toc, bridge)
}

fn assemble(container: ContainerSize, toc: Vec<Link>, bridge: PageBridge) -> ReaderMount {
    info!(
        "Mounted document: {} top-level TOC entries, container {}x{}",
        toc.len(),
        container.width,
        container.height
    );
    ReaderMount { toc, bridge }
}
