//! Page rendering backed by MuPDF

use std::path::Path;

use mupdf::{Colorspace, Document, Matrix, Page};

use super::document::{DocumentError, PageRenderer, RenderPage};
use super::surface::Surface;
use super::types::Viewport;

/// Renders pages of an open MuPDF document.
///
/// MuPDF handles are not `Send`; open this on the thread that renders.
pub struct MupdfRenderer {
    doc: Document,
}

impl MupdfRenderer {
    pub fn open(path: &Path) -> Result<Self, DocumentError> {
        let doc = Document::open(path.to_string_lossy().as_ref())?;
        Ok(Self { doc })
    }

    pub fn page_count(&self) -> Result<u32, DocumentError> {
        Ok(self.doc.page_count()?.max(0) as u32)
    }
}

impl PageRenderer for MupdfRenderer {
    type Page = MupdfPage;

    fn page(&self, ordinal: u32) -> Result<MupdfPage, DocumentError> {
        if ordinal == 0 || ordinal > self.page_count()? {
            return Err(DocumentError::InvalidPage(ordinal));
        }
        let page = self.doc.load_page(ordinal as i32 - 1)?;
        Ok(MupdfPage { page })
    }
}

pub struct MupdfPage {
    page: Page,
}

impl RenderPage for MupdfPage {
    fn viewport(&self, scale: f32) -> Result<Viewport, DocumentError> {
        let bounds = self.page.bounds()?;
        Ok(Viewport::from_page_size(
            bounds.x1 - bounds.x0,
            bounds.y1 - bounds.y0,
            scale,
        ))
    }

    fn render(&self, surface: &mut Surface, viewport: &Viewport) -> Result<(), DocumentError> {
        let transform = Matrix::new_scale(viewport.scale, viewport.scale);
        let pixmap = self
            .page
            .to_pixmap(&transform, &Colorspace::device_rgb(), false, false)?;

        let channels = pixmap.n() as usize;
        if channels < Surface::BYTES_PER_PIXEL {
            return Err(DocumentError::generic(format!(
                "Unsupported pixmap format: {channels} channels"
            )));
        }

        surface.blit_samples(
            pixmap.samples(),
            pixmap.width(),
            pixmap.height(),
            pixmap.stride() as usize,
            channels,
        );
        Ok(())
    }
}
