//! In-memory document fakes for tests

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::pdf::{
    DestEntry, DocumentError, DocumentOutline, OutlineNode, PageRef, PageRenderer, RenderPage,
    Surface, Viewport,
};

/// A call made against [`MemoryOutline`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutlineCall {
    Outline,
    Destination(String),
    PageIndex(PageRef),
}

/// Document structure held in memory, recording every query
#[derive(Default)]
pub struct MemoryOutline {
    outline: Option<Vec<OutlineNode>>,
    named: HashMap<String, Vec<DestEntry>>,
    pages: Vec<PageRef>,
    failing_names: HashSet<String>,
    failing_refs: HashSet<PageRef>,
    panicking_refs: HashSet<PageRef>,
    outline_fails: bool,
    calls: Mutex<Vec<OutlineCall>>,
}

impl MemoryOutline {
    pub fn new(outline: Option<Vec<OutlineNode>>) -> Self {
        Self {
            outline,
            ..Self::default()
        }
    }

    /// Page `i` (0-based) is object `page_ref(i)`
    pub fn with_pages(mut self, count: usize) -> Self {
        self.pages = (0..count).map(page_ref).collect();
        self
    }

    pub fn with_named(mut self, name: &str, entries: Vec<DestEntry>) -> Self {
        self.named.insert(name.to_string(), entries);
        self
    }

    pub fn fail_destination(mut self, name: &str) -> Self {
        self.failing_names.insert(name.to_string());
        self
    }

    pub fn fail_page_ref(mut self, page_ref: PageRef) -> Self {
        self.failing_refs.insert(page_ref);
        self
    }

    pub fn panic_on_page_ref(mut self, page_ref: PageRef) -> Self {
        self.panicking_refs.insert(page_ref);
        self
    }

    pub fn fail_outline(mut self) -> Self {
        self.outline_fails = true;
        self
    }

    pub fn calls(&self) -> Vec<OutlineCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: OutlineCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }
}

/// Object reference used for page `index` by [`MemoryOutline::with_pages`]
pub fn page_ref(index: usize) -> PageRef {
    PageRef::new(100 + index as u32 * 3, 0)
}

impl DocumentOutline for MemoryOutline {
    fn outline(&self) -> Result<Option<Vec<OutlineNode>>, DocumentError> {
        self.record(OutlineCall::Outline);
        if self.outline_fails {
            return Err(DocumentError::generic("outline unavailable"));
        }
        Ok(self.outline.clone())
    }

    fn destination(&self, name: &str) -> Result<Vec<DestEntry>, DocumentError> {
        self.record(OutlineCall::Destination(name.to_string()));
        if self.failing_names.contains(name) {
            return Err(DocumentError::generic(format!("broken destination {name}")));
        }
        Ok(self.named.get(name).cloned().unwrap_or_default())
    }

    fn page_index(&self, page_ref: &PageRef) -> Result<usize, DocumentError> {
        self.record(OutlineCall::PageIndex(*page_ref));
        if self.panicking_refs.contains(page_ref) {
            panic!("page tree corrupted at {page_ref}");
        }
        if self.failing_refs.contains(page_ref) {
            return Err(DocumentError::generic(format!("broken page {page_ref}")));
        }
        self.pages
            .iter()
            .position(|r| r == page_ref)
            .ok_or(DocumentError::UnknownPageRef(*page_ref))
    }
}

/// Renderer with fixed page sizes that paints each page a flat gray
#[derive(Clone, Default)]
pub struct FakeRenderer {
    pages: Vec<(f32, f32)>,
    failing: HashSet<u32>,
    delay: Duration,
    rendered: Arc<Mutex<Vec<u32>>>,
}

impl FakeRenderer {
    /// Intrinsic `(width, height)` per page, page 1 first
    pub fn new(pages: Vec<(f32, f32)>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn fail_on(mut self, ordinal: u32) -> Self {
        self.failing.insert(ordinal);
        self
    }

    /// Make every render take at least `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Ordinals rendered so far, shared with clones of this renderer
    pub fn render_log(&self) -> Arc<Mutex<Vec<u32>>> {
        Arc::clone(&self.rendered)
    }

    /// Gray level used for a page
    pub fn shade(ordinal: u32) -> u8 {
        (ordinal % 200) as u8 + 20
    }
}

impl PageRenderer for FakeRenderer {
    type Page = FakePage;

    fn page(&self, ordinal: u32) -> Result<FakePage, DocumentError> {
        let index = ordinal
            .checked_sub(1)
            .ok_or(DocumentError::InvalidPage(ordinal))?;
        let &(width, height) = self
            .pages
            .get(index as usize)
            .ok_or(DocumentError::InvalidPage(ordinal))?;

        Ok(FakePage {
            ordinal,
            width,
            height,
            fails: self.failing.contains(&ordinal),
            delay: self.delay,
            rendered: Arc::clone(&self.rendered),
        })
    }
}

pub struct FakePage {
    ordinal: u32,
    width: f32,
    height: f32,
    fails: bool,
    delay: Duration,
    rendered: Arc<Mutex<Vec<u32>>>,
}

impl RenderPage for FakePage {
    fn viewport(&self, scale: f32) -> Result<Viewport, DocumentError> {
        Ok(Viewport::from_page_size(self.width, self.height, scale))
    }

    fn render(&self, surface: &mut Surface, viewport: &Viewport) -> Result<(), DocumentError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fails {
            return Err(DocumentError::generic(format!(
                "cannot render page {}",
                self.ordinal
            )));
        }

        let (width, height) = viewport.pixel_size();
        let pixels = vec![
            FakeRenderer::shade(self.ordinal);
            width as usize * height as usize * Surface::BYTES_PER_PIXEL
        ];
        surface.blit_rgb(&pixels, width, height);

        self.rendered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(self.ordinal);
        Ok(())
    }
}
