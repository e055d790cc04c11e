//! Page render bridge - serves page navigation requests on a worker thread
//!
//! Requests carry 1-based page ordinals in; completions carry the same
//! ordinal out once the page is on the surface. A single worker owns the
//! renderer, so renders never overlap on the shared surface.

use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use flume::{Receiver, Sender};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use super::document::{DocumentError, PageRenderer, RenderPage};
use super::surface::Surface;
use super::types::Viewport;

/// What happens to page requests that arrive while a render is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RenderPolicy {
    /// Only the newest pending request is rendered
    #[default]
    Coalesce,
    /// Every request is rendered in arrival order
    Queue,
}

impl RenderPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderPolicy::Coalesce => "coalesce",
            RenderPolicy::Queue => "queue",
        }
    }
}

/// Request sent to the render worker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeRequest {
    /// Render the page at a 1-based ordinal
    Page(u32),
    /// Stop the worker
    Shutdown,
}

/// Scale that fits a page of `intrinsic_width` into `client_width`
#[must_use]
pub fn fit_width_scale(client_width: u32, intrinsic_width: f32) -> f32 {
    let scale = client_width as f32 / intrinsic_width;
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Render one page into `surface`, fitted to the surface's client width.
///
/// Returns the viewport the page was rendered with.
pub fn render_page_into<R: PageRenderer>(
    renderer: &R,
    surface: &mut Surface,
    ordinal: u32,
) -> Result<Viewport, DocumentError> {
    let page = renderer.page(ordinal)?;
    let intrinsic = page.viewport(1.0)?;
    let scale = fit_width_scale(surface.client_width(), intrinsic.width);
    let viewport = page.viewport(scale)?;

    let (width, height) = viewport.pixel_size();
    surface.resize_backing_store(width, height);
    page.render(surface, &viewport)?;

    Ok(viewport)
}

/// Handle to a running render worker
pub struct PageBridge {
    request_tx: Sender<BridgeRequest>,
    completion_rx: Receiver<u32>,
    surface: Arc<Mutex<Surface>>,
    worker: Option<JoinHandle<()>>,
}

impl PageBridge {
    /// Start the render worker.
    ///
    /// `open_renderer` runs on the worker thread, so the renderer itself
    /// does not need to be `Send`. If it fails the worker exits and the
    /// completion channel closes.
    pub fn spawn<R, F>(open_renderer: F, surface: Surface, policy: RenderPolicy) -> Self
    where
        R: PageRenderer + 'static,
        F: FnOnce() -> Result<R, DocumentError> + Send + 'static,
    {
        Self::start(open_renderer, surface, policy).0
    }

    /// Start the render worker and wait until the renderer has opened
    pub fn spawn_opened<R, F>(
        open_renderer: F,
        surface: Surface,
        policy: RenderPolicy,
    ) -> Result<Self, DocumentError>
    where
        R: PageRenderer + 'static,
        F: FnOnce() -> Result<R, DocumentError> + Send + 'static,
    {
        let (mut bridge, ready_rx) = Self::start(open_renderer, surface, policy);
        match ready_rx.recv() {
            Ok(Ok(())) => Ok(bridge),
            Ok(Err(detail)) => {
                bridge.shutdown();
                Err(DocumentError::Generic { detail })
            }
            Err(_) => {
                bridge.shutdown();
                Err(DocumentError::generic("Render worker exited before opening the document"))
            }
        }
    }

    fn start<R, F>(
        open_renderer: F,
        surface: Surface,
        policy: RenderPolicy,
    ) -> (Self, Receiver<Result<(), String>>)
    where
        R: PageRenderer + 'static,
        F: FnOnce() -> Result<R, DocumentError> + Send + 'static,
    {
        let (request_tx, request_rx) = flume::unbounded();
        let (completion_tx, completion_rx) = flume::unbounded();
        let (ready_tx, ready_rx) = flume::bounded(1);
        let surface = Arc::new(Mutex::new(surface));

        let worker_surface = Arc::clone(&surface);
        let worker = std::thread::spawn(move || match open_renderer() {
            Ok(renderer) => {
                let _ = ready_tx.send(Ok(()));
                render_worker(&renderer, request_rx, completion_tx, worker_surface, policy);
            }
            Err(e) => {
                error!("Render worker could not open document: {e}");
                let _ = ready_tx.send(Err(e.to_string()));
            }
        });

        let bridge = Self {
            request_tx,
            completion_rx,
            surface,
            worker: Some(worker),
        };
        (bridge, ready_rx)
    }

    /// Ask for a page to be rendered
    pub fn request_page(&self, ordinal: u32) {
        if self.request_tx.send(BridgeRequest::Page(ordinal)).is_err() {
            warn!("Render worker is gone, dropping request for page {ordinal}");
        }
    }

    /// Completion ordinals, one per successfully rendered page
    #[must_use]
    pub fn completions(&self) -> &Receiver<u32> {
        &self.completion_rx
    }

    /// Shared drawing surface
    #[must_use]
    pub fn surface(&self) -> Arc<Mutex<Surface>> {
        Arc::clone(&self.surface)
    }

    /// Container was resized; the next render fits the new width
    pub fn set_client_size(&self, width: u32, height: u32) {
        self.surface
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_client_size(width, height);
    }

    /// Stop the worker and wait for it to exit
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            let _ = self.request_tx.send(BridgeRequest::Shutdown);
            if worker.join().is_err() {
                error!("Render worker panicked");
            }
        }
    }
}

impl Drop for PageBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn render_worker<R: PageRenderer>(
    renderer: &R,
    requests: Receiver<BridgeRequest>,
    completions: Sender<u32>,
    surface: Arc<Mutex<Surface>>,
    policy: RenderPolicy,
) {
    debug!("Render worker started ({} policy)", policy.as_str());

    while let Ok(request) = requests.recv() {
        let BridgeRequest::Page(mut ordinal) = request else {
            break;
        };

        if policy == RenderPolicy::Coalesce {
            let mut shutdown = false;
            for pending in requests.try_iter() {
                match pending {
                    BridgeRequest::Page(next) => {
                        debug!("Page {ordinal} superseded by page {next}");
                        ordinal = next;
                    }
                    BridgeRequest::Shutdown => {
                        shutdown = true;
                        break;
                    }
                }
            }
            if shutdown {
                break;
            }
        }

        let result = {
            let mut surface = surface.lock().unwrap_or_else(PoisonError::into_inner);
            render_page_into(renderer, &mut surface, ordinal)
        };

        match result {
            Ok(viewport) => {
                debug!(
                    "Rendered page {ordinal} at scale {:.3} ({}x{})",
                    viewport.scale, viewport.width, viewport.height
                );
                if completions.send(ordinal).is_err() {
                    break;
                }
            }
            Err(e) => error!("Failed to render page {ordinal}: {e}"),
        }
    }

    info!("Render worker stopped");
}
