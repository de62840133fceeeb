//! All-pages preview with cooperative cancellation
//!
//! Only one preview session is live at a time. Pages render one after the
//! other; the cancel flag is checked before each page starts and after each
//! page finishes, so closing the preview lets an in-flight render complete
//! but never starts another.

use crate::thumbnail::{PageRenderer, RenderedPage};
use crate::types::{ItemId, MergeError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// How the overlay was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PreviewMode {
    /// Shown while the pointer rests on an item, closed when it leaves
    Hover,
    /// Stays open until closed explicitly
    #[default]
    Pinned,
}

/// Sizing rule for preview pages
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewSizing {
    pub viewport_fraction: f32,
    pub max_width: u32,
}

impl Default for PreviewSizing {
    fn default() -> Self {
        Self {
            viewport_fraction: 0.6,
            max_width: 900,
        }
    }
}

impl PreviewSizing {
    /// Page width for the given viewport width
    pub fn page_width(&self, viewport_width: f32) -> u32 {
        let scaled = (viewport_width.max(0.0) * self.viewport_fraction).round() as u32;
        scaled.clamp(1, self.max_width.max(1))
    }
}

/// Cancel flag shared between the controller and a render loop
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Handle to one open preview
#[derive(Debug, Clone)]
pub struct PreviewSession {
    pub session_id: u64,
    pub item_id: ItemId,
    pub mode: PreviewMode,
    pub cancel: CancelFlag,
}

/// Keeps at most one preview session open
#[derive(Debug, Default)]
pub struct PreviewController {
    current: Option<PreviewSession>,
    next_session: AtomicU64,
}

impl PreviewController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a preview, cancelling whichever one was open before
    pub fn open(&mut self, item_id: ItemId, mode: PreviewMode) -> PreviewSession {
        self.close();
        let session = PreviewSession {
            session_id: self.next_session.fetch_add(1, Ordering::SeqCst) + 1,
            item_id,
            mode,
            cancel: CancelFlag::new(),
        };
        self.current = Some(session.clone());
        session
    }

    /// Close the current preview. Returns the closed session, if any.
    pub fn close(&mut self) -> Option<PreviewSession> {
        let session = self.current.take()?;
        session.cancel.cancel();
        Some(session)
    }

    /// Close only if `session_id` is still the current session
    pub fn close_session(&mut self, session_id: u64) -> bool {
        if self.is_current(session_id) {
            self.close();
            true
        } else {
            false
        }
    }

    /// Close the preview if it belongs to `item_id`
    pub fn close_for_item(&mut self, item_id: ItemId) -> bool {
        if self.current.as_ref().is_some_and(|s| s.item_id == item_id) {
            self.close();
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<&PreviewSession> {
        self.current.as_ref()
    }

    pub fn is_current(&self, session_id: u64) -> bool {
        self.current
            .as_ref()
            .is_some_and(|s| s.session_id == session_id)
    }
}

/// How a preview render loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewOutcome {
    Completed { total_pages: usize },
    Cancelled { rendered: usize, total_pages: usize },
}

/// Render every page of `bytes` in order, reporting each finished page.
///
/// `on_page` receives the page and `(rendered, total)` progress. The loop
/// stops as soon as `cancel` is set.
pub async fn render_pages<F>(
    renderer: Arc<dyn PageRenderer>,
    bytes: Arc<[u8]>,
    width: u32,
    cancel: &CancelFlag,
    mut on_page: F,
) -> Result<PreviewOutcome>
where
    F: FnMut(RenderedPage, usize, usize),
{
    let mut rendered = 0;
    let mut total_pages = 1;
    let mut page_index = 0;

    while page_index < total_pages {
        if cancel.is_cancelled() {
            return Ok(PreviewOutcome::Cancelled {
                rendered,
                total_pages,
            });
        }

        let renderer = renderer.clone();
        let page_bytes = bytes.clone();
        let result = tokio::task::spawn_blocking(move || {
            renderer.render_page(&page_bytes, page_index, width)
        })
        .await
        .map_err(MergeError::from);

        // A closed session reports nothing, not even a failed page
        if cancel.is_cancelled() {
            return Ok(PreviewOutcome::Cancelled {
                rendered,
                total_pages,
            });
        }
        let page = result??;

        total_pages = page.page_count;
        rendered += 1;
        page_index += 1;
        on_page(page, rendered, total_pages);
    }

    Ok(PreviewOutcome::Completed { total_pages })
}
