use pdf_async_runtime::{BoardEvent, ItemId, Notice, PdfUpdate, PreviewMode};
use pdf_merge::{
    DocumentItem, PageRenderer, PreviewController, PreviewOutcome, PreviewSizing, render_pages,
};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Worker-side preview state: the single open session and how to render it
pub struct PreviewState {
    pub controller: PreviewController,
    pub renderer: Arc<dyn PageRenderer>,
    pub sizing: PreviewSizing,
}

impl PreviewState {
    pub fn new(renderer: Arc<dyn PageRenderer>, sizing: PreviewSizing) -> Self {
        Self {
            controller: PreviewController::new(),
            renderer,
            sizing,
        }
    }
}

/// Open a preview for `item`, replacing any open one, and render its pages
/// in the background
pub fn handle_open(
    item: &DocumentItem,
    mode: PreviewMode,
    viewport_width: f32,
    state: &mut PreviewState,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    let name = item.name().to_string();
    let bytes = item.source.bytes.clone();

    if let Some(previous) = state.controller.current() {
        let _ = update_tx.send(PdfUpdate::PreviewClosed {
            session_id: previous.session_id,
        });
    }
    let session = state.controller.open(item.id, mode);
    let session_id = session.session_id;
    let _ = update_tx.send(PdfUpdate::PreviewOpened {
        session_id,
        id: item.id,
        mode,
        name: name.clone(),
    });

    let width = state.sizing.page_width(viewport_width);
    let renderer = state.renderer.clone();
    let update_tx = update_tx.clone();

    tokio::spawn(async move {
        let page_tx = update_tx.clone();
        let result = render_pages(
            renderer,
            bytes,
            width,
            &session.cancel,
            move |page, rendered, total| {
                let width = page.image.width() as usize;
                let height = page.image.height() as usize;
                let _ = page_tx.send(PdfUpdate::PreviewPageRendered {
                    session_id,
                    page_index: page.page_index,
                    rendered,
                    total,
                    width,
                    height,
                    rgba_data: page.image.into_raw(),
                });
            },
        )
        .await;

        match result {
            Ok(PreviewOutcome::Completed { total_pages }) => {
                log::debug!("Preview of {name} rendered {total_pages} page(s)");
            }
            Ok(PreviewOutcome::Cancelled {
                rendered,
                total_pages,
            }) => {
                log::debug!("Preview of {name} cancelled after {rendered}/{total_pages} page(s)");
            }
            Err(e) => {
                log::warn!("Preview of {name} failed: {e}");
                let _ = update_tx.send(PdfUpdate::Board(BoardEvent::Notice(Notice::error(
                    format!("Could not preview {name}: {e}"),
                ))));
            }
        }
    });
}

pub fn handle_close(
    session_id: u64,
    state: &mut PreviewState,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    if state.controller.close_session(session_id) {
        let _ = update_tx.send(PdfUpdate::PreviewClosed { session_id });
    }
}

/// Close the preview if it shows `id`; used when the item leaves the board
pub fn handle_item_gone(
    id: ItemId,
    state: &mut PreviewState,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    let Some(session_id) = state
        .controller
        .current()
        .filter(|session| session.item_id == id)
        .map(|session| session.session_id)
    else {
        return;
    };
    if state.controller.close_for_item(id) {
        let _ = update_tx.send(PdfUpdate::PreviewClosed { session_id });
    }
}

/// Close whatever is open; used when the board is cleared
pub fn handle_close_any(state: &mut PreviewState, update_tx: &mpsc::UnboundedSender<PdfUpdate>) {
    if let Some(session) = state.controller.close() {
        let _ = update_tx.send(PdfUpdate::PreviewClosed {
            session_id: session.session_id,
        });
    }
}
