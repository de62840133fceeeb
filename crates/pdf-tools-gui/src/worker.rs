use pdf_async_runtime::{BoardSettings, PdfCommand, PdfUpdate};
use pdf_merge::{MergeBoard, Ownership, PageRenderer};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::handlers;
use crate::handlers::preview::PreviewState;

/// Async worker task that owns the board and processes commands from the UI
pub async fn worker_task(
    mut command_rx: mpsc::UnboundedReceiver<PdfCommand>,
    update_tx: mpsc::UnboundedSender<PdfUpdate>,
    renderer: Arc<dyn PageRenderer>,
    settings: BoardSettings,
) {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let mut board = MergeBoard::new(Ownership::Local, renderer.clone(), &settings, event_tx);
    let mut previews = PreviewState::new(renderer, settings.preview.sizing());

    // Board events arrive from thumbnail tasks as well as from commands
    let forward_tx = update_tx.clone();
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if forward_tx.send(PdfUpdate::from(event)).is_err() {
                break;
            }
        }
    });

    while let Some(cmd) = command_rx.recv().await {
        process_command(cmd, &mut board, &mut previews, &mut command_rx, &update_tx).await;
    }
    log::debug!("Command channel closed, worker exiting");
}

async fn process_command(
    cmd: PdfCommand,
    board: &mut MergeBoard,
    previews: &mut PreviewState,
    command_rx: &mut mpsc::UnboundedReceiver<PdfCommand>,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    match cmd {
        PdfCommand::BoardAddFiles { paths } => {
            handlers::board::handle_add_files(paths, board, update_tx).await;
        }
        PdfCommand::BoardRemove { id } => {
            handlers::preview::handle_item_gone(id, previews, update_tx);
            board.remove(id);
        }
        PdfCommand::BoardMove { id, direction } => {
            board.move_item(id, direction);
        }
        PdfCommand::BoardReorder {
            mut dragged,
            mut target,
        } => {
            // A drag sends one command per hovered row; only the latest matters
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let PdfCommand::BoardReorder {
                    dragged: next_dragged,
                    target: next_target,
                } = next_cmd
                {
                    if next_dragged != dragged {
                        board.reorder_during_drag(dragged, target);
                    }
                    dragged = next_dragged;
                    target = next_target;
                } else {
                    board.reorder_during_drag(dragged, target);
                    Box::pin(process_command(
                        next_cmd, board, previews, command_rx, update_tx,
                    ))
                    .await;
                    return;
                }
            }
            board.reorder_during_drag(dragged, target);
        }
        PdfCommand::BoardClear => {
            handlers::preview::handle_close_any(previews, update_tx);
            board.clear();
        }
        PdfCommand::BoardRetryThumbnail { id } => {
            board.retry_thumbnail(id);
        }
        PdfCommand::BoardMerge { output_path } => {
            let job = board.merge_job();
            handlers::board::handle_merge(output_path, job, update_tx).await;
        }
        PdfCommand::PreviewOpen {
            mut id,
            mut mode,
            mut viewport_width,
        } => {
            // Sweeping the pointer across rows queues several opens; keep the newest
            while let Ok(next_cmd) = command_rx.try_recv() {
                if let PdfCommand::PreviewOpen {
                    id: next_id,
                    mode: next_mode,
                    viewport_width: next_width,
                } = next_cmd
                {
                    log::debug!("Discarding queued preview of {id}, using newer request");
                    id = next_id;
                    mode = next_mode;
                    viewport_width = next_width;
                } else {
                    Box::pin(process_command(
                        next_cmd, board, previews, command_rx, update_tx,
                    ))
                    .await;
                }
            }

            match board.item(id) {
                Some(item) => {
                    handlers::preview::handle_open(item, mode, viewport_width, previews, update_tx)
                }
                None => log::debug!("Preview requested for unknown item {id}"),
            }
        }
        PdfCommand::PreviewClose { session_id } => {
            handlers::preview::handle_close(session_id, previews, update_tx);
        }
        PdfCommand::SettingsChanged { settings } => {
            if let Err(e) = settings.validate() {
                let _ = update_tx.send(PdfUpdate::Error {
                    message: format!("Invalid settings: {e}"),
                });
                return;
            }
            board.set_settings(&settings);
            previews.sizing = settings.preview.sizing();
        }
    }
}
