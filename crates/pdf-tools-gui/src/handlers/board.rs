use pdf_async_runtime::{BoardEvent, Notice, PdfUpdate};
use pdf_merge::{MergeBoard, MergeJob, MergeProgress, SourceFile, merged_notice};
use std::path::PathBuf;
use tokio::sync::mpsc;

/// Read the picked files and hand them to the board, which validates them
pub async fn handle_add_files(
    paths: Vec<PathBuf>,
    board: &mut MergeBoard,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match SourceFile::read(&path).await {
            Ok(file) => files.push(file),
            Err(e) => {
                log::warn!("Failed to read {}: {}", path.display(), e);
                let _ = update_tx.send(PdfUpdate::Board(BoardEvent::Notice(Notice::error(
                    format!("Could not read {}", path.display()),
                ))));
            }
        }
    }

    if !files.is_empty() {
        board.add_files(files);
    }
}

/// Merge a snapshot of the board order and write the result to `output_path`
pub async fn handle_merge(
    output_path: PathBuf,
    job: Option<MergeJob>,
    update_tx: &mpsc::UnboundedSender<PdfUpdate>,
) {
    let Some(job) = job else {
        let _ = update_tx.send(PdfUpdate::Board(BoardEvent::Notice(Notice::warning(
            "Add at least one PDF before merging",
        ))));
        let _ = update_tx.send(PdfUpdate::MergeFailed);
        return;
    };

    let total = job.len();
    let _ = update_tx.send(PdfUpdate::Progress {
        operation: "Merging...".to_string(),
        current: 0,
        total,
    });

    let progress_tx = update_tx.clone();
    let result = job
        .run(move |progress: MergeProgress| {
            let _ = progress_tx.send(PdfUpdate::Progress {
                operation: format!("Merged {}", progress.name),
                current: progress.current,
                total: progress.total,
            });
        })
        .await;

    let Ok(merged) = result else {
        let _ = update_tx.send(PdfUpdate::MergeFailed);
        return;
    };

    match merged.write_to(&output_path).await {
        Ok(()) => {
            log::info!("Wrote {}", output_path.display());
            let _ = update_tx.send(PdfUpdate::Board(BoardEvent::Notice(merged_notice(
                total,
                merged.page_count,
                &output_path,
            ))));
            let _ = update_tx.send(PdfUpdate::MergeComplete {
                path: output_path,
                page_count: merged.page_count,
            });
        }
        Err(e) => {
            log::error!("Failed to write {}: {}", output_path.display(), e);
            let _ = update_tx.send(PdfUpdate::Error {
                message: format!("Failed to write {}: {}", output_path.display(), e),
            });
        }
    }
}
