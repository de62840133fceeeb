pub mod board;
pub mod merge;
pub mod ordering;
pub mod preview;
mod settings;
pub mod thumbnail;
mod types;
pub mod validation;

pub use board::{BoardEvent, MergeBoard, MergeJob, merged_notice};
pub use merge::{
    MERGED_FILE_NAME, MergeBuilder, MergeProgress, MergedDocument, load_source, merge_documents,
    merge_items, to_bytes,
};
pub use ordering::{Direction, ListOwner, OrderingStore, Ownership, SyncOutcome};
pub use preview::{
    CancelFlag, PreviewController, PreviewMode, PreviewOutcome, PreviewSession, PreviewSizing,
    render_pages,
};
pub use settings::*;
pub use thumbnail::{
    PageRenderer, RenderedPage, RetryPolicy, SharedThumbnails, ThumbnailOptions, ThumbnailState,
    ThumbnailStore, generate_thumbnail, render_thumbnail, target_size,
};
pub use types::*;
pub use validation::{DEFAULT_MAX_FILE_BYTES, PdfInfo, inspect_pdf, validate_source};
