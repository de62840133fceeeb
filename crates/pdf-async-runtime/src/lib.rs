use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::broadcast;

// Re-export types from library crates
pub use pdf_merge::{
    BoardEvent, BoardSettings, Direction, ItemId, ItemSummary, Notice, NoticeLevel, PreviewMode,
    ThumbnailState,
};

/// Commands sent from UI to worker
#[derive(Debug)]
pub enum PdfCommand {
    BoardAddFiles {
        paths: Vec<PathBuf>,
    },
    BoardRemove {
        id: ItemId,
    },
    BoardMove {
        id: ItemId,
        direction: Direction,
    },
    /// Sent continuously while a drag hovers over another item
    BoardReorder {
        dragged: ItemId,
        target: ItemId,
    },
    BoardClear,
    BoardRetryThumbnail {
        id: ItemId,
    },
    BoardMerge {
        output_path: PathBuf,
    },
    PreviewOpen {
        id: ItemId,
        mode: PreviewMode,
        viewport_width: f32,
    },
    /// Ignored unless `session_id` is still the open preview
    PreviewClose {
        session_id: u64,
    },
    SettingsChanged {
        settings: BoardSettings,
    },
}

/// Updates sent from worker to UI
#[derive(Debug, Clone)]
pub enum PdfUpdate {
    Progress {
        operation: String,
        current: usize,
        total: usize,
    },
    Board(BoardEvent),
    MergeComplete {
        path: PathBuf,
        page_count: usize,
    },
    /// The failure itself is reported as a board notice
    MergeFailed,
    PreviewOpened {
        session_id: u64,
        id: ItemId,
        mode: PreviewMode,
        name: String,
    },
    PreviewPageRendered {
        session_id: u64,
        page_index: usize,
        rendered: usize,
        total: usize,
        width: usize,
        height: usize,
        rgba_data: Vec<u8>,
    },
    PreviewClosed {
        session_id: u64,
    },
    Error {
        message: String,
    },
}

impl From<BoardEvent> for PdfUpdate {
    fn from(event: BoardEvent) -> Self {
        PdfUpdate::Board(event)
    }
}

/// Application-wide notifications passed between otherwise unrelated parts of the UI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Files picked outside the board (e.g. the toolbar upload button)
    FilesUploaded(Vec<PathBuf>),
    /// A control outside the board asked for a merge
    MergeRequested,
    MergeCompleted { path: PathBuf, page_count: usize },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BusError {
    #[error("No subscribers are listening")]
    NoSubscribers,
    #[error("Subscriber fell behind and missed {0} event(s)")]
    Lagged(u64),
    #[error("Event bus closed")]
    Closed,
}

/// Typed publish/subscribe channel.
///
/// Every subscriber sees each event published after it subscribed, at most
/// once. There is no acknowledgement and a slow subscriber loses the oldest
/// events once the buffer is full.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publish an event. Returns how many subscribers it reached.
    pub fn publish(&self, event: AppEvent) -> Result<usize, BusError> {
        self.sender.send(event).map_err(|_| BusError::NoSubscribers)
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}

pub struct Subscription {
    receiver: broadcast::Receiver<AppEvent>,
}

impl Subscription {
    pub async fn recv(&mut self) -> Result<AppEvent, BusError> {
        self.receiver.recv().await.map_err(|e| match e {
            broadcast::error::RecvError::Lagged(n) => BusError::Lagged(n),
            broadcast::error::RecvError::Closed => BusError::Closed,
        })
    }

    /// Non-blocking receive for polling from a UI frame.
    ///
    /// Lagged gaps are skipped; `None` means nothing is pending.
    pub fn try_recv(&mut self) -> Option<AppEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }
}
