//! The merge board: ordered files, their thumbnails and the merge trigger
//!
//! `MergeBoard` owns the [`OrderingStore`] and a shared [`ThumbnailStore`]
//! side table. Every change is reported as a [`BoardEvent`] on the channel
//! given at construction. Thumbnail renders run as independent tokio tasks.

use crate::merge::{MergeProgress, MergedDocument, merge_items};
use crate::ordering::{Direction, OrderingStore, Ownership, SyncOutcome};
use crate::settings::BoardSettings;
use crate::thumbnail::{
    PageRenderer, SharedThumbnails, ThumbnailOptions, ThumbnailState, lock, render_thumbnail,
    shared_store,
};
use crate::types::{DocumentItem, ItemId, ItemSummary, Notice, Result, SourceFile};
use crate::validation::validate_source;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

/// Changes published by the board
#[derive(Debug, Clone)]
pub enum BoardEvent {
    ItemsChanged(Vec<ItemSummary>),
    ThumbnailChanged {
        id: ItemId,
        state: ThumbnailState,
        page_count: Option<usize>,
    },
    Notice(Notice),
}

pub struct MergeBoard {
    store: OrderingStore,
    thumbnails: SharedThumbnails,
    renderer: Arc<dyn PageRenderer>,
    options: ThumbnailOptions,
    max_file_bytes: u64,
    events: mpsc::UnboundedSender<BoardEvent>,
    tasks: JoinSet<()>,
}

impl MergeBoard {
    pub fn new(
        ownership: Ownership,
        renderer: Arc<dyn PageRenderer>,
        settings: &BoardSettings,
        events: mpsc::UnboundedSender<BoardEvent>,
    ) -> Self {
        Self {
            store: OrderingStore::new(ownership),
            thumbnails: shared_store(),
            renderer,
            options: settings.thumbnail.options(),
            max_file_bytes: settings.max_file_bytes,
            events,
            tasks: JoinSet::new(),
        }
    }

    pub fn items(&self) -> &[DocumentItem] {
        self.store.items()
    }

    pub fn item(&self, id: ItemId) -> Option<&DocumentItem> {
        self.store.get(id)
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn summaries(&self) -> Vec<ItemSummary> {
        self.store.items().iter().map(ItemSummary::from).collect()
    }

    pub fn thumbnail_state(&self, id: ItemId) -> Option<ThumbnailState> {
        lock(&self.thumbnails).state(id)
    }

    pub fn page_count(&self, id: ItemId) -> Option<usize> {
        lock(&self.thumbnails).page_count(id)
    }

    pub fn thumbnail_count(&self) -> usize {
        lock(&self.thumbnails).len()
    }

    pub fn set_settings(&mut self, settings: &BoardSettings) {
        self.options = settings.thumbnail.options();
        self.max_file_bytes = settings.max_file_bytes;
    }

    fn emit(&self, event: BoardEvent) {
        let _ = self.events.send(event);
    }

    fn notify(&self, notice: Notice) {
        self.emit(BoardEvent::Notice(notice));
    }

    fn items_changed(&self) {
        self.emit(BoardEvent::ItemsChanged(self.summaries()));
    }

    /// Validate and append files, scheduling a thumbnail for each new item
    pub fn add_files(&mut self, files: Vec<SourceFile>) -> Vec<ItemId> {
        let mut accepted = Vec::with_capacity(files.len());
        for file in files {
            match validate_source(&file, self.max_file_bytes) {
                Ok(()) => accepted.push(file),
                Err(e) => {
                    log::warn!("Rejected input: {e}");
                    self.notify(Notice::from(&e));
                }
            }
        }
        if accepted.is_empty() {
            return Vec::new();
        }

        let count = accepted.len();
        let added = self.store.add_files(accepted);
        if self.store.is_delegated() {
            return added;
        }

        for &id in &added {
            self.schedule_thumbnail(id, false);
        }
        self.items_changed();
        self.notify(Notice::info(match count {
            1 => "Added 1 file".to_string(),
            n => format!("Added {n} files"),
        }));
        added
    }

    pub fn remove(&mut self, id: ItemId) -> bool {
        let Some(item) = self.store.remove(id) else {
            return false;
        };
        if !self.store.is_delegated() {
            lock(&self.thumbnails).remove(id);
            self.items_changed();
        }
        self.notify(Notice::info(format!("Removed {}", item.name())));
        true
    }

    pub fn move_item(&mut self, id: ItemId, direction: Direction) -> bool {
        let moved = self.store.move_item(id, direction);
        if moved && !self.store.is_delegated() {
            self.items_changed();
        }
        moved
    }

    pub fn reorder_during_drag(&mut self, dragged: ItemId, target: ItemId) -> bool {
        let moved = self.store.reorder_during_drag(dragged, target);
        if moved && !self.store.is_delegated() {
            self.items_changed();
        }
        moved
    }

    pub fn clear(&mut self) {
        let removed = self.store.clear();
        if self.store.is_delegated() {
            return;
        }
        lock(&self.thumbnails).clear();
        if !removed.is_empty() {
            self.items_changed();
        }
    }

    /// Adopt the list supplied by an external owner
    pub fn sync(&mut self, files: Vec<SourceFile>) -> SyncOutcome {
        let outcome = self.store.sync(files);
        if !outcome.changed {
            return outcome;
        }

        {
            let mut thumbnails = lock(&self.thumbnails);
            for id in &outcome.removed {
                thumbnails.remove(*id);
            }
        }
        for &id in &outcome.added {
            self.schedule_thumbnail(id, false);
        }
        self.items_changed();
        outcome
    }

    /// User-initiated retry: always starts a fresh attempt
    pub fn retry_thumbnail(&mut self, id: ItemId) -> bool {
        self.schedule_thumbnail(id, true)
    }

    fn schedule_thumbnail(&mut self, id: ItemId, force: bool) -> bool {
        while self.tasks.try_join_next().is_some() {}

        let Some(item) = self.store.get(id) else {
            return false;
        };
        let bytes = item.source.bytes.clone();

        let Some(generation) = lock(&self.thumbnails).begin(id, force) else {
            log::debug!("Thumbnail for {id} already rendering");
            return false;
        };
        self.emit(BoardEvent::ThumbnailChanged {
            id,
            state: ThumbnailState::Loading,
            page_count: None,
        });

        let store = self.thumbnails.clone();
        let renderer = self.renderer.clone();
        let options = self.options;
        let events = self.events.clone();

        self.tasks.spawn(async move {
            let Some(state) =
                render_thumbnail(&store, renderer, id, generation, bytes, options).await
            else {
                return;
            };
            let page_count = lock(&store).page_count(id);
            let _ = events.send(BoardEvent::ThumbnailChanged {
                id,
                state,
                page_count,
            });
        });
        true
    }

    /// Wait for every scheduled thumbnail render to settle
    pub async fn wait_for_thumbnails(&mut self) {
        while self.tasks.join_next().await.is_some() {}
    }

    /// Snapshot the current order for a merge.
    ///
    /// Returns `None` when the board is empty.
    pub fn merge_job(&self) -> Option<MergeJob> {
        if self.store.is_empty() {
            return None;
        }
        Some(MergeJob {
            items: self.store.items().to_vec(),
            events: self.events.clone(),
        })
    }
}

/// A merge of a fixed snapshot of items, detached from the board
pub struct MergeJob {
    items: Vec<DocumentItem>,
    events: mpsc::UnboundedSender<BoardEvent>,
}

impl MergeJob {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Run the merge. Only failures are announced here; success is announced
    /// by the caller once the output has been delivered.
    pub async fn run<F>(self, on_progress: F) -> Result<MergedDocument>
    where
        F: FnMut(MergeProgress),
    {
        merge_items(&self.items, on_progress).await.map_err(|e| {
            log::error!("Merge failed: {e}");
            let _ = self.events.send(BoardEvent::Notice(Notice::from(&e)));
            e
        })
    }
}

/// Success notice for a merge written to `output`
pub fn merged_notice(file_count: usize, page_count: usize, output: &Path) -> Notice {
    let files = match file_count {
        1 => "1 file".to_string(),
        n => format!("{n} files"),
    };
    let pages = match page_count {
        1 => "1 page".to_string(),
        n => format!("{n} pages"),
    };
    Notice::success(format!("Merged {files} into {} ({pages})", output.display()))
}
