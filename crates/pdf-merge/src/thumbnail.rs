//! First-page thumbnails with bounded retry
//!
//! Thumbnail state is kept in three parallel maps keyed by item id (loading
//! flag, image, error). Each render attempt carries a generation number so a
//! forced retry can supersede an attempt that is still in flight; results from
//! a superseded attempt, or for an item that was removed meanwhile, are
//! dropped.

use crate::types::{ItemId, MergeError, Result};
use image::RgbaImage;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Rasterizes single pages of a PDF held in memory
pub trait PageRenderer: Send + Sync {
    /// Render `page_index` scaled to `target_width` pixels wide
    fn render_page(&self, bytes: &[u8], page_index: usize, target_width: u32)
    -> Result<RenderedPage>;
}

/// A rendered page together with the document's total page count
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub image: RgbaImage,
    pub page_index: usize,
    pub page_count: usize,
}

/// Output size for a page of `page_width` x `page_height` scaled to `target_width`
pub fn target_size(page_width: f32, page_height: f32, target_width: u32) -> (u32, u32) {
    if page_width <= 0.0 || page_height <= 0.0 {
        return (target_width, target_width);
    }
    let height = (target_width as f32 * page_height / page_width).round();
    (target_width, height.max(1.0) as u32)
}

/// Attempt count and linear backoff between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_unit: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_unit * attempt
    }
}

/// Observable state of one thumbnail
#[derive(Debug, Clone)]
pub enum ThumbnailState {
    Pending,
    Loading,
    Ready(Arc<RgbaImage>),
    Failed(String),
}

impl ThumbnailState {
    pub fn is_settled(&self) -> bool {
        matches!(self, ThumbnailState::Ready(_) | ThumbnailState::Failed(_))
    }
}

#[derive(Debug, Default)]
pub struct ThumbnailStore {
    loading: HashMap<ItemId, bool>,
    images: HashMap<ItemId, Option<Arc<RgbaImage>>>,
    errors: HashMap<ItemId, Option<String>>,
    page_counts: HashMap<ItemId, usize>,
    generations: HashMap<ItemId, u64>,
}

pub type SharedThumbnails = Arc<Mutex<ThumbnailStore>>;

pub fn shared_store() -> SharedThumbnails {
    Arc::new(Mutex::new(ThumbnailStore::default()))
}

/// Lock the store, recovering the data if a previous holder panicked
pub fn lock(store: &SharedThumbnails) -> MutexGuard<'_, ThumbnailStore> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ThumbnailStore {
    /// Create a pending record for `id` if none exists
    pub fn register(&mut self, id: ItemId) {
        self.loading.entry(id).or_insert(false);
        self.images.entry(id).or_insert(None);
        self.errors.entry(id).or_insert(None);
        self.generations.entry(id).or_insert(0);
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.loading.contains_key(&id)
    }

    pub fn is_loading(&self, id: ItemId) -> bool {
        self.loading.get(&id).copied().unwrap_or(false)
    }

    pub fn image(&self, id: ItemId) -> Option<Arc<RgbaImage>> {
        self.images.get(&id).cloned().flatten()
    }

    pub fn error(&self, id: ItemId) -> Option<&str> {
        self.errors.get(&id).and_then(|e| e.as_deref())
    }

    pub fn page_count(&self, id: ItemId) -> Option<usize> {
        self.page_counts.get(&id).copied()
    }

    pub fn state(&self, id: ItemId) -> Option<ThumbnailState> {
        if !self.contains(id) {
            return None;
        }
        let state = if self.is_loading(id) {
            ThumbnailState::Loading
        } else if let Some(image) = self.image(id) {
            ThumbnailState::Ready(image)
        } else if let Some(error) = self.error(id) {
            ThumbnailState::Failed(error.to_string())
        } else {
            ThumbnailState::Pending
        };
        Some(state)
    }

    /// Start an attempt for `id`.
    ///
    /// Returns the attempt's generation, or `None` when a render is already in
    /// flight and `force` is not set.
    pub fn begin(&mut self, id: ItemId, force: bool) -> Option<u64> {
        self.register(id);
        if self.is_loading(id) && !force {
            return None;
        }
        let generation = self.generations.entry(id).or_insert(0);
        *generation += 1;
        let generation = *generation;
        self.loading.insert(id, true);
        Some(generation)
    }

    pub fn is_current(&self, id: ItemId, generation: u64) -> bool {
        self.generations.get(&id) == Some(&generation)
    }

    /// Record the outcome of an attempt. Returns `false` if it was superseded
    /// or the item is gone, in which case nothing changes.
    pub fn finish(
        &mut self,
        id: ItemId,
        generation: u64,
        outcome: std::result::Result<RenderedPage, String>,
    ) -> bool {
        if !self.is_current(id, generation) {
            return false;
        }
        self.loading.insert(id, false);
        match outcome {
            Ok(page) => {
                self.images.insert(id, Some(Arc::new(page.image)));
                self.errors.insert(id, None);
                self.page_counts.insert(id, page.page_count);
            }
            Err(message) => {
                self.images.insert(id, None);
                self.errors.insert(id, Some(message));
                self.page_counts.remove(&id);
            }
        }
        true
    }

    pub fn remove(&mut self, id: ItemId) {
        self.loading.remove(&id);
        self.images.remove(&id);
        self.errors.remove(&id);
        self.page_counts.remove(&id);
        self.generations.remove(&id);
    }

    pub fn clear(&mut self) {
        self.loading.clear();
        self.images.clear();
        self.errors.clear();
        self.page_counts.clear();
        self.generations.clear();
    }

    pub fn len(&self) -> usize {
        self.loading.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loading.is_empty()
    }
}

/// Render parameters for thumbnails
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThumbnailOptions {
    pub width: u32,
    pub retry: RetryPolicy,
}

impl Default for ThumbnailOptions {
    fn default() -> Self {
        Self {
            width: 120,
            retry: RetryPolicy::default(),
        }
    }
}

/// Run the attempts for a generation obtained from [`ThumbnailStore::begin`].
///
/// Returns the settled state, or `None` if the attempt was superseded.
pub async fn render_thumbnail(
    store: &SharedThumbnails,
    renderer: Arc<dyn PageRenderer>,
    id: ItemId,
    generation: u64,
    bytes: Arc<[u8]>,
    options: ThumbnailOptions,
) -> Option<ThumbnailState> {
    let max_attempts = options.retry.max_attempts.max(1);
    let mut outcome = Err(String::new());

    for attempt in 1..=max_attempts {
        let renderer = renderer.clone();
        let bytes = bytes.clone();
        let width = options.width;
        let result = tokio::task::spawn_blocking(move || renderer.render_page(&bytes, 0, width))
            .await
            .map_err(MergeError::from)
            .and_then(|r| r);

        match result {
            Ok(page) => {
                outcome = Ok(page);
                break;
            }
            Err(e) => {
                log::warn!("Thumbnail attempt {attempt}/{max_attempts} for {id} failed: {e}");
                outcome = Err(e.to_string());
            }
        }

        if attempt < max_attempts {
            tokio::time::sleep(options.retry.delay_after(attempt)).await;
            if !lock(store).is_current(id, generation) {
                log::debug!("Thumbnail render for {id} superseded, stopping retries");
                return None;
            }
        }
    }

    let mut guard = lock(store);
    if guard.finish(id, generation, outcome) {
        guard.state(id)
    } else {
        None
    }
}

/// Begin and run a thumbnail render in one step
pub async fn generate_thumbnail(
    store: &SharedThumbnails,
    renderer: Arc<dyn PageRenderer>,
    id: ItemId,
    bytes: Arc<[u8]>,
    options: ThumbnailOptions,
    force: bool,
) -> Option<ThumbnailState> {
    let generation = lock(store).begin(id, force)?;
    render_thumbnail(store, renderer, id, generation, bytes, options).await
}
