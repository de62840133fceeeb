use crate::preview::PreviewSizing;
use crate::thumbnail::{RetryPolicy, ThumbnailOptions};
use crate::types::{MergeError, Result};
use crate::validation::DEFAULT_MAX_FILE_BYTES;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Light or dark appearance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ThumbnailSettings {
    pub width: u32,
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl Default for ThumbnailSettings {
    fn default() -> Self {
        Self {
            width: 120,
            max_attempts: 3,
            backoff_ms: 250,
        }
    }
}

impl ThumbnailSettings {
    pub fn options(&self) -> ThumbnailOptions {
        ThumbnailOptions {
            width: self.width,
            retry: RetryPolicy {
                max_attempts: self.max_attempts,
                backoff_unit: Duration::from_millis(self.backoff_ms),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PreviewSettings {
    pub viewport_fraction: f32,
    pub max_width: u32,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        let sizing = PreviewSizing::default();
        Self {
            viewport_fraction: sizing.viewport_fraction,
            max_width: sizing.max_width,
        }
    }
}

impl PreviewSettings {
    pub fn sizing(&self) -> PreviewSizing {
        PreviewSizing {
            viewport_fraction: self.viewport_fraction,
            max_width: self.max_width,
        }
    }
}

/// User preferences and tunables for the merge board
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BoardSettings {
    pub theme: Theme,
    pub thumbnail: ThumbnailSettings,
    pub preview: PreviewSettings,
    pub max_file_bytes: u64,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            theme: Theme::default(),
            thumbnail: ThumbnailSettings::default(),
            preview: PreviewSettings::default(),
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

impl BoardSettings {
    /// Load settings from JSON file
    #[cfg(feature = "serde")]
    pub async fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let settings: Self = serde_json::from_slice(&bytes)
            .map_err(|e| MergeError::Config(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to JSON file
    #[cfg(feature = "serde")]
    pub async fn save(&self, path: impl AsRef<std::path::Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| MergeError::Config(format!("Failed to serialize settings: {}", e)))?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.thumbnail.width == 0 {
            return Err(MergeError::Config(
                "Thumbnail width must be positive".to_string(),
            ));
        }
        if self.thumbnail.max_attempts == 0 {
            return Err(MergeError::Config(
                "Thumbnail attempts must be at least 1".to_string(),
            ));
        }
        if !(self.preview.viewport_fraction > 0.0 && self.preview.viewport_fraction <= 1.0) {
            return Err(MergeError::Config(format!(
                "Preview viewport fraction must be in (0, 1], got {}",
                self.preview.viewport_fraction
            )));
        }
        if self.preview.max_width == 0 {
            return Err(MergeError::Config(
                "Preview max width must be positive".to_string(),
            ));
        }
        if self.max_file_bytes == 0 {
            return Err(MergeError::Config(
                "Max file size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where preferences are persisted
pub trait PreferenceStore: Send + Sync {
    fn load(&self) -> Result<Option<BoardSettings>>;
    fn save(&self, settings: &BoardSettings) -> Result<()>;
}

/// Keeps preferences in memory only
#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    saved: Mutex<Option<BoardSettings>>,
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> Result<Option<BoardSettings>> {
        Ok(self
            .saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    fn save(&self, settings: &BoardSettings) -> Result<()> {
        *self
            .saved
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(settings.clone());
        Ok(())
    }
}

/// Persists preferences as a JSON file, written atomically via a temp file
#[derive(Debug, Clone)]
pub struct JsonPreferenceStore {
    path: PathBuf,
}

impl JsonPreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[cfg(feature = "serde")]
impl PreferenceStore for JsonPreferenceStore {
    fn load(&self) -> Result<Option<BoardSettings>> {
        let data = match std::fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let settings: BoardSettings = serde_json::from_slice(&data)
            .map_err(|e| MergeError::Config(format!("Failed to parse settings: {}", e)))?;
        settings.validate()?;
        Ok(Some(settings))
    }

    fn save(&self, settings: &BoardSettings) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(settings)
            .map_err(|e| MergeError::Config(format!("Failed to serialize settings: {}", e)))?;
        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}
