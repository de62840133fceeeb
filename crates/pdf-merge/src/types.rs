use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MergeError {
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Config(String),
    #[error("Task join error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
    #[error("{name} is not a usable PDF: {reason}")]
    InvalidInput { name: String, reason: String },
    #[error("{name} is password-protected")]
    Encrypted { name: String },
    #[error("Failed to read {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: lopdf::Error,
    },
    #[error("Render failed: {0}")]
    Render(String),
    #[error("No documents to merge")]
    NoDocuments,
}

pub type Result<T> = std::result::Result<T, MergeError>;

/// Locally generated handle for one item on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A user-supplied file: name, bytes and the metadata used to compare lists
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Arc<[u8]>,
    pub size: u64,
    pub modified: Option<SystemTime>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            bytes,
            modified: None,
        }
    }

    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Read a file from disk, keeping its name and modification time
    pub async fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let modified = tokio::fs::metadata(path)
            .await
            .ok()
            .and_then(|m| m.modified().ok());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let mut file = Self::new(name, bytes);
        file.modified = modified;
        Ok(file)
    }

    /// Two files are the same entry when name, size and modification time match.
    /// Content is not hashed.
    pub fn same_identity(&self, other: &SourceFile) -> bool {
        self.name == other.name && self.size == other.size && self.modified == other.modified
    }
}

/// One file pending a merge
#[derive(Debug, Clone)]
pub struct DocumentItem {
    pub id: ItemId,
    pub source: SourceFile,
}

impl DocumentItem {
    pub fn name(&self) -> &str {
        &self.source.name
    }
}

/// Lightweight view of an item for UI listings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSummary {
    pub id: ItemId,
    pub name: String,
    pub size: u64,
}

impl From<&DocumentItem> for ItemSummary {
    fn from(item: &DocumentItem) -> Self {
        Self {
            id: item.id,
            name: item.source.name.clone(),
            size: item.source.size,
        }
    }
}

/// Severity of a user-facing notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Short message shown to the user as a toast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl From<&MergeError> for Notice {
    fn from(err: &MergeError) -> Self {
        match err {
            MergeError::Encrypted { name } => Notice::error(format!(
                "{name} is password-protected. Remove the password and try again."
            )),
            MergeError::InvalidInput { .. } => Notice::warning(err.to_string()),
            _ => Notice::error(err.to_string()),
        }
    }
}
