//! Unified error types for the feed curator.
//!
//! Error codes:
//! - SOURCE_001: Feed source unavailable
//! - HISTORY_001: Dedup history corrupt or unreadable
//! - STAGE_001-002: Enrichment stage errors
//! - PERSIST_001: Dedup history could not be written
//! - INPUT_001: Run input document unreadable

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Enrichment stage error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageErrorCode {
    /// STAGE_001: Named plugin is not registered
    Unresolved,
    /// STAGE_002: Plugin failed on a single item
    ItemFailed,
}

impl StageErrorCode {
    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unresolved => "STAGE_001",
            Self::ItemFailed => "STAGE_002",
        }
    }
}

/// Unified error type for the feed curator.
#[derive(Debug, Error)]
pub enum Error {
    /// The feed provider could not deliver the source document.
    #[error("[SOURCE_001] source unavailable: {url}: {message}")]
    SourceUnavailable { url: String, message: String },

    /// Dedup history exists but cannot be read or parsed.
    #[error("[HISTORY_001] history corrupt at {}: {message}", path.display())]
    HistoryCorrupt { path: PathBuf, message: String },

    /// Enrichment stage name has no registered plugin.
    #[error("[STAGE_001] no plugin registered for stage '{0}'")]
    StageUnresolved(String),

    /// A plugin failed on one item.
    #[error("[STAGE_002] stage '{stage}' failed on item {index}: {message}")]
    ItemTransformFailed {
        stage: String,
        index: usize,
        message: String,
    },

    /// Dedup history could not be written at run end.
    #[error("[PERSIST_001] failed to persist history to {}: {message}", path.display())]
    PersistFailed { path: PathBuf, message: String },

    /// A run input (items document, classification results) is unusable.
    #[error("[INPUT_001] invalid input {}: {message}", path.display())]
    InvalidInput { path: PathBuf, message: String },

    #[error("feed error: {0}")]
    Feed(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub fn source_unavailable(url: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::SourceUnavailable {
            url: url.into(),
            message: msg.into(),
        }
    }

    pub fn history_corrupt(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::HistoryCorrupt {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn item_failed(stage: impl Into<String>, index: usize, msg: impl Into<String>) -> Self {
        Self::ItemTransformFailed {
            stage: stage.into(),
            index,
            message: msg.into(),
        }
    }

    pub fn persist_failed(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::PersistFailed {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn invalid_input(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn feed(msg: impl Into<String>) -> Self {
        Self::Feed(msg.into())
    }

    /// Get the error code string.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SourceUnavailable { .. } => "SOURCE_001",
            Self::HistoryCorrupt { .. } => "HISTORY_001",
            Self::StageUnresolved(_) => StageErrorCode::Unresolved.code(),
            Self::ItemTransformFailed { .. } => StageErrorCode::ItemFailed.code(),
            Self::PersistFailed { .. } => "PERSIST_001",
            Self::InvalidInput { .. } => "INPUT_001",
            Self::Feed(_) => "FEED_001",
            Self::Io(_) => "IO_001",
            Self::Serialization(_) => "SERDE_001",
        }
    }

    /// Whether this error must terminate the run with a nonzero status.
    ///
    /// History, stage and item errors are recovered in place and only logged.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::HistoryCorrupt { .. } | Self::StageUnresolved(_) | Self::ItemTransformFailed { .. }
        )
    }
}
