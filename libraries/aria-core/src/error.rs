//! Core error types for Aria

use thiserror::Error;

/// Core error type for the ingestion pipeline
#[derive(Debug, Error)]
pub enum AriaError {
    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Format parsing errors (CUE/NFO/ID3)
    #[error("Parse error: {0}")]
    Parse(String),

    /// File conversion errors
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// External script/process errors
    #[error("Script error: {0}")]
    Script(String),

    /// Search provider errors
    #[error("Search error: {0}")]
    Search(String),

    /// Invalid file path
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// File or directory not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Plugin contract violation (directory path, plugin id, stage)
    #[error("Plugin contract violation in {plugin_id} at stage {stage}: {message}")]
    PluginContract {
        plugin_id: String,
        stage: String,
        message: String,
    },

    /// Processing was cancelled
    #[error("Processing cancelled")]
    Cancelled,

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl AriaError {
    /// Create a parse error
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create a conversion error
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    /// Create a script error
    pub fn script(msg: impl Into<String>) -> Self {
        Self::Script(msg.into())
    }

    /// Create a search error
    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    /// Create a not found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
