//! Error types for papirus-apps

use std::path::PathBuf;

/// Convenience result alias for fallible catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Any error surfaced by the library.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Override(#[from] OverrideError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No application directories found")]
    NoApplicationDirectories,
}

/// A desktop file could not be read or understood.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Missing [Desktop Entry] group")]
    MissingDesktopEntryGroup,

    #[error("Invalid line {line}: {content}")]
    InvalidLine { line: usize, content: String },
}

/// The icon resolution backend is missing or failed.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("No icon theme directories found")]
    NoThemes,

    #[error("Icon lookup unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writing, reading or removing an override file failed.
#[derive(Debug, thiserror::Error)]
pub enum OverrideError {
    #[error("Override I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Existing override {path} is unreadable: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("Refusing to overwrite the launcher itself at {0}")]
    WouldOverwriteLauncher(PathBuf),
}

impl OverrideError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OverrideError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration file problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
