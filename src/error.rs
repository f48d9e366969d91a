use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, GlobError>;

#[derive(Error, Debug)]
pub enum GlobError {
    // Request setup
    #[error("directory not found: {}", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("invalid pattern: pattern must not be empty")]
    InvalidPattern(String),

    #[error("invalid pattern type: expected a string or a list of strings, got {0}")]
    InvalidPatternType(String),

    // Result finalization
    #[error("broken symbolic link: {}", .0.display())]
    BrokenSymbolicLink(PathBuf),

    #[error("cannot stat file: {}", .0.display())]
    CannotStatFile(PathBuf),

    // Strict filesystem helpers
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("file is not readable: {}", .0.display())]
    FileUnreadable(PathBuf),

    #[error("path is not a directory: {}", .0.display())]
    PathNotDirectory(PathBuf),

    // Traversal
    #[error("IO error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GlobError {
    /// The path this error occurred at, if applicable.
    /// Callers use this to present "skipped: <path>" without pattern matching on variants.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::DirectoryNotFound(p)
            | Self::BrokenSymbolicLink(p)
            | Self::CannotStatFile(p)
            | Self::FileNotFound(p)
            | Self::FileUnreadable(p)
            | Self::PathNotDirectory(p)
            | Self::Io { path: p, .. } => Some(p),
            _ => None,
        }
    }

    /// Whether the request can continue after this error.
    ///
    /// Traversal IO errors are recoverable when `suppress_errors` is set; the
    /// walk keeps going. Everything else terminates the current request.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
