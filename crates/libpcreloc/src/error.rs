//! Error types for libpcreloc.
//!
//! Normalizing text never fails; these errors come from the filesystem side
//! (reading, walking, rewriting) and from resolving variables.

use std::io;
use std::path::PathBuf;

/// Result type alias for libpcreloc operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while relocating `.pc` files.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An I/O error on a specific file or directory.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Walking a directory tree failed.
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// A `.pc` file is not valid UTF-8 and cannot be rewritten line by line.
    #[error("'{}' is not valid UTF-8", path.display())]
    NotUtf8 { path: PathBuf },

    /// A path cannot be embedded in a shell command.
    #[error("Path '{}' cannot be quoted for the shell", path.display())]
    UnquotablePath { path: PathBuf },

    /// A variable reference could not be resolved.
    #[error("Undefined variable '{variable}' referenced in '{context}'")]
    UndefinedVariable { variable: String, context: String },

    /// A circular variable reference was detected.
    #[error("Circular variable reference detected for '{variable}'")]
    CircularVariableReference { variable: String },
}

impl Error {
    /// Attach a path to an [`io::Error`].
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
