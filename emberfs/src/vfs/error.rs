//! Internal failure taxonomy.
//!
//! Fallible internals return `Result<_, VfsError>`; the public volume and
//! handle surface resolves every variant locally into a `false`/`0`/`None`
//! outcome, so no error ever crosses it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VfsError {
    #[error("volume is not mounted")]
    NotMounted,

    #[error("no such path: {0}")]
    NotFound(String),

    #[error("{0} exists but is not a directory")]
    NotADirectory(String),

    #[error("failed to create parent directories for {path}")]
    ParentCreation {
        path: String,
        #[source]
        source: Box<VfsError>,
    },

    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("stream is closed or in a bad state")]
    BadStream,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
