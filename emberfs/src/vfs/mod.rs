//! Volume and handle layer
//!
//! Responsibilities:
//! - Bind a volume to a host directory root and expose path-qualified
//!   operations on it (open/exists/remove/rename/mkdir, usage accounting,
//!   recursive listing).
//! - Manage open file and directory handles: cursor position, cached
//!   metadata, directory iteration.
//!
//! Submodules:
//! - `volume`: mount lifecycle and path-qualified operations
//! - `handle`: one open file or directory cursor
//! - `path`: separator normalization and segment helpers
//! - `error`: internal failure taxonomy (never crosses the public surface)
//! - `demo`: minimal end-to-end walkthrough

pub mod demo;
pub mod error;
pub mod handle;
pub mod path;
pub mod volume;

pub use handle::{Handle, Mode};
pub use volume::{MountOptions, Volume};
