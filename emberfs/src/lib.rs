// Library crate for emberfs: a mountable volume that exposes flash-filesystem
// semantics (open/read/write/seek/rename/remove, directory iteration, usage
// accounting) over an ordinary host directory tree.

pub mod render;
pub mod vfs;
