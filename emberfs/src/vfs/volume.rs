//! Mount lifecycle and path-qualified operations.
//!
//! A `Volume` binds to a host directory root and exposes the flash-filesystem
//! contract over it: open with parent auto-creation, exists/remove/rename,
//! recursive mkdir/rmdir, usage accounting against a fixed emulated capacity,
//! and eager depth-first listing. Every operation gates on the mounted flag
//! and reports failure by return value, never by error.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::error::VfsError;
use super::handle::{Handle, Mode};
use super::path as vpath;

/// Nominal capacity reported by `free_bytes`, independent of real host free
/// space. Models a small flash partition.
pub const EMULATED_CAPACITY_BYTES: u64 = 1024 * 1024;

pub const DEFAULT_ROOT: &str = "./emberfs_data";

/// Mount-time settings. Deserializes from JSON with every field optional.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MountOptions {
    /// Host directory the volume root maps to.
    pub root: String,
    /// Fall back to a destructive `format` when root creation fails.
    pub format_on_fail: bool,
}

impl Default for MountOptions {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            format_on_fail: false,
        }
    }
}

impl MountOptions {
    pub fn at<P: Into<String>>(root: P) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    pub fn format_on_fail(mut self, yes: bool) -> Self {
        self.format_on_fail = yes;
        self
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// A mountable volume over a host directory tree. One exclusive owner per
/// volume; operations run synchronously on the caller's thread.
#[derive(Debug)]
pub struct Volume {
    root: String,
    mounted: bool,
}

impl Volume {
    pub fn new() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
            mounted: false,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Host directory this volume is (or would be) rooted at.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Bind to `opts.root`, creating the directory chain if absent. No data
    /// is touched on a bare mount; the destructive fallback only runs when
    /// `opts.format_on_fail` is set and creation failed.
    pub fn mount(&mut self, opts: &MountOptions) -> bool {
        if !opts.root.is_empty() {
            self.root = vpath::normalize(&opts.root);
        }
        debug!("mounting volume at {}", self.root);
        if let Err(e) = create_dir_chain(&self.root) {
            warn!("mount at {} failed: {e}", self.root);
            if opts.format_on_fail && self.wipe_and_recreate() {
                self.mounted = true;
                return true;
            }
            return false;
        }
        self.mounted = true;
        true
    }

    /// Clears `mounted`. Handles already open keep their own descriptors and
    /// continue to work; new volume operations fail until re-mounted.
    pub fn unmount(&mut self) {
        debug!("unmounting volume at {}", self.root);
        self.mounted = false;
    }

    /// Destructive reset: recursively deletes everything under the root,
    /// then recreates the empty root directory. The mounted state is left as
    /// it was — formatting never substitutes for an explicit `mount`.
    pub fn format(&mut self) -> bool {
        debug!("formatting volume at {}", self.root);
        self.wipe_and_recreate()
    }

    fn wipe_and_recreate(&self) -> bool {
        if Path::new(&self.root).exists() {
            if let Err(e) = remove_recursive(Path::new(&self.root)) {
                warn!("format: failed to clear {}: {e}", self.root);
                return false;
            }
        }
        match fs::create_dir(&self.root) {
            Ok(()) => true,
            // lost a recreation race, the directory is back already
            Err(e) if e.kind() == ErrorKind::AlreadyExists => true,
            Err(e) => {
                warn!("format: failed to recreate {}: {e}", self.root);
                false
            }
        }
    }

    /// Root-relative path to absolute normalized host path.
    fn resolve(&self, path: &str) -> String {
        vpath::normalize(&format!("{}/{}", self.root, path))
    }

    /// Open `path` in `mode`. Writing modes create the parent directory
    /// chain first. Failures (not mounted, parent creation) come back as an
    /// absent handle, unusable for I/O.
    pub fn open(&self, path: &str, mode: Mode) -> Handle {
        match self.try_open(path, mode) {
            Ok(handle) => handle,
            Err(e) => {
                debug!("open {path}: {e}");
                Handle::absent()
            }
        }
    }

    fn try_open(&self, path: &str, mode: Mode) -> Result<Handle, VfsError> {
        if !self.mounted {
            return Err(VfsError::NotMounted);
        }
        let full = self.resolve(path);
        if mode.writes() {
            if let Some(dir) = vpath::parent(&full) {
                create_dir_chain(dir).map_err(|e| VfsError::ParentCreation {
                    path: full.clone(),
                    source: Box::new(e),
                })?;
            }
        }
        Ok(Handle::open_path(full, mode))
    }

    pub fn exists(&self, path: &str) -> bool {
        if !self.mounted {
            return false;
        }
        Path::new(&self.resolve(path)).exists()
    }

    /// Remove a file, or a directory with all its descendants. `false` when
    /// the path never existed.
    pub fn remove(&self, path: &str) -> bool {
        match self.try_remove(path) {
            Ok(()) => true,
            Err(e) => {
                debug!("remove {path}: {e}");
                false
            }
        }
    }

    fn try_remove(&self, path: &str) -> Result<(), VfsError> {
        if !self.mounted {
            return Err(VfsError::NotMounted);
        }
        let full = self.resolve(path);
        if !Path::new(&full).exists() {
            return Err(VfsError::NotFound(full));
        }
        remove_recursive(Path::new(&full))
    }

    /// Atomic move; the destination's parent chain is created first. `false`
    /// when the source is missing — no partial side effects in that case.
    pub fn rename(&self, from: &str, to: &str) -> bool {
        match self.try_rename(from, to) {
            Ok(()) => true,
            Err(e) => {
                debug!("rename {from} -> {to}: {e}");
                false
            }
        }
    }

    fn try_rename(&self, from: &str, to: &str) -> Result<(), VfsError> {
        if !self.mounted {
            return Err(VfsError::NotMounted);
        }
        let from_full = self.resolve(from);
        let to_full = self.resolve(to);
        if !Path::new(&from_full).exists() {
            return Err(VfsError::NotFound(from_full));
        }
        if let Some(dir) = vpath::parent(&to_full) {
            create_dir_chain(dir)?;
        }
        fs::rename(&from_full, &to_full)?;
        Ok(())
    }

    /// Recursive directory creation; existing directories along the chain
    /// count as success.
    pub fn mkdir(&self, path: &str) -> bool {
        if !self.mounted {
            return false;
        }
        let full = self.resolve(path);
        match create_dir_chain(&full) {
            Ok(()) => true,
            Err(e) => {
                debug!("mkdir {path}: {e}");
                false
            }
        }
    }

    /// Full delete, same semantics as `remove`.
    pub fn rmdir(&self, path: &str) -> bool {
        self.remove(path)
    }

    /// Sum of regular-file sizes under the root; directories contribute 0.
    pub fn total_bytes(&self) -> u64 {
        if !self.mounted {
            return 0;
        }
        dir_size(Path::new(&self.root))
    }

    pub fn used_bytes(&self) -> u64 {
        self.total_bytes()
    }

    /// Emulated figure: fixed nominal capacity minus used, floored at 0.
    pub fn free_bytes(&self) -> u64 {
        EMULATED_CAPACITY_BYTES.saturating_sub(self.used_bytes())
    }

    /// Every file and directory under the root, depth-first, as paths
    /// relative to the root with the leading separator retained. Eagerly
    /// materialized; entry order within a directory is host-defined.
    pub fn list_files(&self) -> Vec<String> {
        let mut entries = Vec::new();
        if !self.mounted {
            return entries;
        }
        collect_entries(&self.root, &self.root, &mut entries);
        entries
    }
}

impl Default for Volume {
    fn default() -> Self {
        Self::new()
    }
}

/// Segment-by-segment directory creation: every ancestor is checked or
/// created before any descendant, an existing directory counts as success
/// and an existing non-directory fails the whole chain.
fn create_dir_chain(path: &str) -> Result<(), VfsError> {
    if path.is_empty() || path == "/" {
        return Ok(());
    }
    let mut prefix = String::with_capacity(path.len());
    for segment in path.split('/') {
        if segment.is_empty() {
            if prefix.is_empty() {
                prefix.push('/');
            }
            continue;
        }
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        prefix.push_str(segment);
        ensure_dir(&prefix)?;
    }
    Ok(())
}

fn ensure_dir(prefix: &str) -> Result<(), VfsError> {
    match fs::metadata(prefix) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(VfsError::NotADirectory(prefix.to_string())),
        Err(_) => match fs::create_dir(prefix) {
            Ok(()) => Ok(()),
            // concurrent creation race: whoever won made it for us
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(VfsError::Io(e)),
        },
    }
}

/// Recursive deletion: files are unlinked, directories have their children
/// deleted first and are then removed themselves (an empty directory is the
/// base case).
fn remove_recursive(path: &Path) -> Result<(), VfsError> {
    let meta =
        fs::metadata(path).map_err(|_| VfsError::NotFound(path.display().to_string()))?;
    if !meta.is_dir() {
        fs::remove_file(path)?;
        return Ok(());
    }
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        remove_recursive(&entry.path())?;
    }
    fs::remove_dir(path)?;
    Ok(())
}

fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    let mut total = 0;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else { continue };
        if meta.is_dir() {
            total += dir_size(&entry.path());
        } else {
            total += meta.len();
        }
    }
    total
}

fn collect_entries(root: &str, dir: &str, out: &mut Vec<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        let full = format!("{dir}/{name}");
        out.push(full[root.len()..].to_string());
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            collect_entries(root, &full, out);
        }
    }
}
