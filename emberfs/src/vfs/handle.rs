//! One open file or directory cursor.
//!
//! A `Handle` exclusively owns its host descriptor and, for directories, an
//! iteration cursor; both are released on `close` and on drop. Existence,
//! kind and size are resolved once at construction and never re-polled —
//! only this handle's own reads, writes and seeks move `position`.
//!
//! Every operation is non-throwing: failures come back as `0`, `false` or
//! `None`, never as an error value.

use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};

use log::debug;

use super::error::VfsError;
use super::path as vpath;
use crate::render::{FormatSpec, Value, render};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
    Read,
    Write,
    Append,
}

impl Mode {
    /// Parse an fopen-style token: `w` means write-truncate, `a` append,
    /// anything else reads.
    pub fn from_token(token: &str) -> Mode {
        if token.contains('w') {
            Mode::Write
        } else if token.contains('a') {
            Mode::Append
        } else {
            Mode::Read
        }
    }

    pub fn writes(self) -> bool {
        !matches!(self, Mode::Read)
    }
}

#[derive(Debug)]
pub struct Handle {
    path: String,
    name: String,
    mode: Mode,
    is_directory: bool,
    exists: bool,
    size: u64,
    position: u64,
    file: Option<fs::File>,
    cursor: Option<fs::ReadDir>,
}

impl Handle {
    /// The unusable handle every failed open resolves to.
    pub(crate) fn absent() -> Self {
        Self {
            path: String::new(),
            name: String::new(),
            mode: Mode::Read,
            is_directory: false,
            exists: false,
            size: 0,
            position: 0,
            file: None,
            cursor: None,
        }
    }

    /// Bind a handle to an already-normalized absolute path. Directories get
    /// no stream; files are opened per `mode`, with write mode truncating and
    /// append mode starting at end-of-file.
    pub(crate) fn open_path(path: String, mode: Mode) -> Self {
        let name = vpath::file_name(&path).to_string();
        let meta = fs::metadata(&path).ok();
        let exists = meta.is_some();
        let is_directory = meta.as_ref().map(|m| m.is_dir()).unwrap_or(false);

        let mut handle = Self {
            path,
            name,
            mode,
            is_directory,
            exists,
            size: 0,
            position: 0,
            file: None,
            cursor: None,
        };
        if is_directory {
            return handle;
        }

        let mut opts = OpenOptions::new();
        match mode {
            Mode::Read => {
                opts.read(true);
            }
            Mode::Write => {
                opts.write(true).create(true).truncate(true);
            }
            Mode::Append => {
                opts.append(true).create(true);
            }
        }
        match opts.open(&handle.path) {
            Ok(file) => {
                handle.file = Some(file);
                match mode {
                    Mode::Read => handle.size = meta.map(|m| m.len()).unwrap_or(0),
                    // the descriptor just truncated whatever was there
                    Mode::Write => handle.size = 0,
                    Mode::Append => {
                        let len = meta.map(|m| m.len()).unwrap_or(0);
                        handle.size = len;
                        handle.position = len;
                    }
                }
            }
            Err(source) => {
                let err = VfsError::Open {
                    path: handle.path.clone(),
                    source,
                };
                debug!("{err}");
            }
        }
        handle
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute normalized path this handle is bound to.
    pub fn full_name(&self) -> &str {
        &self.path
    }

    pub fn is_directory(&self) -> bool {
        self.is_directory
    }

    /// Whether the entry existed when the handle was constructed.
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn is_open(&self) -> bool {
        self.file.is_some()
    }

    /// True while the stream is open and bytes remain before end-of-file.
    pub fn available(&self) -> bool {
        self.file.is_some() && self.position < self.size
    }

    /// Release the descriptor and any directory cursor. Idempotent; the
    /// handle stays a valid value object (queries keep answering) but
    /// read/write/seek become no-ops.
    pub fn close(&mut self) {
        self.file = None;
        self.cursor = None;
    }

    /// Read up to `buf.len()` bytes, returning how many landed. Short reads
    /// happen near end-of-stream; `0` means end-of-stream or a handle not
    /// open for reading.
    pub fn read(&mut self, buf: &mut [u8]) -> usize {
        match self.try_read(buf) {
            Ok(n) => n,
            Err(e) => {
                debug!("read {}: {e}", self.path);
                0
            }
        }
    }

    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, VfsError> {
        if self.mode.writes() {
            return Err(VfsError::BadStream);
        }
        let file = self.file.as_mut().ok_or(VfsError::BadStream)?;
        let n = file.read(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    /// Next byte, or `None` at end-of-stream.
    pub fn read_byte(&mut self) -> Option<u8> {
        let mut byte = [0u8; 1];
        (self.read(&mut byte) == 1).then_some(byte[0])
    }

    /// Write the whole buffer, returning how many bytes landed (`0` on any
    /// failure). Extends `size` when the cursor runs past it.
    pub fn write(&mut self, buf: &[u8]) -> usize {
        match self.try_write(buf) {
            Ok(n) => n,
            Err(e) => {
                debug!("write {}: {e}", self.path);
                0
            }
        }
    }

    fn try_write(&mut self, buf: &[u8]) -> Result<usize, VfsError> {
        if !self.mode.writes() {
            return Err(VfsError::BadStream);
        }
        let file = self.file.as_mut().ok_or(VfsError::BadStream)?;
        file.write_all(buf)?;
        self.position += buf.len() as u64;
        if self.position > self.size {
            self.size = self.position;
        }
        Ok(buf.len())
    }

    pub fn write_byte(&mut self, byte: u8) -> usize {
        self.write(&[byte])
    }

    /// Render a value with default formatting and write the bytes.
    pub fn print<'a, V: Into<Value<'a>>>(&mut self, value: V) -> usize {
        self.print_with(value, &FormatSpec::default())
    }

    pub fn print_with<'a, V: Into<Value<'a>>>(&mut self, value: V, spec: &FormatSpec) -> usize {
        let bytes = render(value.into(), spec);
        self.write(&bytes)
    }

    pub fn println<'a, V: Into<Value<'a>>>(&mut self, value: V) -> usize {
        self.print(value) + self.write(b"\n")
    }

    pub fn println_with<'a, V: Into<Value<'a>>>(&mut self, value: V, spec: &FormatSpec) -> usize {
        self.print_with(value, spec) + self.write(b"\n")
    }

    /// Reposition the read/write cursor. On success `position` takes the
    /// stream's reported offset.
    pub fn seek(&mut self, pos: SeekFrom) -> bool {
        match self.try_seek(pos) {
            Ok(_) => true,
            Err(e) => {
                debug!("seek {}: {e}", self.path);
                false
            }
        }
    }

    fn try_seek(&mut self, pos: SeekFrom) -> Result<u64, VfsError> {
        let file = self.file.as_mut().ok_or(VfsError::BadStream)?;
        let reached = file.seek(pos)?;
        self.position = reached;
        Ok(reached)
    }

    /// Advance the directory cursor and open the next child read-only.
    /// Returns `None` once entries are exhausted (the cursor is then dropped,
    /// so a later call restarts from the beginning) or when this handle is
    /// not a directory.
    pub fn open_next_file(&mut self) -> Option<Handle> {
        if !self.is_directory {
            return None;
        }
        if self.cursor.is_none() {
            match fs::read_dir(&self.path) {
                Ok(cursor) => self.cursor = Some(cursor),
                Err(e) => {
                    debug!("open_next_file {}: {e}", self.path);
                    return None;
                }
            }
        }
        while let Some(entry) = self.cursor.as_mut().and_then(|c| c.next()) {
            let Ok(entry) = entry else { continue };
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            // never surface the self/parent pseudo-entries
            if name == "." || name == ".." {
                continue;
            }
            let child = format!("{}/{}", self.path, name);
            return Some(Handle::open_path(child, Mode::Read));
        }
        self.cursor = None;
        None
    }

    /// Drop the cursor so the next `open_next_file` restarts iteration.
    pub fn rewind_directory(&mut self) {
        self.cursor = None;
    }
}

/// Formatted output without a variadic shim: `write!(handle, ...)` covers
/// what `printf` did. Delegates to the non-throwing `write`, so a closed
/// handle surfaces as `WriteZero` instead of panicking callers.
impl Write for Handle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        Ok(Handle::write(self, buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Radix;
    use crate::vfs::volume::{MountOptions, Volume};
    use tempfile::tempdir;

    fn mounted(root: &std::path::Path) -> Volume {
        let mut vol = Volume::new();
        assert!(vol.mount(&MountOptions::at(root.to_str().unwrap())));
        vol
    }

    fn read_all(vol: &Volume, path: &str) -> Vec<u8> {
        let mut file = vol.open(path, Mode::Read);
        let mut out = Vec::new();
        let mut buf = [0u8; 16];
        loop {
            let n = file.read(&mut buf);
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        out
    }

    #[test]
    fn mode_tokens() {
        assert_eq!(Mode::from_token("r"), Mode::Read);
        assert_eq!(Mode::from_token("w"), Mode::Write);
        assert_eq!(Mode::from_token("a"), Mode::Append);
        assert_eq!(Mode::from_token("r+w"), Mode::Write);
        assert_eq!(Mode::from_token(""), Mode::Read);
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        let mut out = vol.open("/x.txt", Mode::Write);
        assert!(out.is_open());
        assert_eq!(out.write(b"ab"), 2);
        assert_eq!(out.size(), 2);
        out.close();

        let mut input = vol.open("/x.txt", Mode::Read);
        assert_eq!(input.size(), 2);
        assert_eq!(input.name(), "x.txt");
        assert!(input.full_name().ends_with("/x.txt"));
        assert!(input.available());
        assert_eq!(input.read_byte(), Some(b'a'));
        assert_eq!(input.read_byte(), Some(b'b'));
        assert!(!input.available());
        assert_eq!(input.read_byte(), None);
    }

    #[test]
    fn size_tracks_the_furthest_write() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        let mut out = vol.open("/grow.bin", Mode::Write);
        assert_eq!(out.write(b"hello"), 5);
        assert_eq!(out.size(), 5);
        // rewriting earlier bytes must not shrink the tracked size
        assert!(out.seek(SeekFrom::Start(1)));
        assert_eq!(out.position(), 1);
        assert_eq!(out.write(b"EL"), 2);
        assert_eq!(out.size(), 5);
        assert_eq!(out.position(), 3);
        out.close();

        assert_eq!(read_all(&vol, "/grow.bin"), b"hELlo");
    }

    #[test]
    fn write_mode_truncates_existing_content() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        vol.open("/t.txt", Mode::Write).write(b"long content");
        let mut out = vol.open("/t.txt", Mode::Write);
        assert_eq!(out.size(), 0);
        out.write(b"ab");
        out.close();

        assert_eq!(read_all(&vol, "/t.txt"), b"ab");
    }

    #[test]
    fn append_starts_at_end_of_file() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        vol.open("/log.txt", Mode::Write).write(b"ab");
        let mut out = vol.open("/log.txt", Mode::Append);
        assert_eq!(out.size(), 2);
        assert_eq!(out.position(), 2);
        assert_eq!(out.write(b"cd"), 2);
        assert_eq!(out.size(), 4);
        out.close();

        assert_eq!(read_all(&vol, "/log.txt"), b"abcd");
    }

    #[test]
    fn seek_repositions_both_cursors() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        vol.open("/s.txt", Mode::Write).write(b"hello");
        let mut input = vol.open("/s.txt", Mode::Read);
        assert!(input.seek(SeekFrom::Start(1)));
        assert_eq!(input.read_byte(), Some(b'e'));
        assert!(input.seek(SeekFrom::Current(1)));
        assert_eq!(input.read_byte(), Some(b'l'));
        assert!(input.seek(SeekFrom::End(0)));
        assert_eq!(input.position(), 5);
        assert!(!input.available());
    }

    #[test]
    fn reading_a_write_handle_yields_nothing() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        let mut out = vol.open("/w.txt", Mode::Write);
        out.write(b"data");
        let mut buf = [0u8; 4];
        assert_eq!(out.read(&mut buf), 0);
        assert_eq!(out.read_byte(), None);
    }

    #[test]
    fn missing_file_opens_as_an_unusable_handle() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        let mut input = vol.open("/nope.txt", Mode::Read);
        assert!(!input.exists());
        assert!(!input.is_open());
        assert!(!input.available());
        let mut buf = [0u8; 4];
        assert_eq!(input.read(&mut buf), 0);
        assert_eq!(input.name(), "nope.txt");
    }

    #[test]
    fn closed_handle_stays_a_valid_value_object() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        let mut out = vol.open("/c.txt", Mode::Write);
        out.write(b"xy");
        out.close();
        out.close();

        assert_eq!(out.name(), "c.txt");
        assert_eq!(out.size(), 2);
        assert!(!out.is_open());
        assert_eq!(out.write(b"zz"), 0);
        assert!(!out.seek(SeekFrom::Start(0)));
        assert_eq!(read_all(&vol, "/c.txt"), b"xy");
    }

    #[test]
    fn print_family_renders_through_the_formatter() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        let mut out = vol.open("/fmt.txt", Mode::Write);
        out.print("id=");
        out.print_with(255u32, &FormatSpec::radix(Radix::Hex));
        out.write_byte(b' ');
        out.println(-3i32);
        out.println_with(1.5f64, &FormatSpec::precision(1));
        out.close();

        assert_eq!(read_all(&vol, "/fmt.txt"), b"id=ff -3\n1.5\n");
    }

    #[test]
    fn io_write_covers_formatted_output() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        let mut out = vol.open("/printf.txt", Mode::Write);
        write!(out, "temp={}C pressure={:.1}", 21, 1013.25f64).unwrap();
        out.close();

        assert_eq!(read_all(&vol, "/printf.txt"), b"temp=21C pressure=1013.2");
    }

    #[test]
    fn directory_handles_have_no_stream() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        vol.open("/d/a.txt", Mode::Write).write(b"1");
        let mut d = vol.open("/d", Mode::Read);
        assert!(d.is_directory());
        assert!(d.exists());
        assert!(!d.is_open());
        assert!(!d.available());
        assert_eq!(d.write(b"x"), 0);
        assert_eq!(d.read_byte(), None);
    }

    #[test]
    fn directory_iteration_exhausts_then_rewinds() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        for name in ["a.txt", "b.txt", "c.txt"] {
            vol.open(&format!("/d/{name}"), Mode::Write).write(b"x");
        }

        let mut d = vol.open("/d", Mode::Read);
        let mut seen = Vec::new();
        while let Some(child) = d.open_next_file() {
            assert!(child.exists());
            seen.push(child.name().to_string());
        }
        seen.sort();
        assert_eq!(seen, ["a.txt", "b.txt", "c.txt"]);

        // cursor was dropped on exhaustion; iteration restarts from scratch
        let mut second = 0;
        while d.open_next_file().is_some() {
            second += 1;
        }
        assert_eq!(second, 3);

        d.open_next_file();
        d.rewind_directory();
        let mut third = 0;
        while d.open_next_file().is_some() {
            third += 1;
        }
        assert_eq!(third, 3);
    }

    #[test]
    fn empty_directory_terminates_immediately() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        assert!(vol.mkdir("/empty"));
        let mut d = vol.open("/empty", Mode::Read);
        assert!(d.is_directory());
        assert!(d.open_next_file().is_none());
        assert!(d.open_next_file().is_none());
    }

    #[test]
    fn open_next_file_on_a_file_handle_is_absent() {
        let dir = tempdir().unwrap();
        let vol = mounted(dir.path());

        vol.open("/f.txt", Mode::Write).write(b"x");
        let mut f = vol.open("/f.txt", Mode::Read);
        assert!(f.open_next_file().is_none());
    }
}
