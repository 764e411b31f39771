//! Byte-addressed random-access I/O over a single host file.
//!
//! Mirrors the way `mkfs`'s `Ext2Factory` drives a `std::fs::File` directly
//! with `seek`/`read_exact`/`write_all`, but collapses every I/O failure into
//! a `bool` instead of propagating `io::Result` — the core never surfaces an
//! exception channel (`spec.md` §7).

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A handle over a single host file, providing random-access byte I/O.
pub struct Image {
    file: Option<File>,
    good: bool,
}

impl Image {
    /// Opens an existing file for reading and writing.
    pub fn open_rw(path: &Path) -> Option<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path).ok()?;
        Some(Self {
            file: Some(file),
            good: true,
        })
    }

    /// Creates (or truncates) a file for reading and writing.
    pub fn create_trunc(path: &Path) -> Option<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .ok()?;
        Some(Self {
            file: Some(file),
            good: true,
        })
    }

    /// Closes the underlying host file handle.
    pub fn close(&mut self) {
        self.file = None;
    }

    /// Whether the last I/O operation (or the open itself) succeeded.
    pub fn good(&self) -> bool {
        self.good
    }

    /// Seeks to an absolute byte offset from the start of the file.
    pub fn seek(&mut self, offset: u64) -> bool {
        let Some(file) = self.file.as_mut() else {
            self.good = false;
            return false;
        };
        self.good = file.seek(SeekFrom::Start(offset)).is_ok();
        self.good
    }

    /// Reads exactly `buf.len()` bytes at the current position.
    pub fn read(&mut self, buf: &mut [u8]) -> bool {
        let Some(file) = self.file.as_mut() else {
            self.good = false;
            return false;
        };
        self.good = file.read_exact(buf).is_ok();
        self.good
    }

    /// Writes exactly `buf.len()` bytes at the current position.
    pub fn write(&mut self, buf: &[u8]) -> bool {
        let Some(file) = self.file.as_mut() else {
            self.good = false;
            return false;
        };
        self.good = file.write_all(buf).is_ok();
        self.good
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("apefs-image-test-{name}-{}", std::process::id()))
    }

    #[test]
    fn create_then_write_then_read_back() {
        let path = temp_path("rw");
        let mut img = Image::create_trunc(&path).expect("create");
        assert!(img.seek(0));
        assert!(img.write(b"hello"));
        assert!(img.seek(0));
        let mut buf = [0u8; 5];
        assert!(img.read(&mut buf));
        assert_eq!(&buf, b"hello");
        img.close();
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn open_rw_requires_existing_file() {
        let path = temp_path("missing");
        let _ = std::fs::remove_file(&path);
        assert!(Image::open_rw(&path).is_none());
    }

    #[test]
    fn read_past_end_fails() {
        let path = temp_path("short");
        let mut img = Image::create_trunc(&path).expect("create");
        assert!(img.write(b"ab"));
        assert!(img.seek(0));
        let mut buf = [0u8; 10];
        assert!(!img.read(&mut buf));
        img.close();
        let _ = std::fs::remove_file(&path);
    }
}
