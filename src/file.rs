//! File handles: `open`/`read`/`write`/`seek` layered on the block layer.
//!
//! A handle only ever holds an inode number and a byte position — it never
//! holds a `&mut ApeFileSystem`, so every I/O method takes the filesystem as
//! an explicit parameter instead of borrowing it for the handle's lifetime.

use crate::fs::ApeFileSystem;
use crate::inode::FLAG_FILE;
use crate::layout::{BLOCK_SIZE, INVALID_INODE};
use crate::path::{extract_directory, extract_filename};

/// How `ApeFile::open` should treat the target path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    /// Open an existing file, positioned at the start.
    Open,
    /// Open an existing file, positioned at its end.
    Append,
    /// Create a new file (and its directory entry); fails if it exists.
    Create,
}

/// Reference point for `ApeFile::seek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    Set,
    Cur,
    End,
}

/// A handle on an open file: an inode number and a cursor.
pub struct ApeFile {
    inode_num: u32,
    position: u32,
}

impl Default for ApeFile {
    fn default() -> Self {
        Self::closed()
    }
}

impl ApeFile {
    /// A handle in the closed state.
    pub fn closed() -> Self {
        Self {
            inode_num: INVALID_INODE,
            position: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.inode_num != INVALID_INODE
    }

    pub fn tell(&self) -> u32 {
        self.position
    }

    /// Re-reads the inode and returns its current byte size.
    pub fn size(&self, fs: &mut ApeFileSystem) -> Option<u32> {
        if !self.is_open() {
            return None;
        }
        Some(fs.inode_read(self.inode_num)?.size)
    }

    /// Opens `path` under `mode`.
    pub fn open(fs: &mut ApeFileSystem, path: &str, mode: FileMode) -> Option<Self> {
        match mode {
            FileMode::Open => {
                let inode = fs.file_inode_open(path)?;
                Some(Self {
                    inode_num: inode.num,
                    position: 0,
                })
            }
            FileMode::Append => {
                let inode = fs.file_inode_open(path)?;
                Some(Self {
                    inode_num: inode.num,
                    position: inode.size,
                })
            }
            FileMode::Create => {
                let mut inode = fs.inode_alloc()?;
                inode.flags = FLAG_FILE;
                if !fs.inode_write(&inode) {
                    return None;
                }
                let mut parent = fs.directory_open(&extract_directory(path))?;
                let name = extract_filename(path);
                if !fs.directory_add_entry(&mut parent, inode.num, FLAG_FILE, name) {
                    return None;
                }
                Some(Self {
                    inode_num: inode.num,
                    position: 0,
                })
            }
        }
    }

    /// Reads up to `buf.len()` bytes at the current position. No-op (returns
    /// `0`) if the handle is closed.
    pub fn read(&mut self, fs: &mut ApeFileSystem, buf: &mut [u8]) -> usize {
        if !self.is_open() {
            return 0;
        }
        let Some(inode) = fs.inode_read(self.inode_num) else {
            return 0;
        };

        let mut written = 0usize;
        while written < buf.len() && self.position < inode.size {
            let remaining_in_block = BLOCK_SIZE - (self.position as usize % BLOCK_SIZE);
            let remaining_in_file = (inode.size - self.position) as usize;
            let take = remaining_in_block.min(remaining_in_file).min(buf.len() - written);
            if take == 0 {
                break;
            }

            let logical = self.position / BLOCK_SIZE as u32;
            let Some(block) = fs.block_read_via_inode(&inode, logical) else {
                break;
            };
            let within = self.position as usize % BLOCK_SIZE;
            buf[written..written + take].copy_from_slice(&block.data[within..within + take]);

            written += take;
            self.position += take as u32;
        }
        written
    }

    /// Writes `buf` at the current position, growing the file as needed.
    /// No-op (returns `0`) if the handle is closed.
    pub fn write(&mut self, fs: &mut ApeFileSystem, buf: &[u8]) -> usize {
        if !self.is_open() {
            return 0;
        }
        let Some(mut inode) = fs.inode_read(self.inode_num) else {
            return 0;
        };

        let mut done = 0usize;
        while done < buf.len() {
            let logical = self.position / BLOCK_SIZE as u32;
            let mut block = if logical >= inode.blocks_count as u32 {
                match fs.block_alloc_via_inode(&mut inode) {
                    Some(b) => b,
                    None => break,
                }
            } else {
                match fs.block_read_via_inode(&inode, logical) {
                    Some(b) => b,
                    None => break,
                }
            };

            let within = self.position as usize % BLOCK_SIZE;
            let take = (BLOCK_SIZE - within).min(buf.len() - done);
            block.data[within..within + take].copy_from_slice(&buf[done..done + take]);
            if !fs.block_write(&block) {
                break;
            }

            done += take;
            self.position += take as u32;

            if self.position > inode.size {
                inode.size = self.position;
                if !fs.inode_write(&inode) {
                    break;
                }
            }
        }
        done
    }

    /// Repositions the cursor. Fails (leaving the position unchanged) if the
    /// requested offset would land outside `[0, inode.size)`.
    pub fn seek(&mut self, fs: &mut ApeFileSystem, mode: SeekMode, offset: i64) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(inode) = fs.inode_read(self.inode_num) else {
            return false;
        };
        let size = inode.size as i64;

        let target = match mode {
            SeekMode::Set => offset,
            SeekMode::Cur => self.position as i64 + offset,
            SeekMode::End => {
                if offset > 0 {
                    return false;
                }
                size + offset
            }
        };

        if target < 0 || target >= size {
            return false;
        }
        self.position = target as u32;
        true
    }

    /// Returns the handle to the closed state.
    pub fn close(&mut self) {
        self.inode_num = INVALID_INODE;
        self.position = 0;
    }
}
