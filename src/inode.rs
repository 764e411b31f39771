//! Inode records: the fixed-size disk layout plus the inode-bitmap allocator.
//!
//! Per `spec.md` §9, the disk record is kept distinct from any richer
//! in-memory wrapper — there isn't a variable-length part for inodes (that's
//! `directory::DirEntry`'s job), but we still go through explicit
//! `encode`/`decode` rather than a raw byte-for-byte struct cast, the way the
//! teacher's `mkfs` does for `Superblock`/`INode` (just little-endian instead
//! of a native `#[repr(C, packed)]` dump).

use crate::fs::ApeFileSystem;
use crate::layout::{DIRECT_POINTERS, INODE_RECORD_SIZE, INVALID_BLOCK, INVALID_INODE};

pub const FLAG_FILE: u8 = 1;
pub const FLAG_DIRECTORY: u8 = 2;

/// An inode: a file or directory's metadata and block pointer table.
///
/// Pointers `0..8` are direct, `8` is the single-indirect block, `9` is the
/// double-indirect block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub num: u32,
    pub flags: u8,
    pub size: u32,
    pub blocks_count: u16,
    pub pointers: [u32; 10],
}

impl Inode {
    pub fn is_file(&self) -> bool {
        self.flags & FLAG_FILE != 0
    }

    pub fn is_directory(&self) -> bool {
        self.flags & FLAG_DIRECTORY != 0
    }

    pub(crate) fn single_indirect(&self) -> u32 {
        self.pointers[DIRECT_POINTERS]
    }

    pub(crate) fn double_indirect(&self) -> u32 {
        self.pointers[DIRECT_POINTERS + 1]
    }

    pub fn encode(&self) -> [u8; INODE_RECORD_SIZE] {
        let mut buf = [0u8; INODE_RECORD_SIZE];
        buf[0..4].copy_from_slice(&self.num.to_le_bytes());
        buf[4] = self.flags;
        buf[5..9].copy_from_slice(&self.size.to_le_bytes());
        buf[9..11].copy_from_slice(&self.blocks_count.to_le_bytes());
        for (i, ptr) in self.pointers.iter().enumerate() {
            let off = 11 + i * 4;
            buf[off..off + 4].copy_from_slice(&ptr.to_le_bytes());
        }
        buf
    }

    pub fn decode(buf: &[u8]) -> Self {
        let num = u32::from_le_bytes(buf[0..4].try_into().unwrap());
        let flags = buf[4];
        let size = u32::from_le_bytes(buf[5..9].try_into().unwrap());
        let blocks_count = u16::from_le_bytes(buf[9..11].try_into().unwrap());
        let mut pointers = [INVALID_BLOCK; 10];
        for (i, ptr) in pointers.iter_mut().enumerate() {
            let off = 11 + i * 4;
            *ptr = u32::from_le_bytes(buf[off..off + 4].try_into().unwrap());
        }
        Self {
            num,
            flags,
            size,
            blocks_count,
            pointers,
        }
    }

    fn uninitialized(num: u32) -> Self {
        Self {
            num,
            flags: 0,
            size: 0,
            blocks_count: 0,
            pointers: [INVALID_BLOCK; 10],
        }
    }
}

impl ApeFileSystem {
    fn inode_offset(&self, num: u32) -> u64 {
        self.layout.inode_table_offset + num as u64 * INODE_RECORD_SIZE as u64
    }

    /// Finds a free inode slot, marks it used, and persists the bitmap.
    /// Returns an uninitialized inode (`flags == 0`); the caller must set
    /// `flags` and call `inode_write` before the slot is considered live.
    pub(crate) fn inode_alloc(&mut self) -> Option<Inode> {
        let num = self.inode_bitmap.find_first_zero()?;
        self.inode_bitmap.set(num);
        if !self.persist_inode_bitmap() {
            self.inode_bitmap.clear(num);
            return None;
        }
        Some(Inode::uninitialized(num))
    }

    /// Clears the bitmap bit for `num` and persists it. Does not touch the
    /// inode record itself.
    pub(crate) fn inode_free(&mut self, num: u32) -> bool {
        self.inode_bitmap.clear(num);
        self.persist_inode_bitmap()
    }

    pub(crate) fn inode_read(&mut self, num: u32) -> Option<Inode> {
        if !self.image.seek(self.inode_offset(num)) {
            return None;
        }
        let mut buf = [0u8; INODE_RECORD_SIZE];
        if !self.image.read(&mut buf) {
            return None;
        }
        Some(Inode::decode(&buf))
    }

    /// Persists an inode record. Asserts the slot has been initialized
    /// (`flags != 0`), matching the original's `assert(inode.flags != 0)`.
    pub(crate) fn inode_write(&mut self, inode: &Inode) -> bool {
        assert_ne!(inode.flags, 0, "writing an uninitialized inode slot");
        if !self.image.seek(self.inode_offset(inode.num)) {
            return false;
        }
        self.image.write(&inode.encode())
    }

    pub(crate) fn persist_inode_bitmap(&mut self) -> bool {
        if !self.image.seek(self.layout.inode_bitmap_offset) {
            return false;
        }
        self.image.write(&self.inode_bitmap.store())
    }
}

pub(crate) const ROOT_INODE_NUM: u32 = 0;
pub(crate) const _: () = assert!(INVALID_INODE != ROOT_INODE_NUM);
