//! The filesystem façade: ties the image, superblock, layout and bitmaps
//! together and exposes `create`/`open`/`close`, mirroring the shape of the
//! teacher's `Ext2Factory` (which drives a `File` plus block-group metadata
//! through a single `make` entry point) generalized to ApeFS's flatter,
//! single-region layout.

use std::path::Path;

use crate::bitmap::Bitmap;
use crate::directory::DirEntry;
use crate::image::Image;
use crate::inode::{Inode, FLAG_DIRECTORY, ROOT_INODE_NUM};
use crate::layout::{Layout, Superblock, BLOCK_SIZE, SUPERBLOCK_DISK_SIZE};
use crate::path::{extract_directory, extract_filename, parse_path};

/// A mounted ApeFS image: the single entry point callers use to create,
/// open, and operate on a filesystem backed by one host file.
pub struct ApeFileSystem {
    pub(crate) image: Image,
    pub(crate) superblock: Superblock,
    pub(crate) layout: Layout,
    pub(crate) inode_bitmap: Bitmap,
    pub(crate) block_bitmap: Bitmap,
}

impl ApeFileSystem {
    /// Creates a new ApeFS image of (at least) `size_bytes` at `path`,
    /// truncating any existing file. Lays out the superblock, zeroes the
    /// bitmap and inode-table regions, and allocates the root directory at
    /// inode 0.
    pub fn create(path: &Path, size_bytes: u32) -> Option<Self> {
        let mut image = Image::create_trunc(path)?;
        let superblock = Superblock::new_for_size(size_bytes);
        let layout = Layout::from_superblock(&superblock);

        if !image.seek(0) || !image.write(&superblock.encode()) {
            return None;
        }

        let zero_block = [0u8; BLOCK_SIZE];
        let metadata_blocks = superblock.inode_maps as u32 + superblock.block_maps + superblock.inode_blocks;
        if !image.seek(SUPERBLOCK_DISK_SIZE as u64) {
            return None;
        }
        for _ in 0..metadata_blocks {
            if !image.write(&zero_block) {
                return None;
            }
        }

        let mut inode_bitmap = Bitmap::new();
        inode_bitmap.reserve(superblock.inode_maps as usize * BLOCK_SIZE);
        let mut block_bitmap = Bitmap::new();
        block_bitmap.reserve(superblock.block_maps as usize * BLOCK_SIZE);

        let mut fs = Self {
            image,
            superblock,
            layout,
            inode_bitmap,
            block_bitmap,
        };

        if !fs.persist_inode_bitmap() || !fs.persist_block_bitmap() {
            return None;
        }

        let mut root = fs.inode_alloc()?;
        if root.num != ROOT_INODE_NUM {
            return None;
        }
        root.flags = FLAG_DIRECTORY;
        if !fs.inode_write(&root) {
            return None;
        }

        Some(fs)
    }

    /// Opens an existing ApeFS image at `path`, reading back the superblock
    /// and both bitmaps.
    pub fn open(path: &Path) -> Option<Self> {
        let mut image = Image::open_rw(path)?;

        if !image.seek(0) {
            return None;
        }
        let mut sb_buf = [0u8; SUPERBLOCK_DISK_SIZE];
        if !image.read(&mut sb_buf) {
            return None;
        }
        let superblock = Superblock::decode(&sb_buf)?;
        let layout = Layout::from_superblock(&superblock);

        let mut inode_bitmap = Bitmap::new();
        inode_bitmap.reserve(superblock.inode_maps as usize * BLOCK_SIZE);
        let mut block_bitmap = Bitmap::new();
        block_bitmap.reserve(superblock.block_maps as usize * BLOCK_SIZE);

        let mut fs = Self {
            image,
            superblock,
            layout,
            inode_bitmap,
            block_bitmap,
        };

        if !fs.image.seek(fs.layout.inode_bitmap_offset) {
            return None;
        }
        let mut inode_bitmap_buf = vec![0u8; fs.superblock.inode_maps as usize * BLOCK_SIZE];
        if !fs.image.read(&mut inode_bitmap_buf) {
            return None;
        }
        fs.inode_bitmap.load(&inode_bitmap_buf);

        if !fs.image.seek(fs.layout.block_bitmap_offset) {
            return None;
        }
        let mut block_bitmap_buf = vec![0u8; fs.superblock.block_maps as usize * BLOCK_SIZE];
        if !fs.image.read(&mut block_bitmap_buf) {
            return None;
        }
        fs.block_bitmap.load(&block_bitmap_buf);

        Some(fs)
    }

    /// Closes the underlying host file handle.
    pub fn close(&mut self) {
        self.image.close();
    }

    /// Total size of the backing image, in bytes.
    pub fn size(&self) -> u32 {
        self.superblock.filesystem_size
    }

    pub(crate) fn root_inode(&mut self) -> Option<Inode> {
        self.inode_read(ROOT_INODE_NUM)
    }

    /// Creates directory `path`, creating missing intermediate directories
    /// along the way (the existing ones must actually be directories).
    /// Fails if the final segment already exists.
    pub fn directory_create(&mut self, path: &str) -> bool {
        let Some(segments) = parse_path(path) else {
            return false;
        };
        if segments.is_empty() {
            return false;
        }

        let Some(mut current) = self.inode_read(ROOT_INODE_NUM) else {
            return false;
        };
        let last = segments.len() - 1;

        for (i, segment) in segments.iter().enumerate() {
            if !current.is_directory() {
                return false;
            }
            match self.directory_find_entry(&current, segment) {
                Some(entry) => {
                    if i == last {
                        return false;
                    }
                    if !entry.is_directory() {
                        return false;
                    }
                    let Some(child) = self.inode_read(entry.inode_num) else {
                        return false;
                    };
                    current = child;
                }
                None => {
                    let Some(mut new_inode) = self.inode_alloc() else {
                        return false;
                    };
                    new_inode.flags = FLAG_DIRECTORY;
                    if !self.inode_write(&new_inode) {
                        return false;
                    }
                    if !self.directory_add_entry(&mut current, new_inode.num, FLAG_DIRECTORY, segment) {
                        return false;
                    }
                    if i == last {
                        return true;
                    }
                    current = new_inode;
                }
            }
        }
        true
    }

    /// Deletes directory `path`, which must be empty. Also frees its inode
    /// slot — the original never did, leaking it permanently.
    pub fn directory_delete(&mut self, path: &str) -> bool {
        let Some(inode) = self.directory_open(path) else {
            return false;
        };
        if inode.size != 0 {
            return false;
        }
        let Some(mut parent) = self.directory_open(&extract_directory(path)) else {
            return false;
        };
        if !self.directory_remove_entry(&mut parent, extract_filename(path)) {
            return false;
        }
        self.inode_free(inode.num)
    }

    pub fn directory_exists(&mut self, path: &str) -> bool {
        self.directory_open(path).is_some()
    }

    /// Lists the entries of directory `path`. Returns `None` if `path` isn't
    /// an existing directory.
    pub fn directory_enum(&mut self, path: &str) -> Option<Vec<DirEntry>> {
        let inode = self.directory_open(path)?;
        Some(self.directory_enum_inode(&inode))
    }

    pub fn file_exists(&mut self, path: &str) -> bool {
        self.file_inode_open(path).is_some()
    }

    /// Deletes file `path`. Also frees its inode slot.
    pub fn file_delete(&mut self, path: &str) -> bool {
        let Some(inode) = self.file_inode_open(path) else {
            return false;
        };
        let Some(mut parent) = self.directory_open(&extract_directory(path)) else {
            return false;
        };
        if !self.directory_remove_entry(&mut parent, extract_filename(path)) {
            return false;
        }
        self.inode_free(inode.num)
    }
}
