//! Data blocks: the block-bitmap allocator and the direct/indirect/
//! double-indirect index resolution that turns a logical block index into a
//! physical block number.

use crate::fs::ApeFileSystem;
use crate::inode::Inode;
use crate::layout::{BLOCK_SIZE, DIRECT_POINTERS, INDIRECT_FANOUT, INVALID_BLOCK};

/// One 4 KiB data block, identified by its position in the data region.
pub struct Block {
    pub num: u32,
    pub data: Box<[u8; BLOCK_SIZE]>,
}

impl Block {
    fn zeroed(num: u32) -> Self {
        Self {
            num,
            data: Box::new([0u8; BLOCK_SIZE]),
        }
    }

    /// Fills the block with `byte` — used to mark a freshly allocated index
    /// block's pointer slots as all-`INVALID_BLOCK` (`0xFF` bytes).
    pub fn fill(&mut self, byte: u8) {
        self.data.fill(byte);
    }
}

fn read_ptr(data: &[u8; BLOCK_SIZE], idx: usize) -> u32 {
    u32::from_le_bytes(data[idx * 4..idx * 4 + 4].try_into().unwrap())
}

fn write_ptr(data: &mut [u8; BLOCK_SIZE], idx: usize, value: u32) {
    data[idx * 4..idx * 4 + 4].copy_from_slice(&value.to_le_bytes());
}

impl ApeFileSystem {
    fn block_offset(&self, num: u32) -> u64 {
        self.layout.data_offset + num as u64 * BLOCK_SIZE as u64
    }

    pub(crate) fn persist_block_bitmap(&mut self) -> bool {
        if !self.image.seek(self.layout.block_bitmap_offset) {
            return false;
        }
        self.image.write(&self.block_bitmap.store())
    }

    /// Allocates a raw data block. Its contents are zeroed (the original
    /// leaves them undefined; zeroing is a safe refinement, not a semantic
    /// change any caller can observe before its first write).
    pub(crate) fn block_alloc(&mut self) -> Option<Block> {
        let num = self.block_bitmap.find_first_zero()?;
        self.block_bitmap.set(num);
        if !self.persist_block_bitmap() {
            self.block_bitmap.clear(num);
            return None;
        }
        Some(Block::zeroed(num))
    }

    pub(crate) fn block_free(&mut self, num: u32) -> bool {
        self.block_bitmap.clear(num);
        self.persist_block_bitmap()
    }

    pub(crate) fn block_read(&mut self, num: u32) -> Option<Block> {
        if num == INVALID_BLOCK || !self.image.seek(self.block_offset(num)) {
            return None;
        }
        let mut block = Block::zeroed(num);
        if !self.image.read(block.data.as_mut_slice()) {
            return None;
        }
        Some(block)
    }

    pub(crate) fn block_write(&mut self, block: &Block) -> bool {
        if !self.image.seek(self.block_offset(block.num)) {
            return false;
        }
        self.image.write(block.data.as_slice())
    }

    /// Resolves `logical_index` through the inode's direct/indirect/
    /// double-indirect pointer tiers and reads the resulting block.
    pub(crate) fn block_read_via_inode(&mut self, inode: &Inode, logical_index: u32) -> Option<Block> {
        if logical_index >= inode.blocks_count as u32 {
            return None;
        }
        if (logical_index as usize) < DIRECT_POINTERS {
            return self.block_read(inode.pointers[logical_index as usize]);
        }

        let rel = logical_index - DIRECT_POINTERS as u32;
        if (rel as usize) < INDIRECT_FANOUT {
            let iblock = self.block_read(inode.single_indirect())?;
            let target = read_ptr(&iblock.data, rel as usize);
            return self.block_read(target);
        }

        let di_rel = rel as usize - INDIRECT_FANOUT;
        let outer = di_rel / INDIRECT_FANOUT;
        let inner = di_rel % INDIRECT_FANOUT;
        let diblock = self.block_read(inode.double_indirect())?;
        let indirect_num = read_ptr(&diblock.data, outer);
        let iblock = self.block_read(indirect_num)?;
        let target = read_ptr(&iblock.data, inner);
        self.block_read(target)
    }

    /// Allocates a new data block and attaches it at logical position
    /// `inode.blocks_count`, creating intermediate index blocks on demand.
    /// On any failure the inode and bitmaps are left as they were — any
    /// block allocated earlier in this call is freed again.
    pub(crate) fn block_alloc_via_inode(&mut self, inode: &mut Inode) -> Option<Block> {
        let new_block = self.block_alloc()?;
        let pos = inode.blocks_count as u32;

        if (pos as usize) < DIRECT_POINTERS {
            let mut updated = *inode;
            updated.pointers[pos as usize] = new_block.num;
            updated.blocks_count += 1;
            if !self.inode_write(&updated) {
                self.block_free(new_block.num);
                return None;
            }
            *inode = updated;
            return Some(new_block);
        }

        let rel = pos - DIRECT_POINTERS as u32;
        if (rel as usize) < INDIRECT_FANOUT {
            let (mut iblock, indirect_is_new) = match self.existing_or_new_index_block(inode.single_indirect()) {
                Some(pair) => pair,
                None => {
                    self.block_free(new_block.num);
                    return None;
                }
            };
            write_ptr(&mut iblock.data, rel as usize, new_block.num);

            let mut updated = *inode;
            if indirect_is_new {
                updated.pointers[DIRECT_POINTERS] = iblock.num;
            }
            updated.blocks_count += 1;

            if !self.block_write(&iblock) || !self.inode_write(&updated) {
                if indirect_is_new {
                    self.block_free(iblock.num);
                }
                self.block_free(new_block.num);
                return None;
            }
            *inode = updated;
            return Some(new_block);
        }

        let di_rel = rel as usize - INDIRECT_FANOUT;
        let outer = di_rel / INDIRECT_FANOUT;
        let inner = di_rel % INDIRECT_FANOUT;

        let (mut diblock, di_is_new) = match self.existing_or_new_index_block(inode.double_indirect()) {
            Some(pair) => pair,
            None => {
                self.block_free(new_block.num);
                return None;
            }
        };

        let existing_indirect = read_ptr(&diblock.data, outer);
        let (mut iblock, i_is_new) = match self.existing_or_new_index_block(existing_indirect) {
            Some(pair) => pair,
            None => {
                if di_is_new {
                    self.block_free(diblock.num);
                }
                self.block_free(new_block.num);
                return None;
            }
        };

        write_ptr(&mut iblock.data, inner, new_block.num);
        if i_is_new {
            write_ptr(&mut diblock.data, outer, iblock.num);
        }

        let mut updated = *inode;
        if di_is_new {
            updated.pointers[DIRECT_POINTERS + 1] = diblock.num;
        }
        updated.blocks_count += 1;

        if !self.block_write(&diblock) || !self.block_write(&iblock) || !self.inode_write(&updated) {
            if i_is_new {
                self.block_free(iblock.num);
            }
            if di_is_new {
                self.block_free(diblock.num);
            }
            self.block_free(new_block.num);
            return None;
        }
        *inode = updated;
        Some(new_block)
    }

    /// Reads `ptr` if valid, or allocates and `0xFF`-fills a fresh index
    /// block if it's `INVALID_BLOCK`. Returns the block and whether it's new.
    fn existing_or_new_index_block(&mut self, ptr: u32) -> Option<(Block, bool)> {
        if ptr == INVALID_BLOCK {
            let mut block = self.block_alloc()?;
            block.fill(0xFF);
            Some((block, true))
        } else {
            self.block_read(ptr).map(|b| (b, false))
        }
    }
}
