//! The on-disk superblock and the region layout derived from it.
//!
//! Disk order, from offset 0: superblock, inode bitmap, block bitmap, inode
//! table, data region (`spec.md` §6). All multi-byte integers are stored
//! little-endian — a deliberate portability choice the original C++ didn't
//! make (it dumped its structs with native endianness); see `DESIGN.md`.

pub const BLOCK_SIZE: usize = 4096;
pub const INVALID_BLOCK: u32 = 0xFFFF_FFFF;
pub const INVALID_INODE: u32 = 0xFFFF_FFFF;
/// 3 inode-bitmap blocks worth of bits.
pub const MAX_INODES: u32 = 3 * BLOCK_SIZE as u32 * 8;
pub const DIRECT_POINTERS: usize = 8;
pub const INDIRECT_FANOUT: usize = BLOCK_SIZE / 4;

const MAGIC: &[u8; 5] = b"apefs";
const VERSION: u8 = 1;
/// Superblock record padded to a round size, the way the original reserves
/// headroom past its literal field list.
pub const SUPERBLOCK_DISK_SIZE: usize = 32;

/// Fixed-size inode record stored in the inode table.
pub const INODE_RECORD_SIZE: usize = 4 + 1 + 4 + 2 + 4 * 10;

fn ceil_division(n: u64, d: u64) -> u64 {
    (n + d - 1) / d
}

/// The fixed header at offset 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Superblock {
    pub filesystem_size: u32,
    pub block_maps: u32,
    pub inode_maps: u8,
    /// Number of 4 KiB blocks holding the inode table.
    ///
    /// `spec.md` types this as `u8` (copying the original C++ header), but
    /// `MAX_INODES * INODE_RECORD_SIZE / BLOCK_SIZE` is 1224 — it cannot fit
    /// in a byte. We widen the on-disk field to `u32`; see `DESIGN.md`.
    pub inode_blocks: u32,
}

impl Superblock {
    /// Builds a fresh superblock for an image covering `size_bytes`.
    pub fn new_for_size(size_bytes: u32) -> Self {
        let block_maps = ceil_division(size_bytes as u64, BLOCK_SIZE as u64) as u32;
        let filesystem_size = block_maps * BLOCK_SIZE as u32;
        let inode_maps = (MAX_INODES as u64 / BLOCK_SIZE as u64 / 8) as u8;
        let inode_blocks =
            ceil_division(MAX_INODES as u64 * INODE_RECORD_SIZE as u64, BLOCK_SIZE as u64) as u32;
        Self {
            filesystem_size,
            block_maps,
            inode_maps,
            inode_blocks,
        }
    }

    pub fn encode(&self) -> [u8; SUPERBLOCK_DISK_SIZE] {
        let mut buf = [0u8; SUPERBLOCK_DISK_SIZE];
        buf[0..5].copy_from_slice(MAGIC);
        buf[5] = VERSION;
        buf[6..10].copy_from_slice(&self.filesystem_size.to_le_bytes());
        buf[10..14].copy_from_slice(&self.block_maps.to_le_bytes());
        buf[14] = self.inode_maps;
        buf[15..19].copy_from_slice(&self.inode_blocks.to_le_bytes());
        buf
    }

    /// Decodes a superblock, verifying the magic and returning `None` if it
    /// doesn't match.
    pub fn decode(buf: &[u8; SUPERBLOCK_DISK_SIZE]) -> Option<Self> {
        if &buf[0..5] != MAGIC {
            return None;
        }
        Some(Self {
            filesystem_size: u32::from_le_bytes(buf[6..10].try_into().unwrap()),
            block_maps: u32::from_le_bytes(buf[10..14].try_into().unwrap()),
            inode_maps: buf[14],
            inode_blocks: u32::from_le_bytes(buf[15..19].try_into().unwrap()),
        })
    }
}

/// Byte offsets of each region, derived from a superblock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub inode_bitmap_offset: u64,
    pub block_bitmap_offset: u64,
    pub inode_table_offset: u64,
    pub data_offset: u64,
}

impl Layout {
    pub fn from_superblock(sb: &Superblock) -> Self {
        let inode_bitmap_offset = SUPERBLOCK_DISK_SIZE as u64;
        let block_bitmap_offset = inode_bitmap_offset + sb.inode_maps as u64 * BLOCK_SIZE as u64;
        let inode_table_offset = block_bitmap_offset + sb.block_maps as u64 * BLOCK_SIZE as u64;
        let data_offset = inode_table_offset + sb.inode_blocks as u64 * BLOCK_SIZE as u64;
        Self {
            inode_bitmap_offset,
            block_bitmap_offset,
            inode_table_offset,
            data_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let sb = Superblock::new_for_size(22_222_222);
        let encoded = sb.encode();
        let decoded = Superblock::decode(&encoded).expect("valid magic");
        assert_eq!(sb, decoded);
    }

    #[test]
    fn rejects_bad_magic() {
        let mut buf = [0u8; SUPERBLOCK_DISK_SIZE];
        buf[0..5].copy_from_slice(b"notfs");
        assert!(Superblock::decode(&buf).is_none());
    }

    #[test]
    fn size_rounds_up_to_block_multiple() {
        let sb = Superblock::new_for_size(22_222_222);
        assert_eq!(sb.filesystem_size as u64, sb.block_maps as u64 * BLOCK_SIZE as u64);
        assert!(sb.filesystem_size >= 22_222_222);
    }

    #[test]
    fn inode_maps_is_always_three() {
        let sb = Superblock::new_for_size(1);
        assert_eq!(sb.inode_maps, 3);
        let sb2 = Superblock::new_for_size(10 * 1024 * 1024 * 1024);
        assert_eq!(sb2.inode_maps, 3);
    }

    #[test]
    fn layout_regions_are_contiguous_and_ordered() {
        let sb = Superblock::new_for_size(1_000_000);
        let layout = Layout::from_superblock(&sb);
        assert!(layout.inode_bitmap_offset < layout.block_bitmap_offset);
        assert!(layout.block_bitmap_offset < layout.inode_table_offset);
        assert!(layout.inode_table_offset < layout.data_offset);
        assert_eq!(
            layout.block_bitmap_offset - layout.inode_bitmap_offset,
            sb.inode_maps as u64 * BLOCK_SIZE as u64
        );
    }
}
