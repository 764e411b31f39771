//! ApeFS: a self-contained, single-file UNIX-style hierarchical filesystem
//! image, usable as a portable backup container.
//!
//! The core is the on-disk layout engine — superblock, bitmap allocators,
//! inode table, directory records, path resolution, and file I/O — not a
//! host-directory-walking driver; callers build that on top of
//! [`ApeFileSystem`] and [`ApeFile`].

pub mod bitmap;
pub mod block;
pub mod directory;
pub mod file;
pub mod fs;
pub mod image;
pub mod inode;
pub mod layout;
pub mod path;

pub use directory::DirEntry;
pub use file::{ApeFile, FileMode, SeekMode};
pub use fs::ApeFileSystem;
pub use inode::Inode;
pub use layout::{BLOCK_SIZE, INVALID_BLOCK, INVALID_INODE};
pub use path::{extract_directory, extract_filename, join_path, parse_path};
