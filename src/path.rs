//! POSIX-like path parsing and resolution against the inode tree.
//!
//! Pure segment splitting/joining lives here as free functions; resolving a
//! path to an inode needs the directory layer, so those helpers take
//! `&mut ApeFileSystem`.

use crate::fs::ApeFileSystem;
use crate::inode::{Inode, ROOT_INODE_NUM};

/// Splits a path into its `/`-separated segments.
///
/// Requires a leading `/`; rejects a non-terminal empty segment (`//` in the
/// middle of a path). A trailing `/` is accepted and simply yields no final
/// empty segment. An empty result means "root".
pub fn parse_path(path: &str) -> Option<Vec<&str>> {
    let rest = path.strip_prefix('/')?;
    if rest.is_empty() {
        return Some(Vec::new());
    }

    let parts: Vec<&str> = rest.split('/').collect();
    let last = parts.len() - 1;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() && i != last {
            return None;
        }
    }

    let mut segments = parts;
    if segments.last() == Some(&"") {
        segments.pop();
    }
    Some(segments)
}

/// Joins two path components with exactly one `/` between them.
pub fn join_path(p1: &str, p2: &str) -> String {
    if p1.ends_with('/') {
        format!("{p1}{p2}")
    } else {
        format!("{p1}/{p2}")
    }
}

/// Returns the directory portion of a path, e.g. `"/a/b/c" -> "/a/b/"`.
pub fn extract_directory(path: &str) -> String {
    match path.rfind('/') {
        Some(idx) => path[..=idx].to_string(),
        None => String::from("/"),
    }
}

/// Returns the final segment of a path, e.g. `"/a/b/c" -> "c"`.
pub fn extract_filename(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

impl ApeFileSystem {
    /// Resolves `path` to its inode, walking each segment and requiring
    /// every segment but the last to be a directory.
    pub(crate) fn inode_open(&mut self, path: &str) -> Option<Inode> {
        let mut current = self.inode_read(ROOT_INODE_NUM)?;
        if path == "/" {
            return Some(current);
        }

        let segments = parse_path(path)?;
        if segments.is_empty() {
            return Some(current);
        }

        for segment in segments.iter() {
            if !current.is_directory() {
                return None;
            }
            let entry = self.directory_find_entry(&current, segment)?;
            current = self.inode_read(entry.inode_num)?;
        }
        Some(current)
    }

    /// Like `inode_open`, but requires the resolved inode to be a directory.
    pub(crate) fn directory_open(&mut self, path: &str) -> Option<Inode> {
        let inode = self.inode_open(path)?;
        inode.is_directory().then_some(inode)
    }

    /// Like `inode_open`, but requires the resolved inode to be a file.
    pub(crate) fn file_inode_open(&mut self, path: &str) -> Option<Inode> {
        let inode = self.inode_open(path)?;
        inode.is_file().then_some(inode)
    }
}
