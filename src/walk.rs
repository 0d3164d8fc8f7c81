//! Local folder traversal for folder uploads.
//!
//! The walk only collects entries; no network I/O happens here.

use std::cmp::Ordering;
use std::path::{Component, Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::error::Result;

/// One entry below the uploaded folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// Path relative to the walked root.
    pub relative: PathBuf,
    pub is_dir: bool,
}

/// Walk `root` depth-first. A directory comes before its contents; inside one
/// directory, sub-directories come before files, each sorted by name.
pub fn walk_local_tree(root: &Path) -> Result<Vec<LocalEntry>> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(root).min_depth(1).sort_by(dirs_first) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| entry.path().to_path_buf());
        entries.push(LocalEntry {
            relative,
            is_dir: entry.file_type().is_dir(),
        });
    }
    Ok(entries)
}

fn dirs_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    b.file_type()
        .is_dir()
        .cmp(&a.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

/// Map a relative local path under `remote_root`, always joined with `/`.
pub fn remote_join(remote_root: &str, relative: &Path) -> String {
    let tail = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");

    let root = remote_root.trim_end_matches('/');
    if root.is_empty() {
        if remote_root.starts_with('/') {
            format!("/{}", tail)
        } else {
            tail
        }
    } else {
        format!("{}/{}", root, tail)
    }
}
