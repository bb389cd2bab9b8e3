//! Read phase: snapshot a source tree into memory.
//!
//! Every build starts by reading each root into a [`SourceDir`] tree. After
//! this point nothing touches the filesystem until the flush pass, so the
//! builders are pure functions of the snapshot and easy to test.
//!
//! ## What a Snapshot Holds
//!
//! ```text
//! Stills/Cats/
//! ├── .order          → SourceDir::order       (parsed, default when absent)
//! ├── .cover          → SourceDir::cover_ref   (first non-blank line)
//! ├── .c.jpg            (dot-named: never visible, not listed)
//! ├── a.jpg           → SourceDir::files       (sorted by name)
//! ├── hero.jpg.cover  → SourceDir::files
//! └── Kittens/        → SourceDir::dirs        (recursively)
//! ```
//!
//! Hidden-by-order filtering is *not* applied here; the snapshot records
//! what is on disk and the builders decide what is visible.
//!
//! ## Failure Containment
//!
//! Only the root itself must be readable. A subfolder that cannot be listed
//! is logged and snapshotted as empty with `unreadable` set, so siblings and
//! the parent still build and nothing is written into it. An unreadable
//! `.order` is logged and treated as absent.
//!
//! Directory symlinks are followed, except one that resolves to a folder
//! already open on the current branch; that would recurse forever.

use crate::directives::OrderFile;
use crate::naming::{COVER_REFERENCE_FILE, ORDER_FILE, is_hidden_name};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Root directory not found: {0}")]
    MissingRoot(PathBuf),
    #[error("Root is not a directory: {0}")]
    NotADirectory(PathBuf),
}

/// In-memory snapshot of one directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDir {
    /// Absolute (or root-joined) directory path.
    pub path: PathBuf,
    /// Raw directory name as found on disk.
    pub name: String,
    /// Non-dot file names, sorted.
    pub files: Vec<String>,
    /// Non-dot subdirectories, sorted by name.
    pub dirs: Vec<SourceDir>,
    /// Parsed `.order`, or the default when absent/unreadable.
    pub order: OrderFile,
    /// First non-blank line of `.cover`, trimmed.
    pub cover_ref: Option<String>,
    /// The directory could not be listed; its snapshot is empty.
    pub unreadable: bool,
}

impl SourceDir {
    /// An empty snapshot for a directory that could not be read.
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            name: dir_name(path),
            ..Self::default()
        }
    }

    /// An empty snapshot marked as unreadable.
    pub fn unreadable(path: &Path) -> Self {
        Self {
            unreadable: true,
            ..Self::empty(path)
        }
    }
}

/// What to read below the root.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Exact directory paths never descended into (e.g. the covers directory).
    pub skip_paths: Vec<PathBuf>,
    /// Levels of subdirectories to descend into; `None` is unlimited.
    pub max_depth: Option<usize>,
}

/// Snapshot a root directory.
///
/// Errors only when the root itself is missing or unreadable.
pub fn scan_tree(root: &Path, options: &ScanOptions) -> Result<SourceDir, ScanError> {
    if !root.exists() {
        return Err(ScanError::MissingRoot(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let entries = list_dir(root)?;
    let mut branch = vec![canonical(root)];
    Ok(snapshot(root, entries, options, 0, &mut branch))
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

struct Listing {
    files: Vec<String>,
    dirs: Vec<String>,
}

/// List one directory, separating files from subdirectories.
///
/// Dot-named entries are dropped; symlinks are followed.
fn list_dir(path: &Path) -> io::Result<Listing> {
    let mut files = Vec::new();
    let mut dirs = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if is_hidden_name(&name) {
            continue;
        }
        if entry.path().is_dir() {
            dirs.push(name);
        } else {
            files.push(name);
        }
    }
    files.sort();
    dirs.sort();
    Ok(Listing { files, dirs })
}

fn canonical(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Snapshot `path` and its subfolders.
///
/// `branch` holds the canonical paths of `path` and its ancestors.
fn snapshot(
    path: &Path,
    listing: Listing,
    options: &ScanOptions,
    depth: usize,
    branch: &mut Vec<PathBuf>,
) -> SourceDir {
    let descend = options.max_depth.is_none_or(|max| depth < max);

    let mut dirs = Vec::new();
    if descend {
        for name in &listing.dirs {
            let child = path.join(name);
            if options.skip_paths.contains(&child) {
                continue;
            }
            let resolved = canonical(&child);
            if branch.contains(&resolved) {
                log::warn!(
                    "skipping {}: links back to {}",
                    child.display(),
                    resolved.display()
                );
                continue;
            }
            branch.push(resolved);
            let snap = match list_dir(&child) {
                Ok(entries) => snapshot(&child, entries, options, depth + 1, branch),
                Err(e) => {
                    log::warn!("cannot read {}, treating as empty: {e}", child.display());
                    SourceDir::unreadable(&child)
                }
            };
            branch.pop();
            dirs.push(snap);
        }
    }

    SourceDir {
        path: path.to_path_buf(),
        name: dir_name(path),
        files: listing.files,
        dirs,
        order: read_order_file(path),
        cover_ref: read_cover_reference(path),
        unreadable: false,
    }
}

/// Read an optional text file; absence is `None`, other failures are logged.
fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            log::warn!("ignoring unreadable {}: {e}", path.display());
            None
        }
    }
}

/// Parse `<dir>/.order`, defaulting when it is missing or unreadable.
pub fn read_order_file(dir: &Path) -> OrderFile {
    let path = dir.join(ORDER_FILE);
    if !path.is_file() {
        return OrderFile::default();
    }
    read_optional(&path)
        .map(|text| OrderFile::parse(&text))
        .unwrap_or_default()
}

/// First non-blank line of `<dir>/.cover`.
pub fn read_cover_reference(dir: &Path) -> Option<String> {
    let path = dir.join(COVER_REFERENCE_FILE);
    if !path.is_file() {
        return None;
    }
    read_optional(&path)?
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
}
