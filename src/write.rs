//! Output writer: lower derived trees to a [`WritePlan`] and flush it.
//!
//! The plan is an ordered list of operations. Builders are pure, so the plan
//! is the only place output paths are decided, and flushing it is the only
//! place the build touches disk.
//!
//! ## Flush Rules
//!
//! - Parent directories are created as needed.
//! - A file whose current bytes already equal the new bytes is left alone
//!   (counted as unchanged), so a rebuild with no input changes touches
//!   nothing.
//! - Listings are always rewritten in full; names lose any leading dots.
//! - After all copies, generated cover files in the covers directory that
//!   the plan did not produce are removed.
//!
//! Operations run in plan order, which puts every child folder before its
//! parent.
//!
//! ## Failure Containment
//!
//! A failed write inside a folder, or an unreadable cover source, is logged
//! and recorded in [`FlushReport::failed`]; the flush goes on so siblings,
//! parents and the roots are still written. Only failures on a root's own
//! files or in the covers directory stop the flush. Folders the read phase
//! could not list get no operations at all.

use crate::cover::is_generated_cover_name;
use crate::motion::MotionTree;
use crate::naming::{
    FOLDERS_LISTING, IMAGES_LISTING, MANIFEST_FILE, PROJECTS_LISTING, VIDEOS_LISTING,
};
use crate::stills::{FolderContent, StillsTree};
use crate::types::{Manifest, ManifestFile};
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to serialize {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> WriteError + '_ {
    move |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Header written above the names in every `.images` listing.
///
/// Commented, so pasting the file into `.order` keeps the template inert
/// until the user uncomments a line.
pub const IMAGES_HEADER: &[&str] = &[
    "# max_columns = 3   # maximum columns for this gallery (1-8)",
    "# aspect_ratio = 0  # 0 = each image's own aspect; or 4/5, 1/1, 3/2",
    "# title_display = 0 # 0 = hide titles, 1 = show titles",
    "#",
    "# ------------ Overrides above --------------",
];

const NO_HEADER: &[&str] = &[];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOp {
    Manifest {
        path: PathBuf,
        manifest: ManifestFile,
    },
    Listing {
        path: PathBuf,
        header: &'static [&'static str],
        names: Vec<String>,
    },
    CopyFile {
        from: PathBuf,
        to: PathBuf,
    },
}

impl WriteOp {
    /// Destination path of this operation.
    pub fn target(&self) -> &Path {
        match self {
            WriteOp::Manifest { path, .. } => path,
            WriteOp::Listing { path, .. } => path,
            WriteOp::CopyFile { to, .. } => to,
        }
    }
}

/// Render a convenience listing: optional header, blank line, one name per line.
pub fn render_listing(header: &[&str], names: &[String]) -> String {
    let mut out = String::new();
    if !header.is_empty() {
        out.push_str(&header.join("\n"));
        out.push_str("\n\n");
    }
    for name in names {
        out.push_str(name.trim_start_matches('.'));
        out.push('\n');
    }
    out
}

/// Ordered write operations for one build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WritePlan {
    pub ops: Vec<WriteOp>,
    /// Directory whose stale generated covers are pruned after flushing.
    pub covers_dir: Option<PathBuf>,
    /// Tree roots; a failure on their own files stops the flush.
    pub roots: Vec<PathBuf>,
}

impl WritePlan {
    pub fn new(covers_dir: &Path) -> Self {
        Self {
            ops: Vec::new(),
            covers_dir: Some(covers_dir.to_path_buf()),
            roots: Vec::new(),
        }
    }

    fn manifest(&mut self, dir: &Path, manifest: Manifest) {
        self.ops.push(WriteOp::Manifest {
            path: dir.join(MANIFEST_FILE),
            manifest: ManifestFile::new(manifest),
        });
    }

    fn listing(
        &mut self,
        dir: &Path,
        file: &str,
        header: &'static [&'static str],
        names: Vec<String>,
    ) {
        self.ops.push(WriteOp::Listing {
            path: dir.join(file),
            header,
            names,
        });
    }

    /// Add every Stills output: per folder (children first), then the root.
    pub fn add_stills(&mut self, tree: &StillsTree) {
        for node in tree.nodes().into_iter().filter(|n| !n.unreadable) {
            if let Some(copy) = node.cover.as_ref().and_then(|c| c.copy.as_ref()) {
                self.ops.push(WriteOp::CopyFile {
                    from: copy.from.clone(),
                    to: copy.to.clone(),
                });
            }
            let (file, header) = match node.content {
                FolderContent::Index(_) => (FOLDERS_LISTING, NO_HEADER),
                FolderContent::Gallery(_) => (IMAGES_LISTING, IMAGES_HEADER),
            };
            self.listing(&node.path, file, header, node.listing());
            self.manifest(&node.path, node.manifest());
        }
        self.listing(&tree.path, FOLDERS_LISTING, NO_HEADER, tree.listing());
        self.manifest(&tree.path, tree.manifest());
        self.roots.push(tree.path.clone());
    }

    /// Add every Motion output: per project, then the root.
    pub fn add_motion(&mut self, tree: &MotionTree) {
        for project in &tree.projects {
            self.listing(&project.path, VIDEOS_LISTING, NO_HEADER, project.listing());
            self.manifest(&project.path, project.manifest());
        }
        self.listing(&tree.path, PROJECTS_LISTING, NO_HEADER, tree.project_listing());
        self.listing(&tree.path, VIDEOS_LISTING, NO_HEADER, tree.video_listing());
        self.manifest(&tree.path, tree.manifest());
        self.roots.push(tree.path.clone());
    }

    /// Whether a failure of `op` is logged and skipped instead of ending the flush.
    fn is_contained(&self, op: &WriteOp, err: &WriteError) -> bool {
        match op {
            WriteOp::CopyFile { .. } => matches!(err, WriteError::Source { .. }),
            WriteOp::Manifest { path, .. } | WriteOp::Listing { path, .. } => path
                .parent()
                .is_none_or(|dir| !self.roots.iter().any(|root| root == dir)),
        }
    }

    pub fn manifest_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, WriteOp::Manifest { .. }))
            .count()
    }
}

/// What a flush did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub written: Vec<PathBuf>,
    pub unchanged: usize,
    pub copied: Vec<PathBuf>,
    pub pruned: Vec<PathBuf>,
    /// Targets skipped after a contained failure.
    pub failed: Vec<PathBuf>,
}

enum Applied {
    Written,
    Copied,
    Unchanged,
}

/// Write `bytes` unless the file already holds exactly them. Returns true on write.
fn write_if_changed(path: &Path, bytes: &[u8]) -> Result<bool, WriteError> {
    match fs::read(path) {
        Ok(existing) if existing == bytes => return Ok(false),
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_err(path)(e)),
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    fs::write(path, bytes).map_err(io_err(path))?;
    Ok(true)
}

/// Execute a plan.
///
/// Contained failures are skipped and listed in the report. Any other failure
/// stops the flush; everything written before it stays written.
pub fn flush(plan: &WritePlan) -> Result<FlushReport, WriteError> {
    let mut report = FlushReport::default();

    for op in &plan.ops {
        match apply(op) {
            Ok(Applied::Written) => report.written.push(op.target().to_path_buf()),
            Ok(Applied::Copied) => report.copied.push(op.target().to_path_buf()),
            Ok(Applied::Unchanged) => report.unchanged += 1,
            Err(e) if plan.is_contained(op, &e) => {
                log::warn!("skipping {}: {e}", op.target().display());
                report.failed.push(op.target().to_path_buf());
            }
            Err(e) => return Err(e),
        }
    }

    if let Some(covers_dir) = &plan.covers_dir {
        report.pruned = prune_covers(covers_dir, plan)?;
    }
    Ok(report)
}

fn apply(op: &WriteOp) -> Result<Applied, WriteError> {
    let (path, bytes, written) = match op {
        WriteOp::Manifest { path, manifest } => {
            let json = manifest.to_json().map_err(|source| WriteError::Json {
                path: path.clone(),
                source,
            })?;
            (path, json.into_bytes(), Applied::Written)
        }
        WriteOp::Listing {
            path,
            header,
            names,
        } => (path, render_listing(header, names).into_bytes(), Applied::Written),
        WriteOp::CopyFile { from, to } => {
            let bytes = fs::read(from).map_err(|source| WriteError::Source {
                path: from.clone(),
                source,
            })?;
            (to, bytes, Applied::Copied)
        }
    };
    if write_if_changed(path, &bytes)? {
        Ok(written)
    } else {
        Ok(Applied::Unchanged)
    }
}

/// Remove generated covers the plan no longer produces.
fn prune_covers(covers_dir: &Path, plan: &WritePlan) -> Result<Vec<PathBuf>, WriteError> {
    let keep: HashSet<&Path> = plan
        .ops
        .iter()
        .filter_map(|op| match op {
            WriteOp::CopyFile { to, .. } => Some(to.as_path()),
            _ => None,
        })
        .collect();

    let entries = match fs::read_dir(covers_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(io_err(covers_dir)(e)),
    };

    let mut pruned = Vec::new();
    for entry in entries {
        let entry = entry.map_err(io_err(covers_dir))?;
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().to_string();
        if !path.is_file() || !is_generated_cover_name(&name) || keep.contains(path.as_path()) {
            continue;
        }
        fs::remove_file(&path).map_err(io_err(&path))?;
        log::debug!("pruned stale cover {}", path.display());
        pruned.push(path);
    }
    pruned.sort();
    Ok(pruned)
}
