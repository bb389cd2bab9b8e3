//! Orchestrator: one full regeneration of both trees.
//!
//! ```text
//! read     scan Stills/ and Motion/ into snapshots, load the registry
//! derive   stills::derive_stills + motion::derive_motion   (pure)
//! plan     write::WritePlan, children before parents
//! flush    write::flush                                     (build only)
//! ```
//!
//! Every pass starts from scratch. Nothing is carried between passes except
//! what is on disk, so a watch rebuild and a one-shot build are the same
//! function.

use crate::config::FolioConfig;
use crate::imaging::{DisabledBackend, ImageBackend, PreviewParams, Quality, RustBackend};
use crate::motion::{MotionTree, derive_motion};
use crate::naming::url_from_relative;
use crate::registry::{RegistryError, load_registry};
use crate::scan::{ScanError, ScanOptions, SourceDir, scan_tree};
use crate::stills::{FolderContent, StillsTree, derive_stills};
use crate::write::{FlushReport, WriteError, WritePlan, flush};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
    #[error("Write error: {0}")]
    Write(#[from] WriteError),
    #[error("Cannot create {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Every path a build needs, resolved once from the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    pub public_dir: PathBuf,
    pub stills_dir: PathBuf,
    pub motion_dir: PathBuf,
    pub covers_dir: PathBuf,
    pub registry_path: PathBuf,
    pub preview: PreviewParams,
}

impl BuildContext {
    pub fn from_config(root: &Path, config: &FolioConfig) -> Self {
        let public_dir = config.public_path(root);
        Self {
            stills_dir: public_dir.join(&config.stills_dir),
            motion_dir: public_dir.join(&config.motion_dir),
            covers_dir: public_dir.join(&config.covers_dir),
            registry_path: config.registry_path(root),
            preview: PreviewParams {
                width: config.metadata.preview_width,
                quality: Quality::new(config.metadata.preview_quality),
            },
            public_dir,
        }
    }

    /// `path` relative to the public dir (unchanged if it lies outside).
    pub fn relative_to_public(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.public_dir)
            .unwrap_or(path)
            .to_path_buf()
    }

    /// Public URL of a file or directory under the public dir.
    pub fn url_for(&self, path: &Path) -> String {
        url_from_relative(&self.relative_to_public(path))
    }
}

/// The metadata backend the config asks for.
pub fn backend_for(config: &FolioConfig) -> Box<dyn ImageBackend> {
    if config.metadata.enabled {
        Box::new(RustBackend::new())
    } else {
        Box::new(DisabledBackend)
    }
}

/// Summary of one pass, for the CLI report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildReport {
    pub folder_indexes: usize,
    pub galleries: usize,
    pub images: usize,
    pub copied_covers: usize,
    pub projects: usize,
    pub clips: usize,
    pub leaf_videos: usize,
    pub registry_entries: usize,
    pub manifests: usize,
    /// Absent in check mode.
    pub flush: Option<FlushReport>,
    pub elapsed: Duration,
}

impl BuildReport {
    fn from_trees(stills: &StillsTree, motion: &MotionTree, registry_entries: usize) -> Self {
        let mut report = BuildReport {
            projects: motion.projects.len(),
            clips: motion.clip_count(),
            leaf_videos: motion.leaf_videos.len(),
            registry_entries,
            ..BuildReport::default()
        };
        for node in stills.nodes() {
            match &node.content {
                FolderContent::Index(_) => report.folder_indexes += 1,
                FolderContent::Gallery(images) => {
                    report.galleries += 1;
                    report.images += images.len();
                }
            }
            if node.cover.as_ref().is_some_and(|c| c.copy.is_some()) {
                report.copied_covers += 1;
            }
        }
        report
    }
}

fn ensure_dir(path: &Path) -> Result<(), PipelineError> {
    fs::create_dir_all(path).map_err(|source| PipelineError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Snapshot a root; in check mode a missing root reads as empty.
fn read_root(
    path: &Path,
    options: &ScanOptions,
    allow_missing: bool,
) -> Result<SourceDir, PipelineError> {
    match scan_tree(path, options) {
        Err(ScanError::MissingRoot(_)) if allow_missing => Ok(SourceDir::empty(path)),
        other => Ok(other?),
    }
}

/// Read, derive and plan without writing anything.
pub fn plan_build(
    ctx: &BuildContext,
    backend: &(impl ImageBackend + ?Sized),
    allow_missing_roots: bool,
) -> Result<(WritePlan, BuildReport), PipelineError> {
    let skip_paths = vec![ctx.covers_dir.clone()];
    let stills_src = read_root(
        &ctx.stills_dir,
        &ScanOptions {
            skip_paths: skip_paths.clone(),
            max_depth: None,
        },
        allow_missing_roots,
    )?;
    let motion_src = read_root(
        &ctx.motion_dir,
        &ScanOptions {
            skip_paths,
            max_depth: Some(1),
        },
        allow_missing_roots,
    )?;
    let registry = load_registry(&ctx.registry_path)?;

    let stills = derive_stills(&stills_src, ctx, backend);
    let motion = derive_motion(&motion_src, &registry, ctx);

    let mut plan = WritePlan::new(&ctx.covers_dir);
    plan.add_stills(&stills);
    plan.add_motion(&motion);

    let mut report = BuildReport::from_trees(&stills, &motion, registry.len());
    report.manifests = plan.manifest_count();
    Ok((plan, report))
}

/// One full build: ensure the roots exist, then read, derive and flush.
pub fn run(
    ctx: &BuildContext,
    backend: &(impl ImageBackend + ?Sized),
) -> Result<BuildReport, PipelineError> {
    let started = Instant::now();
    ensure_dir(&ctx.stills_dir)?;
    ensure_dir(&ctx.motion_dir)?;

    let (plan, mut report) = plan_build(ctx, backend, false)?;
    report.flush = Some(flush(&plan)?);
    report.elapsed = started.elapsed();
    Ok(report)
}

/// Read and derive everything, write nothing. Returns the plan for display.
pub fn check(
    ctx: &BuildContext,
    backend: &(impl ImageBackend + ?Sized),
) -> Result<(WritePlan, BuildReport), PipelineError> {
    let started = Instant::now();
    let (plan, mut report) = plan_build(ctx, backend, true)?;
    report.elapsed = started.elapsed();
    Ok((plan, report))
}
