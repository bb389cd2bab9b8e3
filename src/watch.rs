//! Watch mode: rebuild on input changes.
//!
//! ```text
//! notify ──► classify (input kind or ignore) ──► Debouncer ──► pipeline::run
//! ```
//!
//! The watcher is attached *before* the initial build, so edits made while
//! it runs are buffered and trigger one more pass instead of being lost.
//! A rebuild runs inline on the loop thread; events that arrive meanwhile
//! wait in the channel and are debounced into the next pass.
//!
//! ## Inputs vs Outputs
//!
//! Only paths that can change a manifest are inputs: `.order`, `.cover`,
//! `<image>.cover` markers, images, directories in either tree, and the
//! registry file. Everything the writer produces (`manifest.json`,
//! `.images`, `.folders`, `.videos`, `.projects`, anything under the covers
//! directory) classifies as "not an input", so a build can never trigger
//! itself. The classifier tests assert the two sets are disjoint.
//!
//! A removed path can no longer be inspected, so a removal that is not a
//! known file kind is treated as a removed directory. Folder names like
//! `Trip.2019` look like files by name alone.
//!
//! Failed rebuilds are reported to the caller and the loop keeps waiting.

use crate::imaging::ImageBackend;
use crate::naming::{
    COVER_REFERENCE_FILE, GENERATED_FILES, ORDER_FILE, is_image_cover_marker, is_image_name,
};
use crate::pipeline::{BuildContext, BuildReport, PipelineError, run};
use notify::{EventKind, RecursiveMode, Watcher};
use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Upper bound on one blocking wait, so a stop request is noticed promptly.
const MAX_IDLE_WAIT: Duration = Duration::from_millis(250);

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),
    #[error("Cannot prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Watcher channel closed")]
    Disconnected,
}

/// Why a path matters to the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputKind {
    OrderFile,
    CoverReference,
    CoverMarker,
    Media,
    Registry,
    Directory,
}

/// The paths the classifier judges against. Use canonical paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchScope {
    pub stills_dir: PathBuf,
    pub motion_dir: PathBuf,
    pub covers_dir: PathBuf,
    pub registry_path: PathBuf,
}

impl WatchScope {
    pub fn from_context(ctx: &BuildContext) -> Self {
        Self {
            stills_dir: ctx.stills_dir.clone(),
            motion_dir: ctx.motion_dir.clone(),
            covers_dir: ctx.covers_dir.clone(),
            registry_path: ctx.registry_path.clone(),
        }
    }

    /// Resolve symlinks so scope paths compare equal to notify's event paths.
    ///
    /// The registry file may not exist yet; its parent is canonicalized instead.
    fn canonical(&self) -> Self {
        let canon = |p: &Path| fs::canonicalize(p).unwrap_or_else(|_| p.to_path_buf());
        let registry_path = match (self.registry_path.parent(), self.registry_path.file_name()) {
            (Some(parent), Some(name)) => canon(parent).join(name),
            _ => self.registry_path.clone(),
        };
        Self {
            stills_dir: canon(&self.stills_dir),
            motion_dir: canon(&self.motion_dir),
            covers_dir: canon(&self.covers_dir),
            registry_path,
        }
    }
}

/// Editor artifacts and OS noise.
fn is_noise(name: &str) -> bool {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");
    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "swx" | "tmp" | "crdownload")
        || name.ends_with('~')
        || name.starts_with(".#")
        || name.starts_with(".git")
        || name == ".DS_Store"
        || name == "Thumbs.db"
}

/// What is on disk at a changed path when the event is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Dir,
    File,
    Missing,
}

impl EntryState {
    pub fn of(path: &Path) -> Self {
        match fs::symlink_metadata(path) {
            Ok(meta) if meta.is_dir() => EntryState::Dir,
            Ok(_) => EntryState::File,
            Err(_) => EntryState::Missing,
        }
    }
}

/// Classify one changed path. `None` means the change cannot affect output.
pub fn classify(path: &Path, scope: &WatchScope) -> Option<InputKind> {
    classify_entry(path, scope, EntryState::of(path))
}

/// Classify a changed path whose on-disk state is already known.
pub fn classify_entry(path: &Path, scope: &WatchScope, state: EntryState) -> Option<InputKind> {
    if path == scope.registry_path {
        return Some(InputKind::Registry);
    }
    if path.starts_with(&scope.covers_dir) {
        return None;
    }
    let rel = path
        .strip_prefix(&scope.stills_dir)
        .or_else(|_| path.strip_prefix(&scope.motion_dir))
        .ok()?;

    let name = path.file_name()?.to_string_lossy();
    if GENERATED_FILES.contains(&name.as_ref()) || is_noise(&name) {
        return None;
    }

    // Anything inside a dot-named directory is invisible to the builders.
    let components: Vec<Component> = rel.components().collect();
    let parents = components.split_last().map_or(&[][..], |(_, p)| p);
    if parents
        .iter()
        .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
    {
        return None;
    }

    match name.as_ref() {
        ORDER_FILE => Some(InputKind::OrderFile),
        COVER_REFERENCE_FILE => Some(InputKind::CoverReference),
        n if is_image_cover_marker(n) => Some(InputKind::CoverMarker),
        n if is_image_name(n) => Some(InputKind::Media),
        n if n.starts_with('.') => None,
        _ if rel.as_os_str().is_empty() => Some(InputKind::Directory),
        _ => match state {
            EntryState::Dir | EntryState::Missing => Some(InputKind::Directory),
            EntryState::File => None,
        },
    }
}

/// Pure debouncer: deduplicates paths and decides when a burst has settled.
pub struct Debouncer {
    window: Duration,
    changes: HashMap<PathBuf, InputKind>,
    last_event: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            changes: HashMap::new(),
            last_event: None,
        }
    }

    /// Record a classified change seen at `now`.
    pub fn record(&mut self, path: PathBuf, kind: InputKind, now: Instant) {
        self.changes.entry(path).or_insert(kind);
        self.last_event = Some(now);
    }

    /// Feed a notify event. Returns how many of its paths were inputs.
    pub fn add_event(&mut self, event: &notify::Event, scope: &WatchScope) -> usize {
        match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => {}
            // mtime/atime/chmod noise, including our own unchanged-file reads
            EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return 0,
            EventKind::Modify(_) => {}
            _ => return 0,
        }
        log::debug!("raw notify: {:?} {:?}", event.kind, event.paths);

        let now = Instant::now();
        let mut accepted = 0;
        for path in &event.paths {
            if let Some(kind) = classify(path, scope) {
                log::debug!("input {kind:?}: {}", path.display());
                self.record(path.clone(), kind, now);
                accepted += 1;
            }
        }
        accepted
    }

    pub fn is_ready_at(&self, now: Instant) -> bool {
        match self.last_event {
            Some(last) => !self.changes.is_empty() && now.duration_since(last) >= self.window,
            None => false,
        }
    }

    /// Take the settled burst, if the window has passed since its last event.
    pub fn take_if_ready_at(&mut self, now: Instant) -> Option<HashMap<PathBuf, InputKind>> {
        if !self.is_ready_at(now) {
            return None;
        }
        self.last_event = None;
        Some(std::mem::take(&mut self.changes))
    }

    /// How long to wait before the burst could be ready.
    pub fn sleep_duration_at(&self, now: Instant) -> Duration {
        let Some(last) = self.last_event else {
            return MAX_IDLE_WAIT;
        };
        self.window
            .saturating_sub(now.duration_since(last))
            .clamp(Duration::from_millis(1), MAX_IDLE_WAIT)
    }
}

/// What caused a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Changes(HashMap<PathBuf, InputKind>),
}

fn ensure_dir(path: &Path) -> Result<(), WatchError> {
    fs::create_dir_all(path).map_err(|source| WatchError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Build once, then rebuild after every settled burst of input changes.
///
/// Returns when `stop` is set. Each pass's outcome goes to `on_pass`;
/// failures never end the loop.
pub fn watch(
    ctx: &BuildContext,
    backend: &(impl ImageBackend + ?Sized),
    debounce: Duration,
    stop: &AtomicBool,
    mut on_pass: impl FnMut(&Trigger, &Result<BuildReport, PipelineError>),
) -> Result<(), WatchError> {
    ensure_dir(&ctx.stills_dir)?;
    ensure_dir(&ctx.motion_dir)?;
    let scope = WatchScope::from_context(ctx).canonical();

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })?;
    watcher.watch(&scope.stills_dir, RecursiveMode::Recursive)?;
    watcher.watch(&scope.motion_dir, RecursiveMode::Recursive)?;
    match scope.registry_path.parent() {
        Some(dir) if dir.is_dir() => watcher.watch(dir, RecursiveMode::NonRecursive)?,
        _ => log::warn!(
            "registry directory missing, not watching {}",
            scope.registry_path.display()
        ),
    }
    log::info!(
        "watching {} and {}",
        scope.stills_dir.display(),
        scope.motion_dir.display()
    );

    let initial = Trigger::Initial;
    on_pass(&initial, &run(ctx, backend));

    let mut debouncer = Debouncer::new(debounce);
    while !stop.load(Ordering::Relaxed) {
        match rx.recv_timeout(debouncer.sleep_duration_at(Instant::now())) {
            Ok(Ok(event)) => {
                debouncer.add_event(&event, &scope);
            }
            Ok(Err(e)) => log::warn!("watch error: {e}"),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Err(WatchError::Disconnected),
        }

        if let Some(changes) = debouncer.take_if_ready_at(Instant::now()) {
            log::info!("{} input change(s), rebuilding", changes.len());
            let trigger = Trigger::Changes(changes);
            on_pass(&trigger, &run(ctx, backend));
        }
    }
    Ok(())
}
