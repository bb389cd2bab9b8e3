//! Shared test utilities for the folio-gen unit tests.
//!
//! Two kinds of fixtures:
//!
//! - **In-memory snapshots** for the pure builders: [`source_dir`] and
//!   [`with_dirs`] assemble [`SourceDir`] trees without touching disk.
//! - **On-disk trees** for scan/write/pipeline tests: [`write_file`] creates
//!   files (and parents) under a `TempDir`.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let root = with_dirs(
//!     source_dir("/site/public/Stills", &[]),
//!     vec![source_dir("/site/public/Stills/Cats", &["a.jpg"])],
//! );
//! let tree = derive_stills(&root, &test_context(Path::new("/site")), &MockBackend::new());
//! ```

use std::fs;
use std::path::Path;

use crate::config::FolioConfig;
use crate::pipeline::BuildContext;
use crate::scan::SourceDir;
use crate::types::ManifestFile;

// =========================================================================
// Fixture setup
// =========================================================================

/// Build context for a project rooted at `root`, stock layout.
pub fn test_context(root: &Path) -> BuildContext {
    BuildContext::from_config(root, &FolioConfig::default())
}

/// Write `content` to `root/rel`, creating parent directories.
pub fn write_file(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

/// In-memory snapshot of a directory holding `files` and nothing else.
pub fn source_dir(path: &str, files: &[&str]) -> SourceDir {
    let mut dir = SourceDir::empty(Path::new(path));
    dir.files = files.iter().map(|f| f.to_string()).collect();
    dir.files.sort();
    dir
}

/// Attach child snapshots to `dir`.
pub fn with_dirs(mut dir: SourceDir, dirs: Vec<SourceDir>) -> SourceDir {
    dir.dirs = dirs;
    dir
}

// =========================================================================
// Lookup helpers (panic with a useful message on miss)
// =========================================================================

/// Find a direct child snapshot by name.
pub fn find_dir<'a>(dir: &'a SourceDir, name: &str) -> &'a SourceDir {
    dir.dirs.iter().find(|d| d.name == name).unwrap_or_else(|| {
        let names: Vec<&str> = dir.dirs.iter().map(|d| d.name.as_str()).collect();
        panic!("directory '{name}' not found in {names:?}")
    })
}

/// Parse a written `manifest.json`.
pub fn read_manifest(path: &Path) -> ManifestFile {
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("bad manifest {}: {e}", path.display()))
}
