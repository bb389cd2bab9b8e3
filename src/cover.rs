//! Cover resolution for a single folder.
//!
//! Priority, first match wins:
//!
//! 1. **Cover marker**: the first `<image>.cover` file (by name). The marker
//!    is copied to the covers directory under a content-addressed name and
//!    the manifest points at the copy.
//! 2. **Cover reference**: the single line of `.cover`, matched against the
//!    folder's files (exact, then case-insensitive). Used in place, no copy.
//! 3. **Fallbacks** (applied by the builders, not here): the first child
//!    folder that has a cover, or the first image of a leaf gallery.
//!
//! A folder with nothing to show has no cover. That is valid output.
//!
//! ## Copied Cover Names
//!
//! ```text
//! {first 16 hex of sha256(source path relative to public dir)}-{image name}
//! Stills/Cats/hero.jpg.cover → _covers/3f9c0a1b2c3d4e5f-hero.jpg
//! ```
//!
//! The name depends only on where the marker lives, so repeated builds
//! produce the same URL and distinct markers never collide.

use crate::imaging::{ImageBackend, read_image_meta};
use crate::naming::{basename, is_image_cover_marker, strip_cover_marker};
use crate::pipeline::BuildContext;
use crate::scan::SourceDir;
use crate::types::ImageMeta;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Hex characters of the path hash kept in a copied cover's name.
pub const COVER_HASH_LEN: usize = 16;

/// A copy the writer must perform for a cover marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverCopy {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// A resolved cover: public URL plus whatever metadata was available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cover {
    pub url: String,
    pub meta: Option<ImageMeta>,
    /// Set only for marker covers; inherited covers never carry the copy.
    pub copy: Option<CoverCopy>,
}

impl Cover {
    /// The same cover as seen from a parent: URL and metadata, no side effect.
    pub fn inherited(&self) -> Cover {
        Cover {
            url: self.url.clone(),
            meta: self.meta.clone(),
            copy: None,
        }
    }
}

/// Content-addressed file name for a copied cover.
///
/// `rel_source` is the marker's path relative to the public dir; it is hashed
/// with `/` separators on every platform.
pub fn cover_file_name(rel_source: &Path, image_name: &str) -> String {
    let key: Vec<String> = rel_source
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect();
    let digest = Sha256::digest(key.join("/").as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    format!("{}-{image_name}", &hex[..COVER_HASH_LEN])
}

/// True for names [`cover_file_name`] could have produced.
///
/// Used to prune stale copies without touching anything else a user keeps in
/// the covers directory.
pub fn is_generated_cover_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() > COVER_HASH_LEN + 1
        && bytes[COVER_HASH_LEN] == b'-'
        && bytes[..COVER_HASH_LEN]
            .iter()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Match a `.cover` line against the folder's files.
fn resolve_reference<'a>(dir: &'a SourceDir, reference: &str) -> Option<&'a str> {
    let wanted = basename(reference);
    dir.files
        .iter()
        .find(|f| f.as_str() == wanted)
        .or_else(|| {
            let lower = wanted.to_lowercase();
            dir.files.iter().find(|f| f.to_lowercase() == lower)
        })
        .map(String::as_str)
}

/// Resolve a folder's explicit cover (marker, then reference).
///
/// Returns `None` when neither is present or the reference dangles; the
/// caller then applies its fallback.
pub fn resolve_explicit_cover(
    dir: &SourceDir,
    ctx: &BuildContext,
    backend: &(impl ImageBackend + ?Sized),
) -> Option<Cover> {
    if let Some(marker) = dir.files.iter().find(|f| is_image_cover_marker(f)) {
        let from = dir.path.join(marker);
        let rel = ctx.relative_to_public(&from);
        let to = ctx
            .covers_dir
            .join(cover_file_name(&rel, strip_cover_marker(marker)));
        return Some(Cover {
            url: ctx.url_for(&to),
            meta: read_image_meta(backend, &from, &ctx.preview),
            copy: Some(CoverCopy { from, to }),
        });
    }

    let reference = dir.cover_ref.as_deref()?;
    let Some(name) = resolve_reference(dir, reference) else {
        log::debug!(
            "cover reference {reference:?} not found in {}",
            dir.path.display()
        );
        return None;
    };
    let path = dir.path.join(name);
    Some(Cover {
        url: ctx.url_for(&path),
        meta: read_image_meta(backend, &path, &ctx.preview),
        copy: None,
    })
}
