//! Centralized filename conventions shared by both trees.
//!
//! Every builder asks the same questions about a directory entry: is it
//! hidden, is it an image, is it a cover marker, what is its display name,
//! and what URL does it publish under. This module answers them in one place
//! so the Stills and Motion builders (and the watcher's input classifier)
//! can never disagree.
//!
//! ## Display Names
//!
//! Folder names are humanized for display: runs of `-` and `_` become a
//! single space and every word is capitalized:
//! - `black-and-white/` → "Black And White"
//! - `street__2019` → "Street 2019"
//! - `Reel` → "Reel"
//!
//! ## URLs
//!
//! URLs are derived deterministically from a path relative to the public
//! web root: `/` + each path segment percent-encoded, joined with `/`.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use std::path::Path;

/// Image extensions a leaf gallery accepts (compared case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif", "gif", "svg"];

/// Suffix that turns `hero.jpg` into the explicit cover marker `hero.jpg.cover`.
pub const COVER_MARKER_SUFFIX: &str = ".cover";

/// Per-folder order/directive file.
pub const ORDER_FILE: &str = ".order";
/// Per-folder one-line cover reference.
pub const COVER_REFERENCE_FILE: &str = ".cover";

pub const MANIFEST_FILE: &str = "manifest.json";
pub const IMAGES_LISTING: &str = ".images";
pub const FOLDERS_LISTING: &str = ".folders";
pub const VIDEOS_LISTING: &str = ".videos";
pub const PROJECTS_LISTING: &str = ".projects";

/// Every file name the writer produces inside the source trees.
///
/// The watcher refuses to treat any of these as input.
pub const GENERATED_FILES: &[&str] = &[
    MANIFEST_FILE,
    IMAGES_LISTING,
    FOLDERS_LISTING,
    VIDEOS_LISTING,
    PROJECTS_LISTING,
];

/// Characters escaped inside a single URL path segment.
///
/// Everything `encodeURI` would escape, plus the delimiters that would change
/// the meaning of a path when they appear inside a file name.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

/// Dot-prefixed entries are never visible, regardless of any order file.
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.')
}

/// Lowercased extension of a file name, if any.
pub fn extension_lower(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
}

/// True for names with one of the [`IMAGE_EXTENSIONS`].
pub fn is_image_name(name: &str) -> bool {
    extension_lower(name).is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// True for `*.cover` names (case-insensitive).
pub fn is_cover_marker(name: &str) -> bool {
    name.len()
        .checked_sub(COVER_MARKER_SUFFIX.len())
        .and_then(|start| name.get(start..))
        .is_some_and(|tail| tail.eq_ignore_ascii_case(COVER_MARKER_SUFFIX))
}

/// Strip a trailing `.cover` marker suffix, if present.
///
/// `hero.jpg.cover` → `hero.jpg`; names without the suffix come back unchanged.
pub fn strip_cover_marker(name: &str) -> &str {
    if is_cover_marker(name) {
        &name[..name.len() - COVER_MARKER_SUFFIX.len()]
    } else {
        name
    }
}

/// A cover marker whose stripped name is an image: `hero.jpg.cover`, not `notes.cover`.
pub fn is_image_cover_marker(name: &str) -> bool {
    is_cover_marker(name) && is_image_name(strip_cover_marker(name))
}

/// Last path component of an order-file entry (`a/b/c.jpg` → `c.jpg`).
pub fn basename(entry: &str) -> &str {
    entry
        .rsplit(['/', '\\'])
        .find(|s| !s.is_empty())
        .unwrap_or(entry)
}

/// Humanize a raw folder name for display.
///
/// Runs of `-`/`_` collapse to one space; the first alphanumeric character of
/// each word is uppercased. Other characters are preserved as-is.
pub fn display_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut in_separator = false;
    for c in raw.chars() {
        if c == '-' || c == '_' {
            if !in_separator {
                out.push(' ');
            }
            in_separator = true;
        } else {
            out.push(c);
            in_separator = false;
        }
    }

    let mut titled = String::with_capacity(out.len());
    let mut at_word_start = true;
    for c in out.chars() {
        if c.is_alphanumeric() {
            if at_word_start {
                titled.extend(c.to_uppercase());
            } else {
                titled.push(c);
            }
            at_word_start = false;
        } else {
            titled.push(c);
            at_word_start = true;
        }
    }
    titled
}

/// Percent-encode one URL path segment.
pub fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Derive the public URL for a path relative to the web root.
///
/// ```text
/// Stills/Black and White/001.jpg → /Stills/Black%20and%20White/001.jpg
/// ```
pub fn url_from_relative(rel: &Path) -> String {
    let segments: Vec<String> = rel
        .components()
        .map(|c| encode_segment(&c.as_os_str().to_string_lossy()))
        .collect();
    format!("/{}", segments.join("/"))
}
