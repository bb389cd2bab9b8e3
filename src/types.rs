//! The manifest schema: the on-disk contract read by the page layer.
//!
//! Every `manifest.json` is a [`ManifestFile`]: a schema `version` plus one
//! [`Manifest`] variant, discriminated by `kind`:
//!
//! | `kind` | Written to | Lists |
//! |---|---|---|
//! | `portfolio-root` | `Stills/manifest.json` | first-level folders |
//! | `folder-index` | any Stills folder with visible subfolders | child folders |
//! | `leaf-gallery` | any Stills folder without visible subfolders | images |
//! | `motion-root` | `Motion/manifest.json` | projects + unclaimed videos |
//! | `motion-project` | `Motion/<project>/manifest.json` | a project's clips |
//!
//! Field names are camelCase. Optional fields are omitted when absent, except
//! `cover`, `coverPoster` and `poster`, which are always present (`null` when
//! unresolved) because consumers test them directly.

use crate::directives::Directives;
use serde::{Deserialize, Serialize};

/// Bump when a field changes meaning or disappears; additions don't count.
pub const MANIFEST_VERSION: u32 = 1;

/// Dimensions and inline preview for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMeta {
    pub w: u32,
    pub h: u32,
    #[serde(
        rename = "blurDataURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub blur_data_url: Option<String>,
}

/// Shallow, one-level counts shown on a folder card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counts {
    pub images: usize,
    pub folders: usize,
}

/// A child folder as listed by its parent (or by the Stills root).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderCard {
    pub name: String,
    pub display_name: String,
    pub path: String,
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_meta: Option<ImageMeta>,
    pub counts: Counts,
}

/// One image in a leaf gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryItem {
    pub src: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub h: Option<u32>,
    #[serde(
        rename = "blurDataURL",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub blur_data_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderIndex {
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_meta: Option<ImageMeta>,
    pub children: Vec<FolderCard>,
    #[serde(flatten)]
    pub directives: Directives,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeafGallery {
    pub cover: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_meta: Option<ImageMeta>,
    pub items: Vec<GalleryItem>,
    #[serde(flatten)]
    pub directives: Directives,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioRoot {
    pub folders: Vec<FolderCard>,
    #[serde(flatten)]
    pub directives: Directives,
}

/// A registry entry as published in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoItem {
    pub key: String,
    pub display_name: String,
    pub url: String,
    pub poster: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoCount {
    pub videos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCard {
    pub name: String,
    pub display_name: String,
    pub path: String,
    pub cover_poster: Option<String>,
    pub count: VideoCount,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionProject {
    pub name: String,
    pub display_name: String,
    pub items: Vec<VideoItem>,
    #[serde(flatten)]
    pub directives: Directives,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotionRoot {
    pub projects: Vec<ProjectCard>,
    pub leaf_videos: Vec<VideoItem>,
    #[serde(flatten)]
    pub directives: Directives,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Manifest {
    FolderIndex(FolderIndex),
    LeafGallery(LeafGallery),
    MotionProject(MotionProject),
    MotionRoot(MotionRoot),
    PortfolioRoot(PortfolioRoot),
}

impl Manifest {
    /// The `kind` discriminator as written to disk.
    pub fn kind(&self) -> &'static str {
        match self {
            Manifest::FolderIndex(_) => "folder-index",
            Manifest::LeafGallery(_) => "leaf-gallery",
            Manifest::MotionProject(_) => "motion-project",
            Manifest::MotionRoot(_) => "motion-root",
            Manifest::PortfolioRoot(_) => "portfolio-root",
        }
    }
}

/// A manifest as serialized: `{"version": 1, "kind": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
    pub version: u32,
    #[serde(flatten)]
    pub manifest: Manifest,
}

impl ManifestFile {
    pub fn new(manifest: Manifest) -> Self {
        Self {
            version: MANIFEST_VERSION,
            manifest,
        }
    }

    /// Pretty JSON with a trailing newline; byte-stable for equal input.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        Ok(json)
    }
}
