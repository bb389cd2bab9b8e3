//! Motion builder: partition the registry across project folders.
//!
//! ```text
//! Motion/
//! ├── .order           root: orders/hides projects (by folder name)
//! │                          and unclaimed videos (by registry key)
//! ├── Reel/
//! │   ├── .order       v2, v1, v2   → clips [v2, v1]
//! │   └── .cover       poster URL, used verbatim
//! └── Shorts/
//!     └── .order       v4
//!
//! registry: v1 v2 v3 v4     claimed: {v1, v2, v4}     leafVideos: [v3]
//! ```
//!
//! A project lists exactly the keys its `.order` names, in file order, each
//! once; keys missing from the registry are dropped. A key is *claimed* once
//! any visible project lists it. The claimed set is collected over all
//! projects before the root list is computed, so project order never changes
//! which videos are left over. Projects hidden by the root `.order` are not
//! built and claim nothing.

use crate::directives::{Directives, OrderFile};
use crate::naming::display_name;
use crate::order::resolve_order_by;
use crate::pipeline::BuildContext;
use crate::registry::{Registry, RegistryEntry};
use crate::scan::SourceDir;
use crate::types::{Manifest, MotionProject, MotionRoot, ProjectCard, VideoCount, VideoItem};
use std::collections::HashSet;
use std::path::PathBuf;

fn video_item(entry: &RegistryEntry) -> VideoItem {
    VideoItem {
        key: entry.key.clone(),
        display_name: entry.display_name.clone(),
        url: entry.url.clone(),
        poster: entry.poster.clone(),
    }
}

/// A derived project folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNode {
    pub path: PathBuf,
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub directives: Directives,
    pub clips: Vec<RegistryEntry>,
    pub cover_poster: Option<String>,
}

impl ProjectNode {
    pub fn manifest(&self) -> Manifest {
        Manifest::MotionProject(MotionProject {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            items: self.clips.iter().map(video_item).collect(),
            directives: self.directives,
        })
    }

    pub fn card(&self) -> ProjectCard {
        ProjectCard {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            path: self.url.clone(),
            cover_poster: self.cover_poster.clone(),
            count: VideoCount {
                videos: self.clips.len(),
            },
        }
    }

    pub fn listing(&self) -> Vec<String> {
        self.clips.iter().map(|c| c.key.clone()).collect()
    }
}

/// The derived Motion tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MotionTree {
    pub path: PathBuf,
    pub directives: Directives,
    pub projects: Vec<ProjectNode>,
    pub leaf_videos: Vec<RegistryEntry>,
}

impl MotionTree {
    pub fn manifest(&self) -> Manifest {
        Manifest::MotionRoot(MotionRoot {
            projects: self.projects.iter().map(ProjectNode::card).collect(),
            leaf_videos: self.leaf_videos.iter().map(video_item).collect(),
            directives: self.directives,
        })
    }

    pub fn project_listing(&self) -> Vec<String> {
        self.projects.iter().map(|p| p.name.clone()).collect()
    }

    pub fn video_listing(&self) -> Vec<String> {
        self.leaf_videos.iter().map(|v| v.key.clone()).collect()
    }

    pub fn clip_count(&self) -> usize {
        self.projects.iter().map(|p| p.clips.len()).sum()
    }
}

/// Registry entries named by an order file, in file order, each at most once.
pub fn resolve_clips(order: &OrderFile, registry: &Registry) -> Vec<RegistryEntry> {
    let mut seen = HashSet::new();
    order
        .order
        .iter()
        .filter(|key| !order.is_hidden(key))
        .filter_map(|key| registry.get(key))
        .filter(|entry| seen.insert(entry.key.to_lowercase()))
        .cloned()
        .collect()
}

fn derive_project(dir: &SourceDir, registry: &Registry, ctx: &BuildContext) -> ProjectNode {
    let clips = resolve_clips(&dir.order, registry);
    let cover_poster = dir
        .cover_ref
        .clone()
        .or_else(|| clips.first().and_then(|c| c.poster.clone()));
    ProjectNode {
        path: dir.path.clone(),
        name: dir.name.clone(),
        display_name: display_name(&dir.name),
        url: ctx.url_for(&dir.path),
        directives: dir.order.directives,
        clips,
        cover_poster,
    }
}

/// Derive every visible project plus the root's unclaimed videos.
pub fn derive_motion(root: &SourceDir, registry: &Registry, ctx: &BuildContext) -> MotionTree {
    let candidates: Vec<&SourceDir> = root.dirs.iter().collect();
    let projects: Vec<ProjectNode> = resolve_order_by(
        candidates,
        &root.order,
        |d| d.name.as_str(),
        |d| d.name.as_str(),
    )
    .into_iter()
    .map(|d| derive_project(d, registry, ctx))
    .collect();

    let claimed: HashSet<String> = projects
        .iter()
        .flat_map(|p| p.clips.iter().map(|c| c.key.to_lowercase()))
        .collect();

    let unclaimed: Vec<RegistryEntry> = registry
        .entries()
        .iter()
        .filter(|e| !claimed.contains(&e.key.to_lowercase()))
        .cloned()
        .collect();
    let leaf_videos = resolve_order_by(
        unclaimed,
        &root.order,
        |e| e.key.as_str(),
        |e| e.display_name.as_str(),
    );

    MotionTree {
        path: root.path.clone(),
        directives: root.order.directives,
        projects,
        leaf_videos,
    }
}
