//! Stills builder: derive the manifest tree for the image hierarchy.
//!
//! Pure: reads only the [`SourceDir`] snapshot and the metadata backend, and
//! returns a [`StillsTree`] that [`write`](crate::write) lowers to files.
//!
//! ## Folder Kinds
//!
//! A folder with at least one *visible* subfolder is a **folder index**, even
//! if loose images sit next to the subfolders. Every other folder is a
//! **leaf gallery**. Visible means not dot-named and not hidden by the
//! folder's own `.order`.
//!
//! ```text
//! Stills/                      portfolio-root  (first-level folders)
//! ├── Travel/                  folder-index    (Japan, Italy)
//! │   ├── Japan/               leaf-gallery
//! │   └── Italy/               leaf-gallery
//! └── Cats/                    leaf-gallery
//! ```
//!
//! ## Covers
//!
//! Explicit covers come from [`cover`](crate::cover). Otherwise a folder
//! index inherits the cover of its first child (in display order) that has
//! one, and a leaf gallery uses its first image. Metadata travels with the
//! cover in both cases.
//!
//! Sibling subtrees are derived in parallel; results keep display order.
//!
//! A folder that could not be read is still listed by its parent, as an
//! empty gallery with no cover.

use crate::cover::{Cover, resolve_explicit_cover};
use crate::directives::Directives;
use crate::imaging::{ImageBackend, read_image_meta};
use crate::naming::{display_name, is_cover_marker, is_image_name};
use crate::order::{resolve_order, resolve_order_by};
use crate::pipeline::BuildContext;
use crate::scan::SourceDir;
use crate::types::{
    Counts, FolderCard, FolderIndex, GalleryItem, ImageMeta, LeafGallery, Manifest, PortfolioRoot,
};
use rayon::prelude::*;
use std::path::PathBuf;

/// One image of a leaf gallery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryImage {
    pub name: String,
    pub src: String,
    pub meta: Option<ImageMeta>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderContent {
    Index(Vec<FolderNode>),
    Gallery(Vec<GalleryImage>),
}

/// A derived Stills folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderNode {
    pub path: PathBuf,
    pub name: String,
    pub display_name: String,
    pub url: String,
    pub cover: Option<Cover>,
    pub directives: Directives,
    pub content: FolderContent,
    /// Read as empty because it could not be listed; nothing is written into it.
    pub unreadable: bool,
}

impl FolderNode {
    /// Shallow counts: images for a gallery, subfolders for an index.
    pub fn counts(&self) -> Counts {
        match &self.content {
            FolderContent::Index(children) => Counts {
                images: 0,
                folders: children.len(),
            },
            FolderContent::Gallery(images) => Counts {
                images: images.len(),
                folders: 0,
            },
        }
    }

    /// How a parent lists this folder.
    pub fn card(&self) -> FolderCard {
        FolderCard {
            name: self.name.clone(),
            display_name: self.display_name.clone(),
            path: self.url.clone(),
            cover: self.cover.as_ref().map(|c| c.url.clone()),
            cover_meta: self.cover.as_ref().and_then(|c| c.meta.clone()),
            counts: self.counts(),
        }
    }

    pub fn manifest(&self) -> Manifest {
        let cover = self.cover.as_ref().map(|c| c.url.clone());
        let cover_meta = self.cover.as_ref().and_then(|c| c.meta.clone());
        match &self.content {
            FolderContent::Index(children) => Manifest::FolderIndex(FolderIndex {
                cover,
                cover_meta,
                children: children.iter().map(FolderNode::card).collect(),
                directives: self.directives,
            }),
            FolderContent::Gallery(images) => Manifest::LeafGallery(LeafGallery {
                cover,
                cover_meta,
                items: images.iter().map(GalleryImage::item).collect(),
                directives: self.directives,
            }),
        }
    }

    /// Resolved names for the folder's convenience listing.
    pub fn listing(&self) -> Vec<String> {
        match &self.content {
            FolderContent::Index(children) => children.iter().map(|c| c.name.clone()).collect(),
            FolderContent::Gallery(images) => images.iter().map(|i| i.name.clone()).collect(),
        }
    }

    /// This folder and every descendant, children before parents.
    pub fn post_order(&self) -> Vec<&FolderNode> {
        let mut out = Vec::new();
        self.collect_post_order(&mut out);
        out
    }

    fn collect_post_order<'a>(&'a self, out: &mut Vec<&'a FolderNode>) {
        if let FolderContent::Index(children) = &self.content {
            for child in children {
                child.collect_post_order(out);
            }
        }
        out.push(self);
    }
}

impl GalleryImage {
    fn item(&self) -> GalleryItem {
        GalleryItem {
            src: self.src.clone(),
            w: self.meta.as_ref().map(|m| m.w),
            h: self.meta.as_ref().map(|m| m.h),
            blur_data_url: self.meta.as_ref().and_then(|m| m.blur_data_url.clone()),
        }
    }
}

/// The whole derived Stills tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StillsTree {
    pub path: PathBuf,
    pub directives: Directives,
    pub folders: Vec<FolderNode>,
}

impl StillsTree {
    pub fn manifest(&self) -> Manifest {
        Manifest::PortfolioRoot(PortfolioRoot {
            folders: self.folders.iter().map(FolderNode::card).collect(),
            directives: self.directives,
        })
    }

    pub fn listing(&self) -> Vec<String> {
        self.folders.iter().map(|f| f.name.clone()).collect()
    }

    /// Every folder in the tree, children before parents.
    pub fn nodes(&self) -> Vec<&FolderNode> {
        self.folders.iter().flat_map(FolderNode::post_order).collect()
    }
}

/// Subfolders that are not hidden by this folder's `.order`, in display order.
fn visible_dirs(dir: &SourceDir) -> Vec<&SourceDir> {
    let candidates: Vec<&SourceDir> = dir.dirs.iter().collect();
    resolve_order_by(
        candidates,
        &dir.order,
        |d| d.name.as_str(),
        |d| d.name.as_str(),
    )
}

/// Derive the root: every visible first-level folder, ordered by the root `.order`.
pub fn derive_stills(
    root: &SourceDir,
    ctx: &BuildContext,
    backend: &(impl ImageBackend + ?Sized),
) -> StillsTree {
    let folders = visible_dirs(root)
        .into_par_iter()
        .map(|d| derive_folder(d, ctx, backend))
        .collect();
    StillsTree {
        path: root.path.clone(),
        directives: root.order.directives,
        folders,
    }
}

/// Derive one folder and, recursively, everything below it.
pub fn derive_folder(
    dir: &SourceDir,
    ctx: &BuildContext,
    backend: &(impl ImageBackend + ?Sized),
) -> FolderNode {
    let explicit = resolve_explicit_cover(dir, ctx, backend);
    let subdirs = visible_dirs(dir);

    let (content, cover) = if subdirs.is_empty() {
        let images = derive_gallery(dir, ctx, backend);
        let cover = explicit.or_else(|| {
            images.first().map(|first| Cover {
                url: first.src.clone(),
                meta: first.meta.clone(),
                copy: None,
            })
        });
        (FolderContent::Gallery(images), cover)
    } else {
        let children: Vec<FolderNode> = subdirs
            .into_par_iter()
            .map(|d| derive_folder(d, ctx, backend))
            .collect();
        let cover = explicit.or_else(|| {
            children
                .iter()
                .find_map(|c| c.cover.as_ref())
                .map(Cover::inherited)
        });
        (FolderContent::Index(children), cover)
    };

    FolderNode {
        path: dir.path.clone(),
        name: dir.name.clone(),
        display_name: display_name(&dir.name),
        url: ctx.url_for(&dir.path),
        cover,
        directives: dir.order.directives,
        content,
        unreadable: dir.unreadable,
    }
}

fn derive_gallery(
    dir: &SourceDir,
    ctx: &BuildContext,
    backend: &(impl ImageBackend + ?Sized),
) -> Vec<GalleryImage> {
    let candidates: Vec<String> = dir
        .files
        .iter()
        .filter(|f| is_image_name(f) && !is_cover_marker(f))
        .cloned()
        .collect();

    resolve_order(candidates, &dir.order)
        .into_par_iter()
        .map(|name| {
            let path = dir.path.join(&name);
            GalleryImage {
                src: ctx.url_for(&path),
                meta: read_image_meta(backend, &path, &ctx.preview),
                name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directives::OrderFile;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{source_dir, test_context, with_dirs};
    use std::path::Path;

    const CATS: &str = "/site/public/Stills/Cats";

    fn ctx() -> BuildContext {
        test_context(Path::new("/site"))
    }

    fn gallery_names(node: &FolderNode) -> Vec<&str> {
        match &node.content {
            FolderContent::Gallery(images) => images.iter().map(|i| i.name.as_str()).collect(),
            FolderContent::Index(_) => panic!("expected a gallery: {}", node.name),
        }
    }

    fn child_names(node: &FolderNode) -> Vec<&str> {
        match &node.content {
            FolderContent::Index(children) => children.iter().map(|c| c.name.as_str()).collect(),
            FolderContent::Gallery(_) => panic!("expected an index: {}", node.name),
        }
    }

    // =========================================================================
    // Leaf galleries
    // =========================================================================

    #[test]
    fn gallery_keeps_images_only() {
        let dir = source_dir(CATS, &["b.jpg", "a.PNG", "notes.txt", "hero.jpg.cover"]);
        let node = derive_folder(&dir, &ctx(), &MockBackend::new());
        assert_eq!(gallery_names(&node), vec!["a.PNG", "b.jpg"]);
    }

    #[test]
    fn gallery_respects_order_and_hidden() {
        let mut dir = source_dir(CATS, &["a.jpg", "b.jpg", "c.jpg"]);
        dir.order = OrderFile::parse("c.jpg\n.A.JPG\n");
        let node = derive_folder(&dir, &ctx(), &MockBackend::new());
        assert_eq!(gallery_names(&node), vec!["c.jpg", "b.jpg"]);
    }

    #[test]
    fn gallery_items_carry_metadata_when_available() {
        let dir = source_dir(CATS, &["a.jpg", "broken.jpg"]);
        let backend = MockBackend::with_dimensions(&[("a.jpg", 30, 20)]);
        let node = derive_folder(&dir, &ctx(), &backend);

        let Manifest::LeafGallery(leaf) = node.manifest() else {
            panic!("expected leaf gallery");
        };
        assert_eq!(leaf.items[0].src, "/Stills/Cats/a.jpg");
        assert_eq!((leaf.items[0].w, leaf.items[0].h), (Some(30), Some(20)));
        assert!(leaf.items[0].blur_data_url.is_some());
        assert_eq!(leaf.items[1].w, None);
        assert_eq!(leaf.items[1].blur_data_url, None);
    }

    #[test]
    fn gallery_cover_falls_back_to_first_image_with_meta() {
        let mut dir = source_dir(CATS, &["a.jpg", "b.jpg"]);
        dir.order = OrderFile::parse("b.jpg\n");
        let backend = MockBackend::with_dimensions(&[("b.jpg", 8, 6)]);
        let node = derive_folder(&dir, &ctx(), &backend);

        let cover = node.cover.unwrap();
        assert_eq!(cover.url, "/Stills/Cats/b.jpg");
        assert_eq!(cover.meta.map(|m| (m.w, m.h)), Some((8, 6)));
        assert_eq!(cover.copy, None);
    }

    #[test]
    fn empty_gallery_has_null_cover() {
        let dir = source_dir(CATS, &["readme.txt"]);
        let node = derive_folder(&dir, &ctx(), &MockBackend::new());
        assert_eq!(node.cover, None);
        assert_eq!(node.counts(), Counts::default());
    }

    #[test]
    fn directives_come_from_own_order_only() {
        let mut dir = source_dir(CATS, &["a.jpg"]);
        dir.order = OrderFile::parse("max_columns=9\naspect_ratio=0\n");
        let node = derive_folder(&dir, &ctx(), &MockBackend::new());
        assert_eq!(node.directives.max_columns, Some(8));
    }

    // =========================================================================
    // Folder indexes
    // =========================================================================

    #[test]
    fn visible_subfolder_makes_an_index_despite_loose_images() {
        let dir = with_dirs(
            source_dir("/site/public/Stills/Travel", &["loose.jpg"]),
            vec![source_dir("/site/public/Stills/Travel/Japan", &["t.jpg"])],
        );
        let node = derive_folder(&dir, &ctx(), &MockBackend::new());
        assert!(matches!(node.manifest(), Manifest::FolderIndex(_)));
        assert_eq!(child_names(&node), vec!["Japan"]);
    }

    #[test]
    fn folder_hidden_by_order_does_not_count_as_visible() {
        let mut dir = with_dirs(
            source_dir("/site/public/Stills/Travel", &["loose.jpg"]),
            vec![source_dir("/site/public/Stills/Travel/drafts", &["d.jpg"])],
        );
        dir.order = OrderFile::parse(".drafts\n");
        let node = derive_folder(&dir, &ctx(), &MockBackend::new());
        assert_eq!(gallery_names(&node), vec!["loose.jpg"]);
    }

    #[test]
    fn index_orders_children_and_inherits_first_child_cover() {
        let mut dir = with_dirs(
            source_dir("/site/public/Stills/Travel", &[]),
            vec![
                source_dir("/site/public/Stills/Travel/Empty", &[]),
                source_dir("/site/public/Stills/Travel/Italy", &["r.jpg"]),
                source_dir("/site/public/Stills/Travel/Japan", &["t.jpg"]),
            ],
        );
        dir.order = OrderFile::parse("Empty/\nJapan/\n");
        let backend = MockBackend::with_dimensions(&[("t.jpg", 4, 3)]);
        let node = derive_folder(&dir, &ctx(), &backend);

        assert_eq!(child_names(&node), vec!["Empty", "Japan", "Italy"]);
        let cover = node.cover.clone().unwrap();
        assert_eq!(cover.url, "/Stills/Travel/Japan/t.jpg");
        assert_eq!(cover.meta.map(|m| m.w), Some(4));

        let Manifest::FolderIndex(index) = node.manifest() else {
            panic!("expected folder index");
        };
        assert_eq!(index.children[0].cover, None);
        assert_eq!(index.children[1].display_name, "Japan");
        assert_eq!(index.children[1].path, "/Stills/Travel/Japan");
        assert_eq!(
            index.children[1].counts,
            Counts {
                images: 1,
                folders: 0
            }
        );
        assert_eq!(node.counts().folders, 3);
    }

    #[test]
    fn inherited_cover_never_copies_again() {
        let dir = with_dirs(
            source_dir("/site/public/Stills/Travel", &[]),
            vec![source_dir(
                "/site/public/Stills/Travel/Japan",
                &["t.jpg", "t.jpg.cover"],
            )],
        );
        let node = derive_folder(&dir, &ctx(), &MockBackend::new());
        let cover = node.cover.unwrap();
        assert!(cover.url.starts_with("/_covers/"));
        assert_eq!(cover.copy, None);
    }

    // =========================================================================
    // Root
    // =========================================================================

    #[test]
    fn root_lists_first_level_folders_in_order() {
        let mut root = with_dirs(
            source_dir("/site/public/Stills", &["stray.jpg"]),
            vec![
                source_dir("/site/public/Stills/b-roll", &["x.jpg"]),
                source_dir("/site/public/Stills/Cats", &["a.jpg"]),
                source_dir("/site/public/Stills/private", &["p.jpg"]),
            ],
        );
        root.order = OrderFile::parse("title_display=1\n---\nCats\n.private\n");
        let tree = derive_stills(&root, &ctx(), &MockBackend::new());

        assert_eq!(tree.listing(), vec!["Cats", "b-roll"]);
        let Manifest::PortfolioRoot(m) = tree.manifest() else {
            panic!("expected portfolio root");
        };
        assert_eq!(m.folders[1].display_name, "B Roll");
        assert!(m.directives.title_display.is_some());
    }

    #[test]
    fn nodes_are_children_before_parents() {
        let root = with_dirs(
            source_dir("/site/public/Stills", &[]),
            vec![with_dirs(
                source_dir("/site/public/Stills/Travel", &[]),
                vec![source_dir("/site/public/Stills/Travel/Japan", &["t.jpg"])],
            )],
        );
        let tree = derive_stills(&root, &ctx(), &MockBackend::new());
        let names: Vec<&str> = tree.nodes().iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Japan", "Travel"]);
    }
}
