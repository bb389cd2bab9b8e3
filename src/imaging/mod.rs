//! The image-metadata collaborator.
//!
//! Manifests carry, per image, its pixel dimensions and a tiny blurred
//! preview (a ~24px JPEG as a data URL). Both come from here:
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** (raster) | `image::ImageReader::into_dimensions` (format sniffed) |
//! | **Identify** (AVIF) | `avif-parse` container header |
//! | **Identify** (SVG) | `usvg::Tree::size` |
//! | **Preview** | `DynamicImage::thumbnail` → JPEG → base64 data URL |
//!
//! The module is split into:
//! - **Parameters**: [`PreviewParams`] and [`Quality`]
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`] + [`DisabledBackend`]
//! - **Operations**: [`read_image_meta`], which turns backend failures into
//!   "no metadata" so a bad file never fails a build

pub mod backend;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, DisabledBackend, ImageBackend};
pub use operations::read_image_meta;
pub use params::{PreviewParams, Quality};
pub use rust_backend::RustBackend;
