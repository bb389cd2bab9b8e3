//! High-level metadata operations.
//!
//! Builders never talk to a backend directly: they ask for an
//! [`ImageMeta`] and get `None` when the collaborator cannot help. A corrupt
//! file, an unsupported format or a disabled backend degrades the item, it
//! never fails the build.

use super::backend::ImageBackend;
use super::params::PreviewParams;
use crate::types::ImageMeta;
use std::path::Path;

/// Read dimensions and, when possible, an inline preview.
///
/// - identify fails → `None` (item is emitted without metadata)
/// - identify succeeds, preview fails → dimensions only
/// - zero-sized results are treated as unreadable
pub fn read_image_meta(
    backend: &(impl ImageBackend + ?Sized),
    path: &Path,
    params: &PreviewParams,
) -> Option<ImageMeta> {
    let dims = match backend.identify(path) {
        Ok(d) if d.width > 0 && d.height > 0 => d,
        Ok(_) => {
            log::debug!("zero-sized image, skipping metadata: {}", path.display());
            return None;
        }
        Err(e) => {
            log::debug!("no metadata for {}: {e}", path.display());
            return None;
        }
    };

    let blur_data_url = match backend.preview(path, params) {
        Ok(url) => Some(url),
        Err(e) => {
            log::debug!("no preview for {}: {e}", path.display());
            None
        }
    };

    Some(ImageMeta {
        w: dims.width,
        h: dims.height,
        blur_data_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::DisabledBackend;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn full_metadata_when_backend_succeeds() {
        let backend = MockBackend::with_dimensions(&[("a.jpg", 30, 20)]);
        let meta = read_image_meta(&backend, Path::new("/x/a.jpg"), &PreviewParams::default());
        assert_eq!(
            meta,
            Some(ImageMeta {
                w: 30,
                h: 20,
                blur_data_url: Some(MockBackend::preview_for("a.jpg")),
            })
        );
    }

    #[test]
    fn identify_failure_means_no_metadata_and_no_preview_call() {
        let backend = MockBackend::new();
        let meta = read_image_meta(&backend, Path::new("/x/a.jpg"), &PreviewParams::default());
        assert_eq!(meta, None);
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Identify("a.jpg".into())]
        );
    }

    #[test]
    fn preview_failure_keeps_dimensions() {
        let mut backend = MockBackend::with_dimensions(&[("logo.svg", 100, 50)]);
        backend.no_preview.push("logo.svg".into());
        let meta = read_image_meta(&backend, Path::new("logo.svg"), &PreviewParams::default())
            .unwrap();
        assert_eq!((meta.w, meta.h), (100, 50));
        assert_eq!(meta.blur_data_url, None);
    }

    #[test]
    fn zero_dimensions_are_discarded() {
        let backend = MockBackend::with_dimensions(&[("a.jpg", 0, 10)]);
        let meta = read_image_meta(&backend, Path::new("a.jpg"), &PreviewParams::default());
        assert_eq!(meta, None);
    }

    #[test]
    fn disabled_backend_degrades() {
        let meta = read_image_meta(
            &DisabledBackend,
            Path::new("a.jpg"),
            &PreviewParams::default(),
        );
        assert_eq!(meta, None);
    }
}
