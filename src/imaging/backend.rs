//! Image metadata backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the builders need:
//! identify (pixel dimensions) and preview (tiny inline JPEG).
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend) — pure Rust, statically
//! linked. [`DisabledBackend`] stands in when metadata is switched off in
//! config; every call reports the collaborator as unavailable and the
//! builders emit items without metadata.

use super::params::PreviewParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {0}")]
    Decode(String),
    #[error("Unsupported format for {0}")]
    Unsupported(String),
    #[error("Image metadata collaborator unavailable")]
    Unavailable,
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image metadata backends.
///
/// `Sync` because sibling folders are derived in parallel with rayon and
/// share one backend.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Produce a `data:` URL holding a tiny preview of the image.
    fn preview(&self, path: &Path, params: &PreviewParams) -> Result<String, BackendError>;
}

/// Backend used when metadata extraction is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledBackend;

impl ImageBackend for DisabledBackend {
    fn identify(&self, _path: &Path) -> Result<Dimensions, BackendError> {
        Err(BackendError::Unavailable)
    }

    fn preview(&self, _path: &Path, _params: &PreviewParams) -> Result<String, BackendError> {
        Err(BackendError::Unavailable)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Mock backend keyed by file name that records every call.
    ///
    /// Uses Mutex (not RefCell) so it is Sync and works with rayon's par_iter.
    /// Names without registered dimensions fail to identify; names listed in
    /// `no_preview` identify but fail to preview.
    #[derive(Default)]
    pub struct MockBackend {
        pub dimensions: HashMap<String, Dimensions>,
        pub no_preview: Vec<String>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Preview { name: String, width: u32 },
    }

    impl MockBackend {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_dimensions(dims: &[(&str, u32, u32)]) -> Self {
            Self {
                dimensions: dims
                    .iter()
                    .map(|(name, width, height)| {
                        (
                            name.to_string(),
                            Dimensions {
                                width: *width,
                                height: *height,
                            },
                        )
                    })
                    .collect(),
                ..Self::default()
            }
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }

        /// The data URL this mock returns for a file name.
        pub fn preview_for(name: &str) -> String {
            format!("data:image/jpeg;base64,{name}")
        }
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            let name = file_name(path);
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(name.clone()));
            self.dimensions
                .get(&name)
                .copied()
                .ok_or(BackendError::Decode(name))
        }

        fn preview(&self, path: &Path, params: &PreviewParams) -> Result<String, BackendError> {
            let name = file_name(path);
            self.operations.lock().unwrap().push(RecordedOp::Preview {
                name: name.clone(),
                width: params.width,
            });
            if self.no_preview.contains(&name) {
                return Err(BackendError::Unsupported(name));
            }
            Ok(Self::preview_for(&name))
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(&[("image.jpg", 800, 600)]);

        let result = backend.identify(Path::new("/test/image.jpg")).unwrap();
        assert_eq!(result.width, 800);
        assert_eq!(result.height, 600);

        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], RecordedOp::Identify(p) if p == "image.jpg"));
    }

    #[test]
    fn mock_unknown_file_fails_identify() {
        let backend = MockBackend::new();
        assert!(backend.identify(Path::new("/test/missing.jpg")).is_err());
    }

    #[test]
    fn disabled_backend_is_unavailable() {
        let backend = DisabledBackend;
        assert!(matches!(
            backend.identify(Path::new("a.jpg")),
            Err(BackendError::Unavailable)
        ));
        assert!(matches!(
            backend.preview(Path::new("a.jpg"), &PreviewParams::default()),
            Err(BackendError::Unavailable)
        ));
    }
}
