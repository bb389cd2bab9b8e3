//! Pure Rust metadata backend — no system libraries.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify (JPEG, PNG, WebP, GIF) | `image::ImageReader` with content sniffing |
//! | Identify (AVIF) | `avif-parse` primary item metadata (no AV1 decode) |
//! | Identify (SVG) | `usvg` tree size |
//! | Preview | `DynamicImage::thumbnail` + `JpegEncoder` + `base64` |
//!
//! Formats are chosen by the *effective* name: a cover marker such as
//! `hero.avif.cover` is treated as `hero.avif`. Everything else goes through
//! content sniffing, so mislabelled extensions still identify.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::PreviewParams;
use crate::naming::{extension_lower, strip_cover_marker};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Avif,
    Svg,
    Raster,
}

fn kind_of(path: &Path) -> Kind {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    match extension_lower(strip_cover_marker(&name)).as_deref() {
        Some("avif") => Kind::Avif,
        Some("svg") => Kind::Svg,
        _ => Kind::Raster,
    }
}

fn open_sniffed(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Extract dimensions from an AVIF file's container metadata (no full decode needed).
fn identify_avif(path: &Path) -> Result<Dimensions, BackendError> {
    let file_data = std::fs::read(path)?;
    let avif = avif_parse::read_avif(&mut std::io::Cursor::new(&file_data))
        .map_err(|e| BackendError::Decode(format!("{}: {e:?}", path.display())))?;
    let meta = avif
        .primary_item_metadata()
        .map_err(|e| BackendError::Decode(format!("{}: {e:?}", path.display())))?;
    Ok(Dimensions {
        width: meta.max_frame_width.get(),
        height: meta.max_frame_height.get(),
    })
}

/// Intrinsic SVG size, rounded to whole pixels.
fn identify_svg(path: &Path) -> Result<Dimensions, BackendError> {
    let data = std::fs::read(path)?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|e| BackendError::Decode(format!("{}: {e}", path.display())))?;
    let size = tree.size();
    Ok(Dimensions {
        width: size.width().round() as u32,
        height: size.height().round() as u32,
    })
}

/// Fit inside the preview box and encode as a base64 JPEG data URL.
fn encode_preview(img: &DynamicImage, params: &PreviewParams) -> Result<String, BackendError> {
    let small = if img.width() > params.width || img.height() > params.width {
        img.thumbnail(params.width, params.width)
    } else {
        img.clone()
    };
    let rgb = DynamicImage::ImageRgb8(small.to_rgb8());

    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, params.quality.value() as u8);
    rgb.write_with_encoder(encoder)
        .map_err(|e| BackendError::Decode(format!("preview encode failed: {e}")))?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&buf)))
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        match kind_of(path) {
            Kind::Avif => identify_avif(path),
            Kind::Svg => identify_svg(path),
            Kind::Raster => {
                let (width, height) = open_sniffed(path)?
                    .into_dimensions()
                    .map_err(|e| BackendError::Decode(format!("{}: {e}", path.display())))?;
                Ok(Dimensions { width, height })
            }
        }
    }

    fn preview(&self, path: &Path, params: &PreviewParams) -> Result<String, BackendError> {
        if kind_of(path) != Kind::Raster {
            return Err(BackendError::Unsupported(path.display().to_string()));
        }
        let img = open_sniffed(path)?
            .decode()
            .map_err(|e| BackendError::Decode(format!("{}: {e}", path.display())))?;
        encode_preview(&img, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::Quality;
    use image::{ImageEncoder, RgbImage};

    /// Create a small valid JPEG file with the given dimensions.
    fn create_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
        });
        let file = std::fs::File::create(path).unwrap();
        let writer = std::io::BufWriter::new(file);
        JpegEncoder::new(writer)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn decode_data_url(url: &str) -> DynamicImage {
        let b64 = url.strip_prefix("data:image/jpeg;base64,").unwrap();
        let bytes = STANDARD.decode(b64).unwrap();
        image::load_from_memory(&bytes).unwrap()
    }

    #[test]
    fn identify_synthetic_jpeg() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("test.jpg");
        create_test_jpeg(&path, 200, 150);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 200, height: 150 });
    }

    #[test]
    fn identify_cover_marker_by_content() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("hero.jpg.cover");
        create_test_jpeg(&path, 64, 32);

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 64, height: 32 });
    }

    #[test]
    fn identify_svg_size() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logo.svg");
        std::fs::write(
            &path,
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="40"><rect width="120" height="40"/></svg>"#,
        )
        .unwrap();

        let dims = RustBackend::new().identify(&path).unwrap();
        assert_eq!(dims, Dimensions { width: 120, height: 40 });
    }

    #[test]
    fn identify_nonexistent_file_errors() {
        let result = RustBackend::new().identify(Path::new("/nonexistent/image.jpg"));
        assert!(result.is_err());
    }

    #[test]
    fn identify_garbage_errors() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.jpg");
        std::fs::write(&path, "not an image").unwrap();
        assert!(RustBackend::new().identify(&path).is_err());
    }

    #[test]
    fn preview_fits_inside_box() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("wide.jpg");
        create_test_jpeg(&path, 400, 200);

        let url = RustBackend::new()
            .preview(&path, &PreviewParams::default())
            .unwrap();
        let preview = decode_data_url(&url);
        assert_eq!(preview.width(), 24);
        assert_eq!(preview.height(), 12);
    }

    #[test]
    fn preview_never_enlarges() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("tiny.jpg");
        create_test_jpeg(&path, 8, 6);

        let params = PreviewParams {
            width: 24,
            quality: Quality::new(60),
        };
        let preview = decode_data_url(&RustBackend::new().preview(&path, &params).unwrap());
        assert_eq!((preview.width(), preview.height()), (8, 6));
    }

    #[test]
    fn preview_unsupported_for_svg() {
        let result = RustBackend::new().preview(Path::new("logo.svg"), &PreviewParams::default());
        assert!(matches!(result, Err(BackendError::Unsupported(_))));
    }
}
