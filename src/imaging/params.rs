//! Parameter types for metadata extraction.
//!
//! - [`Quality`] — Lossy encoding quality (1–100). Clamped on construction.
//! - [`PreviewParams`] — Size and quality of the inline blur preview.

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(40)
    }
}

/// How the inline preview is produced.
///
/// The preview is fitted inside a `width × width` box (aspect preserved, never
/// enlarged) and JPEG-encoded. It exists only to be blurred by the page layer
/// while the real image loads, so both numbers stay tiny.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewParams {
    pub width: u32,
    pub quality: Quality,
}

impl Default for PreviewParams {
    fn default() -> Self {
        Self {
            width: 24,
            quality: Quality::default(),
        }
    }
}
