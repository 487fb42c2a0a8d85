//! Parameter types for encode operations.
//!
//! These describe *what* to produce, not *how*. The export pipeline decides
//! which format and quality an asset is written in; the
//! [`backend`](super::backend) does the byte work.
//!
//! ## Types
//!
//! - [`Quality`]: lossy encoding quality (1–100, default 92). Clamped on construction.
//! - [`RasterFormat`]: output container for one encoded surface: PNG, JPEG or ICO.

use serde::{Deserialize, Serialize};

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
    /// Matches the browser default for `image/jpeg` canvas exports (0.92).
    fn default() -> Self {
        Self(92)
    }
}

/// Encoded output format for a rasterized surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RasterFormat {
    Png,
    Jpeg,
    Ico,
}

impl RasterFormat {
    /// File extension used for downloads of this format.
    pub fn extension(self) -> &'static str {
        match self {
            RasterFormat::Png => "png",
            RasterFormat::Jpeg => "jpg",
            RasterFormat::Ico => "ico",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            RasterFormat::Png => "image/png",
            RasterFormat::Jpeg => "image/jpeg",
            RasterFormat::Ico => "image/x-icon",
        }
    }
}

impl std::fmt::Display for RasterFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_92() {
        assert_eq!(Quality::default().value(), 92);
    }

    #[test]
    fn jpeg_downloads_use_jpg_extension() {
        assert_eq!(RasterFormat::Jpeg.extension(), "jpg");
        assert_eq!(RasterFormat::Jpeg.mime_type(), "image/jpeg");
        assert_eq!(RasterFormat::Ico.mime_type(), "image/x-icon");
    }

    #[test]
    fn format_parses_from_lowercase_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            format: RasterFormat,
        }
        let w: Wrapper = toml::from_str(r#"format = "ico""#).unwrap();
        assert_eq!(w.format, RasterFormat::Ico);
    }
}
