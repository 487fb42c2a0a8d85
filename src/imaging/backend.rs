//! Image backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three pixel-facing operations the
//! rest of the crate relies on: decode a raw file, read its device metadata,
//! and encode a rasterized surface into a downloadable payload.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust, built on the
//! `image` and `kamadak-exif` crates.

use super::params::{Quality, RasterFormat};
use crate::assets::RawFile;
use image::{DynamicImage, RgbaImage};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {name}: {reason}")]
    Decode { name: String, reason: String },
    #[error("Failed to encode {format} at {width}x{height}: {reason}")]
    Encode {
        format: RasterFormat,
        width: u32,
        height: u32,
        reason: String,
    },
}

/// Pixel dimensions of an image or a target surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl std::fmt::Display for Dimensions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Camera identification read from EXIF.
///
/// Field mapping:
/// - `make`: EXIF `Make` (`0x010F`)
/// - `model`: EXIF `Model` (`0x0110`)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceInfo {
    pub make: Option<String>,
    pub model: Option<String>,
}

/// Trait for image backends.
///
/// `Sync` because loads decode independent files on the rayon pool.
pub trait ImageBackend: Sync {
    /// Decode a raw file into oriented pixel data.
    fn decode(&self, file: &RawFile) -> Result<DynamicImage, BackendError>;

    /// Best-effort device lookup. Missing or unreadable metadata yields the default.
    fn read_device(&self, file: &RawFile) -> DeviceInfo;

    /// Encode a rasterized surface into the bytes of one output file.
    fn encode(
        &self,
        pixels: &RgbaImage,
        format: RasterFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError>;
}
