//! Shared test utilities for the image-converter test suite.
//!
//! Provides synthetic image payloads and ready-made assets so tests do not
//! depend on fixture files.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let file = RawFile::new("a.png", "image/png", png_bytes(64, 48));
//! let asset = solid_asset("red.png", 40, 20, [255, 0, 0, 255]);
//! assert_eq!(asset.natural_width(), 40);
//! ```

use crate::assets::{AssetCollection, ImageAsset, RawFile};
use crate::export::Services;
use crate::export::bundle::tests::ListingArchiver;
use crate::export::document::tests::SummaryEncoder;
use crate::export::sink::MemoryDownloader;
use crate::imaging::PosterizeTracer;
use crate::imaging::backend::tests::{MockBackend, mock_file};
use crate::imaging::heic::tests::PassthroughConverter;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

// =========================================================================
// Encoded payloads
// =========================================================================

/// Gradient PNG of the given size.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(gradient(width, height), ImageFormat::Png)
}

/// Gradient JPEG of the given size.
pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let rgb = DynamicImage::ImageRgba8(gradient(width, height)).to_rgb8();
    let mut buf = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .unwrap();
    buf
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
            255,
        ])
    })
}

fn encode(img: RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Vec::new();
    DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), format)
        .unwrap();
    buf
}

// =========================================================================
// Assets
// =========================================================================

/// Asset filled with one colour, bypassing any backend.
pub fn solid_asset(name: &str, width: u32, height: u32, color: [u8; 4]) -> ImageAsset {
    let pixels = RgbaImage::from_pixel(width, height, Rgba(color));
    let file = RawFile::new(name, "image/png", Vec::new());
    ImageAsset::new(
        DynamicImage::ImageRgba8(pixels),
        &file,
        "Unknown".to_string(),
    )
}

/// Collection loaded through the mock backend from `(name, w, h)` triples.
pub fn mock_collection(sizes: &[(&str, u32, u32)]) -> AssetCollection {
    let files = sizes
        .iter()
        .map(|(name, w, h)| mock_file(name, *w, *h))
        .collect();
    let mut collection = AssetCollection::new();
    collection.load(files, &MockBackend::new(), &PassthroughConverter);
    collection
}

// =========================================================================
// Export services
// =========================================================================

/// Owns one fake of every export capability.
///
/// Archives come out as a newline-separated entry listing and documents as a
/// one-line layout summary, so tests can assert on them as text.
pub struct Harness {
    pub backend: MockBackend,
    pub heic: PassthroughConverter,
    pub tracer: PosterizeTracer,
    pub document: SummaryEncoder,
    pub archiver: ListingArchiver,
    pub downloader: MemoryDownloader,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_backend(MockBackend::new())
    }

    pub fn with_backend(backend: MockBackend) -> Self {
        Self {
            backend,
            heic: PassthroughConverter,
            tracer: PosterizeTracer::default(),
            document: SummaryEncoder,
            archiver: ListingArchiver,
            downloader: MemoryDownloader::new(),
        }
    }

    pub fn services(&self) -> Services<'_> {
        Services {
            backend: &self.backend,
            heic: &self.heic,
            tracer: &self.tracer,
            document: &self.document,
            archiver: &self.archiver,
            downloader: &self.downloader,
        }
    }
}
