//! Shared drawing surface and the rasterize step.
//!
//! Every export re-draws an asset onto one [`Surface`] and reads the pixels
//! back before the next draw. The surface is owned by the caller and lent out
//! as `&mut`, so two rasterizations can never overlap.

use super::backend::Dimensions;
use crate::assets::ImageAsset;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use thiserror::Error;

/// Largest surface that will be allocated: 16384 x 16384 RGBA pixels.
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RasterError {
    #[error("Invalid target size {0}: both sides must be positive")]
    InvalidTarget(Dimensions),
    #[error("Target size {0} exceeds the surface limit of {max} pixels", max = MAX_SURFACE_PIXELS)]
    TooLarge(Dimensions),
    #[error("Source image for {0} is not decodable")]
    Decode(String),
}

/// Reusable RGBA scratch buffer.
///
/// Resized only when the requested size changes; cleared to transparent
/// black before every draw.
#[derive(Debug)]
pub struct Surface {
    canvas: RgbaImage,
    filter: FilterType,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface {
    pub fn new() -> Self {
        Self {
            canvas: RgbaImage::new(0, 0),
            filter: FilterType::Triangle,
        }
    }

    /// Draw `asset` stretched to exactly `target` and return the pixels.
    ///
    /// Width and height scale independently. The returned borrow must be
    /// released before the next call.
    pub fn rasterize(
        &mut self,
        asset: &ImageAsset,
        target: Dimensions,
    ) -> Result<&RgbaImage, RasterError> {
        if target.width == 0 || target.height == 0 {
            return Err(RasterError::InvalidTarget(target));
        }
        if u64::from(target.width) * u64::from(target.height) > MAX_SURFACE_PIXELS {
            return Err(RasterError::TooLarge(target));
        }
        if asset.source.width() == 0 || asset.source.height() == 0 {
            return Err(RasterError::Decode(asset.name.clone()));
        }

        if self.canvas.dimensions() != (target.width, target.height) {
            self.canvas = RgbaImage::new(target.width, target.height);
        } else {
            self.clear();
        }

        let source = asset.source.to_rgba8();
        if source.dimensions() == (target.width, target.height) {
            imageops::replace(&mut self.canvas, &source, 0, 0);
        } else {
            let scaled = imageops::resize(&source, target.width, target.height, self.filter);
            imageops::replace(&mut self.canvas, &scaled, 0, 0);
        }

        tracing::debug!(asset = %asset.name, size = %target, "rasterized");
        Ok(&self.canvas)
    }

    fn clear(&mut self) {
        for pixel in self.canvas.pixels_mut() {
            *pixel = Rgba([0, 0, 0, 0]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::solid_asset;

    #[test]
    fn rasterize_stretches_to_exact_target() {
        let asset = solid_asset("wide.png", 400, 100, [255, 0, 0, 255]);
        let mut surface = Surface::new();
        let pixels = surface.rasterize(&asset, Dimensions::new(50, 80)).unwrap();
        assert_eq!(pixels.dimensions(), (50, 80));
        assert_eq!(pixels.get_pixel(25, 40), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn rasterize_natural_size_copies_pixels() {
        let asset = solid_asset("a.png", 10, 10, [1, 2, 3, 255]);
        let mut surface = Surface::new();
        let pixels = surface.rasterize(&asset, Dimensions::new(10, 10)).unwrap();
        assert!(pixels.pixels().all(|p| *p == Rgba([1, 2, 3, 255])));
    }

    #[test]
    fn surface_is_cleared_between_draws() {
        let opaque = solid_asset("opaque.png", 8, 8, [9, 9, 9, 255]);
        let clear = solid_asset("clear.png", 8, 8, [0, 0, 0, 0]);
        let mut surface = Surface::new();
        surface.rasterize(&opaque, Dimensions::new(8, 8)).unwrap();
        let pixels = surface.rasterize(&clear, Dimensions::new(8, 8)).unwrap();
        assert!(pixels.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn surface_reallocates_on_size_change() {
        let asset = solid_asset("a.png", 20, 20, [0, 0, 255, 255]);
        let mut surface = Surface::new();
        surface.rasterize(&asset, Dimensions::new(512, 512)).unwrap();
        let pixels = surface.rasterize(&asset, Dimensions::new(32, 32)).unwrap();
        assert_eq!(pixels.dimensions(), (32, 32));
    }

    #[test]
    fn zero_target_is_rejected() {
        let asset = solid_asset("a.png", 20, 20, [0, 0, 0, 255]);
        let mut surface = Surface::new();
        assert_eq!(
            surface.rasterize(&asset, Dimensions::new(0, 20)).unwrap_err(),
            RasterError::InvalidTarget(Dimensions::new(0, 20))
        );
    }

    #[test]
    fn oversized_target_is_rejected_before_allocating() {
        let asset = solid_asset("a.png", 10, 10, [0, 0, 0, 255]);
        let mut surface = Surface::new();
        for target in [
            Dimensions::new(u32::MAX, u32::MAX),
            Dimensions::new(60_000, 60_000),
            Dimensions::new(16_385, 16_384),
        ] {
            assert_eq!(
                surface.rasterize(&asset, target).unwrap_err(),
                RasterError::TooLarge(target)
            );
        }
        let pixels = surface.rasterize(&asset, Dimensions::new(16_384, 1)).unwrap();
        assert_eq!(pixels.dimensions(), (16_384, 1));
    }

    #[test]
    fn empty_source_is_a_decode_error() {
        let mut asset = solid_asset("a.png", 1, 1, [0, 0, 0, 255]);
        asset.source = image::DynamicImage::new_rgba8(0, 0);
        let mut surface = Surface::new();
        assert_eq!(
            surface.rasterize(&asset, Dimensions::new(4, 4)).unwrap_err(),
            RasterError::Decode("a.png".to_string())
        );
    }
}
