//! Bitmap, icon and fixed-size screenshot exports.
//!
//! Both exports run the same per-asset step: draw onto the shared surface at
//! the requested size, then hand the pixels to the backend encoder. They
//! differ in which size they draw at and how results are delivered:
//!
//! - **Bitmaps** use the current target size and download each file on its
//!   own, suffixed `-1`..`-N` only when more than one asset is exported.
//! - **Screenshots** always use the configured fixed size, always take every
//!   asset, and zip the results when there is more than one asset.

use super::bundle::BundlePackager;
use super::{ExportError, ExportJob, ExportReport, Services, targets};
use crate::assets::{AssetCollection, ImageAsset};
use crate::config::ScreenshotConfig;
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, Quality, RasterError, RasterFormat, Surface,
};
use crate::naming::{indexed_name, padded_name};
use thiserror::Error;

pub const ZIP_MIME: &str = "application/zip";

/// Why one asset produced no payload.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{0}")]
    Raster(#[from] RasterError),
    #[error("{0}")]
    Encode(#[from] BackendError),
}

/// Rasterize `asset` at `size` and encode the surface.
pub fn render(
    surface: &mut Surface,
    asset: &ImageAsset,
    size: Dimensions,
    format: RasterFormat,
    quality: Quality,
    backend: &dyn ImageBackend,
) -> Result<Vec<u8>, RenderError> {
    let pixels = surface.rasterize(asset, size)?;
    Ok(backend.encode(pixels, format, quality)?)
}

/// Export PNG, JPEG or ICO files at `target`.
pub fn export_bitmaps(
    collection: &AssetCollection,
    target: Dimensions,
    format: RasterFormat,
    base_name: &str,
    quality: Quality,
    surface: &mut Surface,
    services: &Services,
) -> Result<ExportReport, ExportError> {
    let job = match format {
        RasterFormat::Png => ExportJob::Png,
        RasterFormat::Jpeg => ExportJob::Jpeg,
        RasterFormat::Ico => ExportJob::Ico,
    };
    let assets = targets(collection, job.policy())?;
    let total = assets.len();
    let mut report = ExportReport::default();

    for (position, (index, asset)) in assets.into_iter().enumerate() {
        match render(surface, asset, target, format, quality, services.backend) {
            Ok(bytes) => {
                let name = indexed_name(base_name, position, total, format.extension());
                services
                    .downloader
                    .download(&name, format.mime_type(), &bytes)?;
                report.produced += 1;
                report.downloads.push(name);
            }
            Err(e) => report.skip(index, asset, e),
        }
    }
    Ok(report)
}

/// Export every asset as a fixed-size JPEG screenshot.
pub fn export_screenshots(
    collection: &AssetCollection,
    config: &ScreenshotConfig,
    quality: Quality,
    surface: &mut Surface,
    services: &Services,
) -> Result<ExportReport, ExportError> {
    let assets = targets(collection, ExportJob::Screenshots.policy())?;
    let size = Dimensions::new(config.width, config.height);
    let batch = assets.len() > 1;
    let mut packager = BundlePackager::new();
    let mut report = ExportReport::default();

    for (position, (index, asset)) in assets.into_iter().enumerate() {
        let rendered = render(surface, asset, size, RasterFormat::Jpeg, quality, services.backend);
        let bytes = match rendered {
            Ok(bytes) => bytes,
            Err(e) => {
                report.skip(index, asset, e);
                continue;
            }
        };
        let name = padded_name(&config.prefix, position, RasterFormat::Jpeg.extension());
        report.produced += 1;
        if batch {
            packager.add(None, name, bytes);
        } else {
            services
                .downloader
                .download(&name, RasterFormat::Jpeg.mime_type(), &bytes)?;
            report.downloads.push(name);
        }
    }

    if batch && !packager.is_empty() {
        let archive = packager.finish(services.archiver)?;
        services
            .downloader
            .download(&config.archive_name, ZIP_MIME, &archive)?;
        report.downloads.push(config.archive_name.clone());
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{Harness, mock_collection};

    // =========================================================================
    // export_bitmaps
    // =========================================================================

    #[test]
    fn batch_png_produces_suffixed_files() {
        let collection =
            mock_collection(&[("a.png", 80, 60), ("b.png", 60, 80), ("c.png", 10, 10)]);
        let h = Harness::new();
        let mut surface = Surface::new();

        let report = export_bitmaps(
            &collection,
            Dimensions::new(32, 16),
            RasterFormat::Png,
            "image",
            Quality::default(),
            &mut surface,
            &h.services(),
        )
        .unwrap();

        assert_eq!(report.produced, 3);
        assert_eq!(
            h.downloader.names(),
            vec!["image-1.png", "image-2.png", "image-3.png"]
        );
        // Every asset drawn at the same target size
        assert_eq!(h.backend.encoded_sizes(), vec![(32, 16); 3]);
    }

    #[test]
    fn single_asset_has_no_suffix() {
        let collection = mock_collection(&[("a.png", 80, 60)]);
        let h = Harness::new();

        export_bitmaps(
            &collection,
            Dimensions::new(40, 30),
            RasterFormat::Jpeg,
            "photo",
            Quality::new(70),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        assert_eq!(h.downloader.names(), vec!["photo.jpg"]);
        assert_eq!(h.downloader.downloads()[0].mime_type, "image/jpeg");
        assert!(h.backend.get_operations().contains(&RecordedOp::Encode {
            format: RasterFormat::Jpeg,
            width: 40,
            height: 30,
            quality: 70,
        }));
    }

    #[test]
    fn failed_encode_skips_asset_and_continues() {
        let collection = mock_collection(&[("a.png", 80, 60), ("b.png", 60, 80)]);
        let h = Harness::with_backend(MockBackend::failing_at(vec![(300, 300)]));

        let report = export_bitmaps(
            &collection,
            Dimensions::new(300, 300),
            RasterFormat::Ico,
            "image",
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        assert_eq!(report.produced, 0);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[1].asset, "b.png");
        assert!(h.downloader.names().is_empty());
    }

    #[test]
    fn empty_collection_is_an_error() {
        let h = Harness::new();
        let result = export_bitmaps(
            &AssetCollection::new(),
            Dimensions::new(10, 10),
            RasterFormat::Png,
            "image",
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        );
        assert!(matches!(result, Err(ExportError::NoAssets)));
    }

    // =========================================================================
    // export_screenshots
    // =========================================================================

    #[test]
    fn screenshots_ignore_target_and_zip_batches() {
        let collection = mock_collection(&[("a.png", 80, 60), ("b.png", 60, 80)]);
        let h = Harness::new();
        let config = ScreenshotConfig::default();

        let report = export_screenshots(
            &collection,
            &config,
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        assert_eq!(report.produced, 2);
        assert_eq!(h.backend.encoded_sizes(), vec![(1242, 2688); 2]);
        assert_eq!(h.downloader.names(), vec!["iOS_App_Store_Screenshots.zip"]);
        let listing = String::from_utf8(h.downloader.downloads()[0].bytes.clone()).unwrap();
        assert_eq!(listing, "iOS_Screen-01.jpg\niOS_Screen-02.jpg");
    }

    #[test]
    fn single_screenshot_is_not_zipped() {
        let collection = mock_collection(&[("a.png", 80, 60)]);
        let h = Harness::new();

        export_screenshots(
            &collection,
            &ScreenshotConfig::default(),
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        assert_eq!(h.downloader.names(), vec!["iOS_Screen-01.jpg"]);
    }

    #[test]
    fn screenshots_with_every_encode_failing_download_nothing() {
        let collection = mock_collection(&[("a.png", 80, 60), ("b.png", 60, 80)]);
        let h = Harness::with_backend(MockBackend::failing_at(vec![(1242, 2688)]));

        let report = export_screenshots(
            &collection,
            &ScreenshotConfig::default(),
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        assert_eq!(report.skipped.len(), 2);
        assert!(h.downloader.names().is_empty());
    }
}
