//! Bundle packaging and the composite asset-bundle export.
//!
//! [`BundlePackager`] collects named payloads in insertion order, optionally
//! under a per-asset folder, and hands them to an [`Archiver`] in one go.
//! [`ZipArchiver`] writes them as a deflated zip.
//!
//! The composite export renders, for each asset, every size in the bundle
//! manifest plus one vector trace of the asset at its natural size:
//!
//! ```text
//! react-assets.zip            (one asset: flat)
//! ├── logo512.png
//! ├── logo192.png
//! ├── favicon.ico
//! └── logo.svg
//!
//! react-assets.zip            (several assets: one folder each)
//! ├── img-1/ logo512.png logo192.png favicon.ico logo.svg
//! └── img-2/ ...
//! ```

use super::raster::{ZIP_MIME, render};
use super::{ExportError, ExportJob, ExportReport, Services, targets};
use crate::assets::AssetCollection;
use crate::config::BundleConfig;
use crate::imaging::{Dimensions, Quality, Surface};
use crate::naming::folder_name;
use std::collections::BTreeSet;
use std::io::{Cursor, Write};
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One named payload, optionally inside a folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub folder: Option<String>,
    pub name: String,
    pub bytes: Vec<u8>,
}

impl ArchiveEntry {
    /// Path inside the archive: `name` or `folder/name`.
    pub fn path(&self) -> String {
        match &self.folder {
            Some(folder) => format!("{folder}/{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Combines entries into one archive payload.
pub trait Archiver: Sync {
    fn archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError>;
}

/// Ordered accumulator of archive entries.
#[derive(Debug, Clone, Default)]
pub struct BundlePackager {
    entries: Vec<ArchiveEntry>,
}

impl BundlePackager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, folder: Option<String>, name: impl Into<String>, bytes: Vec<u8>) {
        self.entries.push(ArchiveEntry {
            folder,
            name: name.into(),
            bytes,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn finish(self, archiver: &dyn Archiver) -> Result<Vec<u8>, ArchiveError> {
        archiver.archive(&self.entries)
    }
}

/// Deflated zip archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut folders = BTreeSet::new();

        for entry in entries {
            if let Some(folder) = &entry.folder {
                if folders.insert(folder.clone()) {
                    writer.add_directory(folder.as_str(), entry_options())?;
                }
            }
            writer.start_file(entry.path(), entry_options())?;
            writer.write_all(&entry.bytes)?;
        }
        Ok(writer.finish()?.into_inner())
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Export the composite asset bundle as one archive.
pub fn export_bundle(
    collection: &AssetCollection,
    config: &BundleConfig,
    quality: Quality,
    surface: &mut Surface,
    services: &Services,
) -> Result<ExportReport, ExportError> {
    let assets = targets(collection, ExportJob::Bundle.policy())?;
    let batch = assets.len() > 1;
    let mut packager = BundlePackager::new();
    let mut report = ExportReport::default();

    for (position, (index, asset)) in assets.into_iter().enumerate() {
        let folder = batch.then(|| folder_name(&config.folder_prefix, position));

        for item in &config.assets {
            let size = Dimensions::new(item.width, item.height);
            match render(surface, asset, size, item.format, quality, services.backend) {
                Ok(bytes) => {
                    packager.add(folder.clone(), item.name.as_str(), bytes);
                    report.produced += 1;
                }
                Err(e) => report.skip(index, asset, format!("{}: {e}", item.name)),
            }
        }

        let traced = surface
            .rasterize(asset, asset.natural_size())
            .map_err(|e| e.to_string())
            .and_then(|pixels| services.tracer.trace(pixels).map_err(|e| e.to_string()));
        match traced {
            Ok(svg) => {
                packager.add(folder, config.trace_name.as_str(), svg.into_bytes());
                report.produced += 1;
            }
            Err(reason) => report.skip(index, asset, format!("{}: {reason}", config.trace_name)),
        }
    }

    if packager.is_empty() {
        return Ok(report);
    }
    let archive = packager.finish(services.archiver)?;
    services
        .downloader
        .download(&config.archive_name, ZIP_MIME, &archive)?;
    report.downloads.push(config.archive_name.clone());
    Ok(report)
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::RasterFormat;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{Harness, mock_collection};
    use std::io::Read;

    /// Archiver that lists entry paths, one per line.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct ListingArchiver;

    impl Archiver for ListingArchiver {
        fn archive(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, ArchiveError> {
            let paths: Vec<String> = entries.iter().map(ArchiveEntry::path).collect();
            Ok(paths.join("\n").into_bytes())
        }
    }

    fn listing(h: &Harness) -> Vec<String> {
        let downloads = h.downloader.downloads();
        assert_eq!(downloads.len(), 1);
        String::from_utf8(downloads[0].bytes.clone())
            .unwrap()
            .lines()
            .map(String::from)
            .collect()
    }

    // =========================================================================
    // BundlePackager
    // =========================================================================

    #[test]
    fn packager_preserves_order_and_folders() {
        let mut packager = BundlePackager::new();
        packager.add(Some("img-1".into()), "b.png", vec![1]);
        packager.add(Some("img-1".into()), "a.png", vec![2]);
        packager.add(None, "root.txt", vec![3]);
        assert!(!packager.is_empty());
        let listing = packager.finish(&ListingArchiver).unwrap();
        assert_eq!(listing, b"img-1/b.png\nimg-1/a.png\nroot.txt");
    }

    #[test]
    fn zip_archiver_roundtrips_entries() {
        let mut packager = BundlePackager::new();
        packager.add(Some("img-1".into()), "logo.svg", b"<svg/>".to_vec());
        packager.add(None, "favicon.ico", vec![0, 0, 1, 0]);
        let bytes = packager.finish(&ZipArchiver).unwrap();

        let mut zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut svg = String::new();
        zip.by_name("img-1/logo.svg")
            .unwrap()
            .read_to_string(&mut svg)
            .unwrap();
        assert_eq!(svg, "<svg/>");
        assert!(zip.by_name("favicon.ico").is_ok());
        assert!(zip.by_name("img-1/").unwrap().is_dir());
    }

    #[test]
    fn zip_archiver_empty_archive_is_valid() {
        let bytes = ZipArchiver.archive(&[]).unwrap();
        let zip = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        assert_eq!(zip.len(), 0);
    }

    // =========================================================================
    // export_bundle
    // =========================================================================

    #[test]
    fn single_asset_bundle_is_flat() {
        let collection = mock_collection(&[("a.png", 40, 20)]);
        let h = Harness::new();

        let report = export_bundle(
            &collection,
            &BundleConfig::default(),
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        assert_eq!(report.produced, 4);
        assert_eq!(h.downloader.names(), vec!["react-assets.zip"]);
        assert_eq!(
            listing(&h),
            vec!["logo512.png", "logo192.png", "favicon.ico", "logo.svg"]
        );
        assert_eq!(
            h.backend.encoded_sizes(),
            vec![(512, 512), (192, 192), (32, 32)]
        );
    }

    #[test]
    fn batch_bundle_groups_per_asset_in_order() {
        let collection = mock_collection(&[("a.png", 40, 20), ("b.png", 20, 40)]);
        let h = Harness::new();

        export_bundle(
            &collection,
            &BundleConfig::default(),
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        let paths = listing(&h);
        assert_eq!(paths.len(), 8);
        assert_eq!(paths[0], "img-1/logo512.png");
        assert_eq!(paths[3], "img-1/logo.svg");
        assert_eq!(paths[4], "img-2/logo512.png");
        assert_eq!(paths[7], "img-2/logo.svg");
    }

    #[test]
    fn failed_size_is_skipped_but_rest_of_bundle_ships() {
        let collection = mock_collection(&[("a.png", 40, 20)]);
        let h = Harness::with_backend(MockBackend::failing_at(vec![(32, 32)]));

        let report = export_bundle(
            &collection,
            &BundleConfig::default(),
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].reason.starts_with("favicon.ico"));
        assert_eq!(listing(&h), vec!["logo512.png", "logo192.png", "logo.svg"]);
    }

    #[test]
    fn bundle_uses_configured_manifest() {
        let collection = mock_collection(&[("a.png", 40, 20)]);
        let h = Harness::new();
        let config = BundleConfig {
            archive_name: "icons.zip".to_string(),
            assets: vec![crate::config::BundleAsset {
                width: 180,
                height: 180,
                name: "apple-touch-icon.png".to_string(),
                format: RasterFormat::Png,
            }],
            ..BundleConfig::default()
        };

        export_bundle(
            &collection,
            &config,
            Quality::default(),
            &mut Surface::new(),
            &h.services(),
        )
        .unwrap();

        assert_eq!(h.downloader.names(), vec!["icons.zip"]);
        assert_eq!(listing(&h), vec!["apple-touch-icon.png", "logo.svg"]);
    }
}
