//! Loaded images and the ordered collection they live in.
//!
//! ## Load
//!
//! [`AssetCollection::load`] turns raw uploads into [`ImageAsset`]s:
//!
//! ```text
//! RawFile ──(HEIC?)──► converter ──► backend.decode ──► natural size, ratio
//!                                        └─────────► backend.read_device ──► device label
//! ```
//!
//! Files are decoded concurrently on the rayon pool; results are reassembled
//! in input order and files that fail conversion or decoding are dropped with
//! a warning. A load where every file fails leaves the collection untouched.
//!
//! ## Selection
//!
//! The collection keeps a `current` index that is always valid while the
//! collection is non-empty. [`AssetCollection::select`] rejects out-of-range
//! indices; [`AssetCollection::next`] wraps around.

use crate::imaging::calculations::aspect_ratio;
use crate::imaging::heic::{self, HeicConverter};
use crate::imaging::{Dimensions, ImageBackend, supported_input_extensions};
use crate::metadata::{self, device_label};
use image::DynamicImage;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Image index {index} is out of range (have {len})")]
    OutOfRange { index: usize, len: usize },
}

/// One uploaded file before decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// Milliseconds since the Unix epoch.
    pub last_modified: i64,
}

impl RawFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
            last_modified: 0,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        let last_modified = std::fs::metadata(path)?
            .modified()
            .map(metadata::epoch_millis)
            .unwrap_or(0);
        Ok(Self {
            mime_type: metadata::mime_for_name(&name),
            name,
            bytes,
            last_modified,
        })
    }
}

/// One decoded source image.
///
/// Natural size and aspect ratio are fixed at load time.
#[derive(Debug, Clone)]
pub struct ImageAsset {
    pub(crate) source: DynamicImage,
    natural: Dimensions,
    aspect_ratio: f64,
    pub name: String,
    pub mime_type: String,
    pub byte_size: usize,
    pub last_modified: i64,
    pub device: String,
}

impl ImageAsset {
    /// Wrap decoded pixels; provenance comes from the raw file.
    pub fn new(source: DynamicImage, file: &RawFile, device: String) -> Self {
        let natural = Dimensions::new(source.width(), source.height());
        Self {
            aspect_ratio: aspect_ratio(natural.width, natural.height),
            natural,
            source,
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
            byte_size: file.bytes.len(),
            last_modified: file.last_modified,
            device,
        }
    }

    pub fn natural_width(&self) -> u32 {
        self.natural.width
    }

    pub fn natural_height(&self) -> u32 {
        self.natural.height
    }

    pub fn natural_size(&self) -> Dimensions {
        self.natural
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    /// Size in kilobytes, one decimal (`"12.3"`).
    pub fn size_kb(&self) -> String {
        format!("{:.1}", self.byte_size as f64 / 1024.0)
    }
}

/// Result of a load, for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub dropped: usize,
}

impl LoadSummary {
    /// `true` when the load replaced the collection.
    pub fn changed(&self) -> bool {
        self.loaded > 0
    }
}

/// Ordered assets plus the current selection.
#[derive(Debug, Clone, Default)]
pub struct AssetCollection {
    assets: Vec<ImageAsset>,
    current: usize,
}

impl AssetCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode `files` and, if any succeed, replace the collection with them.
    ///
    /// Selection resets to the first asset on success.
    pub fn load(
        &mut self,
        files: Vec<RawFile>,
        backend: &dyn ImageBackend,
        converter: &dyn HeicConverter,
    ) -> LoadSummary {
        let total = files.len();
        let loaded: Vec<ImageAsset> = files
            .into_par_iter()
            .map(|file| load_one(file, backend, converter))
            .collect::<Vec<Option<ImageAsset>>>()
            .into_iter()
            .flatten()
            .collect();

        let summary = LoadSummary {
            loaded: loaded.len(),
            dropped: total - loaded.len(),
        };
        if summary.changed() {
            self.assets = loaded;
            self.current = 0;
        }
        tracing::info!(loaded = summary.loaded, dropped = summary.dropped, "load finished");
        summary
    }

    pub fn select(&mut self, index: usize) -> Result<&ImageAsset, SelectionError> {
        if index >= self.assets.len() {
            return Err(SelectionError::OutOfRange {
                index,
                len: self.assets.len(),
            });
        }
        self.current = index;
        Ok(&self.assets[index])
    }

    /// Advance the selection circularly. No-op with fewer than two assets.
    pub fn next(&mut self) -> Option<&ImageAsset> {
        if self.assets.len() > 1 {
            self.current = (self.current + 1) % self.assets.len();
        }
        self.current()
    }

    pub fn current(&self) -> Option<&ImageAsset> {
        self.assets.get(self.current)
    }

    /// Selected index, `None` when empty.
    pub fn current_index(&self) -> Option<usize> {
        (!self.assets.is_empty()).then_some(self.current)
    }

    pub fn assets(&self) -> &[ImageAsset] {
        &self.assets
    }

    pub fn get(&self, index: usize) -> Option<&ImageAsset> {
        self.assets.get(index)
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// Expand command-line inputs into the files to load.
///
/// Files are kept as given, even with an unknown extension (they are dropped
/// at decode time). Directories are walked recursively in file-name order,
/// keeping visible files whose extension is a supported input format.
pub fn expand_inputs(inputs: &[PathBuf]) -> Vec<PathBuf> {
    let supported = supported_input_extensions();
    let mut files = Vec::new();
    for input in inputs {
        if !input.is_dir() {
            files.push(input.clone());
            continue;
        }
        let walker = WalkDir::new(input)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
            .filter_map(|e| e.ok());
        for entry in walker {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if supported.contains(&ext.as_str()) {
                files.push(path.to_path_buf());
            }
        }
    }
    files
}

/// Convert (if needed), decode and describe one file. `None` drops it.
fn load_one(
    file: RawFile,
    backend: &dyn ImageBackend,
    converter: &dyn HeicConverter,
) -> Option<ImageAsset> {
    let file = if heic::is_heic(&file) {
        match converter.convert(&file) {
            Ok(converted) => converted,
            Err(e) => {
                tracing::warn!(file = %file.name, error = %e, "HEIC conversion failed, skipping");
                return None;
            }
        }
    } else {
        file
    };

    let source = match backend.decode(&file) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!(file = %file.name, error = %e, "decode failed, skipping");
            return None;
        }
    };
    let device = device_label(&backend.read_device(&file));
    Some(ImageAsset::new(source, &file, device))
}
