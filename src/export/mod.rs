//! Export pipeline.
//!
//! Every export is an [`ExportJob`] with a fixed target-set policy:
//!
//! | Job | Targets | Size |
//! |---|---|---|
//! | PNG / JPG / ICO | selected if one asset, else all | current target |
//! | Screenshots | all | fixed (config) |
//! | Traces | all | current target |
//! | Bundle | selected if one asset, else all | fixed manifest + natural-size trace |
//! | Document | all | natural size |
//!
//! Per-asset work is strictly sequential: every step draws onto the one
//! shared [`Surface`](crate::imaging::Surface) and reads it back before the
//! next draw. A failed rasterize or encode step is recorded as a
//! [`SkippedItem`] and the batch continues. Only failures that leave nothing
//! to deliver (archive, document, download) abort an export.

pub mod bundle;
pub mod document;
pub mod raster;
pub mod sink;
pub mod vector;

use crate::assets::{AssetCollection, ImageAsset};
use crate::imaging::{HeicConverter, ImageBackend, Tracer};
use bundle::{ArchiveError, Archiver};
use document::{DocumentEncoder, DocumentError};
use serde::Serialize;
use sink::{DownloadError, Downloader};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("No images loaded")]
    NoAssets,
    #[error("Width and height must be positive whole numbers")]
    InvalidDimensions,
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
    #[error("Document error: {0}")]
    Document(#[from] DocumentError),
    #[error("Download error: {0}")]
    Download(#[from] DownloadError),
}

/// Which assets an export iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPolicy {
    /// The selected asset when only one is loaded, otherwise all of them.
    SelectedOrAll,
    /// Every asset, unconditionally.
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportJob {
    Png,
    Jpeg,
    Ico,
    Screenshots,
    Traces,
    Bundle,
    Document,
}

impl ExportJob {
    pub fn policy(self) -> TargetPolicy {
        match self {
            ExportJob::Png | ExportJob::Jpeg | ExportJob::Ico | ExportJob::Bundle => {
                TargetPolicy::SelectedOrAll
            }
            ExportJob::Screenshots | ExportJob::Traces | ExportJob::Document => TargetPolicy::All,
        }
    }

    /// Status line shown after the job produced something.
    pub fn status_message(self) -> &'static str {
        match self {
            ExportJob::Png => "PNG download complete!",
            ExportJob::Jpeg => "JPG download complete!",
            ExportJob::Ico => "ICO download complete!",
            ExportJob::Screenshots => "iOS App Store screenshots ready!",
            ExportJob::Traces => "SVG code generated!",
            ExportJob::Bundle => "React assets downloaded!",
            ExportJob::Document => "PDF created successfully!",
        }
    }
}

/// An asset an export gave up on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    /// Position of the asset in the collection.
    pub index: usize,
    pub asset: String,
    pub reason: String,
}

/// What one export run did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExportReport {
    /// Names handed to the downloader, in order.
    pub downloads: Vec<String>,
    /// Payloads successfully produced (archive/document entries included).
    pub produced: usize,
    pub skipped: Vec<SkippedItem>,
}

impl ExportReport {
    pub(crate) fn skip(&mut self, index: usize, asset: &ImageAsset, reason: impl ToString) {
        let reason = reason.to_string();
        tracing::warn!(asset = %asset.name, index, %reason, "skipped");
        self.skipped.push(SkippedItem {
            index,
            asset: asset.name.clone(),
            reason,
        });
    }
}

/// External capabilities the pipeline calls out to.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    pub backend: &'a dyn ImageBackend,
    pub heic: &'a dyn HeicConverter,
    pub tracer: &'a dyn Tracer,
    pub document: &'a dyn DocumentEncoder,
    pub archiver: &'a dyn Archiver,
    pub downloader: &'a dyn Downloader,
}

/// Assets an export iterates, with their collection index.
///
/// Errors with [`ExportError::NoAssets`] on an empty collection.
pub fn targets(
    collection: &AssetCollection,
    policy: TargetPolicy,
) -> Result<Vec<(usize, &ImageAsset)>, ExportError> {
    if collection.is_empty() {
        return Err(ExportError::NoAssets);
    }
    let all = || collection.assets().iter().enumerate().collect();
    Ok(match policy {
        TargetPolicy::All => all(),
        TargetPolicy::SelectedOrAll if collection.len() > 1 => all(),
        TargetPolicy::SelectedOrAll => collection
            .current_index()
            .and_then(|i| collection.get(i).map(|a| (i, a)))
            .into_iter()
            .collect(),
    })
}
