//! CLI output formatting.
//!
//! Every asset is shown by its collection position and file name, with its
//! properties on indented lines below. The same header is used by the load
//! listing, export reports and the trace listing, so one asset reads the
//! same everywhere.
//!
//! # Output Format
//!
//! ## Info
//!
//! ```text
//! Images
//! 001 beach.jpg *
//!     4032x3024, 2345.6 KB
//!     Device: Apple iPhone 12
//! 002 logo.png
//!     512x512, 12.0 KB
//!     Device: Unknown
//!
//! Target
//!     800x600 (ratio locked)
//! ```
//!
//! ## Export
//!
//! ```text
//! PNG download complete!
//!     image-1.png
//!     image-2.png
//! Skipped
//!     003 huge.png: Icon size 300x300 exceeds 256x256
//! ```
//!
//! ## Traces
//!
//! ```text
//! Traces
//! 001 beach.jpg → image-1.svg (1834 bytes)
//! 002 logo.png (no trace)
//! ```
//!
//! # Architecture
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure. The info listing also has a serializable form,
//! [`CollectionListing`], for `--json`.

use crate::assets::{AssetCollection, LoadSummary};
use crate::dimensions::DimensionState;
use crate::export::vector::TraceSet;
use crate::export::{ExportJob, ExportReport};
use crate::imaging::Dimensions;
use serde::Serialize;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 0-based collection index as a 1-based, 3-digit position.
fn format_index(index: usize) -> String {
    format!("{:0>3}", index + 1)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn asset_header(index: usize, name: &str) -> String {
    format!("{} {}", format_index(index), name)
}

// ============================================================================
// Info
// ============================================================================

/// Listing of the loaded collection followed by the current target size.
///
/// The selected asset is marked with `*`.
pub fn format_collection(collection: &AssetCollection, dimensions: &DimensionState) -> Vec<String> {
    let mut lines = vec!["Images".to_string()];
    if collection.is_empty() {
        lines.push(format!("{}(none)", indent(1)));
    }
    for (index, asset) in collection.assets().iter().enumerate() {
        let mut header = asset_header(index, &asset.name);
        if collection.current_index() == Some(index) {
            header.push_str(" *");
        }
        lines.push(header);
        lines.push(format!(
            "{}{}x{}, {} KB",
            indent(1),
            asset.natural_width(),
            asset.natural_height(),
            asset.size_kb()
        ));
        lines.push(format!("{}Device: {}", indent(1), asset.device));
    }

    lines.push(String::new());
    lines.push("Target".to_string());
    let lock = if dimensions.keep_ratio() {
        "ratio locked"
    } else {
        "ratio unlocked"
    };
    let size = match dimensions.target() {
        Some(d) => format!("{}x{}", d.width, d.height),
        None => format!(
            "invalid ('{}' x '{}')",
            dimensions.width().raw(),
            dimensions.height().raw()
        ),
    };
    lines.push(format!("{}{} ({})", indent(1), size, lock));
    lines
}

pub fn print_collection(collection: &AssetCollection, dimensions: &DimensionState) {
    for line in format_collection(collection, dimensions) {
        println!("{}", line);
    }
}

/// Machine-readable form of the info listing.
#[derive(Debug, Serialize)]
pub struct CollectionListing {
    pub images: Vec<ListedImage>,
    /// 1-based position of the selected image.
    pub selected: Option<usize>,
    /// `None` while a width or height buffer is invalid.
    pub target: Option<Dimensions>,
    pub keep_ratio: bool,
}

#[derive(Debug, Serialize)]
pub struct ListedImage {
    pub position: usize,
    pub name: String,
    pub mime_type: String,
    pub width: u32,
    pub height: u32,
    pub bytes: usize,
    pub device: String,
}

pub fn collection_listing(
    collection: &AssetCollection,
    dimensions: &DimensionState,
) -> CollectionListing {
    let images = collection
        .assets()
        .iter()
        .enumerate()
        .map(|(index, asset)| ListedImage {
            position: index + 1,
            name: asset.name.clone(),
            mime_type: asset.mime_type.clone(),
            width: asset.natural_width(),
            height: asset.natural_height(),
            bytes: asset.byte_size,
            device: asset.device.clone(),
        })
        .collect();
    CollectionListing {
        images,
        selected: collection.current_index().map(|i| i + 1),
        target: dimensions.target(),
        keep_ratio: dimensions.keep_ratio(),
    }
}

/// One line for a load that dropped files; nothing when all decoded.
pub fn format_load_summary(summary: &LoadSummary) -> Vec<String> {
    if summary.dropped == 0 {
        return Vec::new();
    }
    vec![format!(
        "Loaded {} of {} files ({} could not be decoded)",
        summary.loaded,
        summary.loaded + summary.dropped,
        summary.dropped
    )]
}

// ============================================================================
// Export
// ============================================================================

/// Status line, delivered file names, then any skipped assets.
pub fn format_export_report(job: ExportJob, report: &ExportReport) -> Vec<String> {
    let mut lines = Vec::new();
    if report.produced > 0 {
        lines.push(job.status_message().to_string());
    } else {
        lines.push("Nothing exported".to_string());
    }
    for name in &report.downloads {
        lines.push(format!("{}{}", indent(1), name));
    }
    if !report.skipped.is_empty() {
        lines.push("Skipped".to_string());
        for item in &report.skipped {
            lines.push(format!(
                "{}{}: {}",
                indent(1),
                asset_header(item.index, &item.asset),
                item.reason
            ));
        }
    }
    lines
}

pub fn print_export_report(job: ExportJob, report: &ExportReport) {
    for line in format_export_report(job, report) {
        println!("{}", line);
    }
}

// ============================================================================
// Traces
// ============================================================================

/// One line per asset: where its trace was written, or that it has none.
///
/// `written` pairs a collection index with the file the trace went to.
pub fn format_traces(
    collection: &AssetCollection,
    traces: &TraceSet,
    written: &[(usize, String)],
) -> Vec<String> {
    let mut lines = vec!["Traces".to_string()];
    for (index, asset) in collection.assets().iter().enumerate() {
        let header = asset_header(index, &asset.name);
        match traces.get(index) {
            Some(svg) => {
                let file = written
                    .iter()
                    .find(|(i, _)| *i == index)
                    .map(|(_, name)| format!(" → {name}"))
                    .unwrap_or_default();
                lines.push(format!("{header}{file} ({} bytes)", svg.len()));
            }
            None => lines.push(format!("{header} (no trace)")),
        }
    }
    lines
}

pub fn print_traces(collection: &AssetCollection, traces: &TraceSet, written: &[(usize, String)]) {
    for line in format_traces(collection, traces, written) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::SkippedItem;
    use crate::test_helpers::{Harness, mock_collection};

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_is_one_based() {
        assert_eq!(format_index(0), "001");
        assert_eq!(format_index(41), "042");
    }

    #[test]
    fn indent_levels() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(2), "        ");
    }

    // =========================================================================
    // Info
    // =========================================================================

    #[test]
    fn collection_listing_marks_selection() {
        let mut collection = mock_collection(&[("a.png", 800, 600), ("b.png", 10, 20)]);
        collection.select(1).unwrap();
        let lines = format_collection(&collection, &DimensionState::new());

        assert_eq!(lines[0], "Images");
        assert_eq!(lines[1], "001 a.png");
        assert_eq!(lines[2], "    800x600, 0.0 KB");
        assert_eq!(lines[3], "    Device: Unknown");
        assert_eq!(lines[4], "002 b.png *");
        assert_eq!(lines.last().unwrap(), "    300x300 (ratio locked)");
    }

    #[test]
    fn empty_collection_listing() {
        let lines = format_collection(&AssetCollection::new(), &DimensionState::new());
        assert_eq!(lines[1], "    (none)");
    }

    #[test]
    fn invalid_target_shows_raw_buffers() {
        let mut dims = DimensionState::new();
        dims.set_keep_ratio(false, None);
        dims.edit_width("abc");
        let lines = format_collection(&AssetCollection::new(), &dims);
        assert_eq!(
            lines.last().unwrap(),
            "    invalid ('abc' x '300') (ratio unlocked)"
        );
    }

    #[test]
    fn collection_listing_serializes_positions_and_target() {
        let mut collection = mock_collection(&[("a.png", 800, 600), ("b.png", 10, 20)]);
        collection.select(1).unwrap();
        let listing = collection_listing(&collection, &DimensionState::new());

        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["selected"], 2);
        assert_eq!(json["images"][0]["position"], 1);
        assert_eq!(json["images"][0]["width"], 800);
        assert_eq!(json["images"][1]["device"], "Unknown");
        assert_eq!(json["target"]["width"], 300);
        assert_eq!(json["keep_ratio"], true);
    }

    #[test]
    fn collection_listing_without_valid_target() {
        let mut dims = DimensionState::new();
        dims.set_keep_ratio(false, None);
        dims.edit_height("abc");
        let listing = collection_listing(&AssetCollection::new(), &dims);
        assert!(listing.images.is_empty());
        assert!(listing.selected.is_none());
        assert!(listing.target.is_none());
    }

    #[test]
    fn load_summary_silent_when_nothing_dropped() {
        let summary = LoadSummary {
            loaded: 3,
            dropped: 0,
        };
        assert!(format_load_summary(&summary).is_empty());
        let summary = LoadSummary {
            loaded: 2,
            dropped: 1,
        };
        assert_eq!(
            format_load_summary(&summary),
            vec!["Loaded 2 of 3 files (1 could not be decoded)"]
        );
    }

    // =========================================================================
    // Export
    // =========================================================================

    #[test]
    fn export_report_lists_downloads_and_skips() {
        let report = ExportReport {
            downloads: vec!["image-1.ico".to_string()],
            produced: 1,
            skipped: vec![SkippedItem {
                index: 1,
                asset: "big.png".to_string(),
                reason: "too large".to_string(),
            }],
        };
        let lines = format_export_report(ExportJob::Ico, &report);
        assert_eq!(
            lines,
            vec![
                "ICO download complete!",
                "    image-1.ico",
                "Skipped",
                "    002 big.png: too large",
            ]
        );
    }

    #[test]
    fn export_report_without_output() {
        let lines = format_export_report(ExportJob::Png, &ExportReport::default());
        assert_eq!(lines, vec!["Nothing exported"]);
    }

    // =========================================================================
    // Traces
    // =========================================================================

    #[test]
    fn traces_listing_shows_files_and_gaps() {
        let collection = mock_collection(&[("a.png", 4, 4), ("b.png", 4, 4)]);
        let h = Harness::new();
        let (traces, _) = crate::export::vector::generate_traces(
            &collection,
            crate::imaging::Dimensions::new(4, 4),
            &mut crate::imaging::Surface::new(),
            &h.services(),
        )
        .unwrap();
        let written = vec![(0, "image-1.svg".to_string())];

        let lines = format_traces(&collection, &traces, &written);

        assert_eq!(lines[0], "Traces");
        assert!(lines[1].starts_with("001 a.png → image-1.svg ("));
        assert!(lines[2].starts_with("002 b.png ("));
    }

    #[test]
    fn traces_listing_without_traces() {
        let collection = mock_collection(&[("a.png", 4, 4)]);
        let lines = format_traces(&collection, &TraceSet::new(), &[]);
        assert_eq!(lines, vec!["Traces", "001 a.png (no trace)"]);
    }
}
