//! Provenance metadata for loaded files.
//!
//! ## Device label
//!
//! Each asset carries a free-text device label built from the EXIF `Make` and
//! `Model` tags: both joined by a space and trimmed. When neither tag is
//! present (screenshots, exported PNGs, stripped JPEGs) the label is the
//! literal `"Unknown"`. Metadata is best-effort; a missing or corrupt EXIF
//! block never fails a load.
//!
//! ## MIME type and timestamps
//!
//! Files read from disk have no browser-supplied MIME type, so it is guessed
//! from the extension. Timestamps are milliseconds since the Unix epoch, `0`
//! when the filesystem does not report one.

use crate::imaging::DeviceInfo;
use image::ImageFormat;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const UNKNOWN_DEVICE: &str = "Unknown";

/// Build the display label for a device lookup.
///
/// ```text
/// Some("Apple"), Some("iPhone 15")  → "Apple iPhone 15"
/// None,          Some("X100V")      → "X100V"
/// None,          None               → "Unknown"
/// ```
pub fn device_label(info: &DeviceInfo) -> String {
    let make = info.make.as_deref().unwrap_or("");
    let model = info.model.as_deref().unwrap_or("");
    let label = format!("{make} {model}");
    let label = label.trim();
    if label.is_empty() {
        UNKNOWN_DEVICE.to_string()
    } else {
        label.to_string()
    }
}

/// Guess a MIME type from a file name's extension.
///
/// HEIC/HEIF are not known to the `image` crate and are mapped by hand.
/// Unknown extensions yield `application/octet-stream`.
pub fn mime_for_name(name: &str) -> String {
    let ext = Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    match ext.as_str() {
        "heic" => "image/heic".to_string(),
        "heif" => "image/heif".to_string(),
        _ => ImageFormat::from_extension(&ext)
            .map(|f| f.to_mime_type().to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string()),
    }
}

/// Milliseconds since the epoch for a modification time.
pub fn epoch_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
