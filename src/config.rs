//! Converter configuration module.
//!
//! Handles loading, validating, and merging the `image-converter.toml` file.
//! Stock defaults are the base layer; a user file overrides only the keys it
//! names.
//!
//! ## Config File Location
//!
//! `image-converter.toml` in the working directory, or any path passed with
//! `--config`. A missing file means "all defaults".
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! file_name = "image"            # Base name for bitmap/icon downloads
//!
//! [export]
//! jpeg_quality = 92              # JPEG quality (1-100)
//!
//! [screenshots]
//! width = 1242                   # Fixed store screenshot size
//! height = 2688
//! prefix = "iOS_Screen"          # iOS_Screen-01.jpg, iOS_Screen-02.jpg, ...
//! archive_name = "iOS_App_Store_Screenshots.zip"
//!
//! [bundle]
//! archive_name = "react-assets.zip"
//! folder_prefix = "img"          # img-1/, img-2/, ... when batching
//! trace_name = "logo.svg"
//! assets = [
//!     { width = 512, height = 512, name = "logo512.png", format = "png" },
//!     { width = 192, height = 192, name = "logo192.png", format = "png" },
//!     { width = 32, height = 32, name = "favicon.ico", format = "ico" },
//! ]
//!
//! [document]
//! file_name = "images"
//! margin = 5.0                   # Millimetres
//! portrait_width = 210.0         # A4 portrait width (mm)
//! landscape_width = 297.0        # A4 landscape width (mm)
//! image_format = "png"           # "png" or "jpeg"
//!
//! [trace]
//! levels = 4                     # Posterization levels per channel (2-16)
//! min_alpha = 1                  # Pixels more transparent than this are skipped
//!
//! [heic]
//! program = "heif-convert"       # External HEIC/HEIF converter
//!
//! [processing]
//! max_processes = 4              # Max parallel decoders (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse: override just the values you want:
//!
//! ```toml
//! [export]
//! jpeg_quality = 80
//! ```
//!
//! Arrays (`presets`, `bundle.assets`) replace the stock list as a whole.
//! Unknown keys are rejected to catch typos early.

use crate::imaging::RasterFormat;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "image-converter.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Converter configuration loaded from `image-converter.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Base name for bitmap and icon downloads.
    pub file_name: String,
    /// Encoding settings shared by every export.
    pub export: ExportConfig,
    /// Fixed-size store screenshot batch.
    pub screenshots: ScreenshotConfig,
    /// Composite web-app asset bundle.
    pub bundle: BundleConfig,
    /// Single-page document export.
    pub document: DocumentConfig,
    /// Built-in vector tracer.
    pub trace: TraceConfig,
    /// HEIC/HEIF pre-conversion.
    pub heic: HeicConfig,
    /// Named absolute sizes selectable with `--preset`.
    pub presets: Vec<Preset>,
    /// Parallel decoding settings.
    pub processing: ProcessingConfig,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            file_name: "image".to_string(),
            export: ExportConfig::default(),
            screenshots: ScreenshotConfig::default(),
            bundle: BundleConfig::default(),
            document: DocumentConfig::default(),
            trace: TraceConfig::default(),
            heic: HeicConfig::default(),
            presets: default_presets(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl ConverterConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.export.jpeg_quality) {
            return Err(ConfigError::Validation(
                "export.jpeg_quality must be 1-100".into(),
            ));
        }
        if self.screenshots.width == 0 || self.screenshots.height == 0 {
            return Err(ConfigError::Validation(
                "screenshots.width and screenshots.height must be non-zero".into(),
            ));
        }
        if self.bundle.assets.is_empty() {
            return Err(ConfigError::Validation(
                "bundle.assets must not be empty".into(),
            ));
        }
        let mut names = HashSet::new();
        for asset in &self.bundle.assets {
            if asset.width == 0 || asset.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "bundle asset '{}' must have a non-zero size",
                    asset.name
                )));
            }
            if asset.name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "bundle asset names must not be empty".into(),
                ));
            }
            if asset.name == self.bundle.trace_name || !names.insert(asset.name.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "bundle asset name '{}' is used twice",
                    asset.name
                )));
            }
        }
        let doc = &self.document;
        if doc.margin <= 0.0 || doc.margin * 2.0 >= doc.portrait_width {
            return Err(ConfigError::Validation(
                "document.margin must be positive and less than half the page width".into(),
            ));
        }
        if doc.landscape_width <= doc.margin * 2.0 {
            return Err(ConfigError::Validation(
                "document.landscape_width must exceed twice the margin".into(),
            ));
        }
        if doc.image_format == RasterFormat::Ico {
            return Err(ConfigError::Validation(
                "document.image_format must be \"png\" or \"jpeg\"".into(),
            ));
        }
        if !(2..=16).contains(&self.trace.levels) {
            return Err(ConfigError::Validation("trace.levels must be 2-16".into()));
        }
        for preset in &self.presets {
            if preset.width == 0 || preset.height == 0 {
                return Err(ConfigError::Validation(format!(
                    "preset '{}' must have a non-zero size",
                    preset.name
                )));
            }
        }
        Ok(())
    }

    /// Look up a preset by name, case-insensitively.
    pub fn preset(&self, name: &str) -> Option<&Preset> {
        self.presets
            .iter()
            .find(|p| p.name.eq_ignore_ascii_case(name))
    }
}

/// Encoding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// JPEG quality (1-100).
    pub jpeg_quality: u32,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self { jpeg_quality: 92 }
    }
}

/// Fixed-size screenshot batch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreenshotConfig {
    pub width: u32,
    pub height: u32,
    /// File name prefix; files are `{prefix}-NN.jpg`.
    pub prefix: String,
    /// Archive name used when more than one image is exported.
    pub archive_name: String,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            width: 1242,
            height: 2688,
            prefix: "iOS_Screen".to_string(),
            archive_name: "iOS_App_Store_Screenshots.zip".to_string(),
        }
    }
}

/// One fixed-size entry in the asset bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleAsset {
    pub width: u32,
    pub height: u32,
    pub name: String,
    pub format: RasterFormat,
}

impl BundleAsset {
    fn new(size: u32, name: &str, format: RasterFormat) -> Self {
        Self {
            width: size,
            height: size,
            name: name.to_string(),
            format,
        }
    }
}

/// Composite bundle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BundleConfig {
    pub archive_name: String,
    /// Per-image folder prefix; folders are `{prefix}-N` when batching.
    pub folder_prefix: String,
    /// Name of the vector trace inside each folder.
    pub trace_name: String,
    /// Fixed sizes rendered for every image, in archive order.
    pub assets: Vec<BundleAsset>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            archive_name: "react-assets.zip".to_string(),
            folder_prefix: "img".to_string(),
            trace_name: "logo.svg".to_string(),
            assets: vec![
                BundleAsset::new(512, "logo512.png", RasterFormat::Png),
                BundleAsset::new(192, "logo192.png", RasterFormat::Png),
                BundleAsset::new(32, "favicon.ico", RasterFormat::Ico),
            ],
        }
    }
}

/// Document export settings. Lengths are millimetres.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentConfig {
    pub file_name: String,
    pub margin: f64,
    pub portrait_width: f64,
    pub landscape_width: f64,
    /// Raster kind used to embed images: `png` or `jpeg`.
    pub image_format: RasterFormat,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            file_name: "images".to_string(),
            margin: 5.0,
            portrait_width: 210.0,
            landscape_width: 297.0,
            image_format: RasterFormat::Png,
        }
    }
}

/// Built-in tracer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceConfig {
    pub levels: u8,
    pub min_alpha: u8,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            levels: 4,
            min_alpha: 1,
        }
    }
}

/// HEIC/HEIF converter settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeicConfig {
    /// Program invoked as `program <input> <output.jpg>`.
    pub program: String,
}

impl Default for HeicConfig {
    fn default() -> Self {
        Self {
            program: "heif-convert".to_string(),
        }
    }
}

/// A named absolute target size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Preset {
    pub name: String,
    pub width: u32,
    pub height: u32,
}

impl Preset {
    fn new(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            width,
            height,
        }
    }
}

fn default_presets() -> Vec<Preset> {
    vec![
        Preset::new("1024x768", 1024, 768),
        Preset::new("512x512", 512, 512),
        Preset::new("196x196", 196, 196),
        Preset::new("64x64", 64, 64),
        Preset::new("iOS App Store", 1242, 2688),
    ]
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decode workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(ConverterConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<ConverterConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: ConverterConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<ConverterConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock config file with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Image Converter Configuration
# =============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Unknown keys will cause an error.

# Base name for PNG/JPG/ICO downloads: image.png, or image-1.png, image-2.png...
file_name = "image"

# Named sizes for --preset. Presets always turn the aspect-ratio lock off.
presets = [
    { name = "1024x768", width = 1024, height = 768 },
    { name = "512x512", width = 512, height = 512 },
    { name = "196x196", width = 196, height = 196 },
    { name = "64x64", width = 64, height = 64 },
    { name = "iOS App Store", width = 1242, height = 2688 },
]

# ---------------------------------------------------------------------------
# Encoding
# ---------------------------------------------------------------------------
[export]
# JPEG quality (1 = worst, 100 = best).
jpeg_quality = 92

# ---------------------------------------------------------------------------
# Store screenshots (always every image, always this size)
# ---------------------------------------------------------------------------
[screenshots]
width = 1242
height = 2688
prefix = "iOS_Screen"
# Used when more than one image is loaded.
archive_name = "iOS_App_Store_Screenshots.zip"

# ---------------------------------------------------------------------------
# Web-app asset bundle
# ---------------------------------------------------------------------------
[bundle]
archive_name = "react-assets.zip"
# With several images, each gets its own folder: img-1/, img-2/, ...
folder_prefix = "img"
# Vector trace of the image at natural size.
trace_name = "logo.svg"
# Fixed sizes rendered for every image. format is "png", "jpeg" or "ico".
assets = [
    { width = 512, height = 512, name = "logo512.png", format = "png" },
    { width = 192, height = 192, name = "logo192.png", format = "png" },
    { width = 32, height = 32, name = "favicon.ico", format = "ico" },
]

# ---------------------------------------------------------------------------
# Document (single page, images stacked vertically)
# ---------------------------------------------------------------------------
[document]
file_name = "images"
# Lengths in millimetres.
margin = 5.0
portrait_width = 210.0
landscape_width = 297.0
# How images are embedded: "png" (lossless) or "jpeg".
image_format = "png"

# ---------------------------------------------------------------------------
# Vector tracing
# ---------------------------------------------------------------------------
[trace]
# Colour levels per channel (2-16). Fewer levels give smaller SVGs.
levels = 4
# Pixels with alpha below this are left empty.
min_alpha = 1

# ---------------------------------------------------------------------------
# HEIC/HEIF input
# ---------------------------------------------------------------------------
[heic]
# Converter called as: program <input.heic> <output.jpg>
program = "heif-convert"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel decode workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
