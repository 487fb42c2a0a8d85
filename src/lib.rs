//! # Image Converter
//!
//! Batch image conversion: load a set of photos, pick a target size, and
//! export them as bitmaps, icons, fixed-size store screenshots, vector
//! traces, a single-page PDF, or a zipped web-app icon bundle.
//!
//! # Architecture: Session + Export Jobs
//!
//! A [`workspace::Workspace`] holds one session: the loaded assets, the
//! selected asset, the width/height edit state, the retained traces and the
//! last status message. Every export is a job run against that state:
//!
//! ```text
//! files ──load──▶ AssetCollection ──select──▶ DimensionState (target size)
//!                       │                             │
//!                       └──────────┬──────────────────┘
//!                                  ▼
//!            rasterize onto the shared Surface, one asset at a time
//!                                  ▼
//!        encode (ImageBackend) / trace (Tracer) / lay out (DocumentEncoder)
//!                                  ▼
//!              package (Archiver) and deliver (Downloader)
//! ```
//!
//! Everything that touches the outside world (codecs, the HEIC converter,
//! archives, PDF writing, file delivery, the clipboard) sits behind a trait,
//! so the pipeline logic is tested against in-memory fakes.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`assets`] | Raw input files, decoded assets, the ordered collection and its selection |
//! | [`dimensions`] | Width/height edit buffers and the aspect-ratio lock |
//! | [`imaging`] | Codecs, the shared raster surface, HEIC conversion, vector tracing |
//! | [`export`] | Export jobs: bitmaps, screenshots, traces, PDF document, asset bundle |
//! | [`workspace`] | The session object every user action goes through |
//! | [`config`] | `image-converter.toml` loading, merging and validation |
//! | [`naming`] | Output file names and archive folder names |
//! | [`metadata`] | Device label resolution from EXIF make/model |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## One Surface, Sequential Work
//!
//! Every export draws onto a single reusable [`imaging::Surface`] and reads
//! it back before the next draw. Loading decodes files in parallel on the
//! rayon pool; exports never do, because the surface has exactly one writer.
//!
//! ## Absorb Per-Asset Failures
//!
//! A file that fails to decode is dropped from the load; an asset that fails
//! to render or encode is recorded as skipped in the
//! [`export::ExportReport`]. A batch only fails as a whole when there is
//! nothing to deliver or the delivery itself fails.

pub mod assets;
pub mod config;
pub mod dimensions;
pub mod export;
pub mod imaging;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_helpers;
