//! Image processing: decode, rasterize, encode, trace.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image::ImageReader` + EXIF orientation |
//! | **Device metadata** | `kamadak-exif` |
//! | **HEIC pre-conversion** | external converter command |
//! | **Rasterize** | `imageops::resize` onto a reused [`Surface`] |
//! | **Encode** | PNG / JPEG / ICO encoders from `image` |
//! | **Vector trace** | [`PosterizeTracer`] |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Output format and quality
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Raster**: the shared drawing surface
//! - **Heic / Trace**: external-capability boundaries with built-in implementations

pub mod backend;
pub mod calculations;
pub mod heic;
mod params;
pub mod raster;
pub mod rust_backend;
pub mod trace;

pub use backend::{BackendError, DeviceInfo, Dimensions, ImageBackend};
pub use heic::{CommandConverter, HeicConverter, HeicError, NoHeicSupport};
pub use params::{Quality, RasterFormat};
pub use raster::{MAX_SURFACE_PIXELS, RasterError, Surface};
pub use rust_backend::{RustBackend, supported_input_extensions};
pub use trace::{PosterizeTracer, TraceError, Tracer};
