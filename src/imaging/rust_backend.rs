//! Pure Rust image backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP, ICO) | `image::ImageReader` with guessed format |
//! | Orientation | `ImageDecoder::orientation` + `DynamicImage::apply_orientation` |
//! | Device metadata | `kamadak-exif` (`Make` / `Model`) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder`, alpha dropped |
//! | Encode → ICO | `image::codecs::ico::IcoEncoder` (max 256×256) |

use super::backend::{BackendError, DeviceInfo, ImageBackend};
use super::params::{Quality, RasterFormat};
use crate::assets::RawFile;
use image::buffer::ConvertBuffer;
use image::codecs::ico::IcoEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::metadata::Orientation;
use image::{
    DynamicImage, ExtendedColorType, ImageDecoder, ImageEncoder, ImageFormat, ImageReader,
    RgbImage, RgbaImage,
};
use std::io::Cursor;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
const DECODABLE_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("tif", ImageFormat::Tiff),
    ("tiff", ImageFormat::Tiff),
    ("webp", ImageFormat::WebP),
    ("gif", ImageFormat::Gif),
    ("bmp", ImageFormat::Bmp),
    ("ico", ImageFormat::Ico),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    let mut exts: Vec<&'static str> = DECODABLE_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect();
    // Converted to JPEG by the HEIC boundary before decoding
    exts.extend(["heic", "heif"]);
    exts
});

/// Returns the file extensions accepted as load inputs.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Read an ASCII EXIF tag, trimming NUL padding and whitespace.
fn ascii_tag(exif: &exif::Exif, tag: exif::Tag) -> Option<String> {
    let field = exif.get_field(tag, exif::In::PRIMARY)?;
    match &field.value {
        exif::Value::Ascii(parts) => parts
            .first()
            .map(|p| {
                String::from_utf8_lossy(p)
                    .trim_end_matches('\0')
                    .trim()
                    .to_string()
            })
            .filter(|s| !s.is_empty()),
        _ => None,
    }
}

impl ImageBackend for RustBackend {
    fn decode(&self, file: &RawFile) -> Result<DynamicImage, BackendError> {
        let decode_err = |e: image::ImageError| BackendError::Decode {
            name: file.name.clone(),
            reason: e.to_string(),
        };

        let reader = ImageReader::new(Cursor::new(file.bytes.as_slice())).with_guessed_format()?;
        let mut decoder = reader.into_decoder().map_err(decode_err)?;
        let orientation = decoder
            .orientation()
            .unwrap_or(Orientation::NoTransforms);
        let mut img = DynamicImage::from_decoder(decoder).map_err(decode_err)?;
        img.apply_orientation(orientation);

        if img.width() == 0 || img.height() == 0 {
            return Err(BackendError::Decode {
                name: file.name.clone(),
                reason: "image has no pixels".to_string(),
            });
        }
        Ok(img)
    }

    fn read_device(&self, file: &RawFile) -> DeviceInfo {
        let mut cursor = Cursor::new(file.bytes.as_slice());
        match exif::Reader::new().read_from_container(&mut cursor) {
            Ok(exif) => DeviceInfo {
                make: ascii_tag(&exif, exif::Tag::Make),
                model: ascii_tag(&exif, exif::Tag::Model),
            },
            Err(_) => DeviceInfo::default(),
        }
    }

    fn encode(
        &self,
        pixels: &RgbaImage,
        format: RasterFormat,
        quality: Quality,
    ) -> Result<Vec<u8>, BackendError> {
        let (width, height) = pixels.dimensions();
        let mut buf = Vec::new();

        let result = match format {
            RasterFormat::Png => PngEncoder::new(&mut buf).write_image(
                pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
            RasterFormat::Jpeg => {
                // JPEG has no alpha channel; the cleared surface flattens to black
                let rgb: RgbImage = pixels.convert();
                JpegEncoder::new_with_quality(&mut buf, quality.value() as u8).write_image(
                    rgb.as_raw(),
                    width,
                    height,
                    ExtendedColorType::Rgb8,
                )
            }
            RasterFormat::Ico => IcoEncoder::new(&mut buf).write_image(
                pixels.as_raw(),
                width,
                height,
                ExtendedColorType::Rgba8,
            ),
        };

        result.map_err(|e| BackendError::Encode {
            format,
            width,
            height,
            reason: e.to_string(),
        })?;
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{jpeg_bytes, png_bytes};

    #[test]
    fn supported_extensions_include_heic_and_common_formats() {
        let exts = supported_input_extensions();
        for expected in &["jpg", "jpeg", "png", "webp", "gif", "heic", "heif"] {
            assert!(
                exts.contains(expected),
                "expected {expected} in supported extensions"
            );
        }
    }

    #[test]
    fn decode_synthetic_png() {
        let file = RawFile::new("a.png", "image/png", png_bytes(200, 150));
        let img = RustBackend::new().decode(&file).unwrap();
        assert_eq!((img.width(), img.height()), (200, 150));
    }

    #[test]
    fn decode_sniffs_format_regardless_of_name() {
        let file = RawFile::new("misnamed.png", "image/png", jpeg_bytes(40, 30));
        let img = RustBackend::new().decode(&file).unwrap();
        assert_eq!((img.width(), img.height()), (40, 30));
    }

    #[test]
    fn decode_garbage_errors() {
        let file = RawFile::new("x.png", "image/png", b"definitely not pixels".to_vec());
        assert!(RustBackend::new().decode(&file).is_err());
    }

    #[test]
    fn device_missing_exif_returns_default() {
        let file = RawFile::new("a.jpg", "image/jpeg", jpeg_bytes(10, 10));
        assert_eq!(RustBackend::new().read_device(&file), DeviceInfo::default());
    }

    #[test]
    fn encode_png_roundtrips_dimensions() {
        let surface = RgbaImage::new(64, 32);
        let bytes = RustBackend::new()
            .encode(&surface, RasterFormat::Png, Quality::default())
            .unwrap();
        assert_eq!(&bytes[..4], b"\x89PNG");
        assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 64);
    }

    #[test]
    fn encode_jpeg_writes_soi_marker() {
        let surface = RgbaImage::from_pixel(16, 16, image::Rgba([200, 10, 10, 255]));
        let bytes = RustBackend::new()
            .encode(&surface, RasterFormat::Jpeg, Quality::new(80))
            .unwrap();
        assert_eq!(&bytes[..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn encode_ico_small_succeeds() {
        let bytes = RustBackend::new()
            .encode(&RgbaImage::new(32, 32), RasterFormat::Ico, Quality::default())
            .unwrap();
        // ICONDIR: reserved 0, type 1
        assert_eq!(&bytes[..4], &[0, 0, 1, 0]);
    }

    #[test]
    fn encode_ico_oversize_fails() {
        let result = RustBackend::new().encode(
            &RgbaImage::new(300, 300),
            RasterFormat::Ico,
            Quality::default(),
        );
        assert!(matches!(
            result,
            Err(BackendError::Encode {
                format: RasterFormat::Ico,
                width: 300,
                ..
            })
        ));
    }
}
