//! Single-page document export.
//!
//! ## Layout
//!
//! All images go on one page, stacked vertically and horizontally centred.
//! The page grows to fit them:
//!
//! ```text
//! content width  = page width − 2 × margin
//! scale_i        = min(content width / width_i, 1)     (shrink only)
//! page height    = margin + Σ (height_i × scale_i + margin)
//! ```
//!
//! The page is landscape when exactly one image is placed and it is wider
//! than tall; otherwise portrait, whatever the content.
//!
//! Lengths are in document units (millimetres); an image's natural pixel
//! size is taken as its size in those units before scaling.
//!
//! ## Encoding
//!
//! [`PdfEncoder`] writes the layout with `lopdf`. Image payloads are sniffed
//! by magic bytes: JPEG is embedded as-is (`DCTDecode`), PNG is decoded,
//! composited over white and re-compressed (`FlateDecode`).

use super::raster::render;
use super::{ExportError, ExportJob, ExportReport, Services, targets};
use crate::assets::AssetCollection;
use crate::config::DocumentConfig;
use crate::imaging::calculations::shrink_to_fit;
use crate::imaging::{Dimensions, Quality, Surface};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::{ColorType, ImageDecoder, ImageReader};
use lopdf::{Dictionary, Document, Object, Stream, dictionary};
use serde::Serialize;
use std::io::{Cursor, Write};
use thiserror::Error;

pub const PDF_MIME: &str = "application/pdf";

/// Points per millimetre.
const PT_PER_MM: f64 = 72.0 / 25.4;

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Layout has {placements} placements but {images} images")]
    Mismatch { placements: usize, images: usize },
    #[error("Image {0} is neither JPEG nor PNG")]
    UnsupportedImage(usize),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF error: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Orientation {
    Portrait,
    Landscape,
}

/// Where one image lands, measured from the top-left of the page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentLayout {
    pub orientation: Orientation,
    pub page_width: f64,
    pub page_height: f64,
    pub placements: Vec<Placement>,
}

/// Landscape only for a single wider-than-tall image.
pub fn orientation_for(sizes: &[Dimensions]) -> Orientation {
    match sizes {
        [only] if only.width > only.height => Orientation::Landscape,
        _ => Orientation::Portrait,
    }
}

/// Stack `sizes` on one page of `page_width`.
pub fn compute_layout(sizes: &[Dimensions], page_width: f64, margin: f64) -> DocumentLayout {
    let content_width = page_width - 2.0 * margin;
    let mut y = margin;
    let placements = sizes
        .iter()
        .map(|size| {
            let scale = shrink_to_fit(f64::from(size.width), content_width);
            let width = f64::from(size.width) * scale;
            let height = f64::from(size.height) * scale;
            let placement = Placement {
                x: (page_width - width) / 2.0,
                y,
                width,
                height,
            };
            y += height + margin;
            placement
        })
        .collect();

    DocumentLayout {
        orientation: orientation_for(sizes),
        page_width,
        page_height: y,
        placements,
    }
}

/// Layout with the page width picked from the orientation.
pub fn layout_for(sizes: &[Dimensions], config: &DocumentConfig) -> DocumentLayout {
    let page_width = match orientation_for(sizes) {
        Orientation::Portrait => config.portrait_width,
        Orientation::Landscape => config.landscape_width,
    };
    compute_layout(sizes, page_width, config.margin)
}

/// Turns a layout plus one encoded image per placement into a document.
pub trait DocumentEncoder: Sync {
    fn encode(&self, layout: &DocumentLayout, images: &[Vec<u8>])
    -> Result<Vec<u8>, DocumentError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedFormat {
    Jpeg,
    Png,
}

/// Detect the payload kind from its magic bytes.
pub fn sniff(data: &[u8]) -> Option<EmbeddedFormat> {
    if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(EmbeddedFormat::Jpeg)
    } else if data.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some(EmbeddedFormat::Png)
    } else {
        None
    }
}

/// Image XObject ready for embedding.
struct ImageObject {
    width: u32,
    height: u32,
    color_space: &'static str,
    filter: &'static str,
    data: Vec<u8>,
}

impl ImageObject {
    fn from_jpeg(data: &[u8]) -> Result<Self, DocumentError> {
        let decoder = ImageReader::new(Cursor::new(data))
            .with_guessed_format()?
            .into_decoder()?;
        let (width, height) = decoder.dimensions();
        let color_space = match decoder.color_type() {
            ColorType::L8 | ColorType::L16 => "DeviceGray",
            _ => "DeviceRGB",
        };
        Ok(Self {
            width,
            height,
            color_space,
            filter: "DCTDecode",
            data: data.to_vec(),
        })
    }

    fn from_png(data: &[u8]) -> Result<Self, DocumentError> {
        let rgba = image::load_from_memory(data)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
        for pixel in rgba.pixels() {
            let alpha = f32::from(pixel[3]) / 255.0;
            for channel in &pixel.0[..3] {
                rgb.push((f32::from(*channel) * alpha + 255.0 * (1.0 - alpha)).round() as u8);
            }
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&rgb)?;
        Ok(Self {
            width,
            height,
            color_space: "DeviceRGB",
            filter: "FlateDecode",
            data: encoder.finish()?,
        })
    }

    fn into_stream(self) -> Stream {
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => i64::from(self.width),
            "Height" => i64::from(self.height),
            "ColorSpace" => self.color_space,
            "BitsPerComponent" => 8,
            "Filter" => self.filter,
        };
        Stream::new(dict, self.data)
    }
}

/// PDF output through `lopdf`. Layout millimetres become points.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfEncoder;

impl DocumentEncoder for PdfEncoder {
    fn encode(
        &self,
        layout: &DocumentLayout,
        images: &[Vec<u8>],
    ) -> Result<Vec<u8>, DocumentError> {
        if layout.placements.len() != images.len() {
            return Err(DocumentError::Mismatch {
                placements: layout.placements.len(),
                images: images.len(),
            });
        }

        let page_width = layout.page_width * PT_PER_MM;
        let page_height = layout.page_height * PT_PER_MM;

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let mut xobjects = Dictionary::new();
        let mut content = String::new();

        for (i, (placement, data)) in layout.placements.iter().zip(images).enumerate() {
            let object = match sniff(data) {
                Some(EmbeddedFormat::Jpeg) => ImageObject::from_jpeg(data)?,
                Some(EmbeddedFormat::Png) => ImageObject::from_png(data)?,
                None => return Err(DocumentError::UnsupportedImage(i)),
            };
            let name = format!("Im{}", i + 1);
            let image_id = doc.add_object(object.into_stream());
            xobjects.set(name.as_str(), image_id);

            // PDF y runs bottom-up
            let width = placement.width * PT_PER_MM;
            let height = placement.height * PT_PER_MM;
            let x = placement.x * PT_PER_MM;
            let y = page_height - placement.y * PT_PER_MM - height;
            content.push_str(&format!(
                "q\n{width:.3} 0 0 {height:.3} {x:.3} {y:.3} cm\n/{name} Do\nQ\n"
            ));
        }

        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_width as f32),
                Object::Real(page_height as f32),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! { "XObject" => xobjects },
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buf = Vec::new();
        doc.save_to(&mut buf)
            .map_err(|e| DocumentError::Pdf(e.to_string()))?;
        tracing::debug!(
            images = images.len(),
            width = layout.page_width,
            height = layout.page_height,
            "document encoded"
        );
        Ok(buf)
    }
}

/// Export every asset at natural size into one document.
pub fn export_document(
    collection: &AssetCollection,
    config: &DocumentConfig,
    base_name: &str,
    quality: Quality,
    surface: &mut Surface,
    services: &Services,
) -> Result<ExportReport, ExportError> {
    let assets = targets(collection, ExportJob::Document.policy())?;
    let mut sizes = Vec::with_capacity(assets.len());
    let mut images = Vec::with_capacity(assets.len());
    let mut report = ExportReport::default();

    for (index, asset) in assets {
        let size = asset.natural_size();
        match render(surface, asset, size, config.image_format, quality, services.backend) {
            Ok(bytes) => {
                sizes.push(size);
                images.push(bytes);
                report.produced += 1;
            }
            Err(e) => report.skip(index, asset, e),
        }
    }
    if images.is_empty() {
        return Ok(report);
    }

    let layout = layout_for(&sizes, config);
    let pdf = services.document.encode(&layout, &images)?;
    let name = format!("{base_name}.pdf");
    services.downloader.download(&name, PDF_MIME, &pdf)?;
    report.downloads.push(name);
    Ok(report)
}
