//! Vector trace boundary.
//!
//! A [`Tracer`] turns a rasterized surface into an SVG document string. No
//! fidelity guarantees are made; callers only display, copy or package the
//! result.
//!
//! The built-in [`PosterizeTracer`] quantizes every channel to a small number
//! of levels, then covers each colour region with axis-aligned rectangles:
//! horizontal runs of one colour are found per row, and a run identical to one
//! in the row above (same start, length and colour) grows that rectangle
//! downward instead of opening a new one. One `<path>` is emitted per colour,
//! in order of first appearance.

use image::RgbaImage;
use std::collections::HashMap;
use std::fmt::Write;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TraceError {
    #[error("Cannot trace an empty surface")]
    EmptySurface,
}

pub trait Tracer: Sync {
    fn trace(&self, pixels: &RgbaImage) -> Result<String, TraceError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PosterizeTracer {
    levels: u8,
    min_alpha: u8,
}

impl Default for PosterizeTracer {
    fn default() -> Self {
        Self::new(4, 1)
    }
}

/// Axis-aligned block of one colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl PosterizeTracer {
    /// `levels` is clamped to 2..=16; pixels with alpha below `min_alpha` are skipped.
    pub fn new(levels: u8, min_alpha: u8) -> Self {
        Self {
            levels: levels.clamp(2, 16),
            min_alpha,
        }
    }

    fn quantize(&self, value: u8) -> u8 {
        let step = 255.0 / f32::from(self.levels - 1);
        ((f32::from(value) / step).round() * step).round() as u8
    }

    fn quantize_pixel(&self, pixel: &image::Rgba<u8>) -> Option<[u8; 4]> {
        if pixel[3] < self.min_alpha {
            return None;
        }
        let alpha = self.quantize(pixel[3]);
        if alpha == 0 {
            return None;
        }
        Some([
            self.quantize(pixel[0]),
            self.quantize(pixel[1]),
            self.quantize(pixel[2]),
            alpha,
        ])
    }

    /// Colour rectangles grouped by colour, in first-appearance order.
    fn cover(&self, pixels: &RgbaImage) -> Vec<([u8; 4], Vec<Rect>)> {
        let (width, height) = pixels.dimensions();
        let mut rects: Vec<([u8; 4], Rect)> = Vec::new();
        let mut open: HashMap<(u32, u32, [u8; 4]), usize> = HashMap::new();

        for y in 0..height {
            let mut next_open = HashMap::new();
            let mut x = 0;
            while x < width {
                let Some(color) = self.quantize_pixel(pixels.get_pixel(x, y)) else {
                    x += 1;
                    continue;
                };
                let start = x;
                while x < width && self.quantize_pixel(pixels.get_pixel(x, y)) == Some(color) {
                    x += 1;
                }
                let key = (start, x - start, color);
                let idx = match open.get(&key) {
                    Some(&idx) => {
                        rects[idx].1.height += 1;
                        idx
                    }
                    None => {
                        rects.push((
                            color,
                            Rect {
                                x: start,
                                y,
                                width: x - start,
                                height: 1,
                            },
                        ));
                        rects.len() - 1
                    }
                };
                next_open.insert(key, idx);
            }
            open = next_open;
        }

        let mut groups: Vec<([u8; 4], Vec<Rect>)> = Vec::new();
        let mut by_color: HashMap<[u8; 4], usize> = HashMap::new();
        for (color, rect) in rects {
            let slot = *by_color.entry(color).or_insert_with(|| {
                groups.push((color, Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(rect);
        }
        groups
    }
}

impl Tracer for PosterizeTracer {
    fn trace(&self, pixels: &RgbaImage) -> Result<String, TraceError> {
        let (width, height) = pixels.dimensions();
        if width == 0 || height == 0 {
            return Err(TraceError::EmptySurface);
        }

        let mut svg = format!(
            "<svg width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\" \
             version=\"1.1\" xmlns=\"http://www.w3.org/2000/svg\">\n"
        );
        for ([r, g, b, a], rects) in self.cover(pixels) {
            let mut d = String::new();
            for rect in rects {
                if !d.is_empty() {
                    d.push(' ');
                }
                // Writing to a String cannot fail
                let _ = write!(
                    d,
                    "M{} {}h{}v{}h-{}z",
                    rect.x, rect.y, rect.width, rect.height, rect.width
                );
            }
            let _ = write!(svg, "<path fill=\"rgb({r},{g},{b})\"");
            if a < 255 {
                let _ = write!(svg, " fill-opacity=\"{:.3}\"", f32::from(a) / 255.0);
            }
            let _ = writeln!(svg, " d=\"{d}\"/>");
        }
        svg.push_str("</svg>");
        Ok(svg)
    }
}
