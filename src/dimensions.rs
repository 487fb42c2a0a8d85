//! Target-size state machine.
//!
//! Width and height are edited as free text, so each axis keeps two things:
//! the raw edit buffer (what the user typed, possibly empty or half-typed)
//! and the validated positive integer derived from it. All transitions below
//! reason over the validated value; the buffer is kept for display only.
//!
//! ## Transitions
//!
//! | Event | Effect |
//! |---|---|
//! | `select_asset` | target ← natural size, ratio ← asset ratio (lock state unchanged) |
//! | `edit_width` | negative input ignored; with lock on, height ← round(width / ratio) |
//! | `edit_height` | negative input ignored; with lock on, width ← round(height × ratio) |
//! | `set_keep_ratio(true)` | with a selection: snap back to its natural size and ratio; otherwise ratio ← width / height |
//! | `set_keep_ratio(false)` | no size change |
//! | `apply_preset` | absolute size, lock forced off |
//!
//! The edited field always drives the other one, never the reverse, so a
//! locked edit cannot oscillate.

use crate::assets::ImageAsset;
use crate::imaging::Dimensions;
use crate::imaging::calculations::{height_for_width, width_for_height};

const INITIAL_SIZE: u32 = 300;

/// Integer prefix of `input`, with the lenient rules of a browser number field.
///
/// Leading whitespace and one sign are accepted, then digits up to the first
/// non-digit: `"12px"` → 12, `" -4"` → -4, `"3.9"` → 3, `""`/`"abc"` → `None`.
pub fn parse_leading_int(input: &str) -> Option<i64> {
    let s = input.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: i64 = digits[..end].parse().ok()?;
    Some(if negative { -value } else { value })
}

/// One axis: edit buffer plus validated value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisInput {
    raw: String,
    value: Option<u32>,
}

impl AxisInput {
    pub fn from_value(value: u32) -> Self {
        Self {
            raw: value.to_string(),
            value: (value > 0).then_some(value),
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        Self {
            raw: raw.to_string(),
            value: parse_leading_int(raw)
                .filter(|n| *n > 0)
                .and_then(|n| u32::try_from(n).ok()),
        }
    }

    fn from_derived(value: i64) -> Self {
        Self {
            raw: value.to_string(),
            value: u32::try_from(value).ok().filter(|n| *n > 0),
        }
    }

    /// Exactly what the user typed.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Positive integer value, `None` while the buffer is empty or invalid.
    pub fn value(&self) -> Option<u32> {
        self.value
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimensionState {
    width: AxisInput,
    height: AxisInput,
    keep_ratio: bool,
    ratio: f64,
}

impl Default for DimensionState {
    fn default() -> Self {
        Self {
            width: AxisInput::from_value(INITIAL_SIZE),
            height: AxisInput::from_value(INITIAL_SIZE),
            keep_ratio: true,
            ratio: 1.0,
        }
    }
}

impl DimensionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> &AxisInput {
        &self.width
    }

    pub fn height(&self) -> &AxisInput {
        &self.height
    }

    pub fn keep_ratio(&self) -> bool {
        self.keep_ratio
    }

    pub fn locked_ratio(&self) -> f64 {
        self.ratio
    }

    /// Current target size, `None` while either buffer is invalid.
    pub fn target(&self) -> Option<Dimensions> {
        Some(Dimensions::new(self.width.value?, self.height.value?))
    }

    /// Seed from a newly selected asset.
    pub fn select_asset(&mut self, asset: &ImageAsset) {
        self.width = AxisInput::from_value(asset.natural_width());
        self.height = AxisInput::from_value(asset.natural_height());
        self.ratio = asset.aspect_ratio();
    }

    /// Returns `false` when the input was rejected (negative number).
    pub fn edit_width(&mut self, input: &str) -> bool {
        let parsed = parse_leading_int(input);
        if parsed.is_some_and(|n| n < 0) {
            return false;
        }
        if self.keep_ratio {
            if let Some(n) = parsed {
                self.height = AxisInput::from_derived(height_for_width(n, self.ratio));
            }
        }
        self.width = AxisInput::from_raw(input);
        true
    }

    /// Returns `false` when the input was rejected (negative number).
    pub fn edit_height(&mut self, input: &str) -> bool {
        let parsed = parse_leading_int(input);
        if parsed.is_some_and(|n| n < 0) {
            return false;
        }
        if self.keep_ratio {
            if let Some(n) = parsed {
                self.width = AxisInput::from_derived(width_for_height(n, self.ratio));
            }
        }
        self.height = AxisInput::from_raw(input);
        true
    }

    pub fn set_keep_ratio(&mut self, enabled: bool, selected: Option<&ImageAsset>) {
        if enabled {
            match selected {
                Some(asset) => self.select_asset(asset),
                None => {
                    let w = parse_leading_int(&self.width.raw);
                    let h = parse_leading_int(&self.height.raw);
                    if let (Some(w), Some(h)) = (w, h) {
                        if h != 0 {
                            self.ratio = w as f64 / h as f64;
                        }
                    }
                }
            }
        }
        self.keep_ratio = enabled;
    }

    /// Presets are absolute sizes; they always turn the ratio lock off.
    pub fn apply_preset(&mut self, width: u32, height: u32) {
        self.width = AxisInput::from_value(width);
        self.height = AxisInput::from_value(height);
        self.keep_ratio = false;
    }
}
