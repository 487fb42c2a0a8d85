//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Aspect ratio (`width / height`) of a natural size.
///
/// Callers guarantee `height > 0`; decoded images always have pixels.
pub fn aspect_ratio(width: u32, height: u32) -> f64 {
    width as f64 / height as f64
}

/// Height that keeps `ratio` for the given width, rounded half-up.
///
/// # Examples
/// ```
/// # use image_converter::imaging::calculations::height_for_width;
/// // 4:3 source edited to 300 wide → 225 high
/// assert_eq!(height_for_width(300, 4.0 / 3.0), 225);
/// ```
pub fn height_for_width(width: i64, ratio: f64) -> i64 {
    (width as f64 / ratio).round() as i64
}

/// Width that keeps `ratio` for the given height, rounded half-up.
///
/// # Examples
/// ```
/// # use image_converter::imaging::calculations::width_for_height;
/// assert_eq!(width_for_height(225, 4.0 / 3.0), 300);
/// ```
pub fn width_for_height(height: i64, ratio: f64) -> i64 {
    (height as f64 * ratio).round() as i64
}

/// Scale factor that shrinks `width` into `available`, never enlarging.
///
/// # Arguments
/// * `width` - Source width in any unit
/// * `available` - Width the image must fit into, same unit
///
/// # Returns
/// * `min(available / width, 1)`
pub fn shrink_to_fit(width: f64, available: f64) -> f64 {
    (available / width).min(1.0)
}
