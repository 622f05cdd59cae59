//! Pure calculation functions for compression.
//!
//! All functions here are pure and testable without any I/O or encoders.

use super::params::{OutputFormat, SourceFormat};

/// Fit `(width, height)` inside `(max_width, max_height)`.
///
/// Images already inside the envelope keep their native size. Larger images
/// are scaled by the smaller of the two ratios, so aspect ratio is preserved
/// and neither edge exceeds its bound. Fractional pixels are truncated, the
/// way a canvas truncates an assigned width; edges never collapse below 1.
///
/// ```
/// # use recipe_client::imaging::fit_within;
/// assert_eq!(fit_within((4000, 3000), (1200, 800)), (1066, 800));
/// assert_eq!(fit_within((640, 480), (1200, 800)), (640, 480));
/// ```
pub fn fit_within(native: (u32, u32), bounds: (u32, u32)) -> (u32, u32) {
    let (width, height) = native;
    let (max_width, max_height) = bounds;

    if width <= max_width && height <= max_height {
        return (width, height);
    }

    let ratio = (max_width as f64 / width as f64).min(max_height as f64 / height as f64);
    // Nudge before truncating so the bound-limited edge lands exactly on it.
    let scaled_w = ((width as f64 * ratio + 1e-9) as u32).clamp(1, max_width.max(1));
    let scaled_h = ((height as f64 * ratio + 1e-9) as u32).clamp(1, max_height.max(1));
    (scaled_w, scaled_h)
}

/// Scan interleaved RGBA bytes; any alpha below 255 means transparency.
pub fn has_transparent_pixel(rgba: &[u8]) -> bool {
    rgba.chunks_exact(4).any(|px| px[3] < u8::MAX)
}

/// Pick the output format.
///
/// PNG when the pixels carry transparency or the source was PNG; WebP when
/// the source was WebP; JPEG otherwise.
pub fn choose_output_format(has_transparency: bool, source: SourceFormat) -> OutputFormat {
    if has_transparency || source == SourceFormat::Png {
        OutputFormat::Png
    } else if source == SourceFormat::WebP {
        OutputFormat::WebP
    } else {
        OutputFormat::Jpeg
    }
}
