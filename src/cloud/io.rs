//! Convenience helpers for building color frames via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::cloud::{PointCloud, Rgb};
use crate::util::{LinemodError, LinemodResult};
use std::path::Path;

/// Creates an organized color frame from an RGB image buffer.
pub fn colors_from_rgb_image(img: &image::RgbImage) -> LinemodResult<PointCloud<Rgb>> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let colors = img
        .pixels()
        .map(|px| Rgb::new(px.0[0], px.0[1], px.0[2]))
        .collect();
    PointCloud::new(colors, width, height)
}

/// Creates an organized color frame from a dynamic image.
pub fn colors_from_dynamic_image(img: &image::DynamicImage) -> LinemodResult<PointCloud<Rgb>> {
    let rgb = img.to_rgb8();
    colors_from_rgb_image(&rgb)
}

/// Loads an image from disk as an organized color frame.
pub fn load_color_frame<P: AsRef<Path>>(path: P) -> LinemodResult<PointCloud<Rgb>> {
    let img = image::open(path).map_err(|err| LinemodError::Io {
        reason: err.to_string(),
    })?;
    colors_from_dynamic_image(&img)
}
