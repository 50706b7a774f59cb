//! Modality traits consumed by the recognizer.

use crate::cloud::{PointCloud, PointXyz, Rgb};
use crate::map::QuantizedMap;

/// A modality that exposes per-pixel quantized labels.
pub trait QuantizableModality {
    /// Quantized labels of the last processed frame.
    fn quantized_map(&self) -> &QuantizedMap;

    /// Spread labels of the last processed frame, as used for matching.
    fn spread_quantized_map(&self) -> &QuantizedMap;
}

/// Quantized color-gradient orientations.
pub trait ColorGradientModality: QuantizableModality {
    fn set_input_colors(&mut self, colors: &PointCloud<Rgb>);

    /// Recomputes the quantized and spread maps from the current input.
    fn process_input_data(&mut self);

    /// Gradients weaker than `threshold` are ignored.
    fn set_gradient_magnitude_threshold(&mut self, threshold: f32);
}

/// Quantized surface-normal orientations.
pub trait SurfaceNormalModality: QuantizableModality {
    fn set_input_cloud(&mut self, cloud: &PointCloud<PointXyz>);

    /// Recomputes the quantized and spread maps from the current input.
    fn process_input_data(&mut self);

    fn set_feature_distance_threshold(&mut self, threshold: f32);

    fn set_min_distance_to_border(&mut self, distance: f32);
}
