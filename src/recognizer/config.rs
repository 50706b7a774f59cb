//! Recognizer configuration.

use crate::candidate::ClusteringMethod;
use crate::refine::{DepthRefinement, IcpConfig};

/// Number of features sampled per modality when creating a template.
pub const DEFAULT_FEATURES_PER_MODALITY: usize = 63;

/// Configuration for [`LineRgbd`](crate::LineRgbd).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecognizerConfig {
    /// Color gradients weaker than this are ignored by the color modality.
    pub gradient_magnitude_threshold: f32,
    /// Feature distance threshold of the surface-normal modality.
    pub feature_distance_threshold: f32,
    /// Minimum distance to the frame border for surface-normal features.
    pub min_distance_to_border: f32,
    /// Translation threshold passed to the engine's 2D match pruning.
    pub translation_threshold_2d: usize,
    /// Grid size of the 3D clustering buckets; 0 disables 3D clustering.
    pub translation_threshold_3d: usize,
    /// Rotation threshold passed to the engine's 2D match pruning.
    pub rotation_threshold: f32,
    /// Minimum overlap ratio for [`ClusteringMethod::Overlap`].
    pub intersection_volume_threshold: f32,
    pub clustering: ClusteringMethod,
    /// Keep detections of different templates in separate buckets.
    pub separate_templates: bool,
    pub depth_refinement: DepthRefinement,
    pub icp: IcpConfig,
    /// Refine detections on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        Self {
            gradient_magnitude_threshold: 10.0,
            feature_distance_threshold: 2.0,
            min_distance_to_border: 2.0,
            translation_threshold_2d: 0,
            translation_threshold_3d: 0,
            rotation_threshold: 0.0,
            intersection_volume_threshold: 1.0,
            clustering: ClusteringMethod::GridBuckets,
            separate_templates: false,
            depth_refinement: DepthRefinement::Histogram,
            icp: IcpConfig::default(),
            parallel: false,
        }
    }
}

/// Scale sweep for semi scale-invariant detection.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleRange {
    pub min_scale: f32,
    pub max_scale: f32,
    /// Factor applied between consecutive scales.
    pub multiplier: f32,
}

impl Default for ScaleRange {
    fn default() -> Self {
        Self {
            min_scale: 0.694_444_4,
            max_scale: 1.44,
            multiplier: 1.2,
        }
    }
}
