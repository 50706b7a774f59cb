//! 3D detections and the 2D-to-3D projection stage.

use crate::geometry::{BoundingBoxXyz, RegionXy};

pub(crate) mod project;

pub use project::project_matches;

/// A placed, scored template instance.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Detection {
    /// Index of the matched template.
    pub template_id: usize,
    /// Object the template belongs to.
    pub object_id: usize,
    /// Position in the output of the call that produced it; not stable
    /// across calls.
    pub detection_id: usize,
    /// Match score in `[0, 1]`, higher is better.
    pub score: f32,
    /// Box in scene coordinates.
    pub bounding_box: BoundingBoxXyz,
    /// Matched region in image coordinates.
    pub region: RegionXy,
}
