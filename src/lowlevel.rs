//! Low-level building blocks for custom recognition pipelines.
//!
//! These re-export the individual pipeline stages (projection, depth
//! refinement, clustering, ordering) and the spreading kernels for callers
//! that drive the stages themselves. Most users should prefer `LineRgbd`.

pub use crate::candidate::{cluster_detections, cluster_detections_by_overlap, sort_detections_desc};
pub use crate::detect::project_matches;
pub use crate::geometry::{compute_aabb, intersection_volume, subtract_mean, CloudStats};
pub use crate::kernel::scalar::SpreadScalar;
pub use crate::kernel::SpreadKernel;
pub use crate::map::spread_quantized_map;
pub use crate::refine::{
    apply_projective_depth_icp_on_detections, refine_detections_along_depth, DEPTH_BINS,
};

#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::spread_par;
#[cfg(feature = "rayon")]
pub use crate::refine::{
    apply_projective_depth_icp_on_detections_par, refine_detections_along_depth_par,
};
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SpreadSimd;
