//! Depth refinement of projected detections.
//!
//! Projection places a template box at the mean depth under its region,
//! which is biased by background samples. Two strategies move the box along
//! z only: a histogram search for the densest depth window (default) and a
//! projective depth fit against the template geometry. Each detection is
//! refined independently; the `_par` variants spread detections over the
//! rayon pool and give the same results as the sequential ones.

use crate::bank::TemplateBank;
use crate::cloud::{PointCloud, PointXyz};
use crate::detect::Detection;
use crate::trace::{trace_span, trace_warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

pub(crate) mod histogram;
pub(crate) mod icp;

pub use histogram::DEPTH_BINS;
pub use icp::IcpConfig;

/// Strategy used to place detections along depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DepthRefinement {
    /// Densest-window histogram search.
    #[default]
    Histogram,
    /// RANSAC depth fit of template geometry to the scene.
    ProjectiveIcp,
    /// Keep the projected placement.
    Disabled,
}

fn refine_one_histogram(index: usize, detection: &mut Detection, cloud: &PointCloud<PointXyz>) {
    if let Err(skip) = histogram::refine_along_depth(detection, cloud) {
        trace_warn!(
            "depth_refinement_skipped",
            detection_id = index,
            reason = skip.as_str()
        );
    }
}

fn refine_one_icp(
    index: usize,
    detection: &mut Detection,
    bank: &TemplateBank,
    cloud: &PointCloud<PointXyz>,
    cfg: &IcpConfig,
) {
    let (Some(template), Some(template_box)) = (
        bank.cloud(detection.template_id),
        bank.bounding_box(detection.template_id),
    ) else {
        trace_warn!(
            "depth_fit_unknown_template",
            detection_id = index,
            template_id = detection.template_id
        );
        return;
    };

    let pairs = icp::collect_depth_pairs(template, detection.region, cloud);
    let mut rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(index as u64));
    match icp::estimate_depth_offset(&pairs, cfg, &mut rng) {
        Some((delta, _inliers)) => {
            detection.bounding_box.z = template_box.z + delta;
        }
        None => {
            trace_warn!(
                "depth_fit_skipped",
                detection_id = index,
                pairs = pairs.len()
            );
        }
    }
}

/// Moves every detection to the densest depth window under its region.
///
/// Detections whose region has no finite depth, or only one depth value,
/// are left unchanged.
pub fn refine_detections_along_depth(detections: &mut [Detection], cloud: &PointCloud<PointXyz>) {
    let _span = trace_span!("refine_along_depth", detections = detections.len()).entered();
    for (index, detection) in detections.iter_mut().enumerate() {
        refine_one_histogram(index, detection, cloud);
    }
}

/// Parallel form of [`refine_detections_along_depth`].
#[cfg(feature = "rayon")]
pub fn refine_detections_along_depth_par(
    detections: &mut [Detection],
    cloud: &PointCloud<PointXyz>,
) {
    let _span = trace_span!("refine_along_depth_par", detections = detections.len()).entered();
    detections
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, detection)| refine_one_histogram(index, detection, cloud));
}

/// Aligns every detection's depth to the scene using its template geometry.
///
/// The box z becomes the template box z plus the fitted offset. Detection
/// `i` draws hypotheses from `StdRng::seed_from_u64(cfg.seed + i)`.
pub fn apply_projective_depth_icp_on_detections(
    detections: &mut [Detection],
    bank: &TemplateBank,
    cloud: &PointCloud<PointXyz>,
    cfg: &IcpConfig,
) {
    let _span = trace_span!("projective_depth_fit", detections = detections.len()).entered();
    for (index, detection) in detections.iter_mut().enumerate() {
        refine_one_icp(index, detection, bank, cloud, cfg);
    }
}

/// Parallel form of [`apply_projective_depth_icp_on_detections`].
#[cfg(feature = "rayon")]
pub fn apply_projective_depth_icp_on_detections_par(
    detections: &mut [Detection],
    bank: &TemplateBank,
    cloud: &PointCloud<PointXyz>,
    cfg: &IcpConfig,
) {
    let _span = trace_span!("projective_depth_fit_par", detections = detections.len()).entered();
    detections
        .par_iter_mut()
        .enumerate()
        .for_each(|(index, detection)| refine_one_icp(index, detection, bank, cloud, cfg));
}
