//! Depth placement by histogram search.
//!
//! The finite depths under a detection's region are binned into
//! [`DEPTH_BINS`] bins spanning `[min, max]`. With `r = floor(depth / step)`
//! for the box depth, a window covering the `r + 1` bins `start..=start + r`
//! slides over the prefix sums and the box is moved to the start of the first
//! window holding the most samples. Only `z` has to be finite.

use crate::cloud::{PointCloud, PointXyz};
use crate::detect::Detection;
use crate::geometry::PixelSpan;

/// Number of histogram bins.
pub const DEPTH_BINS: usize = 1000;

/// Outcome of a histogram refinement that left the detection untouched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HistogramSkip {
    /// Region does not overlap the frame or covers no finite depth.
    NoDepth,
    /// All finite depths are equal.
    FlatDepth,
}

impl HistogramSkip {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            HistogramSkip::NoDepth => "no finite depth",
            HistogramSkip::FlatDepth => "flat depth",
        }
    }
}

fn depth_range(cloud: &PointCloud<PointXyz>, span: PixelSpan) -> Option<(f32, f32)> {
    let mut min = f32::MAX;
    let mut max = -f32::MAX;
    for y in span.y0..span.y1 {
        let row = cloud.row(y)?;
        for p in row[span.x0..span.x1].iter().filter(|p| p.z.is_finite()) {
            min = min.min(p.z);
            max = max.max(p.z);
        }
    }
    (min <= max).then_some((min, max))
}

/// Moves the box of `detection` to the densest depth window.
pub(crate) fn refine_along_depth(
    detection: &mut Detection,
    cloud: &PointCloud<PointXyz>,
) -> Result<(), HistogramSkip> {
    let span = detection
        .region
        .clamp_to(cloud.width(), cloud.height())
        .ok_or(HistogramSkip::NoDepth)?;
    let (min, max) = depth_range(cloud, span).ok_or(HistogramSkip::NoDepth)?;
    if min == max {
        return Err(HistogramSkip::FlatDepth);
    }

    let step = (max - min) / (DEPTH_BINS - 1) as f32;
    let mut bins = vec![0usize; DEPTH_BINS];
    for y in span.y0..span.y1 {
        let Some(row) = cloud.row(y) else {
            break;
        };
        for p in row[span.x0..span.x1].iter().filter(|p| p.z.is_finite()) {
            let bin = (((p.z - min) / step) as usize).min(DEPTH_BINS - 1);
            bins[bin] += 1;
        }
    }

    let mut prefix = bins;
    for idx in 1..DEPTH_BINS {
        prefix[idx] += prefix[idx - 1];
    }

    // Window spans bins start..=start + range.
    let range = (detection.bounding_box.depth / step) as usize;
    let mut best_start = 0usize;
    let mut best_count = 0usize;
    for start in 0..DEPTH_BINS.saturating_sub(range) {
        let before = if start == 0 { 0 } else { prefix[start - 1] };
        let count = prefix[start + range] - before;
        if count > best_count {
            best_count = count;
            best_start = start;
        }
    }

    detection.bounding_box.z = min + best_start as f32 * step;
    Ok(())
}
