//! Depth placement by a one-dimensional RANSAC fit.
//!
//! Template pixel `(c, r)` is paired with scene pixel
//! `(region.x + c, region.y + r)`. Each hypothesis is the depth delta of one
//! random pair; the hypothesis with the most pairs within the inlier
//! threshold wins and the final delta is the mean over its inliers.

use crate::cloud::{PointCloud, PointXyz};
use crate::geometry::RegionXy;
use rand::rngs::StdRng;
use rand::Rng;

/// Configuration for the projective depth fit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IcpConfig {
    /// Number of hypotheses drawn per detection.
    pub iterations: usize,
    /// Maximum `|t + delta - s|` for a pair to count as an inlier.
    pub inlier_threshold: f32,
    /// Base seed; detection `i` draws from `seed + i`.
    pub seed: u64,
}

impl Default for IcpConfig {
    fn default() -> Self {
        Self {
            iterations: 100,
            inlier_threshold: 0.01,
            seed: 0,
        }
    }
}

/// A template depth paired with the scene depth under it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct DepthPair {
    pub template: f32,
    pub scene: f32,
}

/// Collects pairs where both the template and the scene sample are finite.
pub(crate) fn collect_depth_pairs(
    template: &PointCloud<PointXyz>,
    region: RegionXy,
    scene: &PointCloud<PointXyz>,
) -> Vec<DepthPair> {
    let mut pairs = Vec::new();
    for r in 0..template.height() {
        let sy = region.y as i64 + r as i64;
        if sy < 0 || sy >= scene.height() as i64 {
            continue;
        }
        let (Some(template_row), Some(scene_row)) = (template.row(r), scene.row(sy as usize))
        else {
            continue;
        };
        for (c, t) in template_row.iter().enumerate() {
            let sx = region.x as i64 + c as i64;
            if sx < 0 || sx >= scene.width() as i64 {
                continue;
            }
            let s = &scene_row[sx as usize];
            if t.is_finite() && s.is_finite() {
                pairs.push(DepthPair {
                    template: t.z,
                    scene: s.z,
                });
            }
        }
    }
    pairs
}

fn count_inliers(pairs: &[DepthPair], delta: f32, threshold: f32) -> usize {
    pairs
        .iter()
        .filter(|p| (p.template + delta - p.scene).abs() <= threshold)
        .count()
}

/// Estimates the depth offset that aligns template to scene.
///
/// Returns the offset and its inlier count, or `None` without pairs or
/// inliers.
pub(crate) fn estimate_depth_offset(
    pairs: &[DepthPair],
    cfg: &IcpConfig,
    rng: &mut StdRng,
) -> Option<(f32, usize)> {
    if pairs.is_empty() {
        return None;
    }

    let mut best_delta = 0.0f32;
    let mut best_inliers = 0usize;
    for _ in 0..cfg.iterations {
        let pair = pairs[rng.random_range(0..pairs.len())];
        let delta = pair.scene - pair.template;
        let inliers = count_inliers(pairs, delta, cfg.inlier_threshold);
        if inliers > best_inliers {
            best_inliers = inliers;
            best_delta = delta;
        }
    }
    if best_inliers == 0 {
        return None;
    }

    let mut sum = 0.0f64;
    for p in pairs
        .iter()
        .filter(|p| (p.template + best_delta - p.scene).abs() <= cfg.inlier_threshold)
    {
        sum += (p.scene - p.template) as f64;
    }
    Some(((sum / best_inliers as f64) as f32, best_inliers))
}

#[cfg(test)]
mod tests {
    use super::{collect_depth_pairs, estimate_depth_offset, DepthPair, IcpConfig};
    use crate::cloud::{PointCloud, PointXyz};
    use crate::geometry::RegionXy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pairs_skip_out_of_frame_and_invalid_samples() {
        let template = PointCloud::new(
            vec![
                PointXyz::new(0.0, 0.0, 0.1),
                PointXyz::NAN,
                PointXyz::new(0.0, 0.0, 0.3),
                PointXyz::new(0.0, 0.0, 0.4),
            ],
            2,
            2,
        )
        .unwrap();
        let scene = PointCloud::filled(2, 2, PointXyz::new(0.0, 0.0, 1.0));

        let pairs = collect_depth_pairs(&template, RegionXy::new(1, 0, 2, 2), &scene);
        assert_eq!(
            pairs,
            vec![
                DepthPair { template: 0.1, scene: 1.0 },
                DepthPair { template: 0.3, scene: 1.0 },
            ]
        );
    }

    #[test]
    fn recovers_offset_despite_outliers() {
        let mut pairs: Vec<DepthPair> = (0..40)
            .map(|i| {
                let t = i as f32 * 0.001;
                DepthPair { template: t, scene: t + 0.75 }
            })
            .collect();
        pairs.extend((0..10).map(|i| DepthPair {
            template: 0.0,
            scene: 3.0 + i as f32,
        }));

        let mut rng = StdRng::seed_from_u64(7);
        let (delta, inliers) = estimate_depth_offset(&pairs, &IcpConfig::default(), &mut rng).unwrap();
        assert!((delta - 0.75).abs() < 1e-4);
        assert_eq!(inliers, 40);
    }

    #[test]
    fn empty_pairs_have_no_offset() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(estimate_depth_offset(&[], &IcpConfig::default(), &mut rng).is_none());
    }
}
