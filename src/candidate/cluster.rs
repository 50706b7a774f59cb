//! Grid-bucket clustering of 3D detections.

use crate::detect::Detection;
use crate::geometry::{BoundingBoxXyz, RegionXy};
use std::collections::BTreeMap;

/// How overlapping 3D detections are grouped before merging.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClusteringMethod {
    /// Bucket by quantized object id, region and (optionally) template id.
    #[default]
    GridBuckets,
    /// Transitive grouping by bounding-box intersection ratio.
    Overlap,
}

/// Bucket key: object id, quantized region and template id (or 0).
type BucketKey = (usize, i32, i32, i32, i32, usize);

fn bucket_key(detection: &Detection, threshold: i32, separate_templates: bool) -> BucketKey {
    let region = detection.region;
    (
        detection.object_id,
        region.x.div_euclid(threshold),
        region.y.div_euclid(threshold),
        region.width.div_euclid(threshold),
        region.height.div_euclid(threshold),
        if separate_templates {
            detection.template_id
        } else {
            0
        },
    )
}

/// Merges the detections at `members` into one representative.
///
/// Identity, score and extents come from the best-scoring member (the first
/// one on ties). The box center and region corner are score-weighted means;
/// when every score is zero all members weigh the same.
pub(crate) fn merge_cluster(detections: &[Detection], members: &[usize], cluster_id: usize) -> Detection {
    let mut best = members[0];
    for &idx in members {
        if detections[idx].score > detections[best].score {
            best = idx;
        }
    }

    let total: f32 = members.iter().map(|&idx| detections[idx].score).sum();
    let uniform = total <= 0.0;
    let weight_sum = if uniform { members.len() as f32 } else { total };

    let mut center = [0.0f32; 3];
    let mut corner = [0.0f32; 2];
    for &idx in members {
        let d = &detections[idx];
        let w = if uniform { 1.0 } else { d.score };
        let c = d.bounding_box.center();
        center[0] += c.x * w;
        center[1] += c.y * w;
        center[2] += c.z * w;
        corner[0] += d.region.x as f32 * w;
        corner[1] += d.region.y as f32 * w;
    }
    let inv = 1.0 / weight_sum;

    let rep = &detections[best];
    let bb = rep.bounding_box;
    Detection {
        template_id: rep.template_id,
        object_id: rep.object_id,
        detection_id: cluster_id,
        score: rep.score,
        bounding_box: BoundingBoxXyz {
            x: center[0] * inv - bb.width / 2.0,
            y: center[1] * inv - bb.height / 2.0,
            z: center[2] * inv - bb.depth / 2.0,
            ..bb
        },
        region: RegionXy::new(
            (corner[0] * inv) as i32,
            (corner[1] * inv) as i32,
            rep.region.width,
            rep.region.height,
        ),
    }
}

/// Collapses detections that fall into the same grid bucket.
///
/// A `translation_threshold` of 0 returns the input unchanged. Buckets are
/// emitted in key order and the output detection id is the bucket ordinal.
pub fn cluster_detections(
    detections: &[Detection],
    translation_threshold: usize,
    separate_templates: bool,
) -> Vec<Detection> {
    if translation_threshold == 0 {
        return detections.to_vec();
    }
    let threshold = i32::try_from(translation_threshold).unwrap_or(i32::MAX);

    let mut buckets: BTreeMap<BucketKey, Vec<usize>> = BTreeMap::new();
    for (idx, detection) in detections.iter().enumerate() {
        buckets
            .entry(bucket_key(detection, threshold, separate_templates))
            .or_default()
            .push(idx);
    }

    buckets
        .values()
        .enumerate()
        .map(|(cluster_id, members)| merge_cluster(detections, members, cluster_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{bucket_key, cluster_detections, merge_cluster};
    use crate::detect::Detection;
    use crate::geometry::{BoundingBoxXyz, RegionXy};

    fn det(x: i32, y: i32, score: f32, z: f32) -> Detection {
        Detection {
            template_id: 3,
            object_id: 1,
            score,
            bounding_box: BoundingBoxXyz {
                x: 0.0,
                y: 0.0,
                z,
                width: 2.0,
                height: 2.0,
                depth: 2.0,
            },
            region: RegionXy::new(x, y, 40, 40),
            ..Detection::default()
        }
    }

    #[test]
    fn negative_coordinates_use_euclidean_buckets() {
        let a = det(-1, 0, 1.0, 0.0);
        let b = det(0, 0, 1.0, 0.0);
        assert_eq!(bucket_key(&a, 10, false).1, -1);
        assert_eq!(bucket_key(&b, 10, false).1, 0);
    }

    #[test]
    fn merge_weights_by_score() {
        let dets = [det(10, 10, 0.25, 0.0), det(20, 30, 0.75, 4.0)];
        let merged = merge_cluster(&dets, &[0, 1], 5);
        assert_eq!(merged.detection_id, 5);
        assert_eq!(merged.score, 0.75);
        assert_eq!(merged.region, RegionXy::new(17, 25, 40, 40));
        // centers at z=1 and z=5 weighted 1:3 -> 4, minus half depth.
        assert!((merged.bounding_box.z - 3.0).abs() < 1e-6);
    }

    #[test]
    fn all_zero_scores_use_uniform_weights() {
        let dets = [det(0, 0, 0.0, 0.0), det(10, 0, 0.0, 2.0)];
        let merged = merge_cluster(&dets, &[0, 1], 0);
        assert_eq!(merged.region.x, 5);
        assert!((merged.bounding_box.z - 1.0).abs() < 1e-6);
        assert!(merged.bounding_box.z.is_finite());
    }

    #[test]
    fn separate_templates_split_buckets() {
        let mut other = det(1, 1, 0.5, 0.0);
        other.template_id = 4;
        let dets = [det(0, 0, 0.9, 0.0), other];
        assert_eq!(cluster_detections(&dets, 10, false).len(), 1);
        assert_eq!(cluster_detections(&dets, 10, true).len(), 2);
    }

    #[test]
    fn merged_shape_comes_from_best_member() {
        let first = det(0, 0, 0.4, 0.0);
        let best = Detection {
            template_id: 8,
            detection_id: 1,
            score: 0.8,
            bounding_box: BoundingBoxXyz {
                x: 1.0,
                y: 1.0,
                z: 1.0,
                width: 3.0,
                height: 5.0,
                depth: 7.0,
            },
            region: RegionXy::new(2, 3, 44, 36),
            ..first
        };
        let last = Detection {
            score: 0.1,
            bounding_box: BoundingBoxXyz {
                width: 0.5,
                height: 0.5,
                depth: 0.5,
                ..first.bounding_box
            },
            region: RegionXy::new(4, 1, 42, 38),
            ..first
        };
        let merged = cluster_detections(&[first, best, last], 100, false);
        assert_eq!(merged.len(), 1);
        let merged = merged[0];
        assert_eq!(merged.template_id, 8);
        assert_eq!(merged.score, 0.8);
        assert_eq!(merged.bounding_box.width, 3.0);
        assert_eq!(merged.bounding_box.height, 5.0);
        assert_eq!(merged.bounding_box.depth, 7.0);
        assert_eq!((merged.region.width, merged.region.height), (44, 36));
    }

    #[test]
    fn zero_threshold_returns_input_unchanged() {
        let mut dets = vec![det(0, 0, 0.4, 0.0), det(3, 5, 0.9, 2.0), det(-7, 2, 0.0, 1.0)];
        for (idx, d) in dets.iter_mut().enumerate() {
            d.detection_id = idx * 10;
            d.template_id = idx;
        }
        assert_eq!(cluster_detections(&dets, 0, false), dets);
        assert_eq!(cluster_detections(&dets, 0, true), dets);
    }
}
