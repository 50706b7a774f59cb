//! Transitive clustering by bounding-box overlap.

use crate::candidate::cluster::merge_cluster;
use crate::detect::Detection;
use crate::geometry::intersection_volume;

/// Fraction of `a`'s volume covered by `b`; 0 across objects or for flat boxes.
fn overlap_ratio(a: &Detection, b: &Detection) -> f32 {
    if a.object_id != b.object_id {
        return 0.0;
    }
    let volume = a.bounding_box.volume();
    if volume <= 0.0 {
        return 0.0;
    }
    intersection_volume(&a.bounding_box, &b.bounding_box) / volume
}

/// Groups detections whose overlap ratio reaches `intersection_threshold`.
///
/// Clusters grow transitively in detection order: a detection joins the
/// cluster of any earlier member it overlaps with enough. Each cluster is
/// merged like a grid bucket.
pub fn cluster_detections_by_overlap(
    detections: &[Detection],
    intersection_threshold: f32,
) -> Vec<Detection> {
    let n = detections.len();
    let mut assigned = vec![false; n];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for seed in 0..n {
        if assigned[seed] {
            continue;
        }
        assigned[seed] = true;
        let mut members = vec![seed];
        let mut cursor = 0;
        while cursor < members.len() {
            let current = members[cursor];
            for other in current + 1..n {
                if assigned[other] {
                    continue;
                }
                if overlap_ratio(&detections[current], &detections[other]) < intersection_threshold {
                    continue;
                }
                assigned[other] = true;
                members.push(other);
            }
            cursor += 1;
        }
        clusters.push(members);
    }

    clusters
        .iter()
        .enumerate()
        .map(|(cluster_id, members)| merge_cluster(detections, members, cluster_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::cluster_detections_by_overlap;
    use crate::detect::Detection;
    use crate::geometry::BoundingBoxXyz;

    fn det(object_id: usize, x: f32, score: f32) -> Detection {
        Detection {
            object_id,
            score,
            bounding_box: BoundingBoxXyz {
                x,
                y: 0.0,
                z: 0.0,
                width: 1.0,
                height: 1.0,
                depth: 1.0,
            },
            ..Detection::default()
        }
    }

    #[test]
    fn chains_are_merged_transitively() {
        // 0 overlaps 1 by half, 1 overlaps 2 by half, 0 and 2 are disjoint.
        let dets = [det(1, 0.0, 0.5), det(1, 0.5, 0.9), det(1, 1.0, 0.4), det(1, 5.0, 0.2)];
        let clustered = cluster_detections_by_overlap(&dets, 0.5);
        assert_eq!(clustered.len(), 2);
        assert_eq!(clustered[0].score, 0.9);
        assert_eq!(clustered[1].detection_id, 1);
    }

    #[test]
    fn different_objects_never_merge() {
        let dets = [det(1, 0.0, 0.5), det(2, 0.0, 0.9)];
        assert_eq!(cluster_detections_by_overlap(&dets, 0.1).len(), 2);
    }

    #[test]
    fn full_containment_threshold() {
        let dets = [det(1, 0.0, 0.5), det(1, 0.0, 0.6), det(1, 0.25, 0.7)];
        let clustered = cluster_detections_by_overlap(&dets, 1.0);
        assert_eq!(clustered.len(), 2);
    }
}
