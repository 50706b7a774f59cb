//! Ordering of final detections.

use crate::detect::Detection;

/// Sorts detections by descending score, then ascending detection id.
pub fn sort_detections_desc(detections: &mut [Detection]) {
    detections.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.detection_id.cmp(&b.detection_id))
    });
}

#[cfg(test)]
mod tests {
    use super::sort_detections_desc;
    use crate::detect::Detection;

    #[test]
    fn sorts_by_score_then_id() {
        let mk = |detection_id, score| Detection {
            detection_id,
            score,
            ..Detection::default()
        };
        let mut dets = vec![mk(2, 0.5), mk(0, 0.9), mk(1, 0.5)];
        sort_detections_desc(&mut dets);
        let order: Vec<usize> = dets.iter().map(|d| d.detection_id).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
