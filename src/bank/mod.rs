//! Per-template geometry storage.
//!
//! The bank keeps three append-only, index-aligned sequences: template
//! geometry, the derived centroid-relative bounding box, and the object id.
//! The index is the template id and matches the engine's signature index.
//! Geometry is re-centered to zero mean when it is finalized, so the stored
//! clouds and boxes share the same local origin.

use crate::cloud::{PointCloud, PointXyz};
use crate::geometry::{compute_aabb, subtract_mean, BoundingBoxXyz};
use crate::trace::trace_debug;

/// Template geometry, bounding boxes and object ids.
#[derive(Clone, Debug, Default)]
pub struct TemplateBank {
    clouds: Vec<PointCloud<PointXyz>>,
    bounding_boxes: Vec<BoundingBoxXyz>,
    object_ids: Vec<usize>,
}

impl TemplateBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of registered templates (one per object id).
    pub fn num_templates(&self) -> usize {
        self.object_ids.len()
    }

    /// Number of stored template clouds.
    pub fn num_geometries(&self) -> usize {
        self.clouds.len()
    }

    /// Appends a template with its geometry and finalizes its bounding box.
    pub fn add(&mut self, cloud: PointCloud<PointXyz>, object_id: usize) -> usize {
        let template_id = self.clouds.len();
        self.clouds.push(cloud);
        self.object_ids.push(object_id);
        self.finalize_from(template_id);
        template_id
    }

    /// Appends raw geometry; call [`finalize_from`](Self::finalize_from) afterwards.
    pub(crate) fn push_geometry(&mut self, cloud: PointCloud<PointXyz>) {
        self.clouds.push(cloud);
    }

    pub(crate) fn push_object_id(&mut self, object_id: usize) {
        self.object_ids.push(object_id);
    }

    /// Computes bounding boxes for clouds `start..` and re-centers them.
    pub(crate) fn finalize_from(&mut self, start: usize) {
        self.bounding_boxes
            .resize(self.clouds.len(), BoundingBoxXyz::default());
        for (idx, cloud) in self.clouds.iter_mut().enumerate().skip(start) {
            let stats = compute_aabb(cloud.points());
            if stats.finite_points == 0 {
                trace_debug!("template_without_finite_points", template_id = idx);
            }
            subtract_mean(cloud.points_mut(), stats.centroid);
            self.bounding_boxes[idx] = stats.bounding_box;
        }
    }

    /// Truncates or extends all sequences to `n` entries.
    ///
    /// New entries get an empty cloud, a zero box and object id 0.
    pub fn resize(&mut self, n: usize) {
        self.clouds.resize_with(n, PointCloud::default);
        self.bounding_boxes.resize(n, BoundingBoxXyz::default());
        self.object_ids.resize(n, 0);
    }

    /// Re-centered geometry of a template.
    pub fn cloud(&self, template_id: usize) -> Option<&PointCloud<PointXyz>> {
        self.clouds.get(template_id)
    }

    pub fn bounding_box(&self, template_id: usize) -> Option<BoundingBoxXyz> {
        self.bounding_boxes.get(template_id).copied()
    }

    pub fn object_id(&self, template_id: usize) -> Option<usize> {
        self.object_ids.get(template_id).copied()
    }

    /// True when every geometry has a matching object id.
    pub fn is_aligned(&self) -> bool {
        self.clouds.len() == self.object_ids.len()
            && self.clouds.len() == self.bounding_boxes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::TemplateBank;
    use crate::cloud::{PointCloud, PointXyz};

    #[test]
    fn add_recenters_only_the_new_template() {
        let mut bank = TemplateBank::new();
        let first = PointCloud::unorganized(vec![
            PointXyz::new(1.0, 1.0, 1.0),
            PointXyz::new(3.0, 1.0, 1.0),
        ]);
        let second = PointCloud::unorganized(vec![
            PointXyz::new(10.0, 0.0, 4.0),
            PointXyz::NAN,
            PointXyz::new(10.0, 2.0, 6.0),
        ]);
        assert_eq!(bank.add(first, 7), 0);
        assert_eq!(bank.add(second, 9), 1);

        assert!(bank.is_aligned());
        assert_eq!(bank.object_id(1), Some(9));
        assert_eq!(bank.cloud(0).unwrap().points()[0], PointXyz::new(-1.0, 0.0, 0.0));
        let cloud = bank.cloud(1).unwrap();
        assert_eq!(cloud.points()[0], PointXyz::new(0.0, -1.0, -1.0));
        assert!(cloud.points()[1].z.is_nan());

        let bb = bank.bounding_box(1).unwrap();
        assert_eq!((bb.x, bb.y, bb.z), (0.0, -1.0, -1.0));
        assert_eq!((bb.width, bb.height, bb.depth), (0.0, 2.0, 2.0));
    }

    #[test]
    fn resize_keeps_sequences_aligned() {
        let mut bank = TemplateBank::new();
        bank.add(PointCloud::unorganized(vec![PointXyz::new(0.0, 0.0, 1.0)]), 1);
        bank.resize(3);
        assert!(bank.is_aligned());
        assert_eq!(bank.num_templates(), 3);
        assert_eq!(bank.object_id(2), Some(0));
        bank.resize(1);
        assert_eq!(bank.num_geometries(), 1);
        assert!(bank.cloud(1).is_none());
    }
}
