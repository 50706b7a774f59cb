//! Bounding boxes, pixel regions and cloud statistics.
//!
//! Template bounding boxes are stored relative to the template centroid: the
//! minimum corner is `min - mean`, not the absolute minimum. A detection is
//! then placed in the scene by adding a scene-space centroid to the corner.

use crate::cloud::PointXyz;

/// Axis-aligned 3D box given by its minimum corner and extents.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBoxXyz {
    /// X-coordinate of the minimum corner.
    pub x: f32,
    /// Y-coordinate of the minimum corner.
    pub y: f32,
    /// Z-coordinate of the minimum corner.
    pub z: f32,
    pub width: f32,
    pub height: f32,
    pub depth: f32,
}

impl BoundingBoxXyz {
    /// Returns the box center.
    pub fn center(&self) -> PointXyz {
        PointXyz::new(
            self.x + self.width / 2.0,
            self.y + self.height / 2.0,
            self.z + self.depth / 2.0,
        )
    }

    pub fn volume(&self) -> f32 {
        self.width * self.height * self.depth
    }

    /// Returns the box moved by `offset`; extents are unchanged.
    pub fn translated(&self, offset: PointXyz) -> Self {
        Self {
            x: self.x + offset.x,
            y: self.y + offset.y,
            z: self.z + offset.z,
            ..*self
        }
    }
}

/// Integer pixel rectangle in image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RegionXy {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Half-open pixel span `[x0, x1) x [y0, y1)` inside a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelSpan {
    pub x0: usize,
    pub y0: usize,
    pub x1: usize,
    pub y1: usize,
}

impl PixelSpan {
    pub fn area(&self) -> usize {
        (self.x1 - self.x0) * (self.y1 - self.y0)
    }
}

impl RegionXy {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Scales the extents by `scale`, truncating toward zero.
    pub fn scaled_extent(&self, scale: f32) -> (i32, i32) {
        (
            (self.width as f32 * scale) as i32,
            (self.height as f32 * scale) as i32,
        )
    }

    /// Clamps the region to a `frame_width x frame_height` frame.
    ///
    /// Returns `None` when nothing of the region lies inside the frame.
    pub fn clamp_to(&self, frame_width: usize, frame_height: usize) -> Option<PixelSpan> {
        let x0 = self.x.max(0) as i64;
        let y0 = self.y.max(0) as i64;
        let x1 = (self.x as i64 + self.width as i64).min(frame_width as i64);
        let y1 = (self.y as i64 + self.height as i64).min(frame_height as i64);
        if x0 >= x1 || y0 >= y1 {
            return None;
        }
        Some(PixelSpan {
            x0: x0 as usize,
            y0: y0 as usize,
            x1: x1 as usize,
            y1: y1 as usize,
        })
    }
}

/// Bounding box and centroid of the finite points of a cloud.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CloudStats {
    /// Box relative to `centroid`.
    pub bounding_box: BoundingBoxXyz,
    pub centroid: PointXyz,
    /// Number of finite points that contributed.
    pub finite_points: usize,
}

/// Computes the centroid-relative AABB of all finite points in one pass.
///
/// Points with any non-finite coordinate are ignored. With no finite points
/// the result is all zeros (`finite_points == 0`), never NaN.
pub fn compute_aabb(points: &[PointXyz]) -> CloudStats {
    let mut min = [f32::MAX; 3];
    let mut max = [-f32::MAX; 3];
    let mut sum = [0.0f64; 3];
    let mut count = 0usize;

    for p in points.iter().filter(|p| p.is_finite()) {
        for (axis, v) in [p.x, p.y, p.z].into_iter().enumerate() {
            min[axis] = min[axis].min(v);
            max[axis] = max[axis].max(v);
            sum[axis] += v as f64;
        }
        count += 1;
    }

    if count == 0 {
        return CloudStats::default();
    }

    let inv = 1.0 / count as f64;
    let centroid = PointXyz::new(
        (sum[0] * inv) as f32,
        (sum[1] * inv) as f32,
        (sum[2] * inv) as f32,
    );
    let bounding_box = BoundingBoxXyz {
        x: min[0] - centroid.x,
        y: min[1] - centroid.y,
        z: min[2] - centroid.z,
        width: max[0] - min[0],
        height: max[1] - min[1],
        depth: max[2] - min[2],
    };

    CloudStats {
        bounding_box,
        centroid,
        finite_points: count,
    }
}

/// Subtracts `center` from every finite point; non-finite points are kept as is.
pub fn subtract_mean(points: &mut [PointXyz], center: PointXyz) {
    for p in points.iter_mut().filter(|p| p.is_finite()) {
        p.x -= center.x;
        p.y -= center.y;
        p.z -= center.z;
    }
}

/// Volume of the intersection of two boxes; 0 when they do not overlap.
pub fn intersection_volume(a: &BoundingBoxXyz, b: &BoundingBoxXyz) -> f32 {
    let overlap = |a_min: f32, a_ext: f32, b_min: f32, b_ext: f32| {
        (a_min + a_ext).min(b_min + b_ext) - a_min.max(b_min)
    };
    let w = overlap(a.x, a.width, b.x, b.width);
    let h = overlap(a.y, a.height, b.y, b.height);
    let d = overlap(a.z, a.depth, b.z, b.depth);
    if w <= 0.0 || h <= 0.0 || d <= 0.0 {
        return 0.0;
    }
    w * h * d
}
