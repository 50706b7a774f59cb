//! Organized point clouds for depth and color frames.
//!
//! A `PointCloud<T>` is a row-major `width x height` grid of points, the same
//! layout the sensor produces. Invalid depth samples are stored as NaN
//! coordinates and kept in place so pixel addressing stays intact.

use crate::util::{LinemodError, LinemodResult};

pub mod pcd;

/// 3D point in sensor coordinates; NaN marks an invalid sample.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PointXyz {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl PointXyz {
    /// Invalid sample marker.
    pub const NAN: PointXyz = PointXyz {
        x: f32::NAN,
        y: f32::NAN,
        z: f32::NAN,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Returns true when all three coordinates are finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// 8-bit color sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Owned organized point cloud.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud<T> {
    points: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> PointCloud<T> {
    /// Creates an organized cloud; `points.len()` must equal `width * height`.
    pub fn new(points: Vec<T>, width: usize, height: usize) -> LinemodResult<Self> {
        let needed = width
            .checked_mul(height)
            .ok_or(LinemodError::InvalidDimensions { width, height })?;
        if points.len() != needed {
            return Err(LinemodError::BufferTooSmall {
                needed,
                got: points.len(),
            });
        }
        Ok(Self {
            points,
            width,
            height,
        })
    }

    /// Creates an unorganized cloud (`height == 1`).
    pub fn unorganized(points: Vec<T>) -> Self {
        let width = points.len();
        Self {
            points,
            width,
            height: 1,
        }
    }

    /// Returns the cloud width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the cloud height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns all points in row-major order.
    pub fn points(&self) -> &[T] {
        &self.points
    }

    /// Returns all points mutably.
    pub fn points_mut(&mut self) -> &mut [T] {
        &mut self.points
    }

    /// Returns the point at pixel `(x, y)` if it is within bounds.
    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.points.get(y * self.width + x)
    }

    /// Returns row `y` as a slice.
    pub fn row(&self, y: usize) -> Option<&[T]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.points.get(start..start + self.width)
    }
}

impl<T: Clone> PointCloud<T> {
    /// Creates a cloud with every point set to `value`.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Self {
            points: vec![value; width * height],
            width,
            height,
        }
    }

    /// Sets the point at `(x, y)`; out-of-bounds writes are ignored.
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        if x < self.width && y < self.height {
            self.points[y * self.width + x] = value;
        }
    }
}

#[cfg(feature = "image-io")]
pub mod io;

#[cfg(test)]
mod tests {
    use super::{PointCloud, PointXyz};
    use crate::util::LinemodError;

    #[test]
    fn organized_cloud_checks_length() {
        let err = PointCloud::new(vec![PointXyz::default(); 5], 3, 2)
            .err()
            .unwrap();
        assert_eq!(err, LinemodError::BufferTooSmall { needed: 6, got: 5 });
    }

    #[test]
    fn get_addresses_row_major() {
        let points = (0..6).map(|i| PointXyz::new(i as f32, 0.0, 1.0)).collect();
        let cloud = PointCloud::new(points, 3, 2).unwrap();
        assert_eq!(cloud.get(1, 1).unwrap().x, 4.0);
        assert!(cloud.get(3, 0).is_none());
        assert_eq!(cloud.row(1).unwrap().len(), 3);
    }

    #[test]
    fn nan_point_is_not_finite() {
        assert!(!PointXyz::NAN.is_finite());
        assert!(!PointXyz::new(0.0, f32::INFINITY, 0.0).is_finite());
        assert!(PointXyz::new(0.0, 1.0, 2.0).is_finite());
    }
}
