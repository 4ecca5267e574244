//! Bounding volumes
//!
//! Spheres bound nodes; boxes bound drawables. Both start out invalid
//! (empty) and grow through the `expand_*` methods. An invalid volume is
//! always culled by the traversal.

use crate::foundation::math::{utils, Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a box from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an empty (invalid) box
    pub fn empty() -> Self {
        Self {
            min: Vec3::repeat(f32::INFINITY),
            max: Vec3::repeat(f32::NEG_INFINITY),
        }
    }

    /// Create a box centered at a point with given half extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Smallest box containing every point
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bb = Self::empty();
        for p in points {
            bb.expand_by_point(p);
        }
        bb
    }

    /// True when min <= max on every axis
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the diagonal length
    pub fn radius(&self) -> f32 {
        (self.max - self.min).norm() * 0.5
    }

    /// One of the eight corners
    ///
    /// Bit 0 of `index` selects max x, bit 1 max y, bit 2 max z.
    pub fn corner(&self, index: usize) -> Vec3 {
        Vec3::new(
            if index & 1 != 0 { self.max.x } else { self.min.x },
            if index & 2 != 0 { self.max.y } else { self.min.y },
            if index & 4 != 0 { self.max.z } else { self.min.z },
        )
    }

    /// All eight corners in `corner` index order
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| self.corner(i))
    }

    /// Grow to include a point
    pub fn expand_by_point(&mut self, point: &Vec3) {
        self.min = self.min.inf(point);
        self.max = self.max.sup(point);
    }

    /// Grow to include another box
    pub fn expand_by_box(&mut self, other: &BoundingBox) {
        if other.is_valid() {
            self.expand_by_point(&other.min);
            self.expand_by_point(&other.max);
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Sphere center
    pub center: Vec3,
    /// Sphere radius, negative when invalid
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a sphere from center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Create an invalid sphere
    pub fn invalid() -> Self {
        Self { center: Vec3::zeros(), radius: -1.0 }
    }

    /// Sphere enclosing a box
    pub fn from_box(bb: &BoundingBox) -> Self {
        if bb.is_valid() {
            Self::new(bb.center(), bb.radius())
        } else {
            Self::invalid()
        }
    }

    /// True when the radius is non-negative
    pub fn is_valid(&self) -> bool {
        self.radius >= 0.0
    }

    /// Sphere enclosing a set of spheres
    ///
    /// The center is the middle of the child centers' box, the radius the
    /// farthest child extent from it. Invalid inputs are skipped.
    pub fn enclosing<'a>(spheres: impl IntoIterator<Item = &'a BoundingSphere> + Clone) -> Self {
        let mut centers = BoundingBox::empty();
        for sphere in spheres.clone().into_iter().filter(|s| s.is_valid()) {
            centers.expand_by_point(&sphere.center);
        }
        if !centers.is_valid() {
            return Self::invalid();
        }

        let center = centers.center();
        let radius = spheres
            .into_iter()
            .filter(|s| s.is_valid())
            .map(|s| (s.center - center).norm() + s.radius)
            .fold(0.0_f32, f32::max);
        Self::new(center, radius)
    }

    /// Sphere transformed by a matrix
    ///
    /// The radius grows by the largest axis scale so the result stays
    /// conservative under non-uniform scaling.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        if !self.is_valid() {
            return *self;
        }
        Self::new(
            utils::transform_point(matrix, &self.center),
            self.radius * utils::max_scale(matrix),
        )
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::invalid()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_empty_box_is_invalid() {
        assert!(!BoundingBox::empty().is_valid());
        assert!(!BoundingSphere::from_box(&BoundingBox::empty()).is_valid());
    }

    #[test]
    fn test_box_corners_cover_extremes() {
        let bb = BoundingBox::new(Vec3::new(-1.0, -2.0, -3.0), Vec3::new(1.0, 2.0, 3.0));
        assert_relative_eq!(bb.corner(0), bb.min);
        assert_relative_eq!(bb.corner(7), bb.max);
        assert_relative_eq!(bb.corner(5), Vec3::new(1.0, -2.0, 3.0));
        assert_eq!(BoundingBox::from_points(&bb.corners()), bb);
    }

    #[test]
    fn test_box_from_points() {
        let points = [Vec3::new(0.0, 1.0, 0.0), Vec3::new(2.0, -1.0, 4.0)];
        let bb = BoundingBox::from_points(&points);
        assert_relative_eq!(bb.min, Vec3::new(0.0, -1.0, 0.0));
        assert_relative_eq!(bb.max, Vec3::new(2.0, 1.0, 4.0));
    }

    #[test]
    fn test_enclosing_sphere_contains_children() {
        let a = BoundingSphere::new(Vec3::new(-5.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(Vec3::new(5.0, 0.0, 0.0), 2.0);
        let s = BoundingSphere::enclosing(&[a, b, BoundingSphere::invalid()]);
        assert_relative_eq!(s.center, Vec3::zeros());
        assert_relative_eq!(s.radius, 7.0);
    }

    #[test]
    fn test_sphere_transform_scales_radius() {
        let s = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 1.0);
        let m = Mat4::new_translation(&Vec3::new(0.0, 10.0, 0.0)) * Mat4::new_scaling(3.0);
        let t = s.transformed(&m);
        assert_relative_eq!(t.center, Vec3::new(3.0, 10.0, 0.0));
        assert_relative_eq!(t.radius, 3.0);
    }
}
