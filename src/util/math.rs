//! Math type re-exports and mesh-specific math utilities.
//!
//! This module re-exports types from `glam` and provides additional
//! helpers used by the conversion engine (bounding boxes, planarity and
//! convexity tests).

// Re-export glam types
pub use glam::{
    // Single precision vectors
    Vec2, Vec3, Vec4,
    // Double precision vectors
    DVec2, DVec3, DVec4,
    // Matrices and affine transforms
    Mat3, Mat4, Affine3A,
};

use bytemuck::{Pod, Zeroable};
use std::fmt;

/// 3D bounding box with single precision.
#[derive(Clone, Copy, PartialEq, Pod, Zeroable)]
#[repr(C)]
pub struct BBox3f {
    pub min: Vec3,
    pub max: Vec3,
}

impl BBox3f {
    /// Empty bounding box (inverted, will expand on first point).
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create a new bounding box from min and max points.
    #[inline]
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Check if this box is empty (has no volume).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this box to include a point.
    #[inline]
    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Compute the bounding box of a point set.
    pub fn from_points(points: &[Vec3]) -> Self {
        let mut bbox = Self::EMPTY;
        for &p in points {
            bbox.expand_by_point(p);
        }
        bbox
    }

    /// Get the center of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the size (extents) of the box.
    #[inline]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }
}

impl Default for BBox3f {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl fmt::Debug for BBox3f {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BBox3f({:?} - {:?})", self.min, self.max)
    }
}

/// Clamp a float into `[lo, hi]`.
#[inline]
pub fn clamp(value: f32, lo: f32, hi: f32) -> f32 {
    value.max(lo).min(hi)
}

/// Check whether a float is within epsilon of zero.
#[inline]
pub fn is_almost_zero(value: f32) -> bool {
    value.abs() < f32::EPSILON
}

/// Polygon normal via Newell's method. Robust for non-planar and concave
/// polygons, zero for degenerate ones.
pub fn newell_normal(points: &[Vec3]) -> Vec3 {
    let mut n = Vec3::ZERO;
    for (i, &current) in points.iter().enumerate() {
        let next = points[(i + 1) % points.len()];
        n.x += (current.y - next.y) * (current.z + next.z);
        n.y += (current.z - next.z) * (current.x + next.x);
        n.z += (current.x - next.x) * (current.y + next.y);
    }
    n.normalize_or_zero()
}

/// Maximum distance of any point to the polygon's best-fit plane
/// (Newell normal through the centroid).
pub fn plane_deviation(points: &[Vec3]) -> f32 {
    if points.len() < 4 {
        return 0.0;
    }
    let normal = newell_normal(points);
    if normal == Vec3::ZERO {
        return 0.0;
    }
    let centroid = points.iter().copied().sum::<Vec3>() / points.len() as f32;
    points
        .iter()
        .map(|&p| (p - centroid).dot(normal).abs())
        .fold(0.0, f32::max)
}

/// Check whether a polygon is convex with respect to its Newell normal.
/// Degenerate polygons report as convex (nothing to split).
pub fn is_convex(points: &[Vec3]) -> bool {
    if points.len() <= 3 {
        return true;
    }
    let normal = newell_normal(points);
    if normal == Vec3::ZERO {
        return true;
    }
    let n = points.len();
    for i in 0..n {
        let prev = points[(i + n - 1) % n];
        let current = points[i];
        let next = points[(i + 1) % n];
        let cross = (current - prev).cross(next - current);
        if cross.dot(normal) < -f32::EPSILON * cross.length().max(1.0) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bbox3f() {
        let mut b = BBox3f::EMPTY;
        assert!(b.is_empty());

        b.expand_by_point(Vec3::ZERO);
        assert!(!b.is_empty());
        b.expand_by_point(Vec3::ONE);
        assert_eq!(b.min, Vec3::ZERO);
        assert_eq!(b.max, Vec3::ONE);
        assert_eq!(b.center(), Vec3::splat(0.5));
        assert_eq!(b.size(), Vec3::ONE);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-1.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(12.0, 0.0, 10.0), 10.0);
        assert_eq!(clamp(0.5, 0.0, 1.0), 0.5);
    }

    #[test]
    fn test_newell_normal_quad() {
        let quad = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let n = newell_normal(&quad);
        assert!((n - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_plane_deviation() {
        let flat = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        assert!(plane_deviation(&flat) < 1e-6);

        let bent = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.5),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        assert!(plane_deviation(&bent) > 0.1);
    }

    #[test]
    fn test_is_convex() {
        let square = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        assert!(is_convex(&square));

        // Arrow head: one reflex vertex.
        let arrow = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(1.0, 0.25, 0.0),
            Vec3::new(1.0, 2.0, 0.0),
        ];
        assert!(!is_convex(&arrow));
    }
}
