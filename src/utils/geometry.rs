// src/utils/geometry.rs

use glam::Vec3;

use crate::utils::util::safe_normalize;

/// Determinants smaller than this mean the ray runs parallel to the triangle.
const PARALLEL_EPSILON: f32 = 1e-8;

/// A ray with a normalized direction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Creates a ray. A zero direction falls back to +Y so the ray stays usable.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: safe_normalize(direction, Vec3::Y),
        }
    }

    /// Point at distance `t` along the ray.
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }
}

/// Möller–Trumbore ray/triangle test, double sided.
///
/// Returns the distance along the ray, which is the analytic ray/plane distance
/// when the hit lies inside the triangle. Hits behind the origin are rejected.
pub fn ray_triangle_intersection(ray: &Ray, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
    let edge1 = b - a;
    let edge2 = c - a;
    let p = ray.direction.cross(edge2);
    let det = edge1.dot(p);
    if det.abs() < PARALLEL_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let s = ray.origin - a;
    let u = s.dot(p) * inv_det;
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = ray.direction.dot(q) * inv_det;
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = edge2.dot(q) * inv_det;
    if t > 0.0 {
        Some(t)
    } else {
        None
    }
}

/// Distance along the ray to the plane `dot(normal, p) = dist`, if in front.
pub fn ray_plane_intersection(ray: &Ray, normal: Vec3, dist: f32) -> Option<f32> {
    let denom = ray.direction.dot(normal);
    if denom.abs() < PARALLEL_EPSILON {
        return None;
    }
    let t = (dist - ray.origin.dot(normal)) / denom;
    if t > 0.0 {
        Some(t)
    } else {
        None
    }
}

/// Unnormalized counter-clockwise normal of a triangle.
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn unit_triangle() -> (Vec3, Vec3, Vec3) {
        (
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
            Vec3::new(0.0, 10.0, 0.0),
        )
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        let p = ray.at(5.0);
        assert_approx_eq!(p.x, 5.0, 1e-6);
        assert_approx_eq!(p.y, 0.0, 1e-6);
    }

    #[test]
    fn test_hit_from_above_and_below() {
        let (a, b, c) = unit_triangle();
        let down = Ray::new(Vec3::new(1.0, 1.0, 7.0), Vec3::new(0.0, 0.0, -1.0));
        let up = Ray::new(Vec3::new(1.0, 1.0, -3.0), Vec3::new(0.0, 0.0, 1.0));
        assert_approx_eq!(ray_triangle_intersection(&down, a, b, c).unwrap(), 7.0, 1e-5);
        assert_approx_eq!(ray_triangle_intersection(&up, a, b, c).unwrap(), 3.0, 1e-5);
    }

    #[test]
    fn test_miss_outside_triangle() {
        let (a, b, c) = unit_triangle();
        let ray = Ray::new(Vec3::new(9.0, 9.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        assert!(ray_triangle_intersection(&ray, a, b, c).is_none());
    }

    #[test]
    fn test_behind_origin_rejected() {
        let (a, b, c) = unit_triangle();
        let ray = Ray::new(Vec3::new(1.0, 1.0, 5.0), Vec3::new(0.0, 0.0, 1.0));
        assert!(ray_triangle_intersection(&ray, a, b, c).is_none());
    }

    #[test]
    fn test_parallel_ray_misses() {
        let (a, b, c) = unit_triangle();
        let ray = Ray::new(Vec3::new(-5.0, 1.0, 0.0), Vec3::X);
        assert!(ray_triangle_intersection(&ray, a, b, c).is_none());
    }

    #[test]
    fn test_triangle_distance_matches_plane_distance() {
        let (a, b, c) = unit_triangle();
        let ray = Ray::new(Vec3::new(-2.0, -1.0, 12.0), Vec3::new(0.3, 0.2, -1.0));
        let t_tri = ray_triangle_intersection(&ray, a, b, c).unwrap();
        let t_plane = ray_plane_intersection(&ray, Vec3::Z, 0.0).unwrap();
        assert_approx_eq!(t_tri, t_plane, 1e-4);
    }

    #[test]
    fn test_triangle_normal_is_ccw() {
        let (a, b, c) = unit_triangle();
        let n = triangle_normal(a, b, c);
        assert!(n.z > 0.0);
    }
}
