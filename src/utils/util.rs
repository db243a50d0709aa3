//! # Utility Module
//!
//! Small numeric helpers shared by the camera, the picker and the mesh builder.
//!
//! ## Example Function: `safe_normalize`
//!
//! `safe_normalize` returns the unit vector in the direction of `v`, or the
//! supplied fallback when `v` is too short to normalize without dividing by
//! (nearly) zero.

use glam::Vec3;

/// Vectors shorter than this are treated as zero-length.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// Normalizes `v`, returning `fallback` for near-zero vectors.
///
/// # Examples
///
/// ```
/// use bspview::utils::util::safe_normalize;
/// use glam::Vec3;
///
/// let n = safe_normalize(Vec3::new(0.0, 3.0, 4.0), Vec3::X);
/// assert!((n.length() - 1.0).abs() < 1e-6);
/// assert_eq!(safe_normalize(Vec3::ZERO, Vec3::X), Vec3::X);
/// ```
pub fn safe_normalize(v: Vec3, fallback: Vec3) -> Vec3 {
    let len = v.length();
    if !len.is_finite() || len < NORMALIZE_EPSILON {
        fallback
    } else {
        v / len
    }
}

/// Like [`safe_normalize`] but reports degenerate input as `None`.
pub fn try_normalize(v: Vec3) -> Option<Vec3> {
    let len = v.length();
    if !len.is_finite() || len < NORMALIZE_EPSILON {
        None
    } else {
        Some(v / len)
    }
}

/// Clamps a value between a minimum and maximum.
///
/// # Examples
///
/// ```
/// use bspview::utils::util::clamp;
///
/// assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
/// assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
/// assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
/// ```
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Parses a whitespace separated "x y z" triple, as used by entity origins.
pub fn parse_vec3(text: &str) -> Option<Vec3> {
    let mut parts = text.split_whitespace().map(|p| p.parse::<f32>());
    let x = parts.next()?.ok()?;
    let y = parts.next()?.ok()?;
    let z = parts.next()?.ok()?;
    Some(Vec3::new(x, y, z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_normalize_regular_vector() {
        let n = safe_normalize(Vec3::new(3.0, 0.0, 4.0), Vec3::Z);
        assert_approx_eq!(n.x, 0.6, 1e-6);
        assert_approx_eq!(n.z, 0.8, 1e-6);
    }

    #[test]
    fn test_normalize_zero_vector_uses_fallback() {
        assert_eq!(safe_normalize(Vec3::ZERO, Vec3::Y), Vec3::Y);
        assert_eq!(safe_normalize(Vec3::splat(1e-9), Vec3::Y), Vec3::Y);
        assert!(try_normalize(Vec3::ZERO).is_none());
    }

    #[test]
    fn test_normalize_rejects_nan() {
        assert!(try_normalize(Vec3::new(f32::NAN, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_clamp_within_bounds() {
        assert_eq!(clamp(5.0, 0.0, 10.0), 5.0);
    }

    #[test]
    fn test_clamp_below_bounds() {
        assert_eq!(clamp(-5.0, 0.0, 10.0), 0.0);
    }

    #[test]
    fn test_clamp_above_bounds() {
        assert_eq!(clamp(15.0, 0.0, 10.0), 10.0);
    }

    #[test]
    fn test_parse_vec3() {
        assert_eq!(parse_vec3("1 -2 3.5"), Some(Vec3::new(1.0, -2.0, 3.5)));
        assert_eq!(parse_vec3("  4   5 6 "), Some(Vec3::new(4.0, 5.0, 6.0)));
        assert_eq!(parse_vec3("1 2"), None);
        assert_eq!(parse_vec3("a b c"), None);
    }
}
