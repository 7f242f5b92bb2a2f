//! Angle and input helpers shared by the tank and the arena resolver.
//!
//! All angles in Treadwar are in degrees. Heading 0 points along +x and
//! positive rotation turns toward +y.

use glam::DVec2;

/// Wraps an angle in degrees into the half-open range (-180, 180].
///
/// # Example
///
/// ```
/// use treadwar_core::geometry::normalize_angle;
///
/// assert_eq!(normalize_angle(190.0), -170.0);
/// assert_eq!(normalize_angle(-180.0), 180.0);
/// assert_eq!(normalize_angle(180.0), 180.0);
/// ```
#[must_use]
pub fn normalize_angle(degrees: f64) -> f64 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    if wrapped > 180.0 {
        wrapped - 360.0
    } else {
        wrapped
    }
}

/// Clamps a control input into [-1, 1]. NaN becomes 0.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(-1.0, 1.0)
    }
}

/// Unit vector for a heading in degrees.
#[must_use]
pub fn heading_vector(degrees: f64) -> DVec2 {
    let radians = degrees.to_radians();
    DVec2::new(radians.cos(), radians.sin())
}

/// Heading in degrees from `from` toward `to`, normalized.
#[must_use]
pub fn bearing(from: DVec2, to: DVec2) -> f64 {
    let delta = to - from;
    normalize_angle(delta.y.atan2(delta.x).to_degrees())
}

/// Smallest absolute difference between two headings, in [0, 180].
#[must_use]
pub fn angular_distance(a: f64, b: f64) -> f64 {
    normalize_angle(a - b).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    mod normalize_tests {
        use super::*;

        #[test]
        fn in_range_is_unchanged() {
            for a in [-179.5, -90.0, 0.0, 45.0, 179.9, 180.0] {
                assert!((normalize_angle(a) - a).abs() < 1e-12, "{a}");
            }
        }

        #[test]
        fn lower_bound_maps_to_upper() {
            assert!((normalize_angle(-180.0) - 180.0).abs() < 1e-12);
            assert!((normalize_angle(-540.0) - 180.0).abs() < 1e-12);
        }

        #[test]
        fn wraps_large_values() {
            assert!((normalize_angle(370.0) - 10.0).abs() < 1e-9);
            assert!((normalize_angle(-370.0) + 10.0).abs() < 1e-9);
            assert!((normalize_angle(720.0)).abs() < 1e-9);
        }

        #[test]
        fn non_finite_becomes_zero() {
            assert_eq!(normalize_angle(f64::NAN), 0.0);
            assert_eq!(normalize_angle(f64::INFINITY), 0.0);
        }
    }

    #[test]
    fn clamp_unit_bounds() {
        assert_eq!(clamp_unit(3.0), 1.0);
        assert_eq!(clamp_unit(-3.0), -1.0);
        assert_eq!(clamp_unit(0.25), 0.25);
        assert_eq!(clamp_unit(f64::NAN), 0.0);
    }

    #[test]
    fn heading_vector_axes() {
        let east = heading_vector(0.0);
        assert!((east.x - 1.0).abs() < 1e-12 && east.y.abs() < 1e-12);
        let south = heading_vector(90.0);
        assert!(south.x.abs() < 1e-12 && (south.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn bearing_and_distance() {
        let b = bearing(DVec2::ZERO, DVec2::new(0.0, 10.0));
        assert!((b - 90.0).abs() < 1e-9);
        assert!((angular_distance(170.0, -170.0) - 20.0).abs() < 1e-9);
    }
}
