//! Math primitives: 3-vectors and unit quaternions.
//!
//! `glam::Vec3` and `glam::Quat` already provide multiplication, conjugation,
//! axis-angle conversion and vector rotation, so this module only adds the
//! thin wrappers the rest of the crate names explicitly (for round-trip
//! tests and drift recovery) plus the scalar interpolation helpers shared by
//! the partition and propagator modules.

use crate::error::MsmrdError;
use glam::{Quat, Vec3};

/// Builds a unit quaternion from an axis and an angle (radians). Named
/// explicitly since `axis_angle_to_quat -> quat_to_axis_angle` round trips
/// are a tested invariant.
#[inline]
pub fn axis_angle_to_quat(axis: Vec3, angle: f32) -> Quat {
    if angle.abs() < 1.0e-12 || axis.length_squared() < 1.0e-24 {
        return Quat::IDENTITY;
    }
    Quat::from_axis_angle(axis.normalize(), angle)
}

/// Inverse of [`axis_angle_to_quat`]. For the identity quaternion the axis
/// is arbitrary and the angle is zero.
#[inline]
pub fn quat_to_axis_angle(q: Quat) -> (Vec3, f32) {
    q.normalize().to_axis_angle()
}

/// Renormalizes `q` when it has drifted only slightly from unit norm
/// (`|‖q‖ - 1| <= eps`), returning `InvalidGeometry` otherwise: numerical
/// drift mid-integration is recoverable up to a point, past which it
/// signals a real bug rather than float noise.
pub fn renormalize_if_drifted(q: Quat, eps: f64) -> Result<Quat, MsmrdError> {
    let norm = (q.length_squared() as f64).sqrt();
    let drift = (norm - 1.0).abs();
    if drift <= eps {
        Ok(q.normalize())
    } else {
        Err(MsmrdError::InvalidGeometry {
            reason: format!("quaternion norm {norm} drifted {drift} past tolerance {eps}"),
        })
    }
}

/// Linear interpolation, `a*(1-t) + b*t`.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Smooth Hermite interpolation between two edges, clamped to `[0,1]`.
/// Degenerate ranges (`edge0 == edge1`) fall back to a hard step so callers
/// never divide by zero.
#[inline]
pub fn smoothstep(edge0: f64, edge1: f64, x: f64) -> f64 {
    if (edge1 - edge0).abs() < 1e-12 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}
