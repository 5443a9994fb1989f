//! Rigid transform utilities
//!
//! Bodies carry their world transform (position + rotation) and its inverse so
//! that contact points can be moved between world space and each body's local
//! frame without recomputing the inverse on every query.

use glam::{Affine3A, Mat3, Quat, Vec3};

/// Build a rigid transform from a position and a unit quaternion
#[must_use]
pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Affine3A {
    Affine3A::from_rotation_translation(rotation, position)
}

/// Rotation part of a rigid transform as a 3x3 matrix
#[must_use]
pub fn rotation_matrix(transform: &Affine3A) -> Mat3 {
    Mat3::from(transform.matrix3)
}

/// Component-wise absolute value of a rotation matrix.
///
/// Multiplying local half-extents by this matrix yields the half-extents of
/// the world-space box that conservatively encloses the rotated box.
#[must_use]
pub fn abs_rotation(rotation: &Mat3) -> Mat3 {
    Mat3::from_cols(rotation.x_axis.abs(), rotation.y_axis.abs(), rotation.z_axis.abs())
}

/// World inverse inertia: `R * I_local^-1 * R^T`
#[must_use]
pub fn world_inverse_inertia(rotation: Quat, inv_inertia_local: &Mat3) -> Mat3 {
    let r = Mat3::from_quat(rotation);
    r * *inv_inertia_local * r.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_transform() {
        let t = from_position_rotation(Vec3::ZERO, Quat::IDENTITY);
        assert_eq!(t.transform_point3(Vec3::new(1.0, 2.0, 3.0)), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_translation_round_trips_through_inverse() {
        let t = from_position_rotation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_rotation_y(std::f32::consts::FRAC_PI_2),
        );
        let inv = t.inverse();
        let p = Vec3::new(0.5, -1.0, 4.0);
        let back = inv.transform_point3(t.transform_point3(p));
        assert!((back - p).length() < 1e-5);
    }

    #[test]
    fn test_abs_rotation_of_quarter_turn_swaps_axes() {
        let r = Mat3::from_quat(Quat::from_rotation_z(std::f32::consts::FRAC_PI_2));
        let extents = abs_rotation(&r) * Vec3::new(2.0, 1.0, 0.5);
        assert!((extents - Vec3::new(1.0, 2.0, 0.5)).length() < 1e-5);
    }
}
