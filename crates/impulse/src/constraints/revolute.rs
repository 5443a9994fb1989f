//! Revolute (hinge) joint
//!
//! Without an axis this is a ball-and-socket: three bilateral rows pin the two
//! anchor points together. With an axis, two angular rows keep the bodies'
//! hinge axes parallel, and an optional limit and motor act on the angle
//! around that axis.

use std::f32::consts::{PI, TAU};

use glam::{Quat, Vec3};

use crate::body::{BodyHandle, BodySet, RigidBody};
use crate::config::SolverConfig;

use super::{Constraint, ConstraintKind, ConstraintRow};

/// Angular range allowed around the hinge axis, in radians
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintLimit {
    pub lower: f32,
    pub upper: f32,
}

/// Drives the hinge toward a relative angular speed with bounded torque
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintMotor {
    pub target_speed: f32,
    pub max_torque: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Hinge {
    axis_a: Vec3,
    axis_b: Vec3,
}

#[derive(Debug, Clone)]
pub struct RevoluteConstraint {
    pub constraint: Constraint,
    /// Anchor in A's local frame, or in world space without body A
    pub anchor_a: Vec3,
    /// Anchor in B's local frame, or in world space without body B
    pub anchor_b: Vec3,
    hinge: Option<Hinge>,
    limit: Option<ConstraintLimit>,
    motor: Option<ConstraintMotor>,
    reference_angle: Option<f32>,
}

/// Endpoint of a joint: the body (when it can move), its lever arm and the
/// world-space anchor
struct Endpoint<'a> {
    body: Option<&'a RigidBody>,
    arm: Vec3,
    anchor: Vec3,
    rotation: Quat,
}

impl<'a> Endpoint<'a> {
    fn new(bodies: &'a BodySet, handle: Option<BodyHandle>, local_anchor: Vec3) -> Self {
        match handle.and_then(|h| bodies.get(h)) {
            Some(body) => {
                let arm = body.rotation * local_anchor;
                Self {
                    body: (!body.is_static()).then_some(body),
                    arm,
                    anchor: body.position + arm,
                    rotation: body.rotation,
                }
            }
            None => Self {
                body: None,
                arm: Vec3::ZERO,
                anchor: local_anchor,
                rotation: Quat::IDENTITY,
            },
        }
    }

    fn linear(&self, v: Vec3) -> Vec3 {
        if self.body.is_some() {
            v
        } else {
            Vec3::ZERO
        }
    }
}

/// Map an angle into `[-pi, pi)`
fn wrap_angle(angle: f32) -> f32 {
    (angle + PI).rem_euclid(TAU) - PI
}

impl RevoluteConstraint {
    /// Pin `anchor_a` on A to `anchor_b` on B. A missing body makes its
    /// anchor a fixed world point.
    #[must_use]
    pub fn new(object_a: Option<BodyHandle>, anchor_a: Vec3, object_b: Option<BodyHandle>, anchor_b: Vec3) -> Self {
        Self {
            constraint: Constraint::new(ConstraintKind::Revolute, object_a, object_b),
            anchor_a,
            anchor_b,
            hinge: None,
            limit: None,
            motor: None,
            reference_angle: None,
        }
    }

    /// Restrict relative rotation to the hinge axis, given in each body's
    /// local frame
    #[must_use]
    pub fn with_axis(mut self, axis_a: Vec3, axis_b: Vec3) -> Self {
        self.hinge = Some(Hinge {
            axis_a: axis_a.normalize_or_zero(),
            axis_b: axis_b.normalize_or_zero(),
        });
        self
    }

    /// Only meaningful together with an axis
    #[must_use]
    pub fn with_limit(mut self, lower: f32, upper: f32) -> Self {
        self.limit = Some(ConstraintLimit { lower, upper });
        self
    }

    /// Only meaningful together with an axis
    #[must_use]
    pub fn with_motor(mut self, target_speed: f32, max_torque: f32) -> Self {
        self.motor = Some(ConstraintMotor {
            target_speed,
            max_torque,
        });
        self
    }

    #[must_use]
    pub fn with_breaking_threshold(mut self, threshold: f32) -> Self {
        self.constraint.breaking_threshold = Some(threshold);
        self
    }

    #[must_use]
    pub fn limit(&self) -> Option<ConstraintLimit> {
        self.limit
    }

    #[must_use]
    pub fn motor(&self) -> Option<ConstraintMotor> {
        self.motor
    }

    pub fn set_motor(&mut self, motor: Option<ConstraintMotor>) {
        self.motor = motor;
    }

    fn row_count(&self) -> usize {
        let angular = if self.hinge.is_some() {
            2 + usize::from(self.limit.is_some()) + usize::from(self.motor.is_some())
        } else {
            0
        };
        3 + angular
    }

    /// Raw hinge angle of B relative to A, before the reference is removed
    fn raw_angle(hinge: &Hinge, a: &Endpoint<'_>, b: &Endpoint<'_>) -> f32 {
        let axis = a.rotation * hinge.axis_a;
        let reference_a = a.rotation * hinge.axis_a.any_orthonormal_vector();
        let reference_b = b.rotation * hinge.axis_b.any_orthonormal_vector();
        axis.dot(reference_a.cross(reference_b)).atan2(reference_a.dot(reference_b))
    }

    /// Current hinge angle, measured from the pose at the first update
    #[must_use]
    pub fn angle(&self, bodies: &BodySet) -> Option<f32> {
        let hinge = self.hinge.as_ref()?;
        let a = Endpoint::new(bodies, self.constraint.object_a, self.anchor_a);
        let b = Endpoint::new(bodies, self.constraint.object_b, self.anchor_b);
        Some(wrap_angle(Self::raw_angle(hinge, &a, &b) - self.reference_angle.unwrap_or(0.0)))
    }

    /// Rebuild every row for the bodies' current poses. Accumulated impulses
    /// from the previous solve are kept for warm starting.
    pub fn update(&mut self, bodies: &BodySet, config: &SolverConfig, dt: f32) {
        let a = Endpoint::new(bodies, self.constraint.object_a, self.anchor_a);
        let b = Endpoint::new(bodies, self.constraint.object_b, self.anchor_b);
        let feedback = if dt > 0.0 { config.erp / dt } else { 0.0 };

        let count = self.row_count();
        if self.constraint.rows.len() != count {
            self.constraint.rows.resize(count, ConstraintRow::default());
        }
        let rows = &mut self.constraint.rows;

        // Point rows: B's anchor follows A's anchor on every world axis
        let error = b.anchor - a.anchor;
        for (row, axis) in rows.iter_mut().zip([Vec3::X, Vec3::Y, Vec3::Z]) {
            row.set_jacobian(
                a.linear(-axis),
                a.linear(-a.arm.cross(axis)),
                b.linear(axis),
                b.linear(b.arm.cross(axis)),
            );
            row.lower_limit = f32::NEG_INFINITY;
            row.upper_limit = f32::INFINITY;
            row.bias = -feedback * error.dot(axis);
        }

        if let Some(hinge) = self.hinge {
            let axis_a = a.rotation * hinge.axis_a;
            let axis_b = b.rotation * hinge.axis_b;
            let (t1, t2) = axis_a.any_orthonormal_pair();

            // Axis rows: B's axis has no component along A's tangents
            for (row, tangent) in rows[3..5].iter_mut().zip([t1, t2]) {
                let w = axis_b.cross(tangent);
                row.set_jacobian(Vec3::ZERO, a.linear(-w), Vec3::ZERO, b.linear(w));
                row.lower_limit = f32::NEG_INFINITY;
                row.upper_limit = f32::INFINITY;
                row.bias = -feedback * tangent.dot(axis_b);
            }

            let raw = Self::raw_angle(&hinge, &a, &b);
            let reference = *self.reference_angle.get_or_insert(raw);
            let angle = wrap_angle(raw - reference);
            let mut next = 5;

            if let Some(limit) = self.limit {
                let row = &mut rows[next];
                row.set_jacobian(Vec3::ZERO, a.linear(-axis_a), Vec3::ZERO, b.linear(axis_a));
                if angle < limit.lower {
                    row.lower_limit = 0.0;
                    row.upper_limit = f32::INFINITY;
                    row.bias = feedback * (limit.lower - angle);
                } else if angle > limit.upper {
                    row.lower_limit = f32::NEG_INFINITY;
                    row.upper_limit = 0.0;
                    row.bias = feedback * (limit.upper - angle);
                } else {
                    row.lower_limit = 0.0;
                    row.upper_limit = 0.0;
                    row.bias = 0.0;
                    row.multiplier_cache = 0.0;
                }
                next += 1;
            }

            if let Some(motor) = self.motor {
                let row = &mut rows[next];
                row.set_jacobian(Vec3::ZERO, a.linear(-axis_a), Vec3::ZERO, b.linear(axis_a));
                let bound = motor.max_torque * dt;
                row.lower_limit = -bound;
                row.upper_limit = bound;
                row.bias = motor.target_speed;
            }
        }

        for row in rows.iter_mut() {
            row.compute_b(a.body, b.body);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    #[test]
    fn test_misaligned_anchor_bias_points_back() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::new(Shape::sphere(0.5), 1.0));
        let b = bodies.insert(RigidBody::new(Shape::sphere(0.5), 1.0).with_position(Vec3::new(2.2, 0.0, 0.0)));
        let mut joint = RevoluteConstraint::new(Some(a), Vec3::X, Some(b), -Vec3::X);
        joint.update(&bodies, &SolverConfig::default(), 0.1);

        // B's anchor sits 0.2 past A's along +X
        let rows = &joint.constraint.rows;
        assert_eq!(rows.len(), 3);
        assert!((rows[0].bias + 0.4).abs() < 1e-5);
        assert!(rows[1].bias.abs() < 1e-6);
    }

    #[test]
    fn test_hinge_rows_and_angle() {
        let mut bodies = BodySet::new();
        let door = bodies.insert(RigidBody::new(Shape::cuboid(Vec3::new(0.5, 1.0, 0.05)), 1.0));
        let mut joint = RevoluteConstraint::new(None, Vec3::new(-0.5, 0.0, 0.0), Some(door), Vec3::new(-0.5, 0.0, 0.0))
            .with_axis(Vec3::Y, Vec3::Y)
            .with_limit(-0.5, 0.5)
            .with_motor(1.0, 10.0);
        joint.update(&bodies, &SolverConfig::default(), 0.1);
        assert_eq!(joint.constraint.rows.len(), 7);
        assert!(joint.angle(&bodies).unwrap().abs() < 1e-6);

        let body = bodies.get_mut(door).unwrap();
        body.rotation = Quat::from_rotation_y(0.8);
        body.update_derived();
        joint.update(&bodies, &SolverConfig::default(), 0.1);
        assert!((joint.angle(&bodies).unwrap() - 0.8).abs() < 1e-5);

        let limit_row = joint.constraint.rows[5];
        assert_eq!(limit_row.upper_limit, 0.0);
        assert!(limit_row.bias < 0.0);
        let motor_row = joint.constraint.rows[6];
        assert!((motor_row.upper_limit - 1.0).abs() < 1e-6);
    }
}
