//! Contact and friction constraints

use glam::Vec3;

use crate::body::{BodyHandle, BodySet, RigidBody};
use crate::collision::Contact;
use crate::config::SolverConfig;

use super::{Constraint, ConstraintKind, ConstraintRow};

/// Body behind an optional handle together with its lever arm to a contact
/// point given in that body's local frame. Static or missing bodies get no
/// Jacobian entries.
struct Arm<'a> {
    body: Option<&'a RigidBody>,
    arm: Vec3,
}

impl<'a> Arm<'a> {
    fn new(bodies: &'a BodySet, handle: Option<BodyHandle>, local_point: Vec3) -> Self {
        match handle.and_then(|h| bodies.get(h)) {
            Some(body) => Self {
                body: Some(body),
                arm: body.rotation * local_point,
            },
            None => Self {
                body: None,
                arm: Vec3::ZERO,
            },
        }
    }

    fn moves(&self) -> bool {
        self.body.is_some_and(|b| !b.is_static())
    }

    /// Jacobian blocks for a direction `n` acting on this body with `sign`
    fn blocks(&self, n: Vec3, sign: f32) -> (Vec3, Vec3) {
        if self.moves() {
            (n * sign, self.arm.cross(n) * sign)
        } else {
            (Vec3::ZERO, Vec3::ZERO)
        }
    }

    fn velocity(&self) -> Vec3 {
        self.body.map_or(Vec3::ZERO, |b| b.velocity_at(self.arm))
    }
}

/// Row along `direction` for the relative velocity of B's point with respect
/// to A's point
fn directional_row(a: &Arm<'_>, b: &Arm<'_>, direction: Vec3) -> ConstraintRow {
    let (linear_a, angular_a) = a.blocks(direction, -1.0);
    let (linear_b, angular_b) = b.blocks(direction, 1.0);
    let mut row = ConstraintRow::new(linear_a, angular_a, linear_b, angular_b);
    row.compute_b(a.body.filter(|_| a.moves()), b.body.filter(|_| b.moves()));
    row
}

/// Fill `out` with the single non-penetration row for `contact`.
///
/// The row targets a separating velocity made of a restitution bounce (only
/// above the configured closing speed) plus Baumgarte feedback on the
/// penetration beyond the allowed slop.
pub fn build_contact_constraint(
    out: &mut Constraint,
    contact: &Contact,
    bodies: &BodySet,
    cached_impulse: f32,
    config: &SolverConfig,
    dt: f32,
) {
    out.reset(ConstraintKind::Contact, contact.object_a, contact.object_b);

    let a = Arm::new(bodies, contact.object_a, contact.contact_point_in_a);
    let b = Arm::new(bodies, contact.object_b, contact.contact_point_in_b);
    let normal = contact.contact_normal;

    let separating_speed = (b.velocity() - a.velocity()).dot(normal);
    let bounce = if -separating_speed > config.restitution_velocity_threshold {
        -contact.restitution * separating_speed
    } else {
        0.0
    };
    let positional = if dt > 0.0 {
        config.erp / dt * (contact.penetration_depth - config.penetration_slop).max(0.0)
    } else {
        0.0
    };

    let mut row = directional_row(&a, &b, normal)
        .with_limits(0.0, f32::INFINITY)
        .with_bias(bounce + positional);
    row.eta = row.bias - separating_speed;
    row.multiplier_cache = cached_impulse;
    out.rows.push(row);
}

/// Fill `out` with two tangent rows for `contact`. Their bounds are set by
/// the solver from the normal impulse of the contact constraint found at
/// `normal_index` in the same group.
pub fn build_friction_constraint(
    out: &mut Constraint,
    contact: &Contact,
    bodies: &BodySet,
    cached_impulses: [f32; 2],
    normal_index: usize,
) {
    out.reset(
        ConstraintKind::Friction {
            normal_index,
            coefficient: contact.friction,
        },
        contact.object_a,
        contact.object_b,
    );

    let a = Arm::new(bodies, contact.object_a, contact.contact_point_in_a);
    let b = Arm::new(bodies, contact.object_b, contact.contact_point_in_b);
    let (t1, t2) = friction_tangents(contact.contact_normal);

    for (tangent, cached) in [(t1, cached_impulses[0]), (t2, cached_impulses[1])] {
        let mut row = directional_row(&a, &b, tangent).with_limits(0.0, 0.0);
        row.multiplier_cache = cached;
        out.rows.push(row);
    }
}

/// Tangent basis used for friction; stable for a given normal so cached
/// friction impulses stay meaningful between steps
#[must_use]
pub fn friction_tangents(normal: Vec3) -> (Vec3, Vec3) {
    normal.any_orthonormal_pair()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn head_on(bodies: &mut BodySet, speed: f32) -> Contact {
        let a = bodies.insert(RigidBody::new(Shape::sphere(1.0), 1.0).with_linear_velocity(Vec3::new(speed, 0.0, 0.0)));
        let b = bodies.insert(
            RigidBody::new(Shape::sphere(1.0), 1.0)
                .with_position(Vec3::new(1.9, 0.0, 0.0))
                .with_linear_velocity(Vec3::new(-speed, 0.0, 0.0)),
        );
        Contact {
            object_a: Some(a),
            object_b: Some(b),
            contact_point: Vec3::new(0.95, 0.0, 0.0),
            contact_point_in_a: Vec3::X,
            contact_point_in_b: -Vec3::X,
            contact_normal: Vec3::X,
            penetration_depth: 0.1,
            restitution: 0.5,
            friction: 0.4,
        }
    }

    #[test]
    fn test_contact_row_pushes_apart() {
        let mut bodies = BodySet::new();
        let contact = head_on(&mut bodies, 2.0);
        let mut constraint = Constraint::default();
        let config = SolverConfig::default();
        build_contact_constraint(&mut constraint, &contact, &bodies, 0.25, &config, 0.1);

        let row = constraint.rows[0];
        assert_eq!(row.linear_a(), -Vec3::X);
        assert_eq!(row.linear_b(), Vec3::X);
        assert_eq!((row.lower_limit, row.upper_limit), (0.0, f32::INFINITY));
        assert_eq!(row.multiplier_cache, 0.25);
        // Bounce 0.5 * 4 plus 0.2 / 0.1 * (0.1 - 0.005)
        assert!((row.bias - (2.0 + 0.19)).abs() < 1e-5);
    }

    #[test]
    fn test_static_body_has_no_jacobian() {
        let mut bodies = BodySet::new();
        let ground = bodies.insert(RigidBody::new(Shape::cuboid(Vec3::ONE), 0.0));
        let ball = bodies.insert(RigidBody::new(Shape::sphere(0.5), 1.0).with_position(Vec3::new(0.0, 1.4, 0.0)));
        let contact = Contact {
            object_a: Some(ground),
            object_b: Some(ball),
            contact_point_in_a: Vec3::Y,
            contact_point_in_b: Vec3::NEG_Y * 0.5,
            contact_normal: Vec3::Y,
            friction: 0.5,
            ..Contact::default()
        };

        let mut friction = Constraint::default();
        build_friction_constraint(&mut friction, &contact, &bodies, [0.0; 2], 0);
        assert_eq!(friction.rows.len(), 2);
        for row in &friction.rows {
            assert_eq!(row.linear_a(), Vec3::ZERO);
            assert!(row.linear_b().dot(Vec3::Y).abs() < 1e-6);
            assert!((row.d - 1.0 - row.angular_b().dot(row.b_blocks()[3])).abs() < 1e-6);
        }
    }
}
