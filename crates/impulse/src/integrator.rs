//! # Physics Integration
//!
//! Semi-implicit Euler split into two halves so the constraint solver can run
//! between them: forces and gravity first become velocity, then the solved
//! velocities move the bodies.

use glam::{Quat, Vec3};

use crate::body::BodySet;

/// Turn gravity and accumulated forces into velocity, apply damping and clear
/// the force accumulators
pub fn integrate_velocities(bodies: &mut BodySet, gravity: Vec3, dt: f32) {
    for (_, body) in bodies.iter_mut() {
        if body.is_static() {
            body.clear_forces();
            continue;
        }

        let acceleration = gravity + body.accumulated_force * body.inv_mass;
        body.linear_velocity += acceleration * body.linear_factor * dt;
        body.angular_velocity += (body.inv_inertia_world * body.accumulated_torque) * body.angular_factor * dt;

        body.linear_velocity *= (1.0 - body.linear_damping * dt).max(0.0);
        body.angular_velocity *= (1.0 - body.angular_damping * dt).max(0.0);
        body.clear_forces();
    }
}

/// Advance poses with the current velocities and refresh derived state
pub fn integrate_positions(bodies: &mut BodySet, dt: f32) {
    for (_, body) in bodies.iter_mut() {
        if body.is_static() {
            continue;
        }

        body.position += body.linear_velocity * dt;

        let omega = body.angular_velocity;
        if omega.length_squared() > 0.0 {
            let spin = Quat::from_xyzw(omega.x, omega.y, omega.z, 0.0) * body.rotation;
            body.rotation = (body.rotation + spin * (0.5 * dt)).normalize();
        }
        body.update_derived();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::shapes::Shape;

    #[test]
    fn test_gravity_accelerates_dynamic_only() {
        let mut bodies = BodySet::new();
        let ball = bodies.insert(RigidBody::new(Shape::sphere(1.0), 1.0));
        let ground = bodies.insert(RigidBody::new(Shape::plane(Vec3::Y).unwrap(), 0.0));
        bodies.get_mut(ball).unwrap().linear_damping = 0.0;

        integrate_velocities(&mut bodies, Vec3::new(0.0, -10.0, 0.0), 0.1);
        integrate_positions(&mut bodies, 0.1);

        let ball = bodies.get(ball).unwrap();
        assert!((ball.linear_velocity.y + 1.0).abs() < 1e-6);
        assert!((ball.position.y + 0.1).abs() < 1e-6);
        assert_eq!(bodies.get(ground).unwrap().position, Vec3::ZERO);
    }

    #[test]
    fn test_spin_rotates_about_axis() {
        let mut bodies = BodySet::new();
        let handle = bodies.insert(RigidBody::new(Shape::cuboid(Vec3::ONE), 1.0));
        bodies.get_mut(handle).unwrap().angular_velocity = Vec3::new(0.0, 1.0, 0.0);

        for _ in 0..100 {
            integrate_positions(&mut bodies, 0.01);
        }
        let rotated = bodies.get(handle).unwrap().rotation * Vec3::X;
        // One radian about +Y takes +X toward -Z
        assert!((rotated - Vec3::new(1.0_f32.cos(), 0.0, -1.0_f32.sin())).length() < 1e-2);
    }
}
