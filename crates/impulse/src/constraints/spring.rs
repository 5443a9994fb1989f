//! Damped spring joint
//!
//! Springs do not add solver rows. Each step they push a Hooke force plus a
//! damping force onto the endpoint bodies, which the integrator then turns
//! into velocity.

use glam::Vec3;

use crate::body::{BodyHandle, BodySet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConstraint {
    pub object_a: BodyHandle,
    /// Anchor in A's local frame
    pub anchor_a: Vec3,
    /// `None` ties the spring to the fixed world point `anchor_b`
    pub object_b: Option<BodyHandle>,
    pub anchor_b: Vec3,
    pub resting_length: f32,
    pub stiffness: f32,
    pub damping: f32,
}

impl SpringConstraint {
    #[must_use]
    pub fn new(
        object_a: BodyHandle,
        anchor_a: Vec3,
        object_b: Option<BodyHandle>,
        anchor_b: Vec3,
        resting_length: f32,
        stiffness: f32,
        damping: f32,
    ) -> Self {
        Self {
            object_a,
            anchor_a,
            object_b,
            anchor_b,
            resting_length,
            stiffness,
            damping,
        }
    }

    /// Force on A's anchor for the current poses and velocities; B receives
    /// the opposite force. Zero when the anchors coincide.
    #[must_use]
    pub fn force(&self, bodies: &BodySet) -> Option<(Vec3, Vec3, Vec3)> {
        let body_a = bodies.get(self.object_a)?;
        let world_a = body_a.local_to_world(self.anchor_a);
        let velocity_a = body_a.velocity_at(world_a - body_a.position);

        let (world_b, velocity_b) = match self.object_b {
            Some(handle) => {
                let body_b = bodies.get(handle)?;
                let world_b = body_b.local_to_world(self.anchor_b);
                (world_b, body_b.velocity_at(world_b - body_b.position))
            }
            None => (self.anchor_b, Vec3::ZERO),
        };

        let delta = world_b - world_a;
        let length = delta.length();
        let Some(direction) = delta.try_normalize() else {
            return Some((Vec3::ZERO, world_a, world_b));
        };

        let stretch = length - self.resting_length;
        let separating = (velocity_b - velocity_a).dot(direction);
        let magnitude = self.stiffness * stretch + self.damping * separating;
        Some((direction * magnitude, world_a, world_b))
    }

    /// Accumulate the spring force on both endpoint bodies
    pub fn apply(&self, bodies: &mut BodySet) {
        let Some((force, world_a, world_b)) = self.force(bodies) else {
            return;
        };
        if let Some(body) = bodies.get_mut(self.object_a) {
            body.apply_force(force, world_a);
        }
        if let Some(body) = self.object_b.and_then(|h| bodies.get_mut(h)) {
            body.apply_force(-force, world_b);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::shapes::Shape;

    #[test]
    fn test_stretched_spring_pulls_together() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::new(Shape::sphere(0.1), 1.0));
        let b = bodies.insert(RigidBody::new(Shape::sphere(0.1), 1.0).with_position(Vec3::new(3.0, 0.0, 0.0)));
        let spring = SpringConstraint::new(a, Vec3::ZERO, Some(b), Vec3::ZERO, 1.0, 10.0, 0.0);
        spring.apply(&mut bodies);

        assert!((bodies.get(a).unwrap().accumulated_force - Vec3::new(20.0, 0.0, 0.0)).length() < 1e-5);
        assert!((bodies.get(b).unwrap().accumulated_force - Vec3::new(-20.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_damping_opposes_separation() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::new(Shape::sphere(0.1), 1.0).with_linear_velocity(Vec3::new(0.0, -2.0, 0.0)));
        let spring = SpringConstraint::new(a, Vec3::ZERO, None, Vec3::new(0.0, 1.0, 0.0), 1.0, 10.0, 0.5);
        let (force, _, _) = spring.force(&bodies).unwrap();
        // At rest length, only damping acts: pulling A back up
        assert!((force - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
    }
}
