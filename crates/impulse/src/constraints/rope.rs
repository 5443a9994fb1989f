//! Rope and rod joints
//!
//! Both are length constraints expressed as pseudo-contacts between the two
//! anchors, so they reuse the contact row and its `[0, inf)` impulse bound. A
//! rope only acts when stretched past its length; a rod also pushes back when
//! compressed.

use glam::Vec3;

use crate::body::{BodyHandle, BodySet};
use crate::collision::Contact;

/// Anchors resolved to world space for the current poses
fn world_anchors(
    bodies: &BodySet,
    object_a: BodyHandle,
    anchor_a: Vec3,
    object_b: Option<BodyHandle>,
    anchor_b: Vec3,
) -> Option<(Vec3, Vec3)> {
    let a = bodies.get(object_a)?.local_to_world(anchor_a);
    let b = match object_b {
        Some(handle) => bodies.get(handle)?.local_to_world(anchor_b),
        None => anchor_b,
    };
    Some((a, b))
}

/// Contact between the two anchors. `normal` points from A toward B in the
/// contact convention, so a positive impulse pushes the anchors apart along
/// it.
fn anchor_contact(
    object_a: BodyHandle,
    anchor_a: Vec3,
    object_b: Option<BodyHandle>,
    anchor_b: Vec3,
    (world_a, world_b): (Vec3, Vec3),
    normal: Vec3,
    depth: f32,
) -> Contact {
    Contact {
        object_a: Some(object_a),
        object_b,
        contact_point: (world_a + world_b) * 0.5,
        contact_point_in_a: anchor_a,
        contact_point_in_b: anchor_b,
        contact_normal: normal,
        penetration_depth: depth,
        restitution: 0.0,
        friction: 0.0,
    }
}

/// Maximum-distance joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RopeConstraint {
    pub object_a: BodyHandle,
    /// Anchor in A's local frame
    pub anchor_a: Vec3,
    /// `None` ties the rope to the fixed world point `anchor_b`
    pub object_b: Option<BodyHandle>,
    pub anchor_b: Vec3,
    pub max_length: f32,
    pub active: bool,
}

impl RopeConstraint {
    #[must_use]
    pub fn new(object_a: BodyHandle, anchor_a: Vec3, object_b: Option<BodyHandle>, anchor_b: Vec3, max_length: f32) -> Self {
        Self {
            object_a,
            anchor_a,
            object_b,
            anchor_b,
            max_length,
            active: true,
        }
    }

    /// Pseudo-contact pulling the anchors back together, if the rope is taut
    #[must_use]
    pub fn update(&self, bodies: &BodySet) -> Option<Contact> {
        if !self.active {
            return None;
        }
        let (world_a, world_b) = world_anchors(bodies, self.object_a, self.anchor_a, self.object_b, self.anchor_b)?;
        let delta = world_a - world_b;
        let length = delta.length();
        if length <= self.max_length {
            return None;
        }

        Some(anchor_contact(
            self.object_a,
            self.anchor_a,
            self.object_b,
            self.anchor_b,
            (world_a, world_b),
            delta / length,
            length - self.max_length,
        ))
    }
}

/// Fixed-distance joint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RodConstraint {
    pub object_a: BodyHandle,
    pub anchor_a: Vec3,
    pub object_b: Option<BodyHandle>,
    pub anchor_b: Vec3,
    pub length: f32,
    pub active: bool,
}

impl RodConstraint {
    #[must_use]
    pub fn new(object_a: BodyHandle, anchor_a: Vec3, object_b: Option<BodyHandle>, anchor_b: Vec3, length: f32) -> Self {
        Self {
            object_a,
            anchor_a,
            object_b,
            anchor_b,
            length,
            active: true,
        }
    }

    /// Pseudo-contact restoring the rod length in whichever direction it is
    /// violated
    #[must_use]
    pub fn update(&self, bodies: &BodySet) -> Option<Contact> {
        if !self.active {
            return None;
        }
        let anchors = world_anchors(bodies, self.object_a, self.anchor_a, self.object_b, self.anchor_b)?;
        let delta = anchors.1 - anchors.0;
        let distance = delta.length();
        if (distance - self.length).abs() <= f32::EPSILON {
            return None;
        }
        let Some(direction) = delta.try_normalize() else {
            tracing::trace!("rod anchors coincide, skipping");
            return None;
        };

        // Too long pulls together, too short pushes apart
        let (normal, depth) = if distance > self.length {
            (-direction, distance - self.length)
        } else {
            (direction, self.length - distance)
        };
        Some(anchor_contact(
            self.object_a,
            self.anchor_a,
            self.object_b,
            self.anchor_b,
            anchors,
            normal,
            depth,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::shapes::Shape;

    #[test]
    fn test_slack_rope_is_inactive() {
        let mut bodies = BodySet::new();
        let weight = bodies.insert(RigidBody::new(Shape::sphere(0.2), 1.0).with_position(Vec3::new(0.0, -1.5, 0.0)));
        let rope = RopeConstraint::new(weight, Vec3::ZERO, None, Vec3::ZERO, 2.0);
        assert!(rope.update(&bodies).is_none());
    }

    #[test]
    fn test_taut_rope_pulls_toward_anchor() {
        let mut bodies = BodySet::new();
        let weight = bodies.insert(RigidBody::new(Shape::sphere(0.2), 1.0).with_position(Vec3::new(0.0, -2.5, 0.0)));
        let rope = RopeConstraint::new(weight, Vec3::ZERO, None, Vec3::ZERO, 2.0);
        let contact = rope.update(&bodies).unwrap();

        assert!((contact.penetration_depth - 0.5).abs() < 1e-6);
        assert!((contact.contact_normal - Vec3::NEG_Y).length() < 1e-6);
        assert_eq!(contact.object_b, None);
        assert_eq!(contact.friction, 0.0);
    }

    #[test]
    fn test_compressed_rod_pushes_apart() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::new(Shape::sphere(0.2), 1.0));
        let b = bodies.insert(RigidBody::new(Shape::sphere(0.2), 1.0).with_position(Vec3::new(0.5, 0.0, 0.0)));
        let rod = RodConstraint::new(a, Vec3::ZERO, Some(b), Vec3::ZERO, 1.0);
        let contact = rod.update(&bodies).unwrap();

        assert!((contact.penetration_depth - 0.5).abs() < 1e-6);
        assert!((contact.contact_normal - Vec3::X).length() < 1e-6);
    }
}
