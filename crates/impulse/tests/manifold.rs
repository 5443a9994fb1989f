//! Persistent contact manifolds

use impulse::{BodyHandle, BodyPair, CollisionConfig, Contact, ContactManifold, RigidBody, Shape, Vec3};

fn contact_at(x: f32, z: f32) -> Contact {
    let point = Vec3::new(x, 0.0, z);
    Contact {
        object_a: Some(BodyHandle(0)),
        object_b: Some(BodyHandle(1)),
        contact_point: point,
        contact_point_in_a: point,
        contact_point_in_b: point,
        contact_normal: Vec3::Y,
        penetration_depth: 0.01,
        restitution: 0.0,
        friction: 0.5,
    }
}

#[test]
fn test_full_manifold_keeps_widest_quad() {
    let body = RigidBody::new(Shape::cuboid(Vec3::ONE), 1.0);
    let config = CollisionConfig::default();
    let mut manifold = ContactManifold::new(BodyPair::new(BodyHandle(0), BodyHandle(1)));

    let corners = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
    let sequence = [corners[0], corners[1], (0.5, 0.5), corners[2], (0.4, 0.6), corners[3]];
    for (x, z) in sequence {
        manifold.add_contact(contact_at(x, z), &body, &body, &config);
        assert!(manifold.len() <= 4);
    }

    assert_eq!(manifold.len(), 4);
    for (x, z) in corners {
        let expected = Vec3::new(x, 0.0, z);
        assert!(
            manifold
                .points()
                .iter()
                .any(|p| (p.contact.contact_point_in_a - expected).length() < 1e-6),
            "corner {expected:?} missing"
        );
    }
}

#[test]
fn test_interior_point_rejected_when_full() {
    let body = RigidBody::new(Shape::cuboid(Vec3::ONE), 1.0);
    let config = CollisionConfig::default();
    let mut manifold = ContactManifold::new(BodyPair::new(BodyHandle(0), BodyHandle(1)));

    for (x, z) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
        assert!(manifold.add_contact(contact_at(x, z), &body, &body, &config));
    }
    assert!(!manifold.add_contact(contact_at(0.5, 0.5), &body, &body, &config));
    assert_eq!(manifold.len(), 4);
}
