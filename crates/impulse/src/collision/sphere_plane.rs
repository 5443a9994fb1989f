//! Sphere-plane collision detection

use glam::Vec3;

use super::{BodyRef, Contact};

/// World-space origin and unit normal of a plane body
#[must_use]
pub fn plane_in_world(plane: BodyRef<'_>, local_normal: Vec3) -> (Vec3, Vec3) {
    let (_, body) = plane;
    (body.position, body.rotation * local_normal)
}

/// Detect collision between a sphere and a plane.
///
/// The plane is reported as `object_a`, so the normal is the plane normal.
#[must_use]
pub fn detect_sphere_plane_collision(
    sphere: BodyRef<'_>,
    radius: f32,
    plane: BodyRef<'_>,
    plane_normal: Vec3,
) -> Option<Contact> {
    let (origin, normal) = plane_in_world(plane, plane_normal);
    let center = sphere.1.position;

    // Distance from sphere center to plane
    let distance = (center - origin).dot(normal);
    if distance > radius {
        return None;
    }

    let point_on_plane = center - normal * distance;
    let point_on_sphere = center - normal * radius;

    Some(Contact::between(
        plane,
        sphere,
        point_on_plane,
        point_on_sphere,
        normal,
        radius - distance,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyHandle, RigidBody};
    use crate::shapes::Shape;

    #[test]
    fn test_resting_sphere_touches_ground() {
        let ground = RigidBody::new(Shape::plane(Vec3::Y).unwrap(), 0.0);
        let ball = RigidBody::new(Shape::sphere(0.5), 1.0).with_position(Vec3::new(2.0, 0.4, 0.0));

        let contact =
            detect_sphere_plane_collision((BodyHandle(1), &ball), 0.5, (BodyHandle(0), &ground), Vec3::Y).unwrap();
        assert_eq!(contact.object_a, Some(BodyHandle(0)));
        assert_eq!(contact.contact_normal, Vec3::Y);
        assert!((contact.penetration_depth - 0.1).abs() < 1e-6);
        assert!((contact.contact_point_in_b - Vec3::new(0.0, -0.5, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_sphere_above_plane() {
        let ground = RigidBody::new(Shape::plane(Vec3::Y).unwrap(), 0.0).with_position(Vec3::new(0.0, -1.0, 0.0));
        let ball = RigidBody::new(Shape::sphere(0.5), 1.0).with_position(Vec3::new(0.0, 0.0, 0.0));
        assert!(detect_sphere_plane_collision((BodyHandle(1), &ball), 0.5, (BodyHandle(0), &ground), Vec3::Y).is_none());
    }
}
