//! Convex-plane collision detection

use glam::Vec3;

use crate::shapes::SupportMap;

use super::{plane_in_world, BodyRef, Contact};

/// Detect collision between any convex shape and a plane using the shape's
/// deepest support point.
///
/// Only one point is produced per call; the persistent manifold builds up the
/// full contact patch over successive steps. The plane is `object_a`.
#[must_use]
pub fn detect_convex_plane_collision(
    convex: BodyRef<'_>,
    plane: BodyRef<'_>,
    plane_normal: Vec3,
) -> Option<Contact> {
    let (origin, normal) = plane_in_world(plane, plane_normal);
    let (_, body) = convex;

    let deepest = body.shape.support(&body.transform, -normal);
    let distance = (deepest - origin).dot(normal);
    if distance > 0.0 {
        return None;
    }

    // Projection of the deepest point onto the plane
    let point_on_plane = deepest - normal * distance;

    Some(Contact::between(plane, convex, point_on_plane, deepest, normal, -distance))
}
