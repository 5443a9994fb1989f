//! Sphere-box collision detection

use glam::Vec3;

use super::{BodyRef, Contact};

/// Detect collision between a sphere and an oriented box.
///
/// The returned contact has the box as `object_a` and the sphere as
/// `object_b`, so its normal points from the box surface toward the sphere
/// centre.
///
/// A sphere whose centre lies inside the box produces no contact: the
/// closest-point construction has no direction to push along in that case and
/// deep sphere-in-box penetration is not resolved by this routine.
#[must_use]
pub fn detect_sphere_box_collision(
    sphere: BodyRef<'_>,
    radius: f32,
    box_ref: BodyRef<'_>,
    half_extents: Vec3,
) -> Option<Contact> {
    let (_, sphere_body) = sphere;
    let (_, box_body) = box_ref;

    // Work in the box frame where the box is axis aligned
    let local_center = box_body.world_to_local(sphere_body.position);
    if (local_center.abs() - half_extents).max_element() > radius {
        return None;
    }

    let closest = local_center.clamp(-half_extents, half_extents);
    let offset = local_center - closest;
    let distance_squared = offset.length_squared();
    if distance_squared > radius * radius {
        return None;
    }
    if distance_squared == 0.0 {
        tracing::trace!("sphere centre inside box, skipping contact");
        return None;
    }

    let distance = distance_squared.sqrt();
    let normal = box_body.transform.transform_vector3(offset / distance);
    let point_on_box = box_body.local_to_world(closest);
    let point_on_sphere = sphere_body.position - normal * radius;

    Some(Contact::between(
        box_ref,
        sphere,
        point_on_box,
        point_on_sphere,
        normal,
        radius - distance,
    ))
}
