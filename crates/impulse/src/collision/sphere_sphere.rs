//! Sphere-sphere collision detection

use super::{BodyRef, Contact};

/// Detect collision between two spheres.
///
/// Spheres that exactly touch produce a contact of zero depth. Coincident
/// centres give no usable normal and produce no contact.
#[must_use]
pub fn detect_sphere_sphere_collision(
    a: BodyRef<'_>,
    radius_a: f32,
    b: BodyRef<'_>,
    radius_b: f32,
) -> Option<Contact> {
    let (_, body_a) = a;
    let (_, body_b) = b;

    let delta = body_b.position - body_a.position;
    let distance = delta.length();
    let radii = radius_a + radius_b;
    if distance > radii {
        return None;
    }

    let Some(normal) = delta.try_normalize() else {
        tracing::trace!("coincident sphere centres, skipping contact");
        return None;
    };

    let point_on_a = body_a.position + normal * radius_a;
    let point_on_b = body_b.position - normal * radius_b;

    Some(Contact::between(a, b, point_on_a, point_on_b, normal, radii - distance))
}
