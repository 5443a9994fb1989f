//! # Collision Detection
//!
//! Broad phase pair culling, persistent contact manifolds and the narrow-phase
//! tests that fill them. Closed-form routines exist for sphere-sphere,
//! sphere-box and anything-plane; every other convex pair goes through
//! GJK + EPA on the shapes' support mappings.
//!
//! Contact normals point from `object_a` toward `object_b`.

mod broad_phase;
mod convex_plane;
mod epa;
mod gjk;
mod manifold;
mod near_phase;
mod spatial_grid;
mod sphere_box;
mod sphere_plane;
mod sphere_sphere;

pub use broad_phase::*;
pub use convex_plane::*;
pub use epa::*;
pub use gjk::*;
pub use manifold::*;
pub use near_phase::*;
pub use spatial_grid::*;
pub use sphere_box::*;
pub use sphere_plane::*;
pub use sphere_sphere::*;

use glam::Vec3;

use crate::body::{BodyHandle, RigidBody};

/// A body together with its handle, as handed to narrow-phase routines
pub type BodyRef<'a> = (BodyHandle, &'a RigidBody);

/// Unordered pair of bodies, stored with the smaller handle first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyPair {
    pub a: BodyHandle,
    pub b: BodyHandle,
}

impl BodyPair {
    #[must_use]
    pub fn new(a: BodyHandle, b: BodyHandle) -> Self {
        if a <= b {
            Self { a, b }
        } else {
            Self { a: b, b: a }
        }
    }

    #[must_use]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.a == handle || self.b == handle
    }
}

/// Contact information between two bodies
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Contact {
    /// `None` stands for a fixed point in the world
    pub object_a: Option<BodyHandle>,
    pub object_b: Option<BodyHandle>,
    /// Contact point in world space
    pub contact_point: Vec3,
    /// Deepest point of A, in A's local frame
    pub contact_point_in_a: Vec3,
    /// Deepest point of B, in B's local frame
    pub contact_point_in_b: Vec3,
    /// Unit normal from A toward B
    pub contact_normal: Vec3,
    /// Positive when overlapping
    pub penetration_depth: f32,
    pub restitution: f32,
    pub friction: f32,
}

impl Contact {
    /// Build a contact from the two world-space surface points.
    ///
    /// `point_on_a` lies on A's surface inside B and `point_on_b` on B's
    /// surface inside A; the reported contact point is their midpoint.
    #[must_use]
    pub fn between(
        (handle_a, body_a): BodyRef<'_>,
        (handle_b, body_b): BodyRef<'_>,
        point_on_a: Vec3,
        point_on_b: Vec3,
        normal: Vec3,
        depth: f32,
    ) -> Self {
        Self {
            object_a: Some(handle_a),
            object_b: Some(handle_b),
            contact_point: (point_on_a + point_on_b) * 0.5,
            contact_point_in_a: body_a.world_to_local(point_on_a),
            contact_point_in_b: body_b.world_to_local(point_on_b),
            contact_normal: normal,
            penetration_depth: depth,
            restitution: combine_restitution(body_a.restitution, body_b.restitution),
            friction: combine_friction(body_a.friction, body_b.friction),
        }
    }

    /// Same contact seen from the other body
    #[must_use]
    pub fn flipped(&self) -> Self {
        Self {
            object_a: self.object_b,
            object_b: self.object_a,
            contact_point_in_a: self.contact_point_in_b,
            contact_point_in_b: self.contact_point_in_a,
            contact_normal: -self.contact_normal,
            ..*self
        }
    }
}

/// Combine friction coefficients using the arithmetic mean
#[must_use]
pub fn combine_friction(f1: f32, f2: f32) -> f32 {
    (f1 + f2) * 0.5
}

/// Combine restitution coefficients using the arithmetic mean
#[must_use]
pub fn combine_restitution(r1: f32, r2: f32) -> f32 {
    (r1 + r2) * 0.5
}
