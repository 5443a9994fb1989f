//! # Rigid Bodies
//!
//! The collision and constraint pipeline reads body state (pose, mass
//! properties, material, filter bits) and only ever writes velocities and
//! accumulated forces. Pose integration is done by [`crate::integrator`].

use glam::{Affine3A, Mat3, Quat, Vec3};

use crate::aabb::Aabb;
use crate::shapes::Shape;
use crate::transform::{from_position_rotation, world_inverse_inertia};

/// Stable index of a body inside a [`BodySet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub usize);

/// A rigid body with a single collision shape
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub position: Vec3,
    pub rotation: Quat,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,

    /// Zero for static bodies
    pub mass: f32,
    pub inv_mass: f32,
    pub inv_inertia_local: Mat3,
    pub inv_inertia_world: Mat3,

    /// Per-axis scale applied to every linear impulse (0 locks the axis)
    pub linear_factor: Vec3,
    /// Per-axis scale applied to every angular impulse (0 locks the axis)
    pub angular_factor: Vec3,
    /// Fraction of linear velocity removed per second by the integrator
    pub linear_damping: f32,
    /// Fraction of angular velocity removed per second by the integrator
    pub angular_damping: f32,

    pub restitution: f32,
    pub friction: f32,
    pub collision_groups: u32,
    pub collision_mask: u32,

    pub shape: Shape,
    pub bounding_radius: f32,

    pub transform: Affine3A,
    pub inverse_transform: Affine3A,
    pub aabb: Aabb,

    pub accumulated_force: Vec3,
    pub accumulated_torque: Vec3,
}

impl RigidBody {
    /// Create a body of the given mass at the origin. A mass of zero (or any
    /// non-finite or negative value) makes the body static.
    #[must_use]
    pub fn new(shape: Shape, mass: f32) -> Self {
        let dynamic = mass.is_finite() && mass > 0.0;
        let inv_inertia_local = if dynamic {
            let inertia = shape.inertia(mass);
            if inertia.determinant().abs() > f32::EPSILON {
                inertia.inverse()
            } else {
                Mat3::ZERO
            }
        } else {
            Mat3::ZERO
        };

        let mut body = Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            mass: if dynamic { mass } else { 0.0 },
            inv_mass: if dynamic { 1.0 / mass } else { 0.0 },
            inv_inertia_local,
            inv_inertia_world: inv_inertia_local,
            linear_factor: Vec3::ONE,
            angular_factor: Vec3::ONE,
            linear_damping: 0.01,
            angular_damping: 0.01,
            restitution: 0.1,
            friction: 0.5,
            collision_groups: 0,
            collision_mask: 0,
            bounding_radius: shape.bounding_radius(),
            shape,
            transform: Affine3A::IDENTITY,
            inverse_transform: Affine3A::IDENTITY,
            aabb: Aabb::EVERYTHING,
            accumulated_force: Vec3::ZERO,
            accumulated_torque: Vec3::ZERO,
        };
        body.update_derived();
        body
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self.update_derived();
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation.normalize();
        self.update_derived();
        self
    }

    #[must_use]
    pub fn with_linear_velocity(mut self, velocity: Vec3) -> Self {
        self.linear_velocity = velocity;
        self
    }

    #[must_use]
    pub fn with_material(mut self, restitution: f32, friction: f32) -> Self {
        self.restitution = restitution;
        self.friction = friction;
        self
    }

    #[must_use]
    pub fn with_collision_filter(mut self, groups: u32, mask: u32) -> Self {
        self.collision_groups = groups;
        self.collision_mask = mask;
        self
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Refresh the cached transform, its inverse, the world inertia and the
    /// world bounding box after the pose changed
    pub fn update_derived(&mut self) {
        self.transform = from_position_rotation(self.position, self.rotation);
        self.inverse_transform = self.transform.inverse();
        self.inv_inertia_world = world_inverse_inertia(self.rotation, &self.inv_inertia_local);
        self.aabb = self.shape.local_aabb().transformed(&self.transform);
    }

    /// Velocity of a point given relative to the centre of mass
    #[must_use]
    pub fn velocity_at(&self, relative_point: Vec3) -> Vec3 {
        self.linear_velocity + self.angular_velocity.cross(relative_point)
    }

    #[must_use]
    pub fn local_to_world(&self, local: Vec3) -> Vec3 {
        self.transform.transform_point3(local)
    }

    #[must_use]
    pub fn world_to_local(&self, world: Vec3) -> Vec3 {
        self.inverse_transform.transform_point3(world)
    }

    /// Accumulate a world-space force applied at a world-space point
    pub fn apply_force(&mut self, force: Vec3, world_point: Vec3) {
        if self.is_static() {
            return;
        }
        self.accumulated_force += force;
        self.accumulated_torque += (world_point - self.position).cross(force);
    }

    pub fn clear_forces(&mut self) {
        self.accumulated_force = Vec3::ZERO;
        self.accumulated_torque = Vec3::ZERO;
    }
}

/// Slot storage for bodies. Handles stay valid until their body is removed;
/// freed slots are reused by later insertions.
#[derive(Debug, Default)]
pub struct BodySet {
    slots: Vec<Option<RigidBody>>,
    free: Vec<usize>,
}

impl BodySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, body: RigidBody) -> BodyHandle {
        if let Some(index) = self.free.pop() {
            self.slots[index] = Some(body);
            BodyHandle(index)
        } else {
            self.slots.push(Some(body));
            BodyHandle(self.slots.len() - 1)
        }
    }

    pub fn remove(&mut self, handle: BodyHandle) -> Option<RigidBody> {
        let body = self.slots.get_mut(handle.0)?.take()?;
        self.free.push(handle.0);
        Some(body)
    }

    #[must_use]
    pub fn get(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.slots.get(handle.0)?.as_ref()
    }

    pub fn get_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.slots.get_mut(handle.0)?.as_mut()
    }

    #[must_use]
    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Number of live bodies
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// One past the highest handle index ever issued
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyHandle, &RigidBody)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|b| (BodyHandle(i), b)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (BodyHandle, &mut RigidBody)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_mut().map(|b| (BodyHandle(i), b)))
    }
}
