//! Axis-aligned bounding boxes

use glam::{Affine3A, Vec3};

use crate::transform::{abs_rotation, rotation_matrix};

/// Axis-aligned bounding box. Invariant: `min <= max` on every axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Box covering all of space, used for unbounded shapes such as planes
    pub const EVERYTHING: Self = Self {
        min: Vec3::splat(f32::MIN),
        max: Vec3::splat(f32::MAX),
    };

    #[must_use]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    #[must_use]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let half = half_extents.abs();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    #[must_use]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[must_use]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        !(self.min.is_finite() && self.max.is_finite()) || self.min.cmple(Vec3::splat(f32::MIN)).any()
    }

    /// Move a shape-local box into the space described by `transform`.
    ///
    /// The result conservatively encloses the rotated box: world half-extents
    /// are `|R| * local_half_extents`.
    #[must_use]
    pub fn transformed(&self, transform: &Affine3A) -> Self {
        if self.is_unbounded() {
            return Self::EVERYTHING;
        }
        let center = transform.transform_point3(self.center());
        let half = abs_rotation(&rotation_matrix(transform)) * self.half_extents();
        Self::from_center_half_extents(center, half)
    }

    /// Check if two bounding boxes overlap
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    #[must_use]
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grow the box by `amount` on every side
    #[must_use]
    pub fn expanded(&self, amount: f32) -> Self {
        Self::new(self.min - Vec3::splat(amount), self.max + Vec3::splat(amount))
    }
}
