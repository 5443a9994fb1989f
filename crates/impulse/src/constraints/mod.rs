//! # Constraints
//!
//! Every constraint the solver sees is a [`Constraint`]: up to two bodies and
//! an ordered list of [`ConstraintRow`]s. Contact and friction constraints are
//! rebuilt every step from pooled objects; joints own their constraint and
//! refresh its rows in place so accumulated impulses survive between steps.
//!
//! Rope and rod joints do not produce rows at all. They emit pseudo-contacts
//! that are solved like any other contact, and springs apply forces directly.

mod contact;
mod revolute;
mod rope;
mod row;
mod spring;

pub use contact::*;
pub use revolute::*;
pub use rope::*;
pub use row::*;
pub use spring::*;

use crate::body::BodyHandle;

/// Index of a joint registered with [`crate::PhysicsSim`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConstraintHandle(pub usize);

/// What built a constraint's rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConstraintKind {
    /// One non-penetration row
    Contact,
    /// Two tangent rows bounded by the normal impulse of the contact
    /// constraint at `normal_index` in the same solver group
    Friction { normal_index: usize, coefficient: f32 },
    Revolute,
    /// Rows filled in by the caller
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    /// `None` stands for a fixed point in the world
    pub object_a: Option<BodyHandle>,
    pub object_b: Option<BodyHandle>,
    pub rows: Vec<ConstraintRow>,
    pub active: bool,
    /// Largest accumulated row impulse the constraint survives
    pub breaking_threshold: Option<f32>,
    pub kind: ConstraintKind,
}

impl Default for Constraint {
    fn default() -> Self {
        Self {
            object_a: None,
            object_b: None,
            rows: Vec::new(),
            active: true,
            breaking_threshold: None,
            kind: ConstraintKind::Generic,
        }
    }
}

impl Constraint {
    #[must_use]
    pub fn new(kind: ConstraintKind, object_a: Option<BodyHandle>, object_b: Option<BodyHandle>) -> Self {
        Self {
            object_a,
            object_b,
            kind,
            ..Self::default()
        }
    }

    /// Prepare a recycled constraint for new use, keeping the row storage
    pub fn reset(&mut self, kind: ConstraintKind, object_a: Option<BodyHandle>, object_b: Option<BodyHandle>) {
        self.object_a = object_a;
        self.object_b = object_b;
        self.rows.clear();
        self.active = true;
        self.breaking_threshold = None;
        self.kind = kind;
    }

    /// True once any row's accumulated impulse passed the breaking threshold
    #[must_use]
    pub fn exceeds_breaking_threshold(&self) -> bool {
        match self.breaking_threshold {
            Some(threshold) => self.rows.iter().any(|row| row.multiplier.abs() > threshold),
            None => false,
        }
    }
}
