#![deny(clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::many_single_char_names,
    clippy::float_cmp
)]
//! # Impulse
//!
//! Rigid-body collision detection and constraint solving.
//!
//! The crate covers the pipeline that runs once per simulation step, from
//! pair culling to the velocity corrections handed back to the integrator:
//!
//! -   **Broadphase:** [`BasicBroadphase`] (all pairs) and [`GridBroadphase`]
//!     (uniform hash grid) both emit exactly the pairs whose bounding spheres
//!     overlap.
//! -   **Filtering:** [`can_bodies_collide`] applies group/mask rules before
//!     any exact test runs.
//! -   **Narrow phase:** [`NearPhase`] routes each pair to a closed-form test
//!     (sphere-sphere, sphere-box, anything-plane) or to GJK + EPA, and keeps
//!     a persistent [`ContactManifold`] of up to four points per pair.
//! -   **Constraints:** contacts, friction and revolute joints become
//!     [`ConstraintRow`]s; ropes and rods emit pseudo-contacts; springs apply
//!     forces.
//! -   **Solver:** [`IterativeSolver`] runs projected Gauss-Seidel with warm
//!     starting over every active row.
//!
//! [`PhysicsSim`] wires the stages together with a body store, a simple
//! integrator and event delivery.
//!
//! ## Usage
//!
//! ```rust
//! use impulse::{PhysicsSim, RigidBody, Shape, Vec3};
//!
//! let mut sim = PhysicsSim::new();
//! sim.add_body(RigidBody::new(Shape::plane(Vec3::Y)?, 0.0));
//! let ball = sim.add_body(RigidBody::new(Shape::sphere(0.5), 1.0).with_position(Vec3::new(0.0, 2.0, 0.0)));
//!
//! for _ in 0..120 {
//!     sim.step()?;
//! }
//! assert!(sim.body(ball).map_or(false, |b| b.position.y > 0.0));
//! # Ok::<(), impulse::PhysicsError>(())
//! ```

pub mod aabb;
pub mod body;
pub mod collision;
pub mod config;
pub mod constraints;
pub mod error;
pub mod events;
pub mod filter;
pub mod integrator;
pub mod pool;
pub mod shapes;
pub mod simulation;
pub mod solver;
pub mod transform;

pub use glam::{Mat3, Quat, Vec3};

pub use aabb::Aabb;
pub use body::{BodyHandle, BodySet, RigidBody};
pub use collision::{
    BasicBroadphase, BodyPair, Broadphase, Contact, ContactManifold, GridBroadphase, ManifoldList, ManifoldPoint,
    NearPhase,
};
pub use config::{CollisionConfig, PhysParams, SolverConfig};
pub use constraints::{
    Constraint, ConstraintHandle, ConstraintKind, ConstraintLimit, ConstraintMotor, ConstraintRow,
    RevoluteConstraint, RodConstraint, RopeConstraint, SpringConstraint,
};
pub use error::PhysicsError;
pub use events::{EventDispatcher, PhysicsEvent};
pub use filter::{can_bodies_collide, MASK_EXCLUDE};
pub use pool::{ObjectPool, Pool, Pooled};
pub use shapes::{Shape, ShapeKind, SupportMap};
pub use simulation::{Joint, PhysicsSim, CONSTRAINT_POOL};
pub use solver::{IterativeSolver, SolverBody};
