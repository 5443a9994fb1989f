//! # Tuning Parameters
//!
//! Plain parameter blocks with sensible defaults. Every stage of the pipeline
//! reads its knobs from one of these instead of module-level constants so that
//! tests can tighten or relax them per scene.

use glam::Vec3;

/// Collision detection configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionConfig {
    /// Two manifold points closer than this (in body A local space) are the
    /// same point
    pub contact_matching_tolerance: f32,
    /// Separation beyond which a cached manifold point is dropped
    pub contact_breaking_threshold: f32,
    /// Maximum tangential drift of a cached point before it is dropped
    pub contact_drift_threshold: f32,
    /// Minimum cosine between the cached and refreshed contact normal
    pub normal_rotation_cos: f32,
    /// Iteration cap for the GJK intersection query
    pub gjk_max_iterations: usize,
    /// Iteration cap for EPA polytope expansion
    pub epa_max_iterations: usize,
    /// Face cap for the EPA polytope
    pub epa_max_faces: usize,
    /// EPA convergence tolerance
    pub epa_tolerance: f32,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            contact_matching_tolerance: 0.02,
            contact_breaking_threshold: 0.02,
            contact_drift_threshold: 0.04,
            normal_rotation_cos: 0.95,
            gjk_max_iterations: 64,
            epa_max_iterations: 64,
            epa_max_faces: 256,
            epa_tolerance: 1.0e-4,
        }
    }
}

/// Sequential impulse solver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverConfig {
    /// Fixed number of projected Gauss-Seidel passes per step
    pub iterations: usize,
    /// Error reduction parameter (fraction of positional error fixed per step)
    pub erp: f32,
    /// Penetration allowed before positional feedback kicks in
    pub penetration_slop: f32,
    /// Closing speeds below this do not bounce
    pub restitution_velocity_threshold: f32,
    /// Scale applied to cached impulses when warm starting
    pub warm_start_factor: f32,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            iterations: 10,
            erp: 0.2,
            penetration_slop: 0.005,
            restitution_velocity_threshold: 0.5,
            warm_start_factor: 0.85,
        }
    }
}

/// World-level simulation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysParams {
    pub gravity: Vec3,
    pub dt: f32,
}

impl Default for PhysParams {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            dt: 1.0 / 60.0,
        }
    }
}
