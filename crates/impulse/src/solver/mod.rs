//! # Sequential Impulse Solver
//!
//! Projected Gauss-Seidel over constraint rows. Each pass visits every row of
//! every active constraint, computes the velocity error along its Jacobian,
//! and applies the impulse that removes it, clamping the row's *accumulated*
//! impulse to its bounds. Impulses go into per-body [`SolverBody`]
//! accumulators and reach the bodies only once, after the last pass.
//!
//! Constraints are handed over as groups (`&mut [&mut [Constraint]]`) so the
//! caller can mix per-step contact constraints with long-lived joints without
//! collecting them into a new buffer. Friction constraints look up their
//! normal constraint by index inside their own group.

mod solver_body;

pub use solver_body::*;

use glam::Vec3;

use crate::body::{BodyHandle, BodySet};
use crate::config::SolverConfig;
use crate::constraints::{Constraint, ConstraintKind, ConstraintRow};

#[derive(Debug, Default)]
pub struct IterativeSolver {
    config: SolverConfig,
    bodies: Vec<SolverBody>,
    body_map: Vec<Option<usize>>,
}

impl IterativeSolver {
    #[must_use]
    pub fn new(config: SolverConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SolverConfig {
        &mut self.config
    }

    /// Solver bodies of the current (or last) solve
    #[must_use]
    pub fn solver_bodies(&self) -> &[SolverBody] {
        &self.bodies
    }

    /// Run a full solve: set up, warm start, iterate, write back
    pub fn solve(&mut self, bodies: &mut BodySet, groups: &mut [&mut [Constraint]]) {
        self.begin(bodies, groups);
        for _ in 0..self.config.iterations {
            self.iterate(groups);
        }
        self.finish(bodies, groups);
    }

    /// Create solver bodies for everything the active constraints touch and
    /// apply warm-start impulses
    pub fn begin(&mut self, bodies: &BodySet, groups: &mut [&mut [Constraint]]) {
        self.bodies.clear();
        self.body_map.clear();
        self.body_map.resize(bodies.capacity(), None);

        for group in groups.iter() {
            for constraint in group.iter().filter(|c| c.active) {
                for handle in [constraint.object_a, constraint.object_b].into_iter().flatten() {
                    self.register(bodies, handle);
                }
            }
        }

        let warm_start = self.config.warm_start_factor;
        for group in groups.iter_mut() {
            for index in 0..group.len() {
                if !group[index].active {
                    continue;
                }
                update_friction_bounds(group, index);
                let a = self.slot(group[index].object_a);
                let b = self.slot(group[index].object_b);
                for row in &mut group[index].rows {
                    row.multiplier = 0.0;
                    if row.d <= f32::EPSILON {
                        continue;
                    }
                    row.multiplier = row.clamp(row.multiplier_cache * warm_start);
                    apply_row_impulse(&mut self.bodies, row, a, b, row.multiplier);
                }
            }
        }
    }

    /// One Gauss-Seidel pass over every row
    pub fn iterate(&mut self, groups: &mut [&mut [Constraint]]) {
        for group in groups.iter_mut() {
            for index in 0..group.len() {
                if !group[index].active {
                    continue;
                }
                update_friction_bounds(group, index);
                let a = self.slot(group[index].object_a);
                let b = self.slot(group[index].object_b);
                for row in &mut group[index].rows {
                    solve_row(&mut self.bodies, row, a, b);
                }
            }
        }
    }

    /// Cache accumulated impulses for the next warm start and write velocity
    /// deltas back into the bodies
    pub fn finish(&mut self, bodies: &mut BodySet, groups: &mut [&mut [Constraint]]) {
        for group in groups.iter_mut() {
            for constraint in group.iter_mut().filter(|c| c.active) {
                for row in &mut constraint.rows {
                    row.multiplier_cache = row.multiplier;
                }
            }
        }

        for solver_body in &self.bodies {
            if let Some(body) = bodies.get_mut(solver_body.handle) {
                solver_body.write_back(body);
            }
        }
    }

    fn register(&mut self, bodies: &BodySet, handle: BodyHandle) {
        let Some(slot) = self.body_map.get_mut(handle.0) else {
            return;
        };
        if slot.is_some() {
            return;
        }
        if let Some(body) = bodies.get(handle) {
            *slot = Some(self.bodies.len());
            self.bodies.push(SolverBody::new(handle, body));
        }
    }

    fn slot(&self, handle: Option<BodyHandle>) -> Option<usize> {
        handle.and_then(|h| self.body_map.get(h.0).copied().flatten())
    }
}

/// Friction rows may carry at most `coefficient` times the impulse the
/// linked contact row currently pushes with
fn update_friction_bounds(group: &mut [Constraint], index: usize) {
    let ConstraintKind::Friction {
        normal_index,
        coefficient,
    } = group[index].kind
    else {
        return;
    };
    let normal_impulse = group
        .get(normal_index)
        .and_then(|c| c.rows.first())
        .map_or(0.0, |row| row.multiplier);
    let bound = coefficient * normal_impulse.max(0.0);
    for row in &mut group[index].rows {
        row.lower_limit = -bound;
        row.upper_limit = bound;
    }
}

fn body_velocity(bodies: &[SolverBody], slot: Option<usize>) -> (Vec3, Vec3) {
    slot.map_or((Vec3::ZERO, Vec3::ZERO), |i| {
        (bodies[i].current_linear_velocity(), bodies[i].current_angular_velocity())
    })
}

fn apply_row_impulse(bodies: &mut [SolverBody], row: &ConstraintRow, a: Option<usize>, b: Option<usize>, magnitude: f32) {
    if magnitude == 0.0 {
        return;
    }
    if let Some(i) = a {
        let angular = bodies[i].inv_inertia * row.angular_a();
        bodies[i].internal_apply_impulse(row.linear_a(), angular, magnitude);
    }
    if let Some(i) = b {
        let angular = bodies[i].inv_inertia * row.angular_b();
        bodies[i].internal_apply_impulse(row.linear_b(), angular, magnitude);
    }
}

/// Apply the clamped impulse that drives the row's velocity toward its bias
fn solve_row(bodies: &mut [SolverBody], row: &mut ConstraintRow, a: Option<usize>, b: Option<usize>) {
    if row.d <= f32::EPSILON {
        return;
    }
    let (linear_a, angular_a) = body_velocity(bodies, a);
    let (linear_b, angular_b) = body_velocity(bodies, b);
    let jv = row.velocity(linear_a, angular_a, linear_b, angular_b);

    let delta = (row.bias - jv) / row.d;
    let previous = row.multiplier;
    row.multiplier = row.clamp(previous + delta);
    apply_row_impulse(bodies, row, a, b, row.multiplier - previous);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::RigidBody;
    use crate::shapes::Shape;

    #[test]
    fn test_bilateral_row_reaches_target_velocity() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::new(Shape::sphere(1.0), 1.0));
        let b = bodies.insert(RigidBody::new(Shape::sphere(1.0), 3.0));

        let mut row = ConstraintRow::new(-Vec3::X, Vec3::ZERO, Vec3::X, Vec3::ZERO).with_bias(2.0);
        row.compute_b(bodies.get(a), bodies.get(b));
        let mut constraint = Constraint::new(ConstraintKind::Generic, Some(a), Some(b));
        constraint.rows.push(row);

        let mut solver = IterativeSolver::new(SolverConfig::default());
        let mut group = [constraint];
        solver.solve(&mut bodies, &mut [&mut group[..]]);

        let relative = bodies.get(b).unwrap().linear_velocity.x - bodies.get(a).unwrap().linear_velocity.x;
        assert!((relative - 2.0).abs() < 1e-4);
        // Momentum is conserved
        let momentum = bodies.get(a).unwrap().linear_velocity.x + 3.0 * bodies.get(b).unwrap().linear_velocity.x;
        assert!(momentum.abs() < 1e-4);
        assert!((group[0].rows[0].multiplier_cache - group[0].rows[0].multiplier).abs() < f32::EPSILON);
    }

    #[test]
    fn test_inactive_constraint_ignored() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::new(Shape::sphere(1.0), 1.0));
        let mut row = ConstraintRow::new(Vec3::X, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO).with_bias(5.0);
        row.compute_b(bodies.get(a), None);
        let mut constraint = Constraint::new(ConstraintKind::Generic, Some(a), None);
        constraint.rows.push(row);
        constraint.active = false;

        let mut solver = IterativeSolver::new(SolverConfig::default());
        let mut group = [constraint];
        solver.solve(&mut bodies, &mut [&mut group[..]]);
        assert_eq!(bodies.get(a).unwrap().linear_velocity, Vec3::ZERO);
        assert!(solver.solver_bodies().is_empty());
    }
}
