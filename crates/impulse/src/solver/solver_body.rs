//! Per-body scratch state for one solve

use glam::{Mat3, Vec3};

use crate::body::{BodyHandle, RigidBody};

/// Velocity accumulator for a body touched by the solver.
///
/// The solver never writes to a [`RigidBody`] while iterating; all impulses
/// land here and are written back once at the end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverBody {
    pub handle: BodyHandle,
    pub linear_velocity: Vec3,
    pub angular_velocity: Vec3,
    pub inv_mass: f32,
    pub inv_inertia: Mat3,
    pub linear_factor: Vec3,
    pub angular_factor: Vec3,
    pub delta_linear_velocity: Vec3,
    pub delta_angular_velocity: Vec3,
    /// Split-impulse position channel; never consumed
    pub push_velocity: Vec3,
    /// Split-impulse orientation channel; never consumed
    pub turn_velocity: Vec3,
}

impl SolverBody {
    #[must_use]
    pub fn new(handle: BodyHandle, body: &RigidBody) -> Self {
        Self {
            handle,
            linear_velocity: body.linear_velocity,
            angular_velocity: body.angular_velocity,
            inv_mass: body.inv_mass,
            inv_inertia: body.inv_inertia_world,
            linear_factor: body.linear_factor,
            angular_factor: body.angular_factor,
            delta_linear_velocity: Vec3::ZERO,
            delta_angular_velocity: Vec3::ZERO,
            push_velocity: Vec3::ZERO,
            turn_velocity: Vec3::ZERO,
        }
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.inv_mass == 0.0
    }

    /// Velocity including everything applied so far in this solve
    #[must_use]
    pub fn current_linear_velocity(&self) -> Vec3 {
        self.linear_velocity + self.delta_linear_velocity
    }

    #[must_use]
    pub fn current_angular_velocity(&self) -> Vec3 {
        self.angular_velocity + self.delta_angular_velocity
    }

    /// Apply an impulse of `magnitude` along a Jacobian direction.
    ///
    /// `linear_component` is the raw linear Jacobian block; it is scaled here
    /// by inverse mass and the per-axis linear factor. `angular_component` is
    /// the angular block already multiplied by the inverse inertia; it only
    /// gets the per-axis angular factor.
    pub fn internal_apply_impulse(&mut self, linear_component: Vec3, angular_component: Vec3, magnitude: f32) {
        if self.is_static() {
            return;
        }
        self.delta_linear_velocity += linear_component * self.linear_factor * (self.inv_mass * magnitude);
        self.delta_angular_velocity += angular_component * self.angular_factor * magnitude;
    }

    /// Copy the accumulated deltas into the body
    pub fn write_back(&self, body: &mut RigidBody) {
        if self.is_static() {
            return;
        }
        body.linear_velocity += self.delta_linear_velocity;
        body.angular_velocity += self.delta_angular_velocity;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    #[test]
    fn test_impulse_scaled_by_mass_and_factor() {
        let mut body = RigidBody::new(Shape::sphere(1.0), 2.0);
        body.linear_factor = Vec3::new(1.0, 0.0, 1.0);
        let mut solver_body = SolverBody::new(BodyHandle(0), &body);

        solver_body.internal_apply_impulse(Vec3::new(1.0, 1.0, 0.0), Vec3::ZERO, 4.0);
        assert_eq!(solver_body.delta_linear_velocity, Vec3::new(2.0, 0.0, 0.0));

        solver_body.write_back(&mut body);
        assert_eq!(body.linear_velocity, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(solver_body.push_velocity, Vec3::ZERO);
    }
}
