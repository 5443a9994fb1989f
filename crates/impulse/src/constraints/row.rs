//! Jacobian rows consumed by the sequential impulse solver

use glam::Vec3;

use crate::body::RigidBody;

/// One scalar constraint `J v = bias` with accumulated-impulse bounds.
///
/// The 12 Jacobian entries are laid out as A linear, A angular, B linear,
/// B angular. `b` holds the same layout pre-multiplied by inverse mass or
/// inverse inertia (and the per-axis factors), and `d = J . b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintRow {
    pub jacobian: [f32; 12],
    pub b: [f32; 12],
    pub d: f32,
    pub lower_limit: f32,
    pub upper_limit: f32,
    pub bias: f32,
    /// Impulse accumulated during the current solve
    pub multiplier: f32,
    /// Impulse from the previous solve, used for warm starting
    pub multiplier_cache: f32,
    /// Velocity error left to remove when the row was set up
    pub eta: f32,
}

impl Default for ConstraintRow {
    fn default() -> Self {
        Self {
            jacobian: [0.0; 12],
            b: [0.0; 12],
            d: 0.0,
            lower_limit: f32::NEG_INFINITY,
            upper_limit: f32::INFINITY,
            bias: 0.0,
            multiplier: 0.0,
            multiplier_cache: 0.0,
            eta: 0.0,
        }
    }
}

fn segment(values: &[f32; 12], offset: usize) -> Vec3 {
    Vec3::new(values[offset], values[offset + 1], values[offset + 2])
}

fn write_segment(values: &mut [f32; 12], offset: usize, v: Vec3) {
    values[offset..offset + 3].copy_from_slice(&v.to_array());
}

impl ConstraintRow {
    /// Row with the given Jacobian blocks and bilateral limits
    #[must_use]
    pub fn new(linear_a: Vec3, angular_a: Vec3, linear_b: Vec3, angular_b: Vec3) -> Self {
        let mut row = Self::default();
        row.set_jacobian(linear_a, angular_a, linear_b, angular_b);
        row
    }

    pub fn set_jacobian(&mut self, linear_a: Vec3, angular_a: Vec3, linear_b: Vec3, angular_b: Vec3) {
        write_segment(&mut self.jacobian, 0, linear_a);
        write_segment(&mut self.jacobian, 3, angular_a);
        write_segment(&mut self.jacobian, 6, linear_b);
        write_segment(&mut self.jacobian, 9, angular_b);
    }

    #[must_use]
    pub fn with_limits(mut self, lower: f32, upper: f32) -> Self {
        self.lower_limit = lower;
        self.upper_limit = upper;
        self
    }

    #[must_use]
    pub fn with_bias(mut self, bias: f32) -> Self {
        self.bias = bias;
        self
    }

    #[must_use]
    pub fn linear_a(&self) -> Vec3 {
        segment(&self.jacobian, 0)
    }

    #[must_use]
    pub fn angular_a(&self) -> Vec3 {
        segment(&self.jacobian, 3)
    }

    #[must_use]
    pub fn linear_b(&self) -> Vec3 {
        segment(&self.jacobian, 6)
    }

    #[must_use]
    pub fn angular_b(&self) -> Vec3 {
        segment(&self.jacobian, 9)
    }

    /// Mass-weighted Jacobian blocks, in the same layout as the Jacobian
    #[must_use]
    pub fn b_blocks(&self) -> [Vec3; 4] {
        [0, 3, 6, 9].map(|offset| segment(&self.b, offset))
    }

    /// Relative velocity along the row for the given body velocities
    #[must_use]
    pub fn velocity(&self, linear_a: Vec3, angular_a: Vec3, linear_b: Vec3, angular_b: Vec3) -> f32 {
        self.linear_a().dot(linear_a)
            + self.angular_a().dot(angular_a)
            + self.linear_b().dot(linear_b)
            + self.angular_b().dot(angular_b)
    }

    /// Fill `b`, `d` and `eta` from the bodies' current mass properties and
    /// velocities. A missing body contributes nothing.
    pub fn compute_b(&mut self, body_a: Option<&RigidBody>, body_b: Option<&RigidBody>) {
        let (lin_a, ang_a, vel_a, omega_a) = mass_weighted(body_a, self.linear_a(), self.angular_a());
        let (lin_b, ang_b, vel_b, omega_b) = mass_weighted(body_b, self.linear_b(), self.angular_b());

        write_segment(&mut self.b, 0, lin_a);
        write_segment(&mut self.b, 3, ang_a);
        write_segment(&mut self.b, 6, lin_b);
        write_segment(&mut self.b, 9, ang_b);

        self.d = self.jacobian.iter().zip(&self.b).map(|(j, b)| j * b).sum();
        self.eta = self.bias - self.velocity(vel_a, omega_a, vel_b, omega_b);
    }

    /// Clamp `value` into the row's impulse bounds
    #[must_use]
    pub fn clamp(&self, value: f32) -> f32 {
        value.max(self.lower_limit).min(self.upper_limit)
    }
}

fn mass_weighted(body: Option<&RigidBody>, linear: Vec3, angular: Vec3) -> (Vec3, Vec3, Vec3, Vec3) {
    match body {
        Some(body) => (
            linear * body.inv_mass * body.linear_factor,
            (body.inv_inertia_world * angular) * body.angular_factor,
            body.linear_velocity,
            body.angular_velocity,
        ),
        None => (Vec3::ZERO, Vec3::ZERO, Vec3::ZERO, Vec3::ZERO),
    }
}
