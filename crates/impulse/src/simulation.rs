//! # Physics Simulation Core
//!
//! [`PhysicsSim`] owns the bodies, joints and every pipeline stage, and runs
//! them in a fixed order each step:
//!
//! 1. springs accumulate forces
//! 2. gravity and forces are integrated into velocity
//! 3. the broadphase predicts candidate pairs
//! 4. cached manifolds are refreshed, then new contacts are generated
//! 5. ropes and rods emit pseudo-contacts
//! 6. contact and friction constraints are built from pooled objects
//! 7. the solver runs over contacts and joints
//! 8. impulses are cached back into the manifolds and joints that broke are
//!    deactivated
//! 9. pooled constraints are released and positions integrated
//! 10. queued events are delivered

use std::ops::ControlFlow;

use crate::body::{BodyHandle, BodySet, RigidBody};
use crate::collision::{BasicBroadphase, Broadphase, Contact, NearPhase};
use crate::config::{CollisionConfig, PhysParams, SolverConfig};
use crate::constraints::{
    build_contact_constraint, build_friction_constraint, Constraint, ConstraintHandle, RevoluteConstraint,
    RodConstraint, RopeConstraint, SpringConstraint,
};
use crate::error::PhysicsError;
use crate::events::{EventDispatcher, PhysicsEvent};
use crate::integrator::{integrate_positions, integrate_velocities};
use crate::pool::ObjectPool;
use crate::solver::IterativeSolver;

/// Pool key for per-step contact and friction constraints
pub const CONSTRAINT_POOL: &str = "constraint";

/// A user joint attached to the simulation
#[derive(Debug, Clone)]
pub enum Joint {
    Revolute(RevoluteConstraint),
    Rope(RopeConstraint),
    Rod(RodConstraint),
    Spring(SpringConstraint),
}

impl Joint {
    /// Check whether the joint is attached to `handle`
    #[must_use]
    pub fn involves(&self, handle: BodyHandle) -> bool {
        let (a, b) = match self {
            Joint::Revolute(j) => (j.constraint.object_a, j.constraint.object_b),
            Joint::Rope(j) => (Some(j.object_a), j.object_b),
            Joint::Rod(j) => (Some(j.object_a), j.object_b),
            Joint::Spring(j) => (Some(j.object_a), j.object_b),
        };
        a == Some(handle) || b == Some(handle)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        match self {
            Joint::Revolute(j) => j.constraint.active,
            Joint::Rope(j) => j.active,
            Joint::Rod(j) => j.active,
            Joint::Spring(_) => true,
        }
    }
}

impl From<RevoluteConstraint> for Joint {
    fn from(joint: RevoluteConstraint) -> Self {
        Joint::Revolute(joint)
    }
}

impl From<RopeConstraint> for Joint {
    fn from(joint: RopeConstraint) -> Self {
        Joint::Rope(joint)
    }
}

impl From<RodConstraint> for Joint {
    fn from(joint: RodConstraint) -> Self {
        Joint::Rod(joint)
    }
}

impl From<SpringConstraint> for Joint {
    fn from(joint: SpringConstraint) -> Self {
        Joint::Spring(joint)
    }
}

/// Main physics simulation container
pub struct PhysicsSim {
    pub params: PhysParams,
    bodies: BodySet,
    broadphase: Box<dyn Broadphase>,
    near_phase: NearPhase,
    solver: IterativeSolver,
    joints: Vec<Option<Joint>>,
    pools: ObjectPool,
    step_constraints: Vec<Constraint>,
    pseudo_contacts: Vec<Contact>,
    pending_events: Vec<PhysicsEvent>,
    events: EventDispatcher,
    time: f32,
}

impl Default for PhysicsSim {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsSim {
    /// Create an empty simulation with default parameters and the brute-force
    /// broadphase
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(PhysParams::default(), CollisionConfig::default(), SolverConfig::default())
    }

    #[must_use]
    pub fn with_config(params: PhysParams, collision: CollisionConfig, solver: SolverConfig) -> Self {
        let mut pools = ObjectPool::new();
        pools.register_type(CONSTRAINT_POOL, Constraint::default);

        Self {
            params,
            bodies: BodySet::new(),
            broadphase: Box::new(BasicBroadphase::new()),
            near_phase: NearPhase::new(collision),
            solver: IterativeSolver::new(solver),
            joints: Vec::new(),
            pools,
            step_constraints: Vec::new(),
            pseudo_contacts: Vec::new(),
            pending_events: Vec::new(),
            events: EventDispatcher::new(),
            time: 0.0,
        }
    }

    /// Swap the broadphase; registered bodies carry over
    #[must_use]
    pub fn with_broadphase(mut self, mut broadphase: Box<dyn Broadphase>) -> Self {
        for (handle, _) in self.bodies.iter() {
            broadphase.add_body(handle);
        }
        self.broadphase = broadphase;
        self
    }

    /// Simulated time so far
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    #[must_use]
    pub fn bodies(&self) -> &BodySet {
        &self.bodies
    }

    #[must_use]
    pub fn body(&self, handle: BodyHandle) -> Option<&RigidBody> {
        self.bodies.get(handle)
    }

    /// Mutable access to a body. Call [`RigidBody::update_derived`] after
    /// moving it.
    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut RigidBody> {
        self.bodies.get_mut(handle)
    }

    #[must_use]
    pub fn near_phase(&self) -> &NearPhase {
        &self.near_phase
    }

    #[must_use]
    pub fn broadphase(&self) -> &dyn Broadphase {
        self.broadphase.as_ref()
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyHandle {
        let handle = self.bodies.insert(body);
        self.broadphase.add_body(handle);
        handle
    }

    /// Remove a body together with its manifolds and joints
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::UnknownBody`] for a stale handle.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Result<RigidBody, PhysicsError> {
        let body = self.bodies.remove(handle).ok_or(PhysicsError::UnknownBody(handle))?;
        self.broadphase.remove_body(handle);
        self.near_phase.remove_body(handle);
        for slot in &mut self.joints {
            if slot.as_ref().is_some_and(|joint| joint.involves(handle)) {
                tracing::debug!("dropping joint attached to removed body {:?}", handle);
                *slot = None;
            }
        }
        Ok(body)
    }

    pub fn add_joint(&mut self, joint: impl Into<Joint>) -> ConstraintHandle {
        let joint = joint.into();
        if let Some(index) = self.joints.iter().position(Option::is_none) {
            self.joints[index] = Some(joint);
            ConstraintHandle(index)
        } else {
            self.joints.push(Some(joint));
            ConstraintHandle(self.joints.len() - 1)
        }
    }

    /// # Errors
    ///
    /// Returns [`PhysicsError::UnknownConstraint`] for a stale handle.
    pub fn remove_joint(&mut self, handle: ConstraintHandle) -> Result<Joint, PhysicsError> {
        self.joints
            .get_mut(handle.0)
            .and_then(Option::take)
            .ok_or(PhysicsError::UnknownConstraint(handle))
    }

    #[must_use]
    pub fn joint(&self, handle: ConstraintHandle) -> Option<&Joint> {
        self.joints.get(handle.0)?.as_ref()
    }

    pub fn joint_mut(&mut self, handle: ConstraintHandle) -> Option<&mut Joint> {
        self.joints.get_mut(handle.0)?.as_mut()
    }

    /// Register a listener for contact and joint events
    pub fn add_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&PhysicsEvent) -> ControlFlow<()> + 'static,
    {
        self.events.add_listener(listener);
    }

    /// Advance the simulation by `params.dt`
    ///
    /// # Errors
    ///
    /// Fails only if the constraint pool registration was tampered with.
    pub fn step(&mut self) -> Result<(), PhysicsError> {
        let dt = self.params.dt;

        for joint in self.joints.iter().flatten() {
            if let Joint::Spring(spring) = joint {
                spring.apply(&mut self.bodies);
            }
        }
        integrate_velocities(&mut self.bodies, self.params.gravity, dt);

        let pairs = self.broadphase.predict_contact_pairs(&self.bodies);
        self.near_phase.update_manifolds(&self.bodies);
        self.near_phase.generate_contacts(pairs, &self.bodies);

        self.pseudo_contacts.clear();
        for joint in self.joints.iter().flatten() {
            let contact = match joint {
                Joint::Rope(rope) => rope.update(&self.bodies),
                Joint::Rod(rod) => rod.update(&self.bodies),
                _ => None,
            };
            self.pseudo_contacts.extend(contact);
        }

        self.build_step_constraints(dt)?;

        for joint in self.joints.iter_mut().flatten() {
            if let Joint::Revolute(revolute) = joint {
                if revolute.constraint.active {
                    revolute.update(&self.bodies, self.solver.config(), dt);
                }
            }
        }

        {
            let mut groups: Vec<&mut [Constraint]> = Vec::with_capacity(1 + self.joints.len());
            groups.push(&mut self.step_constraints[..]);
            for joint in self.joints.iter_mut().flatten() {
                if let Joint::Revolute(revolute) = joint {
                    groups.push(std::slice::from_mut(&mut revolute.constraint));
                }
            }
            self.solver.solve(&mut self.bodies, &mut groups);
        }

        self.store_manifold_impulses();
        self.near_phase.drain_events(&mut self.pending_events);
        self.break_overloaded_joints();

        let pool = self.pools.pool_mut::<Constraint>(CONSTRAINT_POOL)?;
        for constraint in self.step_constraints.drain(..) {
            pool.free(constraint);
        }

        integrate_positions(&mut self.bodies, dt);
        self.time += dt;

        self.events.flush(&mut self.pending_events);
        Ok(())
    }

    /// One contact and one friction constraint per manifold point, in
    /// manifold order, then one contact constraint per pseudo-contact
    fn build_step_constraints(&mut self, dt: f32) -> Result<(), PhysicsError> {
        let pool = self.pools.pool_mut::<Constraint>(CONSTRAINT_POOL)?;
        let config = *self.solver.config();

        for manifold in self.near_phase.manifolds().iter() {
            for point in manifold.points() {
                let mut contact = pool.get();
                build_contact_constraint(
                    &mut contact,
                    &point.contact,
                    &self.bodies,
                    point.normal_impulse,
                    &config,
                    dt,
                );
                let normal_index = self.step_constraints.len();
                self.step_constraints.push(contact);

                let mut friction = pool.get();
                build_friction_constraint(
                    &mut friction,
                    &point.contact,
                    &self.bodies,
                    point.friction_impulse,
                    normal_index,
                );
                self.step_constraints.push(friction);
            }
        }

        for pseudo in &self.pseudo_contacts {
            let mut contact = pool.get();
            build_contact_constraint(&mut contact, pseudo, &self.bodies, 0.0, &config, dt);
            self.step_constraints.push(contact);
        }
        Ok(())
    }

    fn store_manifold_impulses(&mut self) {
        let mut constraints = self.step_constraints.chunks_exact(2);
        for manifold in self.near_phase.manifolds_mut().iter_mut() {
            for point in manifold.points_mut() {
                let Some([contact, friction]) = constraints.next() else {
                    return;
                };
                point.normal_impulse = contact.rows.first().map_or(0.0, |row| row.multiplier);
                for (cached, row) in point.friction_impulse.iter_mut().zip(&friction.rows) {
                    *cached = row.multiplier;
                }
            }
        }
    }

    fn break_overloaded_joints(&mut self) {
        for (index, slot) in self.joints.iter_mut().enumerate() {
            let Some(Joint::Revolute(revolute)) = slot else {
                continue;
            };
            if revolute.constraint.active && revolute.constraint.exceeds_breaking_threshold() {
                tracing::debug!("joint {} exceeded its breaking threshold", index);
                revolute.constraint.active = false;
                self.pending_events.push(PhysicsEvent::ConstraintBroken(ConstraintHandle(index)));
            }
        }
    }
}
