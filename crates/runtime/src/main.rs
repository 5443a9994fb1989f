#![deny(clippy::all, clippy::pedantic)]

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use anyhow::{Context, Result};
use impulse::{
    BodyHandle, GridBroadphase, PhysicsEvent, PhysicsSim, RevoluteConstraint, RigidBody, RopeConstraint, Shape,
    SpringConstraint, Vec3,
};

const DEFAULT_STEPS: usize = 240;
const REPORT_EVERY: usize = 60;

#[derive(Debug, Default)]
struct EventCounts {
    contact_begin: usize,
    contact_end: usize,
    broken: usize,
}

/// Ground, a few falling bodies, a hinged bar, a rope and a spring
fn build_scene(sim: &mut PhysicsSim) -> Result<Vec<BodyHandle>> {
    sim.add_body(RigidBody::new(Shape::plane(Vec3::Y)?, 0.0).with_material(0.0, 0.6));

    let mut tracked = Vec::new();
    for i in 0..4_u8 {
        let x = f32::from(i) * 1.5 - 2.25;
        let shape = if i % 2 == 0 {
            Shape::sphere(0.5)
        } else {
            Shape::cuboid(Vec3::splat(0.4))
        };
        tracked.push(sim.add_body(RigidBody::new(shape, 1.0).with_position(Vec3::new(x, 2.0 + f32::from(i), 0.0))));
    }

    let bar = sim.add_body(
        RigidBody::new(Shape::cuboid(Vec3::new(1.0, 0.05, 0.05)), 1.0).with_position(Vec3::new(1.0, 4.0, 3.0)),
    );
    sim.add_joint(
        RevoluteConstraint::new(None, Vec3::new(0.0, 4.0, 3.0), Some(bar), Vec3::new(-1.0, 0.0, 0.0))
            .with_axis(Vec3::Z, Vec3::Z),
    );
    tracked.push(bar);

    let weight = sim.add_body(RigidBody::new(Shape::sphere(0.2), 2.0).with_position(Vec3::new(-3.0, 3.0, 3.0)));
    sim.add_joint(RopeConstraint::new(weight, Vec3::ZERO, None, Vec3::new(-3.0, 4.0, 3.0), 1.5));
    tracked.push(weight);

    let bob = sim.add_body(RigidBody::new(Shape::sphere(0.2), 1.0).with_position(Vec3::new(3.0, 3.0, -3.0)));
    sim.add_joint(SpringConstraint::new(bob, Vec3::ZERO, None, Vec3::new(3.0, 5.0, -3.0), 1.0, 40.0, 1.0));
    tracked.push(bob);

    Ok(tracked)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let steps = match std::env::args().nth(1) {
        Some(arg) => arg.parse::<usize>().with_context(|| format!("invalid step count `{arg}`"))?,
        None => DEFAULT_STEPS,
    };

    tracing::info!("Initializing physics simulation...");
    let mut sim = PhysicsSim::new().with_broadphase(Box::new(GridBroadphase::new(2.0)));
    let tracked = build_scene(&mut sim)?;

    let counts = Rc::new(RefCell::new(EventCounts::default()));
    let sink = Rc::clone(&counts);
    sim.add_listener(move |event| {
        let mut counts = sink.borrow_mut();
        match event {
            PhysicsEvent::ContactBegin { .. } => counts.contact_begin += 1,
            PhysicsEvent::ContactEnd { .. } => counts.contact_end += 1,
            PhysicsEvent::ConstraintBroken(_) => counts.broken += 1,
        }
        ControlFlow::Continue(())
    });

    tracing::info!(
        "Starting simulation loop for {} steps with dt = {}...",
        steps,
        sim.params.dt
    );
    for i in 0..steps {
        sim.step().with_context(|| format!("simulation step {i} failed"))?;
        if (i + 1) % REPORT_EVERY == 0 {
            tracing::info!(
                "Simulation step {} complete. {} manifolds, {} narrow-phase tests",
                i + 1,
                sim.near_phase().manifolds().len(),
                sim.near_phase().tests_run()
            );
        }
    }

    let heights: Vec<f32> = tracked
        .iter()
        .filter_map(|&handle| sim.body(handle).map(|body| body.position.y))
        .collect();
    tracing::info!("Simulation loop finished after {} steps.", steps);
    tracing::debug!("final heights: {:?}", heights);

    let counts = counts.borrow();
    let summary = serde_json::json!({
        "steps": steps,
        "time": sim.time(),
        "bodies": sim.bodies().len(),
        "manifolds": sim.near_phase().manifolds().len(),
        "contact_begin": counts.contact_begin,
        "contact_end": counts.contact_end,
        "constraints_broken": counts.broken,
        "heights": heights,
    });
    println!("{summary}");

    Ok(())
}
