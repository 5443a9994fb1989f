//! Revolute, rope, rod and spring joints driven through the simulation

use std::cell::RefCell;
use std::ops::ControlFlow;
use std::rc::Rc;

use impulse::{
    BodySet, Joint, PhysParams, PhysicsEvent, PhysicsSim, RevoluteConstraint, RigidBody, RodConstraint,
    RopeConstraint, Shape, SolverConfig, SpringConstraint, Vec3,
};

fn weightless() -> PhysicsSim {
    let mut sim = PhysicsSim::new();
    sim.params = PhysParams {
        gravity: Vec3::ZERO,
        ..PhysParams::default()
    };
    sim
}

#[test]
fn test_revolute_coincident_anchors_have_zero_bias() {
    let mut bodies = BodySet::new();
    let a = bodies.insert(RigidBody::new(Shape::sphere(0.5), 1.0));
    let b = bodies.insert(RigidBody::new(Shape::sphere(0.5), 1.0).with_position(Vec3::new(2.0, 0.0, 0.0)));

    let mut joint = RevoluteConstraint::new(Some(a), Vec3::X, Some(b), -Vec3::X);
    joint.update(&bodies, &SolverConfig::default(), 1.0 / 60.0);
    assert_eq!(joint.constraint.rows.len(), 3);
    for row in &joint.constraint.rows {
        assert!(row.bias.abs() < 1e-6);
        assert!(row.d > 0.0);
    }
}

#[test]
fn test_pendulum_keeps_its_length() -> anyhow::Result<()> {
    let mut sim = PhysicsSim::new();
    // A 2m bar hinged at its left end, starting horizontal
    let bar = sim.add_body(
        RigidBody::new(Shape::cuboid(Vec3::new(1.0, 0.05, 0.05)), 1.0).with_position(Vec3::new(1.0, 0.0, 0.0)),
    );
    sim.add_joint(
        RevoluteConstraint::new(None, Vec3::ZERO, Some(bar), Vec3::new(-1.0, 0.0, 0.0)).with_axis(Vec3::Z, Vec3::Z),
    );

    for _ in 0..40 {
        sim.step()?;
    }
    let position = sim.body(bar).expect("bar exists").position;
    println!("bar centre at {position:?}");
    assert!(position.y < -0.5, "bar should have swung down");
    assert!(position.z.abs() < 0.05);
    assert!((position.length() - 1.0).abs() < 0.05);
    Ok(())
}

#[test]
fn test_overloaded_joint_breaks_and_reports() -> anyhow::Result<()> {
    let mut sim = PhysicsSim::new();
    let weight = sim.add_body(RigidBody::new(Shape::sphere(0.1), 1.0).with_position(Vec3::new(0.0, -1.0, 0.0)));
    let handle = sim.add_joint(
        RevoluteConstraint::new(None, Vec3::ZERO, Some(weight), Vec3::new(0.0, 1.0, 0.0)).with_breaking_threshold(0.01),
    );

    let broken = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&broken);
    sim.add_listener(move |event| {
        if let PhysicsEvent::ConstraintBroken(h) = event {
            sink.borrow_mut().push(*h);
        }
        ControlFlow::Continue(())
    });

    sim.step()?;
    assert_eq!(*broken.borrow(), vec![handle]);
    assert!(!sim.joint(handle).expect("joint kept").is_active());

    for _ in 0..60 {
        sim.step()?;
    }
    // Free fall once the joint is gone, and no second report
    assert!(sim.body(weight).expect("weight exists").position.y < -2.0);
    assert_eq!(broken.borrow().len(), 1);
    Ok(())
}

#[test]
fn test_rope_holds_weight_and_stays_slack_when_short() -> anyhow::Result<()> {
    let mut sim = PhysicsSim::new();
    let hanging = sim.add_body(RigidBody::new(Shape::sphere(0.1), 1.0).with_position(Vec3::new(0.0, -1.0, 0.0)));
    let slack = sim.add_body(RigidBody::new(Shape::sphere(0.1), 1.0).with_position(Vec3::new(5.0, -0.5, 0.0)));
    sim.add_joint(RopeConstraint::new(hanging, Vec3::ZERO, None, Vec3::ZERO, 1.0));
    sim.add_joint(RopeConstraint::new(slack, Vec3::ZERO, None, Vec3::new(5.0, 0.0, 0.0), 1.0));

    sim.step()?;
    // The slack rope does not act: the body fell freely for one step
    let slack_velocity = sim.body(slack).expect("body exists").linear_velocity.y;
    assert!(slack_velocity < -0.15);

    for _ in 0..120 {
        sim.step()?;
    }
    let length = sim.body(hanging).expect("body exists").position.length();
    assert!(length < 1.05, "rope stretched to {length}");
    let length = (sim.body(slack).expect("body exists").position - Vec3::new(5.0, 0.0, 0.0)).length();
    assert!(length < 1.05, "rope stretched to {length}");
    Ok(())
}

#[test]
fn test_rod_pushes_out_to_its_length() -> anyhow::Result<()> {
    let mut sim = weightless();
    let ball = sim.add_body(RigidBody::new(Shape::sphere(0.1), 1.0).with_position(Vec3::new(0.0, 0.8, 0.0)));
    let handle = sim.add_joint(RodConstraint::new(ball, Vec3::ZERO, None, Vec3::ZERO, 1.0));

    for _ in 0..120 {
        sim.step()?;
    }
    let distance = sim.body(ball).expect("ball exists").position.length();
    assert!((distance - 1.0).abs() < 0.05, "rod length {distance}");
    assert!(matches!(sim.joint(handle), Some(Joint::Rod(_))));
    Ok(())
}

#[test]
fn test_spring_pulls_bodies_together() -> anyhow::Result<()> {
    let mut sim = weightless();
    let a = sim.add_body(RigidBody::new(Shape::sphere(0.1), 1.0));
    let b = sim.add_body(RigidBody::new(Shape::sphere(0.1), 1.0).with_position(Vec3::new(2.0, 0.0, 0.0)));
    sim.add_joint(SpringConstraint::new(a, Vec3::ZERO, Some(b), Vec3::ZERO, 1.0, 20.0, 0.5));

    for _ in 0..10 {
        sim.step()?;
    }
    let va = sim.body(a).expect("a exists").linear_velocity.x;
    let vb = sim.body(b).expect("b exists").linear_velocity.x;
    assert!(va > 0.0 && vb < 0.0);
    // Equal and opposite forces
    assert!((va + vb).abs() < 1e-4);
    let gap = sim.body(b).expect("b exists").position.x - sim.body(a).expect("a exists").position.x;
    assert!(gap < 2.0);
    Ok(())
}

#[test]
fn test_removing_body_drops_its_joints() -> anyhow::Result<()> {
    let mut sim = weightless();
    let a = sim.add_body(RigidBody::new(Shape::sphere(0.1), 1.0));
    let b = sim.add_body(RigidBody::new(Shape::sphere(0.1), 1.0).with_position(Vec3::new(1.0, 0.0, 0.0)));
    let rope = sim.add_joint(RopeConstraint::new(a, Vec3::ZERO, Some(b), Vec3::ZERO, 1.0));
    let spring = sim.add_joint(SpringConstraint::new(a, Vec3::ZERO, None, Vec3::ZERO, 0.0, 1.0, 0.0));

    sim.remove_body(b)?;
    assert!(sim.joint(rope).is_none());
    assert!(sim.joint(spring).is_some());
    assert!(sim.remove_body(b).is_err());
    assert!(sim.remove_joint(rope).is_err());
    sim.step()?;
    Ok(())
}
