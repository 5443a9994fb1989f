//! GJK and EPA over randomly rotated convex pairs
//!
//! Every pair GJK calls overlapping must come back with a contact whose
//! depth is non-negative and whose normal actually pulls the shapes apart.

use impulse::collision::{detect_contact, gjk_intersect, EpaScratch};
use impulse::{BodyHandle, CollisionConfig, Quat, RigidBody, Shape, Vec3};

/// Gap left between the shapes after backing B out along the normal
const CLEARANCE: f32 = 0.02;

struct XorShift(u32);

impl XorShift {
    /// Uniform in `[0, 1)`
    fn unit(&mut self) -> f32 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 17;
        self.0 ^= self.0 << 5;
        (self.0 % 10_000) as f32 / 10_000.0
    }

    fn range(&mut self, lo: f32, hi: f32) -> f32 {
        lo + (hi - lo) * self.unit()
    }

    fn rotation(&mut self) -> Quat {
        let tau = std::f32::consts::TAU;
        Quat::from_rotation_x(self.range(0.0, tau))
            * Quat::from_rotation_y(self.range(0.0, tau))
            * Quat::from_rotation_z(self.range(0.0, tau))
    }

    fn shape(&mut self, kind: usize) -> Shape {
        match kind {
            0 => Shape::cuboid(Vec3::new(self.range(0.2, 0.6), self.range(0.2, 0.6), self.range(0.2, 0.6))),
            1 => Shape::cylinder(self.range(0.2, 0.5), self.range(0.2, 0.6)),
            2 => Shape::cone(self.range(0.2, 0.5), self.range(0.2, 0.6)),
            3 => {
                let points = (0..8)
                    .map(|_| Vec3::new(self.range(-0.5, 0.5), self.range(-0.5, 0.5), self.range(-0.5, 0.5)))
                    .collect();
                Shape::convex_hull(points).expect("hull has points")
            }
            _ => Shape::sphere(self.range(0.2, 0.5)),
        }
    }
}

/// Sphere-sphere and sphere-box take the closed-form path
fn uses_gjk(a: usize, b: usize) -> bool {
    !matches!((a, b), (4, 4) | (4, 0) | (0, 4))
}

#[test]
fn test_overlapping_pairs_get_separating_contacts() {
    let mut rng = XorShift(0x9e37_79b9);
    let config = CollisionConfig::default();
    let mut scratch = EpaScratch::new();
    let mut overlapping = 0;

    for case in 0..3_000 {
        let (kind_a, kind_b) = (case % 5, (case / 5) % 5);
        if !uses_gjk(kind_a, kind_b) {
            continue;
        }
        let a = RigidBody::new(rng.shape(kind_a), 1.0).with_rotation(rng.rotation());
        let offset = Vec3::new(rng.range(-0.9, 0.9), rng.range(-0.9, 0.9), rng.range(-0.9, 0.9));
        let b = RigidBody::new(rng.shape(kind_b), 1.0)
            .with_rotation(rng.rotation())
            .with_position(offset);

        if gjk_intersect(&a, &b, config.gjk_max_iterations).is_none() {
            continue;
        }
        overlapping += 1;

        let contact = detect_contact((BodyHandle(0), &a), (BodyHandle(1), &b), &mut scratch, &config)
            .unwrap_or_else(|| panic!("case {case}: overlap without a contact at {offset}"));
        let normal = contact.contact_normal;
        let depth = contact.penetration_depth;
        assert!(depth >= 0.0, "case {case}: negative depth {depth}");
        assert!((normal.length() - 1.0).abs() < 1e-3, "case {case}: normal {normal} is not unit length");

        let moved = b.clone().with_position(offset + normal * (depth + CLEARANCE));
        assert!(
            gjk_intersect(&a, &moved, config.gjk_max_iterations).is_none(),
            "case {case}: moving B by {depth} along {normal} leaves the shapes overlapping"
        );
    }

    assert!(overlapping > 300, "only {overlapping} overlapping pairs exercised");
}

#[test]
fn test_barely_touching_boxes_report_shallow_contact() {
    let config = CollisionConfig::default();
    let mut scratch = EpaScratch::new();
    let a = RigidBody::new(Shape::cuboid(Vec3::ONE), 1.0);
    // Tilted about X by 0.2 the small cube reaches 0.5 * (cos 0.2 + sin 0.2) below its centre
    let tilt = Quat::from_rotation_y(0.3) * Quat::from_rotation_x(0.2);
    let reach_down = 0.5 * (0.2_f32.cos() + 0.2_f32.sin());
    let mut touching = 0;

    for step in 0..20 {
        let sink = 0.001 * step as f32;
        let b = RigidBody::new(Shape::cuboid(Vec3::splat(0.5)), 1.0)
            .with_rotation(tilt)
            .with_position(Vec3::new(0.0, 1.0 + reach_down + 0.0005 - sink, 0.0));
        if gjk_intersect(&a, &b, config.gjk_max_iterations).is_none() {
            continue;
        }
        touching += 1;
        let contact = detect_contact((BodyHandle(0), &a), (BodyHandle(1), &b), &mut scratch, &config)
            .expect("overlap reported by GJK has a contact");
        assert!(contact.penetration_depth >= 0.0);
        assert!(contact.penetration_depth < 0.05);
        assert!(contact.contact_normal.dot(Vec3::Y) > 0.5);
    }
    assert!(touching >= 10);
}
