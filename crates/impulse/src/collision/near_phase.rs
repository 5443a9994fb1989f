//! Narrow-phase dispatch and manifold bookkeeping

use crate::body::{BodyHandle, BodySet};
use crate::config::CollisionConfig;
use crate::events::PhysicsEvent;
use crate::filter::can_bodies_collide;
use crate::shapes::Shape;

use super::{
    detect_convex_plane_collision, detect_sphere_box_collision, detect_sphere_plane_collision,
    detect_sphere_sphere_collision, epa_penetration, gjk_intersect, BodyPair, BodyRef, Contact, EpaScratch,
    ManifoldList,
};

/// Route a pair to the matching exact test.
///
/// Closed-form routines handle sphere-sphere, sphere-box and anything against
/// a plane; every other pair goes through GJK and EPA. The returned contact
/// may have the bodies in either order.
pub fn detect_contact(
    a: BodyRef<'_>,
    b: BodyRef<'_>,
    scratch: &mut EpaScratch,
    config: &CollisionConfig,
) -> Option<Contact> {
    let (_, body_a) = a;
    let (_, body_b) = b;

    match (&body_a.shape, &body_b.shape) {
        (Shape::Sphere { radius: ra }, Shape::Sphere { radius: rb }) => {
            detect_sphere_sphere_collision(a, *ra, b, *rb)
        }
        (Shape::Sphere { radius }, Shape::Box { half_extents }) => {
            detect_sphere_box_collision(a, *radius, b, *half_extents)
        }
        (Shape::Box { half_extents }, Shape::Sphere { radius }) => {
            detect_sphere_box_collision(b, *radius, a, *half_extents)
        }
        (Shape::Plane { .. }, Shape::Plane { .. }) => None,
        (Shape::Plane { normal }, Shape::Sphere { radius }) => detect_sphere_plane_collision(b, *radius, a, *normal),
        (Shape::Sphere { radius }, Shape::Plane { normal }) => detect_sphere_plane_collision(a, *radius, b, *normal),
        (Shape::Plane { normal }, _) => detect_convex_plane_collision(b, a, *normal),
        (_, Shape::Plane { normal }) => detect_convex_plane_collision(a, b, *normal),
        _ => {
            let simplex = gjk_intersect(body_a, body_b, config.gjk_max_iterations)?;
            let hit = epa_penetration(body_a, body_b, &simplex, scratch, config);
            Some(Contact::between(a, b, hit.point_on_a, hit.point_on_b, hit.normal, hit.depth))
        }
    }
}

/// Owns the manifold list and drives narrow-phase tests for candidate pairs
#[derive(Debug, Default)]
pub struct NearPhase {
    config: CollisionConfig,
    manifolds: ManifoldList,
    epa: EpaScratch,
    events: Vec<PhysicsEvent>,
    tests_run: usize,
}

impl NearPhase {
    #[must_use]
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn config(&self) -> &CollisionConfig {
        &self.config
    }

    #[must_use]
    pub fn manifolds(&self) -> &ManifoldList {
        &self.manifolds
    }

    pub fn manifolds_mut(&mut self) -> &mut ManifoldList {
        &mut self.manifolds
    }

    /// Narrow-phase routines invoked since creation
    #[must_use]
    pub fn tests_run(&self) -> usize {
        self.tests_run
    }

    /// Re-project cached points and drop empty manifolds. Manifolds whose
    /// bodies are gone are dropped as well.
    pub fn update_manifolds(&mut self, bodies: &BodySet) {
        for manifold in self.manifolds.iter_mut() {
            let pair = manifold.pair();
            if let (Some(a), Some(b)) = (bodies.get(pair.a), bodies.get(pair.b)) {
                manifold.refresh(a, b, &self.config);
            }
        }

        let events = &mut self.events;
        self.manifolds.retain(|manifold| {
            let pair = manifold.pair();
            let alive = bodies.contains(pair.a) && bodies.contains(pair.b);
            if alive && !manifold.is_empty() {
                return true;
            }
            tracing::debug!("removing manifold for {:?}", pair);
            events.push(PhysicsEvent::ContactEnd { a: pair.a, b: pair.b });
            false
        });
    }

    /// Run exact tests on filtered candidate pairs and feed hits into their
    /// manifolds. Returns the number of contacts found.
    pub fn generate_contacts(&mut self, pairs: &[BodyPair], bodies: &BodySet) -> usize {
        let mut found = 0;
        for &pair in pairs {
            let (Some(body_a), Some(body_b)) = (bodies.get(pair.a), bodies.get(pair.b)) else {
                continue;
            };
            if !can_bodies_collide(body_a, body_b) {
                continue;
            }

            self.tests_run += 1;
            let Some(mut contact) = detect_contact((pair.a, body_a), (pair.b, body_b), &mut self.epa, &self.config)
            else {
                continue;
            };
            if contact.object_a != Some(pair.a) {
                contact = contact.flipped();
            }

            let (manifold, created) = self.manifolds.get_or_create(pair);
            manifold.add_contact(contact, body_a, body_b, &self.config);
            if created {
                self.events.push(PhysicsEvent::ContactBegin { a: pair.a, b: pair.b });
            }
            found += 1;
        }
        found
    }

    /// Forget every manifold involving `handle`
    pub fn remove_body(&mut self, handle: BodyHandle) {
        let events = &mut self.events;
        self.manifolds.retain(|manifold| {
            let pair = manifold.pair();
            if pair.contains(handle) {
                events.push(PhysicsEvent::ContactEnd { a: pair.a, b: pair.b });
                false
            } else {
                true
            }
        });
    }

    /// Move queued contact events into `out`
    pub fn drain_events(&mut self, out: &mut Vec<PhysicsEvent>) {
        out.append(&mut self.events);
    }
}
