//! Broad-phase collision detection
//!
//! A broadphase keeps a registry of bodies and, once per step, rebuilds the
//! list of pairs whose bounding spheres overlap. Implementations must emit
//! exactly that set: no duplicates, no self-pairs, nothing else.

use crate::body::{BodyHandle, BodySet, RigidBody};

use super::BodyPair;

/// Pair culling stage of the pipeline
pub trait Broadphase {
    /// Register a body for pair prediction
    fn add_body(&mut self, handle: BodyHandle);

    /// Unregister a body; unknown handles are ignored
    fn remove_body(&mut self, handle: BodyHandle);

    /// Rebuild the candidate pair list for the current body poses. The
    /// returned slice is owned by the broadphase and reused next call.
    fn predict_contact_pairs(&mut self, bodies: &BodySet) -> &[BodyPair];

    /// Number of registered bodies
    fn body_count(&self) -> usize;
}

/// Check whether two bodies' bounding spheres touch or overlap
#[must_use]
pub fn bounding_spheres_overlap(a: &RigidBody, b: &RigidBody) -> bool {
    let distance = (a.position - b.position).length();
    distance - (a.bounding_radius + b.bounding_radius) <= 0.0
}

/// Brute-force O(n^2) broadphase: every registered pair is tested
#[derive(Debug, Default)]
pub struct BasicBroadphase {
    bodies: Vec<BodyHandle>,
    pairs: Vec<BodyPair>,
}

impl BasicBroadphase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs produced by the last prediction
    #[must_use]
    pub fn pairs(&self) -> &[BodyPair] {
        &self.pairs
    }
}

impl Broadphase for BasicBroadphase {
    fn add_body(&mut self, handle: BodyHandle) {
        if !self.bodies.contains(&handle) {
            self.bodies.push(handle);
        }
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if let Some(index) = self.bodies.iter().position(|h| *h == handle) {
            self.bodies.swap_remove(index);
        } else {
            tracing::warn!("removing unregistered body {:?} from broadphase", handle);
        }
    }

    fn predict_contact_pairs(&mut self, bodies: &BodySet) -> &[BodyPair] {
        self.pairs.clear();

        for (i, &handle_a) in self.bodies.iter().enumerate() {
            let Some(body_a) = bodies.get(handle_a) else {
                continue;
            };
            for &handle_b in &self.bodies[i + 1..] {
                let Some(body_b) = bodies.get(handle_b) else {
                    continue;
                };
                if bounding_spheres_overlap(body_a, body_b) {
                    self.pairs.push(BodyPair::new(handle_a, handle_b));
                }
            }
        }

        &self.pairs
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;
    use glam::Vec3;

    #[test]
    fn test_pairs_are_recomputed_each_call() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(RigidBody::new(Shape::sphere(1.0), 1.0));
        let b = bodies.insert(RigidBody::new(Shape::sphere(1.0), 1.0).with_position(Vec3::new(1.5, 0.0, 0.0)));

        let mut broadphase = BasicBroadphase::new();
        broadphase.add_body(a);
        broadphase.add_body(b);
        broadphase.add_body(b);
        assert_eq!(broadphase.body_count(), 2);

        assert_eq!(broadphase.predict_contact_pairs(&bodies), &[BodyPair::new(a, b)]);

        let moved = bodies.get_mut(b).unwrap();
        moved.position = Vec3::new(5.0, 0.0, 0.0);
        moved.update_derived();
        assert!(broadphase.predict_contact_pairs(&bodies).is_empty());
    }
}
