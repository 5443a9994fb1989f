//! Persistent contact manifolds
//!
//! A manifold caches up to [`MAX_MANIFOLD_POINTS`] contacts for one body pair
//! across steps. Points are stored in both bodies' local frames so they can be
//! re-projected every step; points that separated, slid or whose normal turned
//! too far are dropped. The cached solver impulses ride along with each point
//! for warm starting.

use glam::Vec3;

use crate::body::RigidBody;
use crate::config::CollisionConfig;

use super::{BodyPair, Contact};

pub const MAX_MANIFOLD_POINTS: usize = 4;

/// Cached contact plus the solver state carried across steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManifoldPoint {
    pub contact: Contact,
    /// Contact normal in A's local frame
    pub normal_in_a: Vec3,
    /// Contact normal in B's local frame
    pub normal_in_b: Vec3,
    /// Accumulated normal impulse from the last solve
    pub normal_impulse: f32,
    /// Accumulated impulses along the two friction tangents
    pub friction_impulse: [f32; 2],
}

impl ManifoldPoint {
    fn new(contact: Contact, body_a: &RigidBody, body_b: &RigidBody) -> Self {
        Self {
            contact,
            normal_in_a: body_a.rotation.inverse() * contact.contact_normal,
            normal_in_b: body_b.rotation.inverse() * contact.contact_normal,
            normal_impulse: 0.0,
            friction_impulse: [0.0; 2],
        }
    }
}

/// Area proxy of the quadrilateral spanned by four points: the largest
/// diagonal cross product over the three ways to pair them up
fn quad_area(p: [Vec3; 4]) -> f32 {
    let a = (p[0] - p[1]).cross(p[2] - p[3]).length_squared();
    let b = (p[0] - p[2]).cross(p[1] - p[3]).length_squared();
    let c = (p[0] - p[3]).cross(p[1] - p[2]).length_squared();
    a.max(b).max(c)
}

/// Contact cache for a single body pair. Every point has `pair.a` as
/// `object_a`.
#[derive(Debug, Clone)]
pub struct ContactManifold {
    pair: BodyPair,
    points: Vec<ManifoldPoint>,
}

impl ContactManifold {
    #[must_use]
    pub fn new(pair: BodyPair) -> Self {
        Self {
            pair,
            points: Vec::with_capacity(MAX_MANIFOLD_POINTS),
        }
    }

    #[must_use]
    pub fn pair(&self) -> BodyPair {
        self.pair
    }

    #[must_use]
    pub fn points(&self) -> &[ManifoldPoint] {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut [ManifoldPoint] {
        &mut self.points
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Insert a contact. A point within the matching tolerance of existing
    /// ones replaces all of them and inherits the strongest cached impulse;
    /// once the manifold is full the new point only goes in if it enlarges
    /// the covered area.
    ///
    /// Returns `false` if the contact was discarded.
    pub fn add_contact(
        &mut self,
        contact: Contact,
        body_a: &RigidBody,
        body_b: &RigidBody,
        config: &CollisionConfig,
    ) -> bool {
        let mut point = ManifoldPoint::new(contact, body_a, body_b);
        let tolerance_sq = config.contact_matching_tolerance * config.contact_matching_tolerance;

        let near = |p: &ManifoldPoint| {
            (p.contact.contact_point_in_a - contact.contact_point_in_a).length_squared() < tolerance_sq
        };
        if let Some(slot) = self.points.iter().position(near) {
            // Every matched point collapses into the new one
            if let Some(strongest) = self
                .points
                .iter()
                .filter(|p| near(*p))
                .max_by(|x, y| x.normal_impulse.total_cmp(&y.normal_impulse))
            {
                point.normal_impulse = strongest.normal_impulse;
                point.friction_impulse = strongest.friction_impulse;
            }
            self.points.retain(|p| !near(p));
            self.points.insert(slot, point);
            return true;
        }

        if self.points.len() < MAX_MANIFOLD_POINTS {
            self.points.push(point);
            return true;
        }

        match self.replacement_index(contact.contact_point_in_a) {
            Some(index) => {
                self.points[index] = point;
                true
            }
            None => false,
        }
    }

    /// Slot whose replacement by `candidate` yields the largest area, or
    /// `None` if the current points already cover more
    fn replacement_index(&self, candidate: Vec3) -> Option<usize> {
        let current = [0, 1, 2, 3].map(|i| self.points[i].contact.contact_point_in_a);
        let mut best_area = quad_area(current);
        let mut best = None;

        for i in 0..MAX_MANIFOLD_POINTS {
            let mut trial = current;
            trial[i] = candidate;
            let area = quad_area(trial);
            if area > best_area {
                best_area = area;
                best = Some(i);
            }
        }
        best
    }

    /// Re-project every cached point with the bodies' current poses and drop
    /// the ones that are no longer valid
    pub fn refresh(&mut self, body_a: &RigidBody, body_b: &RigidBody, config: &CollisionConfig) {
        let drift_sq = config.contact_drift_threshold * config.contact_drift_threshold;

        self.points.retain_mut(|point| {
            let normal_from_a = body_a.rotation * point.normal_in_a;
            let normal_from_b = body_b.rotation * point.normal_in_b;
            if normal_from_a.dot(normal_from_b) < config.normal_rotation_cos {
                return false;
            }

            let normal = normal_from_a;
            let on_a = body_a.local_to_world(point.contact.contact_point_in_a);
            let on_b = body_b.local_to_world(point.contact.contact_point_in_b);
            let depth = (on_a - on_b).dot(normal);
            if depth < -config.contact_breaking_threshold {
                return false;
            }

            let projected = on_a - normal * depth;
            if (on_b - projected).length_squared() > drift_sq {
                return false;
            }

            point.contact.contact_normal = normal;
            point.contact.penetration_depth = depth;
            point.contact.contact_point = (on_a + on_b) * 0.5;
            true
        });
    }
}

/// All live manifolds, in creation order
#[derive(Debug, Default)]
pub struct ManifoldList {
    manifolds: Vec<ContactManifold>,
}

impl ManifoldList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.manifolds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.manifolds.is_empty()
    }

    #[must_use]
    pub fn get(&self, pair: BodyPair) -> Option<&ContactManifold> {
        self.manifolds.iter().find(|m| m.pair == pair)
    }

    /// Manifold for `pair`, created if missing. The flag is `true` when the
    /// manifold is new.
    pub fn get_or_create(&mut self, pair: BodyPair) -> (&mut ContactManifold, bool) {
        match self.manifolds.iter().position(|m| m.pair == pair) {
            Some(index) => (&mut self.manifolds[index], false),
            None => {
                tracing::debug!("creating manifold for {:?}", pair);
                self.manifolds.push(ContactManifold::new(pair));
                let last = self.manifolds.len() - 1;
                (&mut self.manifolds[last], true)
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContactManifold> {
        self.manifolds.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ContactManifold> {
        self.manifolds.iter_mut()
    }

    /// Drop every manifold rejected by `keep`, preserving order
    pub fn retain(&mut self, keep: impl FnMut(&ContactManifold) -> bool) {
        self.manifolds.retain(keep);
    }

    pub fn clear(&mut self) {
        self.manifolds.clear();
    }
}
