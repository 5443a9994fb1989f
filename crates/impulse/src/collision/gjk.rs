//! GJK intersection query
//!
//! Works on the Minkowski difference A - B through the shapes' support
//! mappings. Each simplex vertex remembers the two support points it came from
//! so EPA can later recover witness points on both bodies.

use glam::Vec3;

use crate::body::RigidBody;
use crate::shapes::SupportMap;

/// Sine of the angle below which a search direction counts as zero
const DEGENERATE: f32 = 1.0e-6;

/// Vertex of the Minkowski difference together with its source points
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SupportPoint {
    /// `on_a - on_b`
    pub point: Vec3,
    pub on_a: Vec3,
    pub on_b: Vec3,
}

/// Support point of A - B in the world-space `direction`
#[must_use]
pub fn minkowski_support(a: &RigidBody, b: &RigidBody, direction: Vec3) -> SupportPoint {
    let on_a = a.shape.support(&a.transform, direction);
    let on_b = b.shape.support(&b.transform, -direction);
    SupportPoint {
        point: on_a - on_b,
        on_a,
        on_b,
    }
}

/// Up to four support points; the most recently added one is last
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplex {
    points: [SupportPoint; 4],
    len: usize,
}

impl Simplex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn points(&self) -> &[SupportPoint] {
        &self.points[..self.len]
    }

    /// Append a point. A full simplex drops nothing and ignores the push.
    pub fn push(&mut self, point: SupportPoint) {
        if self.len < 4 {
            self.points[self.len] = point;
            self.len += 1;
        }
    }

    fn set(&mut self, points: &[SupportPoint]) {
        self.points[..points.len()].copy_from_slice(points);
        self.len = points.len();
    }

    /// Reduce the simplex to the feature closest to the origin and pick the
    /// next search direction. Returns `true` only once a tetrahedron encloses
    /// the origin or the origin is itself a vertex.
    fn evolve(&mut self, direction: &mut Vec3) -> bool {
        match self.len {
            2 => self.line(direction),
            3 => self.triangle(direction),
            4 => self.tetrahedron(direction),
            _ => false,
        }
    }

    fn line(&mut self, direction: &mut Vec3) -> bool {
        let [b, a, ..] = self.points;
        let ab = b.point - a.point;
        let ao = -a.point;

        if ab.dot(ao) > 0.0 {
            *direction = ab.cross(ao).cross(ab);
            // Origin on the segment: any perpendicular keeps the search going
            let scale = DEGENERATE * ab.length_squared();
            if direction.length_squared() <= scale * scale * ao.length_squared() {
                *direction = ab.any_orthogonal_vector();
            }
        } else {
            self.set(&[a]);
            *direction = ao;
            // Origin is the newest vertex
            return ao.length_squared() < f32::EPSILON * f32::EPSILON;
        }
        false
    }

    fn triangle(&mut self, direction: &mut Vec3) -> bool {
        let [c, b, a, _] = self.points;
        let ab = b.point - a.point;
        let ac = c.point - a.point;
        let ao = -a.point;
        let abc = ab.cross(ac);

        // Collinear points span no plane
        if abc.length_squared() <= DEGENERATE * DEGENERATE * ab.length_squared() * ac.length_squared() {
            self.set(&[b, a]);
            return self.line(direction);
        }

        if abc.cross(ac).dot(ao) > 0.0 {
            if ac.dot(ao) > 0.0 {
                self.set(&[c, a]);
                *direction = ac.cross(ao).cross(ac);
                return false;
            }
            self.set(&[b, a]);
            return self.line(direction);
        }

        if ab.cross(abc).dot(ao) > 0.0 {
            self.set(&[b, a]);
            return self.line(direction);
        }

        // An origin in the triangle's plane still needs a fourth point
        if abc.dot(ao) >= 0.0 {
            *direction = abc;
        } else {
            self.set(&[b, c, a]);
            *direction = -abc;
        }
        false
    }

    fn tetrahedron(&mut self, direction: &mut Vec3) -> bool {
        let [d, c, b, a] = self.points;
        let ao = -a.point;

        for (p, q, opposite) in [(b, c, d), (c, d, b), (d, b, c)] {
            let mut normal = (p.point - a.point).cross(q.point - a.point);
            if normal.dot(opposite.point - a.point) > 0.0 {
                normal = -normal;
            }
            if normal.dot(ao) > 0.0 {
                self.set(&[q, p, a]);
                return self.triangle(direction);
            }
        }
        true
    }
}

/// Run GJK on two convex bodies.
///
/// Returns the final simplex when the Minkowski difference contains the
/// origin, `None` when a separating direction was found or the iteration cap
/// ran out.
#[must_use]
pub fn gjk_intersect(a: &RigidBody, b: &RigidBody, max_iterations: usize) -> Option<Simplex> {
    let mut direction = (a.position - b.position).try_normalize().unwrap_or(Vec3::X);
    let mut simplex = Simplex::new();

    let first = minkowski_support(a, b, direction);
    simplex.push(first);
    direction = -first.point;
    if direction.length_squared() < f32::EPSILON * f32::EPSILON {
        return Some(simplex);
    }

    for _ in 0..max_iterations {
        let next = minkowski_support(a, b, direction);
        if next.point.dot(direction) < 0.0 {
            return None;
        }
        simplex.push(next);
        if simplex.evolve(&mut direction) {
            return Some(simplex);
        }
    }

    tracing::trace!("GJK hit the iteration cap without a verdict");
    None
}
