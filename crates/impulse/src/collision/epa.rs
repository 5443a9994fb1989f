//! Expanding polytope algorithm
//!
//! Grows the GJK simplex toward the boundary of the Minkowski difference until
//! the closest face stops moving. The normal comes from that face and the
//! depth from the support reach along it. All buffers live in [`EpaScratch`],
//! which the caller owns and reuses between queries.

use glam::Vec3;

use crate::body::RigidBody;
use crate::config::CollisionConfig;

use super::{minkowski_support, Simplex, SupportPoint};

#[derive(Debug, Clone, Copy)]
struct Face {
    indices: [usize; 3],
    normal: Vec3,
    distance: f32,
}

/// Reusable EPA buffers
#[derive(Debug, Default)]
pub struct EpaScratch {
    vertices: Vec<SupportPoint>,
    faces: Vec<Face>,
    horizon: Vec<(usize, usize)>,
}

impl EpaScratch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
        self.horizon.clear();
    }

    /// Build a face with outward winding. Fails on a zero-area triangle.
    fn make_face(&self, mut indices: [usize; 3], interior: Option<Vec3>) -> Option<Face> {
        let [a, b, c] = indices.map(|i| self.vertices[i].point);
        let mut normal = (b - a).cross(c - a).try_normalize()?;
        if let Some(inside) = interior {
            if normal.dot(a - inside) < 0.0 {
                normal = -normal;
                indices.swap(1, 2);
            }
        }
        Some(Face {
            indices,
            normal,
            distance: normal.dot(a),
        })
    }

    fn closest_face(&self) -> Option<usize> {
        self.faces
            .iter()
            .enumerate()
            .min_by(|(_, x), (_, y)| x.distance.total_cmp(&y.distance))
            .map(|(i, _)| i)
    }

    fn add_horizon_edge(&mut self, from: usize, to: usize) {
        if let Some(i) = self.horizon.iter().position(|&(p, q)| p == to && q == from) {
            self.horizon.swap_remove(i);
        } else {
            self.horizon.push((from, to));
        }
    }
}

/// Penetration of A into B: moving B by `normal * depth` separates them
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Penetration {
    /// Unit normal from A toward B
    pub normal: Vec3,
    pub depth: f32,
    /// Deepest point of A, in world space
    pub point_on_a: Vec3,
    /// Deepest point of B, in world space
    pub point_on_b: Vec3,
}

/// Fill a degenerate GJK simplex up to a tetrahedron by trying extra
/// directions
fn complete_simplex(a: &RigidBody, b: &RigidBody, simplex: &Simplex, scratch: &mut EpaScratch) -> bool {
    const AXES: [Vec3; 6] = [Vec3::X, Vec3::Y, Vec3::Z, Vec3::NEG_X, Vec3::NEG_Y, Vec3::NEG_Z];

    scratch.vertices.extend_from_slice(simplex.points());
    if scratch.vertices.is_empty() {
        return false;
    }

    while scratch.vertices.len() < 4 {
        let origin = scratch.vertices[0].point;
        let spans = |p: Vec3, vertices: &[SupportPoint]| match vertices.len() {
            1 => (p - origin).length_squared() > 1.0e-8,
            2 => (vertices[1].point - origin).cross(p - origin).length_squared() > 1.0e-10,
            _ => {
                let n = (vertices[1].point - origin).cross(vertices[2].point - origin);
                n.dot(p - origin).abs() > 1.0e-6
            }
        };

        let mut extended = false;
        for axis in AXES {
            let candidate = minkowski_support(a, b, axis);
            if spans(candidate.point, &scratch.vertices) {
                scratch.vertices.push(candidate);
                extended = true;
                break;
            }
        }
        if !extended {
            return false;
        }
    }
    true
}

/// Barycentric coordinates of `p` projected onto triangle `abc`
fn barycentric(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Option<Vec3> {
    let v0 = b - a;
    let v1 = c - a;
    let v2 = p - a;
    let d00 = v0.dot(v0);
    let d01 = v0.dot(v1);
    let d11 = v1.dot(v1);
    let d20 = v2.dot(v0);
    let d21 = v2.dot(v1);
    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < f32::EPSILON {
        return None;
    }
    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    Some(Vec3::new(1.0 - v - w, v, w))
}

/// Tightest axis seen so far: the face normal with the smallest support reach
#[derive(Debug, Clone, Copy)]
struct Candidate {
    normal: Vec3,
    reach: f32,
    support: SupportPoint,
    face: Option<([SupportPoint; 3], f32)>,
}

impl Candidate {
    fn along(a: &RigidBody, b: &RigidBody, normal: Vec3) -> Self {
        let support = minkowski_support(a, b, normal);
        Self {
            normal,
            reach: support.point.dot(normal),
            support,
            face: None,
        }
    }

    fn keep_tighter(best: &mut Option<Self>, next: Self) {
        match best {
            Some(current) if current.reach <= next.reach => {}
            _ => *best = Some(next),
        }
    }

    /// Witness points satisfy `(point_on_a - point_on_b) . normal == depth`.
    /// A face whose projected origin falls outside it gives way to the raw
    /// support point of A.
    fn into_penetration(self) -> Penetration {
        let depth = self.reach.max(0.0);
        let point_on_a = self
            .face
            .and_then(|([p, q, r], distance)| {
                let weights = barycentric(self.normal * distance, p.point, q.point, r.point)?;
                (weights.min_element() > -1.0e-3).then(|| p.on_a * weights.x + q.on_a * weights.y + r.on_a * weights.z)
            })
            .unwrap_or(self.support.on_a);
        Penetration {
            normal: self.normal,
            depth,
            point_on_a,
            point_on_b: point_on_a - self.normal * depth,
        }
    }
}

impl EpaScratch {
    fn seed_faces(&mut self) -> bool {
        let interior = self.vertices.iter().map(|v| v.point).sum::<Vec3>() * 0.25;
        for indices in [[0, 1, 2], [0, 3, 1], [0, 2, 3], [1, 3, 2]] {
            let Some(face) = self.make_face(indices, Some(interior)) else {
                return false;
            };
            self.faces.push(face);
        }
        true
    }

    /// Add `support` to the polytope. Returns `false` when the point is
    /// already a vertex, sees no face, or would leave a zero-area face; the
    /// polytope must not be expanded further after that.
    fn expand(&mut self, support: SupportPoint) -> bool {
        if self
            .vertices
            .iter()
            .any(|v| (v.point - support.point).length_squared() < DUPLICATE_VERTEX_SQ)
        {
            return false;
        }

        let new_index = self.vertices.len();
        self.vertices.push(support);
        self.horizon.clear();

        let mut i = 0;
        while i < self.faces.len() {
            let f = self.faces[i];
            let on_face = self.vertices[f.indices[0]].point;
            if f.normal.dot(support.point - on_face) > 0.0 {
                let [p, q, r] = f.indices;
                self.add_horizon_edge(p, q);
                self.add_horizon_edge(q, r);
                self.add_horizon_edge(r, p);
                self.faces.swap_remove(i);
            } else {
                i += 1;
            }
        }
        if self.horizon.is_empty() {
            return false;
        }

        for e in 0..self.horizon.len() {
            let (from, to) = self.horizon[e];
            let Some(face) = self.make_face([from, to, new_index], None) else {
                return false;
            };
            self.faces.push(face);
        }
        true
    }
}

/// Two polytope vertices closer than this are the same point
const DUPLICATE_VERTEX_SQ: f32 = 1.0e-12;

/// Expand the GJK result into a penetration normal, depth and witness points.
///
/// Depth is the exact support reach along the chosen normal, so moving B by
/// `normal * depth` always clears A. Expansion stops early on a duplicate
/// vertex or a degenerate horizon and keeps the tightest face found until
/// then. If no polytope can be built at all, the centre line and the world
/// axes are tried instead.
#[must_use]
pub fn epa_penetration(
    a: &RigidBody,
    b: &RigidBody,
    simplex: &Simplex,
    scratch: &mut EpaScratch,
    config: &CollisionConfig,
) -> Penetration {
    scratch.clear();
    let mut best = None;

    if complete_simplex(a, b, simplex, scratch) && scratch.seed_faces() {
        for iteration in 0..=config.epa_max_iterations {
            let Some(closest) = scratch.closest_face() else {
                break;
            };
            let face = scratch.faces[closest];
            let corners = face.indices.map(|i| scratch.vertices[i]);
            let candidate = Candidate {
                face: Some((corners, face.distance)),
                ..Candidate::along(a, b, face.normal)
            };
            Candidate::keep_tighter(&mut best, candidate);

            if candidate.reach - face.distance < config.epa_tolerance
                || iteration == config.epa_max_iterations
                || scratch.faces.len() >= config.epa_max_faces
            {
                break;
            }
            if !scratch.expand(candidate.support) {
                tracing::trace!(iteration, faces = scratch.faces.len(), "EPA expansion degenerated");
                break;
            }
        }
    } else {
        tracing::trace!("EPA could not build an initial tetrahedron");
    }

    let best = best.unwrap_or_else(|| {
        let centre_line = (b.position - a.position).try_normalize().unwrap_or(Vec3::X);
        [centre_line, Vec3::X, Vec3::Y, Vec3::Z, Vec3::NEG_X, Vec3::NEG_Y, Vec3::NEG_Z]
            .into_iter()
            .map(|axis| Candidate::along(a, b, axis))
            .min_by(|x, y| x.reach.total_cmp(&y.reach))
            .unwrap_or_else(|| Candidate::along(a, b, centre_line))
    });
    best.into_penetration()
}
