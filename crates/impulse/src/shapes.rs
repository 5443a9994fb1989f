//! Collision shapes
//!
//! Shapes are described in body-local space. The narrow phase only needs two
//! things from a convex shape: its kind (to pick a closed-form test when one
//! exists) and its support point in a given direction (for the general GJK/EPA
//! path). Mass distribution helpers are provided so bodies can be created from
//! a shape and a mass.

use glam::{Affine3A, Mat3, Vec3};

use crate::aabb::Aabb;
use crate::error::PhysicsError;

/// Primitive shape types for narrow-phase dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Sphere,
    Box,
    Cylinder,
    Cone,
    ConvexHull,
    Plane,
    LineSwept,
}

/// Unified interface for anything GJK can query
pub trait SupportMap {
    /// Point of the shape furthest along `direction`, in the shape's local
    /// frame. `direction` does not need to be normalized.
    fn support_local(&self, direction: Vec3) -> Vec3;

    /// Point of the shape furthest along the world-space `direction`, for a
    /// shape placed by the rigid `transform`.
    fn support(&self, transform: &Affine3A, direction: Vec3) -> Vec3 {
        let local_direction = Mat3::from(transform.matrix3).transpose() * direction;
        transform.transform_point3(self.support_local(local_direction))
    }
}

/// Collision shape attached to a rigid body
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Sphere {
        radius: f32,
    },
    Box {
        half_extents: Vec3,
    },
    /// Cylinder aligned with the local Y axis
    Cylinder {
        radius: f32,
        half_height: f32,
    },
    /// Cone aligned with the local Y axis, apex at `+half_height`
    Cone {
        radius: f32,
        half_height: f32,
    },
    /// An empty point list acts as a single point at the origin
    ConvexHull {
        points: Vec<Vec3>,
    },
    /// Static half-space through the body origin. `normal` points out of the
    /// solid side.
    Plane {
        normal: Vec3,
    },
    /// Inner shape swept along the local segment `start..end`
    LineSwept {
        start: Vec3,
        end: Vec3,
        shape: Box<Shape>,
    },
}

impl Shape {
    #[must_use]
    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    #[must_use]
    pub fn cuboid(half_extents: Vec3) -> Self {
        Self::Box { half_extents }
    }

    #[must_use]
    pub fn cylinder(radius: f32, half_height: f32) -> Self {
        Self::Cylinder { radius, half_height }
    }

    #[must_use]
    pub fn cone(radius: f32, half_height: f32) -> Self {
        Self::Cone { radius, half_height }
    }

    /// Convex hull of a point cloud. Support queries scan every point, so the
    /// cloud does not have to be reduced to hull vertices first.
    ///
    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidShape`] if `points` is empty.
    pub fn convex_hull(points: Vec<Vec3>) -> Result<Self, PhysicsError> {
        if points.is_empty() {
            return Err(PhysicsError::InvalidShape("convex hull needs at least one point"));
        }
        Ok(Self::ConvexHull { points })
    }

    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidShape`] for a zero-length normal.
    pub fn plane(normal: Vec3) -> Result<Self, PhysicsError> {
        let normal = normal
            .try_normalize()
            .ok_or(PhysicsError::InvalidShape("plane normal must be non-zero"))?;
        Ok(Self::Plane { normal })
    }

    /// # Errors
    ///
    /// Returns [`PhysicsError::InvalidShape`] if the inner shape is unbounded.
    pub fn line_swept(start: Vec3, end: Vec3, shape: Shape) -> Result<Self, PhysicsError> {
        if matches!(shape, Shape::Plane { .. }) {
            return Err(PhysicsError::InvalidShape("cannot sweep an unbounded shape"));
        }
        Ok(Self::LineSwept {
            start,
            end,
            shape: Box::new(shape),
        })
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Shape::Sphere { .. } => ShapeKind::Sphere,
            Shape::Box { .. } => ShapeKind::Box,
            Shape::Cylinder { .. } => ShapeKind::Cylinder,
            Shape::Cone { .. } => ShapeKind::Cone,
            Shape::ConvexHull { .. } => ShapeKind::ConvexHull,
            Shape::Plane { .. } => ShapeKind::Plane,
            Shape::LineSwept { .. } => ShapeKind::LineSwept,
        }
    }

    /// Local-space bounding box
    #[must_use]
    pub fn local_aabb(&self) -> Aabb {
        match self {
            Shape::Sphere { radius } => Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(*radius)),
            Shape::Box { half_extents } => Aabb::from_center_half_extents(Vec3::ZERO, *half_extents),
            Shape::Cylinder { radius, half_height } | Shape::Cone { radius, half_height } => {
                Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(*radius, *half_height, *radius))
            }
            Shape::ConvexHull { points } => {
                let first = points.first().copied().unwrap_or(Vec3::ZERO);
                points
                    .iter()
                    .skip(1)
                    .fold(Aabb::new(first, first), |acc, p| acc.union(&Aabb::new(*p, *p)))
            }
            Shape::Plane { .. } => Aabb::EVERYTHING,
            Shape::LineSwept { start, end, shape } => {
                let inner = shape.local_aabb();
                let at_start = Aabb::new(inner.min + *start, inner.max + *start);
                let at_end = Aabb::new(inner.min + *end, inner.max + *end);
                at_start.union(&at_end)
            }
        }
    }

    /// Radius of a sphere centred on the body origin that encloses the shape
    #[must_use]
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Shape::Sphere { radius } => *radius,
            Shape::Box { half_extents } => half_extents.length(),
            Shape::Cylinder { radius, half_height } | Shape::Cone { radius, half_height } => {
                (radius * radius + half_height * half_height).sqrt()
            }
            Shape::ConvexHull { points } => points.iter().map(|p| p.length()).fold(0.0, f32::max),
            Shape::Plane { .. } => f32::INFINITY,
            Shape::LineSwept { start, end, shape } => {
                shape.bounding_radius() + start.length().max(end.length())
            }
        }
    }

    /// Local inertia tensor of a solid of the given mass.
    ///
    /// Hull inertia is approximated by the inertia of its bounding box.
    #[must_use]
    pub fn inertia(&self, mass: f32) -> Mat3 {
        match self {
            Shape::Sphere { radius } => Mat3::from_diagonal(Vec3::splat(0.4 * mass * radius * radius)),
            Shape::Box { half_extents } => box_inertia(mass, *half_extents),
            Shape::Cylinder { radius, half_height } => {
                let height = 2.0 * half_height;
                let side = mass * (3.0 * radius * radius + height * height) / 12.0;
                Mat3::from_diagonal(Vec3::new(side, 0.5 * mass * radius * radius, side))
            }
            Shape::Cone { radius, half_height } => {
                let height = 2.0 * half_height;
                let side = mass * (0.15 * radius * radius + 0.0375 * height * height);
                Mat3::from_diagonal(Vec3::new(side, 0.3 * mass * radius * radius, side))
            }
            Shape::ConvexHull { .. } => box_inertia(mass, self.local_aabb().half_extents()),
            Shape::Plane { .. } => Mat3::ZERO,
            Shape::LineSwept { shape, .. } => shape.inertia(mass),
        }
    }
}

fn box_inertia(mass: f32, half_extents: Vec3) -> Mat3 {
    let sq = half_extents * half_extents;
    Mat3::from_diagonal(Vec3::new(sq.y + sq.z, sq.x + sq.z, sq.x + sq.y) * (mass / 3.0))
}

impl SupportMap for Shape {
    /// Planes have no finite support point; they are handled by closed-form
    /// tests and this returns the plane origin.
    fn support_local(&self, direction: Vec3) -> Vec3 {
        match self {
            Shape::Sphere { radius } => direction.try_normalize().unwrap_or(Vec3::X) * *radius,
            Shape::Box { half_extents } => Vec3::new(
                half_extents.x.copysign(direction.x),
                half_extents.y.copysign(direction.y),
                half_extents.z.copysign(direction.z),
            ),
            Shape::Cylinder { radius, half_height } => {
                let y = half_height.copysign(direction.y);
                let xz = Vec3::new(direction.x, 0.0, direction.z);
                let xz_length = xz.length();
                // Pure vertical direction: any point of the cap works
                if xz_length < 1.0e-6 {
                    return Vec3::new(0.0, y, 0.0);
                }
                let rim = xz * (*radius / xz_length);
                Vec3::new(rim.x, y, rim.z)
            }
            Shape::Cone { radius, half_height } => {
                let height = 2.0 * half_height;
                let sin_angle = radius / (radius * radius + height * height).sqrt();
                if direction.y > direction.length() * sin_angle {
                    return Vec3::new(0.0, *half_height, 0.0);
                }
                let sigma = (direction.x * direction.x + direction.z * direction.z).sqrt();
                if sigma > 1.0e-6 {
                    Vec3::new(radius * direction.x / sigma, -half_height, radius * direction.z / sigma)
                } else {
                    Vec3::new(0.0, -half_height, 0.0)
                }
            }
            Shape::ConvexHull { points } => {
                let mut best = points.first().copied().unwrap_or(Vec3::ZERO);
                let mut best_dot = best.dot(direction);
                for p in points.iter().skip(1) {
                    let d = p.dot(direction);
                    if d > best_dot {
                        best_dot = d;
                        best = *p;
                    }
                }
                best
            }
            Shape::Plane { .. } => Vec3::ZERO,
            Shape::LineSwept { start, end, shape } => {
                let offset = if direction.dot(*end) > direction.dot(*start) { *end } else { *start };
                shape.support_local(direction) + offset
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_sphere_support() {
        let s = Shape::sphere(2.0);
        assert!((s.support_local(Vec3::new(0.0, 5.0, 0.0)) - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_box_support_picks_corner() {
        let b = Shape::cuboid(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(b.support_local(Vec3::new(1.0, -1.0, 1.0)), Vec3::new(1.0, -2.0, 3.0));
    }

    #[test]
    fn test_rotated_support_in_world() {
        let b = Shape::cuboid(Vec3::new(2.0, 1.0, 1.0));
        let t = Affine3A::from_rotation_translation(
            Quat::from_rotation_z(std::f32::consts::FRAC_PI_2),
            Vec3::new(0.0, 10.0, 0.0),
        );
        // Local X now points along world Y
        let p = b.support(&t, Vec3::Y);
        assert!((p.y - 12.0).abs() < 1e-5);
    }

    #[test]
    fn test_cone_apex_and_base() {
        let c = Shape::cone(1.0, 1.0);
        assert_eq!(c.support_local(Vec3::Y), Vec3::new(0.0, 1.0, 0.0));
        let base = c.support_local(Vec3::new(1.0, -0.1, 0.0));
        assert!((base - Vec3::new(1.0, -1.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_line_swept_support_takes_far_end() {
        let s = Shape::line_swept(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), Shape::sphere(1.0)).unwrap();
        let p = s.support_local(Vec3::X);
        assert!((p - Vec3::new(6.0, 0.0, 0.0)).length() < 1e-6);
        let q = s.support_local(-Vec3::X);
        assert!((q - Vec3::new(-1.0, 0.0, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        assert!(Shape::convex_hull(Vec::new()).is_err());
        assert!(Shape::plane(Vec3::ZERO).is_err());
        let plane = Shape::plane(Vec3::Y).unwrap();
        assert!(Shape::line_swept(Vec3::ZERO, Vec3::X, plane).is_err());
    }

    #[test]
    fn test_empty_hull_collapses_to_origin() {
        let hull = Shape::ConvexHull { points: Vec::new() };
        assert_eq!(hull.support_local(Vec3::new(1.0, -2.0, 0.5)), Vec3::ZERO);
        let aabb = hull.local_aabb();
        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::ZERO);
        assert_eq!(hull.bounding_radius(), 0.0);
    }
}
