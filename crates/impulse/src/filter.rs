//! Collision filtering (group/mask system)
//!
//! Every body belongs to zero or more collision groups (`collision_groups`
//! bitmask) and may carry a `collision_mask`. A mask of zero accepts
//! everything. Otherwise bit 0 of the mask selects the mode and never takes
//! part in matching:
//!
//! - bit 0 clear (inclusion): the other body must share at least one group
//!   bit with the mask
//! - bit 0 set (exclusion): the other body must share no group bit with the
//!   mask
//!
//! Both bodies' masks are checked; either one can veto the pair.

use crate::body::RigidBody;

/// Mask bit selecting exclusion mode
pub const MASK_EXCLUDE: u32 = 1;

/// Check if two bodies may generate contacts
#[must_use]
pub fn can_bodies_collide(a: &RigidBody, b: &RigidBody) -> bool {
    // Two static bodies never need contacts
    if a.is_static() && b.is_static() {
        return false;
    }
    mask_accepts(a.collision_mask, b.collision_groups) && mask_accepts(b.collision_mask, a.collision_groups)
}

fn mask_accepts(mask: u32, other_groups: u32) -> bool {
    if mask == 0 {
        return true;
    }
    let shared = mask & !MASK_EXCLUDE & other_groups;
    if mask & MASK_EXCLUDE == 0 {
        shared != 0
    } else {
        shared == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    fn body(mass: f32, groups: u32, mask: u32) -> RigidBody {
        RigidBody::new(Shape::sphere(1.0), mass).with_collision_filter(groups, mask)
    }

    #[test]
    fn test_static_pair_rejected() {
        assert!(!can_bodies_collide(&body(0.0, 0, 0), &body(0.0, 0, 0)));
        assert!(can_bodies_collide(&body(0.0, 0, 0), &body(1.0, 0, 0)));
    }

    #[test]
    fn test_inclusion_mask() {
        let player = body(1.0, 0b0010, 0b0100);
        let enemy = body(1.0, 0b0100, 0);
        let pickup = body(1.0, 0b1000, 0);
        assert!(can_bodies_collide(&player, &enemy));
        assert!(!can_bodies_collide(&player, &pickup));
    }

    #[test]
    fn test_exclusion_mask() {
        let ghost = body(1.0, 0b0010, 0b0100 | MASK_EXCLUDE);
        let wall = body(1.0, 0b0100, 0);
        let floor = body(1.0, 0b1000, 0);
        assert!(!can_bodies_collide(&ghost, &wall));
        assert!(can_bodies_collide(&ghost, &floor));
    }

    #[test]
    fn test_either_side_vetoes() {
        let a = body(1.0, 0b0010, 0);
        let b = body(1.0, 0b0100, 0b1000);
        assert!(!can_bodies_collide(&a, &b));
        assert!(!can_bodies_collide(&b, &a));
    }
}
