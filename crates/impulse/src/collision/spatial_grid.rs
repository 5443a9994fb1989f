//! Broad-phase collision detection using spatial partitioning
//!
//! Bodies are binned by the bounding box of their bounding sphere into a
//! uniform hash grid; only bodies sharing a cell are tested. Bodies too large
//! for the grid (planes, very long shapes) are tested against everything.

use std::collections::{HashMap, HashSet};

use glam::Vec3;

use crate::aabb::Aabb;
use crate::body::{BodyHandle, BodySet, RigidBody};

use super::{bounding_spheres_overlap, BodyPair, Broadphase};

/// Bodies spanning more cells than this per axis skip the grid
const MAX_CELLS_PER_AXIS: i32 = 8;

type CellKey = [i32; 3];

/// Uniform hash-grid broadphase
#[derive(Debug)]
pub struct GridBroadphase {
    cell_size: f32,
    bodies: Vec<BodyHandle>,
    cells: HashMap<CellKey, Vec<BodyHandle>>,
    oversized: Vec<BodyHandle>,
    checked: HashSet<BodyPair>,
    pairs: Vec<BodyPair>,
}

impl GridBroadphase {
    #[must_use]
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            bodies: Vec::new(),
            cells: HashMap::new(),
            oversized: Vec::new(),
            checked: HashSet::new(),
            pairs: Vec::new(),
        }
    }

    #[must_use]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Number of non-empty cells after the last prediction
    #[must_use]
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|cell| !cell.is_empty()).count()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn world_to_grid(&self, point: Vec3) -> CellKey {
        let scaled = (point / self.cell_size).floor();
        [scaled.x as i32, scaled.y as i32, scaled.z as i32]
    }

    /// Insert a body into every cell its bounding sphere touches. Returns
    /// `false` if the body is too large for the grid.
    fn insert(&mut self, handle: BodyHandle, body: &RigidBody) -> bool {
        if !body.bounding_radius.is_finite() {
            return false;
        }
        let bounds = Aabb::from_center_half_extents(body.position, Vec3::splat(body.bounding_radius));
        let min = self.world_to_grid(bounds.min);
        let max = self.world_to_grid(bounds.max);
        if (0..3).any(|axis| max[axis] - min[axis] >= MAX_CELLS_PER_AXIS) {
            return false;
        }

        for z in min[2]..=max[2] {
            for y in min[1]..=max[1] {
                for x in min[0]..=max[0] {
                    self.cells.entry([x, y, z]).or_default().push(handle);
                }
            }
        }
        true
    }

    fn push_if_overlapping(
        checked: &mut HashSet<BodyPair>,
        pairs: &mut Vec<BodyPair>,
        bodies: &BodySet,
        a: BodyHandle,
        b: BodyHandle,
    ) {
        if a == b {
            return;
        }
        let pair = BodyPair::new(a, b);
        if checked.contains(&pair) {
            return;
        }
        if let (Some(body_a), Some(body_b)) = (bodies.get(a), bodies.get(b)) {
            checked.insert(pair);
            if bounding_spheres_overlap(body_a, body_b) {
                pairs.push(pair);
            }
        }
    }
}

impl Broadphase for GridBroadphase {
    fn add_body(&mut self, handle: BodyHandle) {
        if !self.bodies.contains(&handle) {
            self.bodies.push(handle);
        }
    }

    fn remove_body(&mut self, handle: BodyHandle) {
        if let Some(index) = self.bodies.iter().position(|h| *h == handle) {
            self.bodies.swap_remove(index);
        } else {
            tracing::warn!("removing unregistered body {:?} from grid broadphase", handle);
        }
    }

    fn predict_contact_pairs(&mut self, bodies: &BodySet) -> &[BodyPair] {
        self.pairs.clear();
        self.checked.clear();
        self.oversized.clear();
        self.cells.retain(|_, cell| !cell.is_empty());
        for cell in self.cells.values_mut() {
            cell.clear();
        }

        for i in 0..self.bodies.len() {
            let handle = self.bodies[i];
            let Some(body) = bodies.get(handle) else {
                continue;
            };
            if !self.insert(handle, body) {
                self.oversized.push(handle);
            }
        }

        for cell in self.cells.values() {
            for (i, &a) in cell.iter().enumerate() {
                for &b in &cell[i + 1..] {
                    Self::push_if_overlapping(&mut self.checked, &mut self.pairs, bodies, a, b);
                }
            }
        }

        for &a in &self.oversized {
            for &b in &self.bodies {
                Self::push_if_overlapping(&mut self.checked, &mut self.pairs, bodies, a, b);
            }
        }

        // Hash iteration order is arbitrary; keep the output deterministic
        self.pairs.sort_unstable();
        &self.pairs
    }

    fn body_count(&self) -> usize {
        self.bodies.len()
    }
}
