use super::{IndexKind, ProximityIndex, ProximityToken, TokenArena};
use crate::error::{SteerError, SteerResult};
use crate::math::Vec3;
use serde::{Deserialize, Serialize};

const INVALID_INDEX: usize = usize::MAX;
pub const MAX_LATTICE_CELLS: usize = 1 << 24;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatticeConfig {
    pub center: Vec3,
    pub dimensions: Vec3,
    pub divisions: [usize; 3],
}

impl Default for LatticeConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            dimensions: Vec3::new(80.0, 1.0, 80.0),
            divisions: [20, 1, 20],
        }
    }
}

impl LatticeConfig {
    pub fn validate(&self) -> SteerResult<()> {
        if self.divisions.iter().any(|&d| d == 0) {
            return Err(SteerError::InvalidConfig {
                reason: format!("lattice divisions must be non-zero, got {:?}", self.divisions),
            });
        }
        self.cell_count()?;
        let d = self.dimensions;
        if !(d.is_finite() && d.x > 0.0 && d.y > 0.0 && d.z > 0.0) || !self.center.is_finite() {
            return Err(SteerError::InvalidConfig {
                reason: format!("lattice dimensions must be positive, got {d:?}"),
            });
        }
        Ok(())
    }

    /// Total number of cells, rejected when it overflows or exceeds
    /// [`MAX_LATTICE_CELLS`].
    pub fn cell_count(&self) -> SteerResult<usize> {
        let [dx, dy, dz] = self.divisions;
        dx.checked_mul(dy)
            .and_then(|n| n.checked_mul(dz))
            .filter(|&n| n <= MAX_LATTICE_CELLS)
            .ok_or_else(|| SteerError::InvalidConfig {
                reason: format!(
                    "lattice divisions {:?} exceed {MAX_LATTICE_CELLS} cells",
                    self.divisions
                ),
            })
    }
}

#[derive(Debug)]
struct LatticeEntry {
    key: usize,
    position: Vec3,
    cell: usize,
    prev: usize,
    next: usize,
}

/// Fixed grid of buckets over a cuboid. Each cell holds an intrusive
/// doubly-linked list of arena slots, so moving an agent between cells is
/// O(1). Positions outside the cuboid land in the nearest boundary cell.
#[derive(Debug)]
pub struct LatticeIndex {
    arena: TokenArena<LatticeEntry>,
    origin: Vec3,
    cell_size: Vec3,
    divisions: [usize; 3],
    head: Vec<usize>,
}

impl LatticeIndex {
    pub fn new(config: &LatticeConfig) -> SteerResult<Self> {
        config.validate()?;
        let cells = config.cell_count()?;
        let [dx, dy, dz] = config.divisions;
        let dims = config.dimensions;
        Ok(Self {
            arena: TokenArena::new(),
            origin: config.center - dims * 0.5,
            cell_size: Vec3::new(dims.x / dx as f32, dims.y / dy as f32, dims.z / dz as f32),
            divisions: config.divisions,
            head: vec![INVALID_INDEX; cells],
        })
    }

    pub fn cell_count(&self) -> usize {
        self.head.len()
    }

    fn cell_coords(&self, position: Vec3) -> [usize; 3] {
        let local = position - self.origin;
        [
            axis_cell(local.x, self.cell_size.x, self.divisions[0]),
            axis_cell(local.y, self.cell_size.y, self.divisions[1]),
            axis_cell(local.z, self.cell_size.z, self.divisions[2]),
        ]
    }

    fn cell_index(&self, [ix, iy, iz]: [usize; 3]) -> usize {
        (ix * self.divisions[1] + iy) * self.divisions[2] + iz
    }

    fn cell_for_position(&self, position: Vec3) -> usize {
        self.cell_index(self.cell_coords(position))
    }

    fn link(&mut self, slot: usize, cell: usize) {
        let old_head = self.head[cell];
        {
            let entry = self.arena.entry_mut(slot);
            entry.cell = cell;
            entry.prev = INVALID_INDEX;
            entry.next = old_head;
        }
        if old_head != INVALID_INDEX {
            self.arena.entry_mut(old_head).prev = slot;
        }
        self.head[cell] = slot;
    }

    fn unlink(&mut self, slot: usize) {
        let (cell, prev, next) = {
            let entry = self.arena.entry(slot);
            (entry.cell, entry.prev, entry.next)
        };
        if prev == INVALID_INDEX {
            self.head[cell] = next;
        } else {
            self.arena.entry_mut(prev).next = next;
        }
        if next != INVALID_INDEX {
            self.arena.entry_mut(next).prev = prev;
        }
    }

    fn scan_cell(&self, cell: usize, results: &mut Vec<usize>) {
        let mut candidate = self.head[cell];
        while candidate != INVALID_INDEX {
            let entry = self.arena.entry(candidate);
            results.push(entry.key);
            candidate = entry.next;
        }
    }
}

impl ProximityIndex for LatticeIndex {
    fn id(&self) -> u64 {
        self.arena.index_id
    }

    fn kind(&self) -> IndexKind {
        IndexKind::Lattice
    }

    fn allocate_token(&mut self, key: usize, position: Vec3) -> ProximityToken {
        let cell = self.cell_for_position(position);
        let token = self.arena.insert(LatticeEntry {
            key,
            position,
            cell,
            prev: INVALID_INDEX,
            next: INVALID_INDEX,
        });
        self.link(token.slot, cell);
        token
    }

    fn update_for_new_position(&mut self, token: &ProximityToken, position: Vec3) -> SteerResult<()> {
        let slot = self.arena.check(token)?;
        let new_cell = self.cell_for_position(position);
        let old_cell = self.arena.entry(slot).cell;
        self.arena.entry_mut(slot).position = position;
        if new_cell != old_cell {
            self.unlink(slot);
            self.link(slot, new_cell);
        }
        Ok(())
    }

    /// Collects every agent in the cells overlapping the bounding box of the
    /// query sphere. No per-agent distance test is applied; callers filter.
    fn find_neighbors(
        &self,
        token: &ProximityToken,
        center: Vec3,
        max_radius: f32,
        results: &mut Vec<usize>,
    ) -> SteerResult<()> {
        self.arena.check(token)?;
        let radius = Vec3::new(1.0, 1.0, 1.0) * max_radius.max(0.0);
        let min = self.cell_coords(center - radius);
        let max = self.cell_coords(center + radius);

        for ix in min[0]..=max[0] {
            for iy in min[1]..=max[1] {
                for iz in min[2]..=max[2] {
                    self.scan_cell(self.cell_index([ix, iy, iz]), results);
                }
            }
        }
        Ok(())
    }

    fn release(&mut self, token: ProximityToken) -> SteerResult<()> {
        let slot = self.arena.check(&token)?;
        self.unlink(slot);
        self.arena.remove(token)?;
        Ok(())
    }

    fn position_of(&self, token: &ProximityToken) -> SteerResult<Vec3> {
        Ok(self.arena.get(token)?.position)
    }

    fn len(&self) -> usize {
        self.arena.live
    }
}

fn axis_cell(local: f32, cell_size: f32, divisions: usize) -> usize {
    let cell = (local / cell_size).floor();
    if cell.is_nan() || cell < 0.0 {
        return 0;
    }
    (cell as usize).min(divisions - 1)
}
