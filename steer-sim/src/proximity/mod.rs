//! Proximity databases: "which agents are near this point" queries.
//!
//! Two interchangeable variants share one contract. [`LatticeIndex`] buckets
//! agents into a fixed grid of cells and answers queries with every agent in
//! the cells overlapping the query sphere, so its answers are a superset of
//! the exact neighborhood. [`BruteForceIndex`] scans every agent and applies
//! an exact distance test; it is the reference the lattice is checked against.
//!
//! An index hands out a [`ProximityToken`] per registered agent. Tokens are
//! move-only and `release` consumes them, so a token can never be used after
//! release or released twice. Using a token against an index that did not
//! issue it is reported as [`SteerError::ForeignToken`].

mod brute_force;
mod lattice;

pub use brute_force::BruteForceIndex;
pub use lattice::{LatticeConfig, LatticeIndex};

use crate::error::{SteerError, SteerResult};
use crate::math::Vec3;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_INDEX_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexKind {
    #[default]
    Lattice,
    BruteForce,
}

impl IndexKind {
    pub fn next(self) -> Self {
        match self {
            Self::Lattice => Self::BruteForce,
            Self::BruteForce => Self::Lattice,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Lattice => "lattice",
            Self::BruteForce => "brute force",
        }
    }
}

/// Handle binding one agent to the index that issued it.
#[derive(Debug, PartialEq, Eq)]
pub struct ProximityToken {
    slot: usize,
    index_id: u64,
}

impl ProximityToken {
    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn index_id(&self) -> u64 {
        self.index_id
    }
}

pub trait ProximityIndex {
    fn id(&self) -> u64;

    fn kind(&self) -> IndexKind;

    /// Registers the agent identified by `key` at `position`.
    fn allocate_token(&mut self, key: usize, position: Vec3) -> ProximityToken;

    fn update_for_new_position(&mut self, token: &ProximityToken, position: Vec3) -> SteerResult<()>;

    /// Appends the keys of agents near `center` to `results`. The querying
    /// agent's own key is included when it is in range.
    fn find_neighbors(
        &self,
        token: &ProximityToken,
        center: Vec3,
        max_radius: f32,
        results: &mut Vec<usize>,
    ) -> SteerResult<()>;

    /// Removes the agent from the index.
    fn release(&mut self, token: ProximityToken) -> SteerResult<()>;

    /// Last position pushed for this token.
    fn position_of(&self, token: &ProximityToken) -> SteerResult<Vec3>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn new_index(kind: IndexKind, lattice: &LatticeConfig) -> SteerResult<Box<dyn ProximityIndex>> {
    Ok(match kind {
        IndexKind::Lattice => Box::new(LatticeIndex::new(lattice)?),
        IndexKind::BruteForce => Box::new(BruteForceIndex::new()),
    })
}

/// Slot storage shared by both index variants.
#[derive(Debug)]
struct TokenArena<T> {
    index_id: u64,
    slots: Vec<Option<T>>,
    free: Vec<usize>,
    live: usize,
}

impl<T> TokenArena<T> {
    fn new() -> Self {
        Self {
            index_id: NEXT_INDEX_ID.fetch_add(1, Ordering::Relaxed),
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
        }
    }

    fn insert(&mut self, value: T) -> ProximityToken {
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(value);
                slot
            }
            None => {
                self.slots.push(Some(value));
                self.slots.len() - 1
            }
        };
        self.live += 1;
        ProximityToken {
            slot,
            index_id: self.index_id,
        }
    }

    fn check(&self, token: &ProximityToken) -> SteerResult<usize> {
        let issued_here = token.index_id == self.index_id
            && matches!(self.slots.get(token.slot), Some(Some(_)));
        if !issued_here {
            return Err(SteerError::ForeignToken {
                slot: token.slot,
                index_id: self.index_id,
            });
        }
        Ok(token.slot)
    }

    fn get(&self, token: &ProximityToken) -> SteerResult<&T> {
        let slot = self.check(token)?;
        Ok(self.entry(slot))
    }

    fn remove(&mut self, token: ProximityToken) -> SteerResult<T> {
        let slot = self.check(&token)?;
        let value = self.slots[slot].take();
        self.free.push(slot);
        self.live -= 1;
        value.ok_or(SteerError::ForeignToken {
            slot,
            index_id: self.index_id,
        })
    }

    fn entry(&self, slot: usize) -> &T {
        match &self.slots[slot] {
            Some(value) => value,
            None => unreachable!("slot {slot} is linked but empty"),
        }
    }

    fn entry_mut(&mut self, slot: usize) -> &mut T {
        match &mut self.slots[slot] {
            Some(value) => value,
            None => unreachable!("slot {slot} is linked but empty"),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }
}
