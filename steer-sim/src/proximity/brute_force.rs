use super::{IndexKind, ProximityIndex, ProximityToken, TokenArena};
use crate::error::SteerResult;
use crate::math::Vec3;

#[derive(Debug)]
struct BruteForceEntry {
    key: usize,
    position: Vec3,
}

/// Flat set of every registered agent; queries are an exact linear scan.
#[derive(Debug)]
pub struct BruteForceIndex {
    arena: TokenArena<BruteForceEntry>,
}

impl BruteForceIndex {
    pub fn new() -> Self {
        Self {
            arena: TokenArena::new(),
        }
    }
}

impl Default for BruteForceIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityIndex for BruteForceIndex {
    fn id(&self) -> u64 {
        self.arena.index_id
    }

    fn kind(&self) -> IndexKind {
        IndexKind::BruteForce
    }

    fn allocate_token(&mut self, key: usize, position: Vec3) -> ProximityToken {
        self.arena.insert(BruteForceEntry { key, position })
    }

    fn update_for_new_position(&mut self, token: &ProximityToken, position: Vec3) -> SteerResult<()> {
        let slot = self.arena.check(token)?;
        self.arena.entry_mut(slot).position = position;
        Ok(())
    }

    fn find_neighbors(
        &self,
        token: &ProximityToken,
        center: Vec3,
        max_radius: f32,
        results: &mut Vec<usize>,
    ) -> SteerResult<()> {
        self.arena.check(token)?;
        let radius_sq = max_radius * max_radius;
        results.extend(
            self.arena
                .iter()
                .filter(|entry| (entry.position - center).length_squared() <= radius_sq)
                .map(|entry| entry.key),
        );
        Ok(())
    }

    fn release(&mut self, token: ProximityToken) -> SteerResult<()> {
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

#[cfg(test)]
mod tests {
    use super::BruteForceIndex;
    use crate::math::Vec3;
    use crate::proximity::ProximityIndex;

    #[test]
    fn boundary_distance_is_inclusive() {
        let mut index = BruteForceIndex::new();
        let probe = index.allocate_token(0, Vec3::ZERO);
        index.allocate_token(1, Vec3::new(3.0, 0.0, 4.0));
        index.allocate_token(2, Vec3::new(3.0, 0.0, 4.1));

        let mut found = Vec::new();
        index.find_neighbors(&probe, Vec3::ZERO, 5.0, &mut found).unwrap();
        found.sort_unstable();
        assert_eq!(found, vec![0, 1]);
    }

    #[test]
    fn released_slots_are_reused() {
        let mut index = BruteForceIndex::new();
        let a = index.allocate_token(0, Vec3::ZERO);
        let slot = a.slot();
        index.release(a).unwrap();
        assert!(index.is_empty());
        let b = index.allocate_token(1, Vec3::ZERO);
        assert_eq!(b.slot(), slot);
        assert_eq!(index.len(), 1);
    }
}
