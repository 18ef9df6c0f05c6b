//! Particle-compound registry: tracks clusters of bound particles as
//! rigid-body aggregates.
//!
//! Each particle keeps a back-pointer `compoundIndex`; a compound tracks
//! its own membership set, bound pairs, and an `active` flag. A compound's
//! *representative particle* (the lowest-indexed member) is derived from
//! its membership set on every query rather than stored, so there is
//! exactly one source of truth.

use glam::{Quat, Vec3};
use std::collections::{BTreeMap, HashSet};

pub struct Compound {
    pub members: HashSet<usize>,
    pub bound_pairs: BTreeMap<(usize, usize), u32>,
    pub size: usize,
    pub position: Vec3,
    pub position_reference: Vec3,
    pub orientation_reference: Quat,
    pub active: bool,
}

impl Compound {
    fn new(i: usize, j: usize, end_state: u32, pos_i: Vec3, pos_j: Vec3, orient_i: Quat) -> Self {
        let diff = pos_j - pos_i;
        let position_reference = pos_i - 0.5 * diff / diff.length();
        let mut members = HashSet::new();
        members.insert(i);
        members.insert(j);
        let mut bound_pairs = BTreeMap::new();
        bound_pairs.insert((i.min(j), i.max(j)), end_state);
        Self {
            members,
            bound_pairs,
            size: 2,
            position: 0.5 * (pos_i + pos_j),
            position_reference,
            orientation_reference: orient_i,
            active: true,
        }
    }

    /// The member particle that carries the compound's rigid-body
    /// kinematics: always the lowest index, derived rather than stored.
    pub fn representative(&self) -> usize {
        *self.members.iter().min().expect("compound has no members")
    }
}

#[derive(Default)]
pub struct CompoundRegistry {
    compounds: Vec<Compound>,
}

impl CompoundRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: usize) -> &Compound {
        &self.compounds[id]
    }

    pub fn len(&self) -> usize {
        self.compounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.compounds.is_empty()
    }

    /// Links particles `i` and `j` under bound state `end_state`, folding
    /// the size-weighted aggregate position update into the same call so
    /// the caller never has to work out which side is the actual joiner.
    /// Returns `(compound_id, main_compound_size)`: `main_compound_size` is
    /// the pre-merge size of the surviving compound.
    pub fn bind(
        &mut self,
        i: usize,
        j: usize,
        end_state: u32,
        compound_of: impl Fn(usize) -> Option<usize>,
        pos_i: Vec3,
        pos_j: Vec3,
        orient_i: Quat,
    ) -> (usize, usize) {
        let pair = (i.min(j), i.max(j));
        match (compound_of(i), compound_of(j)) {
            (None, None) => {
                self.compounds
                    .push(Compound::new(i, j, end_state, pos_i, pos_j, orient_i));
                (self.compounds.len() - 1, 1)
            }
            (Some(c), None) => {
                let main_size = self.join_single(c, j, pos_j);
                self.compounds[c].bound_pairs.insert(pair, end_state);
                (c, main_size)
            }
            (None, Some(c)) => {
                let main_size = self.join_single(c, i, pos_i);
                self.compounds[c].bound_pairs.insert(pair, end_state);
                (c, main_size)
            }
            (Some(ci), Some(cj)) if ci == cj => {
                self.compounds[ci].bound_pairs.insert(pair, end_state);
                (ci, self.compounds[ci].size)
            }
            (Some(ci), Some(cj)) => {
                let (keep, drop) = (ci.min(cj), ci.max(cj));
                let main_size = self.compounds[keep].size;
                let drop_size = self.compounds[drop].size;
                let drop_position = self.compounds[drop].position;
                let absorbed_members: Vec<usize> = self.compounds[drop].members.iter().copied().collect();
                let absorbed_pairs: Vec<((usize, usize), u32)> =
                    self.compounds[drop].bound_pairs.iter().map(|(&k, &v)| (k, v)).collect();
                for m in absorbed_members {
                    self.compounds[keep].members.insert(m);
                }
                for (k, v) in absorbed_pairs {
                    self.compounds[keep].bound_pairs.insert(k, v);
                }
                self.compounds[keep].bound_pairs.insert(pair, end_state);
                self.compounds[keep].size += drop_size;
                self.compounds[keep].position = (main_size as f32 * self.compounds[keep].position
                    + drop_size as f32 * drop_position)
                    / self.compounds[keep].size as f32;
                self.compounds[drop].size = 0;
                self.compounds[drop].active = false;
                (keep, main_size)
            }
        }
    }

    /// Folds a single new member into an existing compound's membership
    /// and size-weighted position. Returns the compound's pre-join size.
    fn join_single(&mut self, compound_id: usize, new_member: usize, new_member_pos: Vec3) -> usize {
        let c = &mut self.compounds[compound_id];
        let main_size = c.size;
        c.members.insert(new_member);
        c.size += 1;
        c.position = (main_size as f32 * c.position + new_member_pos) / c.size as f32;
        main_size
    }

    /// Removes the bound pair `(i,j)` and, if that disconnects the
    /// compound's graph, splits it into two compounds via BFS over
    /// `bound_pairs`. Returns the ids of any newly created compound(s).
    pub fn unbind(&mut self, compound_id: usize, i: usize, j: usize) -> Vec<usize> {
        let pair = (i.min(j), i.max(j));
        self.compounds[compound_id].bound_pairs.remove(&pair);

        let members: Vec<usize> = self.compounds[compound_id].members.iter().copied().collect();
        if members.len() <= 2 {
            self.compounds[compound_id].active = false;
            self.compounds[compound_id].size = 0;
            return Vec::new();
        }

        let adjacency: BTreeMap<usize, Vec<usize>> = {
            let mut adj: BTreeMap<usize, Vec<usize>> = members.iter().map(|&m| (m, Vec::new())).collect();
            for &(a, b) in self.compounds[compound_id].bound_pairs.keys() {
                adj.get_mut(&a).unwrap().push(b);
                adj.get_mut(&b).unwrap().push(a);
            }
            adj
        };

        let reachable_from = |start: usize| -> HashSet<usize> {
            let mut seen = HashSet::new();
            let mut queue = vec![start];
            seen.insert(start);
            while let Some(node) = queue.pop() {
                for &next in adjacency.get(&node).into_iter().flatten() {
                    if seen.insert(next) {
                        queue.push(next);
                    }
                }
            }
            seen
        };

        let group_a = reachable_from(i);
        if group_a.len() == members.len() {
            return Vec::new();
        }
        let group_b: HashSet<usize> = members.iter().copied().filter(|m| !group_a.contains(m)).collect();

        let old_pairs = std::mem::take(&mut self.compounds[compound_id].bound_pairs);
        let (pairs_a, pairs_b): (BTreeMap<_, _>, BTreeMap<_, _>) =
            old_pairs.into_iter().partition(|(&(a, _), _)| group_a.contains(&a));

        self.compounds[compound_id].members = group_a.clone();
        self.compounds[compound_id].bound_pairs = pairs_a;
        self.compounds[compound_id].size = group_a.len();

        let new_id = self.compounds.len();
        self.compounds.push(Compound {
            members: group_b.clone(),
            bound_pairs: pairs_b,
            size: group_b.len(),
            position: self.compounds[compound_id].position,
            position_reference: self.compounds[compound_id].position_reference,
            orientation_reference: self.compounds[compound_id].orientation_reference,
            active: true,
        });

        vec![new_id]
    }

    /// Sweeps inactive compounds out of the registry, returning a map from
    /// old index to new index for every surviving compound (callers must
    /// rewrite `compound_id` on every particle using this map).
    pub fn compact(&mut self) -> BTreeMap<usize, usize> {
        let mut remap = BTreeMap::new();
        let mut kept = Vec::with_capacity(self.compounds.len());
        for (old_id, compound) in self.compounds.drain(..).enumerate() {
            if compound.active {
                remap.insert(old_id, kept.len());
                kept.push(compound);
            }
        }
        self.compounds = kept;
        remap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_bind_creates_a_two_member_compound() {
        let mut reg = CompoundRegistry::new();
        let (id, main_size) = reg.bind(0, 1, 3, |_| None, Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), Quat::IDENTITY);
        assert_eq!(main_size, 1);
        assert_eq!(reg.get(id).size, 2);
        assert!(reg.get(id).members.contains(&0));
        assert!(reg.get(id).members.contains(&1));
    }

    #[test]
    fn single_particle_join_uses_the_new_members_own_position_regardless_of_side() {
        let mut reg = CompoundRegistry::new();
        let (c, _) = reg.bind(0, 1, 1, |_| None, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        // particle 2 joins as `j`; the already-owning side is `i` = 1.
        let membership_for_2 = |p: usize| if p <= 1 { Some(c) } else { None };
        reg.bind(
            1,
            2,
            2,
            membership_for_2,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(4.0, 0.0, 0.0),
            Quat::IDENTITY,
        );
        assert!((reg.get(c).position - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn single_particle_join_from_the_i_side_uses_pos_i_not_pos_j() {
        let mut reg = CompoundRegistry::new();
        let (c, _) = reg.bind(0, 1, 1, |_| None, Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        // particle 2 is the new joiner but passed as `i`; particle 1
        // (already in `c`) is passed as `j`.
        let membership_for_2 = |p: usize| if p == 1 { Some(c) } else { None };
        reg.bind(
            2,
            1,
            2,
            membership_for_2,
            Vec3::new(5.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Quat::IDENTITY,
        );
        let expected = Vec3::new(7.0 / 3.0, 0.0, 0.0);
        assert!((reg.get(c).position - expected).length() < 1e-5, "got {:?}", reg.get(c).position);
    }

    #[test]
    fn merging_two_compounds_keeps_the_lower_id_and_deactivates_the_other() {
        let mut reg = CompoundRegistry::new();
        let (c01, _) = reg.bind(0, 1, 1, |_| None, Vec3::ZERO, Vec3::X, Quat::IDENTITY);
        let (c23, _) = reg.bind(2, 3, 1, |_| None, Vec3::ZERO, Vec3::X, Quat::IDENTITY);
        let membership = |p: usize| if p <= 1 { Some(c01) } else { Some(c23) };
        let (merged, _) = reg.bind(1, 2, 2, membership, Vec3::X, Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        assert_eq!(merged, c01.min(c23));
        let other = c01.max(c23);
        assert!(!reg.get(other).active);
        assert_eq!(reg.get(merged).members.len(), 4);
        assert_eq!(reg.get(merged).size, 4, "size must track the total absorbed membership, not a flat +1");
    }

    #[test]
    fn unbind_disconnecting_a_chain_splits_into_two_compounds() {
        // four-particle chain 1-2-3-4 (0-indexed: 0-1-2-3), unbind (1,2).
        let mut reg = CompoundRegistry::new();
        let (c, _) = reg.bind(0, 1, 1, |_| None, Vec3::ZERO, Vec3::X, Quat::IDENTITY);
        let membership_after_01 = |p: usize| if p <= 1 { Some(c) } else { None };
        let (c, _) = reg.bind(1, 2, 2, membership_after_01, Vec3::X, Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        let membership_after_012 = |p: usize| if p <= 2 { Some(c) } else { None };
        let (c, _) = reg.bind(
            2,
            3,
            3,
            membership_after_012,
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
            Quat::IDENTITY,
        );

        let new_ids = reg.unbind(c, 1, 2);
        assert_eq!(new_ids.len(), 1);
        let split = new_ids[0];
        assert_eq!(reg.get(c).members, HashSet::from([0, 1]));
        assert_eq!(reg.get(split).members, HashSet::from([2, 3]));
    }

    #[test]
    fn compact_removes_inactive_compounds_and_remaps_ids() {
        let mut reg = CompoundRegistry::new();
        let (c01, _) = reg.bind(0, 1, 1, |_| None, Vec3::ZERO, Vec3::X, Quat::IDENTITY);
        let (c23, _) = reg.bind(2, 3, 1, |_| None, Vec3::ZERO, Vec3::X, Quat::IDENTITY);
        let membership = |p: usize| if p <= 1 { Some(c01) } else { Some(c23) };
        reg.bind(1, 2, 2, membership, Vec3::X, Vec3::new(2.0, 0.0, 0.0), Quat::IDENTITY);
        let before = reg.len();
        let remap = reg.compact();
        assert_eq!(reg.len(), before - 1);
        assert!(remap.values().all(|&v| v < reg.len()));
    }
}
