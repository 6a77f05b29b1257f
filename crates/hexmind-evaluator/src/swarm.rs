//! Swarm clustering of friendly units.
//!
//! Friendly units are partitioned into bounded clusters whose centroids feed
//! the formation and cohesion terms. The partition is deliberately cheap:
//!
//! - Clusters are rebuilt wholesale only when the number of tracked units
//!   changes (a unit died or arrived); otherwise only centroids are refreshed
//!   from the latest positions.
//! - Rebuilding sorts units by role ordinal so similar roles group together,
//!   then greedily consumes the sorted list into clusters of the optimal
//!   size (see [`SwarmContext::optimal_cluster_size`]).
//! - Membership is hard-capped at [`MAX_CLUSTER_SIZE`].
//!
//! Centroids are the mean of member positions in cube coordinates, rounded
//! to the nearest valid hex. [`SwarmContext::cluster_for`] falls back to a
//! lazily created singleton cluster for a unit that was never assigned.
//!
//! A `SwarmContext` mutates in place as evaluations occur and must not be
//! shared across concurrent evaluations of the same cost function.

use std::collections::HashMap;

use arrayvec::ArrayVec;
use hexmind_engine::{CubeCoord, FractionalCube, HexCoord, UnitId, UnitSnapshot};

use crate::cost_function::UnitStates;

/// Hard cap on cluster membership.
pub const MAX_CLUSTER_SIZE: usize = 6;

/// A bounded group of allied units with a geometric centroid.
#[derive(Debug, Clone)]
pub struct SwarmCluster {
    members: ArrayVec<UnitId, MAX_CLUSTER_SIZE>,
    centroid: HexCoord,
}

impl SwarmCluster {
    fn from_units(units: &[&UnitSnapshot]) -> Self {
        let members = units.iter().map(|u| u.id).collect();
        let centroid = centroid_of(units.iter().map(|u| u.position));
        Self { members, centroid }
    }

    #[must_use]
    pub fn members(&self) -> &[UnitId] {
        &self.members
    }

    #[must_use]
    pub fn centroid(&self) -> HexCoord {
        self.centroid
    }

    #[must_use]
    pub fn contains(&self, id: UnitId) -> bool {
        self.members.contains(&id)
    }

    fn refresh_centroid(&mut self, states: &UnitStates) {
        let positions: Vec<HexCoord> = self
            .members
            .iter()
            .filter_map(|id| states.get(id).map(|u| u.position))
            .collect();
        if !positions.is_empty() {
            self.centroid = centroid_of(positions.into_iter());
        }
    }
}

fn centroid_of<I>(positions: I) -> HexCoord
where
    I: Iterator<Item = HexCoord>,
{
    HexCoord::from(FractionalCube::mean(positions.map(CubeCoord::from)).round())
}

/// Partitions one side's units into clusters and keeps centroids current.
#[derive(Debug, Clone, Default)]
pub struct SwarmContext {
    clusters: Vec<SwarmCluster>,
    assignment: HashMap<UnitId, usize>,
    tracked: usize,
}

impl SwarmContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Preferred cluster size for `total` tracked units: 4 when the total is
    /// small or divides evenly by 4, then 5 when it divides by 5, otherwise
    /// whichever of 4 or 5 leaves the smaller remainder (ties go to 4).
    #[must_use]
    pub fn optimal_cluster_size(total: usize) -> usize {
        if total <= 4 || total.is_multiple_of(4) {
            4
        } else if total.is_multiple_of(5) {
            5
        } else if total % 4 <= total % 5 {
            4
        } else {
            5
        }
    }

    /// Brings clusters in line with the units of `owner` in `states`.
    ///
    /// Rebuilds the whole partition only when the tracked unit count changed;
    /// otherwise refreshes centroids in place.
    pub fn update(&mut self, states: &UnitStates, owner: u32) {
        let mut friendly: Vec<&UnitSnapshot> =
            states.values().filter(|u| u.owner == owner).collect();
        if friendly.len() == self.tracked {
            for cluster in &mut self.clusters {
                cluster.refresh_centroid(states);
            }
            return;
        }

        friendly.sort_by_key(|u| (u.role.ordinal(), u.id));
        let size = Self::optimal_cluster_size(friendly.len()).min(MAX_CLUSTER_SIZE);
        self.clusters = friendly
            .chunks(size)
            .map(SwarmCluster::from_units)
            .collect();
        self.assignment = self
            .clusters
            .iter()
            .enumerate()
            .flat_map(|(i, c)| c.members().iter().map(move |id| (*id, i)))
            .collect();
        self.tracked = friendly.len();
    }

    /// The cluster `unit` belongs to.
    ///
    /// A unit that was never assigned gets a lazily created singleton
    /// cluster centred on its own position.
    pub fn cluster_for(&mut self, unit: &UnitSnapshot) -> &SwarmCluster {
        let index = match self.assignment.get(&unit.id) {
            Some(index) => *index,
            None => {
                let mut members = ArrayVec::new();
                members.push(unit.id);
                self.clusters.push(SwarmCluster {
                    members,
                    centroid: unit.position,
                });
                let index = self.clusters.len() - 1;
                self.assignment.insert(unit.id, index);
                index
            }
        };
        &self.clusters[index]
    }

    #[must_use]
    pub fn clusters(&self) -> &[SwarmCluster] {
        &self.clusters
    }
}

#[cfg(test)]
mod tests {
    use hexmind_engine::{Facing, UnitRole};

    use super::*;

    fn unit(id: UnitId, owner: u32, role: UnitRole, position: HexCoord) -> UnitSnapshot {
        UnitSnapshot {
            id,
            position,
            facing: Facing::North,
            owner,
            role,
            armor_fraction: 1.0,
            internal_fraction: 1.0,
            max_weapon_range: 10,
            max_damage: 10.0,
            crippled: false,
            jump_capable: false,
        }
    }

    fn states_of(units: Vec<UnitSnapshot>) -> UnitStates {
        units.into_iter().map(|u| (u.id, u)).collect()
    }

    #[test]
    fn test_optimal_cluster_size_table() {
        let expected = [
            (1, 4),
            (2, 4),
            (3, 4),
            (4, 4),
            (5, 5),
            (6, 5),
            (7, 5),
            (8, 4),
            (9, 4),
            (10, 5),
            (11, 5),
            (12, 4),
            (13, 4),
            (14, 4),
            (15, 5),
            (16, 4),
            (17, 4),
            (18, 4),
            (19, 4),
            (20, 4),
        ];
        for (total, size) in expected {
            assert_eq!(
                SwarmContext::optimal_cluster_size(total),
                size,
                "total = {total}"
            );
        }
    }

    #[test]
    fn test_clusters_group_by_role_and_respect_cap() {
        let units: Vec<_> = (0..10)
            .map(|i| {
                let role = if i < 5 { UnitRole::Scout } else { UnitRole::Brawler };
                unit(i, 0, role, HexCoord::new(i as i32, 0))
            })
            .collect();
        let states = states_of(units);
        let mut swarm = SwarmContext::new();
        swarm.update(&states, 0);

        assert_eq!(swarm.clusters().len(), 2);
        for cluster in swarm.clusters() {
            assert!(cluster.members().len() <= MAX_CLUSTER_SIZE);
        }
        // Role-sorted greedy consumption puts all scouts in the first cluster.
        let first = &swarm.clusters()[0];
        assert!((0..5).all(|id| first.contains(id)));
    }

    #[test]
    fn test_same_count_refreshes_centroids_without_rebuilding() {
        let states = states_of(vec![
            unit(1, 0, UnitRole::Scout, HexCoord::new(0, 0)),
            unit(2, 0, UnitRole::Scout, HexCoord::new(2, 0)),
        ]);
        let mut swarm = SwarmContext::new();
        swarm.update(&states, 0);
        let before = swarm.clusters()[0].centroid();

        let moved = states_of(vec![
            unit(1, 0, UnitRole::Scout, HexCoord::new(4, 4)),
            unit(2, 0, UnitRole::Scout, HexCoord::new(6, 4)),
        ]);
        swarm.update(&moved, 0);
        assert_eq!(swarm.clusters().len(), 1);
        assert!(swarm.clusters()[0].contains(1) && swarm.clusters()[0].contains(2));
        assert_ne!(swarm.clusters()[0].centroid(), before);
    }

    #[test]
    fn test_count_change_triggers_rebuild() {
        let states = states_of(vec![
            unit(1, 0, UnitRole::Scout, HexCoord::new(0, 0)),
            unit(2, 0, UnitRole::Scout, HexCoord::new(1, 0)),
        ]);
        let mut swarm = SwarmContext::new();
        swarm.update(&states, 0);
        assert_eq!(swarm.clusters().len(), 1);

        let mut grown: Vec<_> = (1..=9)
            .map(|i| unit(i, 0, UnitRole::Striker, HexCoord::new(i as i32, 1)))
            .collect();
        grown.push(unit(10, 1, UnitRole::Brawler, HexCoord::new(0, 9)));
        swarm.update(&states_of(grown), 0);
        // 9 friendly units, optimal size 4 -> clusters of 4, 4, 1.
        assert_eq!(swarm.clusters().len(), 3);
    }

    #[test]
    fn test_unassigned_unit_gets_singleton_cluster() {
        let mut swarm = SwarmContext::new();
        let stray = unit(42, 0, UnitRole::Sniper, HexCoord::new(3, 3));
        let cluster = swarm.cluster_for(&stray);
        assert_eq!(cluster.members(), &[42]);
        assert_eq!(cluster.centroid(), HexCoord::new(3, 3));
    }

    #[test]
    fn test_enemy_units_are_not_tracked() {
        let states = states_of(vec![
            unit(1, 0, UnitRole::Scout, HexCoord::new(0, 0)),
            unit(2, 1, UnitRole::Scout, HexCoord::new(5, 5)),
        ]);
        let mut swarm = SwarmContext::new();
        swarm.update(&states, 0);
        assert_eq!(swarm.clusters().len(), 1);
        assert!(!swarm.clusters()[0].contains(2));
    }
}
