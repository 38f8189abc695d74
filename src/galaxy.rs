use bevy::prelude::*;
use std::collections::VecDeque;

pub type SystemId = u32;

/// Radius of the ring gates sit on inside a system's local space.
pub const GATE_RING_RADIUS: f32 = 250.0;

/// Offset from the return gate at which an arriving ship is placed.
pub const GATE_ARRIVAL_OFFSET: Vec3 = Vec3::new(30.0, 30.0, 0.0);

/// Arrival position when the destination has no gate back to the origin.
pub const DEFAULT_ARRIVAL_POSITION: Vec3 = Vec3::new(150.0, 0.0, 0.0);

/// How close a ship must be to a gate to activate it.
pub const GATE_ACTIVATION_RANGE: f32 = 50.0;

/// Static identity of one star system. Immutable after generation; owned by
/// the [`Galaxy`] and referenced everywhere else by id.
#[derive(Debug, Clone, PartialEq)]
pub struct StarSystem {
    pub id: SystemId,
    pub name: String,
    pub position: Vec3,
    pub display_seed: u32,
}

/// Undirected lane between two systems, weighted by the Euclidean distance
/// between their positions. Computed once at build time.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StarLane {
    pub a: SystemId,
    pub b: SystemId,
    pub distance: f32,
}

/// The navigation graph. Built once at startup (or on reseed) and read-only
/// afterwards; system ids are dense indices into `systems`.
#[derive(Resource, Debug, Default, Clone)]
pub struct Galaxy {
    systems: Vec<StarSystem>,
    adjacency: Vec<Vec<(SystemId, f32)>>,
    lanes: Vec<StarLane>,
}

impl Galaxy {
    /// Assemble the graph from generated systems and lanes. Adjacency is
    /// mirrored so both endpoints see each lane with the same weight.
    pub fn new(systems: Vec<StarSystem>, lanes: Vec<StarLane>) -> Self {
        let mut adjacency = vec![Vec::new(); systems.len()];
        for lane in &lanes {
            adjacency[lane.a as usize].push((lane.b, lane.distance));
            adjacency[lane.b as usize].push((lane.a, lane.distance));
        }

        Self {
            systems,
            adjacency,
            lanes,
        }
    }

    pub fn contains(&self, id: SystemId) -> bool {
        (id as usize) < self.systems.len()
    }

    pub fn system(&self, id: SystemId) -> Option<&StarSystem> {
        self.systems.get(id as usize)
    }

    pub fn systems(&self) -> &[StarSystem] {
        &self.systems
    }

    pub fn lanes(&self) -> &[StarLane] {
        &self.lanes
    }

    pub fn system_count(&self) -> usize {
        self.systems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    /// Neighbors of `id` with lane weights, in lane insertion order.
    /// Unknown ids have no neighbors.
    pub fn neighbors(&self, id: SystemId) -> &[(SystemId, f32)] {
        self.adjacency
            .get(id as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True when every system is reachable from system 0.
    pub fn is_connected(&self) -> bool {
        if self.systems.len() < 2 {
            return true;
        }

        let mut seen = vec![false; self.systems.len()];
        let mut queue = VecDeque::new();
        seen[0] = true;
        queue.push_back(0 as SystemId);

        while let Some(id) = queue.pop_front() {
            for &(neighbor, _) in self.neighbors(id) {
                if !seen[neighbor as usize] {
                    seen[neighbor as usize] = true;
                    queue.push_back(neighbor);
                }
            }
        }

        seen.iter().all(|&reached| reached)
    }
}

/// What a piece of system content is. Closed set; new kinds are added here
/// and matched exhaustively at spawn time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContentKind {
    Star { display_seed: u32 },
    Asteroid,
    Gate { destination: SystemId },
}

/// Static descriptor for one content entity, in system-local coordinates.
/// Spawned on load and despawned on unload; the descriptor itself persists,
/// so a reloaded system gets content equivalent in kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentSpec {
    pub kind: ContentKind,
    pub position: Vec3,
}

/// System membership for spawned content and ships.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemMember(pub SystemId);

/// A stargate entity. Always spawned in pairs, one per lane endpoint.
#[derive(Component, Debug, Clone, Copy)]
pub struct Gate {
    pub destination: SystemId,
}

#[derive(Component, Debug, Clone, Copy)]
pub struct CelestialBody {
    #[allow(dead_code)]
    pub kind: ContentKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn system(id: SystemId, x: f32, y: f32) -> StarSystem {
        StarSystem {
            id,
            name: format!("Test-{}", id),
            position: Vec3::new(x, y, 0.0),
            display_seed: id,
        }
    }

    #[test]
    fn adjacency_is_symmetric_with_equal_weights() {
        let systems = vec![system(0, 0.0, 0.0), system(1, 3.0, 4.0), system(2, 6.0, 8.0)];
        let lanes = vec![
            StarLane {
                a: 0,
                b: 1,
                distance: 5.0,
            },
            StarLane {
                a: 1,
                b: 2,
                distance: 5.0,
            },
        ];
        let galaxy = Galaxy::new(systems, lanes);

        for lane in galaxy.lanes() {
            assert!(galaxy
                .neighbors(lane.a)
                .iter()
                .any(|&(id, w)| id == lane.b && w == lane.distance));
            assert!(galaxy
                .neighbors(lane.b)
                .iter()
                .any(|&(id, w)| id == lane.a && w == lane.distance));
        }
    }

    #[test]
    fn neighbors_of_unknown_system_is_empty() {
        let galaxy = Galaxy::new(vec![system(0, 0.0, 0.0)], Vec::new());
        assert!(galaxy.neighbors(7).is_empty());
    }

    #[test]
    fn contains_checks_dense_id_range() {
        let galaxy = Galaxy::new(vec![system(0, 0.0, 0.0), system(1, 1.0, 0.0)], Vec::new());
        assert!(galaxy.contains(0));
        assert!(galaxy.contains(1));
        assert!(!galaxy.contains(2));
    }

    #[test]
    fn chain_graph_is_connected() {
        let systems = vec![system(0, 0.0, 0.0), system(1, 1.0, 0.0), system(2, 2.0, 0.0)];
        let lanes = vec![
            StarLane {
                a: 0,
                b: 1,
                distance: 1.0,
            },
            StarLane {
                a: 1,
                b: 2,
                distance: 1.0,
            },
        ];
        assert!(Galaxy::new(systems, lanes).is_connected());
    }

    #[test]
    fn split_graph_is_not_connected() {
        let systems = vec![
            system(0, 0.0, 0.0),
            system(1, 1.0, 0.0),
            system(2, 100.0, 0.0),
            system(3, 101.0, 0.0),
        ];
        let lanes = vec![
            StarLane {
                a: 0,
                b: 1,
                distance: 1.0,
            },
            StarLane {
                a: 2,
                b: 3,
                distance: 1.0,
            },
        ];
        assert!(!Galaxy::new(systems, lanes).is_connected());
    }

    #[test]
    fn empty_and_single_system_galaxies_count_as_connected() {
        assert!(Galaxy::default().is_connected());
        assert!(Galaxy::new(vec![system(0, 0.0, 0.0)], Vec::new()).is_connected());
    }
}
