//! Shortest-route planning over the galaxy graph.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::galaxy::{Galaxy, SystemId};

/// Ordered list of system ids from start to goal inclusive, plus the summed
/// lane cost. Produced per query; never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub systems: Vec<SystemId>,
    pub total_cost: f32,
}

impl Route {
    /// The "no route" value: empty sequence, infinite cost.
    pub fn unreachable() -> Self {
        Self {
            systems: Vec::new(),
            total_cost: f32::INFINITY,
        }
    }

    pub fn is_reachable(&self) -> bool {
        !self.systems.is_empty()
    }
}

/// Open-set entry. Ordered so the heap pops the lowest f first, ties broken
/// by the lower system id to keep results reproducible.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    f: f32,
    g: f32,
    id: SystemId,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* over the lane graph with straight-line distance to the goal as the
/// heuristic. Lane weights are themselves straight-line distances, so the
/// heuristic never overestimates and the first settle of the goal is optimal.
///
/// `start == goal` yields a single-system route of cost 0. Unknown endpoints
/// and severed graphs yield [`Route::unreachable`] rather than an error so
/// route-display callers can degrade to "no route".
///
/// Pure query: no mutation, safe to call from any number of readers.
pub fn find_path(galaxy: &Galaxy, start: SystemId, goal: SystemId) -> Route {
    let (Some(start_system), Some(goal_system)) = (galaxy.system(start), galaxy.system(goal))
    else {
        return Route::unreachable();
    };

    if start == goal {
        return Route {
            systems: vec![start],
            total_cost: 0.0,
        };
    }

    let goal_pos = goal_system.position;
    let count = galaxy.system_count();
    let mut g_score = vec![f32::INFINITY; count];
    let mut came_from: Vec<Option<SystemId>> = vec![None; count];
    let mut settled = vec![false; count];
    let mut open = BinaryHeap::new();

    g_score[start as usize] = 0.0;
    open.push(Candidate {
        f: start_system.position.distance(goal_pos),
        g: 0.0,
        id: start,
    });

    while let Some(candidate) = open.pop() {
        if settled[candidate.id as usize] {
            continue;
        }
        settled[candidate.id as usize] = true;

        if candidate.id == goal {
            return Route {
                systems: reconstruct(&came_from, start, goal),
                total_cost: candidate.g,
            };
        }

        for &(neighbor, weight) in galaxy.neighbors(candidate.id) {
            let tentative = candidate.g + weight;
            if tentative < g_score[neighbor as usize] {
                g_score[neighbor as usize] = tentative;
                came_from[neighbor as usize] = Some(candidate.id);

                let heuristic = match galaxy.system(neighbor) {
                    Some(system) => system.position.distance(goal_pos),
                    None => 0.0,
                };
                open.push(Candidate {
                    f: tentative + heuristic,
                    g: tentative,
                    id: neighbor,
                });
            }
        }
    }

    Route::unreachable()
}

fn reconstruct(came_from: &[Option<SystemId>], start: SystemId, goal: SystemId) -> Vec<SystemId> {
    let mut path = vec![goal];
    let mut current = goal;

    while current != start {
        match came_from[current as usize] {
            Some(previous) => {
                current = previous;
                path.push(current);
            }
            None => break,
        }
    }

    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::galaxy::{StarLane, StarSystem};
    use bevy::prelude::Vec3;

    fn system(id: SystemId, x: f32, y: f32) -> StarSystem {
        StarSystem {
            id,
            name: format!("Test-{}", id),
            position: Vec3::new(x, y, 0.0),
            display_seed: id,
        }
    }

    /// Lane with the weight the builder would assign: the actual distance.
    fn lane(systems: &[StarSystem], a: SystemId, b: SystemId) -> StarLane {
        StarLane {
            a,
            b,
            distance: systems[a as usize]
                .position
                .distance(systems[b as usize].position),
        }
    }

    /// Small graph with a tempting direct lane that loses to a detour:
    ///
    ///   0 --------- 3        direct 0-3 exists but runs via y-offset nodes
    ///    \         /         1 and 2 at a shorter accumulated distance.
    ///     1 ----- 2
    fn detour_galaxy() -> Galaxy {
        let systems = vec![
            system(0, 0.0, 0.0),
            system(1, 10.0, 1.0),
            system(2, 20.0, 1.0),
            system(3, 30.0, 0.0),
            // stub branch that leads nowhere useful
            system(4, 5.0, 40.0),
        ];
        let mut lanes = vec![
            lane(&systems, 0, 1),
            lane(&systems, 1, 2),
            lane(&systems, 2, 3),
            lane(&systems, 0, 4),
        ];
        // Overpriced direct lane; weight deliberately above the detour sum.
        lanes.push(StarLane {
            a: 0,
            b: 3,
            distance: 45.0,
        });
        Galaxy::new(systems, lanes)
    }

    /// Reference Dijkstra without a heap; the independent optimality oracle.
    fn dijkstra_cost(galaxy: &Galaxy, start: SystemId, goal: SystemId) -> f32 {
        let count = galaxy.system_count();
        let mut dist = vec![f32::INFINITY; count];
        let mut visited = vec![false; count];
        dist[start as usize] = 0.0;

        for _ in 0..count {
            let mut current = None;
            for index in 0..count {
                if !visited[index]
                    && dist[index].is_finite()
                    && current.is_none_or(|best: usize| dist[index] < dist[best])
                {
                    current = Some(index);
                }
            }
            let Some(current) = current else { break };
            visited[current] = true;

            for &(neighbor, weight) in galaxy.neighbors(current as SystemId) {
                let next = dist[current] + weight;
                if next < dist[neighbor as usize] {
                    dist[neighbor as usize] = next;
                }
            }
        }

        dist[goal as usize]
    }

    fn route_lane_sum(galaxy: &Galaxy, route: &Route) -> f32 {
        route
            .systems
            .windows(2)
            .map(|pair| {
                galaxy
                    .neighbors(pair[0])
                    .iter()
                    .find(|&&(id, _)| id == pair[1])
                    .map(|&(_, weight)| weight)
                    .unwrap_or(f32::INFINITY)
            })
            .sum()
    }

    #[test]
    fn same_start_and_goal_is_a_single_system_route() {
        let galaxy = detour_galaxy();
        let route = find_path(&galaxy, 2, 2);
        assert_eq!(route.systems, vec![2]);
        assert_eq!(route.total_cost, 0.0);
    }

    #[test]
    fn prefers_cheap_detour_over_expensive_direct_lane() {
        let galaxy = detour_galaxy();
        let route = find_path(&galaxy, 0, 3);
        assert_eq!(route.systems, vec![0, 1, 2, 3]);
    }

    #[test]
    fn cost_matches_independent_dijkstra_for_all_pairs() {
        let galaxy = detour_galaxy();
        let count = galaxy.system_count() as SystemId;

        for start in 0..count {
            for goal in 0..count {
                let route = find_path(&galaxy, start, goal);
                let expected = if start == goal {
                    0.0
                } else {
                    dijkstra_cost(&galaxy, start, goal)
                };
                assert!(
                    (route.total_cost - expected).abs() < 1e-3,
                    "pair ({}, {}): a* {} vs dijkstra {}",
                    start,
                    goal,
                    route.total_cost,
                    expected
                );
            }
        }
    }

    #[test]
    fn route_cost_equals_sum_of_consecutive_lane_weights() {
        let galaxy = detour_galaxy();
        let route = find_path(&galaxy, 0, 3);
        assert!(route.is_reachable());
        assert!((route.total_cost - route_lane_sum(&galaxy, &route)).abs() < 1e-4);
    }

    #[test]
    fn route_endpoints_match_query() {
        let galaxy = detour_galaxy();
        let route = find_path(&galaxy, 4, 3);
        assert_eq!(route.systems.first(), Some(&4));
        assert_eq!(route.systems.last(), Some(&3));
    }

    #[test]
    fn severed_graph_reports_unreachable() {
        let systems = vec![
            system(0, 0.0, 0.0),
            system(1, 10.0, 0.0),
            system(2, 500.0, 0.0),
        ];
        let lanes = vec![lane(&systems, 0, 1)];
        let galaxy = Galaxy::new(systems, lanes);

        let route = find_path(&galaxy, 0, 2);
        assert!(route.systems.is_empty());
        assert!(route.total_cost.is_infinite());
    }

    #[test]
    fn unknown_endpoints_report_unreachable() {
        let galaxy = detour_galaxy();
        assert!(!find_path(&galaxy, 0, 99).is_reachable());
        assert!(!find_path(&galaxy, 99, 0).is_reachable());
    }

    #[test]
    fn repeated_queries_return_identical_routes() {
        let galaxy = detour_galaxy();
        let first = find_path(&galaxy, 0, 3);
        let second = find_path(&galaxy, 0, 3);
        assert_eq!(first, second);
    }

    #[test]
    fn equal_cost_ties_resolve_deterministically() {
        // Symmetric diamond: both arms cost the same.
        let systems = vec![
            system(0, 0.0, 0.0),
            system(1, 10.0, 10.0),
            system(2, 10.0, -10.0),
            system(3, 20.0, 0.0),
        ];
        let lanes = vec![
            lane(&systems, 0, 1),
            lane(&systems, 0, 2),
            lane(&systems, 1, 3),
            lane(&systems, 2, 3),
        ];
        let galaxy = Galaxy::new(systems, lanes);

        let first = find_path(&galaxy, 0, 3);
        let second = find_path(&galaxy, 0, 3);
        assert_eq!(first.systems, second.systems);
        // Lower-id arm wins the tie.
        assert_eq!(first.systems, vec![0, 1, 3]);
    }
}
