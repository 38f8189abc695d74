//! Procedural galaxy generation: system placement, lane connectivity, and
//! gate linking.

use bevy::prelude::*;
use std::collections::HashSet;
use std::f32::consts::TAU;

use crate::galaxy::{
    ContentKind, ContentSpec, Galaxy, StarLane, StarSystem, SystemId, DEFAULT_ARRIVAL_POSITION,
    GATE_RING_RADIUS, SystemMember,
};
use crate::plugins::core::{shift_pressed, DebugWindow, EventLog, GameState, InputBindings};
use crate::plugins::player::{PlayerControl, PlayerPosition};
use crate::plugins::streaming::{SolarSystem, SystemStreaming};

pub struct WorldGenPlugin;

impl Plugin for WorldGenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WorldSeed>()
            .init_resource::<WorldGenConfig>()
            .init_resource::<Galaxy>()
            .add_systems(
                OnEnter(GameState::Boot),
                (seed_world, transition_to_ingame).chain(),
            )
            .add_systems(
                Update,
                handle_seed_input
                    .run_if(in_state(GameState::InGame))
                    .run_if(debug_window_open),
            );
    }
}

fn debug_window_open(debug_window: Res<DebugWindow>) -> bool {
    debug_window.open
}

#[derive(Resource)]
pub struct WorldSeed {
    pub value: u64,
}

impl Default for WorldSeed {
    fn default() -> Self {
        Self { value: 12345 }
    }
}

/// Axis-aligned box the generator scatters systems inside.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GalaxyBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl GalaxyBounds {
    #[allow(dead_code)]
    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}

impl Default for GalaxyBounds {
    fn default() -> Self {
        // Thin disc: wide in x/y, shallow in z.
        Self {
            min: Vec3::new(-7500.0, -5000.0, -1500.0),
            max: Vec3::new(7500.0, 5000.0, 1500.0),
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct WorldGenConfig {
    pub system_count: usize,
    pub bounds: GalaxyBounds,
}

impl Default for WorldGenConfig {
    fn default() -> Self {
        Self {
            system_count: 50,
            bounds: GalaxyBounds::default(),
        }
    }
}

/// How many nearest neighbors each system links to before the repair pass.
const NEAREST_LINKS: usize = 3;

const ASTEROIDS_PER_SYSTEM_MIN: u32 = 20;
const ASTEROIDS_PER_SYSTEM_MAX: u32 = 50;

// =============================================================================
// Seeded RNG
// =============================================================================

fn next_unit(state: &mut u64) -> f32 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    let value = (*state >> 33) as u32;
    (value as f32) / (u32::MAX as f32)
}

pub(crate) fn next_token(state: &mut u64) -> u32 {
    *state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
    (*state >> 33) as u32
}

fn scale_to_range(value: f32, min: f32, max: f32) -> f32 {
    min + (max - min) * value
}

fn next_count(state: &mut u64, min: u32, max: u32) -> u32 {
    let span = (max - min + 1) as f32;
    min + ((next_unit(state) * span) as u32).min(max - min)
}

fn next_position(bounds: &GalaxyBounds, state: &mut u64) -> Vec3 {
    Vec3::new(
        scale_to_range(next_unit(state), bounds.min.x, bounds.max.x),
        scale_to_range(next_unit(state), bounds.min.y, bounds.max.y),
        scale_to_range(next_unit(state), bounds.min.z, bounds.max.z),
    )
}

// =============================================================================
// System Generation
// =============================================================================

const NAME_STEMS: [&str; 20] = [
    "Vel", "Kor", "Ash", "Ther", "Ori", "Dra", "Nym", "Cas", "Bel", "Hax", "Mir", "Sol", "Tyr",
    "Ulm", "Pex", "Ran", "Ios", "Ged", "Lyr", "Vor",
];

const NAME_MIDDLES: [&str; 12] = [
    "ar", "en", "il", "ul", "os", "ax", "ir", "um", "an", "et", "or", "is",
];

const NAME_ENDS: [&str; 8] = ["a", "us", "ia", "on", "ei", "ix", "e", "ar"];

/// Syllable-built name with the id as numeric suffix, so names stay unique
/// within a run no matter what the syllable roll produces.
fn system_name(id: SystemId, state: &mut u64) -> String {
    let mut name = String::new();
    name.push_str(NAME_STEMS[(next_token(state) as usize) % NAME_STEMS.len()]);
    if next_unit(state) > 0.4 {
        name.push_str(NAME_MIDDLES[(next_token(state) as usize) % NAME_MIDDLES.len()]);
    }
    name.push_str(NAME_ENDS[(next_token(state) as usize) % NAME_ENDS.len()]);
    format!("{}-{}", name, id)
}

/// Scatter `count` systems uniformly inside `bounds`. Deterministic for a
/// given RNG state; `count == 0` simply yields nothing.
pub fn generate_systems(count: usize, bounds: &GalaxyBounds, state: &mut u64) -> Vec<StarSystem> {
    (0..count)
        .map(|index| {
            let id = index as SystemId;
            let position = next_position(bounds, state);
            let display_seed = next_token(state);
            StarSystem {
                id,
                name: system_name(id, state),
                position,
                display_seed,
            }
        })
        .collect()
}

// =============================================================================
// Lane Building (k-nearest + connectivity repair)
// =============================================================================

fn ordered(a: SystemId, b: SystemId) -> (SystemId, SystemId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn find(parent: &mut [usize], i: usize) -> usize {
    if parent[i] != i {
        parent[i] = find(parent, parent[i]);
    }
    parent[i]
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let root_a = find(parent, a);
    let root_b = find(parent, b);
    if root_a != root_b {
        parent[root_a] = root_b;
    }
}

/// Connect every system to its `nearest_links` closest systems, deduplicating
/// the bidirectional pairs, then bridge any component that ended up cut off
/// from system 0's component. Lane weight is the Euclidean distance between
/// the endpoints, computed here once.
pub fn build_lanes(systems: &[StarSystem], nearest_links: usize) -> Vec<StarLane> {
    if systems.len() < 2 || nearest_links == 0 {
        return Vec::new();
    }

    let mut picked: HashSet<(SystemId, SystemId)> = HashSet::new();
    let mut lanes = Vec::new();

    for system in systems {
        let mut others: Vec<(SystemId, f32)> = systems
            .iter()
            .filter(|other| other.id != system.id)
            .map(|other| (other.id, system.position.distance(other.position)))
            .collect();
        others.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

        for &(other, distance) in others.iter().take(nearest_links) {
            let key = ordered(system.id, other);
            if picked.insert(key) {
                lanes.push(StarLane {
                    a: key.0,
                    b: key.1,
                    distance,
                });
            }
        }
    }

    repair_connectivity(systems, &mut lanes);
    lanes
}

/// Post-pass: k-nearest can leave distant clusters talking only to
/// themselves. Every system must be reachable from system 0, so each stray
/// gets a forced lane to its nearest system in the main component.
fn repair_connectivity(systems: &[StarSystem], lanes: &mut Vec<StarLane>) {
    let count = systems.len();
    let mut parent: Vec<usize> = (0..count).collect();
    for lane in lanes.iter() {
        union(&mut parent, lane.a as usize, lane.b as usize);
    }

    loop {
        let main = find(&mut parent, 0);
        let Some(stray) = (0..count).find(|&index| find(&mut parent, index) != main) else {
            break;
        };

        let mut nearest: Option<(usize, f32)> = None;
        for candidate in 0..count {
            if find(&mut parent, candidate) != main {
                continue;
            }
            let distance = systems[stray].position.distance(systems[candidate].position);
            if nearest.is_none_or(|(_, best)| distance < best) {
                nearest = Some((candidate, distance));
            }
        }

        let Some((candidate, distance)) = nearest else {
            break;
        };
        let key = ordered(stray as SystemId, candidate as SystemId);
        lanes.push(StarLane {
            a: key.0,
            b: key.1,
            distance,
        });
        union(&mut parent, stray, candidate);
        info!(
            "Connectivity repair: forced lane {} <-> {}",
            stray, candidate
        );
    }
}

/// The once-at-startup entry point: placement plus connectivity in one call.
pub fn generate_universe(count: usize, bounds: &GalaxyBounds, seed: u64) -> Galaxy {
    let mut state = seed;
    let systems = generate_systems(count, bounds, &mut state);
    let lanes = build_lanes(&systems, NEAREST_LINKS);
    Galaxy::new(systems, lanes)
}

// =============================================================================
// Gate Linking & Filler Content
// =============================================================================

/// Build the runtime record for every system: a central star, a seeded
/// asteroid field, and one gate per lane endpoint. Gates sit evenly spread on
/// a fixed-radius ring, indexed by adjacency order, so a well-connected
/// system never stacks two gates on the same spot. For every lane (a, b)
/// this produces a gate in `a` pointing at `b` and a gate in `b` pointing at
/// `a` — never an unpaired one.
pub fn link_gates(galaxy: &Galaxy, state: &mut u64) -> Vec<SolarSystem> {
    galaxy
        .systems()
        .iter()
        .map(|system| {
            let mut content = vec![ContentSpec {
                kind: ContentKind::Star {
                    display_seed: system.display_seed,
                },
                position: Vec3::ZERO,
            }];

            let asteroid_count =
                next_count(state, ASTEROIDS_PER_SYSTEM_MIN, ASTEROIDS_PER_SYSTEM_MAX);
            for _ in 0..asteroid_count {
                let angle = next_unit(state) * TAU;
                let distance = scale_to_range(next_unit(state), 60.0, 180.0);
                let height = scale_to_range(next_unit(state), -10.0, 10.0);
                content.push(ContentSpec {
                    kind: ContentKind::Asteroid,
                    position: Vec3::new(angle.cos() * distance, angle.sin() * distance, height),
                });
            }

            let neighbors = galaxy.neighbors(system.id);
            for (index, &(neighbor, _)) in neighbors.iter().enumerate() {
                let angle = index as f32 * TAU / neighbors.len() as f32;
                content.push(ContentSpec {
                    kind: ContentKind::Gate {
                        destination: neighbor,
                    },
                    position: Vec3::new(angle.cos(), angle.sin(), 0.0) * GATE_RING_RADIUS,
                });
            }

            SolarSystem::new(system.id, content)
        })
        .collect()
}

// =============================================================================
// Systems
// =============================================================================

fn seed_world(
    mut commands: Commands,
    seed: Res<WorldSeed>,
    config: Res<WorldGenConfig>,
    mut galaxy: ResMut<Galaxy>,
    mut streaming: ResMut<SystemStreaming>,
    mut log: ResMut<EventLog>,
) {
    apply_seed_world(
        &mut commands,
        &mut galaxy,
        &mut streaming,
        &config,
        seed.value,
        &mut log,
    );
    spawn_player(&mut commands, &mut streaming, &galaxy);
}

fn transition_to_ingame(mut next_state: ResMut<NextState<GameState>>) {
    next_state.set(GameState::InGame);
}

/// Regenerate the whole static world from `seed`: graph, gate records, and
/// streaming table. Whatever the old records had loaded is despawned.
pub(crate) fn apply_seed_world(
    commands: &mut Commands,
    galaxy: &mut Galaxy,
    streaming: &mut SystemStreaming,
    config: &WorldGenConfig,
    seed: u64,
    log: &mut EventLog,
) {
    *galaxy = generate_universe(config.system_count, &config.bounds, seed);

    let mut state = seed;
    let records = link_gates(galaxy, &mut state);
    streaming.replace(records, commands);

    info!(
        "Galaxy seeded: {} systems, {} lanes (seed {})",
        galaxy.system_count(),
        galaxy.lanes().len(),
        seed
    );
    log.push(format!(
        "Charted {} systems, {} lanes",
        galaxy.system_count(),
        galaxy.lanes().len()
    ));
}

fn spawn_player(commands: &mut Commands, streaming: &mut SystemStreaming, galaxy: &Galaxy) {
    if galaxy.is_empty() {
        warn!("Empty galaxy; no player spawned");
        return;
    }

    let start: SystemId = 0;
    if let Err(error) = streaming.enter(start, commands) {
        error!("Could not enter starting system: {:?}", error);
        return;
    }

    let ship = commands
        .spawn((
            PlayerControl,
            SystemMember(start),
            Name::new("Ship-Player"),
            Transform::from_translation(DEFAULT_ARRIVAL_POSITION),
            GlobalTransform::default(),
            Visibility::default(),
        ))
        .id();
    commands.insert_resource(PlayerPosition {
        current_system: start,
        ship,
    });

    info!("Player ship spawned in system {}", start);
}

#[allow(clippy::too_many_arguments)]
fn handle_seed_input(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut commands: Commands,
    mut seed: ResMut<WorldSeed>,
    config: Res<WorldGenConfig>,
    mut galaxy: ResMut<Galaxy>,
    mut streaming: ResMut<SystemStreaming>,
    player: Option<ResMut<PlayerPosition>>,
    mut ships: Query<(&mut Transform, &mut SystemMember), With<PlayerControl>>,
    mut log: ResMut<EventLog>,
) {
    if !shift_pressed(&input) {
        return;
    }

    let mut updated = false;

    if input.just_pressed(bindings.seed_up) {
        seed.value = seed.value.saturating_add(1);
        updated = true;
    }

    if input.just_pressed(bindings.seed_down) {
        seed.value = seed.value.saturating_sub(1);
        updated = true;
    }

    if !updated {
        return;
    }

    apply_seed_world(
        &mut commands,
        &mut galaxy,
        &mut streaming,
        &config,
        seed.value,
        &mut log,
    );
    info!("World seed updated: {}", seed.value);

    // Old system ids are stale now; put the player back at the start.
    let Some(mut player) = player else {
        return;
    };
    if galaxy.is_empty() {
        return;
    }
    if let Err(error) = streaming.enter(0, &mut commands) {
        error!("Could not re-enter starting system after reseed: {:?}", error);
        return;
    }
    player.current_system = 0;
    if let Ok((mut transform, mut member)) = ships.get_mut(player.ship) {
        transform.translation = DEFAULT_ARRIVAL_POSITION;
        member.0 = 0;
    }
}
