//! Save/load of the current run: world seed plus player location.
//!
//! The galaxy itself is never written out. It is a pure function of the
//! seed, so the save carries only the seed and the system the player was in;
//! loading regenerates the world and warps the player back.

use bevy::prelude::*;
use std::fs;
use std::path::Path;

use crate::galaxy::{Galaxy, SystemId, SystemMember, DEFAULT_ARRIVAL_POSITION};
use crate::plugins::core::{EventLog, GameState, InputBindings};
use crate::plugins::player::{warp, PlayerControl, PlayerPosition, WarpError};
use crate::plugins::streaming::SystemStreaming;
use crate::plugins::worldgen::{apply_seed_world, WorldGenConfig, WorldSeed};

pub struct SaveLoadPlugin;

impl Plugin for SaveLoadPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (handle_save_request, handle_load_request).run_if(in_state(GameState::InGame)),
        );
    }
}

const SAVE_PATH: &str = "saves/run.ron";

#[derive(Debug, PartialEq, serde::Serialize, serde::Deserialize)]
struct SaveGame {
    seed: u64,
    current_system: SystemId,
}

fn handle_save_request(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    seed: Res<WorldSeed>,
    player: Option<Res<PlayerPosition>>,
    mut log: ResMut<EventLog>,
) {
    if !input.just_pressed(bindings.save) {
        return;
    }
    let Some(player) = player else {
        return;
    };

    let payload = SaveGame {
        seed: seed.value,
        current_system: player.current_system,
    };

    let config = ron::ser::PrettyConfig::default();
    match ron::ser::to_string_pretty(&payload, config) {
        Ok(serialized) => {
            if let Err(error) = write_save_file(&serialized) {
                error!("Save write failed: {}", error);
                log.push(format!("Save write failed: {}", error));
            } else {
                info!("Saved to {}", SAVE_PATH);
                log.push(format!("Saved to {}", SAVE_PATH));
            }
        }
        Err(error) => {
            error!("Save failed: {}", error);
            log.push(format!("Save failed: {}", error));
        }
    }
}

fn write_save_file(contents: &str) -> std::io::Result<()> {
    let path = Path::new(SAVE_PATH);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

fn load_save_file() -> Result<Option<SaveGame>, String> {
    let path = Path::new(SAVE_PATH);
    if !path.exists() {
        return Ok(None);
    }
    let contents = fs::read_to_string(path).map_err(|error| error.to_string())?;
    ron::from_str(&contents).map(Some).map_err(|error| error.to_string())
}

#[allow(clippy::too_many_arguments)]
fn handle_load_request(
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
    if !input.just_pressed(bindings.load) {
        return;
    }
    let Some(mut player) = player else {
        return;
    };

    let loaded = match load_save_file() {
        Ok(Some(loaded)) => loaded,
        Ok(None) => {
            log.push("No save file".to_string());
            return;
        }
        Err(error) => {
            error!("Load failed: {}", error);
            log.push(format!("Load failed: {}", error));
            return;
        }
    };

    // Rebuild the static world from the saved seed, then put the player back
    // where the save says they were.
    seed.value = loaded.seed;
    apply_seed_world(
        &mut commands,
        &mut galaxy,
        &mut streaming,
        &config,
        loaded.seed,
        &mut log,
    );

    if galaxy.is_empty() {
        return;
    }
    if let Err(error) = streaming.enter(0, &mut commands) {
        error!("Could not enter starting system after load: {:?}", error);
        return;
    }
    player.current_system = 0;

    let Ok((mut transform, mut member)) = ships.get_mut(player.ship) else {
        return;
    };
    transform.translation = DEFAULT_ARRIVAL_POSITION;
    member.0 = 0;

    let target = if galaxy.contains(loaded.current_system) {
        loaded.current_system
    } else {
        0
    };

    match warp(
        target,
        transform.translation,
        &mut player,
        &galaxy,
        &mut streaming,
        &mut commands,
    ) {
        Ok(placement) => {
            transform.translation = placement.position;
            member.0 = placement.system;
            info!("Loaded save: seed {}, system {}", loaded.seed, placement.system);
            log.push(format!("Resumed in system {}", placement.system));
        }
        Err(WarpError::UnknownSystem(id)) => {
            log.push(format!("Save pointed at unknown system {}", id));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_file_format_is_stable() {
        let parsed: SaveGame = ron::from_str("(seed: 42, current_system: 9)").expect("parse");
        assert_eq!(
            parsed,
            SaveGame {
                seed: 42,
                current_system: 9
            }
        );
    }

    #[test]
    fn serialized_save_contains_both_fields() {
        let payload = SaveGame {
            seed: 7,
            current_system: 3,
        };
        let serialized =
            ron::ser::to_string_pretty(&payload, ron::ser::PrettyConfig::default())
                .expect("serialize");
        assert!(serialized.contains("seed"));
        assert!(serialized.contains("current_system"));
    }
}
