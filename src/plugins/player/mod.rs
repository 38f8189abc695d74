//! Player plugin: the thin input layer over the warp controller.
//!
//! This module provides:
//! - Gate activation (jump through the nearest gate in range)
//! - A debug random-jump chord
//! - A debug route-home readout

mod warp;

use bevy::prelude::*;

use crate::galaxy::SystemId;
use crate::plugins::core::GameState;

// Re-export the warp surface used by the rest of the game.
pub use warp::{warp, WarpError};
#[allow(unused_imports)]
pub use warp::{warp_random_neighbor, ArrivalPlacement};

pub struct PlayerPlugin;

#[derive(Component, Debug, Default)]
pub struct PlayerControl;

/// Where the local player is. Single instance; mutated only by the warp
/// controller (and the reseed handler, which rebuilds the whole world).
#[derive(Resource, Debug)]
pub struct PlayerPosition {
    pub current_system: SystemId,
    pub ship: Entity,
}

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                warp::player_activate_gate,
                warp::handle_random_jump,
                warp::handle_plot_route,
            )
                .run_if(in_state(GameState::InGame)),
        );
    }
}
