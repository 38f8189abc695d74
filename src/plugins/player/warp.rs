//! Warp control: moving the player between star systems.

use bevy::prelude::*;

use crate::galaxy::{
    Galaxy, Gate, SystemId, SystemMember, DEFAULT_ARRIVAL_POSITION, GATE_ACTIVATION_RANGE,
    GATE_ARRIVAL_OFFSET,
};
use crate::plugins::core::{shift_pressed, DebugWindow, EventLog, InputBindings};
use crate::plugins::streaming::{StreamTickCount, SystemStreaming};
use crate::plugins::worldgen::next_token;
use crate::routes::find_path;

use super::{PlayerControl, PlayerPosition};

/// Where a completed warp put the player.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrivalPlacement {
    pub system: SystemId,
    pub position: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarpError {
    UnknownSystem(SystemId),
}

/// Move the player to `target`.
///
/// Leaves the origin system, enters the target, and places the ship at the
/// target's gate back to the origin (offset so the ship is not inside the
/// gate), or at the default position when no return gate exists. Jumping to
/// the system the player is already in is harmless and succeeds with the
/// current placement, touching nothing.
///
/// `current_position` is the ship's translation before the warp; it is only
/// used for the same-system case.
pub fn warp(
    target: SystemId,
    current_position: Vec3,
    player: &mut PlayerPosition,
    galaxy: &Galaxy,
    streaming: &mut SystemStreaming,
    commands: &mut Commands,
) -> Result<ArrivalPlacement, WarpError> {
    if !galaxy.contains(target) || streaming.get(target).is_none() {
        return Err(WarpError::UnknownSystem(target));
    }

    let origin = player.current_system;
    if target == origin {
        return Ok(ArrivalPlacement {
            system: origin,
            position: current_position,
        });
    }

    if let Err(error) = streaming.leave(origin, commands) {
        // Already reported by the lifecycle; the jump itself still proceeds.
        error!("Warp bookkeeping: leaving {} failed: {:?}", origin, error);
    }
    if let Err(error) = streaming.enter(target, commands) {
        error!("Warp bookkeeping: entering {} failed: {:?}", target, error);
        return Err(WarpError::UnknownSystem(target));
    }

    let position = streaming
        .get(target)
        .and_then(|record| record.gate_to(origin))
        .map(|gate_position| gate_position + GATE_ARRIVAL_OFFSET)
        .unwrap_or(DEFAULT_ARRIVAL_POSITION);

    player.current_system = target;

    Ok(ArrivalPlacement {
        system: target,
        position,
    })
}

/// Jump to a uniformly random neighbor of the current system, or to a
/// uniformly random system anywhere when the current system has no lanes.
pub fn warp_random_neighbor(
    state: &mut u64,
    current_position: Vec3,
    player: &mut PlayerPosition,
    galaxy: &Galaxy,
    streaming: &mut SystemStreaming,
    commands: &mut Commands,
) -> Result<ArrivalPlacement, WarpError> {
    let neighbors = galaxy.neighbors(player.current_system);

    let target = if neighbors.is_empty() {
        if galaxy.is_empty() {
            return Err(WarpError::UnknownSystem(player.current_system));
        }
        next_token(state) % galaxy.system_count() as SystemId
    } else {
        neighbors[next_token(state) as usize % neighbors.len()].0
    };

    warp(
        target,
        current_position,
        player,
        galaxy,
        streaming,
        commands,
    )
}

// =============================================================================
// Systems
// =============================================================================

#[allow(clippy::too_many_arguments)]
pub(super) fn player_activate_gate(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut commands: Commands,
    galaxy: Res<Galaxy>,
    mut streaming: ResMut<SystemStreaming>,
    player: Option<ResMut<PlayerPosition>>,
    mut ships: Query<(&mut Transform, &mut SystemMember), With<PlayerControl>>,
    gates: Query<(&Transform, &Gate, &SystemMember), Without<PlayerControl>>,
    mut log: ResMut<EventLog>,
) {
    if !input.just_pressed(bindings.interact) {
        return;
    }
    let Some(mut player) = player else {
        return;
    };
    let Ok((mut ship_transform, mut ship_member)) = ships.get_mut(player.ship) else {
        return;
    };

    let ship_position = ship_transform.translation;

    // Nearest gate in range within the player's current system.
    let mut nearest: Option<(SystemId, f32)> = None;
    for (gate_transform, gate, member) in gates.iter() {
        if member.0 != player.current_system {
            continue;
        }
        let distance = gate_transform.translation.distance(ship_position);
        if distance <= GATE_ACTIVATION_RANGE && nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((gate.destination, distance));
        }
    }

    let Some((destination, _)) = nearest else {
        log.push("No gate in range".to_string());
        return;
    };

    match warp(
        destination,
        ship_position,
        &mut player,
        &galaxy,
        &mut streaming,
        &mut commands,
    ) {
        Ok(placement) => {
            ship_transform.translation = placement.position;
            ship_member.0 = placement.system;
            let name = galaxy
                .system(placement.system)
                .map(|system| system.name.clone())
                .unwrap_or_default();
            log.push(format!("Jumped to {}", name));
        }
        Err(WarpError::UnknownSystem(id)) => {
            log.push(format!("Gate leads nowhere: system {} unknown", id));
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub(super) fn handle_random_jump(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    debug_window: Res<DebugWindow>,
    ticks: Res<StreamTickCount>,
    mut commands: Commands,
    galaxy: Res<Galaxy>,
    mut streaming: ResMut<SystemStreaming>,
    player: Option<ResMut<PlayerPosition>>,
    mut ships: Query<(&mut Transform, &mut SystemMember), With<PlayerControl>>,
    mut log: ResMut<EventLog>,
) {
    if !debug_window.open || !shift_pressed(&input) || !input.just_pressed(bindings.random_jump) {
        return;
    }
    let Some(mut player) = player else {
        return;
    };
    let Ok((mut ship_transform, mut ship_member)) = ships.get_mut(player.ship) else {
        return;
    };

    let mut state = ticks.tick.wrapping_add(galaxy.system_count() as u64);
    match warp_random_neighbor(
        &mut state,
        ship_transform.translation,
        &mut player,
        &galaxy,
        &mut streaming,
        &mut commands,
    ) {
        Ok(placement) => {
            ship_transform.translation = placement.position;
            ship_member.0 = placement.system;
            log.push(format!("Random jump to system {}", placement.system));
        }
        Err(WarpError::UnknownSystem(id)) => {
            log.push(format!("Random jump failed: system {} unknown", id));
        }
    }
}

pub(super) fn handle_plot_route(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    debug_window: Res<DebugWindow>,
    galaxy: Res<Galaxy>,
    player: Option<Res<PlayerPosition>>,
    mut log: ResMut<EventLog>,
) {
    if !debug_window.open || !shift_pressed(&input) || !input.just_pressed(bindings.plot_route) {
        return;
    }
    let Some(player) = player else {
        return;
    };

    let route = find_path(&galaxy, player.current_system, 0);
    if route.is_reachable() {
        log.push(format!(
            "Route home: {} jumps, cost {:.0}",
            route.systems.len().saturating_sub(1),
            route.total_cost
        ));
        debug!("Route home: {:?}", route.systems);
    } else {
        log.push("No route home".to_string());
    }
}
