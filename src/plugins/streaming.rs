//! Demand-driven system streaming.
//!
//! Each star system's content exists in the ECS only while at least one
//! occupant is inside it. [`SystemStreaming`] owns the per-system records and
//! is the single mutation point: everything goes through `enter`/`leave`,
//! which load/unload exactly at the 0↔1 occupancy transition.

use bevy::prelude::*;

use crate::galaxy::{
    CelestialBody, ContentKind, ContentSpec, Galaxy, Gate, SystemId, SystemMember,
};
use crate::plugins::core::sim_not_paused;

pub struct StreamingPlugin;

impl Plugin for StreamingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SystemStreaming>()
            .init_resource::<StreamTickCount>()
            .add_systems(FixedUpdate, tick_stream_stats.run_if(sim_not_paused));
    }
}

#[derive(Resource, Default)]
pub struct StreamTickCount {
    pub tick: u64,
}

/// Runtime record for one star system: the static content descriptors plus
/// the occupancy bookkeeping that drives load/unload.
#[derive(Debug)]
pub struct SolarSystem {
    pub id: SystemId,
    pub content: Vec<ContentSpec>,
    occupants: u32,
    loaded: bool,
    spawned: Vec<Entity>,
}

impl SolarSystem {
    pub fn new(id: SystemId, content: Vec<ContentSpec>) -> Self {
        Self {
            id,
            content,
            occupants: 0,
            loaded: false,
            spawned: Vec::new(),
        }
    }

    #[allow(dead_code)]
    pub fn occupants(&self) -> u32 {
        self.occupants
    }

    #[allow(dead_code)]
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Local position of this system's gate leading to `destination`, if any.
    pub fn gate_to(&self, destination: SystemId) -> Option<Vec3> {
        self.content.iter().find_map(|spec| match spec.kind {
            ContentKind::Gate { destination: gate_destination }
                if gate_destination == destination =>
            {
                Some(spec.position)
            }
            _ => None,
        })
    }

    /// Spawn every content entity from its descriptor. Runs once per 0→1
    /// occupancy transition; a reloaded system gets fresh entities of the
    /// same kinds at the same positions.
    fn load(&mut self, commands: &mut Commands) {
        for (index, spec) in self.content.iter().enumerate() {
            let entity = match spec.kind {
                ContentKind::Star { .. } => commands
                    .spawn((
                        CelestialBody { kind: spec.kind },
                        SystemMember(self.id),
                        Name::new(format!("Star-{}", self.id)),
                        Transform::from_translation(spec.position),
                        GlobalTransform::default(),
                        Visibility::default(),
                    ))
                    .id(),
                ContentKind::Asteroid => commands
                    .spawn((
                        CelestialBody { kind: spec.kind },
                        SystemMember(self.id),
                        Name::new(format!("Asteroid-{}-{}", self.id, index)),
                        Transform::from_translation(spec.position),
                        GlobalTransform::default(),
                        Visibility::default(),
                    ))
                    .id(),
                ContentKind::Gate { destination } => commands
                    .spawn((
                        Gate { destination },
                        SystemMember(self.id),
                        Name::new(format!("Gate-{}-to-{}", self.id, destination)),
                        Transform::from_translation(spec.position),
                        GlobalTransform::default(),
                        Visibility::default(),
                    ))
                    .id(),
            };
            self.spawned.push(entity);
        }

        self.loaded = true;
        info!("System {} loaded ({} entities)", self.id, self.spawned.len());
    }

    fn unload(&mut self, commands: &mut Commands) {
        for entity in self.spawned.drain(..) {
            commands.entity(entity).despawn();
        }
        self.loaded = false;
        info!("System {} unloaded", self.id);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleError {
    UnknownSystem(SystemId),
    /// `leave()` on a system with no occupants: an unbalanced enter/leave
    /// pair somewhere in the caller. The counter is left untouched.
    NegativeOccupancy(SystemId),
}

/// Owner of all [`SolarSystem`] records. Other components read through
/// `get`; occupancy mutation happens only here.
#[derive(Resource, Debug, Default)]
pub struct SystemStreaming {
    systems: Vec<SolarSystem>,
}

impl SystemStreaming {
    pub fn new(systems: Vec<SolarSystem>) -> Self {
        Self { systems }
    }

    pub fn get(&self, id: SystemId) -> Option<&SolarSystem> {
        self.systems.get(id as usize)
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }

    pub fn loaded_count(&self) -> usize {
        self.systems.iter().filter(|system| system.loaded).count()
    }

    pub fn occupant_total(&self) -> u32 {
        self.systems.iter().map(|system| system.occupants).sum()
    }

    /// Register one occupant. The 0→1 transition loads the system's content;
    /// entering an already-occupied system changes nothing but the count.
    pub fn enter(
        &mut self,
        id: SystemId,
        commands: &mut Commands,
    ) -> Result<(), LifecycleError> {
        let Some(system) = self.systems.get_mut(id as usize) else {
            return Err(LifecycleError::UnknownSystem(id));
        };

        system.occupants += 1;
        if system.occupants == 1 {
            system.load(commands);
        }
        Ok(())
    }

    /// Remove one occupant. The 1→0 transition unloads the system's content.
    pub fn leave(
        &mut self,
        id: SystemId,
        commands: &mut Commands,
    ) -> Result<(), LifecycleError> {
        let Some(system) = self.systems.get_mut(id as usize) else {
            return Err(LifecycleError::UnknownSystem(id));
        };

        if system.occupants == 0 {
            error!(
                "leave() on empty system {}; enter/leave calls are unbalanced",
                id
            );
            return Err(LifecycleError::NegativeOccupancy(id));
        }

        system.occupants -= 1;
        if system.occupants == 0 {
            system.unload(commands);
        }
        Ok(())
    }

    /// Swap in a freshly linked set of records, despawning whatever the old
    /// ones still had loaded. Used on reseed and on save-file load.
    pub fn replace(&mut self, systems: Vec<SolarSystem>, commands: &mut Commands) {
        for system in &mut self.systems {
            if system.loaded {
                system.unload(commands);
            }
        }
        self.systems = systems;
    }
}

fn tick_stream_stats(
    mut counter: ResMut<StreamTickCount>,
    galaxy: Res<Galaxy>,
    streaming: Res<SystemStreaming>,
) {
    counter.tick = counter.tick.saturating_add(1);

    if counter.tick.is_multiple_of(10) {
        debug!(
            "Stream tick {} (systems: {}, lanes: {}, loaded: {}, occupants: {})",
            counter.tick,
            galaxy.system_count(),
            galaxy.lanes().len(),
            streaming.loaded_count(),
            streaming.occupant_total()
        );
    }
}
