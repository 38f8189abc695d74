use bevy::prelude::*;
use std::time::Duration;

pub struct CorePlugin;

#[derive(Resource, Debug, Clone)]
pub struct SimConfig {
    pub tick_hz: f32,
    pub paused: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tick_hz: 10.0,
            paused: false,
        }
    }
}

#[derive(Resource, Debug)]
pub struct EventLog {
    entries: Vec<String>,
    max_entries: usize,
}

impl Default for EventLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 8,
        }
    }
}

impl EventLog {
    pub fn push(&mut self, entry: String) {
        self.entries.push(entry);
        if self.entries.len() > self.max_entries {
            let overflow = self.entries.len() - self.max_entries;
            self.entries.drain(0..overflow);
        }
    }

    #[allow(dead_code)]
    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

#[derive(Resource, Debug, Default)]
pub struct DebugWindow {
    pub open: bool,
}

#[derive(Resource, Debug, Default)]
pub struct RunTimer {
    pub elapsed_seconds: f32,
}

impl RunTimer {
    #[allow(dead_code)]
    pub fn minutes(&self) -> u32 {
        (self.elapsed_seconds / 60.0) as u32
    }

    #[allow(dead_code)]
    pub fn seconds(&self) -> u32 {
        (self.elapsed_seconds % 60.0) as u32
    }
}

#[derive(Resource, Debug, Clone)]
pub struct InputBindings {
    pub interact: KeyCode,
    pub random_jump: KeyCode,
    pub plot_route: KeyCode,
    pub pause: KeyCode,
    pub rate_up: KeyCode,
    pub rate_down: KeyCode,
    pub save: KeyCode,
    pub load: KeyCode,
    pub seed_up: KeyCode,
    pub seed_down: KeyCode,
    pub toggle_debug: KeyCode,
}

impl Default for InputBindings {
    fn default() -> Self {
        Self {
            interact: KeyCode::KeyJ,
            random_jump: KeyCode::KeyR,
            plot_route: KeyCode::KeyP,
            pause: KeyCode::Escape,
            rate_up: KeyCode::BracketRight,
            rate_down: KeyCode::BracketLeft,
            save: KeyCode::F5,
            load: KeyCode::F9,
            seed_up: KeyCode::Equal,
            seed_down: KeyCode::Minus,
            toggle_debug: KeyCode::F3,
        }
    }
}

#[derive(States, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum GameState {
    #[default]
    Boot,
    InGame,
}

/// Check if either Shift key is pressed (for debug key chords)
pub fn shift_pressed(input: &ButtonInput<KeyCode>) -> bool {
    input.pressed(KeyCode::ShiftLeft) || input.pressed(KeyCode::ShiftRight)
}

pub fn sim_not_paused(config: Res<SimConfig>) -> bool {
    !config.paused
}

impl Plugin for CorePlugin {
    fn build(&self, app: &mut App) {
        let config = SimConfig::default();
        let fixed_time = fixed_time_from_config(&config);

        app.init_state::<GameState>()
            .insert_resource(config)
            .insert_resource(fixed_time)
            .init_resource::<InputBindings>()
            .init_resource::<EventLog>()
            .init_resource::<RunTimer>()
            .init_resource::<DebugWindow>()
            .add_systems(OnEnter(GameState::Boot), log_enter_boot)
            .add_systems(OnEnter(GameState::InGame), log_enter_ingame)
            .add_systems(
                Update,
                (
                    handle_pause_toggle,
                    handle_tick_rate_input,
                    handle_debug_toggle,
                    update_run_timer.run_if(in_state(GameState::InGame)),
                ),
            );
    }
}

fn log_enter_boot(mut log: ResMut<EventLog>) {
    log.push("State: Boot".to_string());
    info!("State: Boot");
}

fn log_enter_ingame(mut log: ResMut<EventLog>) {
    log.push("State: InGame".to_string());
    info!("State: InGame");
}

fn handle_pause_toggle(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut config: ResMut<SimConfig>,
) {
    if input.just_pressed(bindings.pause) {
        config.paused = !config.paused;
        info!("Sim paused: {}", config.paused);
    }
}

fn handle_tick_rate_input(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut config: ResMut<SimConfig>,
    mut fixed_time: ResMut<Time<Fixed>>,
) {
    let mut updated = false;

    if input.just_pressed(bindings.rate_up) {
        config.tick_hz = (config.tick_hz + 1.0).min(60.0);
        updated = true;
    }

    if input.just_pressed(bindings.rate_down) {
        config.tick_hz = (config.tick_hz - 1.0).max(1.0);
        updated = true;
    }

    if updated {
        *fixed_time = fixed_time_from_config(&config);
        info!("Sim tick rate: {} Hz", config.tick_hz);
    }
}

fn handle_debug_toggle(
    input: Res<ButtonInput<KeyCode>>,
    bindings: Res<InputBindings>,
    mut debug_window: ResMut<DebugWindow>,
) {
    if input.just_pressed(bindings.toggle_debug) {
        debug_window.open = !debug_window.open;
        info!(
            "Debug window: {}",
            if debug_window.open { "open" } else { "closed" }
        );
    }
}

fn update_run_timer(time: Res<Time>, mut timer: ResMut<RunTimer>) {
    timer.elapsed_seconds += time.delta_secs();
}

fn fixed_time_from_config(config: &SimConfig) -> Time<Fixed> {
    let tick_hz = if config.tick_hz <= 0.0 {
        10.0
    } else {
        config.tick_hz
    };
    let seconds = 1.0 / tick_hz;
    Time::<Fixed>::from_duration(Duration::from_secs_f32(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::ecs::system::SystemState;

    #[test]
    fn sim_config_default_values() {
        let config = SimConfig::default();
        assert_eq!(config.tick_hz, 10.0);
        assert!(!config.paused);
    }

    #[test]
    fn event_log_push_trims_oldest_entries() {
        let mut log = EventLog::default();
        for index in 0..12 {
            log.push(format!("entry-{}", index));
        }

        let entries = log.entries();
        assert_eq!(entries.len(), 8);
        assert_eq!(entries.first().map(String::as_str), Some("entry-4"));
        assert_eq!(entries.last().map(String::as_str), Some("entry-11"));
    }

    #[test]
    fn fixed_time_from_config_clamps_non_positive_tick_rate() {
        let config = SimConfig {
            tick_hz: 0.0,
            paused: false,
        };
        let fixed = fixed_time_from_config(&config);
        assert_eq!(fixed.timestep().as_secs_f32(), 0.1);
    }

    #[test]
    fn handle_pause_toggle_flips_config() {
        let mut world = World::default();
        world.insert_resource(ButtonInput::<KeyCode>::default());
        world.insert_resource(InputBindings::default());
        world.insert_resource(SimConfig::default());

        {
            let mut input = world.resource_mut::<ButtonInput<KeyCode>>();
            input.press(KeyCode::Escape);
        }

        let mut system_state: SystemState<(
            Res<ButtonInput<KeyCode>>,
            Res<InputBindings>,
            ResMut<SimConfig>,
        )> = SystemState::new(&mut world);
        let (input, bindings, config) = system_state.get_mut(&mut world);
        handle_pause_toggle(input, bindings, config);
        system_state.apply(&mut world);

        let config = world.resource::<SimConfig>();
        assert!(config.paused);
    }

    #[test]
    fn shift_pressed_detects_either_side() {
        let mut input = ButtonInput::<KeyCode>::default();
        assert!(!shift_pressed(&input));

        input.press(KeyCode::ShiftLeft);
        assert!(shift_pressed(&input));

        input.release(KeyCode::ShiftLeft);
        input.clear();
        input.press(KeyCode::ShiftRight);
        assert!(shift_pressed(&input));
    }

    #[test]
    fn run_timer_reports_minutes_and_seconds() {
        let timer = RunTimer {
            elapsed_seconds: 125.0,
        };
        assert_eq!(timer.minutes(), 2);
        assert_eq!(timer.seconds(), 5);
    }
}
