use bevy::prelude::*;

mod galaxy;
mod plugins;
mod routes;

fn main() {
    App::new()
        .insert_resource(ClearColor(Color::srgb(0.05, 0.07, 0.1)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Driftgate".to_string(),
                resolution: (1280, 720).into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins((
            plugins::core::CorePlugin,
            plugins::worldgen::WorldGenPlugin,
            plugins::streaming::StreamingPlugin,
            plugins::player::PlayerPlugin,
            plugins::saveload::SaveLoadPlugin,
        ))
        .run();
}
