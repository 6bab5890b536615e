//! World construction from a scene.

use crate::actions::{handle_input, present_frame, reset_delta_timer};
use crate::components::{Drawing, Physics};
use crate::systems::{drawing_system, physics_system};
use anyhow::{Context, Result};
use gantry_core::ecs::ConfigError;
use gantry_core::{EntityId, Manager, Registry, World};
use gantry_services::{
    AssetHandle, AssetStore, EntityConfig, InputScript, SceneConfig, Stopwatch, Viewport,
};
use glam::{DVec2, UVec2};
use tracing::{debug, info, warn};

/// Closed type sets of the demo simulation.
pub fn registry() -> Result<Registry, ConfigError> {
    Registry::builder()
        .component::<Physics>()
        .component::<Drawing>()
        .service::<Stopwatch>()
        .service::<AssetStore>()
        .service::<Viewport>()
        .service::<InputScript>()
        .build()
}

/// Build a ready-to-run world: entities, services, systems and actions.
pub fn build_world(scene: &SceneConfig) -> Result<World> {
    let mut world = World::new(registry().context("invalid component/service declaration")?);

    let mut assets = AssetStore::new();
    if let Some(font) = &scene.font {
        assets.set_font(&font.path, font.size, font.color);
    }

    for entity in &scene.entities {
        match spawn_entity(&mut world, &mut assets, entity) {
            Ok(id) => debug!(entity = %id, label = %entity.label, "entity loaded"),
            Err(error) => warn!(label = %entity.label, error = %error, "unable to load entity"),
        }
    }

    let window = &scene.window;
    let viewport = Viewport::new(
        UVec2::new(window.width, window.height),
        scene.settings.framerate,
        window.background,
    );

    world.add_system(physics_system)?;
    world.add_system(drawing_system)?;

    world.install_service(assets)?;
    world.install_service(viewport)?;
    world.install_service(Stopwatch::new())?;
    world.install_service(InputScript::from_events(scene.input.iter().copied()))?;

    let max_sweeps = scene.settings.max_sweeps;
    let reset_after_ms = scene.settings.timer_reset_ms;
    world.add_service_action(
        move |services: &mut (Manager, Stopwatch, InputScript)| handle_input(services, max_sweeps),
    )?;
    world.add_service_action(present_frame)?;
    world.add_service_action(move |services: &mut (Stopwatch,)| {
        reset_delta_timer(services, reset_after_ms)
    })?;

    info!(
        entities = world.entity_count(),
        systems = world.system_count(),
        actions = world.service_action_count(),
        "world ready"
    );
    Ok(world)
}

fn spawn_entity(
    world: &mut World,
    assets: &mut AssetStore,
    entity: &EntityConfig,
) -> Result<EntityId> {
    let image_size = UVec2::new(entity.width, entity.height);
    let image = texture_or_load(assets, &entity.image.to_string_lossy(), |assets| {
        assets.load_image(&entity.image, image_size)
    })?;

    let (text, text_size) = match assets.texture(&entity.label) {
        Some(texture) => (texture.handle, texture.size),
        None => assets.load_text(&entity.label)?,
    };

    let physics = Physics {
        velocity: DVec2::new(entity.vx, entity.vy),
        position: DVec2::new(entity.x, entity.y),
        size: image_size,
        angle: entity.angle,
    };
    let drawing = Drawing {
        image_size,
        text_size,
        image,
        text,
    };

    Ok(gantry_core::spawn!(world, physics, drawing)?)
}

fn texture_or_load(
    assets: &mut AssetStore,
    name: &str,
    load: impl FnOnce(&mut AssetStore) -> Result<AssetHandle, gantry_services::AssetError>,
) -> Result<AssetHandle> {
    match assets.texture(name) {
        Some(texture) => Ok(texture.handle),
        None => Ok(load(assets)?),
    }
}
