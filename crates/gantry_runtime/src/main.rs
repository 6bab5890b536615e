//! Gantry demo runtime
//!
//! Loads a scene file, builds the world and sweeps it until an input event
//! or the configured sweep limit stops it.

mod actions;
mod components;
mod setup;
mod systems;

use anyhow::{bail, Context, Result};
use gantry_core::{Scheduler, World};
use gantry_services::{SceneConfig, Viewport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Gantry v{}", gantry_core::VERSION);

    let mut args = std::env::args_os().skip(1);
    let (Some(path), None) = (args.next(), args.next()) else {
        bail!("usage: gantry <scene-file>");
    };
    let path = PathBuf::from(path);
    if !path.is_file() {
        bail!("scene file `{}` does not exist", path.display());
    }

    let scene = SceneConfig::load(&path)
        .with_context(|| format!("failed to load scene `{}`", path.display()))?;
    let world = setup::build_world(&scene)?;

    let world = if scene.settings.threaded {
        run_threaded(world)?
    } else {
        let mut world = world;
        world.run()?;
        world
    };

    let (fastest, slowest) = world.sweep_time_range_ms();
    info!(
        sweeps = world.sweep_count(),
        sweep_rate = world.sweep_rate(),
        fastest_ms = fastest,
        slowest_ms = slowest,
        frames = world
            .service::<Viewport>()
            .map_or(0, |viewport| viewport.frames_presented()),
        "simulation finished"
    );
    Ok(())
}

fn run_threaded(world: World) -> Result<World> {
    let mut scheduler = Scheduler::new(world);
    scheduler.dispatch()?;
    info!("sweep loop dispatched");
    let sweeps = scheduler.await_stop()?;
    info!(sweeps, "sweep loop joined");
    Ok(scheduler.into_world()?)
}
