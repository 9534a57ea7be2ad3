#![allow(clippy::float_cmp)]

//! Headless Firstblood gameplay host.
//!
//! Wires the injector, registries and crowd together, spawns the player and
//! the enemy spawner, then drives frames from a real clock while a scripted
//! player walks around.
//!
//! Configuration comes from the environment:
//! - `FB_TARGET_FPS` - frame rate (default 20)
//! - `FB_FRAMES` - frames to run, 0 for no limit (default 600)
//! - `FB_MAX_ENEMIES` - enemy cap (default 256)
//! - `FB_SEED` - RNG seed for reproducible runs
//! - `FB_FIRE_INTERVAL` - seconds between shots (default 0.5)

mod config;
mod crowd;
mod game;
mod gameplay;
mod input;
mod math;
mod painter;

use tracing::info;

use crate::config::GameConfig;

fn main() -> eyre::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fb_game=info".parse()?)
                .add_directive("fb_runtime=info".parse()?)
                .add_directive("fb_event=info".parse()?),
        )
        .init();

    let config = GameConfig::from_env();
    info!(
        target_fps = config.target_fps,
        frames = config.frames,
        fire_interval = config.fire_interval,
        "Starting Firstblood"
    );

    let stats = game::run(&config)?;
    info!(
        spawned = stats.spawned,
        killed = stats.killed,
        shots = stats.shots,
        "Shutting down"
    );
    Ok(())
}
