//! Runtime configuration from environment variables.

use std::{fmt::Display, str::FromStr};

use tracing::warn;

/// Settings for one headless run.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    /// Frames per second the loop paces itself to (`FB_TARGET_FPS`).
    pub target_fps: f32,
    /// Frames to run before exiting, 0 for no limit (`FB_FRAMES`).
    pub frames: u64,
    /// Most enemies alive at once (`FB_MAX_ENEMIES`).
    pub max_enemies: usize,
    /// RNG seed for reproducible runs (`FB_SEED`).
    pub seed: Option<u64>,
    /// Seconds between player shots (`FB_FIRE_INTERVAL`).
    pub fire_interval: f32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            target_fps: 20.0,
            frames: 600,
            max_enemies: 256,
            seed: None,
            fire_interval: 0.5,
        }
    }
}

impl GameConfig {
    /// Read the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Missing or unparsable values keep their
    /// defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let target_fps = parse_or(&lookup, "FB_TARGET_FPS", defaults.target_fps);
        let fire_interval = parse_or(&lookup, "FB_FIRE_INTERVAL", defaults.fire_interval);

        Self {
            target_fps: positive_or("FB_TARGET_FPS", target_fps, defaults.target_fps),
            frames: parse_or(&lookup, "FB_FRAMES", defaults.frames),
            max_enemies: parse_or(&lookup, "FB_MAX_ENEMIES", defaults.max_enemies),
            seed: lookup("FB_SEED").and_then(|raw| parse_value("FB_SEED", &raw)),
            fire_interval: positive_or("FB_FIRE_INTERVAL", fire_interval, defaults.fire_interval),
        }
    }

    /// Wall-clock duration of one frame.
    #[must_use]
    pub fn frame_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f32(1.0 / self.target_fps)
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .and_then(|raw| parse_value(key, &raw))
        .unwrap_or(default)
}

fn parse_value<T>(key: &str, raw: &str) -> Option<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Ignoring {key}={raw:?}: {e}");
            None
        }
    }
}

fn positive_or(key: &str, value: f32, default: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        warn!("Ignoring {key}={value}: must be positive");
        default
    }
}
