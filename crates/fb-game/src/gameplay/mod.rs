//! Gameplay objects created through the injector.

mod nazi;
mod player;
mod projectile;
mod spawner;

pub use nazi::{Nazi, NaziArgs};
pub use player::{Player, PlayerArgs};
pub use projectile::{Projectile, ProjectileArgs};
pub use spawner::{Spawner, SpawnerArgs};

/// Names the gameplay objects are wired by.
pub mod names {
    pub const GAMEPLAY_REGISTRY: &str = "GameplayRegistry";
    pub const DEBUG_DRAWER: &str = "DebugDrawer";
    pub const CROWD: &str = "Crowd";
    pub const INPUT: &str = "Input";
    pub const PLAYER: &str = "Player";
}
