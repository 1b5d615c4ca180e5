//! Cave Runner - A tile-based side-scrolling platformer
//!
//! Core modules:
//! - `sim`: Deterministic simulation (tile grid, physics, collisions, enemies)
//! - `settings`: Data-driven game tuning
//! - `highscores`: Leaderboard fed by the "record score" notification
//! - `session`: Level sequencing and the player's run across levels

pub mod highscores;
pub mod session;
pub mod settings;
pub mod sim;

pub use highscores::HighScores;
pub use session::Session;
pub use settings::{ConfigError, Tuning};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Tile dimensions in world pixels
    pub const TILE_WIDTH: f32 = 40.0;
    pub const TILE_HEIGHT: f32 = 32.0;

    /// Default sprite frame size (all stock sprite sheets use square frames)
    pub const SPRITE_FRAME_SIZE: f32 = 64.0;

    /// Bullet box
    pub const BULLET_SIZE: f32 = 10.0;
}

/// Sign of `x` as -1, 0 or 1
#[inline]
pub fn signum_or_zero(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

/// Move `value` toward zero by `amount` without crossing it
#[inline]
pub fn approach_zero(value: f32, amount: f32) -> f32 {
    if value.abs() <= amount {
        0.0
    } else {
        value - signum_or_zero(value) * amount
    }
}
