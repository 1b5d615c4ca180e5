//! Game tuning
//!
//! One explicitly constructed value owned by the `Session` and cloned into
//! every level it builds. Loadable from JSON; missing fields fall back to the
//! stock values.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Problems reading a tuning file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid tuning JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value: {0}")]
    Invalid(&'static str),
}

/// Player movement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerTuning {
    /// Horizontal acceleration while a direction is held (px/s²)
    pub move_acceleration: f32,
    /// Horizontal deceleration when no direction is held (px/s²)
    pub friction: f32,
    /// Horizontal speed cap (px/s)
    pub max_move_speed: f32,
    /// Downward acceleration (px/s²)
    pub gravity: f32,
    /// Terminal fall speed (px/s)
    pub max_fall_speed: f32,
    /// Upward speed applied by a jump (px/s)
    pub jump_velocity: f32,
    /// How long a jump press is remembered before landing (s)
    pub jump_buffer_time: f32,
    /// How long after leaving the ground a jump is still allowed (s)
    pub coyote_time: f32,
    /// Invulnerability after respawning (s)
    pub respawn_invulnerability: f32,
    /// Collision box as a fraction of the sprite frame
    pub bounds_width_factor: f32,
    pub bounds_height_factor: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            move_acceleration: 2400.0,
            friction: 3000.0,
            max_move_speed: 300.0,
            gravity: 3400.0,
            max_fall_speed: 550.0,
            jump_velocity: 900.0,
            jump_buffer_time: 0.1,
            coyote_time: 0.08,
            respawn_invulnerability: 1.5,
            bounds_width_factor: 0.4,
            bounds_height_factor: 0.8,
        }
    }
}

/// Enemy behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTuning {
    /// Patrol speed (px/s)
    pub speed: f32,
    /// Chase speed (px/s)
    pub chase_speed: f32,
    /// Vertical distance within which the player counts as in sight (px)
    pub chase_band: f32,
    /// Pause before turning around (s)
    pub max_wait_time: f32,
}

impl Default for EnemyTuning {
    fn default() -> Self {
        Self {
            speed: 64.0,
            chase_speed: 128.0,
            chase_band: 20.0,
            max_wait_time: 0.5,
        }
    }
}

/// Powerups and bullets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectibleTuning {
    pub gem_points: u32,
    /// Bullets granted per ammo pickup
    pub ammo_per_pickup: u32,
    pub starting_ammo: u32,
    pub bullet_speed: f32,
    /// Bullets leave this far above the player's feet (px)
    pub muzzle_height: f32,
}

impl Default for CollectibleTuning {
    fn default() -> Self {
        Self {
            gem_points: 30,
            ammo_per_pickup: 5,
            starting_ammo: 10,
            bullet_speed: 500.0,
            muzzle_height: 25.0,
        }
    }
}

/// Per-level rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelTuning {
    /// Countdown at level start (s)
    pub time_limit: f32,
    /// Score per remaining second once the exit is reached
    pub points_per_second: u32,
    /// Exit only counts once the key has been collected
    pub exit_requires_key: bool,
}

impl Default for LevelTuning {
    fn default() -> Self {
        Self {
            time_limit: 120.0,
            points_per_second: 5,
            exit_requires_key: false,
        }
    }
}

/// All game tunables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub enemy: EnemyTuning,
    pub collectibles: CollectibleTuning,
    pub level: LevelTuning,
}

impl Tuning {
    /// Parse and validate a JSON tuning document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        log::info!("Loaded tuning overrides");
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.level.time_limit <= 0.0 {
            return Err(ConfigError::Invalid("level.time_limit must be positive"));
        }
        if self.player.max_move_speed <= 0.0 || self.player.max_fall_speed <= 0.0 {
            return Err(ConfigError::Invalid("player speed caps must be positive"));
        }
        if self.enemy.max_wait_time < 0.0 || self.enemy.chase_band < 0.0 {
            return Err(ConfigError::Invalid("enemy wait time and chase band cannot be negative"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "enemy": { "chase_speed": 200.0 } }"#).unwrap();
        assert_eq!(tuning.enemy.chase_speed, 200.0);
        assert_eq!(tuning.enemy.speed, 64.0);
        assert_eq!(tuning.collectibles.gem_points, 30);
    }

    #[test]
    fn test_json_round_trip() {
        let mut tuning = Tuning::default();
        tuning.level.exit_requires_key = true;
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(matches!(
            Tuning::from_json(r#"{ "level": { "time_limit": 0.0 } }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(Tuning::from_json("{"), Err(ConfigError::Parse(_))));
    }
}
