//! Immutable match configuration: field geometry, physics constants and timing.
//!
//! Every simulation component receives the section it needs at construction time
//! and never reads any other ambient state.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_4;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Longest remote-input lookback accepted, in seconds of ticks.
pub const MAX_LOOKBACK_SECONDS: u64 = 60;

/// Playable field dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorldConfig {
    pub width: f32,
    pub height: f32,
    /// Thickness of the top and bottom walls.
    pub wall_thickness: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 600.0,
            wall_thickness: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaddleConfig {
    pub width: f32,
    pub height: f32,
    /// Horizontal distance from the side edge of the field.
    pub margin: f32,
    /// Velocity gained per second while exactly one direction is held.
    pub acceleration: f32,
    pub max_speed: f32,
    /// Fraction of velocity kept per 1/60 s while no single direction is held.
    pub friction: f32,
}

impl Default for PaddleConfig {
    fn default() -> Self {
        Self {
            width: 10.0,
            height: 80.0,
            margin: 20.0,
            acceleration: 3000.0,
            max_speed: 450.0,
            friction: 0.8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BallConfig {
    pub radius: f32,
    pub initial_speed: f32,
    pub max_speed: f32,
    /// Vertical velocity added when the ball hits the very edge of a paddle.
    pub max_spin: f32,
    /// Largest serve angle away from the horizontal, in radians.
    pub max_serve_angle: f32,
}

impl Default for BallConfig {
    fn default() -> Self {
        Self {
            radius: 6.0,
            initial_speed: 300.0,
            max_speed: 700.0,
            max_spin: 250.0,
            max_serve_angle: FRAC_PI_4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimingConfig {
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Upper bound on wall-clock seconds fed to the accumulator per render callback.
    pub max_frame_delta: f32,
    /// How many frames the remote input fallback looks back for a snapshot.
    pub lookback_horizon: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            max_frame_delta: 0.25,
            lookback_horizon: 300,
        }
    }
}

impl TimingConfig {
    pub fn tick_seconds(&self) -> f32 {
        1.0 / self.tick_rate as f32
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub world: WorldConfig,
    pub paddle: PaddleConfig,
    pub ball: BallConfig,
    pub timing: TimingConfig,
    /// Score that ends an offline match.
    pub score_limit: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            paddle: PaddleConfig::default(),
            ball: BallConfig::default(),
            timing: TimingConfig::default(),
            score_limit: 5,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a JSON config file; missing fields keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: GameConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {}", value),
                })
            }
        }

        positive("world.width", self.world.width)?;
        positive("world.height", self.world.height)?;
        positive("paddle.width", self.paddle.width)?;
        positive("paddle.height", self.paddle.height)?;
        positive("paddle.maxSpeed", self.paddle.max_speed)?;
        positive("ball.radius", self.ball.radius)?;
        positive("ball.initialSpeed", self.ball.initial_speed)?;
        positive("ball.maxSpeed", self.ball.max_speed)?;
        positive("timing.maxFrameDelta", self.timing.max_frame_delta)?;

        if self.timing.tick_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "timing.tickRate",
                reason: "must be at least 1".to_string(),
            });
        }
        let max_horizon = MAX_LOOKBACK_SECONDS * self.timing.tick_rate as u64;
        if self.timing.lookback_horizon as u64 > max_horizon {
            return Err(ConfigError::Invalid {
                field: "timing.lookbackHorizon",
                reason: format!(
                    "must be at most {} frames ({}s of ticks), got {}",
                    max_horizon, MAX_LOOKBACK_SECONDS, self.timing.lookback_horizon
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.paddle.friction) {
            return Err(ConfigError::Invalid {
                field: "paddle.friction",
                reason: format!("must be within 0..=1, got {}", self.paddle.friction),
            });
        }
        let playable = self.world.height - 2.0 * self.world.wall_thickness;
        if playable < self.paddle.height {
            return Err(ConfigError::Invalid {
                field: "paddle.height",
                reason: format!("does not fit in playable height {}", playable),
            });
        }
        Ok(())
    }
}
