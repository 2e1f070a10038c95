use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub situp: SitupConfig,
    #[serde(default)]
    pub jump: JumpConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SitupConfig {
    /// EMA weight of the newest hip angle sample.
    #[serde(default = "default_situp_alpha")]
    pub ema_alpha: f32,
    /// Smoothed angle below which the crunch counts as reached (degrees).
    #[serde(default = "default_down_angle")]
    pub down_angle: f32,
    /// Smoothed angle above which the rep completes (degrees).
    #[serde(default = "default_up_angle")]
    pub up_angle: f32,
    #[serde(default = "default_min_visibility")]
    pub min_visibility: f32,
}

/// Which hip reading the jump velocity is measured against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VelocityReference {
    /// Previous frame's smoothed hip height.
    PreviousSmoothed,
    /// Previous frame's rolling-mean hip height, before the EMA.
    PreviousRaw,
}

#[derive(Clone, Debug, Deserialize)]
pub struct JumpConfig {
    #[serde(default = "default_jump_alpha")]
    pub ema_alpha: f32,
    #[serde(default = "default_calibration_frames")]
    pub calibration_frames: u32,
    /// Frames in the hip-height rolling mean.
    #[serde(default = "default_history_len")]
    pub history_len: usize,
    /// Real-world torso length the shoulder-hip distance is scaled to.
    #[serde(default = "default_torso_length_cm")]
    pub torso_length_cm: f32,
    /// Hip drop below standing height that arms a jump.
    #[serde(default = "default_crouch_depth_cm")]
    pub crouch_depth_cm: f32,
    /// Pixels per frame; negative is upward.
    #[serde(default = "default_takeoff_velocity")]
    pub takeoff_velocity: f32,
    #[serde(default = "default_landing_velocity")]
    pub landing_velocity: f32,
    #[serde(default = "default_velocity_reference")]
    pub velocity_reference: VelocityReference,
    /// Only used for the calibration countdown message.
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,
}

fn default_situp_alpha() -> f32 { 0.15 }
fn default_down_angle() -> f32 { 90.0 }
fn default_up_angle() -> f32 { 150.0 }
fn default_min_visibility() -> f32 { 0.3 }
fn default_jump_alpha() -> f32 { 0.4 }
fn default_calibration_frames() -> u32 { 60 }
fn default_history_len() -> usize { 5 }
fn default_torso_length_cm() -> f32 { 50.0 }
fn default_crouch_depth_cm() -> f32 { 10.0 }
fn default_takeoff_velocity() -> f32 { -2.0 }
fn default_landing_velocity() -> f32 { 0.5 }
fn default_velocity_reference() -> VelocityReference { VelocityReference::PreviousSmoothed }
fn default_frames_per_second() -> u32 { 30 }

impl Default for SitupConfig {
    fn default() -> Self {
        Self {
            ema_alpha: default_situp_alpha(),
            down_angle: default_down_angle(),
            up_angle: default_up_angle(),
            min_visibility: default_min_visibility(),
        }
    }
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            ema_alpha: default_jump_alpha(),
            calibration_frames: default_calibration_frames(),
            history_len: default_history_len(),
            torso_length_cm: default_torso_length_cm(),
            crouch_depth_cm: default_crouch_depth_cm(),
            takeoff_velocity: default_takeoff_velocity(),
            landing_velocity: default_landing_velocity(),
            velocity_reference: default_velocity_reference(),
            frames_per_second: default_frames_per_second(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml(&content)?;
        log::info!("loaded counter config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_alpha("situp.ema_alpha", self.situp.ema_alpha)?;
        check_alpha("jump.ema_alpha", self.jump.ema_alpha)?;

        if self.situp.down_angle >= self.situp.up_angle {
            return Err(ConfigError::Invalid(format!(
                "situp.down_angle ({}) must be below situp.up_angle ({})",
                self.situp.down_angle, self.situp.up_angle
            )));
        }
        if self.jump.calibration_frames == 0 {
            return Err(ConfigError::Invalid(
                "jump.calibration_frames must be at least 1".to_string(),
            ));
        }
        if self.jump.history_len == 0 {
            return Err(ConfigError::Invalid(
                "jump.history_len must be at least 1".to_string(),
            ));
        }
        if self.jump.takeoff_velocity >= self.jump.landing_velocity {
            return Err(ConfigError::Invalid(format!(
                "jump.takeoff_velocity ({}) must be below jump.landing_velocity ({})",
                self.jump.takeoff_velocity, self.jump.landing_velocity
            )));
        }
        Ok(())
    }
}

fn check_alpha(name: &str, alpha: f32) -> Result<(), ConfigError> {
    if alpha > 0.0 && alpha <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!(
            "{name} must be in (0, 1], got {alpha}"
        )))
    }
}
