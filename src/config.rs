use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::AppError;
use crate::playback::FrameRate;

pub const DEFAULT_ENDPOINT: &str = "http://192.168.0.106:5000/detect_pose";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub service: ServiceSettings,
    pub playback: PlaybackSettings,
    pub overlay: OverlaySettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceSettings {
    pub endpoint: String,
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Rate the service sampled the video at, as a fraction.
    pub frame_rate_numerator: u32,
    pub frame_rate_denominator: u32,
    pub poll_interval_ms: u64,
    /// Length assumed for a freshly loaded clip until the analysis says otherwise.
    pub assumed_duration_ms: u64,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlaySettings {
    pub canvas_width: f32,
    pub bounce_threshold: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            service: ServiceSettings::default(),
            playback: PlaybackSettings::default(),
            overlay: OverlaySettings::default(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_ms: 120_000,
        }
    }
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            frame_rate_numerator: 30,
            frame_rate_denominator: 1,
            poll_interval_ms: 1000 / 30,
            assumed_duration_ms: 10_000,
        }
    }
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            canvas_width: 640.0,
            bounce_threshold: 0.08,
        }
    }
}

impl Settings {
    /// Defaults, then `strideview.toml` if present, then `STRIDEVIEW__*` variables.
    pub fn load() -> Result<Self, AppError> {
        Self::load_from("strideview")
    }

    pub fn load_from(file_stem: &str) -> Result<Self, AppError> {
        let settings: Settings = Config::builder()
            .add_source(File::with_name(file_stem).required(false))
            .add_source(Environment::with_prefix("STRIDEVIEW").separator("__"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.service.endpoint.trim().is_empty() {
            return Err(AppError::InvalidSettings(
                "Service endpoint must not be empty".to_string(),
            ));
        }
        if self.service.timeout_ms == 0 {
            return Err(AppError::InvalidSettings(
                "Service timeout must be greater than 0".to_string(),
            ));
        }
        if self.playback.frame_rate_numerator == 0 || self.playback.frame_rate_denominator == 0 {
            return Err(AppError::InvalidSettings(
                "Frame rate numerator and denominator must be greater than 0".to_string(),
            ));
        }
        if self.playback.poll_interval_ms == 0 {
            return Err(AppError::InvalidSettings(
                "Poll interval must be greater than 0".to_string(),
            ));
        }
        if self.playback.assumed_duration_ms == 0 {
            return Err(AppError::InvalidSettings(
                "Assumed clip duration must be greater than 0".to_string(),
            ));
        }
        if !(self.overlay.canvas_width.is_finite() && self.overlay.canvas_width > 0.0) {
            return Err(AppError::InvalidSettings(
                "Canvas width must be a positive number".to_string(),
            ));
        }
        if !self.overlay.bounce_threshold.is_finite() {
            return Err(AppError::InvalidSettings(
                "Bounce threshold must be a number".to_string(),
            ));
        }
        Ok(())
    }

    pub fn frame_rate(&self) -> FrameRate {
        FrameRate::new(
            self.playback.frame_rate_numerator,
            self.playback.frame_rate_denominator,
        )
    }
}
