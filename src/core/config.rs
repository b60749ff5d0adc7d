//! Configuration for the tile engine
//!
//! Options can be built from one of the [`RenderProfile`] presets, assembled by
//! hand, or loaded from JSON. Every field has a default, so partial documents
//! are accepted.

use crate::core::constants::{
    DEFAULT_ANIMATION_TIME, DEFAULT_BLEND_TIME_MS, DEFAULT_CACHE_CAPACITY, DEFAULT_DECAY_TIME,
    DEFAULT_FADE_TIME_MS, DEFAULT_FRAME_DELAY_MS, DEFAULT_STIFFNESS, SLOW_FRAME_MS,
    VELOCITY_HALF_LIFE_MS,
};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub enum RenderProfile {
    Balanced,
    LowMemory,
    HighQuality,
    Custom(EngineOptions),
}

impl RenderProfile {
    pub fn resolve(&self) -> EngineOptions {
        match self {
            Self::Balanced => EngineOptions::default(),
            Self::LowMemory => EngineOptions {
                cache_capacity: 128,
                blend_time_ms: 0.0,
                fade_time_ms: 0.0,
                frame_delay_ms: 33,
                ..EngineOptions::default()
            },
            Self::HighQuality => EngineOptions {
                cache_capacity: 2048,
                blend_time_ms: 750.0,
                fade_time_ms: 750.0,
                spring: SpringConfig {
                    stiffness: 6.5,
                    animation_time: 1.2,
                    ..SpringConfig::default()
                },
                ..EngineOptions::default()
            },
            Self::Custom(options) => options.clone(),
        }
    }
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Which render backend a viewer would like; `Auto` defers to the capability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendPreference {
    #[default]
    Auto,
    Canvas,
    Element,
    Null,
}

/// Tunables for a [`Spring`](crate::animation::spring::Spring)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub initial_value: f64,
    pub stiffness: f64,
    /// Seconds to complete a `spring_to` transition.
    pub animation_time: f64,
    /// Seconds for a tossed spring to come to rest.
    pub decay_time: f64,
    pub velocity_half_life_ms: f64,
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            initial_value: 0.0,
            stiffness: DEFAULT_STIFFNESS,
            animation_time: DEFAULT_ANIMATION_TIME,
            decay_time: DEFAULT_DECAY_TIME,
            velocity_half_life_ms: VELOCITY_HALF_LIFE_MS,
        }
    }
}

impl SpringConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.stiffness > 0.0) {
            return Err(Error::Config(format!(
                "spring stiffness must be positive, got {}",
                self.stiffness
            )));
        }
        if !(self.animation_time > 0.0) || !(self.decay_time > 0.0) {
            return Err(Error::Config(format!(
                "spring times must be positive (animation_time={}, decay_time={})",
                self.animation_time, self.decay_time
            )));
        }
        if !(self.velocity_half_life_ms > 0.0) {
            return Err(Error::Config(
                "velocity_half_life_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineOptions {
    /// Number of tile views kept resident; clamped to at least 2 by the cache.
    pub cache_capacity: usize,
    pub blend_time_ms: f64,
    pub fade_time_ms: f64,
    /// Fallback tick interval when no animation-frame source exists.
    pub frame_delay_ms: u64,
    pub slow_frame_ms: f64,
    pub backend: BackendPreference,
    pub spring: SpringConfig,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            blend_time_ms: DEFAULT_BLEND_TIME_MS,
            fade_time_ms: DEFAULT_FADE_TIME_MS,
            frame_delay_ms: DEFAULT_FRAME_DELAY_MS,
            slow_frame_ms: SLOW_FRAME_MS,
            backend: BackendPreference::Auto,
            spring: SpringConfig::default(),
        }
    }
}

impl EngineOptions {
    /// Parse options from JSON, filling in defaults for anything missing
    pub fn from_json(json: &str) -> Result<Self> {
        let options: EngineOptions = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.blend_time_ms < 0.0 || self.fade_time_ms < 0.0 {
            return Err(Error::Config(
                "blend and fade times cannot be negative".to_string(),
            ));
        }
        if self.frame_delay_ms == 0 {
            return Err(Error::Config("frame_delay_ms must be non-zero".to_string()));
        }
        self.spring.validate()
    }
}
