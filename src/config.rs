//! Simulation tuning
//!
//! Loaded from an optional JSON file; every field has a default so partial
//! files work.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;
use crate::units::UnitConverter;

/// Surface response of a body
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialConfig {
    pub restitution: f32,
    pub friction: f32,
    /// Velocity decay (1/s)
    pub linear_damping: f32,
    /// Spin decay (1/s)
    pub angular_damping: f32,
}

impl Default for MaterialConfig {
    fn default() -> Self {
        Self {
            restitution: 0.5,
            friction: 0.5,
            linear_damping: 0.0,
            angular_damping: 0.0,
        }
    }
}

impl MaterialConfig {
    /// Ball material: bouncy, with enough damping that it comes to rest
    pub fn ball() -> Self {
        Self {
            restitution: 0.6,
            friction: 0.4,
            linear_damping: 0.4,
            angular_damping: 0.8,
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === Field ===
    /// Playfield width (pixels)
    pub field_width: f32,
    /// Playfield height (pixels)
    pub field_height: f32,
    /// Boundary wall thickness (pixels)
    pub wall_thickness: f32,

    // === Physics ===
    /// Gravity (m/s², positive y is down)
    pub gravity: Vec2,
    /// Display pixels per simulation meter
    pub pixels_per_meter: f32,
    pub ball_material: MaterialConfig,
    pub platform_material: MaterialConfig,
    pub wall_material: MaterialConfig,

    // === Settling ===
    /// Ball speed at or below which it counts as resting (m/s)
    pub settle_speed: f32,
    /// How long the ball must stay below `settle_speed` to end the attempt (s)
    pub settle_time: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            field_width: FIELD_WIDTH,
            field_height: FIELD_HEIGHT,
            wall_thickness: WALL_THICKNESS,

            gravity: Vec2::new(0.0, GRAVITY),
            pixels_per_meter: PIXELS_PER_METER,
            ball_material: MaterialConfig::ball(),
            platform_material: MaterialConfig::default(),
            wall_material: MaterialConfig::default(),

            settle_speed: 0.05,
            settle_time: 0.5,
        }
    }
}

impl SimulationConfig {
    /// Load config from a JSON file and validate it
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded simulation config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("field_width", self.field_width),
            ("field_height", self.field_height),
            ("wall_thickness", self.wall_thickness),
            ("pixels_per_meter", self.pixels_per_meter),
        ];
        for (field, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("must be positive, got {value}"),
                });
            }
        }
        if !self.gravity.is_finite() {
            return Err(ConfigError::Invalid {
                field: "gravity",
                message: "must be finite".into(),
            });
        }
        if !self.settle_speed.is_finite() || self.settle_speed < 0.0 {
            return Err(ConfigError::Invalid {
                field: "settle_speed",
                message: format!("must be non-negative, got {}", self.settle_speed),
            });
        }
        if !self.settle_time.is_finite() || self.settle_time < 0.0 {
            return Err(ConfigError::Invalid {
                field: "settle_time",
                message: format!("must be non-negative, got {}", self.settle_time),
            });
        }
        Ok(())
    }

    pub fn units(&self) -> UnitConverter {
        UnitConverter::new(self.pixels_per_meter)
    }

    /// Field size (pixels)
    pub fn field_size(&self) -> Vec2 {
        Vec2::new(self.field_width, self.field_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimulationConfig::from_json(r#"{ "field_width": 800.0 }"#).unwrap();
        assert_eq!(config.field_width, 800.0);
        assert_eq!(config.field_height, FIELD_HEIGHT);
        assert_eq!(config.ball_material, MaterialConfig::ball());
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = SimulationConfig::from_json(r#"{ "wall_thickness": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "wall_thickness", .. }));

        let err = SimulationConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_units_follow_ratio() {
        let config = SimulationConfig {
            pixels_per_meter: 64.0,
            ..Default::default()
        };
        assert_eq!(config.units().to_meters(64.0), 1.0);
    }
}
