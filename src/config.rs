use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::controller::input::{KeyBindings, ReleasePolicy};
use crate::controller::movement::FacingPolicy;
use crate::error::ConfigError;
use crate::model::scenery::{CHARACTER_NODE, GROUND_NODE};

/// Tunables for the character controller. Every field has a default, so a
/// config file only needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Units per second along each movement axis.
    pub movement_speed: f32,
    /// Wait before the first scene scan for collision volumes.
    pub settle_delay_secs: f32,
    pub facing: FacingPolicy,
    pub release_policy: ReleasePolicy,
    /// Node names never turned into collision volumes.
    pub reserved_names: Vec<String>,
    pub bindings: KeyBindings,
    /// Upper bound hosts apply to wall-clock frame deltas.
    pub max_tick_secs: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            movement_speed: 1.0,
            settle_delay_secs: 1.0,
            facing: FacingPolicy::Snap,
            release_policy: ReleasePolicy::AnyHeld,
            reserved_names: vec![CHARACTER_NODE.to_string(), GROUND_NODE.to_string()],
            bindings: KeyBindings::default(),
            max_tick_secs: 0.1,
        }
    }
}

impl ControllerConfig {
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.movement_speed.is_finite() && self.movement_speed > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "movement_speed",
                reason: "must be finite and positive",
                value: self.movement_speed,
            });
        }
        if !(self.settle_delay_secs.is_finite() && self.settle_delay_secs >= 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "settle_delay_secs",
                reason: "must be finite and non-negative",
                value: self.settle_delay_secs,
            });
        }
        if !(self.max_tick_secs.is_finite() && self.max_tick_secs > 0.0) {
            return Err(ConfigError::OutOfRange {
                field: "max_tick_secs",
                reason: "must be finite and positive",
                value: self.max_tick_secs,
            });
        }
        if let FacingPolicy::Smooth { turn_rate } = self.facing {
            if !(turn_rate.is_finite() && turn_rate > 0.0) {
                return Err(ConfigError::OutOfRange {
                    field: "facing.turn_rate",
                    reason: "must be finite and positive",
                    value: turn_rate,
                });
            }
        }
        Ok(())
    }

    /// Clamp a wall-clock delta into a usable tick length.
    pub fn tick_delta(&self, raw_secs: f64) -> f32 {
        if raw_secs.is_finite() {
            (raw_secs as f32).clamp(0.0, self.max_tick_secs)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_is_default() {
        let config = ControllerConfig::from_json_str("{}").unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.reserved_names, vec!["character", "ground"]);
    }

    #[test]
    fn test_partial_override() {
        let config = ControllerConfig::from_json_str(
            r#"{ "movement_speed": 2.5, "facing": { "Smooth": { "turn_rate": 4.0 } }, "release_policy": "LastEvent" }"#,
        )
        .unwrap();
        assert_eq!(config.movement_speed, 2.5);
        assert_eq!(config.facing, FacingPolicy::Smooth { turn_rate: 4.0 });
        assert_eq!(config.release_policy, ReleasePolicy::LastEvent);
        assert_eq!(config.settle_delay_secs, 1.0);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = ControllerConfig::from_json_str(r#"{ "movement_speed": 0.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "movement_speed", .. }), "got {err}");
        let err = ControllerConfig::from_json_str(r#"{ "settle_delay_secs": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::OutOfRange { field: "settle_delay_secs", .. }));
        assert!(matches!(
            ControllerConfig::from_json_str("{ not json").unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = ControllerConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_tick_delta_clamps() {
        let config = ControllerConfig::default();
        assert!((config.tick_delta(0.016) - 0.016).abs() < 1e-7);
        assert_eq!(config.tick_delta(2.0), 0.1);
        assert_eq!(config.tick_delta(-1.0), 0.0);
        assert_eq!(config.tick_delta(f64::NAN), 0.0);
    }
}
