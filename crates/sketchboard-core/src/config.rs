//! Editor tuning knobs.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Distances are in canvas units unless noted otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Half-width of the resize handle band.
    pub handle_padding: f64,
    /// Extra ring outside the handle band that starts a rotation.
    pub rotation_padding: f64,
    pub hit_tolerance: f64,
    pub snap_tolerance: f64,
    /// Snaps closer than this are not applied.
    pub snap_dead_zone: f64,
    pub guide_dedup_distance: f64,
    pub max_guides_per_axis: usize,
    /// Screen pixels the pointer must travel before a press becomes a drag.
    pub drag_threshold: f64,
    pub duplicate_offset: f64,
    pub selection_padding: f64,
    pub anchor_tolerance: f64,
    pub history_limit: usize,
    pub rotation_snap_degrees: f64,
    pub snapping_enabled: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            handle_padding: 8.0,
            rotation_padding: 16.0,
            hit_tolerance: 4.0,
            snap_tolerance: 5.0,
            snap_dead_zone: 0.5,
            guide_dedup_distance: 2.0,
            max_guides_per_axis: 3,
            drag_threshold: 2.0,
            duplicate_offset: 10.0,
            selection_padding: 4.0,
            anchor_tolerance: 12.0,
            history_limit: 50,
            rotation_snap_degrees: 15.0,
            snapping_enabled: true,
        }
    }
}

impl EditorConfig {
    /// Parse and validate. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let distances = [
            ("handle_padding", self.handle_padding),
            ("rotation_padding", self.rotation_padding),
            ("hit_tolerance", self.hit_tolerance),
            ("snap_tolerance", self.snap_tolerance),
            ("snap_dead_zone", self.snap_dead_zone),
            ("guide_dedup_distance", self.guide_dedup_distance),
            ("drag_threshold", self.drag_threshold),
            ("duplicate_offset", self.duplicate_offset),
            ("selection_padding", self.selection_padding),
            ("anchor_tolerance", self.anchor_tolerance),
            ("rotation_snap_degrees", self.rotation_snap_degrees),
        ];
        for (name, value) in distances {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid("history_limit must be at least 1".into()));
        }
        Ok(())
    }

    pub fn rotation_snap_radians(&self) -> f64 {
        self.rotation_snap_degrees.to_radians()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EditorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EditorConfig::from_json(r#"{ "snap_tolerance": 8.0 }"#).unwrap();
        assert!((config.snap_tolerance - 8.0).abs() < f64::EPSILON);
        assert_eq!(config.history_limit, 50);
    }

    #[test]
    fn test_rejects_negative_padding() {
        let err = EditorConfig::from_json(r#"{ "handle_padding": -1.0 }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_zero_history() {
        let config = EditorConfig {
            history_limit: 0,
            ..EditorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_round_trip() {
        let config = EditorConfig::default();
        let json = config.to_json().unwrap();
        assert_eq!(EditorConfig::from_json(&json).unwrap(), config);
    }
}
