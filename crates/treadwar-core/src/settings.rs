//! Battle configuration.
//!
//! [`BattleSettings`] describes the arena a battle is fought in. Settings are
//! plain serde data: every field has a default, so a settings document only
//! needs to name what it overrides.
//!
//! # Example
//!
//! ```
//! use treadwar_core::settings::BattleSettings;
//!
//! let settings = BattleSettings::from_json_str(r#"{ "width": 400, "seed": 7 }"#)?;
//! assert_eq!(settings.width, 400.0);
//! assert_eq!(settings.height, 550.0);
//! assert_eq!(settings.seed, Some(7));
//! # Ok::<(), treadwar_core::error::SettingsError>(())
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SettingsError, SettingsResult};

/// Default arena width.
pub const DEFAULT_WIDTH: f64 = 850.0;

/// Default arena height.
pub const DEFAULT_HEIGHT: f64 = 550.0;

/// Default radius of a tank hull used for collision tests.
pub const DEFAULT_TANK_RADIUS: f64 = 18.0;

/// Default number of ticks before a battle is called.
pub const DEFAULT_TICK_LIMIT: u64 = 30_000;

/// Arena and battle configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BattleSettings {
    /// Arena width; walls sit at x = 0 and x = width.
    pub width: f64,
    /// Arena height; walls sit at y = 0 and y = height.
    pub height: f64,
    /// Radius of every tank hull.
    pub tank_radius: f64,
    /// Master seed. `None` derives one from the clock.
    pub seed: Option<u64>,
    /// Ticks after which the battle ends regardless of survivors.
    pub tick_limit: u64,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tank_radius: DEFAULT_TANK_RADIUS,
            seed: None,
            tick_limit: DEFAULT_TICK_LIMIT,
        }
    }
}

impl BattleSettings {
    /// Returns default settings with a fixed master seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Parses and validates settings from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed JSON and
    /// [`SettingsError::Invalid`] when a value is out of range.
    pub fn from_json_str(json: &str) -> SettingsResult<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reads, parses and validates settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Io`] when the file cannot be read, otherwise
    /// the same errors as [`BattleSettings::from_json_str`].
    pub fn from_path(path: impl AsRef<Path>) -> SettingsResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Checks that the arena can hold at least one tank.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] naming the first bad field.
    pub fn validate(&self) -> SettingsResult<()> {
        if !(self.tank_radius.is_finite() && self.tank_radius > 0.0) {
            return Err(SettingsError::Invalid {
                field: "tank_radius",
                reason: format!("must be positive, got {}", self.tank_radius),
            });
        }
        let min_side = self.tank_radius * 2.0;
        if !(self.width.is_finite() && self.width > min_side) {
            return Err(SettingsError::Invalid {
                field: "width",
                reason: format!("must exceed the tank diameter {min_side}, got {}", self.width),
            });
        }
        if !(self.height.is_finite() && self.height > min_side) {
            return Err(SettingsError::Invalid {
                field: "height",
                reason: format!("must exceed the tank diameter {min_side}, got {}", self.height),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_arena() {
        let settings = BattleSettings::default();
        assert!((settings.width - 850.0).abs() < f64::EPSILON);
        assert!((settings.height - 550.0).abs() < f64::EPSILON);
        assert!(settings.seed.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn empty_document_uses_defaults() {
        let settings = BattleSettings::from_json_str("{}").unwrap();
        assert_eq!(settings, BattleSettings::default());
    }

    #[test]
    fn rejects_zero_radius() {
        let err = BattleSettings::from_json_str(r#"{ "tank_radius": 0 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "tank_radius", .. }));
    }

    #[test]
    fn rejects_arena_smaller_than_a_tank() {
        let err = BattleSettings::from_json_str(r#"{ "width": 30 }"#).unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "width", .. }));
    }

    #[test]
    fn rejects_malformed_json() {
        let err = BattleSettings::from_json_str("[1, 2").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = BattleSettings::from_path("/nonexistent/treadwar/settings.json").unwrap_err();
        assert!(matches!(err, SettingsError::Io { .. }));
    }

    #[test]
    fn serialization_roundtrip() {
        let settings = BattleSettings::seeded(99);
        let json = serde_json::to_string(&settings).unwrap();
        let back = BattleSettings::from_json_str(&json).unwrap();
        assert_eq!(settings, back);
    }
}
