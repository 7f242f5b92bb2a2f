//! Error types for tank construction, battle setup and settings loading.
//!
//! Runtime control input is never an error: setters clamp out-of-range values
//! instead. Errors only surface where a battle cannot be set up correctly.

use std::path::PathBuf;

use thiserror::Error;

use crate::tank::TankId;

/// Errors raised while creating tanks or addressing them in a battle.
#[derive(Debug, Error)]
pub enum TankError {
    /// The AI definition is missing mandatory identity fields.
    #[error("invalid AI definition: {reason}")]
    InvalidDefinition {
        /// What made the definition unusable.
        reason: String,
    },
    /// The AI definition could not be parsed as a JSON object.
    #[error("malformed AI definition: {0}")]
    MalformedDefinition(#[from] serde_json::Error),
    /// A tank with this id is already part of the battle.
    #[error("tank {0} is already registered")]
    DuplicateId(TankId),
    /// No tank with this id takes part in the battle.
    #[error("unknown tank {0}")]
    UnknownTank(TankId),
    /// Every id above the highest registered one is taken.
    #[error("no free tank id left")]
    IdsExhausted,
}

/// Errors raised while loading [`BattleSettings`](crate::settings::BattleSettings).
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings file could not be read.
    #[error("failed to read settings from {path}: {source}")]
    Io {
        /// File that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },
    /// The settings document is not valid JSON for the settings schema.
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
    /// A value is outside its legal range.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        /// Name of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Result alias for tank and battle operations.
pub type TankResult<T> = Result<T, TankError>;

/// Result alias for settings loading.
pub type SettingsResult<T> = Result<T, SettingsError>;
