//! Balance constants shared by the tank state machine and its collaborators.
//!
//! These values are part of the external contract: AI scripts are tuned
//! against them and replays depend on them. Any change must bump
//! [`BALANCE_VERSION`].

/// Version of the balance table below.
pub const BALANCE_VERSION: u32 = 1;

// =============================================================================
// Resources
// =============================================================================

/// Energy a tank starts with. A tank at zero energy is destroyed.
pub const MAX_ENERGY: f64 = 100.0;

/// Boost a tank starts with, in ticks of boosted driving.
pub const MAX_BOOST: u32 = 400;

// =============================================================================
// Movement
// =============================================================================

/// Top speed multiplier (units per tick at full throttle) without boost.
pub const SPEED_MULTIPLIER: f64 = 2.0;

/// Top speed multiplier while boosting.
pub const BOOST_SPEED_MULTIPLIER: f64 = 4.0;

/// Smoothing divisor applied to throttle changes without boost.
pub const ACCELERATION_FACTOR: f64 = 20.0;

/// Smoothing divisor applied to throttle changes while boosting.
pub const BOOST_ACCELERATION_FACTOR: f64 = 10.0;

/// Body rotation in degrees per tick at full turn.
pub const BODY_TURN_RATE: f64 = 2.0;

/// Radar rotation in degrees per tick at full turn.
pub const RADAR_TURN_RATE: f64 = 6.0;

/// Gun rotation in degrees per tick at full turn.
pub const GUN_TURN_RATE: f64 = 3.0;

// =============================================================================
// Combat
// =============================================================================

/// Ticks needed to reload after a full-power shot.
pub const GUN_RELOAD_TIME: u32 = 70;

/// Lower bound of shot power.
pub const MIN_SHOT_POWER: f64 = 0.1;

/// Upper bound of shot power.
pub const MAX_SHOT_POWER: f64 = 1.0;

/// Damage taken when hitting a wall, an enemy or an ally.
pub const COLLISION_DAMAGE: f64 = 0.2;

/// Fixed part of ramming damage.
pub const RAM_BASE_DAMAGE: f64 = 0.1;

/// Damage per quarter unit of closing speed when rammed.
pub const RAM_DAMAGE_STEP: f64 = 0.1;

/// Length of the gun barrel; shots spawn at its tip.
pub const GUN_LENGTH: f64 = 25.0;

// =============================================================================
// Sensors
// =============================================================================

/// Radar detection range.
pub const RADAR_RANGE: f64 = 300.0;

/// Full angular width of the radar beam in degrees.
pub const RADAR_FOCAL: f64 = 6.0;

/// Ticks the targeting alarm stays raised after an enemy radar sweep.
pub const TARGETING_ALARM_TICKS: u32 = 3;

// =============================================================================
// Scoring
// =============================================================================

/// Points awarded for destroying an enemy.
pub const KILL_BONUS: f64 = 20.0;

/// Points awarded for surviving until the end of a battle.
pub const SURVIVE_BONUS: f64 = 10.0;

/// Ramming damage for a given closing speed.
///
/// `0.1 + round(speed * 4) * 0.1`; negative speeds are treated by magnitude.
#[must_use]
pub fn ram_damage(closing_speed: f64) -> f64 {
    RAM_BASE_DAMAGE + (closing_speed.abs() * 4.0).round() * RAM_DAMAGE_STEP
}
