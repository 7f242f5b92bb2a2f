//! Immutable per-tick state published by a tank.
//!
//! A [`TankState`] is built at the end of every
//! [`Tank::simulation_step`](crate::tank::Tank::simulation_step) and is the
//! only surface the AI controller and the renderer read. Every field is a
//! value copy, so holding a snapshot never observes later mutation of the
//! tank. Field names serialize in camelCase, the shape AI scripts expect.
//!
//! # Example
//!
//! ```
//! use treadwar_core::snapshot::TankState;
//!
//! let state = TankState::default();
//! let json = serde_json::to_value(&state).unwrap();
//! assert!(json["radar"]["targetingAlarm"].is_boolean());
//! assert!(json["radar"]["bullets"].is_array());
//! ```

use serde::{Deserialize, Serialize};

use crate::tank::{BulletSighting, TankId, TankSighting};
use crate::team::RadioMessage;

/// Snapshot of one tank at the end of a tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TankState {
    /// Committed x position.
    pub x: f64,
    /// Committed y position.
    pub y: f64,
    /// Body heading in degrees.
    pub angle: f64,
    /// Remaining energy.
    pub energy: f64,
    /// Remaining boost.
    pub boost: u32,
    /// Distance actually travelled during the tick.
    pub speed: f64,
    /// Collisions registered during the tick.
    pub collisions: CollisionState,
    /// Radar readings.
    pub radar: RadarState,
    /// Gun turret state.
    pub gun: GunState,
    /// Team radio.
    pub radio: RadioState,
}

/// Collision flags of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionState {
    /// Hit a wall.
    pub wall: bool,
    /// Hit or was rammed by an enemy.
    pub enemy: bool,
    /// Hit an ally.
    pub ally: bool,
}

/// Radar readings of one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarState {
    /// Radar heading relative to the body, in degrees.
    pub angle: f64,
    /// An enemy radar swept over this tank recently.
    pub targeting_alarm: bool,
    /// Distance to the wall in the radar beam, if within range.
    pub wall_distance: Option<f64>,
    /// Enemy in the radar beam.
    pub enemy: Option<SpottedTank>,
    /// Ally in the radar beam.
    pub ally: Option<SpottedTank>,
    /// Bullets in the radar beam, in detection order.
    pub bullets: Vec<BulletSighting>,
}

/// Gun turret state of one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GunState {
    /// Gun heading relative to the body, in degrees.
    pub angle: f64,
    /// The gun cannot fire yet.
    pub reloading: bool,
}

/// Team radio state of one tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RadioState {
    /// Messages received from teammates since the previous tick.
    pub inbox: Vec<RadioMessage>,
}

/// Another tank as seen through the radar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpottedTank {
    /// Id of the spotted tank.
    pub id: TankId,
    /// Position x.
    pub x: f64,
    /// Position y.
    pub y: f64,
    /// Body heading in degrees.
    pub angle: f64,
    /// Speed; for enemies negative while the enemy drives in reverse.
    pub speed: f64,
    /// Remaining energy.
    pub energy: f64,
}

impl SpottedTank {
    /// Projects an enemy sighting; speed carries the throttle direction.
    #[must_use]
    pub fn enemy(sighting: &TankSighting) -> Self {
        let direction = if sighting.throttle < 0.0 { -1.0 } else { 1.0 };
        Self {
            speed: sighting.speed * direction,
            ..Self::ally(sighting)
        }
    }

    /// Projects an ally sighting; speed is unsigned.
    #[must_use]
    pub fn ally(sighting: &TankSighting) -> Self {
        Self {
            id: sighting.id,
            x: sighting.x,
            y: sighting.y,
            angle: sighting.angle,
            speed: sighting.speed,
            energy: sighting.energy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sighting(throttle: f64) -> TankSighting {
        TankSighting {
            id: TankId::new(4),
            x: 10.0,
            y: 20.0,
            angle: 45.0,
            speed: 1.5,
            throttle,
            energy: 80.0,
        }
    }

    #[test]
    fn enemy_speed_is_signed_by_throttle() {
        assert!((SpottedTank::enemy(&sighting(-0.5)).speed + 1.5).abs() < 1e-12);
        assert!((SpottedTank::enemy(&sighting(0.5)).speed - 1.5).abs() < 1e-12);
        assert!((SpottedTank::enemy(&sighting(0.0)).speed - 1.5).abs() < 1e-12);
    }

    #[test]
    fn ally_speed_is_unsigned() {
        let spotted = SpottedTank::ally(&sighting(-1.0));
        assert!((spotted.speed - 1.5).abs() < 1e-12);
        assert_eq!(spotted.id, TankId::new(4));
        assert!((spotted.energy - 80.0).abs() < 1e-12);
    }

    #[test]
    fn serializes_camel_case() {
        let mut state = TankState::default();
        state.radar.wall_distance = Some(12.0);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["radar"]["wallDistance"], serde_json::json!(12.0));
        assert_eq!(json["gun"]["reloading"], serde_json::json!(false));
        assert!(json["radar"]["enemy"].is_null());
    }

    #[test]
    fn serialization_roundtrip() {
        let mut state = TankState::default();
        state.radar.enemy = Some(SpottedTank::enemy(&sighting(1.0)));
        let json = serde_json::to_string(&state).unwrap();
        let back: TankState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
