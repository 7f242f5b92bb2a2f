//! Sensor report intake.
//!
//! A [`CollisionResolver`](crate::resolver::CollisionResolver) calls these
//! callbacks while a tank is in the scan phase of its step. Reports are value
//! records, never references into another tank, so the scanning tank can
//! keep them without aliasing anybody's mutable state.
//!
//! Enemy, ally and wall reports keep only the most recent call of a tick.
//! Bullet reports queue up in call order and are drained into the tick's
//! snapshot.

use serde::{Deserialize, Serialize};

use super::{Tank, TankId};
use crate::constants::TARGETING_ALARM_TICKS;

/// What a radar sees of another tank.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankSighting {
    /// Id of the tank.
    pub id: TankId,
    /// Position x.
    pub x: f64,
    /// Position y.
    pub y: f64,
    /// Body heading in degrees.
    pub angle: f64,
    /// Distance covered in the tank's last step.
    pub speed: f64,
    /// Requested throttle; its sign tells forward from reverse.
    pub throttle: f64,
    /// Remaining energy.
    pub energy: f64,
}

/// What a radar sees of a bullet. Also the bullet record of a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletSighting {
    /// Id of the bullet.
    pub id: u64,
    /// Position x.
    pub x: f64,
    /// Position y.
    pub y: f64,
    /// Heading in degrees.
    pub angle: f64,
    /// Distance per tick.
    pub speed: f64,
    /// Damage dealt on impact.
    pub damage: f64,
}

impl Tank {
    /// Reports an enemy in the radar beam.
    pub fn on_enemy_spot(&mut self, enemy: TankSighting) {
        self.sensors.enemy = Some(enemy);
    }

    /// Reports an ally in the radar beam.
    pub fn on_ally_spot(&mut self, ally: TankSighting) {
        self.sensors.ally = Some(ally);
    }

    /// Queues a bullet in the radar beam.
    pub fn on_bullet_spot(&mut self, bullet: BulletSighting) {
        self.sensors.bullets.push_back(bullet);
    }

    /// Reports the distance to the wall in the radar beam.
    pub fn on_wall_spot(&mut self, distance: f64) {
        self.sensors.wall_distance = Some(distance);
    }

    /// Raises the targeting alarm: an enemy radar is pointing at this tank.
    pub fn on_targeting_alarm(&mut self) {
        self.sensors.targeting_alarm_timer = TARGETING_ALARM_TICKS;
    }

    /// Enemy reported during the current scan, if any.
    #[must_use]
    pub fn enemy_spot(&self) -> Option<&TankSighting> {
        self.sensors.enemy.as_ref()
    }

    /// Ally reported during the current scan, if any.
    #[must_use]
    pub fn ally_spot(&self) -> Option<&TankSighting> {
        self.sensors.ally.as_ref()
    }

    /// Wall distance reported during the current scan, if any.
    #[must_use]
    pub fn wall_distance(&self) -> Option<f64> {
        self.sensors.wall_distance
    }

    /// Number of bullet reports waiting to be drained.
    #[must_use]
    pub fn pending_bullets(&self) -> usize {
        self.sensors.bullets.len()
    }

    /// `true` while an enemy radar has recently swept over this tank.
    #[must_use]
    pub fn targeting_alarm(&self) -> bool {
        self.sensors.targeting_alarm_timer > 0
    }

    /// The record other tanks' radars receive about this tank.
    #[must_use]
    pub fn sighting(&self) -> TankSighting {
        TankSighting {
            id: self.id,
            x: self.kinematics.position.x,
            y: self.kinematics.position.y,
            angle: self.kinematics.angle,
            speed: self.kinematics.speed,
            throttle: self.controls.throttle,
            energy: self.energy,
        }
    }
}
