//! State components that make up a [`Tank`](super::Tank).
//!
//! Each component groups fields that change together during a tick. They are
//! plain data; all rules live on `Tank` itself.

use std::collections::VecDeque;

use bitflags::bitflags;
use glam::DVec2;

use super::sensors::{BulletSighting, TankSighting};
use crate::constants::GUN_RELOAD_TIME;

bitflags! {
    /// Per-tick collision flags.
    ///
    /// `WALL`, `ENEMY` and `ALLY` are cleared before every collision check.
    /// `RAMMED` survives until the tank's next step, where it turns into
    /// `ENEMY`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CollisionFlags: u8 {
        /// Hit an arena wall.
        const WALL = 1 << 0;
        /// Hit an enemy tank.
        const ENEMY = 1 << 1;
        /// Hit an allied tank.
        const ALLY = 1 << 2;
        /// Was rammed by another tank since the last step.
        const RAMMED = 1 << 3;
    }
}

impl CollisionFlags {
    /// Flags that describe the tank's own movement this tick.
    pub const PER_TICK: Self = Self::WALL.union(Self::ENEMY).union(Self::ALLY);
}

/// Control inputs written by the AI between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    /// Requested throttle in [-1, 1].
    pub throttle: f64,
    /// Body turn in [-1, 1].
    pub turn: f64,
    /// Gun turn in [-1, 1].
    pub gun_turn: f64,
    /// Radar turn in [-1, 1].
    pub radar_turn: f64,
    /// Boost requested.
    pub boost: bool,
}

/// Position, headings and speed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Kinematics {
    /// Current position.
    pub position: DVec2,
    /// Position committed at the end of the previous step.
    pub last_position: DVec2,
    /// Body heading in degrees.
    pub angle: f64,
    /// Gun heading relative to the body.
    pub gun_angle: f64,
    /// Radar heading relative to the body.
    pub radar_angle: f64,
    /// Smoothed displacement per tick along the heading.
    pub actual_throttle: f64,
    /// Distance covered during the last step.
    pub speed: f64,
}

/// Gun reload and pending shot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gun {
    /// Ticks to reload after a full-power shot.
    pub reload_time: u32,
    /// Ticks left until the gun can fire again.
    pub timer: u32,
    /// Power of a shot waiting to be spawned, 0 when none.
    pub shooting_power: f64,
}

impl Default for Gun {
    fn default() -> Self {
        Self {
            reload_time: GUN_RELOAD_TIME,
            timer: 0,
            shooting_power: 0.0,
        }
    }
}

/// Sensor reports collected during the scan phase of a step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SensorReadings {
    /// Last enemy reported this tick.
    pub enemy: Option<TankSighting>,
    /// Last ally reported this tick.
    pub ally: Option<TankSighting>,
    /// Bullets reported since the last drain, in report order.
    pub bullets: VecDeque<BulletSighting>,
    /// Last wall distance reported this tick.
    pub wall_distance: Option<f64>,
    /// Ticks left on the targeting alarm.
    pub targeting_alarm_timer: u32,
}

impl SensorReadings {
    /// Forgets the single-value readings of the previous tick.
    ///
    /// The bullet queue is drained separately when the snapshot is built.
    pub fn clear_spots(&mut self) {
        self.enemy = None;
        self.ally = None;
        self.wall_distance = None;
    }
}
