//! Collision and sensing seam between a tank and its world.
//!
//! A tank never looks at other tanks. During
//! [`Tank::simulation_step`](crate::tank::Tank::simulation_step) it hands
//! itself to a [`CollisionResolver`], which decides whether the tentative
//! move is legal and reports what the tank's radar can see.
//!
//! # Two-phase effects
//!
//! Some effects land on a tank other than the one being stepped: the tank
//! that gets rammed, or the tank an enemy radar sweeps over. The resolver
//! only ever holds `&mut` to the stepping tank, so it queues those effects as
//! [`TankSignal`]s. The driver drains them with
//! [`CollisionResolver::take_signals`] after each step and delivers them
//! before the next tank steps.
//!
//! # Invariants
//!
//! - `check_tank` must not move the tank; the step rolls back on `false`
//! - Scans only call sensor callbacks on the scanning tank
//! - Resolvers must be deterministic given the same sequence of calls
//!
//! # Available Resolvers
//!
//! - [`ArenaResolver`]: rectangular walls, circular hulls, radar cones

mod arena;

pub use arena::ArenaResolver;

use serde::{Deserialize, Serialize};

use crate::tank::{Tank, TankId};

/// An effect on another tank, queued while a tank is being stepped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TankSignal {
    /// `victim` was rammed by the stepping tank.
    Rammed {
        /// Tank that was hit.
        victim: TankId,
        /// Speed at which the rammer closed in.
        closing_speed: f64,
    },
    /// An enemy radar swept over `target`.
    TargetingAlarm {
        /// Tank that was detected.
        target: TankId,
    },
}

impl TankSignal {
    /// Tank the signal is addressed to.
    #[must_use]
    pub const fn recipient(&self) -> TankId {
        match *self {
            Self::Rammed { victim, .. } => victim,
            Self::TargetingAlarm { target } => target,
        }
    }

    /// Applies the signal to its recipient.
    pub fn apply(&self, tank: &mut Tank) {
        match *self {
            Self::Rammed { closing_speed, .. } => tank.on_being_ram(closing_speed),
            Self::TargetingAlarm { .. } => tank.on_targeting_alarm(),
        }
    }
}

/// Geometry collaborator consulted by every tank step.
///
/// # Implementation Guidelines
///
/// 1. **Legality**: `check_tank` sees the tank at its tentative position. It
///    may call the tank's hit callbacks (`on_wall_hit`, `on_enemy_hit`,
///    `on_ally_hit`) and queue a [`TankSignal::Rammed`] for the tank that was
///    hit. Return `false` to reject the move.
///
/// 2. **Commit**: `update_tank` is called with the committed pose, after
///    rotation. Later scans in the same tick should see it.
///
/// 3. **Scans**: each scan may call the matching sensor callback on the
///    scanning tank any number of times. Enemy and wall reports keep the
///    last call; bullet reports accumulate.
///
/// # Example
///
/// ```
/// use treadwar_core::resolver::CollisionResolver;
/// use treadwar_core::tank::{AiDefinition, Tank, TankId};
///
/// /// Open field: every move is legal and nothing is ever seen.
/// struct OpenField;
///
/// impl CollisionResolver for OpenField {
///     fn check_tank(&mut self, _tank: &mut Tank) -> bool {
///         true
///     }
///     fn update_tank(&mut self, _tank: &Tank) {}
///     fn scan_tanks(&mut self, _tank: &mut Tank) {}
///     fn scan_bullets(&mut self, _tank: &mut Tank) {}
///     fn scan_walls(&mut self, _tank: &mut Tank) {}
/// }
///
/// let mut tank = Tank::new(&AiDefinition::new("Drifter"), TankId::new(1))?;
/// tank.set_throttle(1.0);
/// tank.simulation_step(&mut OpenField);
/// assert!(tank.x() > 0.0);
/// # Ok::<(), treadwar_core::error::TankError>(())
/// ```
pub trait CollisionResolver {
    /// Returns `true` when the tank's tentative position is collision-free.
    fn check_tank(&mut self, tank: &mut Tank) -> bool;

    /// Records the tank's committed pose.
    fn update_tank(&mut self, tank: &Tank);

    /// Reports tanks in the radar beam.
    fn scan_tanks(&mut self, tank: &mut Tank);

    /// Reports bullets in the radar beam.
    fn scan_bullets(&mut self, tank: &mut Tank);

    /// Reports the distance to the wall in the radar beam.
    fn scan_walls(&mut self, tank: &mut Tank);

    /// Drains signals queued for other tanks since the last call.
    fn take_signals(&mut self) -> Vec<TankSignal> {
        Vec::new()
    }
}

impl<R: CollisionResolver + ?Sized> CollisionResolver for &mut R {
    fn check_tank(&mut self, tank: &mut Tank) -> bool {
        (**self).check_tank(tank)
    }

    fn update_tank(&mut self, tank: &Tank) {
        (**self).update_tank(tank);
    }

    fn scan_tanks(&mut self, tank: &mut Tank) {
        (**self).scan_tanks(tank);
    }

    fn scan_bullets(&mut self, tank: &mut Tank) {
        (**self).scan_bullets(tank);
    }

    fn scan_walls(&mut self, tank: &mut Tank) {
        (**self).scan_walls(tank);
    }

    fn take_signals(&mut self) -> Vec<TankSignal> {
        (**self).take_signals()
    }
}
