//! # Treadwar Core
//!
//! Deterministic tank-battle simulation core for Treadwar.
//!
//! This crate provides the per-tick tank state machine, the seam to the
//! collision/radar collaborator, and a reference battle loop. AI scripts,
//! bullets in flight and rendering live outside; they talk to the core
//! through control setters, [`snapshot::TankState`] and
//! [`battle::TickReport`].
//!
//! ## Architecture
//!
//! - **Tank**: owns one entrant's state; advanced by `simulation_step`
//! - **Resolver**: decides move legality and feeds the radar
//! - **Battle**: steps tanks in id order, delivers cross-tank signals, scores
//!
//! ## Usage
//!
//! ```
//! use treadwar_core::{AiDefinition, Battle, BattleSettings};
//!
//! let settings = BattleSettings {
//!     tick_limit: 200,
//!     ..BattleSettings::seeded(1)
//! };
//! let mut battle = Battle::new(settings)?;
//! battle.add_tank(&AiDefinition::new("Alpha").with_team("red"))?;
//! battle.add_tank(&AiDefinition::new("Bravo").with_team("blue"))?;
//!
//! let result = battle.run_until_finished(|tank| {
//!     tank.set_turn(1.0);
//!     tank.set_radar_turn(-1.0);
//! });
//! assert!(result.ticks > 0 && result.ticks <= 200);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod battle;
pub mod constants;
pub mod error;
pub mod geometry;
pub mod resolver;
pub mod settings;
pub mod snapshot;
pub mod tank;
pub mod team;

pub use battle::{Battle, BattleResult, ShotFired, Side, TickReport};
pub use error::{SettingsError, TankError};
pub use resolver::{ArenaResolver, CollisionResolver, TankSignal};
pub use settings::BattleSettings;
pub use snapshot::TankState;
pub use tank::{AiDefinition, Tank, TankId};
pub use team::{Team, TeamChannel};

#[cfg(test)]
mod tests;
