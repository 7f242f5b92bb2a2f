//! The battle driver: registration, the tick loop and scoring.
//!
//! [`Battle`] owns every tank, every team and one resolver. Each call to
//! [`Battle::step`] advances all tanks by one tick:
//!
//! 1. **STEP**: tanks step in ascending [`TankId`] order against the resolver
//! 2. **DELIVER**: after each tank, signals the resolver queued for other
//!    tanks (rams, targeting alarms) are applied before the next tank steps
//! 3. **SHOOT**: each living tank's pending shot is consumed into a
//!    [`ShotFired`] record
//!
//! Bullets are not simulated here. The caller spawns them from the returned
//! [`TickReport`], moves them, and reports impacts with
//! [`Battle::apply_bullet_hit`].
//!
//! # Determinism
//!
//! Given the same master seed, the same definitions in the same order and the
//! same control inputs, two battles produce identical snapshots:
//! - initial angles and positions come from one `ChaCha8Rng`
//! - tanks, teams and resolver indexes are `BTreeMap`s
//!
//! # Example
//!
//! ```
//! use treadwar_core::battle::Battle;
//! use treadwar_core::settings::BattleSettings;
//! use treadwar_core::tank::AiDefinition;
//!
//! let mut battle = Battle::new(BattleSettings::seeded(42))?;
//! let a = battle.add_tank(&AiDefinition::new("Alpha"))?;
//! let b = battle.add_tank(&AiDefinition::new("Bravo"))?;
//!
//! for _ in 0..10 {
//!     battle.tank_mut(a).unwrap().set_throttle(1.0);
//!     battle.step();
//! }
//!
//! assert_eq!(battle.tick(), 10);
//! assert!(battle.tank(b).unwrap().state().is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use crate::error::{SettingsResult, TankError, TankResult};
use crate::geometry::{heading_vector, normalize_angle};
use crate::resolver::{ArenaResolver, CollisionResolver};
use crate::settings::BattleSettings;
use crate::tank::{clock_seed, AiDefinition, Tank, TankId};
use crate::team::{Team, TeamChannel};

/// Placement attempts before a tank is dropped on an occupied spot.
const MAX_PLACEMENT_ATTEMPTS: usize = 200;

// =============================================================================
// Records
// =============================================================================

/// A shot consumed from a tank during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotFired {
    /// Tank that fired.
    pub tank: TankId,
    /// Shot power in [0.1, 1].
    pub power: f64,
    /// Muzzle x.
    pub x: f64,
    /// Muzzle y.
    pub y: f64,
    /// Absolute heading of the gun, in degrees.
    pub angle: f64,
}

impl ShotFired {
    /// Places the shot at the tip of the tank's gun barrel.
    fn from_muzzle(tank: &Tank, power: f64) -> Self {
        let angle = normalize_angle(tank.angle() + tank.gun_angle());
        let muzzle = tank.position() + heading_vector(angle) * tank.gun_length();
        Self {
            tank: tank.id(),
            power,
            x: muzzle.x,
            y: muzzle.y,
            angle,
        }
    }
}

/// What happened during one [`Battle::step`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    /// The tick that was just completed, starting at 1.
    pub tick: u64,
    /// Shots fired during the tick, in tank order.
    pub shots: Vec<ShotFired>,
}

/// A faction still able to win: a named team or a teamless tank.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Every tank of the named team.
    Team(String),
    /// A tank fighting alone.
    Solo(TankId),
}

impl Side {
    /// The side `tank` fights for.
    #[must_use]
    pub fn of(tank: &Tank) -> Self {
        tank.team_name()
            .map_or_else(|| Self::Solo(tank.id()), Self::Team)
    }
}

/// Final standings of a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleResult {
    /// Ticks played.
    pub ticks: u64,
    /// The only side left alive, if exactly one is.
    pub winner: Option<Side>,
    /// Score per tank, survive bonus included.
    pub scores: BTreeMap<TankId, f64>,
}

// =============================================================================
// Battle
// =============================================================================

/// The reference simulation loop.
///
/// `Battle` manages:
/// - Tank registration with seeded angles and non-overlapping placement
/// - Teams, created on first use by name
/// - The resolver, shared by every tank step
/// - Deferred cross-tank signals
/// - Scoring and finish detection
pub struct Battle<R = ArenaResolver> {
    settings: BattleSettings,
    resolver: R,
    tanks: BTreeMap<TankId, Tank>,
    teams: BTreeMap<String, Arc<Team>>,
    rng: ChaCha8Rng,
    master_seed: u64,
    tick: u64,
    next_id: u64,
    finished: bool,
}

impl<R> fmt::Debug for Battle<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Battle")
            .field("settings", &self.settings)
            .field("tanks", &self.tanks.len())
            .field("teams", &self.teams.keys().collect::<Vec<_>>())
            .field("master_seed", &self.master_seed)
            .field("tick", &self.tick)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

impl Battle<ArenaResolver> {
    /// Creates a battle in a walled arena sized by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`](crate::error::SettingsError::Invalid)
    /// when the settings fail validation.
    pub fn new(settings: BattleSettings) -> SettingsResult<Self> {
        let resolver = ArenaResolver::from_settings(&settings);
        Self::with_resolver(settings, resolver)
    }
}

impl<R: CollisionResolver> Battle<R> {
    /// Creates a battle driven by a custom resolver.
    ///
    /// # Arguments
    ///
    /// * `settings` - Arena size, hull radius, seed and tick limit
    /// * `resolver` - Collision and radar collaborator for every step
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`](crate::error::SettingsError::Invalid)
    /// when the settings fail validation.
    pub fn with_resolver(settings: BattleSettings, resolver: R) -> SettingsResult<Self> {
        settings.validate()?;
        let master_seed = settings.seed.unwrap_or_else(clock_seed);
        info!(
            seed = master_seed,
            width = settings.width,
            height = settings.height,
            "battle created"
        );
        Ok(Self {
            settings,
            resolver,
            tanks: BTreeMap::new(),
            teams: BTreeMap::new(),
            rng: ChaCha8Rng::seed_from_u64(master_seed),
            master_seed,
            tick: 0,
            next_id: 1,
            finished: false,
        })
    }

    // -------------------------------------------------------------------------
    // Registration
    // -------------------------------------------------------------------------

    /// Adds a tank under the next free id.
    ///
    /// # Errors
    ///
    /// Returns [`TankError::InvalidDefinition`] for a blank name and
    /// [`TankError::IdsExhausted`] when no id above the last one is free.
    pub fn add_tank(&mut self, definition: &AiDefinition) -> TankResult<TankId> {
        let mut id = TankId::new(self.next_id);
        while self.tanks.contains_key(&id) {
            let next = id.as_u64().checked_add(1).ok_or(TankError::IdsExhausted)?;
            id = TankId::new(next);
        }
        self.insert_tank(definition, id)
    }

    /// Adds a tank under a caller-chosen id.
    ///
    /// The tank gets a random heading and a free spot inside the walls, joins
    /// its team (created on first use) and is committed to the resolver.
    ///
    /// # Errors
    ///
    /// Returns [`TankError::DuplicateId`] when `id` is taken and
    /// [`TankError::InvalidDefinition`] for a blank name.
    pub fn insert_tank(&mut self, definition: &AiDefinition, id: TankId) -> TankResult<TankId> {
        if self.tanks.contains_key(&id) {
            return Err(TankError::DuplicateId(id));
        }
        let mut tank = Tank::new(definition, id)?;
        tank.randomize_with(&mut self.rng);
        let (x, y) = self.free_position();
        tank.move_to(x, y, None);

        if let Some(name) = &definition.team {
            let team = self
                .teams
                .entry(name.clone())
                .or_insert_with(|| Arc::new(Team::new(name.clone())));
            team.join(id);
            let channel: Arc<dyn TeamChannel> = team.clone();
            tank.set_team(Arc::downgrade(&channel));
        }

        self.resolver.update_tank(&tank);
        debug!(tank = %id, name = %tank.name(), x, y, angle = tank.angle(), "tank added");
        self.tanks.insert(id, tank);
        self.next_id = self.next_id.max(id.as_u64().saturating_add(1));
        Ok(id)
    }

    /// Picks a spot whose hull stays clear of the walls and of every tank
    /// placed so far.
    fn free_position(&mut self) -> (f64, f64) {
        let r = self.settings.tank_radius;
        let (width, height) = (self.settings.width, self.settings.height);
        let mut candidate = (width / 2.0, height / 2.0);
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            candidate = (self.rng.gen_range(r..width - r), self.rng.gen_range(r..height - r));
            let clear = self.tanks.values().all(|other| {
                let dx = other.x() - candidate.0;
                let dy = other.y() - candidate.1;
                dx.hypot(dy) > 2.0 * r
            });
            if clear {
                return candidate;
            }
        }
        warn!(x = candidate.0, y = candidate.1, "arena crowded, tank placed overlapping");
        candidate
    }

    // -------------------------------------------------------------------------
    // Tick loop
    // -------------------------------------------------------------------------

    /// Advances every tank by one tick.
    pub fn step(&mut self) -> TickReport {
        self.tick += 1;
        let mut shots = Vec::new();

        let ids: Vec<TankId> = self.tanks.keys().copied().collect();
        for id in ids {
            if let Some(tank) = self.tanks.get_mut(&id) {
                tank.simulation_step(&mut self.resolver);

                let power = tank.handle_shoot();
                if power > 0.0 && !tank.is_destroyed() {
                    let shot = ShotFired::from_muzzle(tank, power);
                    debug!(tank = %id, power, x = shot.x, y = shot.y, "shot fired");
                    shots.push(shot);
                }
            }
            self.deliver_signals();
        }

        TickReport {
            tick: self.tick,
            shots,
        }
    }

    fn deliver_signals(&mut self) {
        for signal in self.resolver.take_signals() {
            let recipient = signal.recipient();
            let Some(tank) = self.tanks.get_mut(&recipient) else {
                trace!(tank = %recipient, "signal for unknown tank dropped");
                continue;
            };
            signal.apply(tank);
            trace!(tank = %recipient, ?signal, "signal delivered");
            self.resolver.update_tank(tank);
        }
    }

    /// Applies a bullet impact and scores it.
    ///
    /// The shooter scores the damage and, when the hit destroys the target,
    /// the kill bonus. Hits on allies, on oneself and on wrecks score nothing.
    ///
    /// # Returns
    ///
    /// `true` when this hit destroyed the target.
    ///
    /// # Errors
    ///
    /// Returns [`TankError::UnknownTank`] when either tank is not registered.
    pub fn apply_bullet_hit(
        &mut self,
        shooter: TankId,
        target: TankId,
        damage: f64,
    ) -> TankResult<bool> {
        let shooter_tank = self.tanks.get(&shooter).ok_or(TankError::UnknownTank(shooter))?;
        let target_tank = self.tanks.get(&target).ok_or(TankError::UnknownTank(target))?;
        if target_tank.is_destroyed() {
            return Ok(false);
        }
        let scores = shooter != target && !shooter_tank.is_ally(target_tank);

        let target_tank = self
            .tanks
            .get_mut(&target)
            .ok_or(TankError::UnknownTank(target))?;
        target_tank.on_damage(damage);
        let killed = target_tank.is_destroyed();
        self.resolver.update_tank(target_tank);

        if scores {
            let shooter_tank = self
                .tanks
                .get_mut(&shooter)
                .ok_or(TankError::UnknownTank(shooter))?;
            shooter_tank.on_enemy_hit_score(damage);
            if killed {
                shooter_tank.on_enemy_kill_score();
            }
        }
        if killed {
            debug!(%shooter, %target, "kill");
        }
        Ok(killed)
    }

    // -------------------------------------------------------------------------
    // Outcome
    // -------------------------------------------------------------------------

    /// Sides with at least one living tank.
    #[must_use]
    pub fn alive_sides(&self) -> BTreeSet<Side> {
        self.tanks
            .values()
            .filter(|tank| !tank.is_destroyed())
            .map(Side::of)
            .collect()
    }

    /// `true` once the tick limit is reached or at most one side is alive.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished || self.tick >= self.settings.tick_limit || self.alive_sides().len() <= 1
    }

    /// Ends the battle. Survivors get the survive bonus, once.
    pub fn finish(&mut self) -> BattleResult {
        if !self.finished {
            for tank in self.tanks.values_mut().filter(|tank| !tank.is_destroyed()) {
                tank.on_survive_score();
            }
            self.finished = true;
        }

        let sides = self.alive_sides();
        let winner = if sides.len() == 1 {
            sides.into_iter().next()
        } else {
            None
        };
        let result = BattleResult {
            ticks: self.tick,
            winner,
            scores: self
                .tanks
                .iter()
                .map(|(id, tank)| (*id, tank.score()))
                .collect(),
        };
        info!(ticks = result.ticks, winner = ?result.winner, "battle finished");
        result
    }

    /// Steps until the battle is over, calling `control` on every living
    /// tank before each tick, then finishes it.
    ///
    /// Shots are consumed but not simulated; use [`Battle::step`] directly to
    /// run bullets.
    pub fn run_until_finished<F>(&mut self, mut control: F) -> BattleResult
    where
        F: FnMut(&mut Tank),
    {
        while !self.is_finished() {
            for tank in self.tanks.values_mut().filter(|tank| !tank.is_destroyed()) {
                control(tank);
            }
            self.step();
        }
        self.finish()
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Returns a tank by id.
    #[must_use]
    pub fn tank(&self, id: TankId) -> Option<&Tank> {
        self.tanks.get(&id)
    }

    /// Returns a tank by id for control input.
    pub fn tank_mut(&mut self, id: TankId) -> Option<&mut Tank> {
        self.tanks.get_mut(&id)
    }

    /// Iterates tanks in id order.
    pub fn tanks(&self) -> impl Iterator<Item = &Tank> {
        self.tanks.values()
    }

    /// Iterates tanks mutably in id order.
    pub fn tanks_mut(&mut self) -> impl Iterator<Item = &mut Tank> {
        self.tanks.values_mut()
    }

    /// Number of registered tanks.
    #[must_use]
    pub fn tank_count(&self) -> usize {
        self.tanks.len()
    }

    /// Returns a team by name.
    #[must_use]
    pub fn team(&self, name: &str) -> Option<&Arc<Team>> {
        self.teams.get(name)
    }

    /// Ticks completed so far.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Master seed in use.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.master_seed
    }

    /// Battle settings.
    #[must_use]
    pub const fn settings(&self) -> &BattleSettings {
        &self.settings
    }

    /// The resolver.
    #[must_use]
    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// The resolver, for bullet tracking.
    pub fn resolver_mut(&mut self) -> &mut R {
        &mut self.resolver
    }
}
