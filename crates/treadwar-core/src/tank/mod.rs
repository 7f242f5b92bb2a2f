//! The tank state machine.
//!
//! A [`Tank`] owns all mutable state of one battle entrant:
//! - control inputs written by its AI between ticks
//! - kinematics, energy, boost and gun reload
//! - per-tick collision flags and sensor readings
//! - its score and the last published [`TankState`] snapshot
//!
//! Tanks are advanced by [`Tank::simulation_step`], which delegates collision
//! legality and sensing to an injected
//! [`CollisionResolver`](crate::resolver::CollisionResolver). Everything else
//! happens through the setters and callbacks below; no method ever reaches
//! into another tank.
//!
//! # Example
//!
//! ```
//! use treadwar_core::tank::{AiDefinition, Tank, TankId};
//!
//! let mut tank = Tank::new(&AiDefinition::new("Crawler"), TankId::new(3))?;
//! tank.set_throttle(2.5); // clamped
//! assert_eq!(tank.throttle(), 1.0);
//! assert_eq!(tank.full_name(), "Crawler #3");
//! assert!(tank.state().is_none());
//! # Ok::<(), treadwar_core::error::TankError>(())
//! ```

pub mod components;
mod sensors;
mod step;

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::{SystemTime, UNIX_EPOCH};

use glam::DVec2;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::constants::{
    ram_damage, COLLISION_DAMAGE, GUN_LENGTH, KILL_BONUS, MAX_BOOST, MAX_ENERGY, MAX_SHOT_POWER,
    MIN_SHOT_POWER, RADAR_FOCAL, RADAR_RANGE, SURVIVE_BONUS,
};
use crate::error::{TankError, TankResult};
use crate::geometry::{clamp_unit, normalize_angle};
use crate::snapshot::TankState;
use crate::team::{are_allies, TeamChannel};

pub use components::{CollisionFlags, Controls, Gun, Kinematics, SensorReadings};
pub use sensors::{BulletSighting, TankSighting};

/// Skin applied when the AI does not pick one.
pub const DEFAULT_SKIN: &str = "zebra";

/// Unique identifier of a tank within a battle.
///
/// Ordered by value; battles step tanks in ascending id order.
///
/// # Example
///
/// ```
/// use treadwar_core::tank::TankId;
///
/// assert!(TankId::new(1) < TankId::new(2));
/// assert_eq!(TankId::new(9).to_string(), "9");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TankId(u64);

impl TankId {
    /// Creates a new `TankId` from a raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TankId({})", self.0)
    }
}

impl fmt::Display for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TankId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<TankId> for u64 {
    fn from(id: TankId) -> Self {
        id.0
    }
}

/// Settings an AI may apply once when its tank is created.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TankInit {
    /// Cosmetic skin name.
    #[serde(rename = "SKIN", default, skip_serializing_if = "Option::is_none")]
    pub skin: Option<String>,
}

/// Identity of a battle entrant as supplied by the AI author.
///
/// The script itself runs elsewhere; the core only needs the name, the
/// optional team and the init settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiDefinition {
    /// Display name. Must not be blank.
    pub name: String,
    /// Team to join, if any.
    #[serde(default)]
    pub team: Option<String>,
    /// One-off settings.
    #[serde(default)]
    pub init: TankInit,
}

impl AiDefinition {
    /// Creates a teamless definition.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            team: None,
            init: TankInit::default(),
        }
    }

    /// Sets the team to join.
    #[must_use]
    pub fn with_team(mut self, team: impl Into<String>) -> Self {
        self.team = Some(team.into());
        self
    }

    /// Parses a definition from a JSON object and validates it.
    ///
    /// # Errors
    ///
    /// [`TankError::MalformedDefinition`] when the document is not an object
    /// with a string `name`, [`TankError::InvalidDefinition`] when the name
    /// is blank.
    pub fn from_json(json: &str) -> TankResult<Self> {
        let definition: Self = serde_json::from_str(json)?;
        definition.validate()?;
        Ok(definition)
    }

    /// Checks the mandatory identity fields.
    ///
    /// # Errors
    ///
    /// [`TankError::InvalidDefinition`] when the name is blank.
    pub fn validate(&self) -> TankResult<()> {
        if self.name.trim().is_empty() {
            return Err(TankError::InvalidDefinition {
                reason: "name must not be blank".to_string(),
            });
        }
        Ok(())
    }
}

/// One battle entrant.
#[derive(Clone)]
pub struct Tank {
    id: TankId,
    name: String,
    skin: String,
    team: Option<Weak<dyn TeamChannel>>,
    energy: f64,
    boost: u32,
    controls: Controls,
    kinematics: Kinematics,
    gun: Gun,
    collisions: CollisionFlags,
    sensors: SensorReadings,
    debug_data: Value,
    score: f64,
    state: Option<TankState>,
}

impl fmt::Debug for Tank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tank")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("team", &self.team_name())
            .field("energy", &self.energy)
            .field("boost", &self.boost)
            .field("controls", &self.controls)
            .field("kinematics", &self.kinematics)
            .field("gun", &self.gun)
            .field("collisions", &self.collisions)
            .field("score", &self.score)
            .finish_non_exhaustive()
    }
}

impl Tank {
    /// Creates a tank at the origin, heading 0, with full energy and boost.
    ///
    /// # Errors
    ///
    /// [`TankError::InvalidDefinition`] when the definition has a blank name.
    pub fn new(definition: &AiDefinition, id: TankId) -> TankResult<Self> {
        definition.validate()?;
        let mut tank = Self {
            id,
            name: definition.name.clone(),
            skin: DEFAULT_SKIN.to_string(),
            team: None,
            energy: MAX_ENERGY,
            boost: MAX_BOOST,
            controls: Controls::default(),
            kinematics: Kinematics::default(),
            gun: Gun::default(),
            collisions: CollisionFlags::empty(),
            sensors: SensorReadings::default(),
            debug_data: Value::Object(serde_json::Map::new()),
            score: 0.0,
            state: None,
        };
        tank.init(&definition.init);
        Ok(tank)
    }

    /// Applies one-off AI settings.
    pub fn init(&mut self, settings: &TankInit) {
        if let Some(skin) = settings.skin.as_ref().filter(|s| !s.is_empty()) {
            self.skin.clone_from(skin);
        }
    }

    // -------------------------------------------------------------------------
    // Identity
    // -------------------------------------------------------------------------

    /// Returns the tank's id.
    #[must_use]
    pub const fn id(&self) -> TankId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `"name #id"`.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} #{}", self.name, self.id)
    }

    /// Returns the skin name.
    #[must_use]
    pub fn skin(&self) -> &str {
        &self.skin
    }

    /// Attaches the tank to a team. The tank keeps only a weak handle.
    pub fn set_team(&mut self, team: Weak<dyn TeamChannel>) {
        self.team = Some(team);
    }

    /// Detaches the tank from its team.
    pub fn leave_team(&mut self) {
        self.team = None;
    }

    fn team_channel(&self) -> Option<Arc<dyn TeamChannel>> {
        self.team.as_ref().and_then(Weak::upgrade)
    }

    /// Name of the tank's team, or `None` when teamless or the team is gone.
    #[must_use]
    pub fn team_name(&self) -> Option<String> {
        self.team_channel().map(|team| team.name().to_string())
    }

    /// `true` when both tanks belong to teams with the same name.
    #[must_use]
    pub fn is_ally(&self, other: &Tank) -> bool {
        are_allies(self.team_name().as_deref(), other.team_name().as_deref())
    }

    // -------------------------------------------------------------------------
    // Controls
    // -------------------------------------------------------------------------

    /// Sets the throttle, clamped to [-1, 1].
    pub fn set_throttle(&mut self, value: f64) {
        self.controls.throttle = clamp_unit(value);
    }

    /// Sets the body turn, clamped to [-1, 1].
    pub fn set_turn(&mut self, value: f64) {
        self.controls.turn = clamp_unit(value);
    }

    /// Sets the gun turn, clamped to [-1, 1].
    pub fn set_gun_turn(&mut self, value: f64) {
        self.controls.gun_turn = clamp_unit(value);
    }

    /// Sets the radar turn, clamped to [-1, 1].
    pub fn set_radar_turn(&mut self, value: f64) {
        self.controls.radar_turn = clamp_unit(value);
    }

    /// Requests or releases boost.
    pub fn set_boost(&mut self, enabled: bool) {
        self.controls.boost = enabled;
    }

    /// Stores opaque debug data from the AI for display.
    pub fn set_debug_data(&mut self, data: Value) {
        self.debug_data = data;
    }

    /// Current control inputs.
    #[must_use]
    pub const fn controls(&self) -> &Controls {
        &self.controls
    }

    /// Requested throttle.
    #[must_use]
    pub const fn throttle(&self) -> f64 {
        self.controls.throttle
    }

    /// Debug data last set by the AI.
    #[must_use]
    pub const fn debug_data(&self) -> &Value {
        &self.debug_data
    }

    // -------------------------------------------------------------------------
    // Kinematics
    // -------------------------------------------------------------------------

    /// Places the tank, resetting the previous position so the next step
    /// measures speed from here. Keeps the heading when `angle` is `None`.
    pub fn move_to(&mut self, x: f64, y: f64, angle: Option<f64>) {
        let position = DVec2::new(x, y);
        self.kinematics.position = position;
        self.kinematics.last_position = position;
        if let Some(angle) = angle {
            self.kinematics.angle = normalize_angle(angle);
        }
    }

    /// Kinematic state.
    #[must_use]
    pub const fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> DVec2 {
        self.kinematics.position
    }

    /// Position x.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.kinematics.position.x
    }

    /// Position y.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.kinematics.position.y
    }

    /// Body heading in degrees.
    #[must_use]
    pub const fn angle(&self) -> f64 {
        self.kinematics.angle
    }

    /// Gun heading relative to the body.
    #[must_use]
    pub const fn gun_angle(&self) -> f64 {
        self.kinematics.gun_angle
    }

    /// Radar heading relative to the body.
    #[must_use]
    pub const fn radar_angle(&self) -> f64 {
        self.kinematics.radar_angle
    }

    /// Smoothed per-tick displacement.
    #[must_use]
    pub const fn actual_throttle(&self) -> f64 {
        self.kinematics.actual_throttle
    }

    /// Distance covered during the last step.
    #[must_use]
    pub const fn speed(&self) -> f64 {
        self.kinematics.speed
    }

    /// Radar detection range.
    #[must_use]
    pub const fn radar_range(&self) -> f64 {
        RADAR_RANGE
    }

    /// Full radar beam width in degrees.
    #[must_use]
    pub const fn radar_focal(&self) -> f64 {
        RADAR_FOCAL
    }

    /// Gun barrel length.
    #[must_use]
    pub const fn gun_length(&self) -> f64 {
        GUN_LENGTH
    }

    // -------------------------------------------------------------------------
    // Resources
    // -------------------------------------------------------------------------

    /// Remaining energy.
    #[must_use]
    pub const fn energy(&self) -> f64 {
        self.energy
    }

    /// Starting energy.
    #[must_use]
    pub const fn max_energy(&self) -> f64 {
        MAX_ENERGY
    }

    /// `true` once energy has reached zero.
    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.energy <= 0.0
    }

    /// Remaining boost.
    #[must_use]
    pub const fn boost(&self) -> u32 {
        self.boost
    }

    /// Starting boost.
    #[must_use]
    pub const fn max_boost(&self) -> u32 {
        MAX_BOOST
    }

    /// `true` when boost is requested and some is left.
    #[must_use]
    pub const fn has_boost(&self) -> bool {
        self.controls.boost && self.boost > 0
    }

    // -------------------------------------------------------------------------
    // Gun
    // -------------------------------------------------------------------------

    /// Fires with `power` clamped to [0.1, 1].
    ///
    /// Starts a reload of `round(power * 70)` ticks. While reloading the call
    /// is ignored; shots are never queued. A NaN power is ignored too.
    pub fn shoot(&mut self, power: f64) {
        if power.is_nan() || self.is_reloading() {
            return;
        }
        let power = power.clamp(MIN_SHOT_POWER, MAX_SHOT_POWER);
        // power <= 1, so the product fits the reload time
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let timer = (power * f64::from(self.gun.reload_time)).round() as u32;
        self.gun.timer = timer;
        self.gun.shooting_power = power;
    }

    /// Takes the pending shot power, leaving 0 behind.
    pub fn handle_shoot(&mut self) -> f64 {
        std::mem::take(&mut self.gun.shooting_power)
    }

    /// `true` while a shot is waiting to be spawned.
    #[must_use]
    pub fn is_shooting(&self) -> bool {
        self.gun.shooting_power > 0.0
    }

    /// Power of the pending shot, 0 when none.
    #[must_use]
    pub const fn shooting_power(&self) -> f64 {
        self.gun.shooting_power
    }

    /// `true` while the gun cannot fire.
    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.gun.timer > 0
    }

    /// Gun state.
    #[must_use]
    pub const fn gun(&self) -> &Gun {
        &self.gun
    }

    // -------------------------------------------------------------------------
    // Damage
    // -------------------------------------------------------------------------

    /// Registers a wall collision.
    pub fn on_wall_hit(&mut self) {
        self.collisions.insert(CollisionFlags::WALL);
        self.on_damage(COLLISION_DAMAGE);
    }

    /// Registers a collision with an enemy.
    pub fn on_enemy_hit(&mut self) {
        self.collisions.insert(CollisionFlags::ENEMY);
        self.on_damage(COLLISION_DAMAGE);
    }

    /// Registers a collision with an ally.
    pub fn on_ally_hit(&mut self) {
        self.collisions.insert(CollisionFlags::ALLY);
        self.on_damage(COLLISION_DAMAGE);
    }

    /// Registers being rammed at `closing_speed`.
    ///
    /// Damage applies now; the enemy-hit flag shows up in the snapshot of
    /// this tank's next step.
    pub fn on_being_ram(&mut self, closing_speed: f64) {
        self.collisions.insert(CollisionFlags::RAMMED);
        self.on_damage(ram_damage(closing_speed));
    }

    /// Removes `damage` energy, never going below zero.
    pub fn on_damage(&mut self, damage: f64) {
        if self.is_destroyed() {
            return;
        }
        self.energy = (self.energy - damage.max(0.0)).max(0.0);
        if self.is_destroyed() {
            debug!(tank = %self.id, name = %self.name, "tank destroyed");
        }
    }

    /// Collision flags of the current tick.
    #[must_use]
    pub const fn collisions(&self) -> CollisionFlags {
        self.collisions
    }

    // -------------------------------------------------------------------------
    // Score
    // -------------------------------------------------------------------------

    /// Accumulated score.
    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    /// Scores `damage` dealt to an enemy.
    pub fn on_enemy_hit_score(&mut self, damage: f64) {
        self.score += damage.max(0.0);
    }

    /// Scores destroying an enemy.
    pub fn on_enemy_kill_score(&mut self) {
        self.score += KILL_BONUS;
    }

    /// Scores surviving the battle.
    pub fn on_survive_score(&mut self) {
        self.score += SURVIVE_BONUS;
    }

    // -------------------------------------------------------------------------
    // Snapshot and setup
    // -------------------------------------------------------------------------

    /// Snapshot published by the last completed step.
    #[must_use]
    pub const fn state(&self) -> Option<&TankState> {
        self.state.as_ref()
    }

    /// Points the body in a random direction.
    ///
    /// With `None` the seed comes from the clock plus a random perturbation,
    /// so pass a seed for reproducible battles.
    pub fn randomize(&mut self, seed: Option<u64>) {
        let seed = seed.unwrap_or_else(clock_seed);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.randomize_with(&mut rng);
    }

    /// Points the body in a direction drawn from `rng`.
    pub fn randomize_with<R: RngCore>(&mut self, rng: &mut R) {
        let unit: f64 = rng.gen();
        self.kinematics.angle = normalize_angle((360.0 * unit).round() - 180.0);
    }
}

pub(crate) fn clock_seed() -> u64 {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX));
    millis.wrapping_add(rand::thread_rng().gen_range(0..1_000_000))
}
