//! Test helper functions for setting up tanks, resolvers and battles.
//!
//! This module provides factory functions and a scripted resolver that make
//! writing tests more ergonomic and consistent.

use std::sync::Arc;

use crate::battle::Battle;
use crate::resolver::{CollisionResolver, TankSignal};
use crate::settings::BattleSettings;
use crate::tank::{AiDefinition, BulletSighting, Tank, TankId, TankSighting};
use crate::team::TeamChannel;

// =============================================================================
// Scripted Resolver
// =============================================================================

/// Resolver calls, in the order a step made them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    Check(TankId),
    Update(TankId),
    ScanTanks(TankId),
    ScanBullets(TankId),
    ScanWalls(TankId),
}

/// What `check_tank` reports when it rejects a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blocker {
    Wall,
    Enemy,
    Ally,
}

/// A resolver whose answers are set up front.
///
/// Every scan replays the same readings until they are changed. Each call is
/// logged to `calls`.
#[derive(Debug)]
pub struct ScriptedResolver {
    /// `None` accepts every move.
    pub blocker: Option<Blocker>,
    pub enemy: Option<TankSighting>,
    pub ally: Option<TankSighting>,
    pub bullets: Vec<BulletSighting>,
    pub wall: Option<f64>,
    /// Handed out on the next `take_signals`.
    pub signals: Vec<TankSignal>,
    pub calls: Vec<Call>,
}

impl Default for ScriptedResolver {
    fn default() -> Self {
        Self::accepting()
    }
}

impl ScriptedResolver {
    /// Accepts every move and sees nothing.
    pub fn accepting() -> Self {
        Self {
            blocker: None,
            enemy: None,
            ally: None,
            bullets: Vec::new(),
            wall: None,
            signals: Vec::new(),
            calls: Vec::new(),
        }
    }

    /// Rejects every move, reporting `blocker` to the mover.
    pub fn blocking(blocker: Blocker) -> Self {
        Self {
            blocker: Some(blocker),
            ..Self::accepting()
        }
    }
}

impl CollisionResolver for ScriptedResolver {
    fn check_tank(&mut self, tank: &mut Tank) -> bool {
        self.calls.push(Call::Check(tank.id()));
        match self.blocker {
            None => true,
            Some(Blocker::Wall) => {
                tank.on_wall_hit();
                false
            }
            Some(Blocker::Enemy) => {
                tank.on_enemy_hit();
                false
            }
            Some(Blocker::Ally) => {
                tank.on_ally_hit();
                false
            }
        }
    }

    fn update_tank(&mut self, tank: &Tank) {
        self.calls.push(Call::Update(tank.id()));
    }

    fn scan_tanks(&mut self, tank: &mut Tank) {
        self.calls.push(Call::ScanTanks(tank.id()));
        if let Some(enemy) = self.enemy {
            tank.on_enemy_spot(enemy);
        }
        if let Some(ally) = self.ally {
            tank.on_ally_spot(ally);
        }
    }

    fn scan_bullets(&mut self, tank: &mut Tank) {
        self.calls.push(Call::ScanBullets(tank.id()));
        for bullet in &self.bullets {
            tank.on_bullet_spot(*bullet);
        }
    }

    fn scan_walls(&mut self, tank: &mut Tank) {
        self.calls.push(Call::ScanWalls(tank.id()));
        if let Some(distance) = self.wall {
            tank.on_wall_spot(distance);
        }
    }

    fn take_signals(&mut self) -> Vec<TankSignal> {
        std::mem::take(&mut self.signals)
    }
}

// =============================================================================
// Factory Functions
// =============================================================================

/// Creates a teamless tank at the origin heading 0.
pub fn tank(id: u64) -> Tank {
    Tank::new(&AiDefinition::new(format!("tank-{id}")), TankId::new(id)).unwrap()
}

/// Creates a teamless tank at a given pose.
pub fn tank_at(id: u64, x: f64, y: f64, angle: f64) -> Tank {
    let mut tank = tank(id);
    tank.move_to(x, y, Some(angle));
    tank
}

/// Creates a tank that belongs to `team`.
pub fn teamed_tank(id: u64, team: &Arc<dyn TeamChannel>) -> Tank {
    let mut tank = tank(id);
    tank.set_team(Arc::downgrade(team));
    tank
}

/// A radar record of another tank.
pub fn sighting(id: u64, x: f64, y: f64, throttle: f64) -> TankSighting {
    TankSighting {
        id: TankId::new(id),
        x,
        y,
        angle: 0.0,
        speed: 1.0,
        throttle,
        energy: 100.0,
    }
}

/// A radar record of a bullet.
pub fn bullet(id: u64) -> BulletSighting {
    BulletSighting {
        id,
        x: 10.0 * f64::from(u32::try_from(id).unwrap_or(0)),
        y: 0.0,
        angle: 180.0,
        speed: 4.0,
        damage: 1.0,
    }
}

/// Creates a seeded battle with `count` teamless tanks.
pub fn seeded_battle(seed: u64, count: usize) -> Battle {
    let mut battle = Battle::new(BattleSettings::seeded(seed)).unwrap();
    for i in 0..count {
        battle.add_tank(&AiDefinition::new(format!("bot-{i}"))).unwrap();
    }
    battle
}

/// Applies scripted controls that depend only on tick and tank id.
pub fn scripted_controls(tank: &mut Tank, tick: u64) {
    #[allow(clippy::cast_precision_loss)]
    let phase = (tick + tank.id().as_u64() * 7) as f64;
    tank.set_throttle((phase * 0.05).sin());
    tank.set_turn((phase * 0.03).cos());
    tank.set_radar_turn(1.0);
    tank.set_gun_turn(-0.5);
    tank.set_boost(tick % 50 < 10);
    if tick % 40 == 0 {
        tank.shoot(0.3);
    }
}
