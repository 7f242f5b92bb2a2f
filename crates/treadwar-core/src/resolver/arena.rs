//! Reference resolver for a rectangular arena.
//!
//! [`ArenaResolver`] keeps its own index of committed tank poses, refreshed
//! through [`CollisionResolver::update_tank`], plus the bullets the driver
//! tells it about. Tanks are circles of a common radius; walls are the four
//! sides of `[0, width] x [0, height]`.
//!
//! The index is keyed by [`TankId`] in a `BTreeMap`, so every query visits
//! tanks in ascending id order and ties resolve the same way on every run.
//!
//! # Index Synchronization
//!
//! The index only changes when a tank is committed. Damage dealt outside a
//! step (bullet hits, ram signals) is invisible to later queries until the
//! owner calls `update_tank` again:
//!
//! ```
//! # use treadwar_core::resolver::{ArenaResolver, CollisionResolver};
//! # use treadwar_core::tank::{AiDefinition, Tank, TankId};
//! # let mut arena = ArenaResolver::new(850.0, 550.0, 18.0);
//! # let mut tank = Tank::new(&AiDefinition::new("a"), TankId::new(1))?;
//! tank.on_damage(100.0);
//! // REQUIRED: resync so the wreck stops blocking and being detected
//! arena.update_tank(&tank);
//! assert!(!arena.is_alive(TankId::new(1)));
//! # Ok::<(), treadwar_core::error::TankError>(())
//! ```

use std::collections::BTreeMap;

use glam::DVec2;
use tracing::trace;

use super::{CollisionResolver, TankSignal};
use crate::geometry::{angular_distance, bearing, heading_vector, normalize_angle};
use crate::settings::BattleSettings;
use crate::tank::{BulletSighting, Tank, TankId, TankSighting};
use crate::team::are_allies;

/// A committed tank pose as seen by the index.
#[derive(Debug, Clone)]
struct Tracked {
    sighting: TankSighting,
    team: Option<String>,
}

impl Tracked {
    fn position(&self) -> DVec2 {
        DVec2::new(self.sighting.x, self.sighting.y)
    }

    fn is_alive(&self) -> bool {
        self.sighting.energy > 0.0
    }
}

/// A bullet in flight, owned by the tank that fired it.
#[derive(Debug, Clone, Copy)]
struct TrackedBullet {
    owner: TankId,
    sighting: BulletSighting,
}

/// Deterministic collision and radar resolver for a walled rectangle.
///
/// # Example
///
/// ```
/// use treadwar_core::resolver::{ArenaResolver, CollisionResolver};
/// use treadwar_core::tank::{AiDefinition, Tank, TankId};
///
/// let mut arena = ArenaResolver::new(850.0, 550.0, 18.0);
/// let mut tank = Tank::new(&AiDefinition::new("Hugger"), TankId::new(1))?;
/// tank.move_to(10.0, 100.0, Some(0.0));
///
/// // Hull pokes through the left wall.
/// assert!(!arena.check_tank(&mut tank));
/// assert!((tank.energy() - 99.8).abs() < 1e-9);
/// # Ok::<(), treadwar_core::error::TankError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ArenaResolver {
    width: f64,
    height: f64,
    tank_radius: f64,
    tanks: BTreeMap<TankId, Tracked>,
    bullets: BTreeMap<u64, TrackedBullet>,
    signals: Vec<TankSignal>,
}

impl ArenaResolver {
    /// Creates an empty arena.
    ///
    /// # Arguments
    ///
    /// * `width` - Distance between the left and right walls
    /// * `height` - Distance between the top and bottom walls
    /// * `tank_radius` - Hull radius shared by every tank
    #[must_use]
    pub fn new(width: f64, height: f64, tank_radius: f64) -> Self {
        Self {
            width,
            height,
            tank_radius,
            tanks: BTreeMap::new(),
            bullets: BTreeMap::new(),
            signals: Vec::new(),
        }
    }

    /// Creates an empty arena sized by `settings`.
    #[must_use]
    pub fn from_settings(settings: &BattleSettings) -> Self {
        Self::new(settings.width, settings.height, settings.tank_radius)
    }

    /// Arena width.
    #[must_use]
    pub const fn width(&self) -> f64 {
        self.width
    }

    /// Arena height.
    #[must_use]
    pub const fn height(&self) -> f64 {
        self.height
    }

    /// Hull radius.
    #[must_use]
    pub const fn tank_radius(&self) -> f64 {
        self.tank_radius
    }

    /// Number of tanks in the index, dead or alive.
    #[must_use]
    pub fn tank_count(&self) -> usize {
        self.tanks.len()
    }

    /// `true` when the tank is indexed with energy left.
    #[must_use]
    pub fn is_alive(&self, id: TankId) -> bool {
        self.tanks.get(&id).is_some_and(Tracked::is_alive)
    }

    /// Last committed position of a tank.
    #[must_use]
    pub fn position_of(&self, id: TankId) -> Option<DVec2> {
        self.tanks.get(&id).map(Tracked::position)
    }

    /// Drops a tank from the index.
    pub fn forget_tank(&mut self, id: TankId) {
        self.tanks.remove(&id);
    }

    /// Inserts or moves a bullet. Bullets are matched by id.
    ///
    /// # Arguments
    ///
    /// * `owner` - Tank that fired the bullet; its own radar ignores it
    /// * `bullet` - Current bullet record
    pub fn track_bullet(&mut self, owner: TankId, bullet: BulletSighting) {
        self.bullets.insert(
            bullet.id,
            TrackedBullet {
                owner,
                sighting: bullet,
            },
        );
    }

    /// Removes a bullet, returning `true` if it was tracked.
    pub fn remove_bullet(&mut self, id: u64) -> bool {
        self.bullets.remove(&id).is_some()
    }

    /// Removes all bullets.
    pub fn clear_bullets(&mut self) {
        self.bullets.clear();
    }

    /// Number of tracked bullets.
    #[must_use]
    pub fn bullet_count(&self) -> usize {
        self.bullets.len()
    }

    fn hits_wall(&self, position: DVec2) -> bool {
        let r = self.tank_radius;
        position.x - r < 0.0
            || position.y - r < 0.0
            || position.x + r > self.width
            || position.y + r > self.height
    }

    fn others<'a>(&'a self, id: TankId) -> impl Iterator<Item = &'a Tracked> + 'a {
        self.tanks
            .iter()
            .filter(move |(other, tracked)| **other != id && tracked.is_alive())
            .map(|(_, tracked)| tracked)
    }

    /// Whether `target` falls inside the beam, widened by the target's
    /// apparent half-size.
    fn in_beam(origin: DVec2, heading: f64, half_focal: f64, target: DVec2, size: f64) -> bool {
        let distance = origin.distance(target);
        if distance <= size {
            return true;
        }
        let spread = if size > 0.0 {
            (size / distance).asin().to_degrees()
        } else {
            0.0
        };
        angular_distance(bearing(origin, target), heading) <= half_focal + spread
    }

    /// Distance along `direction` from `origin` to the first wall.
    fn ray_to_wall(&self, origin: DVec2, direction: DVec2) -> f64 {
        let along = |from: f64, toward: f64, limit: f64| {
            if toward > f64::EPSILON {
                (limit - from) / toward
            } else if toward < -f64::EPSILON {
                -from / toward
            } else {
                f64::INFINITY
            }
        };
        along(origin.x, direction.x, self.width)
            .min(along(origin.y, direction.y, self.height))
            .max(0.0)
    }
}

impl CollisionResolver for ArenaResolver {
    fn check_tank(&mut self, tank: &mut Tank) -> bool {
        let position = tank.position();
        if self.hits_wall(position) {
            tank.on_wall_hit();
            return false;
        }

        let team = tank.team_name();
        let reach = 2.0 * self.tank_radius;
        let blocker = self
            .others(tank.id())
            .find(|other| other.position().distance(position) < reach)
            .map(|other| (other.sighting.id, other.team.clone()));

        let Some((victim, victim_team)) = blocker else {
            return true;
        };

        if are_allies(team.as_deref(), victim_team.as_deref()) {
            tank.on_ally_hit();
        } else {
            tank.on_enemy_hit();
            let closing_speed = tank.actual_throttle().abs();
            trace!(tank = %tank.id(), %victim, closing_speed, "ram");
            self.signals.push(TankSignal::Rammed {
                victim,
                closing_speed,
            });
        }
        false
    }

    fn update_tank(&mut self, tank: &Tank) {
        self.tanks.insert(
            tank.id(),
            Tracked {
                sighting: tank.sighting(),
                team: tank.team_name(),
            },
        );
    }

    fn scan_tanks(&mut self, tank: &mut Tank) {
        let origin = tank.position();
        let heading = normalize_angle(tank.angle() + tank.radar_angle());
        let half_focal = tank.radar_focal() / 2.0;
        let range = tank.radar_range();
        let team = tank.team_name();

        let mut enemy: Option<(f64, TankSighting)> = None;
        let mut ally: Option<(f64, TankSighting)> = None;
        for other in self.others(tank.id()) {
            let distance = origin.distance(other.position());
            if distance > range
                || !Self::in_beam(origin, heading, half_focal, other.position(), self.tank_radius)
            {
                continue;
            }
            let slot = if are_allies(team.as_deref(), other.team.as_deref()) {
                &mut ally
            } else {
                &mut enemy
            };
            if slot.map_or(true, |(nearest, _)| distance < nearest) {
                *slot = Some((distance, other.sighting));
            }
        }

        if let Some((_, sighting)) = ally {
            tank.on_ally_spot(sighting);
        }
        if let Some((_, sighting)) = enemy {
            tank.on_enemy_spot(sighting);
            self.signals.push(TankSignal::TargetingAlarm { target: sighting.id });
        }
    }

    fn scan_bullets(&mut self, tank: &mut Tank) {
        let origin = tank.position();
        let heading = normalize_angle(tank.angle() + tank.radar_angle());
        let half_focal = tank.radar_focal() / 2.0;
        let range = tank.radar_range();

        for bullet in self.bullets.values() {
            if bullet.owner == tank.id() {
                continue;
            }
            let position = DVec2::new(bullet.sighting.x, bullet.sighting.y);
            if origin.distance(position) <= range
                && Self::in_beam(origin, heading, half_focal, position, 0.0)
            {
                tank.on_bullet_spot(bullet.sighting);
            }
        }
    }

    fn scan_walls(&mut self, tank: &mut Tank) {
        let heading = normalize_angle(tank.angle() + tank.radar_angle());
        let distance = self.ray_to_wall(tank.position(), heading_vector(heading));
        if distance <= tank.radar_range() {
            tank.on_wall_spot(distance);
        }
    }

    fn take_signals(&mut self) -> Vec<TankSignal> {
        std::mem::take(&mut self.signals)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::tank::{AiDefinition, CollisionFlags};
    use crate::team::{Team, TeamChannel};

    const R: f64 = 18.0;

    fn arena() -> ArenaResolver {
        ArenaResolver::new(850.0, 550.0, R)
    }

    fn tank_at(id: u64, x: f64, y: f64, angle: f64) -> Tank {
        let mut tank = Tank::new(&AiDefinition::new(format!("t{id}")), TankId::new(id)).unwrap();
        tank.move_to(x, y, Some(angle));
        tank
    }

    fn bullet(id: u64, x: f64, y: f64) -> BulletSighting {
        BulletSighting {
            id,
            x,
            y,
            angle: 180.0,
            speed: 4.0,
            damage: 1.0,
        }
    }

    mod collision_tests {
        use super::*;

        #[test]
        fn open_floor_is_legal() {
            let mut arena = arena();
            let mut tank = tank_at(1, 400.0, 275.0, 0.0);
            assert!(arena.check_tank(&mut tank));
            assert!(tank.collisions().is_empty());
        }

        #[test]
        fn every_wall_blocks() {
            for (x, y) in [(10.0, 275.0), (840.0, 275.0), (400.0, 10.0), (400.0, 540.0)] {
                let mut arena = arena();
                let mut tank = tank_at(1, x, y, 0.0);
                assert!(!arena.check_tank(&mut tank), "({x}, {y})");
                assert!(tank.collisions().contains(CollisionFlags::WALL));
            }
        }

        #[test]
        fn enemy_overlap_blocks_and_queues_ram() {
            let mut arena = arena();
            let victim = tank_at(2, 430.0, 275.0, 0.0);
            arena.update_tank(&victim);

            let mut rammer = tank_at(1, 400.0, 275.0, 0.0);
            assert!(!arena.check_tank(&mut rammer));
            assert!(rammer.collisions().contains(CollisionFlags::ENEMY));
            assert!((rammer.energy() - 99.8).abs() < 1e-9);

            let signals = arena.take_signals();
            assert_eq!(signals.len(), 1);
            assert_eq!(signals[0].recipient(), TankId::new(2));
            assert!(arena.take_signals().is_empty());
        }

        #[test]
        fn ally_overlap_blocks_without_ram() {
            let red: Arc<dyn TeamChannel> = Arc::new(Team::new("red"));
            let mut arena = arena();
            let mut friend = tank_at(2, 430.0, 275.0, 0.0);
            friend.set_team(Arc::downgrade(&red));
            arena.update_tank(&friend);

            let mut tank = tank_at(1, 400.0, 275.0, 0.0);
            tank.set_team(Arc::downgrade(&red));
            assert!(!arena.check_tank(&mut tank));
            assert!(tank.collisions().contains(CollisionFlags::ALLY));
            assert!(arena.take_signals().is_empty());
        }

        #[test]
        fn own_entry_and_wrecks_are_ignored() {
            let mut arena = arena();
            let mut wreck = tank_at(2, 420.0, 275.0, 0.0);
            wreck.on_damage(100.0);
            arena.update_tank(&wreck);

            let mut tank = tank_at(1, 400.0, 275.0, 0.0);
            arena.update_tank(&tank);
            assert!(arena.check_tank(&mut tank));
            assert!(!arena.is_alive(TankId::new(2)));
        }

        #[test]
        fn forget_tank_removes_blocker() {
            let mut arena = arena();
            arena.update_tank(&tank_at(2, 420.0, 275.0, 0.0));
            arena.forget_tank(TankId::new(2));
            let mut tank = tank_at(1, 400.0, 275.0, 0.0);
            assert!(arena.check_tank(&mut tank));
            assert_eq!(arena.tank_count(), 0);
        }
    }

    mod radar_tests {
        use super::*;

        #[test]
        fn spots_enemy_in_beam_and_alarms_it() {
            let mut arena = arena();
            arena.update_tank(&tank_at(2, 600.0, 275.0, 90.0));

            let mut scout = tank_at(1, 400.0, 275.0, 0.0);
            arena.scan_tanks(&mut scout);

            assert_eq!(scout.enemy_spot().map(|s| s.id), Some(TankId::new(2)));
            assert_eq!(
                arena.take_signals(),
                vec![TankSignal::TargetingAlarm {
                    target: TankId::new(2)
                }]
            );
        }

        #[test]
        fn misses_enemy_outside_beam_or_range() {
            let mut arena = arena();
            arena.update_tank(&tank_at(2, 400.0, 475.0, 0.0));
            arena.update_tank(&tank_at(3, 750.0, 275.0, 0.0));

            let mut scout = tank_at(1, 400.0, 275.0, 0.0);
            arena.scan_tanks(&mut scout);

            assert!(scout.enemy_spot().is_none());
            assert!(arena.take_signals().is_empty());
        }

        #[test]
        fn hull_widens_the_beam() {
            let mut arena = arena();
            // 10 units off axis at 100 away: outside 3 degrees, inside with the hull.
            arena.update_tank(&tank_at(2, 500.0, 285.0, 0.0));
            let mut scout = tank_at(1, 400.0, 275.0, 0.0);
            arena.scan_tanks(&mut scout);
            assert!(scout.enemy_spot().is_some());
        }

        #[test]
        fn radar_angle_is_relative_to_body() {
            let mut arena = arena();
            arena.update_tank(&tank_at(2, 400.0, 475.0, 0.0));

            // Body at 80 degrees, enemy straight along 90: just outside the beam.
            let mut scout = tank_at(1, 400.0, 275.0, 80.0);
            arena.scan_tanks(&mut scout);
            assert!(scout.enemy_spot().is_none());

            scout.set_radar_turn(1.0);
            scout.simulation_step(&mut NoopResolver);
            scout.simulation_step(&mut NoopResolver);
            assert!((scout.radar_angle() - 12.0).abs() < 1e-9);

            arena.scan_tanks(&mut scout);
            assert!(scout.enemy_spot().is_some());
        }

        #[test]
        fn nearest_enemy_wins() {
            let mut arena = arena();
            arena.update_tank(&tank_at(2, 650.0, 275.0, 0.0));
            arena.update_tank(&tank_at(3, 500.0, 275.0, 0.0));

            let mut scout = tank_at(1, 400.0, 275.0, 0.0);
            arena.scan_tanks(&mut scout);
            assert_eq!(scout.enemy_spot().map(|s| s.id), Some(TankId::new(3)));
        }

        #[test]
        fn allies_are_spotted_without_alarm() {
            let blue: Arc<dyn TeamChannel> = Arc::new(Team::new("blue"));
            let mut arena = arena();
            let mut friend = tank_at(2, 500.0, 275.0, 0.0);
            friend.set_team(Arc::downgrade(&blue));
            arena.update_tank(&friend);

            let mut scout = tank_at(1, 400.0, 275.0, 0.0);
            scout.set_team(Arc::downgrade(&blue));
            arena.scan_tanks(&mut scout);

            assert_eq!(scout.ally_spot().map(|s| s.id), Some(TankId::new(2)));
            assert!(scout.enemy_spot().is_none());
            assert!(arena.take_signals().is_empty());
        }

        #[test]
        fn bullets_in_beam_are_reported_in_id_order() {
            let mut arena = arena();
            arena.track_bullet(TankId::new(2), bullet(11, 600.0, 275.0));
            arena.track_bullet(TankId::new(2), bullet(10, 500.0, 275.0));
            arena.track_bullet(TankId::new(2), bullet(12, 500.0, 400.0));
            arena.track_bullet(TankId::new(1), bullet(13, 550.0, 275.0));

            let mut scout = tank_at(1, 400.0, 275.0, 0.0);
            arena.scan_bullets(&mut scout);
            scout.simulation_step(&mut NoopResolver);

            let ids: Vec<u64> = scout
                .state()
                .map(|s| s.radar.bullets.iter().map(|b| b.id).collect())
                .unwrap_or_default();
            assert_eq!(ids, vec![10, 11]);

            assert!(arena.remove_bullet(10));
            arena.clear_bullets();
            assert_eq!(arena.bullet_count(), 0);
        }

        #[test]
        fn wall_distance_within_range() {
            let mut arena = arena();
            let mut near = tank_at(1, 700.0, 275.0, 0.0);
            arena.scan_walls(&mut near);
            assert!((near.wall_distance().unwrap() - 150.0).abs() < 1e-9);

            let mut far = tank_at(2, 100.0, 275.0, 0.0);
            arena.scan_walls(&mut far);
            assert!(far.wall_distance().is_none());

            let mut up = tank_at(3, 400.0, 100.0, -90.0);
            arena.scan_walls(&mut up);
            assert!((up.wall_distance().unwrap() - 100.0).abs() < 1e-9);
        }
    }

    /// Accepts everything, sees nothing.
    struct NoopResolver;

    impl CollisionResolver for NoopResolver {
        fn check_tank(&mut self, _tank: &mut Tank) -> bool {
            true
        }
        fn update_tank(&mut self, _tank: &Tank) {}
        fn scan_tanks(&mut self, _tank: &mut Tank) {}
        fn scan_bullets(&mut self, _tank: &mut Tank) {}
        fn scan_walls(&mut self, _tank: &mut Tank) {}
    }
}
