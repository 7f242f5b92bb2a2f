//! The per-tick transition of a tank.
//!
//! [`Tank::simulation_step`] runs a fixed sequence. The order is part of the
//! contract: collision flags must be cleared before the legality check,
//! ramming reported by other tanks converts only after it, the resolver sees
//! the committed pose before scanning, and speed is measured after rollback.

use tracing::trace;

use super::components::CollisionFlags;
use super::Tank;
use crate::constants::{
    ACCELERATION_FACTOR, BODY_TURN_RATE, BOOST_ACCELERATION_FACTOR, BOOST_SPEED_MULTIPLIER,
    GUN_TURN_RATE, RADAR_TURN_RATE, SPEED_MULTIPLIER,
};
use crate::geometry::{heading_vector, normalize_angle};
use crate::resolver::CollisionResolver;
use crate::snapshot::{CollisionState, GunState, RadarState, RadioState, SpottedTank, TankState};

impl Tank {
    /// Advances the tank by one tick and publishes a new [`TankState`].
    ///
    /// A destroyed tank (zero energy) is frozen: the call returns immediately
    /// and leaves every field, including the published state, untouched.
    ///
    /// # Sequence
    ///
    /// 1. Spend one unit of boost if boost is requested and available
    /// 2. Smooth `actual_throttle` toward `throttle * (4 | 2)` with divisor `10 | 20`
    /// 3. Move along the body heading by `actual_throttle`
    /// 4. Clear this tick's collision flags and ask `check_tank`; roll back
    ///    and lose all momentum when the move is illegal
    /// 5. Turn a pending ram into an enemy hit
    /// 6. Rotate body, radar and gun, then `update_tank`
    /// 7. Clear sensors, tick the targeting alarm, scan tanks, bullets, walls
    /// 8. Tick the gun reload
    /// 9. Measure speed from the committed displacement and publish
    pub fn simulation_step<R>(&mut self, resolver: &mut R)
    where
        R: CollisionResolver + ?Sized,
    {
        if self.is_destroyed() {
            return;
        }

        if self.controls.boost && self.boost > 0 {
            self.boost -= 1;
        }

        let (multiplier, acceleration) = if self.has_boost() {
            (BOOST_SPEED_MULTIPLIER, BOOST_ACCELERATION_FACTOR)
        } else {
            (SPEED_MULTIPLIER, ACCELERATION_FACTOR)
        };
        let target_speed = self.controls.throttle * multiplier;
        self.kinematics.actual_throttle +=
            (target_speed - self.kinematics.actual_throttle) / acceleration;

        let previous = self.kinematics.position;
        self.kinematics.position +=
            heading_vector(self.kinematics.angle) * self.kinematics.actual_throttle;

        self.collisions.remove(CollisionFlags::PER_TICK);
        if !resolver.check_tank(self) {
            trace!(tank = %self.id, x = previous.x, y = previous.y, "move blocked");
            self.kinematics.position = previous;
            self.kinematics.actual_throttle = 0.0;
        }

        // Ramming is reported while the other tank is checked, which may be
        // after this tank already stepped. Either way it lands here.
        if self.collisions.contains(CollisionFlags::RAMMED) {
            self.collisions.remove(CollisionFlags::RAMMED);
            self.collisions.insert(CollisionFlags::ENEMY);
        }

        let kinematics = &mut self.kinematics;
        kinematics.angle = normalize_angle(kinematics.angle + BODY_TURN_RATE * self.controls.turn);
        kinematics.radar_angle =
            normalize_angle(kinematics.radar_angle + RADAR_TURN_RATE * self.controls.radar_turn);
        kinematics.gun_angle =
            normalize_angle(kinematics.gun_angle + GUN_TURN_RATE * self.controls.gun_turn);
        resolver.update_tank(self);

        self.sensors.clear_spots();
        self.sensors.targeting_alarm_timer = self.sensors.targeting_alarm_timer.saturating_sub(1);
        resolver.scan_tanks(self);
        resolver.scan_bullets(self);
        resolver.scan_walls(self);

        self.gun.timer = self.gun.timer.saturating_sub(1);

        let bullets = self.sensors.bullets.drain(..).collect();

        self.kinematics.speed = self
            .kinematics
            .position
            .distance(self.kinematics.last_position);
        self.kinematics.last_position = self.kinematics.position;

        self.state = Some(self.project(bullets));
    }

    /// Builds the snapshot from the committed fields.
    fn project(&self, bullets: Vec<super::BulletSighting>) -> TankState {
        let inbox = self
            .team_channel()
            .map(|team| team.messages(self.id))
            .unwrap_or_default();

        TankState {
            x: self.kinematics.position.x,
            y: self.kinematics.position.y,
            angle: self.kinematics.angle,
            energy: self.energy,
            boost: self.boost,
            speed: self.kinematics.speed,
            collisions: CollisionState {
                wall: self.collisions.contains(CollisionFlags::WALL),
                enemy: self.collisions.contains(CollisionFlags::ENEMY),
                ally: self.collisions.contains(CollisionFlags::ALLY),
            },
            radar: RadarState {
                angle: self.kinematics.radar_angle,
                targeting_alarm: self.targeting_alarm(),
                wall_distance: self.sensors.wall_distance,
                enemy: self.sensors.enemy.as_ref().map(SpottedTank::enemy),
                ally: self.sensors.ally.as_ref().map(SpottedTank::ally),
                bullets,
            },
            gun: GunState {
                angle: self.kinematics.gun_angle,
                reloading: self.is_reloading(),
            },
            radio: RadioState { inbox },
        }
    }
}
