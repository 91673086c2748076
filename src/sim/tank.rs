//! Tank entity: movement, rotation, turret aiming and fire-rate gating
//!
//! One record serves every faction. The faction tag selects a constant
//! parameter table from [`Tuning`]; behavior differences live in the AI
//! module and the tick loop, not in subtypes.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::tuning::{FactionParams, Tuning};
use crate::{forward_vector, normalize_angle};

/// Tank category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    Player,
    EnemyLight,
    EnemyMedium,
    EnemyHeavy,
}

impl Faction {
    pub const ALL: [Faction; 4] = [
        Faction::Player,
        Faction::EnemyLight,
        Faction::EnemyMedium,
        Faction::EnemyHeavy,
    ];

    pub const ENEMIES: [Faction; 3] = [
        Faction::EnemyLight,
        Faction::EnemyMedium,
        Faction::EnemyHeavy,
    ];

    pub fn is_enemy(self) -> bool {
        self != Faction::Player
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Faction::Player => "player",
            Faction::EnemyLight => "light",
            Faction::EnemyMedium => "medium",
            Faction::EnemyHeavy => "heavy",
        }
    }
}

/// Presentation snapshot of a tank's transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TankState {
    pub position: Vec2,
    pub body_rotation: f32,
    pub turret_rotation: f32,
    pub faction: Faction,
}

/// A bullet requested by a tank's fire action
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BulletSpec {
    /// Muzzle position
    pub position: Vec2,
    /// Unit direction
    pub direction: Vec2,
    pub speed: f32,
    pub owner: Faction,
}

/// A tank entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tank {
    pub id: u32,
    pub faction: Faction,
    pub pos: Vec2,
    /// Body heading (radians, 0 faces +Z)
    pub body_rotation: f32,
    /// Turret angle relative to the body, in (-π, π]
    pub turret_rotation: f32,
    health: i32,
    pub max_health: i32,
    pub speed: f32,
    pub rotation_speed: f32,
    pub fire_cooldown_ms: u64,
    /// Time of the last accepted shot
    pub last_fire_ms: Option<u64>,
    /// Set by movement, consumed by the caller deciding on rollback
    #[serde(skip)]
    moved: bool,
    /// Transform changed since the last presentation notification
    #[serde(skip)]
    dirty: bool,
}

impl Tank {
    pub fn new(id: u32, faction: Faction, pos: Vec2, params: &FactionParams) -> Self {
        Self {
            id,
            faction,
            pos,
            body_rotation: 0.0,
            turret_rotation: 0.0,
            health: params.max_health,
            max_health: params.max_health,
            speed: params.speed,
            rotation_speed: params.rotation_speed,
            fire_cooldown_ms: params.fire_cooldown_ms,
            last_fire_ms: None,
            moved: false,
            dirty: true,
        }
    }

    pub fn from_tuning(id: u32, faction: Faction, pos: Vec2, tuning: &Tuning) -> Self {
        Self::new(id, faction, pos, tuning.faction(faction))
    }

    pub fn health(&self) -> i32 {
        self.health
    }

    pub fn is_destroyed(&self) -> bool {
        self.health <= 0
    }

    /// Forward unit vector of the body
    pub fn direction(&self) -> Vec2 {
        forward_vector(self.body_rotation)
    }

    pub fn move_forward(&mut self) {
        self.pos += self.direction() * self.speed;
        self.moved = true;
        self.dirty = true;
    }

    pub fn move_backward(&mut self) {
        self.pos -= self.direction() * self.speed;
        self.moved = true;
        self.dirty = true;
    }

    pub fn rotate_left(&mut self) {
        self.set_body_rotation(self.body_rotation + self.rotation_speed);
    }

    pub fn rotate_right(&mut self) {
        self.set_body_rotation(self.body_rotation - self.rotation_speed);
    }

    pub fn set_body_rotation(&mut self, rotation: f32) {
        self.body_rotation = normalize_angle(rotation);
        self.dirty = true;
    }

    /// Set turret angle relative to the body
    pub fn set_turret_rotation(&mut self, local_angle: f32) {
        self.turret_rotation = normalize_angle(local_angle);
        self.dirty = true;
    }

    /// Turret heading in world space
    pub fn turret_world_rotation(&self) -> f32 {
        normalize_angle(self.body_rotation + self.turret_rotation)
    }

    /// Aim the turret at a world point without touching the body
    pub fn aim_turret_at(&mut self, target: Vec2) {
        let to_target = target - self.pos;
        if to_target.length_squared() > f32::EPSILON {
            let world = crate::heading_of(to_target);
            self.set_turret_rotation(world - self.body_rotation);
        }
    }

    /// Turn the body to face a world point
    pub fn face(&mut self, target: Vec2) {
        let to_target = target - self.pos;
        if to_target.length_squared() > f32::EPSILON {
            self.set_body_rotation(crate::heading_of(to_target));
        }
    }

    /// Narrow mutation entry point for rollback and respawn placement
    pub fn set_position(&mut self, pos: Vec2) {
        if pos != self.pos {
            self.pos = pos;
            self.dirty = true;
        }
    }

    /// Whether a movement happened since the last call; clears the flag
    pub fn take_moved(&mut self) -> bool {
        std::mem::take(&mut self.moved)
    }

    /// Whether the transform changed since the last call; clears the flag
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn can_fire(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        self.last_fire_ms
            .is_none_or(|last| now_ms.saturating_sub(last) >= cooldown_ms)
    }

    /// Fire using this tank's own cooldown
    pub fn fire(&mut self, now_ms: u64, bullet_speed: f32, muzzle_offset: f32) -> Option<BulletSpec> {
        self.fire_with_cooldown(now_ms, self.fire_cooldown_ms, bullet_speed, muzzle_offset)
    }

    /// Fire with an overridden cooldown (rapid fire). The bullet leaves along
    /// the turret's world heading, not the body's.
    pub fn fire_with_cooldown(
        &mut self,
        now_ms: u64,
        cooldown_ms: u64,
        bullet_speed: f32,
        muzzle_offset: f32,
    ) -> Option<BulletSpec> {
        if !self.can_fire(now_ms, cooldown_ms) {
            return None;
        }
        self.last_fire_ms = Some(now_ms);

        let direction = forward_vector(self.turret_world_rotation());
        Some(BulletSpec {
            position: self.pos + direction * muzzle_offset,
            direction,
            speed: bullet_speed,
            owner: self.faction,
        })
    }

    /// Apply damage; health floors at zero and never comes back
    pub fn take_damage(&mut self, amount: i32) {
        self.health = (self.health - amount.max(0)).max(0);
    }

    pub fn snapshot(&self) -> TankState {
        TankState {
            position: self.pos,
            body_rotation: self.body_rotation,
            turret_rotation: self.turret_rotation,
            faction: self.faction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn player() -> Tank {
        Tank::from_tuning(1, Faction::Player, Vec2::ZERO, &Tuning::default())
    }

    #[test]
    fn test_move_forward_follows_heading() {
        let mut tank = player();
        tank.move_forward();
        assert!((tank.pos - Vec2::new(0.0, 0.25)).length() < 1e-6);
        assert!(tank.take_moved());
        assert!(!tank.take_moved());

        tank.set_body_rotation(FRAC_PI_2);
        tank.move_backward();
        assert!((tank.pos - Vec2::new(-0.25, 0.25)).length() < 1e-5);
    }

    #[test]
    fn test_rotation_updates_direction() {
        let mut tank = player();
        for _ in 0..10 {
            tank.rotate_left();
        }
        assert!((tank.body_rotation - 0.5).abs() < 1e-5);
        assert!((tank.direction() - forward_vector(0.5)).length() < 1e-6);
        tank.rotate_right();
        assert!((tank.body_rotation - 0.45).abs() < 1e-5);
    }

    #[test]
    fn test_turret_is_normalized() {
        let mut tank = player();
        tank.set_turret_rotation(3.0 * PI / 2.0);
        assert!((tank.turret_rotation + FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_fire_uses_turret_world_heading() {
        let mut tank = player();
        tank.set_body_rotation(FRAC_PI_2);
        tank.set_turret_rotation(FRAC_PI_2);
        let bullet = tank.fire(0, 0.4, 1.0).unwrap();
        // Body faces +X, turret turned another quarter: world heading π faces -Z
        assert!((bullet.direction - Vec2::new(0.0, -1.0)).length() < 1e-5);
        assert!((bullet.position - Vec2::new(0.0, -1.0)).length() < 1e-5);
        assert_eq!(bullet.owner, Faction::Player);
    }

    #[test]
    fn test_fire_respects_cooldown() {
        let mut tank = player();
        assert!(tank.fire(1_000, 0.4, 1.0).is_some());
        assert!(tank.fire(1_499, 0.4, 1.0).is_none());
        assert!(tank.fire(1_500, 0.4, 1.0).is_some());
        // Shorter override fires sooner
        assert!(tank.fire_with_cooldown(1_650, 150, 0.4, 1.0).is_some());
    }

    #[test]
    fn test_first_shot_is_never_gated() {
        let mut tank = player();
        assert!(tank.fire(0, 0.4, 1.0).is_some());
    }

    #[test]
    fn test_aim_turret_keeps_body() {
        let mut tank = player();
        tank.set_body_rotation(1.0);
        tank.aim_turret_at(Vec2::new(-5.0, 0.0));
        assert!((tank.body_rotation - 1.0).abs() < 1e-6);
        let world = forward_vector(tank.turret_world_rotation());
        assert!((world - Vec2::new(-1.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut tank = Tank::from_tuning(2, Faction::EnemyLight, Vec2::ZERO, &Tuning::default());
        assert_eq!(tank.health(), 25);
        tank.take_damage(25);
        assert!(tank.is_destroyed());
        tank.take_damage(25);
        assert_eq!(tank.health(), 0);
    }

    #[test]
    fn test_serde_roundtrip_keeps_heading() {
        let mut tank = player();
        tank.set_body_rotation(FRAC_PI_2);
        let json = serde_json::to_string(&tank).unwrap();
        let mut back: Tank = serde_json::from_str(&json).unwrap();
        assert!((back.direction() - Vec2::X).length() < 1e-5);
        assert_eq!(back.health(), 100);
        back.move_forward();
        assert!((back.pos - Vec2::new(back.speed, 0.0)).length() < 1e-5);
    }

    proptest! {
        #[test]
        fn health_stays_bounded_and_non_increasing(hits in proptest::collection::vec(-50i32..200, 0..20)) {
            let mut tank = player();
            let mut previous = tank.health();
            for amount in hits {
                tank.take_damage(amount);
                prop_assert!(tank.health() <= previous);
                prop_assert!(tank.health() >= 0 && tank.health() <= tank.max_health);
                previous = tank.health();
            }
        }

        #[test]
        fn turret_rotation_always_normalized(angle in -50.0f32..50.0) {
            let mut tank = player();
            tank.set_turret_rotation(angle);
            prop_assert!(tank.turret_rotation > -PI && tank.turret_rotation <= PI);
        }
    }
}
