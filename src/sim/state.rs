//! Game state and core simulation types
//!
//! `GameState` owns every entity. Other modules get read access or go through
//! the narrow mutation entry points (`take_damage`, `set_position`, level cell
//! edits); nothing keeps its own copy of canonical state.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::ai::EnemyBrain;
use super::events::{EventSink, GameEvent};
use super::level::Level;
use super::levelgen::generate_layout;
use super::spawn;
use super::tank::{BulletSpec, Faction, Tank};
use crate::tuning::Tuning;

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// All enemies destroyed
    Won,
    /// Player out of lives
    Lost,
}

impl GamePhase {
    pub fn is_over(self) -> bool {
        self != GamePhase::Running
    }
}

/// A bullet entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    /// Unit direction
    pub direction: Vec2,
    /// World units per tick
    pub speed: f32,
    pub owner: Faction,
}

impl Bullet {
    pub fn from_spec(id: u32, spec: BulletSpec) -> Self {
        Self {
            id,
            pos: spec.position,
            direction: spec.direction.normalize_or_zero(),
            speed: spec.speed,
            owner: spec.owner,
        }
    }

    pub fn advance(&mut self) {
        self.pos += self.direction * self.speed;
    }

    pub fn is_player_owned(&self) -> bool {
        !self.owner.is_enemy()
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Extra life
    Star,
    /// Temporary invulnerability
    Helmet,
    /// Destroy every active enemy
    Bomb,
    /// Temporary rapid fire
    MachineGun,
    /// Freeze enemy AI
    Clock,
    /// Rebuild the wall around the headquarters
    BaseProtection,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 6] = [
        PowerUpKind::Star,
        PowerUpKind::Helmet,
        PowerUpKind::Bomb,
        PowerUpKind::MachineGun,
        PowerUpKind::Clock,
        PowerUpKind::BaseProtection,
    ];

    /// Pickup message shown to the player
    pub fn message(self) -> &'static str {
        match self {
            PowerUpKind::Star => "Extra Life!",
            PowerUpKind::Helmet => "Invulnerability!",
            PowerUpKind::Bomb => "Boom! All enemies destroyed!",
            PowerUpKind::MachineGun => "Machine Gun!",
            PowerUpKind::Clock => "Enemies Frozen!",
            PowerUpKind::BaseProtection => "Base Protected!",
        }
    }
}

/// A collectible power-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub id: u32,
    pub kind: PowerUpKind,
    pub pos: Vec2,
    pub spawn_ms: u64,
    pub duration_ms: u64,
}

impl PowerUp {
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.spawn_ms + self.duration_ms
    }
}

/// Global time-limited effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Invulnerable,
    RapidFire,
    EnemyFreeze,
}

/// An effect with a wall-clock end time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEffect {
    until_ms: Option<u64>,
}

impl TimedEffect {
    /// Start (or extend) the effect
    pub fn activate(&mut self, now_ms: u64, duration_ms: u64) -> u64 {
        let until = now_ms + duration_ms;
        self.until_ms = Some(until);
        until
    }

    pub fn is_active(&self, now_ms: u64) -> bool {
        self.until_ms.is_some_and(|until| now_ms < until)
    }

    pub fn until_ms(&self) -> Option<u64> {
        self.until_ms
    }

    /// Drop the effect without an expiry transition
    pub fn clear(&mut self) {
        self.until_ms = None;
    }

    /// Report the expiry transition once, the first time `now` reaches the end
    pub fn expire(&mut self, now_ms: u64) -> bool {
        match self.until_ms {
            Some(until) if now_ms >= until => {
                self.until_ms = None;
                true
            }
            _ => false,
        }
    }
}

/// Active power-up effects
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub invulnerable: TimedEffect,
    pub rapid_fire: TimedEffect,
    pub freeze: TimedEffect,
}

impl ActiveEffects {
    pub fn get(&self, kind: EffectKind) -> &TimedEffect {
        match kind {
            EffectKind::Invulnerable => &self.invulnerable,
            EffectKind::RapidFire => &self.rapid_fire,
            EffectKind::EnemyFreeze => &self.freeze,
        }
    }

    pub fn get_mut(&mut self, kind: EffectKind) -> &mut TimedEffect {
        match kind {
            EffectKind::Invulnerable => &mut self.invulnerable,
            EffectKind::RapidFire => &mut self.rapid_fire,
            EffectKind::EnemyFreeze => &mut self.freeze,
        }
    }
}

/// Last values published to the UI
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct HudSnapshot {
    pub score: Option<u64>,
    pub lives: Option<u32>,
    pub remaining: Option<u32>,
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub tuning: Tuning,
    pub level: Level,
    pub phase: GamePhase,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Simulated clock
    pub time_ms: u64,
    pub lives: u32,
    pub score: u64,
    /// Enemies still to be destroyed (active ones included)
    pub remaining_enemies: u32,
    pub player: Tank,
    pub enemies: Vec<Tank>,
    /// AI state, parallel to `enemies`
    pub brains: Vec<EnemyBrain>,
    pub bullets: Vec<Bullet>,
    pub powerups: Vec<PowerUp>,
    pub effects: ActiveEffects,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    pub(crate) hud: HudSnapshot,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// New game on a procedurally generated level
    pub fn new(seed: u64, tuning: Tuning) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let layout = generate_layout(tuning.game.field_size, &mut rng);
        let level = Level::from_layout(
            &layout,
            tuning.combat.brick_health,
            tuning.combat.steel_health,
        );
        Self::setup(seed, rng, tuning, level, true)
    }

    /// New game on a prepared level, with no enemies seeded
    pub fn with_level(seed: u64, tuning: Tuning, level: Level) -> Self {
        Self::setup(seed, Pcg32::seed_from_u64(seed), tuning, level, false)
    }

    fn setup(seed: u64, rng: Pcg32, tuning: Tuning, level: Level, seed_enemies: bool) -> Self {
        let dims = level.dimensions();
        log::info!("Level size: {}x{}", dims.width, dims.height);

        let spawn_point = spawn::find_player_spawn(&level, &[], &tuning)
            .unwrap_or_else(|| spawn::player_spawn_point(&level));
        let mut player = Tank::from_tuning(1, Faction::Player, spawn_point, &tuning);
        player.take_dirty();
        log::info!(
            "Player tank created at ({:.2}, {:.2})",
            spawn_point.x,
            spawn_point.y
        );

        let mut state = Self {
            seed,
            rng,
            lives: tuning.game.player_lives,
            remaining_enemies: tuning.game.total_enemies,
            tuning,
            level,
            phase: GamePhase::Running,
            time_ticks: 0,
            time_ms: 0,
            score: 0,
            player,
            enemies: Vec::new(),
            brains: Vec::new(),
            bullets: Vec::new(),
            powerups: Vec::new(),
            effects: ActiveEffects::default(),
            events: Vec::new(),
            hud: HudSnapshot::default(),
            next_id: 2,
        };
        state.emit(GameEvent::TankSpawned {
            id: state.player.id,
            state: state.player.snapshot(),
        });

        if seed_enemies {
            for _ in 0..state.tuning.game.initial_enemies {
                if !spawn::spawn_enemy(&mut state) {
                    log::info!("Failed to spawn initial enemy tank, will try later");
                }
            }
        }
        state.publish_hud();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Deliver and clear pending events
    pub fn drain_events(&mut self, sink: &mut impl EventSink) {
        for event in self.events.drain(..) {
            sink.handle(&event);
        }
    }

    /// Add an enemy with a fresh AI brain
    pub fn add_enemy(&mut self, faction: Faction, pos: Vec2) -> u32 {
        let id = self.next_entity_id();
        let mut tank = Tank::from_tuning(id, faction, pos, &self.tuning);
        tank.take_dirty();
        let brain = EnemyBrain::new(self.tuning.faction(faction), &mut self.rng);
        self.emit(GameEvent::TankSpawned {
            id,
            state: tank.snapshot(),
        });
        self.enemies.push(tank);
        self.brains.push(brain);
        id
    }

    /// Remove an enemy and its brain by index
    pub fn remove_enemy(&mut self, index: usize) -> Tank {
        self.brains.remove(index);
        let tank = self.enemies.remove(index);
        self.emit(GameEvent::TankRemoved { id: tank.id });
        tank
    }

    pub fn add_bullet(&mut self, spec: BulletSpec) -> u32 {
        let id = self.next_entity_id();
        self.emit(GameEvent::BulletFired {
            owner: spec.owner,
            position: spec.position,
            direction: spec.direction,
        });
        self.bullets.push(Bullet::from_spec(id, spec));
        id
    }

    pub fn is_player_invulnerable(&self) -> bool {
        self.effects.get(EffectKind::Invulnerable).is_active(self.time_ms)
    }

    pub fn are_enemies_frozen(&self) -> bool {
        self.effects.get(EffectKind::EnemyFreeze).is_active(self.time_ms)
    }

    /// Player fire cooldown, shortened while rapid fire is active
    pub fn player_fire_cooldown(&self) -> u64 {
        if self.effects.get(EffectKind::RapidFire).is_active(self.time_ms) {
            self.tuning.powerups.machine_gun_cooldown_ms
        } else {
            self.player.fire_cooldown_ms
        }
    }

    /// Start a timed effect and announce it
    pub fn activate_effect(&mut self, effect: EffectKind, duration_ms: u64) {
        let until_ms = self.effects.get_mut(effect).activate(self.time_ms, duration_ms);
        self.emit(GameEvent::EffectStarted { effect, until_ms });
    }

    /// Award score for destroying an enemy of `faction`
    pub fn enemy_score(&self, faction: Faction) -> u64 {
        self.tuning.faction(faction).score
    }

    /// Publish HUD values that changed since the last publish
    pub fn publish_hud(&mut self) {
        if self.hud.score != Some(self.score) {
            self.hud.score = Some(self.score);
            self.emit(GameEvent::ScoreChanged { score: self.score });
        }
        if self.hud.lives != Some(self.lives) {
            self.hud.lives = Some(self.lives);
            self.emit(GameEvent::LivesChanged { lives: self.lives });
        }
        if self.hud.remaining != Some(self.remaining_enemies) {
            self.hud.remaining = Some(self.remaining_enemies);
            self.emit(GameEvent::EnemiesRemainingChanged {
                remaining: self.remaining_enemies,
            });
        }
    }

    /// Show a transient message
    pub fn message(&mut self, text: impl Into<String>) {
        let duration_ms = self.tuning.powerups.message_ms;
        self.emit(GameEvent::Message {
            text: text.into(),
            duration_ms,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_effect_boundaries() {
        let mut effect = TimedEffect::default();
        assert!(!effect.is_active(0));
        assert!(!effect.expire(0));

        let until = effect.activate(1_000, 500);
        assert_eq!(until, 1_500);
        assert!(effect.is_active(1_000));
        assert!(effect.is_active(1_499));
        assert!(!effect.is_active(1_500));

        assert!(!effect.expire(1_499));
        assert!(effect.expire(1_500));
        assert!(!effect.expire(1_501));
    }

    #[test]
    fn test_effects_lookup_by_kind() {
        let mut effects = ActiveEffects::default();
        effects.get_mut(EffectKind::RapidFire).activate(0, 100);
        assert!(effects.get(EffectKind::RapidFire).is_active(50));
        assert!(effects.rapid_fire.is_active(50));
        assert!(!effects.get(EffectKind::EnemyFreeze).is_active(50));
    }

    #[test]
    fn test_timed_effect_refresh_extends() {
        let mut effect = TimedEffect::default();
        effect.activate(0, 100);
        effect.activate(50, 100);
        assert!(effect.is_active(120));
        assert!(!effect.expire(120));
        assert!(effect.expire(150));
    }

    #[test]
    fn test_powerup_expiry_is_strict() {
        let p = PowerUp {
            id: 1,
            kind: PowerUpKind::Star,
            pos: Vec2::ZERO,
            spawn_ms: 100,
            duration_ms: 1_000,
        };
        assert!(!p.is_expired(1_100));
        assert!(p.is_expired(1_101));
    }

    #[test]
    fn test_new_game_seeds_enemies() {
        let state = GameState::new(7, Tuning::default());
        assert_eq!(state.phase, GamePhase::Running);
        assert_eq!(state.lives, 3);
        assert_eq!(state.remaining_enemies, 20);
        assert!(state.enemies.len() <= 3);
        assert_eq!(state.enemies.len(), state.brains.len());
        assert!(state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TankSpawned { id: 1, .. })));
    }

    #[test]
    fn test_same_seed_same_level() {
        let a = GameState::new(99, Tuning::default());
        let b = GameState::new(99, Tuning::default());
        assert_eq!(a.level, b.level);
        let positions_a: Vec<_> = a.enemies.iter().map(|t| t.pos).collect();
        let positions_b: Vec<_> = b.enemies.iter().map(|t| t.pos).collect();
        assert_eq!(positions_a, positions_b);
    }

    #[test]
    fn test_hud_publishes_only_changes() {
        let mut state = GameState::new(3, Tuning::default());
        state.events.clear();
        state.publish_hud();
        assert!(state.events.is_empty());
        state.score += 100;
        state.publish_hud();
        assert_eq!(state.events, vec![GameEvent::ScoreChanged { score: 100 }]);
    }

    #[test]
    fn test_drain_events_into_closure() {
        let mut state = GameState::new(3, Tuning::default());
        let mut count = 0;
        state.drain_events(&mut |_: &GameEvent| count += 1);
        assert!(count > 0);
        assert!(state.events.is_empty());
    }
}
