//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Simulated clock only (advanced by `tick`)
//! - Seeded RNG only
//! - Stable iteration order (spawn order)
//! - No rendering, input polling or platform dependencies

pub mod ai;
pub mod collision;
pub mod events;
pub mod level;
pub mod levelgen;
pub mod powerup;
pub mod spawn;
pub mod state;
pub mod tank;
pub mod tick;

pub use ai::{AiDecision, EnemyBrain, MoveAction};
pub use collision::{
    BulletHit, CollisionResult, bullet_collision, enemy_tank_collision, tank_blocks_collision,
    tank_tank_collision,
};
pub use events::{EventSink, GameEvent, InputSource, Key};
pub use level::{BlockKind, Cell, Dimensions, GridPos, Level, LevelLayout};
pub use levelgen::{bordered_layout, generate_layout};
pub use state::{
    ActiveEffects, Bullet, EffectKind, GamePhase, GameState, PowerUp, PowerUpKind, TimedEffect,
};
pub use tank::{BulletSpec, Faction, Tank, TankState};
pub use tick::{TickInput, tick};
