//! Boundary with the outside world
//!
//! Input arrives through [`InputSource`]; everything the presentation, effects
//! and UI layers need leaves as [`GameEvent`]s. The simulation never waits on
//! or reads anything back from a consumer.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::level::{BlockKind, GridPos};
use super::state::{EffectKind, PowerUpKind};
use super::tank::{Faction, TankState};

/// Logical player controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Key {
    Forward,
    Backward,
    RotateLeft,
    RotateRight,
    TurretLeft,
    TurretRight,
    Fire,
}

/// Pressed-key query supplied by the host
pub trait InputSource {
    fn pressed(&self, key: Key) -> bool;
}

impl<F: Fn(Key) -> bool> InputSource for F {
    fn pressed(&self, key: Key) -> bool {
        self(key)
    }
}

/// Everything the simulation announces
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    // Presentation
    TankSpawned { id: u32, state: TankState },
    TankUpdated { id: u32, state: TankState },
    TankRemoved { id: u32 },
    BulletFired { owner: Faction, position: Vec2, direction: Vec2 },

    // Cosmetic effects
    Explosion { position: Vec2 },
    BulletImpact { position: Vec2 },
    BlockDamaged { pos: GridPos, kind: BlockKind, health: i32 },
    BlockDestroyed { pos: GridPos, kind: BlockKind, position: Vec2 },
    BlockRebuilt { pos: GridPos, kind: BlockKind },
    PowerUpSpawned { id: u32, kind: PowerUpKind, position: Vec2 },
    PowerUpCollected { id: u32, kind: PowerUpKind },
    PowerUpExpired { id: u32 },
    EffectStarted { effect: EffectKind, until_ms: u64 },
    EffectEnded { effect: EffectKind },

    // UI
    ScoreChanged { score: u64 },
    LivesChanged { lives: u32 },
    EnemiesRemainingChanged { remaining: u32 },
    Message { text: String, duration_ms: u64 },
    GameOver { won: bool },
}

/// Consumer of simulation events
pub trait EventSink {
    fn handle(&mut self, event: &GameEvent);
}

impl EventSink for Vec<GameEvent> {
    fn handle(&mut self, event: &GameEvent) {
        self.push(event.clone());
    }
}

impl<F: FnMut(&GameEvent)> EventSink for F {
    fn handle(&mut self, event: &GameEvent) {
        self(event)
    }
}
