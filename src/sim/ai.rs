//! Enemy intent generation
//!
//! Each enemy carries an [`EnemyBrain`] with two free-running timers. Decisions
//! are split from their application so the random rolls can be injected.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::tank::Tank;
use crate::tuning::{FactionParams, GameTuning};

/// A single movement step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveAction {
    Advance,
    Retreat,
    RotateLeft,
    RotateRight,
}

impl MoveAction {
    /// Uniform pick from a roll in [0, 1)
    pub fn from_roll(roll: f32) -> Self {
        if roll < 0.25 {
            MoveAction::Advance
        } else if roll < 0.5 {
            MoveAction::Retreat
        } else if roll < 0.75 {
            MoveAction::RotateLeft
        } else {
            MoveAction::RotateRight
        }
    }

    pub fn apply(self, tank: &mut Tank) {
        match self {
            MoveAction::Advance => tank.move_forward(),
            MoveAction::Retreat => tank.move_backward(),
            MoveAction::RotateLeft => tank.rotate_left(),
            MoveAction::RotateRight => tank.rotate_right(),
        }
    }
}

/// Per-enemy AI timers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyBrain {
    pub move_timer_ms: u64,
    pub fire_timer_ms: u64,
    pub move_interval_ms: u64,
    pub fire_interval_ms: u64,
}

impl EnemyBrain {
    /// Timers start at a random phase so enemies don't act in lockstep
    pub fn new(params: &FactionParams, rng: &mut impl Rng) -> Self {
        Self {
            move_timer_ms: phase(rng, params.move_interval_ms),
            fire_timer_ms: phase(rng, params.fire_interval_ms),
            move_interval_ms: params.move_interval_ms,
            fire_interval_ms: params.fire_interval_ms,
        }
    }

    /// Advance both timers. Returns (move due, fire due); a due timer resets.
    pub fn advance(&mut self, dt_ms: u64) -> (bool, bool) {
        self.move_timer_ms += dt_ms;
        self.fire_timer_ms += dt_ms;

        let move_due = self.move_timer_ms > self.move_interval_ms;
        if move_due {
            self.move_timer_ms = 0;
        }
        let fire_due = self.fire_timer_ms > self.fire_interval_ms;
        if fire_due {
            self.fire_timer_ms = 0;
        }
        (move_due, fire_due)
    }
}

fn phase(rng: &mut impl Rng, interval_ms: u64) -> u64 {
    if interval_ms == 0 { 0 } else { rng.random_range(0..interval_ms) }
}

/// Random rolls consumed by one AI step
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AiRolls {
    pub action: f32,
    pub seek: f32,
    pub advance_far: f32,
    pub retreat_near: f32,
    pub advance_default: f32,
}

impl AiRolls {
    pub fn draw(rng: &mut impl Rng) -> Self {
        Self {
            action: rng.random(),
            seek: rng.random(),
            advance_far: rng.random(),
            retreat_near: rng.random(),
            advance_default: rng.random(),
        }
    }
}

/// What an enemy wants to do this tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AiDecision {
    /// Timer-triggered random step
    pub timed: Option<MoveAction>,
    /// Turn the body toward the player
    pub face_player: bool,
    /// Distance-biased step toward or away from the player
    pub biased: Option<MoveAction>,
    pub fire: bool,
}

/// Distance bias: push in when far, back off when close, otherwise lean forward
pub fn distance_bias(distance: f32, rolls: &AiRolls, game: &GameTuning) -> Option<MoveAction> {
    if distance > game.seek_far_distance && rolls.advance_far < game.advance_far_chance {
        Some(MoveAction::Advance)
    } else if distance < game.seek_near_distance && rolls.retreat_near < game.retreat_near_chance {
        Some(MoveAction::Retreat)
    } else if rolls.advance_default < game.advance_default_chance {
        Some(MoveAction::Advance)
    } else {
        None
    }
}

/// Decide one tick of behavior
pub fn decide(
    brain: &mut EnemyBrain,
    dt_ms: u64,
    distance_to_player: f32,
    rolls: &AiRolls,
    game: &GameTuning,
) -> AiDecision {
    let (move_due, fire_due) = brain.advance(dt_ms);
    AiDecision {
        timed: move_due.then(|| MoveAction::from_roll(rolls.action)),
        face_player: rolls.seek < game.seek_chance,
        biased: distance_bias(distance_to_player, rolls, game),
        fire: fire_due,
    }
}

/// Apply the movement part of a decision. The turret always tracks the player.
pub fn steer(tank: &mut Tank, decision: &AiDecision, player_pos: Vec2) {
    if let Some(action) = decision.timed {
        action.apply(tank);
    }
    if decision.face_player {
        tank.face(player_pos);
    }
    tank.aim_turret_at(player_pos);
    if let Some(action) = decision.biased {
        action.apply(tank);
    }
}
