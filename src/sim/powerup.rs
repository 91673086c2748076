//! Power-up drops, pickups and timed effects

use glam::Vec2;
use rand::Rng;

use super::events::GameEvent;
use super::level::BlockKind;
use super::state::{EffectKind, GameState, PowerUp, PowerUpKind};
use crate::tuning::PowerUpTuning;

/// Drop decision from two rolls in [0, 1): whether to drop, then which kind
pub fn roll_drop(drop_roll: f32, kind_roll: f32, tuning: &PowerUpTuning) -> Option<PowerUpKind> {
    if drop_roll >= tuning.drop_chance {
        return None;
    }
    let index = ((kind_roll * PowerUpKind::ALL.len() as f32) as usize).min(PowerUpKind::ALL.len() - 1);
    Some(PowerUpKind::ALL[index])
}

/// Maybe drop a power-up at `position`. Returns its ID if one spawned.
pub fn spawn_powerup(state: &mut GameState, position: Vec2) -> Option<u32> {
    let drop_roll: f32 = state.rng.random();
    let kind_roll: f32 = state.rng.random();
    let kind = roll_drop(drop_roll, kind_roll, &state.tuning.powerups)?;
    Some(place_powerup(state, kind, position))
}

/// Place a specific power-up
pub fn place_powerup(state: &mut GameState, kind: PowerUpKind, position: Vec2) -> u32 {
    let id = state.next_entity_id();
    state.powerups.push(PowerUp {
        id,
        kind,
        pos: position,
        spawn_ms: state.time_ms,
        duration_ms: state.tuning.powerups.lifetime_ms,
    });
    state.emit(GameEvent::PowerUpSpawned { id, kind, position });
    log::debug!("Spawned {:?} power-up at ({:.2}, {:.2})", kind, position.x, position.y);
    id
}

/// Expire stale effects, drop stale power-ups and collect overlapping ones
pub fn update(state: &mut GameState) {
    let now = state.time_ms;
    for effect in [
        EffectKind::Invulnerable,
        EffectKind::RapidFire,
        EffectKind::EnemyFreeze,
    ] {
        if state.effects.get_mut(effect).expire(now) {
            state.emit(GameEvent::EffectEnded { effect });
        }
    }

    let pickup_radius = state.tuning.powerups.pickup_radius;
    let player_pos = state.player.pos;
    let mut collected = Vec::new();
    let mut expired = Vec::new();
    state.powerups.retain(|p| {
        if p.is_expired(now) {
            expired.push(p.id);
            false
        } else if p.pos.distance(player_pos) < pickup_radius {
            collected.push((p.id, p.kind));
            false
        } else {
            true
        }
    });

    for id in expired {
        state.emit(GameEvent::PowerUpExpired { id });
    }
    for (id, kind) in collected {
        state.emit(GameEvent::PowerUpCollected { id, kind });
        collect(state, kind);
    }
}

/// Apply a power-up's effect
pub fn collect(state: &mut GameState, kind: PowerUpKind) {
    log::debug!("Collected {:?}", kind);
    let tuning = state.tuning.powerups.clone();
    match kind {
        PowerUpKind::Star => state.lives += 1,
        PowerUpKind::Helmet => state.activate_effect(EffectKind::Invulnerable, tuning.helmet_ms),
        PowerUpKind::Bomb => destroy_all_enemies(state),
        PowerUpKind::MachineGun => state.activate_effect(EffectKind::RapidFire, tuning.machine_gun_ms),
        PowerUpKind::Clock => state.activate_effect(EffectKind::EnemyFreeze, tuning.clock_ms),
        PowerUpKind::BaseProtection => protect_base(state),
    }
    state.message(kind.message());
}

/// Destroy every active enemy, awarding each one's tier score
pub fn destroy_all_enemies(state: &mut GameState) {
    while !state.enemies.is_empty() {
        let tank = state.remove_enemy(0);
        state.emit(GameEvent::Explosion { position: tank.pos });
        state.score += state.enemy_score(tank.faction);
        state.remaining_enemies = state.remaining_enemies.saturating_sub(1);
    }
}

/// Rebuild the ring around the headquarters as brick, keeping existing walls.
/// Cells a tank is standing on stay open.
pub fn protect_base(state: &mut GameState) {
    if state.level.is_empty() {
        log::warn!("Cannot protect base: level is empty");
        return;
    }
    let reach = state.tuning.combat.tank_radius + state.tuning.combat.block_radius;
    let hq = state.level.hq_position();
    for pos in hq.neighbors() {
        let keep = matches!(
            state.level.cell_at(pos).map(|c| c.kind),
            Some(BlockKind::Brick | BlockKind::Steel)
        );
        if keep || !state.level.in_bounds(pos) {
            continue;
        }
        let center = state.level.grid_to_world(pos);
        let occupied = std::iter::once(&state.player)
            .chain(&state.enemies)
            .any(|tank| tank.pos.distance(center) < reach);
        if occupied {
            log::debug!("Leaving ({}, {}) open under a tank", pos.x, pos.z);
            continue;
        }
        state.level.set_cell(pos, BlockKind::Brick);
        state.emit(GameEvent::BlockRebuilt {
            pos,
            kind: BlockKind::Brick,
        });
    }
}
