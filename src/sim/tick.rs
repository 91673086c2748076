//! Per-tick simulation step
//!
//! Stage order is fixed: player intents, enemy AI, bullets, power-ups,
//! reinforcements, presentation updates, termination.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::ai::{self, AiRolls};
use super::collision::{self, BulletHit, CollisionResult, enemy_tank_collision, tank_blocks_collision, tank_tank_collision};
use super::events::{GameEvent, InputSource, Key};
use super::level::Level;
use super::powerup;
use super::spawn;
use super::state::{Bullet, EffectKind, GamePhase, GameState};
use super::tank::{Faction, Tank};
use crate::consts::{CELL_SIZE, MAX_TICK_MS};

/// Snapshot of pressed controls for one tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    pub forward: bool,
    pub backward: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub turret_left: bool,
    pub turret_right: bool,
    pub fire: bool,
}

impl InputSource for TickInput {
    fn pressed(&self, key: Key) -> bool {
        match key {
            Key::Forward => self.forward,
            Key::Backward => self.backward,
            Key::RotateLeft => self.rotate_left,
            Key::RotateRight => self.rotate_right,
            Key::TurretLeft => self.turret_left,
            Key::TurretRight => self.turret_right,
            Key::Fire => self.fire,
        }
    }
}

/// Advance the game by `dt_ms` of simulated time. A no-op once the game is over.
pub fn tick(state: &mut GameState, input: &impl InputSource, dt_ms: u32) {
    if state.phase.is_over() {
        return;
    }
    let dt = u64::from(dt_ms.min(MAX_TICK_MS));
    state.time_ticks += 1;
    state.time_ms += dt;

    apply_player_input(state, input);
    // A frozen enemy simply skips its AI step
    if !state.are_enemies_frozen() {
        run_enemy_ai(state, dt);
    }
    update_bullets(state);
    powerup::update(state);
    spawn::maybe_spawn_enemy(state);
    publish_tank_updates(state);

    let outcome = check_termination(state);
    state.publish_hud();
    if let Some(won) = outcome {
        state.phase = if won { GamePhase::Won } else { GamePhase::Lost };
        log::info!("Game over ({}), score {}", if won { "won" } else { "lost" }, state.score);
        state.emit(GameEvent::GameOver { won });
    }
}

/// Keep a tank inside the playable interior of the grid
pub fn clamp_to_field(tank: &mut Tank, level: &Level) {
    let dims = level.dimensions();
    if dims.width < 3 || dims.height < 3 {
        return;
    }
    let min = level.offset() + Vec2::splat(CELL_SIZE);
    let max = level.offset() + Vec2::new(dims.width as f32 - 2.0, dims.height as f32 - 2.0) * CELL_SIZE;
    tank.set_position(tank.pos.clamp(min, max));
}

/// Bullets are culled once they are `margin` beyond the grid
pub fn bullet_out_of_bounds(bullet: &Bullet, level: &Level, margin: f32) -> bool {
    let dims = level.dimensions();
    let half = Vec2::new(dims.width as f32, dims.height as f32) * CELL_SIZE / 2.0 + Vec2::splat(margin);
    bullet.pos.x.abs() > half.x || bullet.pos.y.abs() > half.y
}

fn apply_player_input(state: &mut GameState, input: &impl InputSource) {
    let before = state.player.pos;
    let player = &mut state.player;

    if input.pressed(Key::Forward) {
        player.move_forward();
    }
    if input.pressed(Key::Backward) {
        player.move_backward();
    }
    if input.pressed(Key::RotateLeft) {
        player.rotate_left();
    }
    if input.pressed(Key::RotateRight) {
        player.rotate_right();
    }
    if input.pressed(Key::TurretLeft) {
        player.set_turret_rotation(player.turret_rotation + player.rotation_speed);
    }
    if input.pressed(Key::TurretRight) {
        player.set_turret_rotation(player.turret_rotation - player.rotation_speed);
    }

    if state.player.take_moved() {
        let radius = state.tuning.combat.tank_collision_radius;
        let blocked = tank_blocks_collision(&state.player, &state.level, &state.tuning.combat)
            || enemy_tank_collision(&state.player, &state.enemies, None, radius);
        if blocked {
            state.player.set_position(before);
        }
        clamp_to_field(&mut state.player, &state.level);
    }

    if input.pressed(Key::Fire) {
        let cooldown = state.player_fire_cooldown();
        let (speed, muzzle) = (state.tuning.combat.bullet_speed, state.tuning.combat.muzzle_offset);
        if let Some(spec) = state.player.fire_with_cooldown(state.time_ms, cooldown, speed, muzzle) {
            state.add_bullet(spec);
        }
    }
}

fn run_enemy_ai(state: &mut GameState, dt: u64) {
    let combat = state.tuning.combat.clone();
    let player_pos = state.player.pos;

    for i in 0..state.enemies.len() {
        let rolls = AiRolls::draw(&mut state.rng);
        let distance = state.enemies[i].pos.distance(player_pos);
        let decision = ai::decide(&mut state.brains[i], dt, distance, &rolls, &state.tuning.game);

        let before = state.enemies[i].pos;
        ai::steer(&mut state.enemies[i], &decision, player_pos);

        if state.enemies[i].take_moved() {
            let tank = &state.enemies[i];
            let blocked = tank_blocks_collision(tank, &state.level, &combat)
                || enemy_tank_collision(tank, &state.enemies, Some(i), combat.tank_collision_radius)
                || tank_tank_collision(tank, &state.player, combat.tank_collision_radius);
            if blocked {
                state.enemies[i].set_position(before);
            }
            clamp_to_field(&mut state.enemies[i], &state.level);
        }

        if decision.fire {
            let shot = state.enemies[i].fire(state.time_ms, combat.bullet_speed, combat.muzzle_offset);
            if let Some(spec) = shot {
                state.add_bullet(spec);
            }
        }
    }
}

fn update_bullets(state: &mut GameState) {
    let margin = state.tuning.combat.bounds_margin;
    let mut i = 0;
    while i < state.bullets.len() {
        state.bullets[i].advance();
        let bullet = state.bullets[i].clone();

        let invulnerable = state.is_player_invulnerable();
        let result = collision::bullet_collision(
            &bullet,
            &mut state.player,
            &mut state.enemies,
            &mut state.level,
            invulnerable,
            &state.tuning,
        );

        if result.consumed() {
            state.bullets.remove(i);
            resolve_hit(state, &bullet, result);
        } else if bullet_out_of_bounds(&bullet, &state.level, margin) {
            state.bullets.remove(i);
        } else {
            i += 1;
        }
    }
}

fn resolve_hit(state: &mut GameState, bullet: &Bullet, result: CollisionResult) {
    state.score += result.score;
    let Some(hit) = result.hit else {
        return;
    };

    match hit {
        BulletHit::Enemy {
            index,
            destroyed: true,
        } => {
            let tank = state.remove_enemy(index);
            state.remaining_enemies = state.remaining_enemies.saturating_sub(1);
            state.emit(GameEvent::Explosion { position: tank.pos });
            log::info!("Enemy {} ({}) destroyed", tank.id, tank.faction.as_str());
            powerup::spawn_powerup(state, tank.pos);
        }
        BulletHit::Block {
            pos,
            kind,
            destroyed: true,
            ..
        } => {
            let position = state.level.grid_to_world(pos);
            state.emit(GameEvent::BlockDestroyed { pos, kind, position });
        }
        BulletHit::Block {
            pos,
            kind,
            health: Some(health),
            ..
        } => {
            state.emit(GameEvent::BlockDamaged { pos, kind, health });
            state.emit(GameEvent::BulletImpact { position: bullet.pos });
        }
        _ => state.emit(GameEvent::BulletImpact { position: bullet.pos }),
    }
}

fn publish_tank_updates(state: &mut GameState) {
    let mut updates = Vec::new();
    if state.player.take_dirty() {
        updates.push((state.player.id, state.player.snapshot()));
    }
    for tank in &mut state.enemies {
        if tank.take_dirty() {
            updates.push((tank.id, tank.snapshot()));
        }
    }
    for (id, snapshot) in updates {
        state.emit(GameEvent::TankUpdated { id, state: snapshot });
    }
}

/// Handle player death and evaluate the end of the round.
/// Returns `Some(won)` when the game just ended; losing takes priority.
fn check_termination(state: &mut GameState) -> Option<bool> {
    if state.player.is_destroyed() {
        state.emit(GameEvent::Explosion {
            position: state.player.pos,
        });
        state.emit(GameEvent::TankRemoved { id: state.player.id });
        state.lives = state.lives.saturating_sub(1);
        if state.lives == 0 {
            return Some(false);
        }
        respawn_player(state);
    }

    (state.remaining_enemies == 0 && state.enemies.is_empty()).then_some(true)
}

fn respawn_player(state: &mut GameState) {
    state.effects.invulnerable.clear();

    let id = state.next_entity_id();
    let spawn_point = spawn::find_player_spawn(&state.level, &state.enemies, &state.tuning)
        .unwrap_or_else(|| {
            log::warn!("No clear player spawn point, using the default");
            spawn::player_spawn_point(&state.level)
        });
    let mut player = Tank::from_tuning(id, Faction::Player, spawn_point, &state.tuning);
    player.take_dirty();
    state.emit(GameEvent::TankSpawned {
        id,
        state: player.snapshot(),
    });
    state.player = player;

    let helmet_ms = state.tuning.powerups.helmet_ms;
    state.activate_effect(EffectKind::Invulnerable, helmet_ms);
    log::info!("Player respawned with {} lives left", state.lives);
}
