//! Spawn point selection for the player and enemy reinforcements

use glam::Vec2;
use rand::Rng;

use super::collision::position_blocked;
use super::level::{GridPos, Level};
use super::state::GameState;
use super::tank::{Faction, Tank};
use crate::tuning::{GameTuning, Tuning};

/// Safe player spawn, two rows above the headquarters
pub fn player_spawn_point(level: &Level) -> Vec2 {
    let dims = level.dimensions();
    level.grid_to_world(GridPos::new(dims.width as i32 / 2, dims.height as i32 - 7))
}

/// Whether the player may appear at `pos`: open ground, clear of walls and
/// outside every enemy's separation radius
pub fn player_spawn_valid(pos: Vec2, level: &Level, enemies: &[Tank], tuning: &Tuning) -> bool {
    let combat = &tuning.combat;
    if level.blocks_tanks(level.world_to_grid(pos)) || position_blocked(pos, level, combat) {
        return false;
    }
    let gap = tuning.game.spawn_enemy_separation * combat.tank_collision_radius;
    enemies.iter().all(|e| e.pos.distance(pos) >= gap)
}

/// Nearest valid player spawn, searching square rings of cells outward from
/// [`player_spawn_point`]. `None` when no cell on the level qualifies.
pub fn find_player_spawn(level: &Level, enemies: &[Tank], tuning: &Tuning) -> Option<Vec2> {
    let dims = level.dimensions();
    let home = level.world_to_grid(player_spawn_point(level));
    let max_ring = dims.width.max(dims.height) as i32;
    (0..=max_ring).find_map(|ring| {
        ring_cells(home, ring)
            .map(|cell| level.grid_to_world(cell))
            .find(|&pos| player_spawn_valid(pos, level, enemies, tuning))
    })
}

/// Cells at Chebyshev distance `ring` from `center`, row by row
fn ring_cells(center: GridPos, ring: i32) -> impl Iterator<Item = GridPos> {
    (-ring..=ring).flat_map(move |dz| {
        (-ring..=ring).filter_map(move |dx| {
            (dx.abs().max(dz.abs()) == ring).then_some(GridPos::new(center.x + dx, center.z + dz))
        })
    })
}

/// Enemy tier from a roll in [0, 1)
pub fn pick_faction(roll: f32, game: &GameTuning) -> Faction {
    if roll < game.light_share {
        Faction::EnemyLight
    } else if roll < game.light_share + game.medium_share {
        Faction::EnemyMedium
    } else {
        Faction::EnemyHeavy
    }
}

/// Whether an enemy may appear at `pos`
pub fn spawn_point_valid(pos: Vec2, level: &Level, player: &Tank, enemies: &[Tank], tuning: &Tuning) -> bool {
    let combat = &tuning.combat;
    let game = &tuning.game;
    let cell = level.world_to_grid(pos);
    if level.blocks_tanks(cell) || position_blocked(pos, level, combat) {
        return false;
    }
    let enemy_gap = game.spawn_enemy_separation * combat.tank_collision_radius;
    if enemies.iter().any(|e| e.pos.distance(pos) < enemy_gap) {
        return false;
    }
    pos.distance(player.pos) >= game.spawn_player_separation * combat.tank_collision_radius
}

/// Sample candidate cells in the upper band of the field
pub fn find_enemy_spawn(
    level: &Level,
    player: &Tank,
    enemies: &[Tank],
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> Option<Vec2> {
    let dims = level.dimensions();
    let (width, height) = (dims.width as i32, dims.height as i32);
    let (x_end, z_end) = (width - 2, 2 + height / 3);
    if x_end <= 2 || z_end <= 2 {
        log::warn!("Level too small for enemy spawns ({}x{})", width, height);
        return None;
    }

    (0..tuning.game.spawn_attempts).find_map(|_| {
        let cell = GridPos::new(rng.random_range(2..x_end), rng.random_range(2..z_end));
        let pos = level.grid_to_world(cell);
        spawn_point_valid(pos, level, player, enemies, tuning).then_some(pos)
    })
}

/// Whether the active cap and the kill count allow another enemy
pub fn can_spawn(state: &GameState) -> bool {
    let active = state.enemies.len();
    active < state.tuning.game.max_active_enemies && (active as u32) < state.remaining_enemies
}

/// Try to add one enemy. Failure is logged and left for a later tick.
pub fn spawn_enemy(state: &mut GameState) -> bool {
    if !can_spawn(state) {
        return false;
    }
    let found = find_enemy_spawn(
        &state.level,
        &state.player,
        &state.enemies,
        &state.tuning,
        &mut state.rng,
    );
    let Some(pos) = found else {
        log::warn!("No valid enemy spawn point found");
        return false;
    };

    let roll: f32 = state.rng.random();
    let faction = pick_faction(roll, &state.tuning.game);
    let id = state.add_enemy(faction, pos);
    log::info!(
        "Spawned {} enemy {} at ({:.2}, {:.2})",
        faction.as_str(),
        id,
        pos.x,
        pos.y
    );
    true
}

/// Per-tick reinforcement roll
pub fn maybe_spawn_enemy(state: &mut GameState) {
    let roll: f32 = state.rng.random();
    if roll < state.tuning.game.spawn_chance && can_spawn(state) {
        spawn_enemy(state);
    }
}
