//! Collision detection and bullet impact resolution
//!
//! Tank checks are pure queries; the caller reverts a move that reports a
//! collision. Bullet resolution mutates only tank health and level cells.

use glam::Vec2;

use super::level::{BlockKind, GridPos, Level};
use super::state::Bullet;
use super::tank::Tank;
use crate::tuning::{CombatTuning, Tuning};

/// What a bullet struck
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BulletHit {
    /// Enemy bullet reached the player; `damaged` is false while invulnerable
    Player { damaged: bool },
    /// Player bullet reached the enemy at `index`
    Enemy { index: usize, destroyed: bool },
    /// Bullet stopped on a solid cell
    Block {
        pos: GridPos,
        kind: BlockKind,
        destroyed: bool,
        /// Remaining durability of a surviving block
        health: Option<i32>,
    },
    /// Bullet entered a cell outside the grid
    Boundary,
}

/// Result of resolving one bullet
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionResult {
    pub hit: Option<BulletHit>,
    /// Score earned by this impact
    pub score: u64,
}

impl CollisionResult {
    pub fn miss() -> Self {
        Self { hit: None, score: 0 }
    }

    fn hit(hit: BulletHit, score: u64) -> Self {
        Self {
            hit: Some(hit),
            score,
        }
    }

    /// Whether the bullet must be removed
    pub fn consumed(&self) -> bool {
        self.hit.is_some()
    }
}

/// Whether a tank centered at `pos` overlaps an impassable cell
///
/// Looks at the 3x3 neighborhood of the tank's cell. An empty level reports
/// blocked everywhere.
pub fn position_blocked(pos: Vec2, level: &Level, combat: &CombatTuning) -> bool {
    if level.is_empty() {
        return true;
    }
    let center = level.world_to_grid(pos);
    let reach = combat.tank_radius + combat.block_radius;
    std::iter::once(center)
        .chain(center.neighbors())
        .any(|cell| level.blocks_tanks(cell) && level.grid_to_world(cell).distance(pos) < reach)
}

pub fn tank_blocks_collision(tank: &Tank, level: &Level, combat: &CombatTuning) -> bool {
    position_blocked(tank.pos, level, combat)
}

pub fn tank_tank_collision(a: &Tank, b: &Tank, radius: f32) -> bool {
    a.pos.distance(b.pos) < radius
}

/// Check a tank against every active enemy except `exclude`
pub fn enemy_tank_collision(tank: &Tank, enemies: &[Tank], exclude: Option<usize>, radius: f32) -> bool {
    enemies
        .iter()
        .enumerate()
        .any(|(i, other)| Some(i) != exclude && tank_tank_collision(tank, other, radius))
}

/// Resolve a bullet against tanks, then the level
///
/// At most one target is affected. Enemy bullets only test the player, player
/// bullets only test enemies (first hit in list order wins), and the occupied
/// cell is tested only if no tank was hit.
pub fn bullet_collision(
    bullet: &Bullet,
    player: &mut Tank,
    enemies: &mut [Tank],
    level: &mut Level,
    player_invulnerable: bool,
    tuning: &Tuning,
) -> CollisionResult {
    let combat = &tuning.combat;

    if bullet.is_player_owned() {
        let target = enemies
            .iter()
            .position(|enemy| bullet.pos.distance(enemy.pos) < combat.bullet_enemy_hit_radius);
        if let Some(index) = target {
            let enemy = &mut enemies[index];
            enemy.take_damage(combat.bullet_damage);
            let destroyed = enemy.is_destroyed();
            let score = if destroyed {
                tuning.faction(enemy.faction).score
            } else {
                0
            };
            log::debug!("Bullet {} hit enemy {} (destroyed: {})", bullet.id, enemy.id, destroyed);
            return CollisionResult::hit(BulletHit::Enemy { index, destroyed }, score);
        }
    } else if bullet.pos.distance(player.pos) < combat.bullet_player_hit_radius {
        let damaged = !player_invulnerable;
        if damaged {
            player.take_damage(combat.bullet_damage);
        }
        log::debug!("Bullet {} hit player (damaged: {})", bullet.id, damaged);
        return CollisionResult::hit(BulletHit::Player { damaged }, 0);
    }

    let pos = level.world_to_grid(bullet.pos);
    if !level.blocks_bullets(pos) {
        return CollisionResult::miss();
    }
    let Some(cell) = level.cell_at_mut(pos) else {
        return CollisionResult::hit(BulletHit::Boundary, 0);
    };

    let kind = cell.kind;
    let (destroyed, health) = match (kind, cell.health.as_mut()) {
        (BlockKind::Steel, Some(health)) => {
            *health -= combat.bullet_damage;
            (*health <= 0, Some(*health))
        }
        _ => (kind.destructible(), None),
    };

    let mut score = 0;
    if destroyed {
        level.clear_cell(pos);
        if bullet.is_player_owned() {
            score = combat.block_score;
            if kind == BlockKind::Steel {
                score *= combat.steel_score_multiplier;
            }
        }
        log::debug!("Block {:?} at ({}, {}) destroyed", kind, pos.x, pos.z);
    }

    CollisionResult::hit(
        BulletHit::Block {
            pos,
            kind,
            destroyed,
            health: if destroyed { None } else { health },
        },
        score,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::levelgen::bordered_layout;
    use crate::sim::tank::Faction;
    use crate::sim::tank::BulletSpec;
    use proptest::prelude::*;

    fn open_level(size: usize) -> Level {
        Level::from_layout(&bordered_layout(size), 25, 100)
    }

    fn bullet(pos: Vec2, owner: Faction) -> Bullet {
        Bullet::from_spec(
            99,
            BulletSpec {
                position: pos,
                direction: Vec2::Y,
                speed: 0.4,
                owner,
            },
        )
    }

    fn tank(faction: Faction, pos: Vec2) -> Tank {
        Tank::from_tuning(1, faction, pos, &Tuning::default())
    }

    #[test]
    fn test_tank_near_wall_is_blocked() {
        let level = open_level(10);
        let combat = CombatTuning::default();
        // Cell (1, 5) is next to the steel border at x = 0
        let inside = level.grid_to_world(GridPos::new(2, 5));
        assert!(!position_blocked(inside, &level, &combat));
        let hugging = level.grid_to_world(GridPos::new(1, 5));
        assert!(position_blocked(hugging, &level, &combat));
    }

    #[test]
    fn test_removed_cell_no_longer_blocks() {
        let mut level = open_level(10);
        let combat = CombatTuning::default();
        let block = GridPos::new(5, 5);
        level.set_cell(block, BlockKind::Brick);
        let beside = level.grid_to_world(GridPos::new(4, 5));
        assert!(position_blocked(beside, &level, &combat));
        level.clear_cell(block);
        assert!(!position_blocked(beside, &level, &combat));
    }

    #[test]
    fn test_empty_level_blocks() {
        assert!(position_blocked(Vec2::ZERO, &Level::empty(), &CombatTuning::default()));
    }

    #[test]
    fn test_enemy_tank_collision_skips_self() {
        let enemies = vec![
            tank(Faction::EnemyLight, Vec2::ZERO),
            tank(Faction::EnemyLight, Vec2::new(5.0, 0.0)),
        ];
        assert!(!enemy_tank_collision(&enemies[0], &enemies, Some(0), 1.5));
        assert!(enemy_tank_collision(&enemies[0], &enemies, None, 1.5));
        let near = tank(Faction::Player, Vec2::new(4.0, 0.0));
        assert!(enemy_tank_collision(&near, &enemies, None, 1.5));
    }

    #[test]
    fn test_player_bullet_damages_first_enemy_only() {
        let tuning = Tuning::default();
        let mut level = open_level(20);
        let mut player = tank(Faction::Player, Vec2::new(0.0, -5.0));
        let mut enemies = vec![
            tank(Faction::EnemyMedium, Vec2::new(0.3, 0.0)),
            tank(Faction::EnemyMedium, Vec2::new(-0.3, 0.0)),
        ];
        let b = bullet(Vec2::ZERO, Faction::Player);
        let result = bullet_collision(&b, &mut player, &mut enemies, &mut level, false, &tuning);
        assert_eq!(result.hit, Some(BulletHit::Enemy { index: 0, destroyed: false }));
        assert_eq!(result.score, 0);
        assert_eq!(enemies[0].health(), 25);
        assert_eq!(enemies[1].health(), 50);
    }

    #[test]
    fn test_enemy_bullets_ignore_enemies() {
        let tuning = Tuning::default();
        let mut level = open_level(20);
        let mut player = tank(Faction::Player, Vec2::new(0.0, -5.0));
        let mut enemies = vec![tank(Faction::EnemyLight, Vec2::ZERO)];
        let b = bullet(Vec2::ZERO, Faction::EnemyHeavy);
        let result = bullet_collision(&b, &mut player, &mut enemies, &mut level, false, &tuning);
        assert!(!result.consumed());
        assert_eq!(enemies[0].health(), 25);
    }

    #[test]
    fn test_invulnerable_player_still_stops_bullet() {
        let tuning = Tuning::default();
        let mut level = open_level(20);
        let mut player = tank(Faction::Player, Vec2::ZERO);
        let b = bullet(Vec2::new(0.5, 0.0), Faction::EnemyLight);
        let result = bullet_collision(&b, &mut player, &mut [], &mut level, true, &tuning);
        assert_eq!(result.hit, Some(BulletHit::Player { damaged: false }));
        assert_eq!(player.health(), 100);

        let result = bullet_collision(&b, &mut player, &mut [], &mut level, false, &tuning);
        assert_eq!(result.hit, Some(BulletHit::Player { damaged: true }));
        assert_eq!(player.health(), 75);
    }

    #[test]
    fn test_brick_removed_on_first_hit() {
        let tuning = Tuning::default();
        let mut level = open_level(20);
        let brick = GridPos::new(10, 10);
        level.set_cell(brick, BlockKind::Brick);
        let mut player = tank(Faction::Player, Vec2::new(-5.0, -5.0));
        let b = bullet(level.grid_to_world(brick), Faction::Player);
        let result = bullet_collision(&b, &mut player, &mut [], &mut level, false, &tuning);
        assert_eq!(
            result.hit,
            Some(BulletHit::Block {
                pos: brick,
                kind: BlockKind::Brick,
                destroyed: true,
                health: None
            })
        );
        assert_eq!(result.score, 10);
        assert!(level.cell_at(brick).is_none());
    }

    #[test]
    fn test_enemy_bullet_breaks_brick_without_score() {
        let tuning = Tuning::default();
        let mut level = open_level(20);
        let brick = GridPos::new(10, 10);
        level.set_cell(brick, BlockKind::Brick);
        let mut player = tank(Faction::Player, Vec2::new(-5.0, -5.0));
        let b = bullet(level.grid_to_world(brick), Faction::EnemyLight);
        let result = bullet_collision(&b, &mut player, &mut [], &mut level, false, &tuning);
        assert!(result.consumed());
        assert_eq!(result.score, 0);
        assert!(level.cell_at(brick).is_none());
    }

    #[test]
    fn test_steel_absorbs_four_hits() {
        let tuning = Tuning::default();
        let mut level = open_level(20);
        let steel = GridPos::new(10, 10);
        level.set_cell(steel, BlockKind::Steel);
        let mut player = tank(Faction::Player, Vec2::new(-5.0, -5.0));
        let b = bullet(level.grid_to_world(steel), Faction::Player);

        for expected in [75, 50, 25] {
            let result = bullet_collision(&b, &mut player, &mut [], &mut level, false, &tuning);
            assert!(matches!(
                result.hit,
                Some(BulletHit::Block { destroyed: false, health: Some(h), .. }) if h == expected
            ));
            assert!(level.cell_at(steel).is_some());
        }
        let result = bullet_collision(&b, &mut player, &mut [], &mut level, false, &tuning);
        assert!(matches!(result.hit, Some(BulletHit::Block { destroyed: true, .. })));
        assert_eq!(result.score, 30);
        assert!(level.cell_at(steel).is_none());
    }

    #[test]
    fn test_hq_stops_bullet_but_survives() {
        let tuning = Tuning::default();
        let mut level = open_level(20);
        let hq = GridPos::new(10, 15);
        level.set_cell(hq, BlockKind::Hq);
        let mut player = tank(Faction::Player, Vec2::new(-5.0, -5.0));
        let b = bullet(level.grid_to_world(hq), Faction::EnemyLight);
        let result = bullet_collision(&b, &mut player, &mut [], &mut level, false, &tuning);
        assert!(matches!(result.hit, Some(BulletHit::Block { kind: BlockKind::Hq, destroyed: false, .. })));
        assert_eq!(level.kind_at(hq), Some(BlockKind::Hq));
    }

    #[test]
    fn test_bullets_pass_water_and_trees() {
        let tuning = Tuning::default();
        let mut level = open_level(20);
        let water = GridPos::new(10, 10);
        level.set_cell(water, BlockKind::Water);
        let mut player = tank(Faction::Player, Vec2::new(-5.0, -5.0));
        let b = bullet(level.grid_to_world(water), Faction::Player);
        assert!(!bullet_collision(&b, &mut player, &mut [], &mut level, false, &tuning).consumed());
    }

    #[test]
    fn test_outside_grid_is_boundary() {
        let tuning = Tuning::default();
        let mut level = open_level(10);
        let mut player = tank(Faction::Player, Vec2::ZERO);
        let b = bullet(Vec2::new(20.0, 0.0), Faction::Player);
        let result = bullet_collision(&b, &mut player, &mut [], &mut level, false, &tuning);
        assert_eq!(result.hit, Some(BulletHit::Boundary));
    }

    proptest! {
        #[test]
        fn reverting_a_blocked_move_clears_the_collision(
            walls in proptest::collection::vec((1i32..15, 1i32..15), 0..30),
            start in (2i32..14, 2i32..14),
            rotation in -3.2f32..3.2,
            steps in 1usize..8,
        ) {
            let combat = CombatTuning::default();
            let mut level = open_level(16);
            for (x, z) in walls {
                level.set_cell(GridPos::new(x, z), BlockKind::Brick);
            }
            let start_pos = level.grid_to_world(GridPos::new(start.0, start.1));
            prop_assume!(!position_blocked(start_pos, &level, &combat));

            let mut t = tank(Faction::Player, start_pos);
            t.set_body_rotation(rotation);
            for _ in 0..steps {
                let before = t.pos;
                t.move_forward();
                if tank_blocks_collision(&t, &level, &combat) {
                    t.set_position(before);
                    prop_assert!(!tank_blocks_collision(&t, &level, &combat));
                }
            }
        }

        #[test]
        fn one_bullet_damages_at_most_one_target(
            offsets in proptest::collection::vec((-1.0f32..1.0, -1.0f32..1.0), 1..6),
        ) {
            let tuning = Tuning::default();
            let mut level = open_level(20);
            let mut player = tank(Faction::Player, Vec2::new(0.0, -6.0));
            let mut enemies: Vec<Tank> = offsets
                .iter()
                .map(|(x, z)| tank(Faction::EnemyHeavy, Vec2::new(*x, *z)))
                .collect();
            let b = bullet(Vec2::ZERO, Faction::Player);
            bullet_collision(&b, &mut player, &mut enemies, &mut level, false, &tuning);
            let damaged = enemies.iter().filter(|e| e.health() < e.max_health).count();
            prop_assert!(damaged <= 1);
        }
    }
}
