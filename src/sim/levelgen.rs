//! Procedural level layout
//!
//! Steel border, walled rooms with doors, water bodies, forests, then the
//! headquarters and spawn areas are force-cleared so the round is playable.

use rand::Rng;

use super::level::{BlockKind, LevelLayout};

/// Chance that a room is walled with brick instead of steel
const ROOM_BRICK_CHANCE: f64 = 0.7;
/// Fill ratio of forest patches
const FOREST_FILL: f64 = 0.7;
/// Enemy spawn areas cleared in the upper band
const SPAWN_AREAS: usize = 3;

/// Bordered empty field, useful for tests and scripted scenarios
pub fn bordered_layout(size: usize) -> LevelLayout {
    (0..size)
        .map(|z| {
            (0..size)
                .map(|x| {
                    if is_border(size, x, z) {
                        BlockKind::Steel
                    } else {
                        BlockKind::Ground
                    }
                })
                .collect()
        })
        .collect()
}

/// Random playable layout for a `size` x `size` field
pub fn generate_layout(size: usize, rng: &mut impl Rng) -> LevelLayout {
    let mut layout = bordered_layout(size);
    if size < 3 {
        log::warn!("Field size {} too small for a generated level", size);
        return layout;
    }

    create_rooms(&mut layout, size, rng);
    create_water(&mut layout, size, rng);
    create_forests(&mut layout, size, rng);

    let hq_x = size / 2;
    let hq_z = size.saturating_sub(5);
    clear_area(&mut layout, size, hq_x, hq_z, 2);
    // Player spawn sits two rows above the headquarters
    clear_area(&mut layout, size, size / 2, size.saturating_sub(7), 1);
    clear_area(&mut layout, size, size / 2, size / 4, 4);

    for _ in 0..SPAWN_AREAS {
        let x = size / 4 + below(rng, size / 2);
        let z = size / 5 + below(rng, size / 5);
        clear_area(&mut layout, size, x, z, 2);
    }

    // Placed last so no clearing pass can wipe it
    layout[hq_z][hq_x] = BlockKind::Hq;

    log::debug!("Generated {}x{} level", size, size);
    layout
}

fn is_border(size: usize, x: usize, z: usize) -> bool {
    x == 0 || z == 0 || x + 1 == size || z + 1 == size
}

/// Uniform integer in `0..n`, or 0 when the range is empty
fn below(rng: &mut impl Rng, n: usize) -> usize {
    if n == 0 { 0 } else { rng.random_range(0..n) }
}

fn create_rooms(layout: &mut LevelLayout, size: usize, rng: &mut impl Rng) {
    let count = 4 + below(rng, 3);
    for _ in 0..count {
        let width = 4 + below(rng, 4);
        let height = 4 + below(rng, 4);
        let start_x = 3 + below(rng, size.saturating_sub(width + 6));
        let start_z = 3 + below(rng, size.saturating_sub(height + 6));
        let wall = if rng.random_bool(ROOM_BRICK_CHANCE) {
            BlockKind::Brick
        } else {
            BlockKind::Steel
        };

        for z in start_z..start_z + height {
            for x in start_x..start_x + width {
                let edge = z == start_z || z == start_z + height - 1 || x == start_x || x == start_x + width - 1;
                if edge && x < size && z < size {
                    layout[z][x] = wall;
                }
            }
        }

        let doors = 1 + below(rng, 2);
        for _ in 0..doors {
            let (x, z) = match below(rng, 4) {
                0 => (start_x + 1 + below(rng, width - 2), start_z),
                1 => (start_x + width - 1, start_z + 1 + below(rng, height - 2)),
                2 => (start_x + 1 + below(rng, width - 2), start_z + height - 1),
                _ => (start_x, start_z + 1 + below(rng, height - 2)),
            };
            if x < size && z < size {
                layout[z][x] = BlockKind::Ground;
            }
        }
    }
}

fn create_water(layout: &mut LevelLayout, size: usize, rng: &mut impl Rng) {
    let count = 2 + below(rng, 3);
    for _ in 0..count {
        let width = 3 + below(rng, 5);
        let height = 2 + below(rng, 3);
        let start_x = 2 + below(rng, size.saturating_sub(width + 4));
        let start_z = 2 + below(rng, size.saturating_sub(height + 4));

        let fits = (start_z..start_z + height).all(|z| {
            (start_x..start_x + width)
                .all(|x| layout.get(z).and_then(|row| row.get(x)) == Some(&BlockKind::Ground))
        });
        if !fits {
            continue;
        }
        for row in &mut layout[start_z..start_z + height] {
            for cell in &mut row[start_x..start_x + width] {
                *cell = BlockKind::Water;
            }
        }
    }
}

fn create_forests(layout: &mut LevelLayout, size: usize, rng: &mut impl Rng) {
    let count = 3 + below(rng, 4);
    for _ in 0..count {
        let width = 3 + below(rng, 4);
        let height = 3 + below(rng, 4);
        let start_x = 2 + below(rng, size.saturating_sub(width + 4));
        let start_z = 2 + below(rng, size.saturating_sub(height + 4));

        for z in start_z..(start_z + height).min(size) {
            for x in start_x..(start_x + width).min(size) {
                if rng.random_bool(FOREST_FILL) && layout[z][x] == BlockKind::Ground {
                    layout[z][x] = BlockKind::Trees;
                }
            }
        }
    }
}

/// Reset a square to ground, leaving the border intact
fn clear_area(layout: &mut LevelLayout, size: usize, cx: usize, cz: usize, radius: usize) {
    let (x0, z0) = (cx.saturating_sub(radius), cz.saturating_sub(radius));
    let (x1, z1) = ((cx + radius).min(size - 1), (cz + radius).min(size - 1));
    for z in z0..=z1 {
        for x in x0..=x1 {
            if !is_border(size, x, z) {
                layout[z][x] = BlockKind::Ground;
            }
        }
    }
}
