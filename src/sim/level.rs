//! Grid level: block cells and grid/world conversion
//!
//! The grid is centered on the world origin. Cell `(x, z)` has its center at
//! `(offset_x + x, offset_z + z)` where `offset = -(size / 2) + 0.5`.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::CELL_SIZE;

/// Block types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BlockKind {
    #[default]
    Ground,
    Brick,
    Steel,
    Water,
    Trees,
    /// Headquarters
    Hq,
}

impl BlockKind {
    pub fn destructible(self) -> bool {
        matches!(self, BlockKind::Brick | BlockKind::Steel)
    }

    pub fn passable_by_tanks(self) -> bool {
        self == BlockKind::Ground
    }

    pub fn passable_by_bullets(self) -> bool {
        matches!(self, BlockKind::Ground | BlockKind::Water | BlockKind::Trees)
    }
}

/// One grid cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub kind: BlockKind,
    /// Damage capacity; only brick and steel carry one
    pub health: Option<i32>,
}

impl Cell {
    /// Build a cell with the durability that goes with its kind
    pub fn new(kind: BlockKind, brick_health: i32, steel_health: i32) -> Self {
        let health = match kind {
            BlockKind::Brick => Some(brick_health),
            BlockKind::Steel => Some(steel_health),
            _ => None,
        };
        Self { kind, health }
    }

    pub fn destructible(&self) -> bool {
        self.kind.destructible()
    }

    pub fn passable_by_tanks(&self) -> bool {
        self.kind.passable_by_tanks()
    }

    pub fn passable_by_bullets(&self) -> bool {
        self.kind.passable_by_bullets()
    }
}

/// Integer grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i32,
    pub z: i32,
}

impl GridPos {
    pub const fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Eight surrounding cells, row by row
    pub fn neighbors(self) -> impl Iterator<Item = GridPos> {
        (-1..=1).flat_map(move |dz| {
            (-1..=1).filter_map(move |dx| {
                (dx != 0 || dz != 0).then_some(GridPos::new(self.x + dx, self.z + dz))
            })
        })
    }
}

/// Grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

/// Block layout used to build a level (row-major, `layout[z][x]`)
pub type LevelLayout = Vec<Vec<BlockKind>>;

/// The playfield. Removed cells are `None` and behave like open ground.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    width: usize,
    height: usize,
    cells: Vec<Option<Cell>>,
    brick_health: i32,
    steel_health: i32,
}

impl Level {
    /// Build a level from a layout; ragged rows are padded with ground
    pub fn from_layout(layout: &LevelLayout, brick_health: i32, steel_health: i32) -> Self {
        let height = layout.len();
        let width = layout.iter().map(Vec::len).max().unwrap_or(0);
        if width == 0 || height == 0 {
            log::warn!("Level layout is empty");
        }

        let mut cells = Vec::with_capacity(width * height);
        for row in layout {
            for x in 0..width {
                let kind = row.get(x).copied().unwrap_or_default();
                cells.push(Some(Cell::new(kind, brick_health, steel_health)));
            }
        }

        Self {
            width,
            height,
            cells,
            brick_health,
            steel_health,
        }
    }

    /// A level with no cells; every lookup reports out of bounds
    pub fn empty() -> Self {
        Self::from_layout(&Vec::new(), 0, 0)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.width,
            height: self.height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn in_bounds(&self, pos: GridPos) -> bool {
        pos.x >= 0 && pos.z >= 0 && (pos.x as usize) < self.width && (pos.z as usize) < self.height
    }

    fn index(&self, pos: GridPos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| pos.z as usize * self.width + pos.x as usize)
    }

    /// Cell at a grid position (`None` when out of bounds or removed)
    pub fn cell_at(&self, pos: GridPos) -> Option<&Cell> {
        self.index(pos).and_then(|i| self.cells[i].as_ref())
    }

    pub fn cell_at_mut(&mut self, pos: GridPos) -> Option<&mut Cell> {
        self.index(pos).and_then(|i| self.cells[i].as_mut())
    }

    /// Kind at a grid position; removed cells read as ground
    pub fn kind_at(&self, pos: GridPos) -> Option<BlockKind> {
        self.index(pos)
            .map(|i| self.cells[i].map_or(BlockKind::Ground, |c| c.kind))
    }

    /// Replace a cell with a fresh block of `kind`. Returns false when out of bounds.
    pub fn set_cell(&mut self, pos: GridPos, kind: BlockKind) -> bool {
        let cell = Cell::new(kind, self.brick_health, self.steel_health);
        match self.index(pos) {
            Some(i) => {
                self.cells[i] = Some(cell);
                true
            }
            None => false,
        }
    }

    /// Remove a cell. Returns the removed cell if there was one.
    pub fn clear_cell(&mut self, pos: GridPos) -> Option<Cell> {
        self.index(pos).and_then(|i| self.cells[i].take())
    }

    /// True when tanks cannot enter the cell (out of bounds counts as blocked)
    pub fn blocks_tanks(&self, pos: GridPos) -> bool {
        match self.index(pos) {
            Some(i) => self.cells[i].is_some_and(|c| !c.passable_by_tanks()),
            None => true,
        }
    }

    /// True when bullets stop at the cell (out of bounds counts as blocked)
    pub fn blocks_bullets(&self, pos: GridPos) -> bool {
        match self.index(pos) {
            Some(i) => self.cells[i].is_some_and(|c| !c.passable_by_bullets()),
            None => true,
        }
    }

    /// World-space offset of cell (0, 0)
    pub fn offset(&self) -> Vec2 {
        Vec2::new(
            -(self.width as f32 * CELL_SIZE) / 2.0 + CELL_SIZE / 2.0,
            -(self.height as f32 * CELL_SIZE) / 2.0 + CELL_SIZE / 2.0,
        )
    }

    /// World-space center of a cell
    pub fn grid_to_world(&self, pos: GridPos) -> Vec2 {
        self.offset() + Vec2::new(pos.x as f32, pos.z as f32) * CELL_SIZE
    }

    /// Grid cell containing a world position
    pub fn world_to_grid(&self, world: Vec2) -> GridPos {
        let local = (world - self.offset()) / CELL_SIZE;
        // Cell centers sit on integer coordinates, so round to the nearest one
        GridPos::new(local.x.round() as i32, local.y.round() as i32)
    }

    /// Headquarters location: the first `Hq` cell, or the layout
    /// convention (bottom centre) when the grid has none
    pub fn hq_position(&self) -> GridPos {
        self.positions_of(BlockKind::Hq)
            .next()
            .unwrap_or_else(|| GridPos::new(self.width as i32 / 2, self.height as i32 - 5))
    }

    /// Every position currently holding the given kind
    pub fn positions_of(&self, kind: BlockKind) -> impl Iterator<Item = GridPos> + '_ {
        self.cells.iter().enumerate().filter_map(move |(i, cell)| {
            cell.filter(|c| c.kind == kind).map(|_| {
                GridPos::new((i % self.width) as i32, (i / self.width) as i32)
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout(rows: &[&str]) -> LevelLayout {
        rows.iter()
            .map(|row| {
                row.chars()
                    .map(|c| match c {
                        'B' => BlockKind::Brick,
                        'S' => BlockKind::Steel,
                        'W' => BlockKind::Water,
                        'T' => BlockKind::Trees,
                        'H' => BlockKind::Hq,
                        _ => BlockKind::Ground,
                    })
                    .collect()
            })
            .collect()
    }

    #[test]
    fn test_block_flags() {
        assert!(!BlockKind::Hq.passable_by_tanks());
        assert!(!BlockKind::Steel.passable_by_tanks());
        assert!(!BlockKind::Water.passable_by_tanks());
        assert!(!BlockKind::Trees.passable_by_tanks());
        assert!(BlockKind::Water.passable_by_bullets());
        assert!(BlockKind::Trees.passable_by_bullets());
        assert!(!BlockKind::Hq.passable_by_bullets());
        assert!(!BlockKind::Hq.destructible());
        assert!(BlockKind::Brick.destructible());
    }

    #[test]
    fn test_only_brick_and_steel_carry_health() {
        for kind in [
            BlockKind::Ground,
            BlockKind::Water,
            BlockKind::Trees,
            BlockKind::Hq,
        ] {
            assert_eq!(Cell::new(kind, 25, 100).health, None);
        }
        assert_eq!(Cell::new(BlockKind::Brick, 25, 100).health, Some(25));
        assert_eq!(Cell::new(BlockKind::Steel, 25, 100).health, Some(100));
    }

    #[test]
    fn test_grid_world_roundtrip() {
        let level = Level::from_layout(&layout(&["....", "....", "....", "...."]), 25, 100);
        // 4x4 grid: offset = -2 + 0.5 = -1.5
        assert_eq!(level.offset(), Vec2::new(-1.5, -1.5));
        let pos = GridPos::new(3, 1);
        let world = level.grid_to_world(pos);
        assert_eq!(world, Vec2::new(1.5, -0.5));
        assert_eq!(level.world_to_grid(world), pos);
        assert_eq!(level.world_to_grid(world + Vec2::new(0.4, -0.4)), pos);
    }

    #[test]
    fn test_out_of_bounds_blocks_everything() {
        let level = Level::from_layout(&layout(&["..", ".."]), 25, 100);
        assert!(level.cell_at(GridPos::new(-1, 0)).is_none());
        assert!(level.blocks_tanks(GridPos::new(2, 0)));
        assert!(level.blocks_bullets(GridPos::new(0, -1)));
        assert!(!level.blocks_tanks(GridPos::new(1, 1)));
    }

    #[test]
    fn test_set_and_clear() {
        let mut level = Level::from_layout(&layout(&["S.", ".W"]), 25, 100);
        let steel = GridPos::new(0, 0);
        assert!(level.blocks_tanks(steel));
        let removed = level.clear_cell(steel).unwrap();
        assert_eq!(removed.kind, BlockKind::Steel);
        assert!(level.cell_at(steel).is_none());
        assert!(!level.blocks_tanks(steel));
        assert_eq!(level.kind_at(steel), Some(BlockKind::Ground));

        assert!(level.set_cell(steel, BlockKind::Brick));
        assert_eq!(level.cell_at(steel).unwrap().health, Some(25));
        assert!(!level.set_cell(GridPos::new(5, 5), BlockKind::Brick));
    }

    #[test]
    fn test_empty_level() {
        let level = Level::empty();
        assert!(level.is_empty());
        assert_eq!(level.dimensions(), Dimensions { width: 0, height: 0 });
        assert!(level.blocks_tanks(GridPos::new(0, 0)));
    }

    #[test]
    fn test_neighbors_excludes_center() {
        let center = GridPos::new(5, 5);
        let n: Vec<_> = center.neighbors().collect();
        assert_eq!(n.len(), 8);
        assert!(!n.contains(&center));
    }

    #[test]
    fn test_positions_of() {
        let level = Level::from_layout(&layout(&["H..", "..H"]), 25, 100);
        let hqs: Vec<_> = level.positions_of(BlockKind::Hq).collect();
        assert_eq!(hqs, vec![GridPos::new(0, 0), GridPos::new(2, 1)]);
    }

    #[test]
    fn test_hq_position_reads_the_grid() {
        let mut level = Level::from_layout(&layout(&["......"; 8]), 25, 100);
        assert_eq!(level.hq_position(), GridPos::new(3, 3));
        level.set_cell(GridPos::new(1, 2), BlockKind::Hq);
        assert_eq!(level.hq_position(), GridPos::new(1, 2));
    }
}
