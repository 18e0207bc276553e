//! Per-side fog of war.
//!
//! The world is divided into square cells. Each combatant side has its own
//! boolean matrix; a cell, once revealed for a side, stays revealed. Neutral
//! entities reveal nothing and querying outside the grid is "not revealed".

use crate::components::Side;
use crate::config::{Footprint, WorldConfig};
use crate::math::{Fixed, Vec2Fixed};

/// Integer cell coordinates. May lie outside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridPos {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl GridPos {
    /// Create a grid position.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned world rectangle, edges inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldRect {
    /// Top-left corner.
    pub min: Vec2Fixed,
    /// Bottom-right corner.
    pub max: Vec2Fixed,
}

impl WorldRect {
    /// Rectangle from two corners.
    #[must_use]
    pub const fn new(min: Vec2Fixed, max: Vec2Fixed) -> Self {
        Self { min, max }
    }

    /// Sprite box of `footprint` anchored bottom-centre at `anchor`.
    #[must_use]
    pub fn from_footprint(anchor: Vec2Fixed, footprint: Footprint) -> Self {
        let half_width = Fixed::from_num(footprint.width) / Fixed::from_num(2);
        let height = Fixed::from_num(footprint.height);
        Self {
            min: Vec2Fixed::new(anchor.x - half_width, anchor.y - height),
            max: Vec2Fixed::new(anchor.x + half_width, anchor.y),
        }
    }
}

/// Revealed cells for both combatant sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VisibilityGrid {
    cell_size: u32,
    columns: u32,
    rows: u32,
    player: Vec<bool>,
    ai: Vec<bool>,
}

impl VisibilityGrid {
    /// Fully hidden grid covering the configured world.
    #[must_use]
    pub fn new(world: &WorldConfig) -> Self {
        let cell_size = world.fog_cell_size.max(1);
        let columns = world.width.div_ceil(cell_size).max(1);
        let rows = world.height.div_ceil(cell_size).max(1);
        let cells = (columns * rows) as usize;
        Self {
            cell_size,
            columns,
            rows,
            player: vec![false; cells],
            ai: vec![false; cells],
        }
    }

    /// Grid width in cells.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Grid height in cells.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Edge length of a cell in world units.
    #[must_use]
    pub const fn cell_size(&self) -> u32 {
        self.cell_size
    }

    fn cells(&self, side: Side) -> Option<&Vec<bool>> {
        match side {
            Side::Player => Some(&self.player),
            Side::Ai => Some(&self.ai),
            Side::Neutral => None,
        }
    }

    fn cells_mut(&mut self, side: Side) -> Option<&mut Vec<bool>> {
        match side {
            Side::Player => Some(&mut self.player),
            Side::Ai => Some(&mut self.ai),
            Side::Neutral => None,
        }
    }

    fn index(&self, cell: GridPos) -> Option<usize> {
        let in_bounds = cell.x >= 0
            && cell.y >= 0
            && (cell.x as u32) < self.columns
            && (cell.y as u32) < self.rows;
        in_bounds.then(|| (cell.y as u32 * self.columns + cell.x as u32) as usize)
    }

    /// Cell containing a world position (floor division).
    #[must_use]
    pub fn world_to_cell(&self, pos: Vec2Fixed) -> GridPos {
        let size = Fixed::from_num(self.cell_size);
        GridPos::new(
            (pos.x / size).floor().to_num::<i32>(),
            (pos.y / size).floor().to_num::<i32>(),
        )
    }

    /// World-space centre of a cell.
    #[must_use]
    pub fn cell_center(&self, cell: GridPos) -> Vec2Fixed {
        let size = Fixed::from_num(self.cell_size);
        let half = size / Fixed::from_num(2);
        Vec2Fixed::new(
            Fixed::from_num(cell.x) * size + half,
            Fixed::from_num(cell.y) * size + half,
        )
    }

    /// Mark every cell intersecting `rect` as revealed for `side`.
    ///
    /// Cells outside the grid are clipped; neutral reveals nothing.
    pub fn reveal(&mut self, side: Side, rect: WorldRect) {
        let first = self.world_to_cell(rect.min);
        let last = self.world_to_cell(rect.max);
        let max_x = self.columns as i32 - 1;
        let max_y = self.rows as i32 - 1;
        let (x0, x1) = (first.x.max(0), last.x.min(max_x));
        let (y0, y1) = (first.y.max(0), last.y.min(max_y));
        if x0 > x1 || y0 > y1 {
            return;
        }

        let columns = self.columns as usize;
        let Some(cells) = self.cells_mut(side) else {
            return;
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                cells[y as usize * columns + x as usize] = true;
            }
        }
    }

    /// Whether `cell` is revealed for `side`. Out of bounds is `false`.
    #[must_use]
    pub fn is_revealed(&self, side: Side, cell: GridPos) -> bool {
        match (self.cells(side), self.index(cell)) {
            (Some(cells), Some(index)) => cells[index],
            _ => false,
        }
    }

    /// Whether the cell under a world position is revealed for `side`.
    #[must_use]
    pub fn is_point_revealed(&self, side: Side, pos: Vec2Fixed) -> bool {
        self.is_revealed(side, self.world_to_cell(pos))
    }

    /// True iff every cell is revealed for `side`.
    #[must_use]
    pub fn all_revealed(&self, side: Side) -> bool {
        self.cells(side).is_some_and(|cells| cells.iter().all(|&c| c))
    }

    /// Number of revealed cells for `side`.
    #[must_use]
    pub fn revealed_count(&self, side: Side) -> usize {
        self.cells(side)
            .map_or(0, |cells| cells.iter().filter(|&&c| c).count())
    }

    /// Revealed share of the map in percent.
    #[must_use]
    pub fn coverage_percent(&self, side: Side) -> u32 {
        let total = (self.columns * self.rows) as usize;
        (self.revealed_count(side) * 100 / total.max(1)) as u32
    }

    /// Hidden cell whose centre is closest to `from`.
    ///
    /// Cells are scanned row by row; on equal distance the first one found
    /// wins. `None` when everything is revealed.
    #[must_use]
    pub fn nearest_hidden(&self, side: Side, from: Vec2Fixed) -> Option<GridPos> {
        let cells = self.cells(side)?;
        let mut best: Option<(GridPos, Fixed)> = None;

        for y in 0..self.rows as i32 {
            for x in 0..self.columns as i32 {
                let cell = GridPos::new(x, y);
                if cells[(y as u32 * self.columns + x as u32) as usize] {
                    continue;
                }
                let dist = self.cell_center(cell).distance_squared(from);
                if best.map_or(true, |(_, d)| dist < d) {
                    best = Some((cell, dist));
                }
            }
        }

        best.map(|(cell, _)| cell)
    }
}
