//! One-shot terrain extraction and line-of-sight tracing.
//!
//! A [`TerrainIndex`] is built exactly once per board and is immutable
//! afterwards, so it can be shared by reference across any number of
//! evaluations of the same board (including from multiple threads). It holds:
//!
//! - an elevation grid: floor height plus building level where present
//! - four boolean layers: wooded, building, clear, water depth >= 1
//! - a hazard layer, recorded for completeness but not consulted by any
//!   current scoring term
//!
//! Line-of-sight traces the straight hex line between two cells via cube
//! interpolation with nearest-hex rounding at each of `distance + 1` sample
//! points. Sight is blocked when any interior cell rises more than one level
//! above the origin, or when more than one interior cell is wooded.

use crate::{
    core::HexCoord,
    engine::board::{Board, CellTerrain},
};

/// Immutable per-board terrain layers.
#[derive(Debug, Clone)]
pub struct TerrainIndex {
    width: u32,
    height: u32,
    elevation: Vec<i32>,
    wooded: Vec<bool>,
    building: Vec<bool>,
    clear: Vec<bool>,
    water: Vec<bool>,
    hazard: Vec<bool>,
}

impl TerrainIndex {
    /// Extracts all layers from `board` in one pass.
    ///
    /// # Panics
    ///
    /// Panics if the board has zero area; a cost function cannot be
    /// constructed without a real board.
    #[must_use]
    pub fn build(board: &dyn Board) -> Self {
        let (width, height) = (board.width(), board.height());
        assert!(width > 0 && height > 0, "terrain index requires a non-empty board");

        let area = (width * height) as usize;
        let mut index = Self {
            width,
            height,
            elevation: Vec::with_capacity(area),
            wooded: Vec::with_capacity(area),
            building: Vec::with_capacity(area),
            clear: Vec::with_capacity(area),
            water: Vec::with_capacity(area),
            hazard: Vec::with_capacity(area),
        };
        for y in 0..height {
            for x in 0..width {
                #[expect(clippy::cast_possible_wrap)]
                let cell = board
                    .cell(HexCoord::new(x as i32, y as i32))
                    .unwrap_or_default();
                index.push_cell(cell);
            }
        }
        index
    }

    fn push_cell(&mut self, cell: CellTerrain) {
        self.elevation
            .push(cell.floor_elevation + cell.building_level);
        self.wooded.push(cell.wooded);
        self.building.push(cell.building);
        self.clear.push(cell.clear);
        self.water.push(cell.water_depth >= 1);
        self.hazard.push(cell.hazardous);
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[expect(clippy::cast_sign_loss)]
    fn index_of(&self, coord: HexCoord) -> Option<usize> {
        if coord.x < 0
            || coord.y < 0
            || coord.x as u32 >= self.width
            || coord.y as u32 >= self.height
        {
            return None;
        }
        Some((coord.y as u32 * self.width + coord.x as u32) as usize)
    }

    /// Effective elevation (floor plus building); 0 outside the board.
    #[must_use]
    pub fn elevation_at(&self, coord: HexCoord) -> i32 {
        self.index_of(coord).map_or(0, |i| self.elevation[i])
    }

    #[must_use]
    pub fn is_wooded(&self, coord: HexCoord) -> bool {
        self.index_of(coord).is_some_and(|i| self.wooded[i])
    }

    #[must_use]
    pub fn is_building(&self, coord: HexCoord) -> bool {
        self.index_of(coord).is_some_and(|i| self.building[i])
    }

    #[must_use]
    pub fn is_clear(&self, coord: HexCoord) -> bool {
        self.index_of(coord).is_some_and(|i| self.clear[i])
    }

    /// Whether the cell holds water at depth 1 or more.
    #[must_use]
    pub fn is_water(&self, coord: HexCoord) -> bool {
        self.index_of(coord).is_some_and(|i| self.water[i])
    }

    /// Recorded but not consulted by any current scoring term.
    #[must_use]
    pub fn is_hazardous(&self, coord: HexCoord) -> bool {
        self.index_of(coord).is_some_and(|i| self.hazard[i])
    }

    /// Fraction of cells adjacent to `coord` (and `coord` itself) that give
    /// cover (wooded or building).
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn cover_density(&self, coord: HexCoord) -> f64 {
        let cells = std::iter::once(coord).chain(coord.neighbors());
        let covered = cells
            .filter(|c| self.is_wooded(*c) || self.is_building(*c))
            .count();
        covered as f64 / 7.0
    }

    /// Traces the hex line from `origin` to `target`.
    ///
    /// Endpoints never block. Interior cells block when their elevation
    /// exceeds the origin's by more than 1, and two or more wooded interior
    /// cells block together.
    #[must_use]
    pub fn has_line_of_sight(&self, origin: HexCoord, target: HexCoord) -> bool {
        let line = origin.line_to(target);
        if line.len() <= 2 {
            return true;
        }
        let origin_elevation = self.elevation_at(origin);
        let mut wooded_cells = 0_u32;
        for cell in &line[1..line.len() - 1] {
            if self.elevation_at(*cell) > origin_elevation + 1 {
                return false;
            }
            if self.is_wooded(*cell) {
                wooded_cells += 1;
                if wooded_cells > 1 {
                    return false;
                }
            }
        }
        true
    }
}
