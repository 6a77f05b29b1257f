//! The board capability consumed by the terrain index.
//!
//! The full terrain model belongs to the game engine; this crate only needs a
//! per-cell query good enough to build a [`TerrainIndex`](super::TerrainIndex)
//! once per board. [`GridBoard`] is a concrete implementation used by tests
//! and the trainer CLI.

use serde::{Deserialize, Serialize};

use crate::{BoardDimensionError, core::HexCoord};

/// Terrain attributes of a single hex cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellTerrain {
    /// Base floor height of the hex.
    pub floor_elevation: i32,
    /// Building level on top of the floor, 0 when there is no building.
    pub building_level: i32,
    pub wooded: bool,
    pub building: bool,
    pub clear: bool,
    /// Water depth in levels; 0 means dry ground.
    pub water_depth: i32,
    pub hazardous: bool,
}

impl CellTerrain {
    /// Flat, clear ground at elevation 0.
    #[must_use]
    pub const fn clear_ground() -> Self {
        Self {
            floor_elevation: 0,
            building_level: 0,
            wooded: false,
            building: false,
            clear: true,
            water_depth: 0,
            hazardous: false,
        }
    }
}

/// Read-only access to a board snapshot.
///
/// Implemented by the game engine's board type; [`GridBoard`] is the in-tree
/// implementation.
pub trait Board {
    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Terrain of the cell at `coord`, or `None` outside the board.
    fn cell(&self, coord: HexCoord) -> Option<CellTerrain>;

    #[expect(clippy::cast_sign_loss)]
    fn contains(&self, coord: HexCoord) -> bool {
        coord.x >= 0
            && coord.y >= 0
            && (coord.x as u32) < self.width()
            && (coord.y as u32) < self.height()
    }
}

/// One of the four board edges, used for home/retreat direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardEdge {
    North,
    East,
    South,
    West,
}

impl BoardEdge {
    /// Hex distance from `coord` to this edge on a `width` x `height` board.
    #[expect(clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    #[must_use]
    pub fn distance_from(self, coord: HexCoord, width: u32, height: u32) -> u32 {
        let clamp = |v: i32, max: u32| v.clamp(0, max.saturating_sub(1) as i32);
        let x = clamp(coord.x, width);
        let y = clamp(coord.y, height);
        match self {
            Self::North => y as u32,
            Self::West => x as u32,
            Self::South => height.saturating_sub(1).saturating_sub(y as u32),
            Self::East => width.saturating_sub(1).saturating_sub(x as u32),
        }
    }
}

/// A dense in-memory board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridBoard {
    width: u32,
    height: u32,
    cells: Vec<CellTerrain>,
}

impl GridBoard {
    /// Creates a board filled with clear, flat ground.
    pub fn flat(width: u32, height: u32) -> Result<Self, BoardDimensionError> {
        if width == 0 || height == 0 {
            return Err(BoardDimensionError { width, height });
        }
        Ok(Self {
            width,
            height,
            cells: vec![CellTerrain::clear_ground(); (width * height) as usize],
        })
    }

    /// Replaces the terrain of one cell.
    ///
    /// # Panics
    ///
    /// Panics if `coord` is outside the board.
    pub fn set_cell(&mut self, coord: HexCoord, terrain: CellTerrain) {
        let index = self
            .index_of(coord)
            .unwrap_or_else(|| panic!("cell {coord:?} outside {}x{} board", self.width, self.height));
        self.cells[index] = terrain;
    }

    #[expect(clippy::cast_sign_loss)]
    fn index_of(&self, coord: HexCoord) -> Option<usize> {
        if !self.contains(coord) {
            return None;
        }
        Some((coord.y as u32 * self.width + coord.x as u32) as usize)
    }
}

impl Board for GridBoard {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn cell(&self, coord: HexCoord) -> Option<CellTerrain> {
        self.index_of(coord).map(|i| self.cells[i])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_board_rejects_zero_dimensions() {
        assert!(GridBoard::flat(0, 10).is_err());
        assert!(GridBoard::flat(10, 0).is_err());
    }

    #[test]
    fn test_cell_lookup_inside_and_outside() {
        let board = GridBoard::flat(4, 3).unwrap();
        assert!(board.cell(HexCoord::new(3, 2)).is_some());
        assert!(board.cell(HexCoord::new(4, 0)).is_none());
        assert!(board.cell(HexCoord::new(0, -1)).is_none());
    }

    #[test]
    fn test_set_cell_round_trips() {
        let mut board = GridBoard::flat(4, 4).unwrap();
        let terrain = CellTerrain {
            wooded: true,
            clear: false,
            ..CellTerrain::clear_ground()
        };
        board.set_cell(HexCoord::new(1, 2), terrain);
        assert_eq!(board.cell(HexCoord::new(1, 2)), Some(terrain));
    }

    #[test]
    fn test_edge_distances() {
        let coord = HexCoord::new(2, 1);
        assert_eq!(BoardEdge::North.distance_from(coord, 10, 10), 1);
        assert_eq!(BoardEdge::West.distance_from(coord, 10, 10), 2);
        assert_eq!(BoardEdge::South.distance_from(coord, 10, 10), 8);
        assert_eq!(BoardEdge::East.distance_from(coord, 10, 10), 7);
    }
}
