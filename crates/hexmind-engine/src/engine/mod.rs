pub use self::{
    action::CandidateAction,
    board::{Board, BoardEdge, CellTerrain, GridBoard},
    terrain_index::TerrainIndex,
    unit::{UnitId, UnitRole, UnitSnapshot},
};

pub mod action;
pub mod board;
pub mod terrain_index;
pub mod unit;
