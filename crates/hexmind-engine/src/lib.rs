//! Hex-grid battlefield model consumed by the evaluator and trainer.
//!
//! This crate provides the geometry and the read-only snapshot types that the
//! rest of the workspace builds on:
//!
//! - [`core`] - hex coordinate arithmetic (offset and cube representations,
//!   distance, line interpolation, facing directions)
//! - [`engine`] - the board capability, the one-shot [`TerrainIndex`] with
//!   line-of-sight tracing, and the unit/action snapshot types
//!
//! Everything here is value-semantic and immutable after construction. The
//! game engine proper (movement legality, combat resolution, turn sequencing)
//! lives outside this workspace; it supplies [`UnitSnapshot`] and
//! [`CandidateAction`] values and a [`Board`] implementation, which this crate
//! only reads.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("board must have a non-zero width and height, got {width}x{height}")]
pub struct BoardDimensionError {
    pub width: u32,
    pub height: u32,
}
