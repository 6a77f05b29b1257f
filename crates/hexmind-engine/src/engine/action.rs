//! Candidate actions under evaluation.
//!
//! A [`CandidateAction`] describes one legal move the game engine is
//! considering for a unit, together with the derived stats the scoring terms
//! need (hexes moved, jump flag, failure probability, health at action time).
//! Actions are produced by the engine's move generator and consumed read-only
//! here.

use serde::{Deserialize, Serialize};

use crate::{
    core::{Facing, HexCoord},
    engine::unit::UnitId,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateAction {
    pub unit_id: UnitId,
    pub from: HexCoord,
    pub to: HexCoord,
    /// Facing after the move completes.
    pub facing: Facing,
    /// Every hex entered along the way, starting hex excluded.
    pub path: Vec<HexCoord>,
    pub hexes_moved: u32,
    pub jumped: bool,
    /// Probability that the piloting/movement roll fails, in `[0, 1]`.
    pub fall_probability: f64,
    /// Armor fraction at the time the action is taken.
    pub armor_fraction: f64,
    /// Internal structure fraction at the time the action is taken.
    pub internal_fraction: f64,
}

impl CandidateAction {
    /// A stationary action: the unit stays put and keeps its facing.
    #[must_use]
    pub fn stay(unit_id: UnitId, position: HexCoord, facing: Facing) -> Self {
        Self {
            unit_id,
            from: position,
            to: position,
            facing,
            path: Vec::new(),
            hexes_moved: 0,
            jumped: false,
            fall_probability: 0.0,
            armor_fraction: 1.0,
            internal_fraction: 1.0,
        }
    }

    /// Probability that the move resolves as planned.
    #[must_use]
    pub fn success_probability(&self) -> f64 {
        (1.0 - self.fall_probability).clamp(0.0, 1.0)
    }

    /// Combined health fraction at action time.
    #[must_use]
    pub fn health_fraction(&self) -> f64 {
        (self.armor_fraction + self.internal_fraction) / 2.0
    }

    /// Target movement modifier earned by this move: distance brackets plus
    /// one for jumping, capped at 6.
    #[must_use]
    pub fn target_movement_modifier(&self) -> u32 {
        let base = match self.hexes_moved {
            0..=2 => 0,
            3..=4 => 1,
            5..=6 => 2,
            7..=9 => 3,
            10..=17 => 4,
            18..=24 => 5,
            _ => 6,
        };
        let jump = u32::from(self.jumped);
        (base + jump).min(6)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_probability_complements_fall() {
        let mut action = CandidateAction::stay(1, HexCoord::new(0, 0), Facing::North);
        action.fall_probability = 0.3;
        assert!((action.success_probability() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_movement_modifier_brackets() {
        let mut action = CandidateAction::stay(1, HexCoord::new(0, 0), Facing::North);
        let table = [(0, 0), (2, 0), (3, 1), (5, 2), (7, 3), (10, 4), (18, 5), (25, 6)];
        for (hexes, expected) in table {
            action.hexes_moved = hexes;
            assert_eq!(
                action.target_movement_modifier(),
                expected,
                "hexes_moved = {hexes}"
            );
        }
        action.hexes_moved = 3;
        action.jumped = true;
        assert_eq!(action.target_movement_modifier(), 2);
    }
}
