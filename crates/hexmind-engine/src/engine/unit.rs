//! Read-only unit state snapshots.
//!
//! A [`UnitSnapshot`] is the evaluator's view of one unit at one instant:
//! position, facing, ownership, role, normalized health fractions and a
//! coarse weapon model. Snapshots are supplied by the game engine in a map
//! keyed by [`UnitId`]; this crate never mutates them.

use serde::{Deserialize, Serialize};

use crate::core::{Facing, HexCoord};

pub type UnitId = u32;

/// Battlefield role tag assigned to a unit.
///
/// The ordinal order matters: swarm clustering sorts units by role ordinal so
/// clusters group similar roles together.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum UnitRole {
    Scout,
    Striker,
    Skirmisher,
    Brawler,
    Sniper,
    MissileBoat,
    Juggernaut,
}

impl UnitRole {
    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Roles that prefer staying unobserved (exposure term applies to these).
    #[must_use]
    pub fn is_recon(self) -> bool {
        matches!(self, Self::Scout | Self::Sniper)
    }
}

/// Immutable per-unit state at evaluation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    pub id: UnitId,
    pub position: HexCoord,
    pub facing: Facing,
    pub owner: u32,
    pub role: UnitRole,
    /// Remaining armor as a fraction of the original, in `[0, 1]`.
    pub armor_fraction: f64,
    /// Remaining internal structure as a fraction of the original, in `[0, 1]`.
    pub internal_fraction: f64,
    /// Longest weapon range in hexes.
    pub max_weapon_range: u32,
    /// Total damage potential at point-blank range.
    pub max_damage: f64,
    pub crippled: bool,
    pub jump_capable: bool,
}

impl UnitSnapshot {
    /// Combined health fraction (armor and internals weighted equally).
    #[must_use]
    pub fn health_fraction(&self) -> f64 {
        (self.armor_fraction + self.internal_fraction) / 2.0
    }

    /// Damage potential at `range` hexes, falling off linearly to half at
    /// maximum range and zero beyond it.
    #[must_use]
    pub fn damage_at(&self, range: u32) -> f64 {
        if range > self.max_weapon_range {
            return 0.0;
        }
        if self.max_weapon_range == 0 {
            return self.max_damage;
        }
        let falloff = 0.5 * f64::from(range) / f64::from(self.max_weapon_range);
        self.max_damage * (1.0 - falloff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> UnitSnapshot {
        UnitSnapshot {
            id: 1,
            position: HexCoord::new(0, 0),
            facing: Facing::North,
            owner: 0,
            role: UnitRole::Brawler,
            armor_fraction: 0.8,
            internal_fraction: 0.4,
            max_weapon_range: 10,
            max_damage: 20.0,
            crippled: false,
            jump_capable: false,
        }
    }

    #[test]
    fn test_health_fraction_averages_armor_and_internals() {
        assert!((snapshot().health_fraction() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_damage_falls_off_with_range() {
        let unit = snapshot();
        assert!((unit.damage_at(0) - 20.0).abs() < 1e-12);
        assert!((unit.damage_at(10) - 10.0).abs() < 1e-12);
        assert!((unit.damage_at(5) - 15.0).abs() < 1e-12);
        assert_eq!(unit.damage_at(11), 0.0);
    }

    #[test]
    fn test_role_ordinals_keep_scouts_first() {
        assert_eq!(UnitRole::Scout.ordinal(), 0);
        assert!(UnitRole::Scout.ordinal() < UnitRole::Juggernaut.ordinal());
        assert!(UnitRole::Scout.is_recon());
        assert!(UnitRole::Sniper.is_recon());
        assert!(!UnitRole::Brawler.is_recon());
    }
}
