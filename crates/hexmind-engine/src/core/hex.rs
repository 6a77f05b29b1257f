//! Hex coordinate arithmetic.
//!
//! Positions are stored as odd-q offset coordinates ([`HexCoord`]): `x` is the
//! column, `y` the row, odd columns shifted half a hex down. All distance and
//! interpolation math goes through the cube representation ([`CubeCoord`]),
//! where the three axes satisfy `q + r + s == 0` and the hex distance is half
//! the L1 norm.
//!
//! Line tracing samples `distance + 1` points along the straight segment
//! between two cube coordinates and rounds each sample to the nearest hex
//! ([`FractionalCube::round`]), resetting whichever component drifted the
//! most so the zero-sum invariant holds.

use serde::{Deserialize, Serialize};

/// A board position in odd-q offset coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HexCoord {
    pub x: i32,
    pub y: i32,
}

impl HexCoord {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Hex distance to `other` (number of steps on the grid).
    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        CubeCoord::from(self).distance(CubeCoord::from(other))
    }

    /// The six neighbouring hexes, in facing order starting north.
    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        let cube = CubeCoord::from(self);
        Facing::ALL.map(|f| HexCoord::from(cube.step(f)))
    }

    /// All hexes on the straight line from `self` to `other`, endpoints
    /// included (`distance + 1` samples).
    #[must_use]
    pub fn line_to(self, other: Self) -> Vec<Self> {
        let a = CubeCoord::from(self);
        let b = CubeCoord::from(other);
        let d = a.distance(b);
        if d == 0 {
            return vec![self];
        }
        (0..=d)
            .map(|i| {
                let t = f64::from(i) / f64::from(d);
                HexCoord::from(a.lerp(b, t).round())
            })
            .collect()
    }

    /// The facing that points most directly from `self` toward `target`.
    ///
    /// Returns [`Facing::North`] when the two coordinates are equal.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn facing_toward(self, target: Self) -> Facing {
        if self == target {
            return Facing::North;
        }
        // Flat-top pixel projection; angle 0 points north, increasing clockwise.
        let dx = 1.5 * f64::from(target.x - self.x);
        let dy = 3.0_f64.sqrt()
            * (f64::from(target.y - self.y) + 0.5 * f64::from((target.x & 1) - (self.x & 1)));
        let angle = dx.atan2(-dy).rem_euclid(std::f64::consts::TAU);
        let sextant = (angle / (std::f64::consts::TAU / 6.0)).round() as usize % 6;
        Facing::ALL[sextant]
    }
}

/// Cube representation of a hex position (`q + r + s == 0`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CubeCoord {
    pub q: i32,
    pub r: i32,
    pub s: i32,
}

impl From<HexCoord> for CubeCoord {
    fn from(hex: HexCoord) -> Self {
        let q = hex.x;
        let r = hex.y - (hex.x - (hex.x & 1)) / 2;
        Self { q, r, s: -q - r }
    }
}

impl From<CubeCoord> for HexCoord {
    fn from(cube: CubeCoord) -> Self {
        let x = cube.q;
        let y = cube.r + (cube.q - (cube.q & 1)) / 2;
        Self { x, y }
    }
}

impl CubeCoord {
    /// Unit offsets for the six facings, in [`Facing::ALL`] order.
    const DIRECTIONS: [(i32, i32, i32); 6] = [
        (0, -1, 1),
        (1, -1, 0),
        (1, 0, -1),
        (0, 1, -1),
        (-1, 1, 0),
        (-1, 0, 1),
    ];

    #[must_use]
    pub fn distance(self, other: Self) -> u32 {
        let dq = (self.q - other.q).unsigned_abs();
        let dr = (self.r - other.r).unsigned_abs();
        let ds = (self.s - other.s).unsigned_abs();
        (dq + dr + ds) / 2
    }

    /// The adjacent cube coordinate one step in direction `facing`.
    #[must_use]
    pub fn step(self, facing: Facing) -> Self {
        let (dq, dr, ds) = Self::DIRECTIONS[facing.ordinal() as usize];
        Self {
            q: self.q + dq,
            r: self.r + dr,
            s: self.s + ds,
        }
    }

    /// Linear interpolation toward `other` at parameter `t` in `[0, 1]`.
    #[must_use]
    pub fn lerp(self, other: Self, t: f64) -> FractionalCube {
        let lerp = |a: i32, b: i32| f64::from(a) + (f64::from(b) - f64::from(a)) * t;
        FractionalCube {
            q: lerp(self.q, other.q),
            r: lerp(self.r, other.r),
            s: lerp(self.s, other.s),
        }
    }
}

/// A fractional cube coordinate produced by interpolation or averaging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractionalCube {
    pub q: f64,
    pub r: f64,
    pub s: f64,
}

impl FractionalCube {
    /// Mean of a non-empty set of cube coordinates.
    ///
    /// # Panics
    ///
    /// Panics if `coords` is empty.
    #[must_use]
    pub fn mean<I>(coords: I) -> Self
    where
        I: IntoIterator<Item = CubeCoord>,
    {
        let mut q = 0.0;
        let mut r = 0.0;
        let mut s = 0.0;
        let mut count = 0_u32;
        for c in coords {
            q += f64::from(c.q);
            r += f64::from(c.r);
            s += f64::from(c.s);
            count += 1;
        }
        assert!(count > 0, "cannot average an empty set of coordinates");
        let n = f64::from(count);
        Self {
            q: q / n,
            r: r / n,
            s: s / n,
        }
    }

    /// Rounds to the nearest valid hex, restoring `q + r + s == 0` by
    /// resetting the component with the largest rounding error.
    #[expect(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn round(self) -> CubeCoord {
        let mut q = self.q.round();
        let mut r = self.r.round();
        let mut s = self.s.round();
        let dq = (q - self.q).abs();
        let dr = (r - self.r).abs();
        let ds = (s - self.s).abs();
        if dq > dr && dq > ds {
            q = -r - s;
        } else if dr > ds {
            r = -q - s;
        } else {
            s = -q - r;
        }
        CubeCoord {
            q: q as i32,
            r: r as i32,
            s: s as i32,
        }
    }
}

/// One of the six hex facings, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    North,
    NorthEast,
    SouthEast,
    South,
    SouthWest,
    NorthWest,
}

impl Facing {
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::NorthEast,
        Self::SouthEast,
        Self::South,
        Self::SouthWest,
        Self::NorthWest,
    ];

    #[must_use]
    pub fn ordinal(self) -> u8 {
        self as u8
    }

    /// Angular separation from `other` in facing steps, always in `0..=3`.
    #[must_use]
    pub fn offset_to(self, other: Self) -> u8 {
        let diff = self.ordinal().abs_diff(other.ordinal());
        diff.min(6 - diff)
    }
}
