//! Parameter vectors and weight layouts.
//!
//! A [`ParameterVector`] is an ordered, fixed-length sequence of `f64`
//! weights with value-semantic arithmetic: every operation returns a new
//! vector and never mutates the receiver. The length is fixed for the
//! lifetime of one optimization run.
//!
//! Indices can be addressed positionally or through a [`WeightTag`], a name
//! bound to a fixed offset when the owning cost function is constructed. Tags
//! are handed out by a [`WeightLayout`] builder; composed cost functions
//! register their slots in one shared layout, so offsets can never collide
//! the way chained ordinal counting could.
//!
//! Looking up an offset past the end of a vector is a programmer error (a
//! layout paired with a vector of the wrong length) and panics; it is not a
//! recoverable condition.

use rand::Rng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

/// A stable name bound to one offset inside a [`ParameterVector`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightTag {
    index: usize,
}

impl WeightTag {
    #[must_use]
    pub fn index(self) -> usize {
        self.index
    }
}

/// Assigns name-to-offset slots at cost-function construction time.
#[derive(Debug, Clone, Default)]
pub struct WeightLayout {
    names: Vec<String>,
}

impl WeightLayout {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name` and returns its tag.
    ///
    /// # Panics
    ///
    /// Panics if `name` is already registered; slots are assigned exactly
    /// once.
    pub fn slot(&mut self, name: impl Into<String>) -> WeightTag {
        let name = name.into();
        assert!(
            !self.names.contains(&name),
            "weight slot {name:?} registered twice"
        );
        let index = self.names.len();
        self.names.push(name);
        WeightTag { index }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[must_use]
    pub fn name(&self, tag: WeightTag) -> &str {
        &self.names[tag.index]
    }

    /// All registered names in offset order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

/// Ordered, fixed-length weight vector with value-semantic arithmetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterVector {
    values: Vec<f64>,
}

impl From<Vec<f64>> for ParameterVector {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

impl ParameterVector {
    #[must_use]
    pub fn zeros(len: usize) -> Self {
        Self {
            values: vec![0.0; len],
        }
    }

    /// A vector of independent samples from `N(mean, spread)`.
    #[must_use]
    pub fn random_gaussian<R>(len: usize, mean: f64, spread: f64, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let normal = Normal::new(mean, spread).unwrap();
        Self {
            values: (0..len).map(|_| rng.sample(normal)).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Component at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn get(&self, index: usize) -> f64 {
        self.values[index]
    }

    /// Component addressed by `tag`.
    ///
    /// # Panics
    ///
    /// Panics if the tag's offset is not inside this vector; a layout was
    /// paired with a vector of the wrong length, which is fatal.
    #[must_use]
    pub fn get_tag(&self, tag: WeightTag) -> f64 {
        assert!(
            tag.index < self.values.len(),
            "weight tag offset {} out of bounds for parameter vector of length {}",
            tag.index,
            self.values.len()
        );
        self.values[tag.index]
    }

    /// Component-wise sum.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    #[must_use]
    pub fn add(&self, other: &Self) -> Self {
        assert_eq!(self.len(), other.len());
        Self {
            values: std::iter::zip(&self.values, &other.values)
                .map(|(a, b)| a + b)
                .collect(),
        }
    }

    /// Component-wise difference.
    ///
    /// # Panics
    ///
    /// Panics if the lengths differ.
    #[must_use]
    pub fn subtract(&self, other: &Self) -> Self {
        assert_eq!(self.len(), other.len());
        Self {
            values: std::iter::zip(&self.values, &other.values)
                .map(|(a, b)| a - b)
                .collect(),
        }
    }

    #[must_use]
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            values: self.values.iter().map(|v| v * factor).collect(),
        }
    }

    /// Every component clamped into `[lo, hi]`.
    #[must_use]
    pub fn clamp(&self, lo: f64, hi: f64) -> Self {
        self.clamp_range(lo, hi, 0, self.len())
    }

    /// Components in `from..to` clamped into `[lo, hi]`; the rest unchanged.
    #[must_use]
    pub fn clamp_range(&self, lo: f64, hi: f64, from: usize, to: usize) -> Self {
        Self {
            values: self
                .values
                .iter()
                .enumerate()
                .map(|(i, v)| {
                    if (from..to).contains(&i) {
                        v.clamp(lo, hi)
                    } else {
                        *v
                    }
                })
                .collect(),
        }
    }

    /// A copy with only the component at `index` shifted by `eps`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn perturb_at(&self, index: usize, eps: f64) -> Self {
        assert!(index < self.values.len());
        let mut values = self.values.clone();
        values[index] += eps;
        Self { values }
    }

    /// A copy with independent `N(0, sigma)` noise added to every component.
    #[must_use]
    pub fn with_gaussian_noise<R>(&self, sigma: f64, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        let normal = Normal::new(0.0, sigma).unwrap();
        Self {
            values: self.values.iter().map(|v| v + rng.sample(normal)).collect(),
        }
    }

    /// Largest absolute component, 0 for an empty vector.
    #[must_use]
    pub fn max_abs_component(&self) -> f64 {
        self.values.iter().fold(0.0, |acc, v| acc.max(v.abs()))
    }

    /// Sum of squared components (L2 regularization term).
    #[must_use]
    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }
}
