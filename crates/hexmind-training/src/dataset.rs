//! Recorded expert actions used as training data.

use hexmind_engine::CandidateAction;
use hexmind_evaluator::cost_function::UnitStates;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// One recorded expert decision: the action taken, the snapshot it was taken
/// in, and the snapshot after it resolved.
///
/// State-only cost functions ignore `next_states`; transition functions use
/// it for realized-outcome signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSample {
    pub action: CandidateAction,
    pub states: UnitStates,
    pub next_states: UnitStates,
}

/// A source of training samples the optimizer can draw mini-batches from.
pub trait TrainingSet {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Draws up to `count` distinct samples uniformly at random.
    ///
    /// Returns fewer than `count` samples only when the set itself is
    /// smaller.
    fn sample(&self, count: usize, rng: &mut dyn RngCore) -> Vec<&TrainingSample>;
}

/// A training set held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTrainingSet {
    samples: Vec<TrainingSample>,
}

impl InMemoryTrainingSet {
    #[must_use]
    pub fn new(samples: Vec<TrainingSample>) -> Self {
        Self { samples }
    }

    pub fn push(&mut self, sample: TrainingSample) {
        self.samples.push(sample);
    }
}

impl TrainingSet for InMemoryTrainingSet {
    fn len(&self) -> usize {
        self.samples.len()
    }

    fn sample(&self, count: usize, rng: &mut dyn RngCore) -> Vec<&TrainingSample> {
        let count = count.min(self.samples.len());
        rand::seq::index::sample(rng, self.samples.len(), count)
            .iter()
            .map(|i| &self.samples[i])
            .collect()
    }
}
