//! Weight training for the tactical cost functions.
//!
//! This crate fits a parameter vector to a set of recorded expert actions by
//! zeroth-order gradient descent: the cost function is treated as a black
//! box, and partial derivatives are estimated by finite differences.
//!
//! # How Training Works
//!
//! 1. **Sample** - Draw a random mini-batch of recorded actions from the
//!    training set.
//! 2. **Estimate** - Perturb each parameter in turn and measure the change in
//!    batch loss (mean squared cost plus L2 regularization).
//! 3. **Step** - Apply the clipped gradient with momentum, under a cyclical
//!    learning-rate schedule, and clamp parameters back into `[0, 1]`.
//! 4. **Checkpoint** - Keep the best parameters seen so far; when progress
//!    stalls past the patience window, noise is injected into the parameters
//!    and the learning-rate scale is halved.
//! 5. **Repeat** - Until the best loss drops below tolerance, the iteration
//!    budget runs out, or the run is cancelled.
//!
//! ```text
//! TrainingSet (recorded actions)
//!     | mini-batches
//! Optimizer (finite differences + momentum)
//!     | perturbs / evaluates
//! TransitionCostFunction (hexmind-evaluator)
//!     | produces
//! Batch loss
//!     | guides
//! Parameter updates -> best Checkpoint
//! ```
//!
//! # Design Principles
//!
//! Training is completely separate from evaluation: the evaluator defines
//! what a good action scores, this crate only searches the weight space. Any
//! [`TransitionCostFunction`](hexmind_evaluator::TransitionCostFunction) can
//! be trained without changes here.
//!
//! All randomness flows through a caller-supplied [`rand::Rng`], so runs are
//! reproducible from a seed.
//!
//! # Current Limitations
//!
//! - **Finite differences are expensive**: one gradient estimate costs one
//!   batch evaluation per parameter. Acceptable at ~20 parameters, painful
//!   beyond that.
//! - **Single-objective only**: the loss is one scalar; there is no notion
//!   of trading off play styles against each other.
//! - **No adaptive schedule**: cycle length, patience and noise levels are
//!   fixed per run and must be tuned by hand.

pub use self::{
    checkpoint::Checkpoint,
    dataset::{InMemoryTrainingSet, TrainingSample, TrainingSet},
    optimizer::{Optimizer, OptimizerConfig, ProgressReport, TrainingOutcome},
};

pub mod checkpoint;
pub mod dataset;
pub mod optimizer;
