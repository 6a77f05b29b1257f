//! Zeroth-order gradient descent over cost-function weights.
//!
//! The optimizer never looks inside the cost function: partial derivatives
//! are estimated by perturbing one parameter at a time and measuring the
//! change in mini-batch loss. On top of the raw estimates it applies:
//!
//! - **Gradient rescaling** - the estimated gradient is rescaled so its
//!   largest component equals the clip norm, which bounds the step size and
//!   also keeps tiny late-stage gradients moving.
//! - **Momentum** - a velocity term smooths successive noisy estimates.
//! - **Cyclical learning rate** - a cosine schedule oscillates between the
//!   base and maximum rates each cycle, letting the run alternate between
//!   exploration and refinement.
//! - **Exploration noise** - periodic Gaussian noise kicks the parameters
//!   out of shallow local minima.
//! - **Patience restarts** - when no new best loss appears for more than a
//!   full patience window, restart noise is injected into the parameters and
//!   the learning-rate scale is persistently halved.
//!
//! Parameters live in `[0, 1]` throughout; every update is clamped back into
//! the box. Loss is the mean squared cost of a sampled batch plus L2
//! regularization, so the finite differences see the regularizer too.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use hexmind_evaluator::{ParameterVector, TransitionCostFunction};
use rand::Rng;

use crate::{checkpoint::Checkpoint, dataset::{TrainingSample, TrainingSet}};

/// Tuning knobs for one training run.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Hard iteration budget.
    pub max_iterations: u64,
    /// Stop early once the best loss falls below this. Zero disables early
    /// termination.
    pub tolerance: f64,
    /// Floor of the cyclical learning-rate schedule.
    pub base_learning_rate: f64,
    /// Ceiling of the cyclical learning-rate schedule.
    pub max_learning_rate: f64,
    /// Iterations per learning-rate cycle.
    pub cycle_length: u64,
    /// Consecutive iterations without a new best loss tolerated before a
    /// restart fires.
    pub patience: u64,
    /// Velocity retention factor.
    pub momentum: f64,
    /// Sigma of the periodic exploration noise.
    pub exploration_sigma: f64,
    /// Iterations between exploration-noise injections.
    pub exploration_interval: u64,
    /// Sigma of the noise injected into the parameters on restart.
    pub restart_sigma: f64,
    /// L2 regularization strength.
    pub regularization: f64,
    /// Target magnitude for the largest gradient component.
    pub gradient_clip: f64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100_000,
            tolerance: 1e-6,
            base_learning_rate: 1e-3,
            max_learning_rate: 1e-1,
            cycle_length: 2000,
            patience: 50,
            momentum: 0.9,
            exploration_sigma: 0.01,
            exploration_interval: 100,
            restart_sigma: 0.05,
            regularization: 1e-4,
            gradient_clip: 1.0,
        }
    }
}

impl OptimizerConfig {
    /// Learning rate at `iteration` under the cosine cyclical schedule:
    /// starts each cycle at the maximum rate, dips to the base rate at the
    /// half-cycle, and climbs back.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn learning_rate_at(&self, iteration: u64) -> f64 {
        let phase = (iteration % self.cycle_length) as f64 / self.cycle_length as f64;
        let span = self.max_learning_rate - self.base_learning_rate;
        self.base_learning_rate + 0.5 * span * (1.0 + (std::f64::consts::TAU * phase).cos())
    }
}

/// Snapshot of run state handed to the progress observer each iteration.
#[derive(Debug)]
pub struct ProgressReport<'a> {
    pub iteration: u64,
    /// Batch loss after this iteration's update.
    pub loss: f64,
    /// Best batch loss seen so far in the run.
    pub best_loss: f64,
    /// Effective learning rate used this iteration (schedule times restart
    /// scale).
    pub learning_rate: f64,
    pub params: &'a ParameterVector,
}

/// Final state of a training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Parameters as of the last completed iteration.
    pub final_params: ParameterVector,
    /// Snapshot of the best parameters seen during the run.
    pub best: Checkpoint,
    /// Batch loss the best parameters achieved.
    pub best_loss: f64,
    /// Iteration at which the best loss was recorded; 0 means the initial
    /// parameters were never beaten.
    pub best_iteration: u64,
    pub iterations_run: u64,
    /// Whether the tolerance criterion stopped the run.
    pub converged: bool,
    /// Whether the run was cancelled from outside.
    pub cancelled: bool,
}

/// Finite-difference gradient descent with momentum, restarts and a
/// cooperative cancellation flag.
#[derive(Debug)]
pub struct Optimizer {
    config: OptimizerConfig,
    cancel: Arc<AtomicBool>,
}

impl Optimizer {
    #[must_use]
    pub fn new(config: OptimizerConfig) -> Self {
        Self {
            config,
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    #[must_use]
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Flag that stops the run at the next iteration boundary when set.
    #[must_use]
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Runs gradient descent from `initial` until convergence, budget
    /// exhaustion or cancellation.
    ///
    /// `observer` is called once per completed iteration.
    ///
    /// # Panics
    ///
    /// Panics if the dataset is empty or `initial` does not match the cost
    /// function's parameter count.
    pub fn optimize<C, D, R, F>(
        &self,
        cost: &mut C,
        dataset: &D,
        initial: ParameterVector,
        rng: &mut R,
        mut observer: F,
    ) -> TrainingOutcome
    where
        C: TransitionCostFunction + ?Sized,
        D: TrainingSet + ?Sized,
        R: Rng,
        F: FnMut(&ProgressReport<'_>),
    {
        assert!(!dataset.is_empty(), "cannot train on an empty dataset");
        assert_eq!(
            initial.len(),
            cost.parameter_count(),
            "initial parameters do not match the cost function"
        );

        let config = &self.config;
        let gradient_batch = (dataset.len() / 5).max(1);
        let loss_batch = (dataset.len() / 2).max(1);

        let mut params = initial.clamp(0.0, 1.0);
        let mut velocity = ParameterVector::zeros(params.len());
        let mut lr_scale = 1.0_f64;
        let mut stale = 0_u64;

        let initial_loss = {
            let batch = dataset.sample(loss_batch, rng);
            batch_loss(cost, &batch, &params, config.regularization)
        };
        let mut best = Checkpoint::capture(&params);
        let mut best_loss = initial_loss;
        let mut best_iteration = 0_u64;

        let mut iterations_run = config.max_iterations;
        let mut converged = false;
        let mut cancelled = false;

        for iteration in 0..config.max_iterations {
            if self.cancel.load(Ordering::Relaxed) {
                iterations_run = iteration;
                cancelled = true;
                break;
            }

            if config.exploration_interval > 0
                && iteration > 0
                && iteration.is_multiple_of(config.exploration_interval)
            {
                params = params
                    .with_gaussian_noise(config.exploration_sigma, rng)
                    .clamp(0.0, 1.0);
            }

            let learning_rate = config.learning_rate_at(iteration) * lr_scale;
            let gradient = self.estimate_gradient(cost, dataset, &params, gradient_batch, rng);
            velocity = velocity
                .scale(config.momentum)
                .add(&gradient.scale(learning_rate));
            params = params.subtract(&velocity).clamp(0.0, 1.0);

            let loss = {
                let batch = dataset.sample(loss_batch, rng);
                batch_loss(cost, &batch, &params, config.regularization)
            };

            if loss < best_loss {
                best = Checkpoint::capture(&params);
                best_loss = loss;
                best_iteration = iteration + 1;
                stale = 0;
            } else {
                stale += 1;
            }

            if stale > config.patience {
                lr_scale *= 0.5;
                params = params
                    .with_gaussian_noise(config.restart_sigma, rng)
                    .clamp(0.0, 1.0);
                stale = 0;
            }

            observer(&ProgressReport {
                iteration,
                loss,
                best_loss,
                learning_rate,
                params: &params,
            });

            if best_loss < config.tolerance {
                iterations_run = iteration + 1;
                converged = true;
                break;
            }
        }

        TrainingOutcome {
            final_params: params,
            best,
            best_loss,
            best_iteration,
            iterations_run,
            converged,
            cancelled,
        }
    }

    /// Forward-difference gradient estimate.
    ///
    /// The baseline and every perturbed evaluation each draw their own fresh
    /// mini-batch. The result is rescaled so its largest component equals
    /// the clip norm; an all-zero gradient is returned as-is.
    fn estimate_gradient<C, D, R>(
        &self,
        cost: &mut C,
        dataset: &D,
        params: &ParameterVector,
        batch_size: usize,
        rng: &mut R,
    ) -> ParameterVector
    where
        C: TransitionCostFunction + ?Sized,
        D: TrainingSet + ?Sized,
        R: Rng,
    {
        let regularization = self.config.regularization;
        let base = {
            let batch = dataset.sample(batch_size, rng);
            batch_loss(cost, &batch, params, regularization)
        };

        let mut components = Vec::with_capacity(params.len());
        for index in 0..params.len() {
            let eps = (params.get(index).abs() * 1e-5).max(1e-8);
            let perturbed = params.perturb_at(index, eps);
            let batch = dataset.sample(batch_size, rng);
            let shifted = batch_loss(cost, &batch, &perturbed, regularization);
            components.push((shifted - base) / eps);
        }

        let gradient = ParameterVector::from(components);
        let max_abs = gradient.max_abs_component();
        if max_abs > 0.0 {
            gradient.scale(self.config.gradient_clip / max_abs)
        } else {
            gradient
        }
    }
}

/// Mean squared cost over `batch` plus L2 regularization.
#[expect(clippy::cast_precision_loss)]
fn batch_loss<C>(
    cost: &mut C,
    batch: &[&TrainingSample],
    params: &ParameterVector,
    regularization: f64,
) -> f64
where
    C: TransitionCostFunction + ?Sized,
{
    assert!(!batch.is_empty());
    let sum: f64 = batch
        .iter()
        .map(|sample| {
            cost.resolve_transition(&sample.action, &sample.states, &sample.next_states, params)
                .powi(2)
        })
        .sum();
    sum / batch.len() as f64 + regularization * params.squared_norm()
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use hexmind_engine::{CandidateAction, Facing, HexCoord};
    use hexmind_evaluator::{CostFunction, cost_function::UnitStates};
    use rand::{RngCore, SeedableRng};
    use rand_pcg::Pcg64Mcg;

    use super::*;
    use crate::dataset::InMemoryTrainingSet;

    /// Cost that depends only on the first parameter; minimized at `target`.
    #[derive(Debug)]
    struct Quadratic {
        target: f64,
    }

    impl CostFunction for Quadratic {
        fn parameter_count(&self) -> usize {
            1
        }

        fn resolve(
            &mut self,
            _action: &CandidateAction,
            _states: &UnitStates,
            params: &ParameterVector,
        ) -> f64 {
            params.get(0) - self.target
        }
    }

    /// Constant loss regardless of the parameters.
    #[derive(Debug)]
    struct Flat {
        count: usize,
    }

    impl CostFunction for Flat {
        fn parameter_count(&self) -> usize {
            self.count
        }

        fn resolve(
            &mut self,
            _action: &CandidateAction,
            _states: &UnitStates,
            _params: &ParameterVector,
        ) -> f64 {
            0.5
        }
    }

    /// Counts how often the optimizer consults the sampler.
    struct CountingSet {
        inner: InMemoryTrainingSet,
        draws: Cell<u32>,
    }

    impl TrainingSet for CountingSet {
        fn len(&self) -> usize {
            self.inner.len()
        }

        fn sample(&self, count: usize, rng: &mut dyn RngCore) -> Vec<&TrainingSample> {
            self.draws.set(self.draws.get() + 1);
            self.inner.sample(count, rng)
        }
    }

    fn dummy_set(count: u32) -> InMemoryTrainingSet {
        InMemoryTrainingSet::new(
            (0..count)
                .map(|id| TrainingSample {
                    action: CandidateAction::stay(id, HexCoord::new(0, 0), Facing::North),
                    states: UnitStates::new(),
                    next_states: UnitStates::new(),
                })
                .collect(),
        )
    }

    fn short_config(max_iterations: u64, tolerance: f64) -> OptimizerConfig {
        OptimizerConfig {
            max_iterations,
            tolerance,
            cycle_length: 40,
            patience: 10,
            ..OptimizerConfig::default()
        }
    }

    #[test]
    fn test_learning_rate_schedule_endpoints() {
        let config = OptimizerConfig::default();
        let max = config.learning_rate_at(0);
        assert!((max - config.max_learning_rate).abs() < 1e-12);
        let min = config.learning_rate_at(config.cycle_length / 2);
        assert!((min - config.base_learning_rate).abs() < 1e-12);
        // The schedule repeats each cycle.
        let next_cycle = config.learning_rate_at(config.cycle_length);
        assert!((next_cycle - max).abs() < 1e-12);
    }

    #[test]
    fn test_best_loss_never_increases() {
        let optimizer = Optimizer::new(short_config(200, 0.0));
        let mut cost = Quadratic { target: 0.3 };
        let set = dummy_set(20);
        let mut rng = Pcg64Mcg::seed_from_u64(17);
        let mut best_losses = Vec::new();
        let outcome = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.9]),
            &mut rng,
            |report| best_losses.push(report.best_loss),
        );
        assert!(
            best_losses.windows(2).all(|w| w[1] <= w[0]),
            "best loss increased during the run"
        );
        assert_eq!(outcome.best_loss, *best_losses.last().unwrap());
    }

    #[test]
    fn test_descent_improves_on_initial_loss() {
        let optimizer = Optimizer::new(short_config(200, 0.0));
        let mut cost = Quadratic { target: 0.3 };
        let set = dummy_set(20);
        let mut rng = Pcg64Mcg::seed_from_u64(5);
        let outcome = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.9]),
            &mut rng,
            |_| {},
        );
        // Initial loss is (0.9 - 0.3)^2 plus a tiny regularization term.
        assert!(outcome.best_loss < 0.36);
        assert!(!outcome.cancelled);
    }

    #[test]
    fn test_zero_tolerance_exhausts_iteration_budget() {
        let optimizer = Optimizer::new(short_config(50, 0.0));
        let mut cost = Quadratic { target: 0.5 };
        let set = dummy_set(10);
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let outcome = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.1]),
            &mut rng,
            |_| {},
        );
        assert_eq!(outcome.iterations_run, 50);
        assert!(!outcome.converged);
    }

    #[test]
    fn test_infinite_tolerance_stops_at_first_recorded_loss() {
        let optimizer = Optimizer::new(short_config(1000, f64::INFINITY));
        let mut cost = Quadratic { target: 0.5 };
        let set = dummy_set(10);
        let mut rng = Pcg64Mcg::seed_from_u64(9);
        let outcome = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.1]),
            &mut rng,
            |_| {},
        );
        assert!(outcome.converged);
        assert!(outcome.iterations_run <= 2);
    }

    #[test]
    fn test_every_loss_evaluation_draws_a_fresh_batch() {
        let optimizer = Optimizer::new(short_config(1, 0.0));
        let mut cost = Flat { count: 3 };
        let set = CountingSet {
            inner: dummy_set(10),
            draws: Cell::new(0),
        };
        let mut rng = Pcg64Mcg::seed_from_u64(3);
        let _ = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.5; 3]),
            &mut rng,
            |_| {},
        );
        // Initial loss, gradient baseline, one draw per parameter, and the
        // post-update loss.
        assert_eq!(set.draws.get(), 6);
    }

    #[test]
    fn test_restart_keeps_the_drifted_parameters() {
        let config = OptimizerConfig {
            max_iterations: 12,
            tolerance: 0.0,
            patience: 3,
            exploration_interval: 1,
            exploration_sigma: 0.3,
            restart_sigma: 0.0,
            regularization: 0.0,
            ..OptimizerConfig::default()
        };
        let optimizer = Optimizer::new(config);
        let mut cost = Flat { count: 1 };
        let set = dummy_set(10);
        let mut rng = Pcg64Mcg::seed_from_u64(11);
        let mut trace = Vec::new();
        let _ = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.5]),
            &mut rng,
            |report| trace.push(report.params.get(0)),
        );
        // Exploration noise walks the parameter away from the initial best;
        // a zero-sigma restart keeps the walked value instead of snapping
        // back to the best checkpoint.
        assert_eq!(trace.len(), 12);
        assert!(trace[1..].iter().all(|p| (p - 0.5).abs() > 0.0));
    }

    #[test]
    fn test_restart_fires_once_patience_is_exceeded() {
        let config = OptimizerConfig {
            max_iterations: 6,
            tolerance: 0.0,
            patience: 2,
            exploration_interval: 0,
            restart_sigma: 0.0,
            regularization: 0.0,
            ..OptimizerConfig::default()
        };
        let optimizer = Optimizer::new(config);
        let mut cost = Flat { count: 1 };
        let set = dummy_set(10);
        let mut rng = Pcg64Mcg::seed_from_u64(4);
        let mut rates = Vec::new();
        let _ = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.5]),
            &mut rng,
            |report| rates.push((report.iteration, report.learning_rate)),
        );
        let config = optimizer.config();
        let scales: Vec<f64> = rates
            .iter()
            .map(|(iteration, rate)| rate / config.learning_rate_at(*iteration))
            .collect();
        // The third consecutive non-improving iteration is the first past
        // the patience of 2, so the halved scale first shows at iteration 3.
        assert_eq!(scales.len(), 6);
        assert!(scales[..3].iter().all(|s| (s - 1.0).abs() < 1e-12));
        assert!(scales[3..].iter().all(|s| (s - 0.5).abs() < 1e-12));
    }

    #[test]
    fn test_cancellation_stops_before_first_iteration() {
        let optimizer = Optimizer::new(short_config(1000, 0.0));
        optimizer.cancel_handle().store(true, Ordering::Relaxed);
        let mut cost = Quadratic { target: 0.5 };
        let set = dummy_set(10);
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let outcome = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.2]),
            &mut rng,
            |_| {},
        );
        assert!(outcome.cancelled);
        assert_eq!(outcome.iterations_run, 0);
        assert!(outcome.best_loss.is_finite());
        assert_eq!(outcome.best.restore(), outcome.final_params);
    }

    #[test]
    #[should_panic(expected = "empty dataset")]
    fn test_empty_dataset_is_fatal() {
        let optimizer = Optimizer::new(OptimizerConfig::default());
        let mut cost = Quadratic { target: 0.5 };
        let set = InMemoryTrainingSet::default();
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let _ = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.2]),
            &mut rng,
            |_| {},
        );
    }

    #[test]
    #[should_panic(expected = "do not match")]
    fn test_mismatched_parameter_length_is_fatal() {
        let optimizer = Optimizer::new(OptimizerConfig::default());
        let mut cost = Quadratic { target: 0.5 };
        let set = dummy_set(10);
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let _ = optimizer.optimize(
            &mut cost,
            &set,
            ParameterVector::from(vec![0.2, 0.3]),
            &mut rng,
            |_| {},
        );
    }
}
