//! Cost functions for scoring candidate unit moves.
//!
//! This crate implements a three-layer evaluation architecture:
//!
//! 1. **Parameter layer** ([`params`]) - the value-semantic weight vector and
//!    the name-to-slot layout shared between cost functions and the trainer.
//!
//! 2. **Capability layer** ([`cost_function`]) - the [`CostFunction`] and
//!    [`TransitionCostFunction`] traits. State-only functions score an action
//!    against the current battlefield snapshot; transition functions also see
//!    the snapshot after the action resolved. The two are distinct traits so
//!    a transition-only function cannot be invoked through the state-only
//!    path by mistake.
//!
//! 3. **Tactical layer** ([`tactical`], [`swarm`]) - the concrete multi-term
//!    utility function: seventeen bounded tactical signals aggregated by a
//!    floored geometric mean and biased by a per-action behavior state.
//!
//! ```text
//! Optimizer (hexmind-training)
//!     | perturbs / evaluates
//! TransitionCostFunction
//!     | implemented by
//! TacticalCostFunction (17 terms + behavior bonus)
//!     | reads
//! TerrainIndex + SwarmContext + UnitSnapshots (hexmind-engine)
//! ```
//!
//! Scores are deterministic: the same action, snapshots and parameters always
//! produce the same value. A cost-function instance owns its mutable swarm
//! and visitation state, so one instance must not be shared across concurrent
//! evaluations.

pub use self::{
    cost_function::{CostFunction, TransitionCostFunction},
    params::{ParameterVector, WeightLayout, WeightTag},
    swarm::{SwarmCluster, SwarmContext},
    tactical::{BehaviorState, TacticalCostFunction, TransitionTacticalCostFunction},
};

pub mod cost_function;
pub mod params;
pub mod swarm;
pub mod tactical;
