//! Cost-function capabilities.
//!
//! Two distinct traits keep state-only and transition evaluation apart:
//!
//! - [`CostFunction`] scores an action against the current snapshot only.
//! - [`TransitionCostFunction`] also receives the snapshot after the action
//!   resolved.
//!
//! Every [`CostFunction`] is usable wherever a [`TransitionCostFunction`] is
//! required (the blanket impl ignores the next-state argument), but not the
//! other way around: a function that genuinely needs transition information
//! implements only [`TransitionCostFunction`], and the state-only entry point
//! simply does not exist for it. The optimizer is written against
//! [`TransitionCostFunction`], so both kinds train the same way.
//!
//! `resolve` takes `&mut self` because concrete implementations carry mutable
//! evaluation state (swarm clusters, visitation counts); one instance must
//! not be shared across concurrent evaluations without external
//! synchronization.

use std::collections::BTreeMap;

use hexmind_engine::{CandidateAction, UnitId, UnitSnapshot};

use crate::params::ParameterVector;

/// Current battlefield snapshot: every tracked unit keyed by id.
pub type UnitStates = BTreeMap<UnitId, UnitSnapshot>;

/// Scores a candidate action against the current snapshot.
pub trait CostFunction {
    /// Length of the parameter vector this function expects.
    fn parameter_count(&self) -> usize;

    /// Scalar cost of `action` given `states` and `params`; lower is better.
    fn resolve(
        &mut self,
        action: &CandidateAction,
        states: &UnitStates,
        params: &ParameterVector,
    ) -> f64;
}

/// Scores a candidate action given both the current and the next snapshot.
pub trait TransitionCostFunction {
    fn parameter_count(&self) -> usize;

    fn resolve_transition(
        &mut self,
        action: &CandidateAction,
        states: &UnitStates,
        next_states: &UnitStates,
        params: &ParameterVector,
    ) -> f64;
}

impl<T: CostFunction + ?Sized> TransitionCostFunction for T {
    fn parameter_count(&self) -> usize {
        CostFunction::parameter_count(self)
    }

    fn resolve_transition(
        &mut self,
        action: &CandidateAction,
        states: &UnitStates,
        _next_states: &UnitStates,
        params: &ParameterVector,
    ) -> f64 {
        self.resolve(action, states, params)
    }
}

#[cfg(test)]
mod tests {
    use hexmind_engine::{Facing, HexCoord};

    use super::*;

    #[derive(Debug)]
    struct ConstantCost(f64);

    impl CostFunction for ConstantCost {
        fn parameter_count(&self) -> usize {
            3
        }

        fn resolve(
            &mut self,
            _action: &CandidateAction,
            _states: &UnitStates,
            _params: &ParameterVector,
        ) -> f64 {
            self.0
        }
    }

    #[test]
    fn test_state_only_function_works_as_transition_function() {
        let mut cost = ConstantCost(0.25);
        let action = CandidateAction::stay(1, HexCoord::new(0, 0), Facing::North);
        let states = UnitStates::new();
        let params = ParameterVector::zeros(3);
        let value = cost.resolve_transition(&action, &states, &states, &params);
        assert!((value - 0.25).abs() < 1e-12);
        assert_eq!(TransitionCostFunction::parameter_count(&cost), 3);
    }
}
