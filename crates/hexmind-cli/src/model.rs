use std::{collections::BTreeMap, iter};

use chrono::{DateTime, Utc};
use hexmind_training::TrainingOutcome;
use serde::{Deserialize, Serialize};

/// Trained weight set exported by the `train` command.
///
/// Weights are stored both by slot name (for humans and tooling) and as the
/// raw checkpoint (for resuming a run).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainedModel {
    pub name: String,
    pub trained_at: DateTime<Utc>,
    pub final_loss: f64,
    pub iterations: u64,
    pub converged: bool,
    pub weights: BTreeMap<String, f64>,
    pub checkpoint: hexmind_training::Checkpoint,
}

impl TrainedModel {
    /// Packages a finished run for export.
    ///
    /// # Panics
    ///
    /// Panics if `slot_names` does not match the trained parameter count.
    #[must_use]
    pub fn from_outcome(name: &str, slot_names: &[String], outcome: &TrainingOutcome) -> Self {
        let params = outcome.best.restore();
        assert_eq!(slot_names.len(), params.len());
        Self {
            name: name.to_owned(),
            trained_at: Utc::now(),
            final_loss: outcome.best_loss,
            iterations: outcome.iterations_run,
            converged: outcome.converged,
            weights: iter::zip(slot_names, params.as_slice())
                .map(|(name, weight)| (name.clone(), *weight))
                .collect(),
            checkpoint: outcome.best.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use hexmind_evaluator::ParameterVector;
    use hexmind_training::Checkpoint;

    use super::*;

    #[test]
    fn test_weights_are_keyed_by_slot_name() {
        let params = ParameterVector::from(vec![0.25, 0.75]);
        let outcome = TrainingOutcome {
            final_params: params.clone(),
            best: Checkpoint::capture(&params),
            best_loss: 0.05,
            best_iteration: 10,
            iterations_run: 10,
            converged: true,
            cancelled: false,
        };
        let names = vec!["aggression".to_owned(), "bravery".to_owned()];
        let model = TrainedModel::from_outcome("utility", &names, &outcome);
        assert_eq!(model.weights["aggression"], 0.25);
        assert_eq!(model.weights["bravery"], 0.75);
        assert!(model.converged);

        let json = serde_json::to_string(&model).unwrap();
        let back: TrainedModel = serde_json::from_str(&json).unwrap();
        assert_eq!(back.weights, model.weights);
        assert_eq!(back.checkpoint, model.checkpoint);
    }
}
