//! Parameter snapshots for warm starts.

use hexmind_evaluator::ParameterVector;
use serde::{Deserialize, Serialize};

/// An immutable deep copy of a parameter vector.
///
/// A checkpoint carries nothing but the vector itself; loss values and
/// iteration counts belong to the run that produced it. It serializes as a
/// flat, order-significant array of doubles with no header, so the parameter
/// count and slot ordering must be pinned externally (the exported model
/// stores the slot names alongside).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Checkpoint {
    params: ParameterVector,
}

impl Checkpoint {
    /// Snapshots `params`.
    #[must_use]
    pub fn capture(params: &ParameterVector) -> Self {
        Self {
            params: params.clone(),
        }
    }

    /// A copy of the stored parameters, ready to resume from.
    #[must_use]
    pub fn restore(&self) -> ParameterVector {
        self.params.clone()
    }
}
