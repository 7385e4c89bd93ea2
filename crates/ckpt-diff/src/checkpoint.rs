//! Checkpoint-level diff: the edit script plus value classification.

use ckpt_types::{Shape, StateDict};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::classify::{classify, classify_each};
use crate::distance::{DistanceMetric, TensorDistance};
use crate::edit_script::edit_script;
use crate::error::DiffResult;
use crate::step::DiffStep;

/// What to do when a distance cannot be computed for a kept parameter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Fail the whole diff with [`DiffError::Distance`](crate::DiffError::Distance).
    #[default]
    Abort,
    /// Keep the entry as a `Keep` and record it in [`CheckpointDiff::failures`].
    Report,
}

/// Options for [`checkpoint_diff_with`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOptions {
    /// Metric used to classify kept parameters.
    pub metric: DistanceMetric,
    /// Handling of per-key distance failures.
    pub on_error: ErrorPolicy,
}

/// A kept parameter whose distance could not be computed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DistanceFailure {
    /// Position of the entry in [`CheckpointDiff::steps`].
    pub index: usize,
    pub key: String,
    pub shape: Shape,
    pub message: String,
}

/// The result of comparing two checkpoints.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CheckpointDiff {
    /// One entry per edit-script step, in edit-script order.
    pub steps: Vec<DiffStep>,
    /// Entries whose distance failed under [`ErrorPolicy::Report`].
    pub failures: Vec<DistanceFailure>,
}

impl CheckpointDiff {
    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Returns `true` if neither checkpoint has any parameters.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Returns `true` if every parameter was kept with identical values.
    pub fn is_identical(&self) -> bool {
        self.failures.is_empty() && self.steps.iter().all(DiffStep::is_keep)
    }

    /// Number of unchanged parameters.
    pub fn unchanged(&self) -> usize {
        self.steps.iter().filter(|s| s.is_keep()).count()
    }

    /// Number of added parameters.
    pub fn additions(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, DiffStep::Insert { .. }))
            .count()
    }

    /// Number of removed parameters.
    pub fn removals(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, DiffStep::Remove { .. }))
            .count()
    }

    /// Number of parameters modified in place.
    pub fn modifications(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| matches!(s, DiffStep::Modify { .. }))
            .count()
    }

    /// Structural edit distance: inserts plus removes.
    pub fn edit_distance(&self) -> usize {
        self.additions() + self.removals()
    }

    /// The failure recorded for the step at `index`, if any.
    pub fn failure_at(&self, index: usize) -> Option<&DistanceFailure> {
        self.failures.iter().find(|f| f.index == index)
    }
}

/// Diff two checkpoints with the default options (RMS distance, abort on
/// distance failures).
///
/// Keys are compared in each dict's insertion order.
pub fn checkpoint_diff(a: &StateDict, b: &StateDict) -> DiffResult<CheckpointDiff> {
    checkpoint_diff_with(a, b, &DiffOptions::default())
}

/// Diff two checkpoints with explicit options.
pub fn checkpoint_diff_with(
    a: &StateDict,
    b: &StateDict,
    options: &DiffOptions,
) -> DiffResult<CheckpointDiff> {
    let script = edit_script(&a.shapes(), &b.shapes())?;
    let metric = options.metric;

    let diff = match options.on_error {
        ErrorPolicy::Abort => CheckpointDiff {
            steps: classify(script, a, b, &metric)?,
            failures: Vec::new(),
        },
        ErrorPolicy::Report => {
            let mut steps = Vec::with_capacity(script.len());
            let mut failures = Vec::new();
            for (index, result) in classify_each(script, a, b, &metric).into_iter().enumerate() {
                match result {
                    Ok(step) => steps.push(step),
                    Err(e) => {
                        warn!(key = %e.key, error = %e.source, "distance failed");
                        failures.push(DistanceFailure {
                            index,
                            key: e.key.clone(),
                            shape: e.shape.clone(),
                            message: e.source.to_string(),
                        });
                        steps.push(DiffStep::Keep {
                            key: e.key,
                            shape: e.shape,
                        });
                    }
                }
            }
            CheckpointDiff { steps, failures }
        }
    };

    debug!(
        metric = metric.name(),
        unchanged = diff.unchanged(),
        added = diff.additions(),
        removed = diff.removals(),
        modified = diff.modifications(),
        failed = diff.failures.len(),
        "checkpoint diff complete"
    );
    Ok(diff)
}
