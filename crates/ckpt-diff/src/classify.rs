//! Modification classification: refine `Keep` steps by comparing values.
//!
//! The edit script only looks at keys and shapes. This pass looks up both
//! tensors behind every `Keep`, and if the metric reports a nonzero distance
//! the step becomes a `Modify`. `Insert`, `Remove`, and already-classified
//! `Modify` steps pass through untouched, so the pass is idempotent and never
//! changes the length or order of the script.

use ckpt_types::{StateDict, Tensor};

use crate::distance::TensorDistance;
use crate::error::{DiffError, DiffResult, DistanceError, KeyedDistanceError, Side};
use crate::step::DiffStep;

/// Classify every step, aborting on the first distance failure.
pub fn classify<M>(
    steps: Vec<DiffStep>,
    a: &StateDict,
    b: &StateDict,
    metric: &M,
) -> DiffResult<Vec<DiffStep>>
where
    M: TensorDistance + ?Sized,
{
    steps
        .into_iter()
        .map(|step| classify_step(step, a, b, metric).map_err(DiffError::from))
        .collect()
}

/// Classify every step independently.
///
/// Returns one result per input step, in input order. A failure on one key
/// does not affect any other entry; the caller decides whether to abort or
/// report the failed entries alongside the rest.
pub fn classify_each<M>(
    steps: Vec<DiffStep>,
    a: &StateDict,
    b: &StateDict,
    metric: &M,
) -> Vec<Result<DiffStep, KeyedDistanceError>>
where
    M: TensorDistance + ?Sized,
{
    steps
        .into_iter()
        .map(|step| classify_step(step, a, b, metric))
        .collect()
}

fn classify_step<M>(
    step: DiffStep,
    a: &StateDict,
    b: &StateDict,
    metric: &M,
) -> Result<DiffStep, KeyedDistanceError>
where
    M: TensorDistance + ?Sized,
{
    let (key, shape) = match step {
        DiffStep::Keep { key, shape } => (key, shape),
        other => return Ok(other),
    };

    match measure(&key, a, b, metric) {
        Ok(distance) if distance != 0.0 => Ok(DiffStep::Modify {
            key,
            shape,
            distance,
        }),
        Ok(_) => Ok(DiffStep::Keep { key, shape }),
        Err(source) => Err(KeyedDistanceError { key, shape, source }),
    }
}

fn measure<M>(key: &str, a: &StateDict, b: &StateDict, metric: &M) -> Result<f64, DistanceError>
where
    M: TensorDistance + ?Sized,
{
    let left: &Tensor = a.get(key).ok_or(DistanceError::MissingTensor(Side::Source))?;
    let right: &Tensor = b.get(key).ok_or(DistanceError::MissingTensor(Side::Target))?;
    metric.distance(left, right)
}
