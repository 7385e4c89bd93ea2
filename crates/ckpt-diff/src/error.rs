//! Error types for the diff crate.

use std::fmt;

use ckpt_types::Shape;
use serde::{Deserialize, Serialize};

/// Which of the two compared checkpoints an error refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// The first checkpoint (`A`, the one being transformed).
    Source,
    /// The second checkpoint (`B`, the target).
    Target,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Source => write!(f, "source"),
            Side::Target => write!(f, "target"),
        }
    }
}

/// Failure to compute a distance between two tensors.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum DistanceError {
    /// The tensors do not have the same shape.
    #[error("shape mismatch: {left} vs {right}")]
    ShapeMismatch { left: Shape, right: Shape },

    /// The computed distance is NaN or infinite.
    #[error("non-finite distance: {0}")]
    NonFinite(f64),

    /// The tensor for a kept key is absent from one of the state dicts.
    #[error("tensor missing from {0} state dict")]
    MissingTensor(Side),
}

/// A [`DistanceError`] attributed to the step it occurred on.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
#[error("{key}: {source}")]
pub struct KeyedDistanceError {
    pub key: String,
    pub shape: Shape,
    pub source: DistanceError,
}

/// Errors that can occur during diff operations.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// A collection repeats a key; edit scripts are only defined over unique keys.
    #[error("duplicate key {key:?} in {side} collection")]
    DuplicateKey { side: Side, key: String },

    /// The search ran past its provable distance bound without reaching the
    /// end of both collections. This is a bug, not an input problem.
    #[error("edit script search exhausted its bound of {bound} without finishing")]
    EditScriptExhausted { bound: usize },

    /// A distance could not be computed for a kept parameter.
    #[error("distance failed for {key:?}: {source}")]
    Distance {
        key: String,
        #[source]
        source: DistanceError,
    },
}

impl From<KeyedDistanceError> for DiffError {
    fn from(e: KeyedDistanceError) -> Self {
        DiffError::Distance {
            key: e.key,
            source: e.source,
        }
    }
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;
