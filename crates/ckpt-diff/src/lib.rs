//! Diff engine for model checkpoints.
//!
//! Compares two [`StateDict`]s and reports, for every parameter present in
//! either one, whether it was kept unchanged, added, removed, or modified in
//! place. The comparison runs in two passes:
//!
//! 1. [`edit_script`] computes a minimal Keep/Insert/Remove script over the
//!    ordered `(key, shape)` lists using Myers' greedy O(ND) search.
//! 2. [`classify`] rewrites each Keep whose tensors differ numerically into a
//!    Modify carrying the distance.
//!
//! # Key Types
//!
//! - [`DiffStep`] -- One entry of the diff (Keep / Insert / Remove / Modify)
//! - [`CheckpointDiff`] -- The ordered steps plus any per-key distance failures
//! - [`TensorDistance`] / [`DistanceMetric`] -- Pluggable tensor distances
//!
//! [`StateDict`]: ckpt_types::StateDict

pub mod checkpoint;
pub mod classify;
pub mod distance;
pub mod edit_script;
pub mod error;
pub mod step;

pub use checkpoint::{
    checkpoint_diff, checkpoint_diff_with, CheckpointDiff, DiffOptions, DistanceFailure,
    ErrorPolicy,
};
pub use classify::{classify, classify_each};
pub use distance::{DistanceMetric, MaxAbsDistance, RmsDistance, TensorDistance};
pub use edit_script::edit_script;
pub use error::{DiffError, DiffResult, DistanceError, KeyedDistanceError, Side};
pub use step::DiffStep;
