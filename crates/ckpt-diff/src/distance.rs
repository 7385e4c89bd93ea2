//! Numeric distances between equally-shaped tensors.
//!
//! Every metric is symmetric, non-negative, and exactly zero iff the two
//! tensors are element-wise equal. Elements with identical bit patterns
//! contribute nothing, so a NaN or infinity present at the same position on
//! both sides does not poison the result. Accumulation happens in `f64` so
//! that the smallest representable `f32` difference still yields a nonzero
//! distance.

use ckpt_types::Tensor;
use serde::{Deserialize, Serialize};

use crate::error::DistanceError;

/// A distance function over two tensors of the same shape.
pub trait TensorDistance {
    /// Short identifier used in logs and output.
    fn name(&self) -> &'static str;

    /// Distance between `a` and `b`.
    ///
    /// Returns [`DistanceError::ShapeMismatch`] if the shapes differ and
    /// [`DistanceError::NonFinite`] if the result is NaN or infinite (for
    /// example when a NaN in one tensor meets a different value in the other).
    fn distance(&self, a: &Tensor, b: &Tensor) -> Result<f64, DistanceError>;
}

/// Root-mean-square of element-wise differences.
#[derive(Clone, Copy, Debug, Default)]
pub struct RmsDistance;

impl TensorDistance for RmsDistance {
    fn name(&self) -> &'static str {
        "rms"
    }

    fn distance(&self, a: &Tensor, b: &Tensor) -> Result<f64, DistanceError> {
        check_shapes(a, b)?;
        if a.numel() == 0 {
            return Ok(0.0);
        }
        let sum_sq: f64 = a
            .data()
            .iter()
            .zip(b.data())
            .map(|(&x, &y)| {
                let diff = element_diff(x, y);
                diff * diff
            })
            .sum();
        finite((sum_sq / a.numel() as f64).sqrt())
    }
}

/// Largest absolute element-wise difference.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaxAbsDistance;

impl TensorDistance for MaxAbsDistance {
    fn name(&self) -> &'static str {
        "max-abs"
    }

    fn distance(&self, a: &Tensor, b: &Tensor) -> Result<f64, DistanceError> {
        check_shapes(a, b)?;
        let mut max = 0.0f64;
        for (&x, &y) in a.data().iter().zip(b.data()) {
            let diff = element_diff(x, y);
            // NaN never compares greater; surface it instead of dropping it.
            if diff.is_nan() {
                return Err(DistanceError::NonFinite(diff));
            }
            max = max.max(diff);
        }
        finite(max)
    }
}

/// Built-in metrics, selectable from configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DistanceMetric {
    #[default]
    Rms,
    MaxAbs,
}

impl TensorDistance for DistanceMetric {
    fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Rms => RmsDistance.name(),
            DistanceMetric::MaxAbs => MaxAbsDistance.name(),
        }
    }

    fn distance(&self, a: &Tensor, b: &Tensor) -> Result<f64, DistanceError> {
        match self {
            DistanceMetric::Rms => RmsDistance.distance(a, b),
            DistanceMetric::MaxAbs => MaxAbsDistance.distance(a, b),
        }
    }
}

fn check_shapes(a: &Tensor, b: &Tensor) -> Result<(), DistanceError> {
    if a.shape() != b.shape() {
        return Err(DistanceError::ShapeMismatch {
            left: a.shape().clone(),
            right: b.shape().clone(),
        });
    }
    Ok(())
}

/// Absolute difference of two elements; zero when their bits match.
fn element_diff(x: f32, y: f32) -> f64 {
    if x.to_bits() == y.to_bits() {
        0.0
    } else {
        (f64::from(x) - f64::from(y)).abs()
    }
}

fn finite(value: f64) -> Result<f64, DistanceError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(DistanceError::NonFinite(value))
    }
}
