use serde::{Deserialize, Serialize};

use crate::error::{TypeError, TypeResult};
use crate::shape::Shape;

/// A dense, row-major tensor of `f32` values.
///
/// The element count always equals `shape.numel()`; the constructor enforces
/// this so downstream code can zip two equally-shaped tensors without
/// re-checking lengths.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    shape: Shape,
    data: Vec<f32>,
}

impl Tensor {
    /// Create a tensor, validating that `data` fills `shape` exactly.
    pub fn new(shape: impl Into<Shape>, data: Vec<f32>) -> TypeResult<Self> {
        let shape = shape.into();
        let expected = shape
            .checked_numel()
            .ok_or_else(|| TypeError::ShapeOverflow(shape.to_string()))?;
        if data.len() != expected {
            return Err(TypeError::ElementCount {
                shape: shape.to_string(),
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// A tensor of the given shape filled with `value`.
    pub fn full(shape: impl Into<Shape>, value: f32) -> TypeResult<Self> {
        let shape = shape.into();
        let n = shape
            .checked_numel()
            .ok_or_else(|| TypeError::ShapeOverflow(shape.to_string()))?;
        Ok(Self {
            shape,
            data: vec![value; n],
        })
    }

    /// A rank-0 tensor holding one value.
    pub fn scalar(value: f32) -> Self {
        Self {
            shape: Shape::scalar(),
            data: vec![value],
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn numel(&self) -> usize {
        self.data.len()
    }

    pub fn into_data(self) -> Vec<f32> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_matching_length() {
        let t = Tensor::new([2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(t.numel(), 4);
        assert_eq!(t.shape(), &Shape::from([2, 2]));
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = Tensor::new([3], vec![1.0]).unwrap_err();
        assert_eq!(
            err,
            TypeError::ElementCount {
                shape: "(3,)".into(),
                expected: 3,
                actual: 1,
            }
        );
    }

    #[test]
    fn scalar_has_one_element() {
        let t = Tensor::scalar(7.5);
        assert_eq!(t.shape().rank(), 0);
        assert_eq!(t.data(), &[7.5]);
    }

    #[test]
    fn full_fills_every_element() {
        let t = Tensor::full([2, 3], 0.25).unwrap();
        assert!(t.data().iter().all(|&v| v == 0.25));
        assert_eq!(t.numel(), 6);
    }
}
