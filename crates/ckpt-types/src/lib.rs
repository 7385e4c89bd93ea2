//! Foundation types for checkpoint diffing.
//!
//! This crate provides the shape, tensor, and state dictionary types shared
//! by the diff engine, the loaders, and the command-line front end.
//!
//! # Key Types
//!
//! - [`Shape`] -- Ordered tensor dimensions, displayed as a tuple
//! - [`NamedShape`] -- A `(key, shape)` pair; the unit the edit-script engine compares
//! - [`Tensor`] -- A shaped, dense buffer of `f32` values
//! - [`StateDict`] -- Insertion-ordered mapping from unique keys to tensors

pub mod error;
pub mod shape;
pub mod state;
pub mod tensor;

pub use error::{TypeError, TypeResult};
pub use shape::{NamedShape, Shape};
pub use state::StateDict;
pub use tensor::Tensor;
