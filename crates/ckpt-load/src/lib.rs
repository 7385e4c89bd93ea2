//! Checkpoint loading for ckpt.
//!
//! Turns a checkpoint identifier into a [`StateDict`] in two steps:
//!
//! 1. A [`CheckpointResolver`] maps the identifier to a local file.
//!    [`LocalResolver`] handles plain paths, directories holding a
//!    `model.safetensors`, and models already present in the local
//!    HuggingFace hub cache. Nothing is downloaded.
//! 2. A [`CheckpointLoader`] reads the file. [`SafeTensorsLoader`]
//!    memory-maps a SafeTensors file, widens every tensor to `f32`, and keeps
//!    tensors in file layout order.
//!
//! [`StateDict`]: ckpt_types::StateDict

pub mod dtype;
pub mod error;
pub mod loader;
pub mod resolve;
pub mod safetensors;

#[cfg(test)]
pub(crate) mod fixtures;

pub use dtype::Dtype;
pub use error::{LoadError, LoadResult};
pub use loader::{load_state_dict, CheckpointLoader, SafeTensorsLoader};
pub use resolve::{CheckpointKind, CheckpointResolver, LocalResolver};
pub use safetensors::{read_safetensors, TensorInfo};
