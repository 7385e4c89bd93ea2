use std::path::PathBuf;

use ckpt_types::TypeError;

/// Errors from resolving or loading a checkpoint.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// I/O error while opening or mapping a file.
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The checkpoint path does not exist or holds no loadable file.
    #[error("checkpoint not found: {0:?}")]
    NotFound(PathBuf),

    /// The model is not present in the local hub cache.
    #[error("model {model:?} is not in the hub cache at {cache:?}")]
    NotCached { model: String, cache: PathBuf },

    /// The file exists but is not a format this loader reads.
    #[error("unsupported checkpoint format {path:?}: {reason}")]
    UnsupportedFormat { path: PathBuf, reason: String },

    /// The SafeTensors header is truncated or malformed.
    #[error("invalid SafeTensors header in {path:?}: {reason}")]
    InvalidHeader { path: PathBuf, reason: String },

    /// A tensor's offsets or byte count disagree with its dtype and shape.
    #[error("tensor {key:?} is corrupt: {reason}")]
    InvalidTensor { key: String, reason: String },

    /// Building the state dict failed (duplicate keys, element counts).
    #[error(transparent)]
    Types(#[from] TypeError),
}

/// Result alias for load operations.
pub type LoadResult<T> = Result<T, LoadError>;
