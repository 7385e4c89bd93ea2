use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("duplicate key in state dict: {0}")]
    DuplicateKey(String),

    #[error("element count mismatch: shape {shape} needs {expected} values, got {actual}")]
    ElementCount {
        shape: String,
        expected: usize,
        actual: usize,
    },

    #[error("shape {0} overflows the addressable element count")]
    ShapeOverflow(String),
}

/// Result alias for type operations.
pub type TypeResult<T> = Result<T, TypeError>;
