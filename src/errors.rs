//! errors.rs — error type shared by the index, tensor and reporting layers.
//!
//! * `thiserror` derives `Display` / `Error`.
//! * Use `Result<T>` alias for convenience.

use thiserror::Error;

/// Result alias used across crate.
pub type Result<T, E = IngestError> = core::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum IngestError {
    /// Vector passed to `insert`/`add_items`/`search` has wrong dimensionality.
    #[error("dimension mismatch: expected {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Insertion would push the index past `max_elements`.
    #[error("capacity exceeded: {current} stored + {requested} new > {capacity}")]
    CapacityExceeded {
        capacity: usize,
        current: usize,
        requested: usize,
    },

    /// Search attempted on an empty graph.
    #[error("index is empty")]
    EmptyIndex,

    /// A tensor could not be split or reshaped as requested.
    #[error("shape error: {0}")]
    Shape(String),

    /// Report sink failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed (serde feature).
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serialize(String),
}

impl IngestError {
    pub(crate) fn shape(msg: impl Into<String>) -> Self {
        IngestError::Shape(msg.into())
    }
}
