// SPDX-License-Identifier: MIT OR Apache-2.0
//! Engine error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// Errors reported by the editing engine
#[derive(Debug, Error)]
pub enum EngineError {
    /// Wrong file type or extension on load or export
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Operation needs at least one frame
    #[error("Sequence has no frames")]
    EmptySequence,

    /// Geometry-dependent request that cannot be honored
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Format-specific export error
    #[error("Failed to encode: {0}")]
    EncodeFailure(String),

    /// Merge/concatenate invoked without two populated sequences
    #[error("Composition needs two populated sequences: {0}")]
    CompositionPrecondition(String),

    /// Source file could not be decoded
    #[error("Failed to decode {}: {source}", .path.display())]
    Decode {
        /// File being decoded
        path: PathBuf,
        /// Underlying image error
        #[source]
        source: image::ImageError,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
