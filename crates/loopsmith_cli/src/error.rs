// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shell error type.

use loopsmith_engine::{EngineError, SettingsError};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a `loopsmith` run
#[derive(Debug, Error)]
pub enum CliError {
    /// Engine operation failed
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Settings file could not be used
    #[error("Settings: {0}")]
    Settings(#[from] SettingsError),

    /// Edit script could not be read
    #[error("Failed to read script {}: {source}", .path.display())]
    ScriptIo {
        /// Script path
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Edit script is not a valid command list
    #[error("Invalid edit script {}: {source}", .path.display())]
    Script {
        /// Script path
        path: PathBuf,
        /// Parse error with position
        #[source]
        source: ron::error::SpannedError,
    },

    /// A script command failed
    #[error("Script step {step} ({command}) failed: {source}")]
    ScriptStep {
        /// 1-based step number
        step: usize,
        /// Command label
        command: &'static str,
        /// Engine error
        #[source]
        source: EngineError,
    },

    /// The export worker exited before reporting a result
    #[error("Export worker stopped unexpectedly")]
    WorkerStopped,

    /// JSON output failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
