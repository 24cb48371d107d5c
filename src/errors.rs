// SPDX-License-Identifier: MPL-2.0

//! Error types for the capture orchestrator
//!
//! Only a handful of conditions are real errors. Probe failures, failed audio
//! pre-flight tests, device conflicts and slow shutdowns are recovered where
//! they happen and show up as outcome values instead.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::session::SessionState;

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Top-level error type
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("Failed to install interrupt handler: {0}")]
    Signal(#[from] ctrlc::Error),
}

/// Device discovery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// Every discovery tier came back empty
    #[error("No USB capture devices found")]
    NoVideoDevices,
}

/// A pipeline process that could not be started
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("{program} exited immediately with status {code:?}")]
    ExitedImmediately { program: String, code: Option<i32> },
    #[error("{program} was spawned without a usable process handle")]
    MissingHandle { program: String },
    #[error("{device} has no video to preview")]
    PreviewUnsupported { device: String },
}

/// Session lifecycle errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("Invalid session transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: SessionState,
        to: SessionState,
    },
    #[error("Session cancelled before recording started")]
    Cancelled,
    #[error("Failed to prepare output directory {path}: {source}")]
    OutputDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ConfigError::Invalid(msg.into())
    }
}
