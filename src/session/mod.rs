// SPDX-License-Identifier: GPL-3.0-only

//! Recording session lifecycle
//!
//! A session moves strictly forward through its phases:
//!
//! ```text
//! Discovering → Negotiating → SpecBuilding → Launching → Running → Stopping → Ended
//! ```
//!
//! [`Session`] is the single record of what is being recorded. Only the
//! [`SessionController`] mutates it; every other component hands back
//! values.

mod controller;
pub mod operator;

pub use controller::SessionController;
pub use operator::{ConsoleOperator, Input, Operator, ScriptedOperator};

use crate::errors::SessionError;
use crate::pipelines::{FailedLaunch, PipelineSpec, ProcessSupervisor, ShutdownReport};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Session lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SessionState {
    Discovering,
    Negotiating,
    SpecBuilding,
    Launching,
    Running,
    Stopping,
    Ended,
}

/// Why the running phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The fixed recording length elapsed
    DurationElapsed,
    /// The operator typed the stop token and confirmed
    Operator,
    /// External termination request
    Signal,
    /// Every process exited on its own
    ProcessesExited,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopReason::DurationElapsed => f.write_str("duration elapsed"),
            StopReason::Operator => f.write_str("stopped by operator"),
            StopReason::Signal => f.write_str("interrupted"),
            StopReason::ProcessesExited => f.write_str("all processes exited"),
        }
    }
}

/// Everything a session has decided and started
pub struct Session {
    state: SessionState,
    video_specs: Vec<PipelineSpec>,
    audio_spec: Option<PipelineSpec>,
    audio_skipped: bool,
    duration: Option<Duration>,
    supervisor: ProcessSupervisor,
    failed: Vec<FailedLaunch>,
    launched: usize,
}

impl Session {
    pub fn new(duration: Option<Duration>, supervisor: ProcessSupervisor) -> Self {
        Self {
            state: SessionState::Discovering,
            video_specs: Vec::new(),
            audio_spec: None,
            audio_skipped: false,
            duration,
            supervisor,
            failed: Vec::new(),
            launched: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Move to a later phase; moving back or staying put is an error
    pub fn advance(&mut self, to: SessionState) -> Result<(), SessionError> {
        if to <= self.state {
            return Err(SessionError::InvalidTransition {
                from: self.state,
                to,
            });
        }
        debug!(from = ?self.state, to = ?to, "Session transition");
        self.state = to;
        Ok(())
    }
}

/// One file found in the output directory after the session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub path: PathBuf,
    pub size: u64,
}

/// What a finished session produced
#[derive(Debug)]
pub struct SessionReport {
    pub output_directory: PathBuf,
    pub base_name: String,
    pub stop_reason: StopReason,
    /// Processes still running after the launch check, captures and previews alike
    pub processes_launched: usize,
    /// Files actually present, sorted by name
    pub files: Vec<OutputFile>,
    /// Pipelines excluded because their process did not start
    pub failed: Vec<FailedLaunch>,
    pub shutdown: ShutdownReport,
    pub audio_skipped: bool,
}

/// List `<base_name>_*` files in `directory`, sorted by name
///
/// A missing or unreadable directory yields an empty list.
pub fn list_outputs(directory: &Path, base_name: &str) -> Vec<OutputFile> {
    let prefix = format!("{}_", base_name);
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %directory.display(), error = %e, "Cannot list output directory");
            return Vec::new();
        }
    };

    let mut files: Vec<OutputFile> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with(&prefix))
        .filter_map(|entry| {
            let metadata = entry.metadata().ok()?;
            metadata.is_file().then(|| OutputFile {
                path: entry.path(),
                size: metadata.len(),
            })
        })
        .collect();
    files.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    files
}
