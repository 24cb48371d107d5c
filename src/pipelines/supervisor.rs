// SPDX-License-Identifier: GPL-3.0-only

//! External process supervision
//!
//! The supervisor owns every child it starts. Shutdown always fans the
//! interrupt out to all children before waiting on any of them, so every
//! recorder gets the same head start on finalizing its file.
//!
//! Children run in their own process group. A terminal interrupt only
//! reaches the orchestrator, which then forwards it in a controlled way.

use super::command::{LaunchOptions, ProcessCommand};
use super::spec::{PipelineSpec, ProcessRole};
use crate::constants::timing::{GRACE_PERIOD_MS, POLL_INTERVAL_MS};
use crate::errors::LaunchError;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// A child process started by the supervisor
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
    pub role: ProcessRole,
    pub label: String,
    pub program: String,
    pub started_at: Instant,
}

impl RunningProcess {
    pub fn pid(&self) -> u32 {
        self.child.id()
    }
}

/// Outcome of [`ProcessSupervisor::stop_all`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Processes that exited within the grace period
    pub exited: Vec<String>,
    /// Processes still running when the grace period ran out
    pub lingering: Vec<String>,
}

impl ShutdownReport {
    pub fn is_clean(&self) -> bool {
        self.lingering.is_empty()
    }
}

/// A launch that did not survive its startup check
#[derive(Debug)]
pub struct FailedLaunch {
    pub label: String,
    pub role: ProcessRole,
    pub error: LaunchError,
}

/// Starts, tracks and stops pipeline processes
pub struct ProcessSupervisor {
    options: LaunchOptions,
    processes: Vec<RunningProcess>,
    grace_period: Duration,
}

impl ProcessSupervisor {
    pub fn new(options: LaunchOptions) -> Self {
        Self {
            options,
            processes: Vec::new(),
            grace_period: Duration::from_millis(GRACE_PERIOD_MS),
        }
    }

    /// Grace period used when the supervisor is dropped with children alive
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Launch the process for `spec` in `role` and return its pid
    ///
    /// Never waits: a process that is already gone with a failure status is
    /// reported here, slower failures are caught by [`Self::confirm_started`].
    pub fn launch(&mut self, spec: &PipelineSpec, role: ProcessRole) -> Result<u32, LaunchError> {
        let command = ProcessCommand::for_spec(spec, role, &self.options).ok_or_else(|| {
            LaunchError::PreviewUnsupported {
                device: spec.device().path.clone(),
            }
        })?;

        let label = match role {
            ProcessRole::Capture => spec.label(),
            ProcessRole::Preview => format!("{} preview", spec.label()),
        };
        self.launch_command(&command, role, label)
    }

    /// Launch an arbitrary command under supervision
    pub fn launch_command(
        &mut self,
        command: &ProcessCommand,
        role: ProcessRole,
        label: String,
    ) -> Result<u32, LaunchError> {
        debug!(program = %command.program, args = ?command.args, "Spawning process");

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        match child.try_wait() {
            Ok(Some(status)) if !status.success() => {
                return Err(LaunchError::ExitedImmediately {
                    program: command.program.clone(),
                    code: status.code(),
                });
            }
            Ok(_) => {}
            Err(e) => {
                error!(program = %command.program, error = %e, "Cannot poll new process");
                let _ = child.kill();
                let _ = child.wait();
                return Err(LaunchError::MissingHandle {
                    program: command.program.clone(),
                });
            }
        }

        let pid = child.id();
        info!(pid, role = %role, label = %label, "Process started");
        self.processes.push(RunningProcess {
            child,
            role,
            label,
            program: command.program.clone(),
            started_at: Instant::now(),
        });
        Ok(pid)
    }

    /// Give fresh processes the launch check window, then drop the ones
    /// that already exited with a failure status
    pub fn confirm_started(&mut self) -> Vec<FailedLaunch> {
        let deadline = self
            .processes
            .iter()
            .map(|p| p.started_at + self.options.launch_check)
            .max();
        if let Some(deadline) = deadline {
            let now = Instant::now();
            if deadline > now {
                std::thread::sleep(deadline - now);
            }
        }

        let mut failures = Vec::new();
        let mut alive = Vec::with_capacity(self.processes.len());
        for mut process in self.processes.drain(..) {
            match process.child.try_wait() {
                Ok(Some(status)) if !status.success() => {
                    warn!(label = %process.label, code = ?status.code(), "Process exited during startup");
                    failures.push(FailedLaunch {
                        label: process.label,
                        role: process.role,
                        error: LaunchError::ExitedImmediately {
                            program: process.program,
                            code: status.code(),
                        },
                    });
                }
                Ok(Some(_)) => {
                    debug!(label = %process.label, "Process finished during startup");
                }
                Ok(None) => alive.push(process),
                Err(e) => {
                    warn!(label = %process.label, error = %e, "Cannot poll process");
                    alive.push(process);
                }
            }
        }
        self.processes = alive;
        failures
    }

    /// Processes currently tracked
    pub fn processes(&self) -> &[RunningProcess] {
        &self.processes
    }

    /// Forget processes that have exited on their own and return them
    ///
    /// A clean exit is expected once a fixed duration runs out; anything
    /// else means a recorder died mid-session.
    pub fn reap_exited(&mut self) -> Vec<(String, ExitStatus)> {
        let mut exited = Vec::new();
        self.processes.retain_mut(|process| match process.child.try_wait() {
            Ok(Some(status)) => {
                if status.success() {
                    info!(label = %process.label, "Process finished");
                } else {
                    warn!(label = %process.label, ?status, "Process exited unexpectedly");
                }
                exited.push((process.label.clone(), status));
                false
            }
            _ => true,
        });
        exited
    }

    /// Interrupt every tracked process and wait up to `grace` for them
    ///
    /// Every process is signalled before any is waited on. Processes still
    /// alive after `grace` are reported and released, not killed. Calling
    /// this again is a no-op.
    pub fn stop_all(&mut self, grace: Duration) -> ShutdownReport {
        let mut report = ShutdownReport::default();
        if self.processes.is_empty() {
            return report;
        }

        info!(count = self.processes.len(), "Interrupting all processes");
        for process in &mut self.processes {
            if let Ok(Some(_)) = process.child.try_wait() {
                continue;
            }
            interrupt(process.pid(), &process.label);
        }

        let deadline = Instant::now() + grace;
        let poll = Duration::from_millis(POLL_INTERVAL_MS);
        loop {
            self.processes.retain_mut(|process| match process.child.try_wait() {
                Ok(Some(status)) => {
                    debug!(label = %process.label, ?status, "Process stopped");
                    report.exited.push(process.label.clone());
                    false
                }
                Ok(None) => true,
                Err(e) => {
                    warn!(label = %process.label, error = %e, "Lost track of process");
                    report.exited.push(process.label.clone());
                    false
                }
            });

            if self.processes.is_empty() || Instant::now() >= deadline {
                break;
            }
            std::thread::sleep(poll);
        }

        for process in self.processes.drain(..) {
            warn!(
                label = %process.label,
                pid = process.child.id(),
                grace_ms = grace.as_millis() as u64,
                "Process still running after grace period"
            );
            report.lingering.push(process.label);
        }

        info!(
            exited = report.exited.len(),
            lingering = report.lingering.len(),
            "Shutdown complete"
        );
        report
    }

    /// Block until every tracked process exits on its own
    pub fn wait_all(&mut self) -> Vec<(String, Option<ExitStatus>)> {
        self.processes
            .drain(..)
            .map(|mut process| {
                let status = match process.child.wait() {
                    Ok(status) => Some(status),
                    Err(e) => {
                        warn!(label = %process.label, error = %e, "Failed to wait for process");
                        None
                    }
                };
                (process.label, status)
            })
            .collect()
    }
}

impl Drop for ProcessSupervisor {
    fn drop(&mut self) {
        if !self.processes.is_empty() {
            warn!(count = self.processes.len(), "Supervisor dropped with live processes");
            let grace = self.grace_period;
            self.stop_all(grace);
        }
    }
}

/// Send the capture tool's graceful stop signal
fn interrupt(pid: u32, label: &str) {
    let Ok(pid) = libc::pid_t::try_from(pid) else {
        warn!(pid, label, "Process id out of range");
        return;
    };
    // SAFETY: kill(2) has no memory safety requirements
    let result = unsafe { libc::kill(pid, libc::SIGINT) };
    if result != 0 {
        debug!(
            pid,
            label,
            error = %std::io::Error::last_os_error(),
            "Interrupt not delivered"
        );
    }
}
