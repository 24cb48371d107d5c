// SPDX-License-Identifier: GPL-3.0-only

use super::operator::{Input, Operator};
use super::{Session, SessionReport, SessionState, StopReason, list_outputs};
use crate::backends::audio::{AudioDiscovery, AudioTestOutcome, test_audio_device};
use crate::backends::camera::VideoDiscovery;
use crate::backends::camera::types::CaptureDevice;
use crate::backends::runner::ToolRunner;
use crate::config::Config;
use crate::constants::timing::{AUDIO_TEST_SECS, POLL_INTERVAL_MS};
use crate::errors::SessionError;
use crate::pipelines::{
    Confirmation, LaunchOptions, Negotiator, ProcessRole, ProcessSupervisor, SpecBuilder,
    VideoMode,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Drives one session from discovery to the final report
pub struct SessionController<'a> {
    config: Config,
    runner: &'a dyn ToolRunner,
    operator: &'a mut dyn Operator,
    cancel: Arc<AtomicBool>,
    video_discovery: VideoDiscovery,
    audio_discovery: AudioDiscovery,
}

impl<'a> SessionController<'a> {
    pub fn new(
        config: Config,
        runner: &'a dyn ToolRunner,
        operator: &'a mut dyn Operator,
        cancel: Arc<AtomicBool>,
    ) -> Self {
        let video_discovery = VideoDiscovery {
            lister: config.tools.v4l2_ctl.clone(),
            guess_count: config.guess_device_count,
            ..VideoDiscovery::default()
        };
        let audio_discovery = AudioDiscovery {
            sound_server: config.tools.pactl.clone(),
            mixer: config.tools.arecord.clone(),
        };

        Self {
            config,
            runner,
            operator,
            cancel,
            video_discovery,
            audio_discovery,
        }
    }

    /// Replace where video discovery looks
    pub fn with_video_discovery(mut self, discovery: VideoDiscovery) -> Self {
        self.video_discovery = discovery;
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    fn check_cancelled(&self) -> Result<(), SessionError> {
        if self.cancelled() {
            warn!("Session cancelled before recording started");
            Err(SessionError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Ask a question; `None` means the operator gave no usable answer
    fn ask(&mut self, question: &str) -> Result<Option<String>, SessionError> {
        match self.operator.prompt(question) {
            Input::Line(line) => Ok(Some(line)),
            Input::Closed => Ok(None),
            Input::Interrupted => Err(SessionError::Cancelled),
        }
    }

    fn launch_options(&self) -> LaunchOptions {
        LaunchOptions {
            capture_tool: self.config.tools.capture.clone(),
            preview_tool: self.config.tools.preview.clone(),
            queue_size: self.config.queue_size,
            duration: self.config.duration(),
            launch_check: self.config.launch_check(),
        }
    }

    /// Run the whole session
    ///
    /// Fails only when no video device exists, the output directory cannot
    /// be created, or the session is cancelled before anything launched.
    pub fn run(mut self) -> Result<SessionReport, SessionError> {
        let supervisor = ProcessSupervisor::new(self.launch_options())
            .with_grace_period(self.config.grace_period());
        let mut session = Session::new(self.config.duration(), supervisor);

        // Discovering
        let videos = self.video_discovery.discover(self.runner)?;
        self.operator
            .notice(&format!("Found {} video device(s):", videos.len()));
        for (index, device) in videos.iter().enumerate() {
            self.operator.notice(&format!("  [{}] {}", index, device));
        }
        let audio = if self.config.audio_enabled {
            self.discover_audio()?
        } else {
            info!("Audio disabled");
            None
        };
        self.check_cancelled()?;

        // Negotiating
        session.advance(SessionState::Negotiating)?;
        let mut modes = Vec::with_capacity(videos.len());
        for (index, device) in videos.iter().enumerate() {
            modes.push(self.negotiate(index, device)?);
        }
        let audio = match audio {
            Some(device) => self.preflight_audio(device, &mut session)?,
            None => None,
        };
        self.check_cancelled()?;

        // SpecBuilding
        session.advance(SessionState::SpecBuilding)?;
        let output_directory = self.config.resolved_output_directory();
        let base_name = self.config.resolved_base_name();
        std::fs::create_dir_all(&output_directory).map_err(|source| {
            SessionError::OutputDirectory {
                path: output_directory.clone(),
                source,
            }
        })?;

        let builder = SpecBuilder {
            output_directory: output_directory.clone(),
            base_name: base_name.clone(),
            input_fourcc: self.config.input_format.clone(),
            preview_scale: self.config.preview_scale,
        };
        let overlay = self.config.overlay_text.clone();
        for (index, (device, mode)) in videos.iter().zip(modes).enumerate() {
            let spec =
                builder.build_video_spec(device, index, mode, self.config.mode, overlay.as_deref());
            if spec.forced_lossless() {
                self.operator.notice(&format!(
                    "Note: overlay on cam{} requires re-encoding, recording lossless ({}) instead of raw",
                    index,
                    spec.output().display()
                ));
            }
            session.video_specs.push(spec);
        }
        if let Some(device) = audio {
            session.audio_spec = Some(builder.build_audio_spec(&device, self.config.mode));
        }
        self.check_cancelled()?;

        // Launching
        session.advance(SessionState::Launching)?;
        self.launch_all(&mut session);

        // Running
        session.advance(SessionState::Running)?;
        let stop_reason = if session.supervisor.processes().is_empty() {
            self.operator.notice("No pipeline is running, ending session");
            StopReason::ProcessesExited
        } else {
            self.wait_for_stop(&mut session)
        };
        info!(reason = %stop_reason, "Recording stopped");

        // Stopping
        session.advance(SessionState::Stopping)?;
        self.operator.notice("Stopping all recordings...");
        let shutdown = session.supervisor.stop_all(self.config.grace_period());
        for label in &shutdown.lingering {
            self.operator.notice(&format!(
                "Warning: {} did not exit within the grace period",
                label
            ));
        }
        std::thread::sleep(self.config.settle_delay());

        session.advance(SessionState::Ended)?;
        let files = list_outputs(&output_directory, &base_name);
        info!(count = files.len(), dir = %output_directory.display(), "Session ended");

        Ok(SessionReport {
            output_directory,
            base_name,
            stop_reason,
            processes_launched: session.launched,
            files,
            failed: std::mem::take(&mut session.failed),
            shutdown,
            audio_skipped: session.audio_skipped,
        })
    }

    fn discover_audio(&mut self) -> Result<Option<CaptureDevice>, SessionError> {
        let runner = self.runner;
        let operator = &mut *self.operator;
        let mut interrupted = false;

        let device = self.audio_discovery.discover(runner, &mut |candidates| {
            operator.notice("Multiple USB audio devices found:");
            for (index, device) in candidates.iter().enumerate() {
                operator.notice(&format!("  [{}] {}", index, device));
            }
            match operator.prompt("Select audio device [0]:") {
                Input::Line(line) => Some(line),
                Input::Closed => None,
                Input::Interrupted => {
                    interrupted = true;
                    None
                }
            }
        });

        if interrupted {
            return Err(SessionError::Cancelled);
        }
        if device.is_none() {
            self.operator.notice("No USB audio device found, recording video only");
        }
        Ok(device)
    }

    /// Negotiate and confirm the mode for one camera
    fn negotiate(&mut self, index: usize, device: &CaptureDevice) -> Result<VideoMode, SessionError> {
        let defaults = VideoMode::new(
            self.config.default_resolution,
            self.config.default_framerate(),
        );
        let negotiator = Negotiator {
            prober: self.config.tools.v4l2_ctl.clone(),
            input_format: self.config.input_format.clone(),
            defaults,
            auto_detect: self.config.auto_detect,
        };
        let proposed = negotiator.negotiate(self.runner, device);

        let question = format!(
            "cam{} {}: record at {}? [Enter=accept, d=defaults {}, or WxH@FPS]",
            index, device, proposed, defaults
        );
        let confirmation = match self.ask(&question)? {
            Some(answer) => Confirmation::parse(&answer),
            None => Confirmation::Accept,
        };
        let mode = confirmation.resolve(proposed, defaults);
        info!(index, device = %device.path, mode = %mode, "Capture mode confirmed");
        Ok(mode)
    }

    /// Test the audio device; `None` when the operator chose to skip it
    fn preflight_audio(
        &mut self,
        device: CaptureDevice,
        session: &mut Session,
    ) -> Result<Option<CaptureDevice>, SessionError> {
        if !self.config.test_audio {
            return Ok(Some(device));
        }

        self.operator
            .notice(&format!("Testing audio device {}...", device));
        let outcome = test_audio_device(
            self.runner,
            &self.config.tools.capture,
            &device,
            AUDIO_TEST_SECS,
        );
        if outcome == AudioTestOutcome::Passed {
            return Ok(Some(device));
        }

        let answer = self.ask("Audio test failed. Skip audio recording? [y/N]")?;
        let skip = answer
            .map(|a| matches!(a.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
            .unwrap_or(false);
        if skip {
            self.operator.notice("Skipping audio");
            session.audio_skipped = true;
            Ok(None)
        } else {
            self.operator.notice("Recording audio despite the failed test");
            Ok(Some(device))
        }
    }

    /// Start every pipeline back to back, then drop the ones that died
    fn launch_all(&mut self, session: &mut Session) {
        if self.config.preview {
            self.operator.notice(
                "Warning: many cameras cannot be opened twice. Preview and capture on the \
                 same device may conflict, and one of them can fail.",
            );
        }

        let Session {
            video_specs,
            audio_spec,
            supervisor,
            failed,
            launched,
            ..
        } = session;

        let mut plan: Vec<(&crate::pipelines::PipelineSpec, ProcessRole)> = Vec::new();
        for spec in video_specs.iter() {
            plan.push((spec, ProcessRole::Capture));
            if self.config.preview {
                plan.push((spec, ProcessRole::Preview));
            }
        }
        if let Some(spec) = audio_spec.as_ref() {
            plan.push((spec, ProcessRole::Capture));
        }

        for (spec, role) in plan {
            if let Err(e) = supervisor.launch(spec, role) {
                error!(label = %spec.label(), role = %role, error = %e, "Launch failed");
                failed.push(crate::pipelines::FailedLaunch {
                    label: spec.label(),
                    role,
                    error: e,
                });
            }
        }

        failed.extend(supervisor.confirm_started());
        // Processes that finished during the check are no longer recording
        *launched = supervisor.processes().len();

        for failure in failed.iter() {
            self.operator.notice(&format!(
                "Failed to start {} ({}): {}",
                failure.label, failure.role, failure.error
            ));
        }
        self.operator.notice(&format!(
            "Recording with {} process(es)",
            supervisor.processes().len()
        ));
    }

    /// Block until a duration, operator or signal stop
    fn wait_for_stop(&mut self, session: &mut Session) -> StopReason {
        let started = Instant::now();
        let poll = Duration::from_millis(POLL_INTERVAL_MS);
        let token = self.config.stop_token.trim().to_string();

        match session.duration {
            Some(duration) => self.operator.notice(&format!(
                "Recording for {}s. Type '{}' and Enter to stop early.",
                duration.as_secs(),
                token
            )),
            None => self
                .operator
                .notice(&format!("Recording. Type '{}' and Enter to stop.", token)),
        }

        loop {
            if self.cancelled() {
                return StopReason::Signal;
            }
            if let Some(duration) = session.duration
                && started.elapsed() >= duration
            {
                return StopReason::DurationElapsed;
            }
            for (label, status) in session.supervisor.reap_exited() {
                if !status.success() {
                    self.operator
                        .notice(&format!("Warning: {} stopped unexpectedly ({})", label, status));
                }
            }
            if session.supervisor.processes().is_empty() {
                return StopReason::ProcessesExited;
            }

            match self.operator.poll_line(poll) {
                Some(Input::Line(line)) if line.trim() == token => {
                    match self.operator.prompt("End the session? [y/N]") {
                        Input::Line(answer)
                            if matches!(
                                answer.trim().to_ascii_lowercase().as_str(),
                                "y" | "yes"
                            ) =>
                        {
                            return StopReason::Operator;
                        }
                        Input::Interrupted => return StopReason::Signal,
                        _ => self.operator.notice("Continuing"),
                    }
                }
                Some(Input::Interrupted) => return StopReason::Signal,
                _ => {}
            }
        }
    }
}
