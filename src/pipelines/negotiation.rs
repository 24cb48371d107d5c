// SPDX-License-Identifier: GPL-3.0-only

//! Capture mode negotiation
//!
//! Auto-detection proposes the largest resolution the device lists for the
//! configured input encoding, at that resolution's highest rate. The proposal
//! is always put to the operator, who can accept it, override it, or fall
//! back to the configured defaults.

use crate::backends::camera::enumeration::query_formats;
use crate::backends::camera::types::{CaptureDevice, Framerate, Resolution};
use crate::backends::runner::ToolRunner;
use tracing::{debug, info, warn};

/// Resolution and frame rate a video pipeline will run at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMode {
    pub resolution: Resolution,
    pub framerate: Framerate,
}

impl VideoMode {
    pub fn new(resolution: Resolution, framerate: Framerate) -> Self {
        Self {
            resolution,
            framerate,
        }
    }
}

impl std::fmt::Display for VideoMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} @ {}fps", self.resolution, self.framerate)
    }
}

/// Probe parameters shared by every device in a session
#[derive(Debug, Clone)]
pub struct Negotiator {
    /// Format prober program
    pub prober: String,
    /// Four-character input encoding to match
    pub input_format: String,
    /// Mode used when probing is off or finds nothing
    pub defaults: VideoMode,
    pub auto_detect: bool,
}

impl Negotiator {
    /// Pick a capture mode for `device`
    ///
    /// With auto-detection off the defaults come back untouched and the
    /// device is never queried. A failed or empty probe also yields the
    /// defaults; a resolution listed without intervals keeps the default rate.
    pub fn negotiate(&self, runner: &dyn ToolRunner, device: &CaptureDevice) -> VideoMode {
        if !self.auto_detect {
            debug!(device = %device.path, "Auto-detect disabled, using defaults");
            return self.defaults;
        }

        let best = query_formats(runner, &self.prober, device, &self.input_format)
            .and_then(|profile| profile.best_mode());

        match best {
            Some((resolution, framerate)) => {
                let mode = VideoMode::new(resolution, framerate.unwrap_or(self.defaults.framerate));
                info!(device = %device.path, mode = %mode, "Auto-detected capture mode");
                mode
            }
            None => {
                warn!(
                    device = %device.path,
                    input_format = %self.input_format,
                    "Format probe found no match, using defaults"
                );
                self.defaults
            }
        }
    }
}

/// Operator's answer to a proposed capture mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Accept,
    Defaults,
    Override(VideoMode),
}

impl Confirmation {
    /// Read an answer
    ///
    /// Empty input or `y` accepts, `d` asks for the defaults and
    /// `WIDTHxHEIGHT@FPS` (or `WIDTHxHEIGHT FPS`) overrides. Anything else is
    /// treated as a request for the defaults.
    pub fn parse(answer: &str) -> Self {
        let answer = answer.trim();
        match answer.to_ascii_lowercase().as_str() {
            "" | "y" | "yes" => return Confirmation::Accept,
            "d" | "default" | "defaults" => return Confirmation::Defaults,
            _ => {}
        }

        let parsed = answer
            .split_once(['@', ' '])
            .and_then(|(res, fps)| {
                let resolution = res.parse::<Resolution>().ok()?;
                let framerate = fps.parse::<Framerate>().ok()?;
                Some(VideoMode::new(resolution, framerate))
            });

        match parsed {
            Some(mode) => Confirmation::Override(mode),
            None => {
                warn!(answer, "Unrecognised mode override, using defaults");
                Confirmation::Defaults
            }
        }
    }

    /// The mode this answer settles on
    pub fn resolve(self, proposed: VideoMode, defaults: VideoMode) -> VideoMode {
        match self {
            Confirmation::Accept => proposed,
            Confirmation::Defaults => defaults,
            Confirmation::Override(mode) => mode,
        }
    }
}
