// SPDX-License-Identifier: MPL-2.0

//! USB audio input discovery and pre-flight testing
//!
//! The sound server is asked first (`pactl`); if it is not running, ALSA
//! capture cards are listed instead (`arecord -l`). Both listings are
//! filtered to USB entries.

use super::camera::types::{AudioBackend, CaptureDevice};
use super::runner::ToolRunner;
use crate::constants::discovery::USB_MARKER;
use crate::constants::tools;
use tracing::{debug, info, warn};

/// Audio discovery tools
#[derive(Debug, Clone)]
pub struct AudioDiscovery {
    /// Sound server source lister
    pub sound_server: String,
    /// ALSA card lister
    pub mixer: String,
}

impl Default for AudioDiscovery {
    fn default() -> Self {
        Self {
            sound_server: tools::PACTL.to_string(),
            mixer: tools::ARECORD.to_string(),
        }
    }
}

/// Result of the audio pre-flight capture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioTestOutcome {
    Passed,
    Failed,
}

impl AudioDiscovery {
    /// List USB audio sources, preferring the sound server
    pub fn candidates(&self, runner: &dyn ToolRunner) -> Vec<CaptureDevice> {
        if let Some(stdout) = runner.run(&self.sound_server, &["list", "short", "sources"]) {
            let sources = parse_pactl_sources(&stdout);
            debug!(count = sources.len(), "USB sources from sound server");
            return sources;
        }

        debug!("Sound server unavailable, listing ALSA capture cards");
        match runner.run(&self.mixer, &["-l"]) {
            Some(stdout) => parse_arecord_cards(&stdout),
            None => {
                debug!("ALSA card lister unavailable");
                Vec::new()
            }
        }
    }

    /// Pick the session's audio device
    ///
    /// With several candidates `choose` is shown the list and returns the
    /// operator's answer; see [`pick_index`] for how it is read.
    pub fn discover(
        &self,
        runner: &dyn ToolRunner,
        choose: &mut dyn FnMut(&[CaptureDevice]) -> Option<String>,
    ) -> Option<CaptureDevice> {
        let mut candidates = self.candidates(runner);

        let index = match candidates.len() {
            0 => {
                info!("No USB audio device found");
                return None;
            }
            1 => 0,
            count => {
                let answer = choose(&candidates);
                pick_index(answer.as_deref().unwrap_or(""), count)
            }
        };

        let device = candidates.swap_remove(index);
        info!(device = %device, "Selected audio device");
        Some(device)
    }
}

/// Read an operator's index choice
///
/// Empty input selects index 0. Out-of-range or unparsable input also falls
/// back to index 0.
pub fn pick_index(answer: &str, count: usize) -> usize {
    let answer = answer.trim();
    if answer.is_empty() {
        return 0;
    }
    match answer.parse::<usize>() {
        Ok(index) if index < count => index,
        _ => {
            warn!(answer, count, "Invalid device index, using 0");
            0
        }
    }
}

/// Parse `pactl list short sources`, keeping USB inputs
///
/// Each line is tab separated: `index  name  driver  sample-spec  state`.
/// Monitor sources of outputs are skipped.
pub fn parse_pactl_sources(text: &str) -> Vec<CaptureDevice> {
    text.lines()
        .filter_map(|line| {
            let name = line.split('\t').nth(1)?.trim();
            if name.is_empty()
                || name.ends_with(".monitor")
                || !name.to_ascii_lowercase().contains(USB_MARKER)
            {
                return None;
            }
            Some(CaptureDevice::audio(name, name, AudioBackend::Pulse))
        })
        .collect()
}

/// Parse `arecord -l`, keeping USB capture cards as `hw:CARD,DEVICE`
///
/// ```text
/// card 2: Microphone [Yeti Stereo Microphone], device 0: USB Audio [USB Audio]
/// ```
pub fn parse_arecord_cards(text: &str) -> Vec<CaptureDevice> {
    text.lines()
        .filter_map(|line| {
            let rest = line.trim().strip_prefix("card ")?;
            if !rest.to_ascii_lowercase().contains(USB_MARKER) {
                return None;
            }

            let (card, rest) = rest.split_once(':')?;
            let card: u32 = card.trim().parse().ok()?;

            let device = rest
                .split_once("device ")
                .and_then(|(_, tail)| tail.split(':').next())
                .and_then(|n| n.trim().parse::<u32>().ok())
                .unwrap_or(0);

            let name = rest
                .split_once('[')
                .and_then(|(_, tail)| tail.split(']').next())
                .unwrap_or("")
                .to_string();

            Some(CaptureDevice::audio(
                format!("hw:{},{}", card, device),
                name,
                AudioBackend::Alsa,
            ))
        })
        .collect()
}

/// Capture a short sample from `device` into the null muxer
///
/// A failure here only means the device could not be opened or read right
/// now; the caller decides whether to record anyway.
pub fn test_audio_device(
    runner: &dyn ToolRunner,
    capture_tool: &str,
    device: &CaptureDevice,
    seconds: u32,
) -> AudioTestOutcome {
    let crate::backends::camera::types::DeviceKind::Audio(backend) = device.kind else {
        return AudioTestOutcome::Failed;
    };

    let seconds = seconds.to_string();
    let args = [
        "-hide_banner",
        "-loglevel",
        "error",
        "-nostdin",
        "-f",
        backend.input_format(),
        "-i",
        device.path.as_str(),
        "-t",
        seconds.as_str(),
        "-f",
        "null",
        "-",
    ];

    if runner.succeeds(capture_tool, &args) {
        debug!(device = %device.path, "Audio pre-flight test passed");
        AudioTestOutcome::Passed
    } else {
        warn!(device = %device.path, "Audio pre-flight test failed");
        AudioTestOutcome::Failed
    }
}
