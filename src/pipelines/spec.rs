// SPDX-License-Identifier: GPL-3.0-only

//! Fully resolved per-device capture descriptions
//!
//! A [`PipelineSpec`] is built once per device after negotiation and never
//! changes afterwards. Output paths are derived from the session base name,
//! so two specs in one session never share a file.

use super::filters::{FilterChain, overlay_filters, scale_filter};
use super::negotiation::VideoMode;
use crate::backends::camera::types::{AudioBackend, CaptureDevice, DeviceKind};
use crate::constants::RecordingMode;
use crate::constants::formats::input_format_for_fourcc;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a spawned process does with a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessRole {
    /// Writes the output file
    Capture,
    /// Shows a live window, never writes
    Preview,
}

impl std::fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessRole::Capture => f.write_str("capture"),
            ProcessRole::Preview => f.write_str("preview"),
        }
    }
}

/// Video-only parameters of a spec
#[derive(Debug, Clone, PartialEq)]
pub struct VideoParams {
    /// Position in the discovery order, used for the output name
    pub index: usize,
    pub mode: VideoMode,
    /// Capture tool input format (e.g. `mjpeg`)
    pub input_format: String,
    pub overlay: Option<String>,
    pub preview_scale: f64,
}

/// Immutable description of one capture pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSpec {
    device: CaptureDevice,
    mode: RecordingMode,
    output: PathBuf,
    video: Option<VideoParams>,
    forced_lossless: bool,
}

impl PipelineSpec {
    pub fn device(&self) -> &CaptureDevice {
        &self.device
    }

    pub fn mode(&self) -> RecordingMode {
        self.mode
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn video(&self) -> Option<&VideoParams> {
        self.video.as_ref()
    }

    pub fn audio_backend(&self) -> Option<AudioBackend> {
        match self.device.kind {
            DeviceKind::Audio(backend) => Some(backend),
            DeviceKind::Video => None,
        }
    }

    /// Whether an overlay switched this spec from raw to lossless
    pub fn forced_lossless(&self) -> bool {
        self.forced_lossless
    }

    /// Short label used in logs and reports
    pub fn label(&self) -> String {
        match &self.video {
            Some(video) => format!("cam{} {}", video.index, self.device.path),
            None => format!("audio {}", self.device.path),
        }
    }

    /// Filters applied for `role`
    ///
    /// The overlay is drawn for both roles; preview scaling only for preview.
    pub fn filter_chain(&self, role: ProcessRole) -> FilterChain {
        let mut chain = FilterChain::new();
        let Some(video) = &self.video else {
            return chain;
        };

        if let Some(text) = &video.overlay {
            for filter in overlay_filters(text) {
                chain.push(filter);
            }
        }
        if role == ProcessRole::Preview
            && let Some(scale) = scale_filter(video.preview_scale)
        {
            chain.push(scale);
        }
        chain
    }
}

/// Builds specs for one session
///
/// Every output of the session lands in `output_directory` and is named
/// after `base_name`.
#[derive(Debug, Clone)]
pub struct SpecBuilder {
    pub output_directory: PathBuf,
    pub base_name: String,
    /// Four-character input encoding negotiated with the devices
    pub input_fourcc: String,
    pub preview_scale: f64,
}

impl SpecBuilder {
    /// Build the spec for the video device at `index`
    ///
    /// Frames cannot be drawn on without decoding them, so an overlay turns
    /// a raw request into lossless. The result reports when that happened.
    pub fn build_video_spec(
        &self,
        device: &CaptureDevice,
        index: usize,
        mode: VideoMode,
        requested: RecordingMode,
        overlay: Option<&str>,
    ) -> PipelineSpec {
        let overlay = overlay
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string);

        let forced_lossless = overlay.is_some() && requested.is_stream_copy();
        let effective = if forced_lossless {
            info!(device = %device.path, "Overlay requested, recording lossless instead of raw");
            RecordingMode::Lossless
        } else {
            requested
        };

        let output = self.output_directory.join(format!(
            "{}_cam{}.{}",
            self.base_name,
            index,
            effective.video_extension()
        ));

        PipelineSpec {
            device: device.clone(),
            mode: effective,
            output,
            video: Some(VideoParams {
                index,
                mode,
                input_format: input_format_for_fourcc(&self.input_fourcc),
                overlay,
                preview_scale: self.preview_scale,
            }),
            forced_lossless,
        }
    }

    /// Build the spec for the session's audio device
    pub fn build_audio_spec(&self, device: &CaptureDevice, mode: RecordingMode) -> PipelineSpec {
        let output = self
            .output_directory
            .join(format!("{}_audio.{}", self.base_name, mode.audio_extension()));

        PipelineSpec {
            device: device.clone(),
            mode,
            output,
            video: None,
            forced_lossless: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{Framerate, Resolution};

    fn builder() -> SpecBuilder {
        SpecBuilder {
            output_directory: PathBuf::from("/rec"),
            base_name: "take1".to_string(),
            input_fourcc: "MJPG".to_string(),
            preview_scale: 0.5,
        }
    }

    fn hd() -> VideoMode {
        VideoMode::new(Resolution::new(1280, 720), Framerate::from_int(30))
    }

    #[test]
    fn test_raw_video_spec() {
        let device = CaptureDevice::video("/dev/video0", "Cam");
        let spec = builder().build_video_spec(&device, 0, hd(), RecordingMode::Raw, None);

        assert_eq!(spec.mode(), RecordingMode::Raw);
        assert_eq!(spec.output(), Path::new("/rec/take1_cam0.avi"));
        assert!(!spec.forced_lossless());
        assert_eq!(spec.video().unwrap().input_format, "mjpeg");
        assert!(spec.filter_chain(ProcessRole::Capture).is_empty());
    }

    #[test]
    fn test_overlay_forces_lossless() {
        let device = CaptureDevice::video("/dev/video2", "Cam");
        let spec = builder().build_video_spec(&device, 1, hd(), RecordingMode::Raw, Some("Lab A"));

        assert_eq!(spec.mode(), RecordingMode::Lossless);
        assert!(spec.forced_lossless());
        assert_eq!(spec.output(), Path::new("/rec/take1_cam1.mkv"));
        assert_eq!(spec.filter_chain(ProcessRole::Capture).len(), 2);
        assert_eq!(spec.filter_chain(ProcessRole::Preview).len(), 3);
    }

    #[test]
    fn test_overlay_override_is_idempotent() {
        let device = CaptureDevice::video("/dev/video0", "Cam");
        let from_raw = builder().build_video_spec(&device, 0, hd(), RecordingMode::Raw, Some("x"));
        let from_lossless =
            builder().build_video_spec(&device, 0, hd(), RecordingMode::Lossless, Some("x"));

        assert_eq!(from_raw.mode(), from_lossless.mode());
        assert_eq!(from_raw.output(), from_lossless.output());
        assert!(!from_lossless.forced_lossless());
    }

    #[test]
    fn test_blank_overlay_is_ignored() {
        let device = CaptureDevice::video("/dev/video0", "Cam");
        let spec = builder().build_video_spec(&device, 0, hd(), RecordingMode::Raw, Some("  "));
        assert_eq!(spec.mode(), RecordingMode::Raw);
        assert_eq!(spec.video().unwrap().overlay, None);
    }

    #[test]
    fn test_outputs_are_unique_and_deterministic() {
        let b = builder();
        let mut outputs: Vec<PathBuf> = (0..3)
            .map(|i| {
                let device = CaptureDevice::video(format!("/dev/video{}", i * 2), "Cam");
                b.build_video_spec(&device, i, hd(), RecordingMode::Lossless, None)
                    .output()
                    .to_path_buf()
            })
            .collect();
        let mic = CaptureDevice::audio("hw:2,0", "Mic", AudioBackend::Alsa);
        outputs.push(b.build_audio_spec(&mic, RecordingMode::Lossless).output().to_path_buf());

        let mut deduped = outputs.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), outputs.len());

        let again = b.build_audio_spec(&mic, RecordingMode::Lossless);
        assert_eq!(again.output(), Path::new("/rec/take1_audio.mkv"));
        assert_eq!(again.audio_backend(), Some(AudioBackend::Alsa));
        assert!(again.filter_chain(ProcessRole::Preview).is_empty());
    }
}
