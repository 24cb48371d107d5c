// SPDX-License-Identifier: GPL-3.0-only

//! Command lines for capture and preview processes

use super::spec::{PipelineSpec, ProcessRole};
use crate::constants::formats::DEFAULT_QUEUE_SIZE;
use crate::constants::tools;
use std::time::Duration;

/// Settings shared by every process a session launches
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub capture_tool: String,
    pub preview_tool: String,
    /// Input queue depth hint for the capture tool
    pub queue_size: u32,
    /// Fixed recording length handed to the capture tool
    pub duration: Option<Duration>,
    /// How long a fresh process is watched for an immediate exit
    pub launch_check: Duration,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            capture_tool: tools::CAPTURE.to_string(),
            preview_tool: tools::PREVIEW.to_string(),
            queue_size: DEFAULT_QUEUE_SIZE,
            duration: None,
            launch_check: Duration::from_millis(crate::constants::timing::LAUNCH_CHECK_MS),
        }
    }
}

/// Program and arguments for one process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ProcessCommand {
    /// Build the command for `spec` in `role`
    ///
    /// Returns None for a preview of an audio pipeline.
    pub fn for_spec(spec: &PipelineSpec, role: ProcessRole, options: &LaunchOptions) -> Option<Self> {
        match role {
            ProcessRole::Capture => Some(Self {
                program: options.capture_tool.clone(),
                args: capture_args(spec, options),
            }),
            ProcessRole::Preview => Some(Self {
                program: options.preview_tool.clone(),
                args: preview_args(spec, options)?,
            }),
        }
    }
}

/// Format a duration the way the capture tool's `-t` reads it
fn duration_arg(duration: Duration) -> String {
    if duration.subsec_nanos() == 0 {
        duration.as_secs().to_string()
    } else {
        format!("{:.3}", duration.as_secs_f64())
    }
}

/// Arguments for the capture tool writing `spec`'s output file
pub fn capture_args(spec: &PipelineSpec, options: &LaunchOptions) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-loglevel", "error", "-nostdin", "-y"]
        .into_iter()
        .map(String::from)
        .collect();

    let mut push = |flag: &str, value: String| {
        args.push(flag.to_string());
        args.push(value);
    };

    match spec.video() {
        Some(video) => {
            push("-f", "v4l2".to_string());
            push("-thread_queue_size", options.queue_size.to_string());
            push("-input_format", video.input_format.clone());
            push("-video_size", video.mode.resolution.to_string());
            push("-framerate", video.mode.framerate.as_arg());
            push("-i", spec.device().path.clone());
            if let Some(filters) = spec.filter_chain(ProcessRole::Capture).to_arg() {
                push("-vf", filters);
            }
            push("-c:v", spec.mode().video_codec().to_string());
        }
        None => {
            let format = spec.audio_backend().map(|b| b.input_format()).unwrap_or("alsa");
            push("-f", format.to_string());
            push("-thread_queue_size", options.queue_size.to_string());
            push("-i", spec.device().path.clone());
            push("-c:a", spec.mode().audio_codec().to_string());
        }
    }

    if let Some(duration) = options.duration {
        push("-t", duration_arg(duration));
    }

    args.push(spec.output().to_string_lossy().into_owned());
    args
}

/// Arguments for a live preview window of a video pipeline
pub fn preview_args(spec: &PipelineSpec, options: &LaunchOptions) -> Option<Vec<String>> {
    let video = spec.video()?;

    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "error".into(),
        "-window_title".into(),
        format!("cam{} {}", video.index, spec.device().path),
        "-f".into(),
        "v4l2".into(),
        "-input_format".into(),
        video.input_format.clone(),
        "-video_size".into(),
        video.mode.resolution.to_string(),
        "-framerate".into(),
        video.mode.framerate.as_arg(),
    ];

    if let Some(filters) = spec.filter_chain(ProcessRole::Preview).to_arg() {
        args.push("-vf".into());
        args.push(filters);
    }
    if let Some(duration) = options.duration {
        args.push("-t".into());
        args.push(duration_arg(duration));
    }

    args.push(spec.device().path.clone());
    Some(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::camera::types::{AudioBackend, CaptureDevice, Framerate, Resolution};
    use crate::constants::RecordingMode;
    use crate::pipelines::negotiation::VideoMode;
    use crate::pipelines::spec::SpecBuilder;
    use std::path::PathBuf;

    fn builder() -> SpecBuilder {
        SpecBuilder {
            output_directory: PathBuf::from("/rec"),
            base_name: "s".to_string(),
            input_fourcc: "MJPG".to_string(),
            preview_scale: 0.5,
        }
    }

    fn video_spec(overlay: Option<&str>) -> PipelineSpec {
        let mode = VideoMode::new(Resolution::new(1920, 1080), Framerate::from_int(15));
        builder().build_video_spec(
            &CaptureDevice::video("/dev/video0", "Cam"),
            0,
            mode,
            RecordingMode::Raw,
            overlay,
        )
    }

    #[test]
    fn test_raw_video_capture_args() {
        let options = LaunchOptions {
            duration: Some(Duration::from_secs(5)),
            ..Default::default()
        };
        let args = capture_args(&video_spec(None), &options);
        let expected: Vec<&str> = vec![
            "-hide_banner", "-loglevel", "error", "-nostdin", "-y",
            "-f", "v4l2", "-thread_queue_size", "512", "-input_format", "mjpeg",
            "-video_size", "1920x1080", "-framerate", "15", "-i", "/dev/video0",
            "-c:v", "copy", "-t", "5", "/rec/s_cam0.avi",
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn test_overlay_capture_args_carry_filters() {
        let args = capture_args(&video_spec(Some("Lab")), &LaunchOptions::default());
        let vf = args.iter().position(|a| a == "-vf").unwrap();
        assert!(args[vf + 1].contains("drawtext=expansion=none:text=Lab:"));
        assert!(!args[vf + 1].contains("scale="));
        assert!(args.contains(&"ffv1".to_string()));
        assert_eq!(args.last().unwrap(), "/rec/s_cam0.mkv");
        assert!(!args.contains(&"-t".to_string()));
    }

    #[test]
    fn test_audio_capture_args() {
        let mic = CaptureDevice::audio("alsa_input.usb-mic", "Mic", AudioBackend::Pulse);
        let spec = builder().build_audio_spec(&mic, RecordingMode::Lossless);
        let args = capture_args(&spec, &LaunchOptions::default());
        let tail: Vec<&str> = args[5..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "-f", "pulse", "-thread_queue_size", "512", "-i", "alsa_input.usb-mic",
                "-c:a", "flac", "/rec/s_audio.mkv",
            ]
        );
    }

    #[test]
    fn test_preview_reads_device_and_scales() {
        let command =
            ProcessCommand::for_spec(&video_spec(None), ProcessRole::Preview, &LaunchOptions::default())
                .unwrap();
        assert_eq!(command.program, "ffplay");
        assert_eq!(command.args.last().unwrap(), "/dev/video0");
        let vf = command.args.iter().position(|a| a == "-vf").unwrap();
        assert_eq!(command.args[vf + 1], "scale=iw*0.5:ih*0.5");
        assert!(!command.args.iter().any(|a| a.ends_with(".avi")));
    }

    #[test]
    fn test_audio_has_no_preview() {
        let mic = CaptureDevice::audio("hw:1,0", "Mic", AudioBackend::Alsa);
        let spec = builder().build_audio_spec(&mic, RecordingMode::Raw);
        assert!(ProcessCommand::for_spec(&spec, ProcessRole::Preview, &LaunchOptions::default()).is_none());
    }

    #[test]
    fn test_fractional_duration() {
        assert_eq!(duration_arg(Duration::from_millis(2500)), "2.500");
    }
}
