// SPDX-License-Identifier: GPL-3.0-only

use crate::backends::camera::types::{Framerate, Resolution};
use crate::constants::{RecordingMode, discovery, formats, session, timing, tools};
use crate::errors::ConfigError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Config file name inside the application config directory
const CONFIG_FILE: &str = "config.json";

/// Fallback output directory when no video directory is known
const FALLBACK_OUTPUT_DIR: &str = "recordings";

/// External program names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Capture tool (writes files)
    pub capture: String,
    /// Preview tool (opens windows)
    pub preview: String,
    /// Video device lister and format prober
    pub v4l2_ctl: String,
    /// Sound server source lister
    pub pactl: String,
    /// ALSA card lister
    pub arecord: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            capture: tools::CAPTURE.to_string(),
            preview: tools::PREVIEW.to_string(),
            v4l2_ctl: tools::V4L2_CTL.to_string(),
            pactl: tools::PACTL.to_string(),
            arecord: tools::ARECORD.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory every output file is written to
    pub output_directory: Option<PathBuf>,
    /// Prefix shared by all outputs of a session
    pub base_name: Option<String>,
    /// Codec/container pair (raw or lossless)
    pub mode: RecordingMode,
    /// Mode used when auto-detection is off or finds nothing
    pub default_resolution: Resolution,
    pub default_framerate: u32,
    /// Four-character input encoding requested from cameras
    pub input_format: String,
    /// Probe each camera for its best mode
    pub auto_detect: bool,
    /// Text drawn above a timestamp on every video
    pub overlay_text: Option<String>,
    /// Open a live window per camera
    pub preview: bool,
    /// Preview window scale factor
    pub preview_scale: f64,
    /// Fixed recording length; operator-stopped when unset
    pub duration_secs: Option<u64>,
    pub queue_size: u32,
    /// Run a short capture on the audio device before recording
    pub test_audio: bool,
    pub audio_enabled: bool,
    /// Nodes tried by the last-resort device guess
    pub guess_device_count: usize,
    /// Line the operator types to end the session
    pub stop_token: String,
    pub grace_period_ms: u64,
    pub settle_delay_ms: u64,
    pub launch_check_ms: u64,
    pub tools: ToolConfig,
}

impl Default for Config {
    fn default() -> Self {
        let (width, height) = formats::DEFAULT_RESOLUTION;
        Self {
            output_directory: None,
            base_name: None,
            mode: RecordingMode::default(),
            default_resolution: Resolution::new(width, height),
            default_framerate: formats::DEFAULT_FRAMERATE,
            input_format: formats::DEFAULT_INPUT_FORMAT.to_string(),
            auto_detect: true,
            overlay_text: None,
            preview: false,
            preview_scale: 1.0,
            duration_secs: None,
            queue_size: formats::DEFAULT_QUEUE_SIZE,
            test_audio: true,
            audio_enabled: true,
            guess_device_count: discovery::GUESS_DEVICE_COUNT,
            stop_token: session::DEFAULT_STOP_TOKEN.to_string(),
            grace_period_ms: timing::GRACE_PERIOD_MS,
            settle_delay_ms: timing::SETTLE_DELAY_MS,
            launch_check_ms: timing::LAUNCH_CHECK_MS,
            tools: ToolConfig::default(),
        }
    }
}

impl Config {
    /// Default config file location (`<config_dir>/usbrig/config.json`)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(session::APP_DIR).join(CONFIG_FILE))
    }

    /// Load configuration
    ///
    /// An explicit `path` must exist. Without one the default location is
    /// read if present, otherwise built-in defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => {
                    debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text)?;
        info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Reject settings no session could run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.base_name {
            if base.trim().is_empty() {
                return Err(ConfigError::invalid("base name is empty"));
            }
            if base.contains('/') || base.contains(std::path::MAIN_SEPARATOR) {
                return Err(ConfigError::invalid(format!(
                    "base name '{}' contains a path separator",
                    base
                )));
            }
        }
        if !self.preview_scale.is_finite() || self.preview_scale <= 0.0 {
            return Err(ConfigError::invalid(format!(
                "preview scale {} must be positive",
                self.preview_scale
            )));
        }
        if self.default_framerate == 0 {
            return Err(ConfigError::invalid("default frame rate must be positive"));
        }
        if self.input_format.len() != 4 || !self.input_format.is_ascii() {
            return Err(ConfigError::invalid(format!(
                "input format '{}' must be a four-character code",
                self.input_format
            )));
        }
        if self.stop_token.trim().is_empty() {
            return Err(ConfigError::invalid("stop token is empty"));
        }
        Ok(())
    }

    /// Output directory, resolved once per session
    pub fn resolved_output_directory(&self) -> PathBuf {
        self.output_directory.clone().unwrap_or_else(|| {
            dirs::video_dir()
                .map(|dir| dir.join(session::APP_DIR))
                .unwrap_or_else(|| PathBuf::from(FALLBACK_OUTPUT_DIR))
        })
    }

    /// Base name, or `recording_<timestamp>` when none is configured
    pub fn resolved_base_name(&self) -> String {
        match &self.base_name {
            Some(base) => base.trim().to_string(),
            None => format!("recording_{}", Local::now().format("%Y%m%d_%H%M%S")),
        }
    }

    pub fn default_framerate(&self) -> Framerate {
        Framerate::from_int(self.default_framerate)
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_secs.map(Duration::from_secs)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn launch_check(&self) -> Duration {
        Duration::from_millis(self.launch_check_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"mode": "lossless", "default_resolution": "640x480"}"#).unwrap();
        assert_eq!(config.mode, RecordingMode::Lossless);
        assert_eq!(config.default_resolution, Resolution::new(640, 480));
        assert_eq!(config.stop_token, "q");
        assert_eq!(config.tools, ToolConfig::default());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases: Vec<Box<dyn Fn(&mut Config)>> = vec![
            Box::new(|c| c.base_name = Some(String::new())),
            Box::new(|c| c.base_name = Some("a/b".to_string())),
            Box::new(|c| c.preview_scale = 0.0),
            Box::new(|c| c.preview_scale = f64::NAN),
            Box::new(|c| c.default_framerate = 0),
            Box::new(|c| c.input_format = "MJPEG".to_string()),
            Box::new(|c| c.stop_token = " ".to_string()),
        ];
        for mutate in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert!(config.validate().is_err(), "{:?} should be invalid", config);
        }
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_generated_base_name() {
        let name = Config::default().resolved_base_name();
        assert!(name.starts_with("recording_"));
        assert_eq!(name.len(), "recording_".len() + 15);
    }
}
