// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use serde::{Deserialize, Serialize};

/// Recording mode
///
/// Decides the codec and container pair for every pipeline in a session.
/// `Raw` keeps the device's own stream where it can, `Lossless` re-encodes
/// with a mathematically reversible codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingMode {
    /// Stream copy for video, uncompressed PCM for audio (default)
    #[default]
    Raw,
    /// FFV1 video and FLAC audio in Matroska
    Lossless,
}

impl RecordingMode {
    /// Get all modes for iteration
    pub const ALL: [RecordingMode; 2] = [RecordingMode::Raw, RecordingMode::Lossless];

    /// Get display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            RecordingMode::Raw => "raw",
            RecordingMode::Lossless => "lossless",
        }
    }

    /// Capture tool video codec name
    pub fn video_codec(&self) -> &'static str {
        match self {
            RecordingMode::Raw => "copy",
            RecordingMode::Lossless => "ffv1",
        }
    }

    /// Capture tool audio codec name
    pub fn audio_codec(&self) -> &'static str {
        match self {
            RecordingMode::Raw => "pcm_s16le",
            RecordingMode::Lossless => "flac",
        }
    }

    /// File extension for video outputs
    pub fn video_extension(&self) -> &'static str {
        match self {
            RecordingMode::Raw => "avi",
            RecordingMode::Lossless => "mkv",
        }
    }

    /// File extension for audio outputs
    ///
    /// Lossless audio shares the Matroska container with lossless video.
    pub fn audio_extension(&self) -> &'static str {
        match self {
            RecordingMode::Raw => "wav",
            RecordingMode::Lossless => "mkv",
        }
    }

    /// Whether video frames pass through without being decoded
    pub fn is_stream_copy(&self) -> bool {
        matches!(self, RecordingMode::Raw)
    }
}

impl std::fmt::Display for RecordingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for RecordingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(RecordingMode::Raw),
            "lossless" => Ok(RecordingMode::Lossless),
            other => Err(format!("unknown recording mode '{}'", other)),
        }
    }
}

/// External program names
pub mod tools {
    /// Capture and encode tool
    pub const CAPTURE: &str = "ffmpeg";

    /// Live preview tool
    pub const PREVIEW: &str = "ffplay";

    /// V4L2 device lister and format prober
    pub const V4L2_CTL: &str = "v4l2-ctl";

    /// Sound server source lister
    pub const PACTL: &str = "pactl";

    /// ALSA card lister
    pub const ARECORD: &str = "arecord";
}

/// Video format constants
pub mod formats {
    /// Default four-character input encoding
    pub const DEFAULT_INPUT_FORMAT: &str = "MJPG";

    /// Default resolution when probing is disabled or fails
    pub const DEFAULT_RESOLUTION: (u32, u32) = (1280, 720);

    /// Default frame rate when probing is disabled or fails
    pub const DEFAULT_FRAMERATE: u32 = 30;

    /// Default capture tool input queue depth
    pub const DEFAULT_QUEUE_SIZE: u32 = 512;

    /// Map a four-character codec tag to the capture tool's input format name
    pub fn input_format_for_fourcc(fourcc: &str) -> String {
        match fourcc.trim().to_ascii_uppercase().as_str() {
            "MJPG" | "MJPEG" => "mjpeg".to_string(),
            "YUYV" | "YUY2" => "yuyv422".to_string(),
            "H264" => "h264".to_string(),
            "NV12" => "nv12".to_string(),
            other => other.to_ascii_lowercase(),
        }
    }
}

/// Overlay drawing constants
pub mod overlay {
    /// Font size for both overlay lines
    pub const FONT_SIZE: u32 = 24;

    /// Distance between the bottom edge and the timestamp line
    pub const BOTTOM_MARGIN: u32 = 16;

    /// Vertical spacing between the text and the timestamp line
    pub const LINE_SPACING: u32 = 8;
}

/// Timing constants
pub mod timing {
    /// How long a freshly spawned process must survive before it counts as started
    pub const LAUNCH_CHECK_MS: u64 = 300;

    /// Wait after interrupting before a stop counts as complete regardless
    pub const GRACE_PERIOD_MS: u64 = 5_000;

    /// Delay after stopping so muxers can flush their trailers
    pub const SETTLE_DELAY_MS: u64 = 1_000;

    /// Poll interval while waiting on processes, timers and operator input
    pub const POLL_INTERVAL_MS: u64 = 50;

    /// Length of the audio pre-flight capture
    pub const AUDIO_TEST_SECS: u32 = 1;
}

/// Discovery constants
pub mod discovery {
    /// Number of `/dev/videoN` nodes tried by the last-resort guess
    pub const GUESS_DEVICE_COUNT: usize = 2;

    /// Upper bound of `/dev/videoN` nodes probed over USB
    pub const PROBE_NODE_LIMIT: usize = 64;

    /// Marker for USB-attached entries in tool listings
    pub const USB_MARKER: &str = "usb";
}

/// Session control constants
pub mod session {
    /// Token the operator types to end a session
    pub const DEFAULT_STOP_TOKEN: &str = "q";

    /// Application directory name under the config and video directories
    pub const APP_DIR: &str = "usbrig";
}

/// Application information utilities
pub mod app_info {
    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("USBRIG_BUILD_VERSION")
    }
}
