// SPDX-License-Identifier: GPL-3.0-only
// Shared types for device discovery and capability negotiation

//! Shared types for capture devices

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How an audio device is addressed by the capture tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AudioBackend {
    /// Sound server source name (e.g. `alsa_input.usb-...`)
    Pulse,
    /// ALSA hardware address (e.g. `hw:2,0`)
    Alsa,
}

impl AudioBackend {
    /// Capture tool input format for this backend
    pub fn input_format(&self) -> &'static str {
        match self {
            AudioBackend::Pulse => "pulse",
            AudioBackend::Alsa => "alsa",
        }
    }
}

/// Kind of a capture device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceKind {
    Video,
    Audio(AudioBackend),
}

/// One physical USB input, discovered once per session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDevice {
    pub name: String,
    pub path: String, // Device node for video, source name or hw address for audio
    pub kind: DeviceKind,
}

impl CaptureDevice {
    pub fn video(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: DeviceKind::Video,
        }
    }

    pub fn audio(path: impl Into<String>, name: impl Into<String>, backend: AudioBackend) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: DeviceKind::Audio(backend),
        }
    }
}

impl std::fmt::Display for CaptureDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.name.is_empty() || self.name == self.path {
            write!(f, "{}", self.path)
        } else {
            write!(f, "{} ({})", self.name, self.path)
        }
    }
}

/// Frame size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Pixel area, the primary ranking key for auto-detection
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Resolution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
        let width: u32 = w.trim().parse().map_err(|_| format!("bad width in '{}'", s))?;
        let height: u32 = h.trim().parse().map_err(|_| format!("bad height in '{}'", s))?;
        if width == 0 || height == 0 {
            return Err(format!("resolution '{}' has a zero dimension", s));
        }
        Ok(Self { width, height })
    }
}

impl TryFrom<String> for Resolution {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Resolution> for String {
    fn from(value: Resolution) -> Self {
        value.to_string()
    }
}

/// Framerate as a fraction (numerator/denominator)
/// Stores exact framerate to handle NTSC rates like 29.97fps (30000/1001)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Framerate {
    pub num: u32,
    pub denom: u32,
}

impl Framerate {
    /// Create a new framerate from numerator and denominator
    pub fn new(num: u32, denom: u32) -> Self {
        Self {
            num,
            denom: if denom == 0 { 1 } else { denom },
        }
    }

    /// Create a framerate from an integer (e.g., 30 becomes 30/1)
    pub fn from_int(fps: u32) -> Self {
        Self { num: fps, denom: 1 }
    }

    /// Create a framerate from a decimal rate as printed by the format prober
    ///
    /// Whole rates become `n/1`, anything else keeps three decimals (29.970 -> 29970/1000).
    /// Rates that round to zero are rejected.
    pub fn from_fps(fps: f64) -> Option<Self> {
        if !fps.is_finite() || fps <= 0.0 {
            return None;
        }
        let rounded = fps.round();
        let rate = if (fps - rounded).abs() < 0.0005 {
            Self::from_int(rounded as u32)
        } else {
            Self::new((fps * 1000.0).round() as u32, 1000)
        };
        (rate.num > 0).then_some(rate)
    }

    /// Get the framerate as a floating point value
    pub fn as_f64(&self) -> f64 {
        self.num as f64 / self.denom as f64
    }

    /// Format for the capture tool (`30` or `29970/1000`)
    pub fn as_arg(&self) -> String {
        if self.denom == 1 {
            self.num.to_string()
        } else {
            format!("{}/{}", self.num, self.denom)
        }
    }
}

impl std::fmt::Display for Framerate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Show decimal for non-integer framerates (NTSC)
        if self.denom != 1 {
            write!(f, "{:.2}", self.as_f64())
        } else {
            write!(f, "{}", self.num)
        }
    }
}

impl Default for Framerate {
    fn default() -> Self {
        Self { num: 30, denom: 1 }
    }
}

impl FromStr for Framerate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_end_matches("fps").trim();
        if let Some((num, denom)) = s.split_once('/') {
            let num: u32 = num.trim().parse().map_err(|_| format!("bad framerate '{}'", s))?;
            let denom: u32 = denom.trim().parse().map_err(|_| format!("bad framerate '{}'", s))?;
            if num == 0 || denom == 0 {
                return Err(format!("framerate '{}' must be positive", s));
            }
            return Ok(Self::new(num, denom));
        }
        let fps: f64 = s.parse().map_err(|_| format!("bad framerate '{}'", s))?;
        Self::from_fps(fps).ok_or_else(|| format!("framerate '{}' must be positive", s))
    }
}

/// One discrete frame size and the discrete rates listed for it
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureMode {
    pub resolution: Resolution,
    pub framerates: Vec<Framerate>,
}

impl CaptureMode {
    /// Highest listed rate, if any
    pub fn max_framerate(&self) -> Option<Framerate> {
        self.framerates
            .iter()
            .copied()
            .fold(None, |best: Option<Framerate>, fps| match best {
                Some(b) if b.as_f64() >= fps.as_f64() => Some(b),
                _ => Some(fps),
            })
    }
}

/// Supported capture modes of a video device for one input encoding
#[derive(Debug, Clone, PartialEq)]
pub struct CapabilityProfile {
    pub pixel_format: String, // FourCC code (e.g., "MJPG", "YUYV")
    pub modes: Vec<CaptureMode>,
}

impl CapabilityProfile {
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }

    /// Largest pixel area, then that resolution's own highest rate
    ///
    /// Ties on area keep the first-seen mode. A mode listed without
    /// intervals yields `None` for the rate.
    pub fn best_mode(&self) -> Option<(Resolution, Option<Framerate>)> {
        let mut best: Option<&CaptureMode> = None;
        for mode in &self.modes {
            match best {
                Some(current) if current.resolution.area() >= mode.resolution.area() => {}
                _ => best = Some(mode),
            }
        }
        best.map(|mode| (mode.resolution, mode.max_framerate()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_parse() {
        assert_eq!("1920x1080".parse(), Ok(Resolution::new(1920, 1080)));
        assert_eq!(" 640X480 ".parse(), Ok(Resolution::new(640, 480)));
        assert!("1920".parse::<Resolution>().is_err());
        assert!("0x480".parse::<Resolution>().is_err());
    }

    #[test]
    fn test_framerate_from_fps() {
        assert_eq!(Framerate::from_fps(30.000), Some(Framerate::from_int(30)));
        assert_eq!(Framerate::from_fps(29.970), Some(Framerate::new(29970, 1000)));
        assert_eq!(Framerate::from_fps(0.0), None);
        assert_eq!(Framerate::from_fps(0.0001), None);
        assert_eq!(Framerate::new(29970, 1000).as_arg(), "29970/1000");
        assert_eq!(Framerate::from_int(60).as_arg(), "60");
    }

    #[test]
    fn test_framerate_parse() {
        assert_eq!("60".parse(), Ok(Framerate::from_int(60)));
        assert_eq!("30000/1001".parse(), Ok(Framerate::new(30000, 1001)));
        assert_eq!("25fps".parse(), Ok(Framerate::from_int(25)));
        assert!("fast".parse::<Framerate>().is_err());
    }

    #[test]
    fn test_best_mode_prefers_area_then_own_rate() {
        let profile = CapabilityProfile {
            pixel_format: "MJPG".to_string(),
            modes: vec![
                CaptureMode {
                    resolution: Resolution::new(640, 480),
                    framerates: vec![Framerate::from_int(30)],
                },
                CaptureMode {
                    resolution: Resolution::new(1280, 720),
                    framerates: vec![Framerate::from_int(60), Framerate::from_int(30)],
                },
                CaptureMode {
                    resolution: Resolution::new(1920, 1080),
                    framerates: vec![Framerate::from_int(15)],
                },
            ],
        };

        assert_eq!(
            profile.best_mode(),
            Some((Resolution::new(1920, 1080), Some(Framerate::from_int(15))))
        );
    }

    #[test]
    fn test_best_mode_keeps_first_on_tie() {
        let profile = CapabilityProfile {
            pixel_format: "MJPG".to_string(),
            modes: vec![
                CaptureMode {
                    resolution: Resolution::new(1600, 900),
                    framerates: vec![],
                },
                CaptureMode {
                    resolution: Resolution::new(900, 1600),
                    framerates: vec![Framerate::from_int(30)],
                },
            ],
        };

        assert_eq!(profile.best_mode(), Some((Resolution::new(1600, 900), None)));
    }
}
