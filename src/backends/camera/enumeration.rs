// SPDX-License-Identifier: GPL-3.0-only

//! Parsing of `v4l2-ctl` listings
//!
//! Both parsers are pure functions over the text the tool printed, so the
//! fragile part of discovery can be tested against captured output.

use super::types::{CapabilityProfile, CaptureDevice, CaptureMode, Framerate, Resolution};
use crate::backends::runner::ToolRunner;
use crate::constants::discovery::USB_MARKER;
use tracing::{debug, info};

/// Parse `v4l2-ctl --list-devices` into the primary node of each USB device
///
/// The listing groups nodes under a header line naming the card and bus:
///
/// ```text
/// HD Pro Webcam C920 (usb-0000:00:14.0-1):
///         /dev/video0
///         /dev/video1
///         /dev/media0
/// ```
///
/// Only headers whose bus mentions USB are kept, and only the first
/// `/dev/video*` node beneath each one (the rest are metadata nodes).
pub fn parse_device_list(text: &str) -> Vec<CaptureDevice> {
    let mut devices = Vec::new();
    let mut current_card: Option<String> = None;
    let mut taken = false;

    for line in text.lines() {
        if line.trim().is_empty() {
            current_card = None;
            continue;
        }

        let indented = line.starts_with(char::is_whitespace);
        if !indented {
            // Header: "Card Name (bus-info):"
            let header = line.trim().trim_end_matches(':');
            let is_usb = header
                .rfind('(')
                .map(|start| header[start..].to_ascii_lowercase().contains(USB_MARKER))
                .unwrap_or(false);
            current_card = if is_usb {
                let name = header
                    .rfind('(')
                    .map(|start| header[..start].trim())
                    .unwrap_or(header);
                Some(name.to_string())
            } else {
                debug!(header = %header, "Skipping non-USB device group");
                None
            };
            taken = false;
            continue;
        }

        let node = line.trim();
        if let Some(card) = current_card.as_ref()
            && !taken
            && node.starts_with("/dev/video")
        {
            debug!(card = %card, node = %node, "Found USB video node");
            devices.push(CaptureDevice::video(node, card.clone()));
            taken = true;
        }
    }

    devices
}

/// Parse `v4l2-ctl --list-formats-ext` for one four-character input encoding
///
/// ```text
///         [0]: 'MJPG' (Motion-JPEG, compressed)
///                 Size: Discrete 1280x720
///                         Interval: Discrete 0.017s (60.000 fps)
///                         Interval: Discrete 0.033s (30.000 fps)
/// ```
///
/// Entries for other encodings and stepwise sizes are ignored.
pub fn parse_format_listing(text: &str, fourcc: &str) -> CapabilityProfile {
    let wanted = fourcc.trim().to_ascii_uppercase();
    let mut modes: Vec<CaptureMode> = Vec::new();
    let mut in_wanted_format = false;
    let mut in_discrete_size = false;

    for line in text.lines() {
        let trimmed = line.trim();

        // Format header: [0]: 'MJPG' (Motion-JPEG, compressed)
        if trimmed.starts_with('[')
            && let Some(tag) = extract_quoted_tag(trimmed)
        {
            in_wanted_format = tag.to_ascii_uppercase() == wanted;
            in_discrete_size = false;
            continue;
        }

        if !in_wanted_format {
            continue;
        }

        if let Some(size) = trimmed.strip_prefix("Size:") {
            in_discrete_size = false;
            if let Some(dims) = size.trim().strip_prefix("Discrete")
                && let Ok(resolution) = dims.trim().parse::<Resolution>()
            {
                modes.push(CaptureMode {
                    resolution,
                    framerates: Vec::new(),
                });
                in_discrete_size = true;
            }
            continue;
        }

        // Interval: Discrete 0.033s (30.000 fps)
        if in_discrete_size
            && trimmed.starts_with("Interval:")
            && trimmed.contains("Discrete")
            && let Some(fps) = extract_fps(trimmed)
            && let Some(mode) = modes.last_mut()
            && !mode.framerates.contains(&fps)
        {
            mode.framerates.push(fps);
        }
    }

    CapabilityProfile {
        pixel_format: wanted,
        modes,
    }
}

/// Extract the quoted tag from a format header (`[1]: 'YUYV' (...)` -> `YUYV`)
fn extract_quoted_tag(line: &str) -> Option<&str> {
    let start = line.find('\'')?;
    let end = line[start + 1..].find('\'')?;
    Some(&line[start + 1..start + 1 + end])
}

/// Extract the rate from an interval line (`... (30.000 fps)` -> 30/1)
fn extract_fps(line: &str) -> Option<Framerate> {
    let start = line.rfind('(')?;
    let inner = line[start + 1..].trim_end_matches(')');
    let value = inner.trim().strip_suffix("fps")?.trim();
    Framerate::from_fps(value.parse().ok()?)
}

/// Query a device's capability profile for one input encoding
///
/// Returns None when the prober is missing, fails, or lists nothing for the
/// requested encoding.
pub fn query_formats(
    runner: &dyn ToolRunner,
    prober: &str,
    device: &CaptureDevice,
    fourcc: &str,
) -> Option<CapabilityProfile> {
    let stdout = runner.run(prober, &["-d", &device.path, "--list-formats-ext"])?;
    let profile = parse_format_listing(&stdout, fourcc);

    if profile.is_empty() {
        debug!(device = %device.path, fourcc, "No discrete modes for input format");
        None
    } else {
        info!(device = %device.path, fourcc, count = profile.modes.len(), "Enumerated capture modes");
        Some(profile)
    }
}
