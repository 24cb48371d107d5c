// SPDX-License-Identifier: GPL-3.0-only

//! Direct V4L2 queries used when the device lister is unavailable
//!
//! Two discovery tiers live here: a sysfs walk that follows each video node
//! back to its bus, and a `VIDIOC_QUERYCAP` probe of `/dev/videoN` nodes.

use super::types::CaptureDevice;
use crate::constants::discovery::USB_MARKER;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use tracing::debug;

/// VIDIOC_QUERYCAP ioctl number
const VIDIOC_QUERYCAP: libc::c_ulong = 0x80685600;

/// V4L2 capability flag for single-planar video capture
const V4L2_CAP_VIDEO_CAPTURE: u32 = 0x00000001;

/// Default sysfs class directory for video nodes
pub const SYSFS_VIDEO4LINUX: &str = "/sys/class/video4linux";

/// V4L2 capability structure for VIDIOC_QUERYCAP ioctl
#[repr(C)]
struct V4l2Capability {
    driver: [u8; 16],
    card: [u8; 32],
    bus_info: [u8; 32],
    version: u32,
    capabilities: u32,
    device_caps: u32,
    reserved: [u32; 3],
}

/// What `VIDIOC_QUERYCAP` reports about a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCapability {
    pub card: String,
    pub bus_info: String,
    pub caps: u32,
}

impl NodeCapability {
    /// USB-attached node that can capture video frames
    pub fn is_usb_capture(&self) -> bool {
        self.bus_info.starts_with(USB_MARKER) && self.caps & V4L2_CAP_VIDEO_CAPTURE != 0
    }
}

fn c_string(bytes: &[u8]) -> String {
    let len = bytes.iter().position(|&c| c == 0).unwrap_or(bytes.len());
    String::from_utf8_lossy(&bytes[..len]).to_string()
}

/// Issue `VIDIOC_QUERYCAP` on an open file descriptor
fn query_v4l2_cap(fd: RawFd) -> Option<V4l2Capability> {
    let mut cap: V4l2Capability = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(fd, VIDIOC_QUERYCAP as _, &mut cap as *mut V4l2Capability) };
    if result < 0 { None } else { Some(cap) }
}

/// Query a device node's card name, bus and capabilities
///
/// Returns None if the node cannot be opened or the ioctl fails.
pub fn query_node(device_path: &str) -> Option<NodeCapability> {
    let file = std::fs::File::open(device_path).ok()?;
    let cap = query_v4l2_cap(file.as_raw_fd())?;

    // Use device_caps if available, otherwise capabilities
    let caps = if cap.device_caps != 0 {
        cap.device_caps
    } else {
        cap.capabilities
    };

    let node = NodeCapability {
        card: c_string(&cap.card),
        bus_info: c_string(&cap.bus_info),
        caps,
    };
    debug!(device_path, card = %node.card, bus = %node.bus_info, "Queried V4L2 node");
    Some(node)
}

/// Probe `/dev/video0..limit` over the USB link
pub fn probe_usb_nodes(limit: usize) -> Vec<CaptureDevice> {
    let mut devices = Vec::new();

    for index in 0..limit {
        let path = format!("/dev/video{}", index);
        if !Path::new(&path).exists() {
            continue;
        }
        match query_node(&path) {
            Some(node) if node.is_usb_capture() => {
                debug!(path = %path, card = %node.card, "USB capture node");
                devices.push(CaptureDevice::video(path, node.card));
            }
            Some(_) => debug!(path = %path, "Skipping non-USB or non-capture node"),
            None => debug!(path = %path, "Node did not answer VIDIOC_QUERYCAP"),
        }
    }

    devices
}

/// Numeric suffix of a `videoN` entry name
fn video_index(name: &str) -> Option<u32> {
    name.strip_prefix("video")?.parse().ok()
}

fn read_trimmed(path: PathBuf) -> Option<String> {
    std::fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
}

/// Walk the sysfs video class and keep primary nodes whose device hangs off a USB bus
///
/// `root` is normally [`SYSFS_VIDEO4LINUX`]. UVC cameras register a metadata
/// node next to the capture node; only the node with `index` 0 is kept.
pub fn scan_usb_topology(root: &Path) -> Vec<CaptureDevice> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(root = %root.display(), error = %e, "sysfs video class not readable");
            return Vec::new();
        }
    };

    let mut nodes: Vec<(u32, String)> = entries
        .flatten()
        .filter_map(|entry| {
            let name = entry.file_name().to_string_lossy().to_string();
            video_index(&name).map(|n| (n, name))
        })
        .collect();
    nodes.sort();

    let mut devices = Vec::new();
    for (_, name) in nodes {
        let entry = root.join(&name);

        // Read the device symlink to find the bus hierarchy
        let resolved = match std::fs::canonicalize(entry.join("device")) {
            Ok(p) => p.to_string_lossy().to_string(),
            Err(_) => continue,
        };
        if !resolved.contains("/usb") {
            debug!(node = %name, device = %resolved, "Not on a USB bus");
            continue;
        }

        if let Some(index) = read_trimmed(entry.join("index"))
            && index != "0"
        {
            debug!(node = %name, index = %index, "Skipping secondary node");
            continue;
        }

        let card = read_trimmed(entry.join("name")).unwrap_or_default();
        devices.push(CaptureDevice::video(format!("/dev/{}", name), card));
    }

    devices
}
