// SPDX-License-Identifier: MPL-2.0

//! Video device discovery
//!
//! Discovery runs a chain of progressively cruder strategies and stops at
//! the first one that finds anything:
//!
//! ```text
//! ┌──────────────────────┐
//! │ v4l2-ctl listing     │  USB groups from --list-devices
//! └──────────┬───────────┘
//!            │ empty
//!            ▼
//! ┌──────────────────────┐
//! │ sysfs USB topology   │  /sys/class/video4linux/*/device
//! └──────────┬───────────┘
//!            │ empty
//!            ▼
//! ┌──────────────────────┐
//! │ USB link probe       │  VIDIOC_QUERYCAP on /dev/videoN
//! └──────────┬───────────┘
//!            │ empty
//!            ▼
//! ┌──────────────────────┐
//! │ sequential guess     │  /dev/video0..N-1 that exist
//! └──────────────────────┘
//! ```
//!
//! Tiers never run in parallel and their results are never merged.

pub mod enumeration;
pub mod types;
pub mod v4l2_utils;

pub use types::*;

use crate::backends::runner::ToolRunner;
use crate::constants::discovery::{GUESS_DEVICE_COUNT, PROBE_NODE_LIMIT};
use crate::errors::DiscoveryError;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Where and how far each discovery tier looks
#[derive(Debug, Clone)]
pub struct VideoDiscovery {
    /// Device lister program
    pub lister: String,
    /// sysfs video class directory
    pub sysfs_root: PathBuf,
    /// Directory holding `videoN` device nodes
    pub dev_root: PathBuf,
    /// Number of nodes the USB link probe tries
    pub probe_limit: usize,
    /// Number of nodes the last-resort guess tries
    pub guess_count: usize,
}

impl Default for VideoDiscovery {
    fn default() -> Self {
        Self {
            lister: crate::constants::tools::V4L2_CTL.to_string(),
            sysfs_root: PathBuf::from(v4l2_utils::SYSFS_VIDEO4LINUX),
            dev_root: PathBuf::from("/dev"),
            probe_limit: PROBE_NODE_LIMIT,
            guess_count: GUESS_DEVICE_COUNT,
        }
    }
}

/// Turn an empty tier result into `None` so tiers chain with `or_else`
fn non_empty(devices: Vec<CaptureDevice>) -> Option<Vec<CaptureDevice>> {
    if devices.is_empty() { None } else { Some(devices) }
}

impl VideoDiscovery {
    /// Discover USB video devices in a stable order
    ///
    /// Fails only when every tier came back empty.
    pub fn discover(&self, runner: &dyn ToolRunner) -> Result<Vec<CaptureDevice>, DiscoveryError> {
        let devices = self
            .try_device_lister(runner)
            .or_else(|| self.try_usb_topology())
            .or_else(|| self.try_usb_probe())
            .or_else(|| self.try_sequential_guess());

        match devices {
            Some(devices) => {
                info!(count = devices.len(), "Discovered video devices");
                Ok(devices)
            }
            None => {
                warn!("No video devices found by any discovery tier");
                Err(DiscoveryError::NoVideoDevices)
            }
        }
    }

    fn try_device_lister(&self, runner: &dyn ToolRunner) -> Option<Vec<CaptureDevice>> {
        debug!(lister = %self.lister, "Trying device lister");
        let stdout = runner.run(&self.lister, &["--list-devices"])?;
        non_empty(enumeration::parse_device_list(&stdout))
    }

    fn try_usb_topology(&self) -> Option<Vec<CaptureDevice>> {
        debug!(root = %self.sysfs_root.display(), "Trying USB topology scan");
        non_empty(v4l2_utils::scan_usb_topology(&self.sysfs_root))
    }

    fn try_usb_probe(&self) -> Option<Vec<CaptureDevice>> {
        if self.probe_limit == 0 {
            return None;
        }
        debug!(limit = self.probe_limit, "Trying USB link probe");
        non_empty(v4l2_utils::probe_usb_nodes(self.probe_limit))
    }

    fn try_sequential_guess(&self) -> Option<Vec<CaptureDevice>> {
        debug!(count = self.guess_count, "Guessing sequential device nodes");
        let guessed: Vec<CaptureDevice> = (0..self.guess_count)
            .map(|n| self.dev_root.join(format!("video{}", n)))
            .filter(|path| path.exists())
            .map(|path| {
                let path = path.to_string_lossy().to_string();
                CaptureDevice::video(path.clone(), path)
            })
            .collect();

        if !guessed.is_empty() {
            warn!(count = guessed.len(), "Using guessed device nodes");
        }
        non_empty(guessed)
    }
}
