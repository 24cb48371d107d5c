// SPDX-License-Identifier: MPL-2.0

//! Shared helpers for integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use usbrig::backends::runner::ToolRunner;

/// Write an executable stand-in for the capture tool
///
/// It records its arguments into the file named by its last argument, then
/// sleeps until interrupted.
pub fn fake_capture_tool(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "fake-ffmpeg",
        "#!/bin/sh\nfor last; do :; done\nprintf '%s\\n' \"$*\" > \"$last\"\nexec sleep 30\n",
    )
}

/// Capture stand-in that also writes its pid next to its output file
pub fn pid_reporting_capture_tool(dir: &Path) -> PathBuf {
    write_script(
        dir,
        "pid-ffmpeg",
        "#!/bin/sh\nfor last; do :; done\nprintf '%s\\n' \"$*\" > \"$last\"\necho $$ > \"$last.pid\"\nexec sleep 30\n",
    )
}

/// Capture stand-in that ignores the interrupt signal
pub fn stubborn_capture_tool(dir: &Path) -> PathBuf {
    write_script(dir, "stubborn-ffmpeg", "#!/bin/sh\ntrap '' INT\nexec sleep 30\n")
}

/// Preview stand-in writing its arguments, one per line, into `log_dir`
pub fn fake_preview_tool(dir: &Path, log_dir: &Path) -> PathBuf {
    let body = format!(
        "#!/bin/sh\nprintf '%s\\n' \"$@\" > \"{}/preview_$$.args\"\nexec sleep 30\n",
        log_dir.display()
    );
    write_script(dir, "fake-ffplay", &body)
}

/// Device lister stand-in printing `listing`
pub fn device_lister_tool(dir: &Path, listing: &str) -> PathBuf {
    let body = format!("#!/bin/sh\ncat <<'EOF'\n{}EOF\n", listing);
    write_script(dir, "fake-v4l2-ctl", &body)
}

/// Write an executable that succeeds right away
pub fn finishing_tool(dir: &Path) -> PathBuf {
    write_script(dir, "done-tool", "#!/bin/sh\nexit 0\n")
}

/// Write an executable that fails after outliving the launch check
pub fn crashing_tool(dir: &Path) -> PathBuf {
    write_script(dir, "crash-tool", "#!/bin/sh\nsleep 1\nexit 1\n")
}

/// Write an executable that fails right away
pub fn failing_tool(dir: &Path) -> PathBuf {
    write_script(dir, "fail-tool", "#!/bin/sh\nexit 3\n")
}

fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    let mut permissions = std::fs::metadata(&path).unwrap().permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(&path, permissions).unwrap();
    path
}

/// Tool runner answering from canned output
#[derive(Default)]
pub struct CannedRunner {
    responses: HashMap<String, String>,
}

impl CannedRunner {
    pub fn with(mut self, program: &str, args: &[&str], stdout: &str) -> Self {
        self.responses
            .insert(format!("{} {}", program, args.join(" ")), stdout.to_string());
        self
    }
}

impl ToolRunner for CannedRunner {
    fn run(&self, program: &str, args: &[&str]) -> Option<String> {
        self.responses
            .get(&format!("{} {}", program, args.join(" ")))
            .cloned()
    }
}

/// `v4l2-ctl --list-devices` output with two USB cameras
pub const TWO_CAMERAS: &str = "\
HD Pro Webcam C920 (usb-0000:00:14.0-1):
\t/dev/video0
\t/dev/video1

USB Camera (usb-0000:00:14.0-2):
\t/dev/video2
\t/dev/video3
";

/// `pactl list short sources` output with one USB microphone
pub const ONE_MICROPHONE: &str =
    "61\talsa_input.usb-Blue_Yeti-00.analog-stereo\tPipeWire\ts16le 2ch 48000Hz\tIDLE\n";

pub const MICROPHONE: &str = "alsa_input.usb-Blue_Yeti-00.analog-stereo";
