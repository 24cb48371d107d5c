// SPDX-License-Identifier: MPL-2.0

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-changed=.git/refs/tags");
    println!("cargo::rerun-if-env-changed=USBRIG_VERSION");

    // Packagers may pin the version string explicitly
    let version = std::env::var("USBRIG_VERSION")
        .ok()
        .or_else(git_describe)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo::rustc-env=USBRIG_BUILD_VERSION={}", version);
}

/// `git describe` output with the leading `v` removed.
///
/// "v0.1.0" stays "0.1.0", "v0.1.0-5-gabcdef1" becomes "0.1.0+5.abcdef1".
fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let raw = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let raw = raw.strip_prefix('v').unwrap_or(&raw);

    let parts: Vec<&str> = raw.rsplitn(3, '-').collect();
    if parts.len() == 3 {
        let hash = parts[0].strip_prefix('g').unwrap_or(parts[0]);
        Some(format!("{}+{}.{}", parts[2], parts[1], hash))
    } else {
        Some(raw.to_string())
    }
}
