// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Listing USB capture devices
//! - Running a recording session

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use usbrig::backends::audio::AudioDiscovery;
use usbrig::backends::camera::VideoDiscovery;
use usbrig::backends::runner::SystemRunner;
use usbrig::pipelines::{Negotiator, VideoMode};
use usbrig::session::{ConsoleOperator, Operator, ScriptedOperator, SessionReport};
use usbrig::{AppResult, Config, SessionController};

/// List USB video devices with their best mode, and USB audio sources
pub fn list_devices(config: &Config) -> AppResult<()> {
    let runner = SystemRunner;
    let discovery = VideoDiscovery {
        lister: config.tools.v4l2_ctl.clone(),
        guess_count: config.guess_device_count,
        ..VideoDiscovery::default()
    };
    let negotiator = Negotiator {
        prober: config.tools.v4l2_ctl.clone(),
        input_format: config.input_format.clone(),
        defaults: VideoMode::new(config.default_resolution, config.default_framerate()),
        auto_detect: true,
    };

    match discovery.discover(&runner) {
        Ok(devices) => {
            println!("Video devices:");
            println!();
            for (index, device) in devices.iter().enumerate() {
                println!("  [{}] {}", index, device);
                println!(
                    "      Best {}: {}",
                    config.input_format,
                    negotiator.negotiate(&runner, device)
                );
            }
        }
        Err(e) => println!("{}.", e),
    }
    println!();

    let audio = AudioDiscovery {
        sound_server: config.tools.pactl.clone(),
        mixer: config.tools.arecord.clone(),
    }
    .candidates(&runner);
    if audio.is_empty() {
        println!("No USB audio devices found.");
    } else {
        println!("Audio devices:");
        println!();
        for (index, device) in audio.iter().enumerate() {
            println!("  [{}] {}", index, device);
        }
    }

    Ok(())
}

/// Run a recording session and print what it produced
pub fn record(config: Config, unattended: bool) -> AppResult<()> {
    // Set up Ctrl+C handler
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel.clone();
    ctrlc::set_handler(move || {
        cancel_clone.store(true, Ordering::SeqCst);
    })?;

    let runner = SystemRunner;
    let mut console;
    let mut scripted;
    let operator: &mut dyn Operator = if unattended {
        scripted = ScriptedOperator::unattended();
        &mut scripted
    } else {
        console = ConsoleOperator::new(cancel.clone());
        &mut console
    };

    if unattended && config.duration_secs.is_none() {
        println!("No duration set, press Ctrl+C to stop.");
    }

    let report = SessionController::new(config, &runner, operator, cancel).run()?;
    print_report(&report);
    Ok(())
}

fn print_report(report: &SessionReport) {
    println!();
    println!("Session ended ({})", report.stop_reason);
    println!("Output directory: {}", report.output_directory.display());

    if report.files.is_empty() {
        println!("No output files found for '{}'.", report.base_name);
    } else {
        println!("Files:");
        for file in &report.files {
            let name = file
                .path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default();
            println!("  {} ({})", name, format_size(file.size));
        }
    }

    if !report.failed.is_empty() {
        println!("Failed to start:");
        for failure in &report.failed {
            println!("  {} ({}): {}", failure.label, failure.role, failure.error);
        }
    }
    if report.audio_skipped {
        println!("Audio was skipped.");
    }
    if !report.shutdown.is_clean() {
        println!(
            "Still running after shutdown: {}",
            report.shutdown.lingering.join(", ")
        );
    }
}

/// Human-readable byte count
fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
