// SPDX-License-Identifier: MPL-2.0

//! Integration tests for process supervision

mod common;

use std::path::PathBuf;
use std::time::{Duration, Instant};
use usbrig::RecordingMode;
use usbrig::backends::camera::types::{AudioBackend, CaptureDevice, Framerate, Resolution};
use usbrig::errors::LaunchError;
use usbrig::pipelines::{
    LaunchOptions, ProcessCommand, ProcessRole, ProcessSupervisor, SpecBuilder, VideoMode,
};

fn options(capture_tool: &std::path::Path) -> LaunchOptions {
    LaunchOptions {
        capture_tool: capture_tool.to_string_lossy().to_string(),
        duration: Some(Duration::from_secs(5)),
        launch_check: Duration::from_millis(300),
        ..Default::default()
    }
}

fn builder(dir: PathBuf) -> SpecBuilder {
    SpecBuilder {
        output_directory: dir,
        base_name: "take".to_string(),
        input_fourcc: "MJPG".to_string(),
        preview_scale: 1.0,
    }
}

#[test]
fn test_stop_all_without_processes_returns_immediately() {
    let mut supervisor = ProcessSupervisor::new(LaunchOptions::default());
    let start = Instant::now();
    let report = supervisor.stop_all(Duration::from_secs(5));
    assert!(start.elapsed() < Duration::from_secs(1));
    assert!(report.exited.is_empty());
    assert!(report.is_clean());
}

#[test]
fn test_stop_all_interrupts_and_is_idempotent() {
    let tmp = tempfile::tempdir().unwrap();
    let tool = common::fake_capture_tool(tmp.path());
    let mut supervisor = ProcessSupervisor::new(options(&tool));

    let b = builder(tmp.path().to_path_buf());
    let mode = VideoMode::new(Resolution::new(640, 480), Framerate::from_int(30));
    let cam = b.build_video_spec(
        &CaptureDevice::video("/dev/video0", "Cam"),
        0,
        mode,
        RecordingMode::Raw,
        None,
    );
    let mic = b.build_audio_spec(
        &CaptureDevice::audio("hw:1,0", "Mic", AudioBackend::Alsa),
        RecordingMode::Raw,
    );

    supervisor.launch(&cam, ProcessRole::Capture).unwrap();
    supervisor.launch(&mic, ProcessRole::Capture).unwrap();
    assert!(supervisor.confirm_started().is_empty());
    assert_eq!(supervisor.processes().len(), 2);

    let report = supervisor.stop_all(Duration::from_secs(5));
    assert_eq!(report.exited.len(), 2);
    assert!(report.is_clean());
    assert!(supervisor.processes().is_empty());

    let again = supervisor.stop_all(Duration::from_secs(5));
    assert_eq!(again, Default::default());

    let recorded = std::fs::read_to_string(tmp.path().join("take_cam0.avi")).unwrap();
    assert!(recorded.contains("-c:v copy -t 5"));
    let recorded = std::fs::read_to_string(tmp.path().join("take_audio.wav")).unwrap();
    assert!(recorded.contains("-f alsa"));
}

#[test]
fn test_failed_launch_does_not_stop_others() {
    let tmp = tempfile::tempdir().unwrap();
    let good = common::fake_capture_tool(tmp.path());
    let bad = common::failing_tool(tmp.path());
    let mut supervisor = ProcessSupervisor::new(options(&good));

    let out = tmp.path().join("x");
    let failing = ProcessCommand {
        program: bad.to_string_lossy().to_string(),
        args: vec![],
    };
    let working = ProcessCommand {
        program: good.to_string_lossy().to_string(),
        args: vec![out.to_string_lossy().to_string()],
    };

    // An immediate failure may surface at spawn time or at the startup check
    let early = supervisor.launch_command(&failing, ProcessRole::Capture, "bad".to_string());
    supervisor
        .launch_command(&working, ProcessRole::Capture, "good".to_string())
        .unwrap();
    let failures = supervisor.confirm_started();

    let failed_labels: Vec<String> = match early {
        Err(LaunchError::ExitedImmediately { code, .. }) => {
            assert_eq!(code, Some(3));
            vec!["bad".to_string()]
        }
        Err(e) => panic!("unexpected error {e}"),
        Ok(_) => failures.iter().map(|f| f.label.clone()).collect(),
    };
    assert_eq!(failed_labels, vec!["bad"]);

    let running: Vec<&str> = supervisor.processes().iter().map(|p| p.label.as_str()).collect();
    assert_eq!(running, vec!["good"]);
    supervisor.stop_all(Duration::from_secs(5));
}

#[test]
fn test_missing_program_is_a_spawn_error() {
    let mut supervisor = ProcessSupervisor::new(LaunchOptions::default());
    let command = ProcessCommand {
        program: "/nonexistent/usbrig-capture-tool".to_string(),
        args: vec![],
    };
    let result = supervisor.launch_command(&command, ProcessRole::Capture, "cam0".to_string());
    assert!(matches!(result, Err(LaunchError::Spawn { .. })));
    assert!(supervisor.processes().is_empty());
}

#[test]
fn test_audio_preview_is_rejected() {
    let mut supervisor = ProcessSupervisor::new(LaunchOptions::default());
    let mic = builder(PathBuf::from("/tmp")).build_audio_spec(
        &CaptureDevice::audio("hw:1,0", "Mic", AudioBackend::Alsa),
        RecordingMode::Raw,
    );
    assert!(matches!(
        supervisor.launch(&mic, ProcessRole::Preview),
        Err(LaunchError::PreviewUnsupported { .. })
    ));
}

#[test]
fn test_wait_all_collects_exit_status() {
    let mut supervisor = ProcessSupervisor::new(LaunchOptions::default());
    let command = ProcessCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), "sleep 0.2; exit 2".to_string()],
    };
    supervisor
        .launch_command(&command, ProcessRole::Capture, "short".to_string())
        .unwrap();

    let statuses = supervisor.wait_all();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].0, "short");
    assert_eq!(statuses[0].1.and_then(|s| s.code()), Some(2));
    assert!(supervisor.processes().is_empty());
}

#[test]
fn test_drop_stops_live_processes() {
    let tmp = tempfile::tempdir().unwrap();
    let tool = common::fake_capture_tool(tmp.path());
    let out = tmp.path().join("out");
    let pid = {
        let mut supervisor =
            ProcessSupervisor::new(options(&tool)).with_grace_period(Duration::from_secs(5));
        let command = ProcessCommand {
            program: tool.to_string_lossy().to_string(),
            args: vec![out.to_string_lossy().to_string()],
        };
        supervisor
            .launch_command(&command, ProcessRole::Capture, "cam0".to_string())
            .unwrap()
    };

    // Reaped on drop, so the pid no longer names a process
    let alive = unsafe { libc::kill(pid as libc::pid_t, 0) } == 0;
    assert!(!alive);
}

#[test]
fn test_process_ignoring_interrupt_is_reported_lingering() {
    let tmp = tempfile::tempdir().unwrap();
    let stubborn = common::stubborn_capture_tool(tmp.path());
    let good = common::fake_capture_tool(tmp.path());
    let mut supervisor = ProcessSupervisor::new(options(&good));

    let out = tmp.path().join("out");
    let stubborn = ProcessCommand {
        program: stubborn.to_string_lossy().to_string(),
        args: vec![],
    };
    let working = ProcessCommand {
        program: good.to_string_lossy().to_string(),
        args: vec![out.to_string_lossy().to_string()],
    };
    let stubborn_pid = supervisor
        .launch_command(&stubborn, ProcessRole::Capture, "stubborn".to_string())
        .unwrap();
    supervisor
        .launch_command(&working, ProcessRole::Capture, "good".to_string())
        .unwrap();
    assert!(supervisor.confirm_started().is_empty());

    let start = Instant::now();
    let report = supervisor.stop_all(Duration::from_millis(500));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!report.is_clean());
    assert_eq!(report.lingering, vec!["stubborn"]);
    assert_eq!(report.exited, vec!["good"]);
    assert!(supervisor.processes().is_empty());

    // Released, not killed
    let alive = unsafe { libc::kill(stubborn_pid as libc::pid_t, 0) } == 0;
    assert!(alive);
    unsafe { libc::kill(stubborn_pid as libc::pid_t, libc::SIGKILL) };
}

#[test]
fn test_reap_exited_reports_finished_processes() {
    let mut supervisor = ProcessSupervisor::new(LaunchOptions::default());
    let short = ProcessCommand {
        program: "sh".to_string(),
        args: vec!["-c".to_string(), "exit 4".to_string()],
    };
    let long = ProcessCommand {
        program: "sleep".to_string(),
        args: vec!["30".to_string()],
    };
    // Either exits at once or is caught by the spawn check
    let _ = supervisor.launch_command(&short, ProcessRole::Capture, "short".to_string());
    supervisor
        .launch_command(&long, ProcessRole::Capture, "long".to_string())
        .unwrap();

    std::thread::sleep(Duration::from_millis(300));
    let exited = supervisor.reap_exited();
    assert!(exited.iter().all(|(label, status)| label == "short" && status.code() == Some(4)));
    let running: Vec<&str> = supervisor.processes().iter().map(|p| p.label.as_str()).collect();
    assert_eq!(running, vec!["long"]);
    supervisor.stop_all(Duration::from_secs(5));
}
