// SPDX-License-Identifier: MPL-2.0

//! Integration tests for constants module

use usbrig::RecordingMode;
use usbrig::constants::formats::input_format_for_fourcc;

#[test]
fn test_recording_mode_values() {
    // Test that both modes exist (Raw, Lossless)
    assert_eq!(RecordingMode::ALL.len(), 2);
}

#[test]
fn test_raw_mode_copies_video() {
    assert!(RecordingMode::Raw.is_stream_copy());
    assert!(!RecordingMode::Lossless.is_stream_copy());
    assert_eq!(RecordingMode::Raw.video_codec(), "copy");
    assert_eq!(RecordingMode::Raw.video_extension(), "avi");
    assert_eq!(RecordingMode::Raw.audio_extension(), "wav");
}

#[test]
fn test_lossless_audio_shares_video_container() {
    let mode = RecordingMode::Lossless;
    assert_eq!(mode.video_extension(), mode.audio_extension());
    assert_eq!(mode.audio_codec(), "flac");
}

#[test]
fn test_recording_mode_display_names() {
    // Test that all modes have non-empty display names that parse back
    for mode in RecordingMode::ALL {
        let name = mode.display_name();
        assert!(!name.is_empty(), "Display name should not be empty");
        assert_eq!(name.parse::<RecordingMode>(), Ok(mode));
    }
    assert!("lossy".parse::<RecordingMode>().is_err());
}

#[test]
fn test_fourcc_mapping() {
    assert_eq!(input_format_for_fourcc("MJPG"), "mjpeg");
    assert_eq!(input_format_for_fourcc("yuyv"), "yuyv422");
    assert_eq!(input_format_for_fourcc("GREY"), "grey");
}
