// Unit tests for the recording configuration
//
// These verify defaults, validation, and layered file loading.

use micstream::{RecorderError, RecordingConfig};
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults() {
    let config = RecordingConfig::default();

    assert_eq!(config.sample_rate, 16000, "Default should be 16kHz");
    assert_eq!(config.channels, 1, "Default should be mono");
    assert!(!config.compress);
    assert_eq!(config.threshold, 0.5);
    assert_eq!(config.threshold_start, None);
    assert_eq!(config.threshold_end, None);
    assert_eq!(config.silence, "1.0");
    assert_eq!(config.recorder, "sox");
    assert!(!config.end_on_silence);
    assert_eq!(config.audio_type, "wav");
    assert_eq!(config.device, None);
}

#[test]
fn test_default_config_validates() {
    assert!(RecordingConfig::default().validate().is_ok());
}

#[test]
fn test_zero_sample_rate_rejected() {
    let config = RecordingConfig {
        sample_rate: 0,
        ..Default::default()
    };

    match config.validate() {
        Err(RecorderError::InvalidOption { option, .. }) => assert_eq!(option, "sample_rate"),
        other => panic!("expected an invalid-option error, got {:?}", other),
    }
}

#[test]
fn test_zero_channels_rejected() {
    let config = RecordingConfig {
        channels: 0,
        ..Default::default()
    };

    match config.validate() {
        Err(RecorderError::InvalidOption { option, .. }) => assert_eq!(option, "channels"),
        other => panic!("expected an invalid-option error, got {:?}", other),
    }
}

#[test]
fn test_threshold_out_of_range_rejected() {
    let config = RecordingConfig {
        threshold: 1.5,
        ..Default::default()
    };
    assert!(config.validate().is_err(), "threshold above 1.0 must be rejected");

    let config = RecordingConfig {
        threshold_start: Some(-0.1),
        ..Default::default()
    };
    match config.validate() {
        Err(RecorderError::InvalidOption { option, .. }) => assert_eq!(option, "threshold_start"),
        other => panic!("expected an invalid-option error, got {:?}", other),
    }
}

#[test]
fn test_empty_fields_rejected() {
    for (field, config) in [
        (
            "silence",
            RecordingConfig {
                silence: String::new(),
                ..Default::default()
            },
        ),
        (
            "recorder",
            RecordingConfig {
                recorder: String::new(),
                ..Default::default()
            },
        ),
        (
            "audio_type",
            RecordingConfig {
                audio_type: String::new(),
                ..Default::default()
            },
        ),
    ] {
        match config.validate() {
            Err(RecorderError::InvalidOption { option, .. }) => assert_eq!(option, field),
            other => panic!("expected empty {} to be rejected, got {:?}", field, other),
        }
    }
}

#[test]
fn test_threshold_fallbacks() {
    let config = RecordingConfig {
        threshold: 0.3,
        ..Default::default()
    };
    assert_eq!(config.start_threshold(), 0.3, "start falls back to threshold");
    assert_eq!(config.end_threshold(), 0.3, "end falls back to threshold");

    let config = RecordingConfig {
        threshold: 0.3,
        threshold_start: Some(0.1),
        threshold_end: Some(0.9),
        ..Default::default()
    };
    assert_eq!(config.start_threshold(), 0.1);
    assert_eq!(config.end_threshold(), 0.9);
}

#[test]
fn test_partial_json_fills_defaults() {
    let config: RecordingConfig =
        serde_json::from_str(r#"{"sample_rate": 44100, "recorder": "arecord"}"#)
            .expect("partial config should deserialize");

    assert_eq!(config.sample_rate, 44100);
    assert_eq!(config.recorder, "arecord");
    assert_eq!(config.channels, 1, "unset fields take their defaults");
    assert_eq!(config.audio_type, "wav");
}

#[test]
fn test_load_from_file() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("micstream.toml");
    fs::write(
        &path,
        "sample_rate = 48000\nchannels = 2\nrecorder = \"arecord\"\ndevice = \"hw:1\"\n",
    )
    .expect("write config file");

    let base = temp_dir.path().join("micstream");
    let config = RecordingConfig::load(&base.to_string_lossy()).expect("load config");

    assert_eq!(config.sample_rate, 48000);
    assert_eq!(config.channels, 2);
    assert_eq!(config.recorder, "arecord");
    assert_eq!(config.device.as_deref(), Some("hw:1"));
    assert_eq!(config.silence, "1.0", "unset fields take their defaults");
}

#[test]
fn test_load_rejects_invalid_values() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("bad.toml");
    fs::write(&path, "threshold = 2.0\n").expect("write config file");

    let base = temp_dir.path().join("bad");
    match RecordingConfig::load(&base.to_string_lossy()) {
        Err(RecorderError::InvalidOption { option, .. }) => assert_eq!(option, "threshold"),
        other => panic!("out-of-range file values must fail validation, got {:?}", other),
    }
}
