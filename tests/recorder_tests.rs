// Unit tests for recorder backend resolution
//
// These verify the name-to-backend factory and the argument dialect each
// backend produces for a configuration.

use micstream::recorder::resolve;
use micstream::{RecorderCommand, RecorderError, RecordingConfig};

fn command_for(backend: &str, config: &RecordingConfig) -> RecorderCommand {
    resolve(backend)
        .expect("backend should resolve")
        .command(config)
}

#[test]
fn test_resolve_known_backends() {
    for name in ["sox", "rec", "arecord"] {
        let backend = resolve(name).expect("known backend");
        assert_eq!(backend.name(), name);
    }
}

#[test]
fn test_resolve_unknown_backend() {
    match resolve("nonexistent-tool") {
        Err(RecorderError::UnknownRecorder { name }) => assert_eq!(name, "nonexistent-tool"),
        other => panic!("expected an unknown-recorder error, got {:?}", other.map(|b| b.name())),
    }
}

#[test]
fn test_command_is_deterministic() {
    let config = RecordingConfig {
        sample_rate: 44100,
        channels: 2,
        threshold_start: Some(0.2),
        end_on_silence: true,
        device: Some("hw:1".to_string()),
        ..Default::default()
    };

    for backend in ["sox", "rec", "arecord"] {
        assert_eq!(
            command_for(backend, &config),
            command_for(backend, &config),
            "{} must produce identical invocations for identical configs",
            backend
        );
    }
}

#[test]
fn test_sox_default_args() {
    let command = command_for("sox", &RecordingConfig::default());

    assert_eq!(command.program, "sox");
    assert_eq!(
        command.args,
        vec![
            "--default-device",
            "--no-show-progress",
            "--rate",
            "16000",
            "--channels",
            "1",
            "--encoding",
            "signed-integer",
            "--bits",
            "16",
            "--type",
            "wav",
            "-",
        ]
    );
    assert!(command.env.is_empty());
}

#[test]
fn test_sox_end_on_silence_appends_silence_effect() {
    let config = RecordingConfig {
        end_on_silence: true,
        ..Default::default()
    };
    let command = command_for("sox", &config);

    let tail = &command.args[command.args.len() - 7..];
    assert_eq!(tail, ["silence", "1", "0.1", "0.5%", "1", "1.0", "0.5%"]);
}

#[test]
fn test_sox_separate_thresholds_override() {
    let config = RecordingConfig {
        end_on_silence: true,
        threshold_start: Some(0.1),
        threshold_end: Some(0.9),
        silence: "2.5".to_string(),
        ..Default::default()
    };
    let command = command_for("sox", &config);

    let tail = &command.args[command.args.len() - 7..];
    assert_eq!(tail, ["silence", "1", "0.1", "0.1%", "1", "2.5", "0.9%"]);
}

#[test]
fn test_sox_compress_swaps_encoding() {
    let config = RecordingConfig {
        compress: true,
        ..Default::default()
    };
    let command = command_for("sox", &config);

    let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
    assert!(args.windows(4).any(|w| w == ["--encoding", "mu-law", "--bits", "8"]));
    assert!(!args.contains(&"signed-integer"));
}

#[test]
fn test_sox_device_goes_through_audiodev() {
    let config = RecordingConfig {
        device: Some("hw:1".to_string()),
        ..Default::default()
    };

    for backend in ["sox", "rec"] {
        let command = command_for(backend, &config);
        assert_eq!(
            command.env,
            vec![("AUDIODEV".to_string(), "hw:1".to_string())],
            "{} selects the device via the environment",
            backend
        );
    }
}

#[test]
fn test_rec_default_args() {
    let command = command_for("rec", &RecordingConfig::default());

    assert_eq!(command.program, "rec");
    assert_eq!(
        command.args,
        vec![
            "-q",
            "-r",
            "16000",
            "-c",
            "1",
            "-e",
            "signed-integer",
            "-b",
            "16",
            "-t",
            "wav",
            "-",
        ]
    );
}

#[test]
fn test_rec_audio_type_propagates() {
    let config = RecordingConfig {
        audio_type: "raw".to_string(),
        ..Default::default()
    };
    let command = command_for("rec", &config);

    let args: Vec<&str> = command.args.iter().map(String::as_str).collect();
    assert!(args.windows(2).any(|w| w == ["-t", "raw"]));
}

#[test]
fn test_arecord_default_args() {
    let command = command_for("arecord", &RecordingConfig::default());

    assert_eq!(command.program, "arecord");
    assert_eq!(
        command.args,
        vec!["-q", "-r", "16000", "-c", "1", "-t", "wav", "-f", "S16_LE", "-"]
    );
    assert!(command.env.is_empty());
}

#[test]
fn test_arecord_device_flag() {
    let config = RecordingConfig {
        device: Some("hw:1".to_string()),
        ..Default::default()
    };
    let command = command_for("arecord", &config);

    assert_eq!(&command.args[..2], ["-D", "hw:1"]);
}

#[test]
fn test_arecord_ignores_unsupported_options() {
    // arecord has no silence detection or compressed encodings; those
    // options must not leak into its command line
    let config = RecordingConfig {
        compress: true,
        end_on_silence: true,
        threshold_start: Some(0.1),
        ..Default::default()
    };

    assert_eq!(
        command_for("arecord", &config).args,
        command_for("arecord", &RecordingConfig::default()).args
    );
}
