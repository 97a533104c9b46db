use super::{Recorder, RecorderCommand};
use crate::config::RecordingConfig;

/// sox invoked directly, long-option dialect, default input device.
pub struct SoxRecorder;

/// sox's `rec` front end: implies the default input device and takes the
/// short-flag dialect.
pub struct RecRecorder;

impl Recorder for SoxRecorder {
    fn name(&self) -> &'static str {
        "sox"
    }

    fn command(&self, config: &RecordingConfig) -> RecorderCommand {
        let mut args: Vec<String> = vec![
            "--default-device".into(),
            "--no-show-progress".into(),
            "--rate".into(),
            config.sample_rate.to_string(),
            "--channels".into(),
            config.channels.to_string(),
        ];
        if config.compress {
            args.extend(encoding(&["--encoding", "mu-law", "--bits", "8"]));
        } else {
            args.extend(encoding(&["--encoding", "signed-integer", "--bits", "16"]));
        }
        args.push("--type".into());
        args.push(config.audio_type.clone());
        args.push("-".into());
        if config.end_on_silence {
            args.extend(silence_effect(config));
        }

        RecorderCommand {
            program: "sox".into(),
            args,
            env: device_env(config),
        }
    }
}

impl Recorder for RecRecorder {
    fn name(&self) -> &'static str {
        "rec"
    }

    fn command(&self, config: &RecordingConfig) -> RecorderCommand {
        let mut args: Vec<String> = vec![
            "-q".into(),
            "-r".into(),
            config.sample_rate.to_string(),
            "-c".into(),
            config.channels.to_string(),
        ];
        if config.compress {
            args.extend(encoding(&["-e", "mu-law", "-b", "8"]));
        } else {
            args.extend(encoding(&["-e", "signed-integer", "-b", "16"]));
        }
        args.push("-t".into());
        args.push(config.audio_type.clone());
        args.push("-".into());
        if config.end_on_silence {
            args.extend(silence_effect(config));
        }

        RecorderCommand {
            program: "rec".into(),
            args,
            env: device_env(config),
        }
    }
}

fn encoding(flags: &[&str]) -> Vec<String> {
    flags.iter().map(|f| f.to_string()).collect()
}

/// The sox `silence` effect: trigger on the start threshold, then stop once
/// the level stays below the end threshold for the configured duration.
fn silence_effect(config: &RecordingConfig) -> Vec<String> {
    vec![
        "silence".into(),
        "1".into(),
        "0.1".into(),
        format!("{}%", config.start_threshold()),
        "1".into(),
        config.silence.clone(),
        format!("{}%", config.end_threshold()),
    ]
}

/// sox and rec pick their input device from the AUDIODEV environment
/// variable rather than a flag.
fn device_env(config: &RecordingConfig) -> Vec<(String, String)> {
    match &config.device {
        Some(device) => vec![("AUDIODEV".to_string(), device.clone())],
        None => Vec::new(),
    }
}
