use super::{Recorder, RecorderCommand};
use crate::config::RecordingConfig;

/// ALSA's capture tool.
///
/// arecord has no silence detection and no compressed encodings, so
/// `threshold`, `silence`, `end_on_silence` and `compress` are ignored
/// rather than rejected.
pub struct ArecordRecorder;

impl Recorder for ArecordRecorder {
    fn name(&self) -> &'static str {
        "arecord"
    }

    fn command(&self, config: &RecordingConfig) -> RecorderCommand {
        let mut args: Vec<String> = Vec::new();
        if let Some(device) = &config.device {
            args.push("-D".into());
            args.push(device.clone());
        }
        args.extend([
            "-q".into(),
            "-r".into(),
            config.sample_rate.to_string(),
            "-c".into(),
            config.channels.to_string(),
            "-t".into(),
            config.audio_type.clone(),
            "-f".into(),
            "S16_LE".into(),
            "-".into(),
        ]);

        RecorderCommand {
            program: "arecord".into(),
            args,
            env: Vec::new(),
        }
    }
}
