use crate::error::RecorderError;
use serde::{Deserialize, Serialize};

/// Options for a recording session.
///
/// Every field has a default, so `RecordingConfig::default()` describes a
/// working 16 kHz mono sox capture. `None` for the start/end thresholds
/// means "use `threshold`"; `None` for `device` means the backend's default
/// input device. The configuration is immutable once a session is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Number of channels to record (1 = mono, 2 = stereo)
    pub channels: u16,

    /// Ask the backend for a compressed encoding instead of raw 16-bit PCM
    pub compress: bool,

    /// Silence-detection amplitude threshold (0.0 to 1.0)
    pub threshold: f64,

    /// Threshold for detecting the start of sound; overrides `threshold`
    pub threshold_start: Option<f64>,

    /// Threshold for detecting the end of sound; overrides `threshold`
    pub threshold_end: Option<f64>,

    /// Silence duration that ends the recording, spelled the way the
    /// backend expects it (e.g. "1.0")
    pub silence: String,

    /// Recorder backend to invoke ("sox", "rec" or "arecord")
    pub recorder: String,

    /// Configure the backend to terminate itself once silence is detected
    pub end_on_silence: bool,

    /// Output container/format passed to the backend
    pub audio_type: String,

    /// Capture device (arecord `-D`, sox/rec `AUDIODEV` environment)
    pub device: Option<String>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,    // 16kHz, what speech pipelines expect
            channels: 1,           // Mono
            compress: false,
            threshold: 0.5,
            threshold_start: None,
            threshold_end: None,
            silence: "1.0".to_string(),
            recorder: "sox".to_string(),
            end_on_silence: false,
            audio_type: "wav".to_string(),
            device: None,
        }
    }
}

impl RecordingConfig {
    /// Load a configuration from a file, with `MICSTREAM_*` environment
    /// variables layered on top, and validate it.
    pub fn load(path: &str) -> Result<Self, RecorderError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("MICSTREAM"))
            .build()?;

        let cfg: RecordingConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check every field for values no backend can work with.
    ///
    /// Violations surface before any process is spawned.
    pub fn validate(&self) -> Result<(), RecorderError> {
        if self.sample_rate == 0 {
            return Err(invalid("sample_rate", "must be a positive number of Hz"));
        }
        if self.channels == 0 {
            return Err(invalid("channels", "must be at least 1"));
        }
        check_threshold("threshold", self.threshold)?;
        if let Some(t) = self.threshold_start {
            check_threshold("threshold_start", t)?;
        }
        if let Some(t) = self.threshold_end {
            check_threshold("threshold_end", t)?;
        }
        if self.silence.is_empty() {
            return Err(invalid("silence", "must be a non-empty duration"));
        }
        if self.recorder.is_empty() {
            return Err(invalid("recorder", "must name a backend"));
        }
        if self.audio_type.is_empty() {
            return Err(invalid("audio_type", "must name an output format"));
        }
        Ok(())
    }

    /// Threshold for detecting the start of sound.
    pub fn start_threshold(&self) -> f64 {
        self.threshold_start.unwrap_or(self.threshold)
    }

    /// Threshold for detecting the end of sound.
    pub fn end_threshold(&self) -> f64 {
        self.threshold_end.unwrap_or(self.threshold)
    }
}

fn check_threshold(option: &'static str, value: f64) -> Result<(), RecorderError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(invalid(option, format!("{} is outside 0.0..=1.0", value)));
    }
    Ok(())
}

fn invalid(option: &'static str, reason: impl Into<String>) -> RecorderError {
    RecorderError::InvalidOption {
        option,
        reason: reason.into(),
    }
}
