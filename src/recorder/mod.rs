//! Recorder backend resolution
//!
//! Maps a `RecordingConfig` onto the concrete command line of an external
//! capture tool. Each backend dialect lives in its own module and `resolve`
//! picks one by name. Command construction is pure: a given configuration
//! always produces the same invocation.

mod arecord;
mod sox;

pub use arecord::ArecordRecorder;
pub use sox::{RecRecorder, SoxRecorder};

use crate::config::RecordingConfig;
use crate::error::RecorderError;

/// A concrete external-process invocation derived from a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecorderCommand {
    /// Executable name, resolved through PATH at spawn time
    pub program: String,

    /// Ordered argument list
    pub args: Vec<String>,

    /// Extra environment variables for the spawned process
    pub env: Vec<(String, String)>,
}

/// A backend strategy: translates a configuration into an invocation.
///
/// Implement this to drive a capture tool the crate does not know about and
/// hand it to `RecordingSession::with_recorder`; the session logic does not
/// change per backend.
pub trait Recorder: Send + Sync {
    /// Backend name, used in logs
    fn name(&self) -> &'static str;

    /// Build the command line for `config`.
    ///
    /// Must be pure: equal configurations produce equal commands.
    fn command(&self, config: &RecordingConfig) -> RecorderCommand;
}

/// Resolve a backend strategy by its configured name.
pub fn resolve(name: &str) -> Result<Box<dyn Recorder>, RecorderError> {
    match name {
        "sox" => Ok(Box::new(SoxRecorder)),
        "rec" => Ok(Box::new(RecRecorder)),
        "arecord" => Ok(Box::new(ArecordRecorder)),
        other => Err(RecorderError::UnknownRecorder {
            name: other.to_string(),
        }),
    }
}
