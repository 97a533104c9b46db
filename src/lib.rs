pub mod config;
pub mod error;
pub mod recorder;
pub mod session;
pub mod stream;

pub use config::RecordingConfig;
pub use error::RecorderError;
pub use recorder::{Recorder, RecorderCommand};
pub use session::{RecordingSession, SessionState, SessionStats};
pub use stream::AudioStream;

/// Create a recording session for `config`.
///
/// Convenience wrapper over `RecordingSession::new`; the session stays idle
/// until `start` is called.
pub fn record(config: RecordingConfig) -> Result<RecordingSession, RecorderError> {
    RecordingSession::new(config)
}
