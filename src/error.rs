use crate::session::SessionState;
use thiserror::Error;

/// Errors produced by the recorder resolver and recording sessions.
///
/// Configuration and state violations are returned synchronously from the
/// offending call. Spawn failures and abnormal process exits travel through
/// the session's stream view instead, since the stream is the long-lived
/// handle a consumer is watching once recording is underway.
#[derive(Debug, Error)]
pub enum RecorderError {
    /// The configured `recorder` name does not match any known backend.
    #[error("unknown recorder backend \"{name}\"")]
    UnknownRecorder { name: String },

    /// A configuration value is out of range or empty.
    #[error("invalid value for `{option}`: {reason}")]
    InvalidOption {
        option: &'static str,
        reason: String,
    },

    /// A configuration file could not be read or parsed.
    #[error("failed to load configuration: {0}")]
    ConfigFile(#[from] config::ConfigError),

    /// The recorder executable could not be launched.
    #[error("failed to spawn recorder \"{program}\": {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// An operation was invoked in a state that forbids it.
    #[error("cannot {operation} while the session is {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The recorder process terminated unexpectedly with a non-zero status.
    #[error("recorder process exited unexpectedly ({status})")]
    ProcessExit {
        status: std::process::ExitStatus,
        /// Tail of the recorder's stderr, for diagnostics
        stderr: String,
    },
}
