use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a recording session.
///
/// Sessions move `idle → running`, may toggle `running ↔ paused` any number
/// of times, and end in `stopped`. `Stopped` is terminal: a session cannot
/// be restarted, a new one must be created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Created, not yet started
    Idle,
    /// Recorder process alive, bytes flowing to the stream
    Running,
    /// Recorder paused; captured bytes are dropped
    Paused,
    /// Recorder terminated or exited; the stream has ended
    Stopped,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Running => "running",
            SessionState::Paused => "paused",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
