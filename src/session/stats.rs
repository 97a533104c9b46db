use super::state::SessionState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Statistics about a recording session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    /// Session identifier
    pub session_id: String,

    /// Current lifecycle state
    pub state: SessionState,

    /// When `start` was called, if it ever was
    pub started_at: Option<DateTime<Utc>>,

    /// Seconds since `start`; zero while idle
    pub duration_secs: f64,

    /// Bytes delivered to the stream view
    pub bytes_streamed: u64,

    /// Bytes discarded while paused
    pub bytes_dropped: u64,
}
