//! Session lifecycle status

use serde::{Deserialize, Serialize};

/// Lifecycle status of a session, as seen by the front end
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Connected to the front end, no backends initialized
    #[default]
    Disconnected,
    /// Backend connections are being set up
    Initializing,
    /// At least one backend is connected; messages are accepted
    Connected,
    /// Initialization work itself failed
    Failed,
    /// Initialization finished but no backend could be reached
    FailedConnection,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Initializing => "initializing",
            SessionStatus::Connected => "connected",
            SessionStatus::Failed => "failed",
            SessionStatus::FailedConnection => "failed_connection",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
