//! Archive readiness and the poll state machine
//!
//! ```text
//! Idle
//!   ↓ poll / wait
//! Wait ──┐ pending
//!   ↑────┘
//!   ├─→ Ready  (terminal for the sequence)
//!   └─→ Error  (terminal for the sequence)
//! ```
//!
//! Hiding the popup returns the poller to `Idle` from any state.

use serde::{Deserialize, Serialize};

/// Body the server sends once the archive has been prepared.
const READY_BODY: &str = "ready";

/// Server-reported readiness of an archive, decoded from the status response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveStatus {
    Ready,
    Pending,
}

impl ArchiveStatus {
    /// Only the exact body `ready` means ready; anything else is still pending.
    pub fn from_body(body: &str) -> Self {
        if body == READY_BODY {
            ArchiveStatus::Ready
        } else {
            ArchiveStatus::Pending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveStatus::Ready => "ready",
            ArchiveStatus::Pending => "pending",
        }
    }
}

impl std::fmt::Display for ArchiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollState {
    /// No sequence running
    Idle,
    /// Archive is being prepared, next poll scheduled
    Wait,
    /// Archive is ready, link rendered
    Ready,
    /// Status request failed
    Error,
}

impl PollState {
    /// Returns true if no further poll follows this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Ready | PollState::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PollState::Idle => "idle",
            PollState::Wait => "wait",
            PollState::Ready => "ready",
            PollState::Error => "error",
        }
    }
}

impl std::fmt::Display for PollState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
