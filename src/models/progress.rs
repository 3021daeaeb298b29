//! Live progress of a collection run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Progress state of a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    #[default]
    Idle,
    Pending,
    Running,
    Completed,
    Failed,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "idle" => Some(Self::Idle),
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// A run is in flight and a new trigger must be rejected.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Snapshot of a source's progress, as seen by pollers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub status: ProgressStatus,
    /// Percentage in 0..=100. Only a terminal record reaches 100.
    pub progress: u8,
    pub message: String,
    /// URLs finished so far.
    pub current: usize,
    /// URLs in the work list (0 until resolved).
    pub total: usize,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self::idle()
    }
}

impl ProgressRecord {
    /// The record reported for sources that never ran in this process.
    pub fn idle() -> Self {
        Self {
            status: ProgressStatus::Idle,
            progress: 0,
            message: "No collection in progress".to_string(),
            current: 0,
            total: 0,
            started_at: None,
            finished_at: None,
        }
    }

    /// Record for a freshly accepted trigger.
    pub fn pending() -> Self {
        Self {
            status: ProgressStatus::Pending,
            progress: 0,
            message: "Preparing collection".to_string(),
            current: 0,
            total: 0,
            started_at: Some(Utc::now()),
            finished_at: None,
        }
    }

    /// Percentage for `done` of `total` finished URLs while still running.
    ///
    /// Capped at 99 so that 100 is only ever observed in a terminal state.
    pub fn running_percent(done: usize, total: usize) -> u8 {
        if total == 0 {
            return 0;
        }
        let pct = (done.min(total) * 100) / total;
        pct.min(99) as u8
    }
}
