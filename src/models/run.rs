//! Collection run records and per-URL log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every URL succeeded (or was unchanged).
    Completed,
    /// Some URLs failed, at least one succeeded.
    Partial,
    /// Every URL failed, or the run could not be set up.
    Failed,
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(Self::Completed),
            "partial" => Some(Self::Partial),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Aggregate per-URL results into an outcome.
    pub fn from_counts(succeeded: usize, failed: usize) -> Self {
        match (succeeded, failed) {
            (_, 0) => Self::Completed,
            (0, _) => Self::Failed,
            _ => Self::Partial,
        }
    }
}

/// What happened to a single URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlOutcomeKind {
    /// A new document or a new version was stored.
    Success,
    /// Content matched the current version.
    Unchanged,
    Failed,
}

impl UrlOutcomeKind {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

/// Per-URL entry of a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlOutcome {
    pub url: String,
    pub kind: UrlOutcomeKind,
    pub error: Option<String>,
    pub document_id: Option<String>,
}

impl UrlOutcome {
    pub fn success(url: &str, document_id: String) -> Self {
        Self {
            url: url.to_string(),
            kind: UrlOutcomeKind::Success,
            error: None,
            document_id: Some(document_id),
        }
    }

    pub fn unchanged(url: &str, document_id: String) -> Self {
        Self {
            url: url.to_string(),
            kind: UrlOutcomeKind::Unchanged,
            error: None,
            document_id: Some(document_id),
        }
    }

    pub fn failed(url: &str, error: impl std::fmt::Display) -> Self {
        Self {
            url: url.to_string(),
            kind: UrlOutcomeKind::Failed,
            error: Some(error.to_string()),
            document_id: None,
        }
    }
}

/// One execution of the pipeline for one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionRun {
    pub id: String,
    pub source_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub outcome: RunOutcome,
    pub message: String,
    pub urls: Vec<UrlOutcome>,
}

impl CollectionRun {
    pub fn succeeded(&self) -> usize {
        self.urls.iter().filter(|u| !u.kind.is_failure()).count()
    }

    pub fn failed(&self) -> usize {
        self.urls.iter().filter(|u| u.kind.is_failure()).count()
    }
}

/// Status column of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogStatus {
    Success,
    Failed,
    /// Content unchanged since the last run.
    Skipped,
}

impl LogStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

impl From<UrlOutcomeKind> for LogStatus {
    fn from(kind: UrlOutcomeKind) -> Self {
        match kind {
            UrlOutcomeKind::Success => Self::Success,
            UrlOutcomeKind::Unchanged => Self::Skipped,
            UrlOutcomeKind::Failed => Self::Failed,
        }
    }
}

/// Persisted per-URL log entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionLog {
    pub id: i32,
    pub run_id: String,
    pub source_id: String,
    pub url: String,
    pub status: LogStatus,
    pub error_message: Option<String>,
    pub document_id: Option<String>,
    pub executed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_counts() {
        assert_eq!(RunOutcome::from_counts(3, 0), RunOutcome::Completed);
        assert_eq!(RunOutcome::from_counts(0, 0), RunOutcome::Completed);
        assert_eq!(RunOutcome::from_counts(2, 1), RunOutcome::Partial);
        assert_eq!(RunOutcome::from_counts(0, 3), RunOutcome::Failed);
    }

    #[test]
    fn test_log_status_from_kind() {
        assert_eq!(LogStatus::from(UrlOutcomeKind::Unchanged), LogStatus::Skipped);
        assert_eq!(LogStatus::from(UrlOutcomeKind::Failed), LogStatus::Failed);
        assert_eq!(LogStatus::from_str("skipped"), Some(LogStatus::Skipped));
    }
}
