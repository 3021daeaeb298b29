//! In-process progress records keyed by source id.

use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::warn;

use crate::models::{ProgressRecord, ProgressStatus, RunOutcome};

/// Live progress for every source that ran in this process.
///
/// Cloning shares the underlying map. Each key is locked independently, so
/// updates for different sources never contend.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    records: Arc<DashMap<String, ProgressRecord>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current record, or the idle record for unknown sources.
    pub fn get(&self, source_id: &str) -> ProgressRecord {
        self.records
            .get(source_id)
            .map(|r| r.value().clone())
            .unwrap_or_else(ProgressRecord::idle)
    }

    /// Replace the record for `source_id` outright.
    pub fn set(&self, source_id: &str, record: ProgressRecord) {
        self.records.insert(source_id.to_string(), record);
    }

    /// Move `source_id` to pending unless a run is already active.
    ///
    /// Check and transition happen under the entry lock, so exactly one of
    /// several concurrent callers wins.
    pub fn try_begin(&self, source_id: &str) -> bool {
        match self.records.entry(source_id.to_string()) {
            Entry::Occupied(mut entry) => {
                if entry.get().status.is_active() {
                    return false;
                }
                entry.insert(ProgressRecord::pending());
                true
            }
            Entry::Vacant(entry) => {
                entry.insert(ProgressRecord::pending());
                true
            }
        }
    }

    pub fn is_active(&self, source_id: &str) -> bool {
        self.records
            .get(source_id)
            .is_some_and(|r| r.status.is_active())
    }

    /// Enter the running state with `total` URLs to process.
    pub fn start_running(&self, source_id: &str, total: usize) {
        self.update(source_id, |r| {
            r.status = ProgressStatus::Running;
            r.progress = 0;
            r.current = 0;
            r.total = total;
            r.message = format!("Collecting {} URL(s)", total);
        });
    }

    /// Record that `done` of the URLs have been processed.
    pub fn advance(&self, source_id: &str, done: usize, message: String) {
        self.update(source_id, |r| {
            r.current = done;
            r.progress = ProgressRecord::running_percent(done, r.total);
            r.message = message;
        });
    }

    /// Enter the terminal state matching `outcome`.
    ///
    /// Partial runs are reported as completed; the run record keeps the
    /// distinction.
    pub fn finish(&self, source_id: &str, outcome: RunOutcome, message: String) {
        self.update(source_id, |r| {
            r.status = match outcome {
                RunOutcome::Completed | RunOutcome::Partial => ProgressStatus::Completed,
                RunOutcome::Failed => ProgressStatus::Failed,
            };
            r.progress = 100;
            r.current = r.total;
            r.message = message;
            r.finished_at = Some(Utc::now());
        });
    }

    /// Guard for a run in progress. Dropping it without calling
    /// [`RunGuard::finish`] marks the run failed.
    pub fn guard(&self, source_id: &str) -> RunGuard {
        RunGuard {
            tracker: self.clone(),
            source_id: source_id.to_string(),
            armed: true,
        }
    }

    fn update(&self, source_id: &str, f: impl FnOnce(&mut ProgressRecord)) {
        let mut entry = self
            .records
            .entry(source_id.to_string())
            .or_insert_with(ProgressRecord::idle);
        f(entry.value_mut());
    }
}

/// Held for the lifetime of a run. A run that unwinds before publishing its
/// terminal state is marked failed here, so the source can be triggered again.
#[must_use]
pub struct RunGuard {
    tracker: ProgressTracker,
    source_id: String,
    armed: bool,
}

impl RunGuard {
    /// Publish the terminal state and disarm.
    pub fn finish(mut self, outcome: RunOutcome, message: String) {
        self.armed = false;
        self.tracker.finish(&self.source_id, outcome, message);
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.armed {
            warn!("Run for source {} ended without finishing", self.source_id);
            self.tracker.finish(
                &self.source_id,
                RunOutcome::Failed,
                "Run ended unexpectedly".to_string(),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_source_is_idle() {
        let tracker = ProgressTracker::new();
        let record = tracker.get("nope");
        assert_eq!(record.status, ProgressStatus::Idle);
        assert_eq!(record.progress, 0);
    }

    #[test]
    fn test_try_begin_rejects_active_runs() {
        let tracker = ProgressTracker::new();
        assert!(tracker.try_begin("s1"));
        assert!(!tracker.try_begin("s1"));

        tracker.start_running("s1", 2);
        assert!(!tracker.try_begin("s1"));

        tracker.finish("s1", RunOutcome::Completed, "done".into());
        assert!(tracker.try_begin("s1"));
        assert_eq!(tracker.get("s1").status, ProgressStatus::Pending);
    }

    #[test]
    fn test_progress_capped_until_finish() {
        let tracker = ProgressTracker::new();
        tracker.try_begin("s");
        tracker.start_running("s", 3);
        tracker.advance("s", 3, "3/3".into());
        assert_eq!(tracker.get("s").progress, 99);

        tracker.finish("s", RunOutcome::Partial, "done with errors".into());
        let record = tracker.get("s");
        assert_eq!(record.status, ProgressStatus::Completed);
        assert_eq!(record.progress, 100);
        assert!(record.finished_at.is_some());
    }

    #[test]
    fn test_set_replaces_record() {
        let tracker = ProgressTracker::new();
        tracker.set("s", ProgressRecord::pending());
        assert!(tracker.is_active("s"));
        assert!(!tracker.try_begin("s"));

        tracker.set("s", ProgressRecord::idle());
        assert!(!tracker.is_active("s"));
        assert!(tracker.try_begin("s"));
    }

    #[test]
    fn test_guard_fails_unfinished_run() {
        let tracker = ProgressTracker::new();
        tracker.try_begin("s");
        {
            let _guard = tracker.guard("s");
            tracker.start_running("s", 2);
        }
        let record = tracker.get("s");
        assert_eq!(record.status, ProgressStatus::Failed);
        assert_eq!(record.progress, 100);
        assert!(tracker.try_begin("s"));
    }

    #[test]
    fn test_finished_guard_leaves_next_run_alone() {
        let tracker = ProgressTracker::new();
        tracker.try_begin("s");
        tracker
            .guard("s")
            .finish(RunOutcome::Completed, "done".into());
        // A later run begins; the finished guard must not touch it.
        assert!(tracker.try_begin("s"));
        assert_eq!(tracker.get("s").status, ProgressStatus::Pending);
    }

    #[test]
    fn test_concurrent_begin_has_one_winner() {
        let tracker = ProgressTracker::new();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let t = tracker.clone();
                std::thread::spawn(move || t.try_begin("shared"))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
