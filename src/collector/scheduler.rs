//! Daily scheduled collection.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::Collector;
use crate::config::ScheduleConfig;

/// Triggers every enabled source once a day at a fixed UTC time.
pub struct Scheduler {
    collector: Collector,
    at: NaiveTime,
}

impl Scheduler {
    /// Returns `None` when scheduling is disabled or the time is invalid.
    pub fn new(collector: Collector, config: &ScheduleConfig) -> Option<Self> {
        if !config.enabled {
            return None;
        }
        let Some(at) = NaiveTime::from_hms_opt(config.hour, config.minute, 0) else {
            warn!(
                "Ignoring schedule with invalid time {:02}:{:02}",
                config.hour, config.minute
            );
            return None;
        };
        Some(Self { collector, at })
    }

    /// Run the schedule on a background task until it is aborted.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            info!("Daily collection scheduled at {} UTC", self.at.format("%H:%M"));
            loop {
                let now = Utc::now();
                let next = next_tick(now, self.at);
                let wait = (next - now).to_std().unwrap_or_default();
                tokio::time::sleep(wait).await;

                info!("Scheduled collection starting");
                match self.collector.trigger_all().await {
                    Ok(reports) => {
                        let started = reports.iter().filter(|r| r.result.is_ok()).count();
                        let skipped = reports.iter().filter(|r| r.is_skipped()).count();
                        info!(
                            "Scheduled collection: {} started, {} already running, {} rejected",
                            started,
                            skipped,
                            reports.len() - started - skipped
                        );
                    }
                    Err(e) => warn!("Scheduled collection could not list sources: {}", e),
                }
            }
        })
    }
}

/// The first instant strictly after `now` whose UTC time of day is `at`.
pub fn next_tick(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_tick_later_today() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap();
        let at = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        assert_eq!(
            next_tick(now, at),
            Utc.with_ymd_and_hms(2024, 6, 1, 2, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_next_tick_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 2, 30, 0).unwrap();
        let at = NaiveTime::from_hms_opt(2, 30, 0).unwrap();
        assert_eq!(
            next_tick(now, at),
            Utc.with_ymd_and_hms(2024, 6, 2, 2, 30, 0).unwrap()
        );
    }
}
