//! Daily trigger loop around the engine.
//!
//! Each day the scheduler picks a uniformly random minute inside the
//! configured window, sleeps until then, applies a random jitter delay
//! and invokes exactly one run. Runs never overlap: the loop waits for
//! the engine before scheduling the next day.

use crate::browser::BrowserSession;
use crate::config::ScheduleConfig;
use crate::engine::CheckInEngine;
use crate::notify::Notifier;
use chrono::{DateTime, Duration as ChronoDuration, Local, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct Scheduler {
    config: ScheduleConfig,
}

impl Scheduler {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    /// Next trigger strictly after `now`: a random minute inside the
    /// daily window, today if the drawn time is still ahead, otherwise
    /// tomorrow.
    pub fn next_trigger<R: Rng>(&self, now: DateTime<Local>, rng: &mut R) -> DateTime<Local> {
        let hour = rng.gen_range(self.config.window_start_hour..self.config.window_end_hour);
        let minute = rng.gen_range(0..60u32);
        let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN);

        let candidate = match now.date_naive().and_time(time).and_local_timezone(Local) {
            chrono::LocalResult::Single(dt) => dt,
            chrono::LocalResult::Ambiguous(dt, _) => dt,
            chrono::LocalResult::None => now + ChronoDuration::days(1),
        };

        if candidate > now {
            candidate
        } else {
            candidate + ChronoDuration::days(1)
        }
    }

    /// Random pre-run delay, bounded by the configured jitter range.
    pub fn jitter<R: Rng>(&self, rng: &mut R) -> Duration {
        Duration::from_secs(
            rng.gen_range(self.config.jitter_min_secs..=self.config.jitter_max_secs),
        )
    }

    /// Long-lived loop: sleep until the next trigger, jitter, run once,
    /// repeat. A failed run is logged (and has already been reported by
    /// the engine) but never kills the loop.
    pub async fn run<B, N>(&self, engine: &CheckInEngine<B, N>)
    where
        B: BrowserSession,
        N: Notifier,
    {
        let mut rng = StdRng::from_entropy();
        loop {
            let now = Local::now();
            let trigger = self.next_trigger(now, &mut rng);
            info!(
                "Next check-in scheduled for {}",
                trigger.format("%Y-%m-%d %H:%M")
            );
            tokio::time::sleep((trigger - now).to_std().unwrap_or_default()).await;

            let delay = self.jitter(&mut rng);
            info!("Waiting {}s before starting the run", delay.as_secs());
            tokio::time::sleep(delay).await;

            match engine.run_once().await {
                Ok(outcome) => info!("Run finished: {}", outcome),
                Err(e) => error!("Run failed: {}", e),
            }
        }
    }
}

#[cfg(test)]
mod tests_scheduler {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn scheduler() -> Scheduler {
        Scheduler::new(ScheduleConfig {
            window_start_hour: 9,
            window_end_hour: 12,
            jitter_min_secs: 10,
            jitter_max_secs: 300,
        })
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn test_trigger_falls_inside_window() {
        let s = scheduler();
        let mut rng = StdRng::seed_from_u64(42);
        let now = local(2024, 6, 1, 6, 0);

        for _ in 0..200 {
            let trigger = s.next_trigger(now, &mut rng);
            assert!((9..12).contains(&trigger.hour()));
            assert!(trigger > now);
        }
    }

    #[test]
    fn test_trigger_rolls_over_to_tomorrow() {
        let s = scheduler();
        let mut rng = StdRng::seed_from_u64(42);
        let now = local(2024, 6, 1, 13, 0);

        let trigger = s.next_trigger(now, &mut rng);
        assert_eq!(trigger.date_naive(), now.date_naive().succ_opt().unwrap());
        assert!((9..12).contains(&trigger.hour()));
    }

    #[test]
    fn test_same_day_when_window_is_ahead() {
        let s = scheduler();
        let mut rng = StdRng::seed_from_u64(7);
        let now = local(2024, 6, 1, 0, 30);

        let trigger = s.next_trigger(now, &mut rng);
        assert_eq!(trigger.date_naive(), now.date_naive());
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let s = scheduler();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let d = s.jitter(&mut rng);
            assert!((10..=300).contains(&d.as_secs()));
        }
    }
}
