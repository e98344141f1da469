//! Sweep tick loop.
//!
//! [`run_session`] drives the store's expiry: once per tick it reads the
//! clock, sweeps, and reports to a [`TickCallback`]. Between ticks it
//! sleeps for the control's interval, waking early if a stop is
//! requested. It returns on stop or once `max_ticks` ticks have run.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tonyn_store::{EphemeralStore, KeyValueBackend};
use tracing::{debug, info};

use crate::clock::Clock;
use crate::session::{SessionControl, SessionEndReason};

/// Errors that can occur during the session run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The tick interval is zero, which would spin without yielding.
    #[error("tick interval must be positive")]
    ZeroInterval,
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickSummary {
    /// 1-based tick number.
    pub tick: u64,
    /// Clock reading used for the sweep.
    pub now: DateTime<Utc>,
    /// Posts removed by this tick's sweep.
    pub removed_posts: usize,
    /// Moments removed by this tick's sweep.
    pub removed_moments: usize,
    /// Posts remaining after the sweep.
    pub live_posts: usize,
}

/// Result of the session run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRunResult {
    /// Why the loop returned.
    pub end_reason: SessionEndReason,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// The last tick summary, if any tick completed.
    pub final_summary: Option<TickSummary>,
}

/// Callback invoked after each tick.
pub trait TickCallback: Send {
    /// Called after a tick's sweep completes.
    fn on_tick(&mut self, summary: &TickSummary);
}

/// A no-op tick callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary) {}
}

/// Run the sweep loop until a stop is requested or the tick bound is
/// reached.
///
/// The first sweep happens immediately. A stop requested during the
/// interval sleep ends the loop without another sweep.
///
/// # Errors
///
/// Returns [`RunnerError::ZeroInterval`] if the tick interval is zero when
/// the loop starts or before a sleep.
pub async fn run_session<B: KeyValueBackend>(
    store: &mut EphemeralStore<B>,
    clock: &dyn Clock,
    control: &Arc<SessionControl>,
    callback: &mut dyn TickCallback,
) -> Result<SessionRunResult, RunnerError> {
    let mut total_ticks: u64 = 0;
    let mut last_summary: Option<TickSummary> = None;

    if control.tick_interval_ms() == 0 {
        return Err(RunnerError::ZeroInterval);
    }

    info!(
        session_id = %store.session_id(),
        tick_interval_ms = control.tick_interval_ms(),
        max_ticks = control.max_ticks(),
        "Session tick loop starting"
    );

    loop {
        // --- Check stop request (before tick) ---
        if control.is_stop_requested() {
            info!(total_ticks, "Stop requested");
            return Ok(SessionRunResult {
                end_reason: SessionEndReason::StopRequested,
                total_ticks,
                final_summary: last_summary,
            });
        }

        // --- Sweep ---
        let now = clock.now();
        let report = store.sweep(now);
        total_ticks = total_ticks.saturating_add(1);

        let summary = TickSummary {
            tick: total_ticks,
            now,
            removed_posts: report.removed_posts.len(),
            removed_moments: report.removed_moments.len(),
            live_posts: store.posts().len(),
        };
        debug!(
            tick = summary.tick,
            removed_posts = summary.removed_posts,
            removed_moments = summary.removed_moments,
            live_posts = summary.live_posts,
            "Tick"
        );
        callback.on_tick(&summary);

        // --- Check tick limit (after tick) ---
        if control.tick_limit_reached(total_ticks) {
            info!(total_ticks, max_ticks = control.max_ticks(), "Tick limit reached");
            return Ok(SessionRunResult {
                end_reason: SessionEndReason::MaxTicksReached,
                total_ticks,
                final_summary: Some(summary),
            });
        }
        last_summary = Some(summary);

        // --- Sleep for tick interval, or until stopped ---
        let interval_ms = control.tick_interval_ms();
        if interval_ms == 0 {
            return Err(RunnerError::ZeroInterval);
        }
        tokio::select! {
            () = tokio::time::sleep(Duration::from_millis(interval_ms)) => {}
            () = control.stopped() => {}
        }
    }
}

/// Log the end of a session run.
pub fn log_session_end(result: &SessionRunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_live_posts = result.final_summary.as_ref().map(|s| s.live_posts),
        "Session tick loop ended"
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use tonyn_store::{FeedScope, MemoryBackend, PostContent, SeedData, StoreOptions};

    use super::*;
    use crate::clock::ManualClock;
    use crate::config::SessionConfig;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    fn control(tick_interval_ms: u64, max_ticks: u64) -> Arc<SessionControl> {
        Arc::new(SessionControl::new(&SessionConfig {
            tick_interval_ms,
            max_ticks,
        }))
    }

    /// Records each summary and moves the shared clock one second.
    struct Recorder {
        clock: Arc<ManualClock>,
        summaries: Vec<TickSummary>,
    }

    impl TickCallback for Recorder {
        fn on_tick(&mut self, summary: &TickSummary) {
            self.summaries.push(summary.clone());
            self.clock.advance(TimeDelta::seconds(1));
        }
    }

    fn store_with_post(ttl_seconds: u64) -> EphemeralStore<MemoryBackend> {
        let mut store = EphemeralStore::initialize(
            MemoryBackend::new(),
            SeedData::empty(),
            &StoreOptions::default(),
            t0(),
        );
        store
            .create_post(
                FeedScope::Home,
                PostContent::Text("short lived".to_owned()),
                ttl_seconds,
                t0(),
            )
            .unwrap();
        store
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_by_max_ticks_and_sweeps_on_schedule() {
        let mut store = store_with_post(3);
        let clock = Arc::new(ManualClock::new(t0()));
        let mut recorder = Recorder {
            clock: Arc::clone(&clock),
            summaries: Vec::new(),
        };
        let control = control(1000, 5);

        let result = run_session(&mut store, clock.as_ref(), &control, &mut recorder)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        let removed: Vec<usize> = recorder.summaries.iter().map(|s| s.removed_posts).collect();
        // Ticks read t0, +1s, +2s, +3s, +4s; the post expires at +3s.
        assert_eq!(removed, vec![0, 0, 0, 1, 0]);
        assert_eq!(result.final_summary.map(|s| s.live_posts), Some(0));
        assert!(store.posts().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_wakes_the_loop_mid_sleep() {
        let mut store = store_with_post(60);
        let clock = ManualClock::new(t0());
        let control = control(1000, 0);
        let stopper = Arc::clone(&control);
        let mut callback = NoOpCallback;
        let started = tokio::time::Instant::now();

        let (result, ()) = tokio::join!(
            run_session(&mut store, &clock, &control, &mut callback),
            async move {
                tokio::time::sleep(Duration::from_millis(2500)).await;
                stopper.request_stop();
            }
        );
        let result = result.unwrap();

        assert_eq!(result.end_reason, SessionEndReason::StopRequested);
        // Ticks at 0ms, 1000ms and 2000ms; the stop at 2500ms cuts the
        // third sleep short.
        assert_eq!(result.total_ticks, 3);
        assert_eq!(started.elapsed(), Duration::from_millis(2500));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_start_runs_no_ticks() {
        let mut store = store_with_post(60);
        let control = control(1000, 0);
        control.request_stop();

        let result = run_session(&mut store, &ManualClock::new(t0()), &control, &mut NoOpCallback)
            .await
            .unwrap();

        assert_eq!(result.end_reason, SessionEndReason::StopRequested);
        assert_eq!(result.total_ticks, 0);
        assert!(result.final_summary.is_none());
    }

    #[tokio::test]
    async fn zero_interval_is_rejected() {
        let mut store = store_with_post(60);
        let result = run_session(
            &mut store,
            &ManualClock::new(t0()),
            &control(0, 3),
            &mut NoOpCallback,
        )
        .await;
        assert!(matches!(result, Err(RunnerError::ZeroInterval)));
    }
}
