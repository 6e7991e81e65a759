use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use screening_core::Clock;
use screening_core::model::RestartSignal;
use storage::ProgressStore;

/// Turns stale activity stamps into restart signals.
#[derive(Clone)]
pub struct IdleMonitor {
    progress: ProgressStore,
    timeout: Duration,
}

impl IdleMonitor {
    #[must_use]
    pub fn new(progress: ProgressStore, timeout: Duration) -> Self {
        Self { progress, timeout }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn touch(&self, now: DateTime<Utc>) {
        self.progress.touch_activity(now);
    }

    /// Compare the last activity stamp with `now`.
    ///
    /// Only fires while an attempt is underway. Firing records `now` as the
    /// new activity stamp so the same idle period is reported once.
    #[must_use]
    pub fn poll(&self, now: DateTime<Utc>) -> Option<RestartSignal> {
        if !self.progress.progress().assessment_underway() {
            return None;
        }
        let last = self.progress.last_activity()?;
        if now - last < self.timeout {
            return None;
        }
        info!(
            idle_secs = (now - last).num_seconds(),
            "operator idle past timeout, requesting restart"
        );
        self.touch(now);
        Some(RestartSignal::idle(now))
    }
}

/// Background poller. Dropping it cancels the timer.
pub struct IdleWatcher {
    task: JoinHandle<()>,
}

impl IdleWatcher {
    /// Poll `monitor` every `every` on the current tokio runtime.
    ///
    /// Signals arrive on the returned receiver; the channel closes once the
    /// watcher is dropped.
    #[must_use]
    pub fn spawn(
        monitor: IdleMonitor,
        clock: Clock,
        every: StdDuration,
    ) -> (Self, mpsc::UnboundedReceiver<RestartSignal>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                if let Some(signal) = monitor.poll(clock.now()) {
                    if tx.send(signal).is_err() {
                        break;
                    }
                }
            }
        });
        (Self { task }, rx)
    }
}

impl Drop for IdleWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use screening_core::model::{FlowKey, RestartOrigin};
    use screening_core::time::fixed_now;

    fn underway_store() -> ProgressStore {
        let progress = ProgressStore::in_memory();
        progress.set_flag(FlowKey::DisclaimerAccepted, true);
        progress.set_flag(FlowKey::FalsePositive, true);
        progress.set_flag(FlowKey::PreTestCompleted, true);
        progress
    }

    #[test]
    fn fires_once_after_timeout() {
        let progress = underway_store();
        let monitor = IdleMonitor::new(progress, Duration::minutes(15));
        let start = fixed_now();
        monitor.touch(start);

        assert!(monitor.poll(start + Duration::minutes(14)).is_none());
        let signal = monitor.poll(start + Duration::minutes(15)).unwrap();
        assert_eq!(signal.origin, RestartOrigin::Idle);
        assert!(monitor.poll(start + Duration::minutes(16)).is_none());
    }

    #[test]
    fn quiet_before_assessment_starts() {
        let monitor = IdleMonitor::new(ProgressStore::in_memory(), Duration::minutes(1));
        monitor.touch(fixed_now());
        assert!(monitor.poll(fixed_now() + Duration::hours(2)).is_none());
    }

    #[test]
    fn no_activity_stamp_means_no_signal() {
        let monitor = IdleMonitor::new(underway_store(), Duration::minutes(1));
        assert!(monitor.poll(fixed_now()).is_none());
    }

    #[tokio::test]
    async fn watcher_delivers_and_stops_on_drop() {
        let progress = underway_store();
        let monitor = IdleMonitor::new(progress, Duration::zero());
        monitor.touch(fixed_now());

        let (watcher, mut rx) =
            IdleWatcher::spawn(monitor, Clock::default(), StdDuration::from_millis(5));
        let first = tokio::time::timeout(StdDuration::from_secs(2), rx.recv())
            .await
            .expect("signal in time");
        assert!(first.is_some());

        drop(watcher);
        let closed = tokio::time::timeout(StdDuration::from_secs(2), async {
            while rx.recv().await.is_some() {}
        })
        .await;
        assert!(closed.is_ok(), "channel should close once the watcher is dropped");
    }
}
