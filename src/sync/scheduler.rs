use super::controller::LiveDataController;
use crate::core::SourceId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Periodically refreshes every source and accepts manual per-source refreshes.
///
/// Each fetch runs as its own task, so a slow source never delays the others
/// and stopping the timer leaves fetches already in flight alone.
pub struct RefreshScheduler {
    controller: LiveDataController,
    interval: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
    in_flight: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

async fn track(in_flight: &Mutex<Vec<JoinHandle<()>>>, handles: Vec<JoinHandle<()>>) {
    let mut tracked = in_flight.lock().await;
    tracked.retain(|handle| !handle.is_finished());
    tracked.extend(handles);
}

impl RefreshScheduler {
    pub fn new(controller: LiveDataController, interval: Duration) -> Self {
        Self {
            controller,
            interval,
            timer: Mutex::new(None),
            in_flight: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn controller(&self) -> &LiveDataController {
        &self.controller
    }

    pub async fn is_running(&self) -> bool {
        self.timer
            .lock()
            .await
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }

    /// Refreshes all sources now, then again on every interval until [`stop`](Self::stop).
    pub async fn start(&self) {
        let mut timer = self.timer.lock().await;
        if timer.as_ref().is_some_and(|t| !t.is_finished()) {
            debug!("Refresh scheduler already running");
            return;
        }

        info!(
            interval_secs = self.interval.as_secs(),
            "Starting refresh scheduler"
        );
        track(&self.in_flight, self.controller.spawn_refresh_all()).await;

        let period = self.interval;
        let first_tick = match Instant::now().checked_add(period) {
            Some(at) if !period.is_zero() => at,
            _ => {
                warn!(
                    interval_secs = period.as_secs(),
                    "Unusable refresh interval, periodic refresh disabled"
                );
                return;
            }
        };

        let controller = self.controller.clone();
        let in_flight = Arc::clone(&self.in_flight);
        *timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if controller.is_shut_down().await {
                    debug!("Controller shut down, stopping refresh timer");
                    break;
                }
                debug!("Periodic refresh tick");
                track(&in_flight, controller.spawn_refresh_all()).await;
            }
        }));
    }

    /// Cancels the periodic timer. Returns false if it was not running.
    pub async fn stop(&self) -> bool {
        match self.timer.lock().await.take() {
            Some(timer) => {
                timer.abort();
                info!("Refresh scheduler stopped");
                true
            }
            None => false,
        }
    }

    /// Refreshes a single source out of band; the timer phase is untouched.
    pub async fn trigger_refresh(&self, id: SourceId) {
        debug!(source = %id, "Manual refresh requested");
        track(&self.in_flight, vec![self.controller.spawn_fetch(id)]).await;
    }

    pub async fn trigger_refresh_all(&self) {
        debug!("Manual refresh of all sources requested");
        track(&self.in_flight, self.controller.spawn_refresh_all()).await;
    }

    /// Waits for every fetch issued so far to settle.
    pub async fn wait_idle(&self) {
        let handles = std::mem::take(&mut *self.in_flight.lock().await);
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "Fetch task ended abnormally");
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.get_mut().take() {
            timer.abort();
        }
    }
}
