use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::ScheduleError;
use crate::services::calendar::CalendarViewModel;

/// Periodically re-evaluates "now" so elapsed slots flip to past without a
/// reload.
pub struct StatusTicker {
    view_model: Arc<CalendarViewModel>,
    period: Duration,
    shutdown: watch::Sender<bool>,
}

impl std::fmt::Debug for StatusTicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusTicker")
            .field("period", &self.period)
            .finish_non_exhaustive()
    }
}

impl StatusTicker {
    /// Fails on a zero `period`, which `tokio::time::interval` cannot run.
    pub fn new(view_model: Arc<CalendarViewModel>, period: Duration) -> Result<Self, ScheduleError> {
        if period.is_zero() {
            return Err(ScheduleError::Validation(
                "Slot refresh interval must be greater than zero".to_string(),
            ));
        }

        let (shutdown, _) = watch::channel(false);
        Ok(Self {
            view_model,
            period,
            shutdown,
        })
    }

    pub fn start(&self) -> JoinHandle<()> {
        let view_model = Arc::clone(&self.view_model);
        let period = self.period;
        let mut shutdown = self.shutdown.subscribe();

        info!(
            "Starting slot status ticker for doctor {} every {:?}",
            view_model.doctor_id(),
            period
        );

        tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticks.tick() => {
                        let elapsed = view_model.tick().await;
                        if elapsed > 0 {
                            debug!("Ticker flipped {} slots to past", elapsed);
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            debug!("Slot status ticker stopping");
                            break;
                        }
                    }
                }
            }
        })
    }

    pub fn shutdown(&self) {
        info!("Stopping slot status ticker");
        self.shutdown.send_replace(true);
    }
}
