// ── Periodic poller ──
//
// Runs the fetch-and-normalize cycle on a fixed interval and publishes the
// result through a watch channel. A cycle runs to completion before the
// next tick is considered; ticks missed while a cycle was in flight are
// delayed rather than bunched up. A failed cycle keeps the previous list
// (marked unavailable) and waits for the next tick. There is no backoff
// beyond the interval itself.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use govee_api::GoveeClient;

use crate::error::CoreError;
use crate::telemetry::Thermometer;

const MIN_PERIOD: Duration = Duration::from_secs(1);

/// What the poller last published.
#[derive(Debug, Clone, Default)]
pub struct PollState {
    /// Thermometers from the most recent successful cycle.
    pub thermometers: Arc<Vec<Thermometer>>,
    /// `false` until the first success, and after any failed cycle.
    pub available: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Completed cycles, successful or not.
    pub cycles: u64,
}

/// Run a single fetch-and-normalize cycle.
pub async fn poll_once(client: &GoveeClient) -> Result<Vec<Thermometer>, CoreError> {
    let devices = client.get_devices().await?;
    Ok(devices.iter().map(Thermometer::from_device).collect())
}

/// Handle to a running poll task.
pub struct Poller {
    state: watch::Receiver<PollState>,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Start polling immediately, then every `period`.
    ///
    /// The task stops when `cancel` (or a parent of it) is cancelled, or
    /// when [`shutdown`](Self::shutdown) is called.
    pub fn spawn(client: Arc<GoveeClient>, period: Duration, cancel: CancellationToken) -> Self {
        let (tx, rx) = watch::channel(PollState::default());
        let period = period.max(MIN_PERIOD);
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(poll_task(client, period, task_cancel, tx));
        info!(interval_secs = period.as_secs(), "poller started");
        Self {
            state: rx,
            cancel,
            handle,
        }
    }

    /// A receiver that is notified after every cycle.
    pub fn subscribe(&self) -> watch::Receiver<PollState> {
        self.state.clone()
    }

    /// The most recently published state.
    pub fn state(&self) -> PollState {
        self.state.borrow().clone()
    }

    /// Stop the task and wait for it to finish.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!(error = %e, "poll task ended abnormally");
        }
        debug!("poller stopped");
    }
}

async fn poll_task(
    client: Arc<GoveeClient>,
    period: Duration,
    cancel: CancellationToken,
    tx: watch::Sender<PollState>,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                debug!("poll tick");
                let result = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    result = poll_once(&client) => result,
                };
                record(&tx, result);
            }
        }
    }
}

fn record(tx: &watch::Sender<PollState>, result: Result<Vec<Thermometer>, CoreError>) {
    tx.send_modify(|state| {
        state.cycles += 1;
        match result {
            Ok(thermometers) => {
                debug!(count = thermometers.len(), "poll cycle succeeded");
                state.thermometers = Arc::new(thermometers);
                state.available = true;
                state.last_success = Some(Utc::now());
                state.last_error = None;
            }
            Err(e) => {
                warn!(error = %e, "poll cycle failed; keeping previous readings");
                state.available = false;
                state.last_error = Some(e.to_string());
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::TelemetrySnapshot;

    fn thermometer(mac: &str) -> Thermometer {
        Thermometer {
            mac: mac.into(),
            name: mac.into(),
            sku: "H5111".into(),
            firmware_version: None,
            hardware_version: None,
            telemetry: TelemetrySnapshot::default(),
        }
    }

    #[test]
    fn success_replaces_list_and_failure_keeps_it() {
        let (tx, rx) = watch::channel(PollState::default());

        record(&tx, Ok(vec![thermometer("a"), thermometer("b")]));
        {
            let state = rx.borrow();
            assert!(state.available);
            assert_eq!(state.thermometers.len(), 2);
            assert!(state.last_success.is_some());
        }

        record(
            &tx,
            Err(CoreError::Api {
                message: "boom".into(),
                status: Some(500),
            }),
        );
        {
            let state = rx.borrow();
            assert!(!state.available);
            assert_eq!(state.thermometers.len(), 2);
            assert!(state.last_error.as_deref().is_some_and(|e| e.contains("boom")));
            assert_eq!(state.cycles, 2);
        }

        record(&tx, Ok(vec![thermometer("c")]));
        let state = rx.borrow();
        assert!(state.available);
        assert_eq!(state.thermometers.len(), 1);
        assert_eq!(state.thermometers[0].mac, "c");
        assert!(state.last_error.is_none());
    }
}
