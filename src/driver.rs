//! Driver spawns and manages the controller task

use std::sync::Arc;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::controller::Controller;
use crate::hal::{Clock, OutputSurface, StatusLed, Transport};
use crate::heartbeat::HeartbeatRecord;

/// Period of the controller loop.
pub const TICK_PERIOD: Duration = Duration::from_millis(1);

/// Result of spawning the controller task
pub struct DriverChannels {
    /// Latest emitted heartbeat
    pub heartbeats: watch::Receiver<Option<Arc<HeartbeatRecord>>>,
    /// Cancellation token for graceful shutdown
    pub cancel: CancellationToken,
    /// Completes once the task has stopped
    pub task: JoinHandle<()>,
}

impl DriverChannels {
    /// Stream of heartbeats as they are emitted. Slow consumers only see the latest.
    pub fn heartbeat_stream(&self) -> impl Stream<Item = Arc<HeartbeatRecord>> + Send + use<> {
        WatchStream::new(self.heartbeats.clone()).filter_map(|opt| async move { opt })
    }

    /// Most recent heartbeat, if any was emitted yet.
    pub fn latest_heartbeat(&self) -> Option<Arc<HeartbeatRecord>> {
        self.heartbeats.borrow().clone()
    }

    /// Cancel the task and wait for it to stop.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.task.await {
            debug!("Controller task ended abnormally: {}", e);
        }
    }
}

/// Driver runs a [`Controller`] on its own task
///
/// The task is the sole owner of the controller and with it the frame slots,
/// counters and session state. Heartbeats leave the task through a watch channel,
/// a single-slot handoff that never blocks the loop.
pub struct Driver;

impl Driver {
    /// Spawn the controller loop, ticking every [`TICK_PERIOD`] with time from `clock`
    pub fn spawn<T, S, L, C>(controller: Controller<T, S, L>, clock: C) -> DriverChannels
    where
        T: Transport,
        S: OutputSurface,
        L: StatusLed,
        C: Clock + Send + 'static,
    {
        let (heartbeat_tx, heartbeat_rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let cancel_task = cancel.clone();

        let task = tokio::spawn(async move {
            Self::controller_task(controller, clock, heartbeat_tx, cancel_task).await;
        });

        DriverChannels { heartbeats: heartbeat_rx, cancel, task }
    }

    async fn controller_task<T, S, L, C>(
        mut controller: Controller<T, S, L>,
        clock: C,
        heartbeat_tx: watch::Sender<Option<Arc<HeartbeatRecord>>>,
        cancel: CancellationToken,
    ) where
        T: Transport,
        S: OutputSurface,
        L: StatusLed,
        C: Clock,
    {
        info!("Controller task started");
        let mut interval = tokio::time::interval(TICK_PERIOD);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut heartbeat_count = 0u64;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Controller task cancelled");
                    break;
                }
                _ = interval.tick() => {}
            }

            if let Some(record) = controller.tick(clock.now_ms()) {
                heartbeat_count += 1;
                trace!("Heartbeat {} at uptime {} ms", heartbeat_count, record.uptime_ms);
                // Replaces the previous record even when nobody is watching
                heartbeat_tx.send_replace(Some(Arc::new(record)));
            }
        }

        info!("Controller task ended ({} heartbeats)", heartbeat_count);
    }
}
