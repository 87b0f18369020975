use std::{sync::Arc, time::Duration};

use cadenza_net::{Headers, Net};
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::{trace, warn};
use url::Url;

/// Shortest heartbeat period accepted; shorter values are raised to it.
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(1);

/// Cancellable periodic liveness ping for one session.
///
/// The first ping fires one interval after spawning. Failures are logged
/// and otherwise ignored. Dropping the handle cancels the task.
#[derive(Debug)]
pub struct HeartbeatHandle {
    cancel: CancellationToken,
}

impl HeartbeatHandle {
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(
        net: Arc<dyn Net>,
        url: Url,
        headers: Option<Headers>,
        interval: Duration,
    ) -> Self {
        let interval = interval.max(MIN_HEARTBEAT_INTERVAL);
        let cancel = CancellationToken::new();
        tokio::spawn(run(net, url, headers, interval, cancel.clone()));
        Self { cancel }
    }

    /// Stop the schedule. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Drop for HeartbeatHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    net: Arc<dyn Net>,
    url: Url,
    headers: Option<Headers>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = net.post(url.clone(), headers.clone()) => match result {
                Ok(resp) if resp.is_success() => trace!(%url, status = resp.status, "heartbeat ok"),
                Ok(resp) => warn!(%url, status = resp.status, "heartbeat rejected"),
                Err(e) => warn!(%url, error = %e, "heartbeat failed"),
            },
        }
    }
    trace!(%url, "heartbeat stopped");
}
