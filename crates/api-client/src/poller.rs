//! Background refresh of the selected series.
//!
//! At most one polling task runs at a time. Every restart bumps an epoch and
//! tags the events it produces with it, so a consumer drops anything that a
//! cancelled task delivered late.

use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

use vigil_core::selector::selector_for;
use vigil_core::{Selection, SeriesMap};

use crate::metrics::{fetch_selector, MetricsSource};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub enum PollEvent {
    /// A fetch is in flight.
    Started { epoch: u64 },
    /// Fresh series; replaces whatever the consumer held.
    Updated { epoch: u64, series: SeriesMap },
    /// The fetch failed; the consumer keeps its last series.
    Failed { epoch: u64, error: String },
    /// Selection became empty; the consumer drops its series.
    Cleared { epoch: u64 },
}

impl PollEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            Self::Started { epoch }
            | Self::Updated { epoch, .. }
            | Self::Failed { epoch, .. }
            | Self::Cleared { epoch } => *epoch,
        }
    }
}

pub struct Poller<S: MetricsSource> {
    source: Arc<S>,
    interval: Duration,
    runtime: Handle,
    tx: mpsc::UnboundedSender<PollEvent>,
    task: Option<JoinHandle<()>>,
    epoch: u64,
}

impl<S: MetricsSource> Poller<S> {
    /// Tasks are spawned on `runtime`, so the poller itself can live on a
    /// thread that is not inside the runtime.
    pub fn new(
        source: Arc<S>,
        interval: Duration,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<PollEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let poller = Self {
            source,
            interval,
            runtime,
            tx,
            task: None,
            epoch: 0,
        };
        (poller, rx)
    }

    /// Epoch of the most recent restart or stop.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Cancel the running task and start one for `selection`: an immediate
    /// fetch, then one every interval. An inactive selection only emits
    /// [`PollEvent::Cleared`].
    pub fn restart(&mut self, selection: &Selection) -> u64 {
        self.cancel();
        self.epoch += 1;
        let epoch = self.epoch;

        let Some(selector) = selector_for(selection) else {
            debug!(epoch, "selection empty, polling stopped");
            let _ = self.tx.send(PollEvent::Cleared { epoch });
            return epoch;
        };

        debug!(epoch, %selector, "polling restarted");
        let task = run(
            Arc::clone(&self.source),
            selector,
            self.interval,
            epoch,
            self.tx.clone(),
        );
        self.task = Some(self.runtime.spawn(task));
        epoch
    }

    /// Cancel polling. Events still in the channel carry a stale epoch.
    pub fn stop(&mut self) {
        if self.task.is_some() {
            debug!(epoch = self.epoch, "polling stopped");
        }
        self.cancel();
        self.epoch += 1;
    }

    fn cancel(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl<S: MetricsSource> Drop for Poller<S> {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn run<S: MetricsSource>(
    source: Arc<S>,
    selector: String,
    interval: Duration,
    epoch: u64,
    tx: mpsc::UnboundedSender<PollEvent>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if tx.send(PollEvent::Started { epoch }).is_err() {
            return;
        }
        let event = match fetch_selector(source.as_ref(), &selector).await {
            Ok(series) => PollEvent::Updated { epoch, series },
            Err(e) => {
                warn!("metrics poll failed: {e}");
                PollEvent::Failed {
                    epoch,
                    error: e.to_string(),
                }
            }
        };
        if tx.send(event).is_err() {
            return;
        }
    }
}
