use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use tokio::runtime::Handle;
use tracing::debug;
use vigil_api::{JOB_LABEL, METRIC_NAME_LABEL};
use vigil_api_client::{fetch_series, ApiClient, PollEvent, Poller, RetryConfig};
use vigil_core::Selection;

use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Subcommand)]
pub enum MetricsAction {
    /// List metric names known to the backend
    Names,
    /// List job labels known to the backend
    Jobs,
    /// Fetch the selected series once
    Query {
        #[command(flatten)]
        target: SeriesArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Poll the selected series until interrupted
    Watch {
        #[command(flatten)]
        target: SeriesArgs,
        /// Seconds between polls (default: metrics.poll_interval_secs)
        #[arg(long)]
        interval: Option<u64>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct SeriesArgs {
    /// Metric names to select
    #[arg(required = true)]
    pub metrics: Vec<String>,
    /// Restrict to one job
    #[arg(long)]
    pub job: Option<String>,
}

impl SeriesArgs {
    pub fn selection(&self) -> Selection {
        Selection::new(self.metrics.iter().cloned(), self.job.clone())
    }
}

/// Settings the metrics commands take from the config file.
#[derive(Debug, Clone)]
pub struct MetricsSettings {
    pub retry: RetryConfig,
    pub poll_interval: Duration,
}

pub async fn run(api: ApiClient, action: MetricsAction, settings: MetricsSettings) -> Result<()> {
    match action {
        MetricsAction::Names => print_label_values(&api, METRIC_NAME_LABEL, &settings.retry).await,
        MetricsAction::Jobs => print_label_values(&api, JOB_LABEL, &settings.retry).await,
        MetricsAction::Query { target, format } => {
            let series = fetch_series(&api, &target.selection())
                .await
                .context("fetch series")?;
            output::write_series(&series, format, &mut std::io::stdout())
        }
        MetricsAction::Watch { target, interval } => {
            let interval = interval
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(settings.poll_interval);
            watch(api, target.selection(), interval).await
        }
    }
}

async fn print_label_values(api: &ApiClient, label: &str, retry: &RetryConfig) -> Result<()> {
    let values = api
        .label_values_with_retry(label, retry)
        .await
        .with_context(|| format!("load {label} values"))?;
    for v in values {
        println!("{v}");
    }
    Ok(())
}

async fn watch(api: ApiClient, selection: Selection, interval: Duration) -> Result<()> {
    let (mut poller, mut rx) = Poller::new(Arc::new(api), interval, Handle::current());
    let epoch = poller.restart(&selection);
    eprintln!(
        "Watching every {}s, press Ctrl-C to stop",
        interval.as_secs()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = rx.recv() => {
                let Some(event) = event else { break };
                if event.epoch() != epoch {
                    continue;
                }
                match event {
                    PollEvent::Updated { series, .. } => {
                        println!("--- {}", chrono::Local::now().format("%H:%M:%S"));
                        output::write_series(&series, OutputFormat::Text, &mut std::io::stdout())?;
                    }
                    PollEvent::Failed { error, .. } => eprintln!("poll failed: {error}"),
                    other => debug!(epoch = other.epoch(), "poll event"),
                }
            }
        }
    }
    poller.stop();
    Ok(())
}
