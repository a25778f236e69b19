mod agents_cmd;
mod auth;
mod config_cmd;
mod metrics_cmd;
mod output;

use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use vigil_api_client::RetryConfig;

use agents_cmd::AgentsAction;
use auth::LoginArgs;
use metrics_cmd::{MetricsAction, MetricsSettings};

#[derive(Parser)]
#[command(
    name = "vigil",
    version,
    about = "Vigil - monitoring dashboard, agent registry and metric queries"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal dashboard (default)
    Dashboard,

    /// Show or update configuration
    Config {
        /// Set the backend URL
        #[arg(long)]
        server: Option<String>,

        /// Set the metrics poll interval in seconds
        #[arg(long)]
        poll_interval: Option<u64>,
    },

    /// Manage registered agents
    Agents {
        #[command(flatten)]
        login: LoginArgs,
        #[command(subcommand)]
        action: AgentsAction,
    },

    /// Discover and query metrics
    Metrics {
        #[command(flatten)]
        login: LoginArgs,
        #[command(subcommand)]
        action: MetricsAction,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        None | Some(Commands::Dashboard) => run_dashboard(),
        Some(Commands::Config {
            server,
            poll_interval,
        }) => {
            init_logging();
            config_cmd::run(server, poll_interval)
        }
        Some(Commands::Agents { login, action }) => {
            init_logging();
            run_agents(login, action)
        }
        Some(Commands::Metrics { login, action }) => {
            init_logging();
            run_metrics(login, action)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Scripted commands log to stderr; the dashboard logs to a file.
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run_dashboard() -> Result<()> {
    vigil_tui::run(config_cmd::load()?)
}

fn run_agents(login: LoginArgs, action: AgentsAction) -> Result<()> {
    let config = config_cmd::load()?;
    let creds = auth::resolve_credentials(&login)?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(auth::with_session(&config, &creds, |api| {
        agents_cmd::run(api, action)
    }))
}

fn run_metrics(login: LoginArgs, action: MetricsAction) -> Result<()> {
    let config = config_cmd::load()?;
    let creds = auth::resolve_credentials(&login)?;
    let settings = MetricsSettings {
        retry: RetryConfig::with_retries(config.metrics.discovery_retries),
        poll_interval: Duration::from_secs(config.metrics.poll_interval_secs),
    };
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(auth::with_session(&config, &creds, |api| {
        metrics_cmd::run(api, action, settings)
    }))
}
