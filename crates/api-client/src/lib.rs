pub mod client;
pub mod error;
pub mod metrics;
pub mod poller;
pub mod retry;
pub mod session;

pub use client::ApiClient;
pub use error::ClientError;
pub use metrics::{discover, fetch_series, Discovery, MetricsSource};
pub use poller::{PollEvent, Poller, DEFAULT_POLL_INTERVAL};
pub use retry::RetryConfig;
pub use session::{AuthState, SessionController, User};
pub use vigil_api;
