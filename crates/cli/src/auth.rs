use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::info;
use vigil_api_client::{ApiClient, SessionController};
use vigil_local_store::MemoryDisplayNameStore;
use vigil_runtime_config::VigilConfig;

pub const USERNAME_ENV: &str = "VIGIL_USERNAME";
pub const PASSWORD_ENV: &str = "VIGIL_PASSWORD";

#[derive(Debug, Clone, Default, Args)]
pub struct LoginArgs {
    /// Account to log in with (default: $VIGIL_USERNAME)
    #[arg(long, short = 'u', global = true)]
    pub username: Option<String>,
}

pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

/// Username from the flag or environment; password from the environment or
/// a hidden prompt.
pub fn resolve_credentials(args: &LoginArgs) -> Result<Credentials> {
    let username = pick_username(args, std::env::var(USERNAME_ENV).ok())?;
    let password = match std::env::var(PASSWORD_ENV) {
        Ok(p) if !p.is_empty() => p,
        _ => dialoguer::Password::new()
            .with_prompt(format!("Password for {username}"))
            .interact()
            .context("read password")?,
    };
    Ok(Credentials { username, password })
}

fn pick_username(args: &LoginArgs, env_username: Option<String>) -> Result<String> {
    let username = args
        .username
        .clone()
        .or(env_username)
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty());
    match username {
        Some(u) => Ok(u),
        None => bail!("username required: pass --username or set {USERNAME_ENV}"),
    }
}

/// Log in, run `f` with the authenticated client, then log out. The session
/// cookie only lives in memory for the duration of the call.
pub async fn with_session<T, F, Fut>(
    config: &VigilConfig,
    creds: &Credentials,
    f: F,
) -> Result<T>
where
    F: FnOnce(ApiClient) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let api = ApiClient::new(
        &config.server.url,
        Duration::from_secs(config.server.timeout_secs),
    )?;
    let mut session =
        SessionController::new(api, MemoryDisplayNameStore::default()).remember_name(false);
    session
        .login(&creds.username, &creds.password)
        .await
        .with_context(|| format!("login to {} failed", config.server.url))?;
    info!(user = %creds.username, "logged in");

    let result = f(session.api().clone()).await;
    session.logout().await;
    result
}
