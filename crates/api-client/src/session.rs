//! Login state on top of the backend's cookie session.
//!
//! The cookie is the only authority. The remembered display name is a hint
//! for greeting the user and is never trusted for access decisions.

use tracing::{debug, info, warn};

use vigil_core::validate;
use vigil_local_store::DisplayNameStore;

use crate::client::ApiClient;
use crate::error::ClientError;

/// Shown when the session is live but no username was remembered.
pub const PLACEHOLDER_NAME: &str = "User";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthState {
    pub authenticated: bool,
    pub user: Option<User>,
    /// True until the first [`SessionController::check_auth`] settles.
    pub loading: bool,
}

impl AuthState {
    pub fn initial() -> Self {
        Self {
            authenticated: false,
            user: None,
            loading: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            authenticated: false,
            user: None,
            loading: false,
        }
    }

    fn signed_in(username: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user: Some(User {
                username: username.into(),
            }),
            loading: false,
        }
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Owns the [`AuthState`]; the only code that changes it.
pub struct SessionController<H> {
    api: ApiClient,
    hints: H,
    state: AuthState,
    remember_name: bool,
}

impl<H: DisplayNameStore> SessionController<H> {
    pub fn new(api: ApiClient, hints: H) -> Self {
        Self {
            api,
            hints,
            state: AuthState::initial(),
            remember_name: true,
        }
    }

    /// Whether a successful login persists the username as display hint.
    pub fn remember_name(mut self, remember: bool) -> Self {
        self.remember_name = remember;
        self
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn display_name(&self) -> Option<&str> {
        self.state.user.as_ref().map(|u| u.username.as_str())
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn hints(&self) -> &H {
        &self.hints
    }

    /// Submit credentials, then confirm the session with a probe.
    ///
    /// Empty fields are rejected before any request. A 4xx/5xx login answer,
    /// a failed transport, or a probe that does not pass all end unauthenticated.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), ClientError> {
        let username = validate::require("username", username)?;
        validate::require("password", password)?;

        let status = match self.api.login(username, password).await {
            Ok(status) => status,
            Err(e) => {
                self.sign_out();
                return Err(e);
            }
        };
        if status.is_client_error() || status.is_server_error() {
            self.sign_out();
            return Err(ClientError::Authentication(format!(
                "login rejected ({status})"
            )));
        }

        match self.api.probe_session().await {
            Ok(probe) if probe.is_success() => {
                info!(username, "logged in");
                self.state = AuthState::signed_in(username);
                if self.remember_name
                    && let Err(e) = self.hints.save(username)
                {
                    warn!("failed to remember display name: {e}");
                }
                Ok(())
            }
            Ok(probe) => {
                self.sign_out();
                Err(ClientError::Authentication(format!(
                    "session not accepted after login ({probe})"
                )))
            }
            Err(e) => {
                self.sign_out();
                Err(ClientError::Authentication(format!(
                    "session check after login failed: {e}"
                )))
            }
        }
    }

    /// Ask the backend to drop the session. Local state is cleared whether
    /// or not the request succeeds.
    pub async fn logout(&mut self) {
        if let Err(e) = self.api.logout().await {
            warn!("logout request failed: {e}");
        }
        self.sign_out();
        info!("logged out");
    }

    /// Probe the backend and settle the state. Never fails: anything other
    /// than a 2xx probe means unauthenticated.
    pub async fn check_auth(&mut self) -> &AuthState {
        match self.api.probe_session().await {
            Ok(status) if status.is_success() => {
                let name = if self.remember_name {
                    match self.hints.load() {
                        Ok(name) => name,
                        Err(e) => {
                            warn!("failed to read display name: {e}");
                            None
                        }
                    }
                } else {
                    None
                };
                self.state =
                    AuthState::signed_in(name.unwrap_or_else(|| PLACEHOLDER_NAME.to_string()));
            }
            Ok(status) if status.is_redirection() => {
                debug!(%status, "session probe redirected, not authenticated");
                self.sign_out();
            }
            Ok(status) => {
                debug!(%status, "session probe rejected");
                self.sign_out();
            }
            Err(e) => {
                warn!("session probe failed: {e}");
                self.sign_out();
            }
        }
        &self.state
    }

    /// A protected call came back rejected; drop to unauthenticated without
    /// talking to the backend.
    pub fn invalidate(&mut self) {
        if self.state.authenticated {
            info!("session expired");
        }
        self.sign_out();
    }

    fn sign_out(&mut self) {
        self.state = AuthState::signed_out();
        if let Err(e) = self.hints.clear() {
            warn!("failed to clear display name: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vigil_local_store::MemoryDisplayNameStore;

    fn controller() -> SessionController<MemoryDisplayNameStore> {
        // Nothing listens on port 9; these tests never reach the network.
        let api = ApiClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        SessionController::new(api, MemoryDisplayNameStore::with_name("old"))
    }

    #[test]
    fn starts_loading_and_unauthenticated() {
        let c = controller();
        assert_eq!(c.state(), &AuthState::initial());
        assert!(c.state().loading);
        assert!(c.display_name().is_none());
    }

    #[tokio::test]
    async fn blank_credentials_fail_validation_without_request() {
        let mut c = controller();
        let err = c.login("  ", "pw").await.unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
        assert_eq!(err.to_string(), "username is required");

        let err = c.login("admin", "").await.unwrap_err();
        assert_eq!(err.to_string(), "password is required");
        assert_eq!(c.state(), &AuthState::initial());
    }

    #[test]
    fn invalidate_clears_state_and_hint() {
        let mut c = controller();
        c.state = AuthState::signed_in("admin");
        c.invalidate();
        assert_eq!(
            c.state(),
            &AuthState {
                authenticated: false,
                user: None,
                loading: false
            }
        );
        assert_eq!(c.hints.load().unwrap(), None);
    }
}
