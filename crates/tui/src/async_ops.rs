use vigil_api::{Agent, CreateAgentRequest};
use vigil_api_client::{
    discover, AuthState, ClientError, Discovery, RetryConfig, SessionController,
};
use vigil_local_store::DisplayNameStore;

/// Commands that require async I/O (network calls).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncCommand {
    // ── Session ───────────────────────────────────────────────────────
    CheckAuth,
    Login { username: String, password: String },
    Logout,

    // ── Agents ────────────────────────────────────────────────────────
    FetchAgents,
    CreateAgent { name: String, token: String },
    DeleteAgent { id: String, name: String },

    // ── Metrics ───────────────────────────────────────────────────────
    Discover,
}

/// Results returned by async commands.
#[derive(Debug)]
pub enum CommandResult {
    // Session
    AuthChecked(AuthState),
    LoggedIn(AuthState, Result<(), String>),
    LoggedOut(AuthState),
    /// A protected call was bounced; the session has been invalidated.
    SessionExpired(AuthState),

    // Agents
    Agents(Result<Vec<Agent>, String>),
    AgentCreated(Result<String, String>), // Ok(name)
    AgentDeleted(Result<String, String>), // Ok(name)

    // Metrics
    Discovered(Discovery),
}

/// Everything a command needs: the session (which owns the HTTP client) and
/// the retry policy for idempotent reads.
pub struct Backend<H> {
    pub session: SessionController<H>,
    pub retry: RetryConfig,
}

pub async fn execute<H: DisplayNameStore>(
    cmd: AsyncCommand,
    backend: &mut Backend<H>,
) -> CommandResult {
    let session = &mut backend.session;
    match cmd {
        // ── Session ───────────────────────────────────────────────────
        AsyncCommand::CheckAuth => CommandResult::AuthChecked(session.check_auth().await.clone()),

        AsyncCommand::Login { username, password } => {
            let result = session.login(&username, &password).await;
            CommandResult::LoggedIn(
                session.state().clone(),
                result.map_err(|e| login_error_message(&e)),
            )
        }

        AsyncCommand::Logout => {
            session.logout().await;
            CommandResult::LoggedOut(session.state().clone())
        }

        // ── Agents ────────────────────────────────────────────────────
        AsyncCommand::FetchAgents => match session.api().list_agents().await {
            Ok(agents) => CommandResult::Agents(Ok(agents)),
            Err(e) if e.is_session_expired() => expire(session),
            Err(e) => CommandResult::Agents(Err(format!("Failed to load agents: {e}"))),
        },

        AsyncCommand::CreateAgent { name, token } => {
            let req = CreateAgentRequest {
                name: name.clone(),
                token,
            };
            match session.api().create_agent(&req).await {
                Ok(()) => CommandResult::AgentCreated(Ok(name)),
                Err(e) if e.is_session_expired() => expire(session),
                Err(e) => CommandResult::AgentCreated(Err(create_error_message(&e))),
            }
        }

        AsyncCommand::DeleteAgent { id, name } => match session.api().delete_agent(&id).await {
            Ok(()) => CommandResult::AgentDeleted(Ok(name)),
            Err(e) if e.is_session_expired() => expire(session),
            Err(e) => CommandResult::AgentDeleted(Err(format!("Failed to delete agent: {e}"))),
        },

        // ── Metrics ───────────────────────────────────────────────────
        AsyncCommand::Discover => {
            let found = discover(session.api(), &backend.retry).await;
            if found.session_expired() {
                return expire(session);
            }
            CommandResult::Discovered(found)
        }
    }
}

fn expire<H: DisplayNameStore>(session: &mut SessionController<H>) -> CommandResult {
    session.invalidate();
    CommandResult::SessionExpired(session.state().clone())
}

fn login_error_message(err: &ClientError) -> String {
    match err {
        ClientError::Validation(v) => v.to_string(),
        ClientError::Authentication(_) => "Invalid username or password".to_string(),
        ClientError::Transport(_) => format!("Cannot reach server: {err}"),
        other => format!("Login failed: {other}"),
    }
}

/// Banner text for a failed create, specific to the backend's status codes.
pub fn create_error_message(err: &ClientError) -> String {
    let detail = match err.status() {
        Some(400) => "name and token must not be empty".to_string(),
        Some(409) => "an agent with this name already exists".to_string(),
        _ => err.server_message().unwrap_or_else(|| err.to_string()),
    };
    format!("Failed to create agent: {detail}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_core::validate::ValidationError;

    fn status(code: u16, body: &str) -> ClientError {
        ClientError::Status {
            status: code,
            body: body.to_string(),
        }
    }

    #[test]
    fn create_errors_are_status_specific() {
        assert_eq!(
            create_error_message(&status(409, "\"trying to create an element already present\"")),
            "Failed to create agent: an agent with this name already exists"
        );
        assert_eq!(
            create_error_message(&status(400, "\"Empty argument, check body\"")),
            "Failed to create agent: name and token must not be empty"
        );
        assert_eq!(
            create_error_message(&status(500, "\"Database error\"")),
            "Failed to create agent: Database error"
        );
    }

    #[test]
    fn login_errors_are_user_facing() {
        assert_eq!(
            login_error_message(&ClientError::Validation(ValidationError::Required("username"))),
            "username is required"
        );
        assert_eq!(
            login_error_message(&ClientError::Authentication("login rejected (401)".into())),
            "Invalid username or password"
        );
    }
}
