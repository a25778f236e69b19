use chrono::{DateTime, Local};
use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use tracing::debug;

use vigil_api::Agent;
use vigil_api_client::{AuthState, PollEvent};
use vigil_core::validate;
use vigil_core::{Selection, SeriesMap, TimeRange};

use crate::async_ops::{AsyncCommand, CommandResult};
use crate::guard::{self, Route};
use crate::views::modal::{ConfirmAction, Modal};

/// Protected screens. Which one is shown also depends on the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Agents,
    Metrics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashLevel {
    Success,
    Error,
    Info,
}

/// Where a banner came from, so a later success can clear its own failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerSource {
    Agents,
    Discovery,
    Poll,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub message: String,
    pub source: BannerSource,
}

// ── Login ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginField {
    #[default]
    Username,
    Password,
}

#[derive(Debug, Default)]
pub struct LoginState {
    pub field: LoginField,
    pub username: String,
    pub password: String,
    pub error: Option<String>,
    pub submitting: bool,
}

// ── Agents ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AgentField {
    #[default]
    Name,
    Token,
}

/// The "register agent" form. A blank token is generated on submit.
#[derive(Debug, Default)]
pub struct AgentForm {
    pub field: AgentField,
    pub name: String,
    pub token: String,
    pub error: Option<String>,
}

#[derive(Debug, Default)]
pub struct AgentsState {
    pub items: Vec<Agent>,
    pub loading: bool,
    pub list_state: ListState,
    pub form: Option<AgentForm>,
    /// Id of the agent whose token was copied last.
    pub copied: Option<String>,
}

impl AgentsState {
    pub fn selected(&self) -> Option<&Agent> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }
}

// ── Metrics ───────────────────────────────────────────────────────────

/// Agent the metrics view was opened for; display only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentContext {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MetricsFocus {
    #[default]
    Names,
    Jobs,
}

#[derive(Debug, Default)]
pub struct MetricsState {
    pub names: Vec<String>,
    pub jobs: Vec<String>,
    pub discovering: bool,
    pub focus: MetricsFocus,
    pub names_state: ListState,
    /// Row 0 is "all jobs", row n is `jobs[n - 1]`.
    pub jobs_state: ListState,
    pub selection: Selection,
    pub series: SeriesMap,
    pub polling: bool,
    /// Epoch of the poll task whose results are accepted.
    pub epoch: u64,
    pub agent: Option<AgentContext>,
    pub last_update: Option<DateTime<Local>>,
}

/// What the event loop should do with the poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollRequest {
    Restart(Selection),
    Stop,
}

pub struct App {
    pub auth: AuthState,
    pub view: View,
    pub server_url: String,
    pub default_range: TimeRange,

    pub login: LoginState,
    pub agents: AgentsState,
    pub metrics: MetricsState,

    pub banner: Option<Banner>,
    pub flash_message: Option<(String, FlashLevel)>,
    pub modal: Option<Modal>,

    // ── Requests for the event loop ───────────────────────────────────
    pub pending_command: Option<AsyncCommand>,
    pub poll_request: Option<PollRequest>,
    pub clipboard_request: Option<String>,
}

impl App {
    pub fn new(server_url: &str, default_range: TimeRange) -> Self {
        let mut metrics = MetricsState::default();
        metrics.selection.time_range = default_range;
        Self {
            auth: AuthState::initial(),
            view: View::Agents,
            server_url: server_url.to_string(),
            default_range,
            login: LoginState::default(),
            agents: AgentsState::default(),
            metrics,
            banner: None,
            flash_message: None,
            modal: None,
            pending_command: Some(AsyncCommand::CheckAuth),
            poll_request: None,
            clipboard_request: None,
        }
    }

    pub fn route(&self) -> Route {
        guard::resolve(&self.auth, self.view)
    }

    /// Returns true when the app should quit.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        // Clear flash message on any key press
        self.flash_message = None;

        // Modal intercepts all keys when active
        if self.modal.is_some() {
            return self.handle_modal_key(key);
        }

        match self.route() {
            Route::Loading => matches!(key, KeyCode::Char('q') | KeyCode::Esc),
            Route::Login => self.handle_login_key(key),
            Route::Protected(View::Agents) => self.handle_agents_key(key),
            Route::Protected(View::Metrics) => self.handle_metrics_key(key),
        }
    }

    // ── Login ─────────────────────────────────────────────────────────

    fn handle_login_key(&mut self, key: KeyCode) -> bool {
        if self.login.submitting {
            return false;
        }
        let form = &mut self.login;
        match key {
            KeyCode::Esc => return true,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.field = match form.field {
                    LoginField::Username => LoginField::Password,
                    LoginField::Password => LoginField::Username,
                };
            }
            KeyCode::Backspace => {
                match form.field {
                    LoginField::Username => form.username.pop(),
                    LoginField::Password => form.password.pop(),
                };
            }
            KeyCode::Char(c) => match form.field {
                LoginField::Username => form.username.push(c),
                LoginField::Password => form.password.push(c),
            },
            KeyCode::Enter => {
                if form.field == LoginField::Username && form.password.is_empty() {
                    form.field = LoginField::Password;
                } else {
                    form.error = None;
                    form.submitting = true;
                    self.pending_command = Some(AsyncCommand::Login {
                        username: form.username.clone(),
                        password: form.password.clone(),
                    });
                }
            }
            _ => {}
        }
        false
    }

    // ── Agents ────────────────────────────────────────────────────────

    fn handle_agents_key(&mut self, key: KeyCode) -> bool {
        if self.agents.form.is_some() {
            self.handle_agent_form_key(key);
            return false;
        }
        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Char('j') | KeyCode::Down => {
                move_cursor(&mut self.agents.list_state, self.agents.items.len(), 1)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                move_cursor(&mut self.agents.list_state, self.agents.items.len(), -1)
            }
            KeyCode::Char('n') => self.agents.form = Some(AgentForm::default()),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(agent) = self.agents.selected() {
                    self.modal = Some(Modal::Confirm {
                        title: "Delete agent".to_string(),
                        message: format!("Delete agent \"{}\"?", agent.name),
                        action: ConfirmAction::DeleteAgent {
                            id: agent.id.clone(),
                            name: agent.name.clone(),
                        },
                    });
                }
            }
            KeyCode::Char('c') => {
                if let Some((id, token)) = self
                    .agents
                    .selected()
                    .map(|a| (a.id.clone(), a.token.clone()))
                {
                    self.clipboard_request = Some(token);
                    self.agents.copied = Some(id);
                    self.flash_success("Token copied to clipboard");
                }
            }
            KeyCode::Char('m') | KeyCode::Enter => {
                let agent = self.agents.selected().map(|a| AgentContext {
                    id: a.id.clone(),
                    name: a.name.clone(),
                });
                if agent.is_some() {
                    self.open_metrics(agent);
                }
            }
            KeyCode::Char('M') => self.open_metrics(None),
            KeyCode::Char('r') => self.refresh_agents(),
            KeyCode::Char('L') => self.request_logout(),
            KeyCode::Char('x') => self.banner = None,
            _ => {}
        }
        false
    }

    fn handle_agent_form_key(&mut self, key: KeyCode) {
        let Some(form) = self.agents.form.as_mut() else {
            return;
        };
        match key {
            KeyCode::Esc => self.agents.form = None,
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => {
                form.field = match form.field {
                    AgentField::Name => AgentField::Token,
                    AgentField::Token => AgentField::Name,
                };
            }
            KeyCode::Backspace => {
                match form.field {
                    AgentField::Name => form.name.pop(),
                    AgentField::Token => form.token.pop(),
                };
            }
            KeyCode::Char(c) => match form.field {
                AgentField::Name => form.name.push(c),
                AgentField::Token => form.token.push(c),
            },
            KeyCode::Enter => match validate::require("name", &form.name) {
                Ok(name) => {
                    form.error = None;
                    self.pending_command = Some(AsyncCommand::CreateAgent {
                        name: name.to_string(),
                        token: validate::agent_token_or_generate(&form.token),
                    });
                }
                Err(e) => form.error = Some(e.to_string()),
            },
            _ => {}
        }
    }

    fn refresh_agents(&mut self) {
        self.agents.loading = true;
        self.pending_command = Some(AsyncCommand::FetchAgents);
    }

    fn request_logout(&mut self) {
        self.pending_command = Some(AsyncCommand::Logout);
    }

    // ── Metrics ───────────────────────────────────────────────────────

    pub fn open_metrics(&mut self, agent: Option<AgentContext>) {
        let agent_changed = self.metrics.agent != agent;
        self.metrics.agent = agent;
        self.view = View::Metrics;
        if agent_changed || (self.metrics.names.is_empty() && self.metrics.jobs.is_empty()) {
            self.start_discovery();
        }
        if self.metrics.selection.is_active() {
            self.restart_polling();
        }
    }

    fn close_metrics(&mut self) {
        self.poll_request = Some(PollRequest::Stop);
        self.metrics.polling = false;
        self.metrics.series.clear();
        self.view = View::Agents;
    }

    fn start_discovery(&mut self) {
        self.metrics.discovering = true;
        self.pending_command = Some(AsyncCommand::Discover);
    }

    /// Any selection change: refetch now and restart the interval.
    fn restart_polling(&mut self) {
        if !self.metrics.selection.is_active() {
            self.metrics.series.clear();
            self.metrics.polling = false;
        }
        self.poll_request = Some(PollRequest::Restart(self.metrics.selection.clone()));
    }

    fn handle_metrics_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') => return true,
            KeyCode::Esc | KeyCode::Char('b') => self.close_metrics(),
            KeyCode::Tab | KeyCode::BackTab => {
                self.metrics.focus = match self.metrics.focus {
                    MetricsFocus::Names => MetricsFocus::Jobs,
                    MetricsFocus::Jobs => MetricsFocus::Names,
                };
            }
            KeyCode::Char('j') | KeyCode::Down => self.move_metrics_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.move_metrics_cursor(-1),
            KeyCode::Char(' ') | KeyCode::Enter => self.activate_metrics_row(),
            KeyCode::Char('t') => {
                self.metrics.selection.time_range = self.metrics.selection.time_range.cycle();
                self.restart_polling();
            }
            KeyCode::Char('c') => {
                self.metrics.selection.clear_metrics();
                self.restart_polling();
            }
            KeyCode::Char('r') => self.start_discovery(),
            KeyCode::Char('L') => self.request_logout(),
            KeyCode::Char('x') => self.banner = None,
            _ => {}
        }
        false
    }

    fn move_metrics_cursor(&mut self, delta: isize) {
        let m = &mut self.metrics;
        match m.focus {
            MetricsFocus::Names => move_cursor(&mut m.names_state, m.names.len(), delta),
            MetricsFocus::Jobs => move_cursor(&mut m.jobs_state, m.jobs.len() + 1, delta),
        }
    }

    fn activate_metrics_row(&mut self) {
        let m = &mut self.metrics;
        match m.focus {
            MetricsFocus::Names => {
                let Some(name) = m.names_state.selected().and_then(|i| m.names.get(i)) else {
                    return;
                };
                let name = name.clone();
                m.selection.toggle_metric(&name);
            }
            MetricsFocus::Jobs => {
                let job = match m.jobs_state.selected() {
                    None | Some(0) => None,
                    Some(i) => m.jobs.get(i - 1).cloned(),
                };
                if job.as_deref() == m.selection.job() {
                    return;
                }
                m.selection.set_job(job);
            }
        }
        self.restart_polling();
    }

    /// Apply a poller event. Events from a superseded epoch are dropped;
    /// returns whether the event was applied.
    pub fn apply_poll_event(&mut self, event: PollEvent) -> bool {
        if event.epoch() != self.metrics.epoch {
            debug!(
                event_epoch = event.epoch(),
                current = self.metrics.epoch,
                "dropping stale poll event"
            );
            return false;
        }
        match event {
            PollEvent::Started { .. } => self.metrics.polling = true,
            PollEvent::Updated { series, .. } => {
                self.metrics.series = series;
                self.metrics.polling = false;
                self.metrics.last_update = Some(Local::now());
                self.clear_banner_from(BannerSource::Poll);
            }
            PollEvent::Failed { error, .. } => {
                self.metrics.polling = false;
                self.show_banner(BannerSource::Poll, format!("Failed to fetch metrics: {error}"));
            }
            PollEvent::Cleared { .. } => {
                self.metrics.series.clear();
                self.metrics.polling = false;
            }
        }
        true
    }

    // ── Modal ─────────────────────────────────────────────────────────

    fn handle_modal_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('y') | KeyCode::Enter => {
                if let Some(Modal::Confirm { action, .. }) = self.modal.take() {
                    match action {
                        ConfirmAction::DeleteAgent { id, name } => {
                            self.pending_command = Some(AsyncCommand::DeleteAgent { id, name });
                        }
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Esc => self.modal = None,
            _ => {}
        }
        false
    }

    // ── Command results ───────────────────────────────────────────────

    pub fn apply_command_result(&mut self, result: CommandResult) {
        match result {
            CommandResult::AuthChecked(state) => {
                self.set_auth(state);
                if self.auth.authenticated {
                    self.refresh_agents();
                }
            }
            CommandResult::LoggedIn(state, Ok(())) => {
                self.set_auth(state);
                self.login.submitting = false;
                self.login.password.clear();
                self.login.error = None;
                self.view = View::Agents;
                let name = self.user_name().to_string();
                self.flash_success(format!("Logged in as {name}"));
                self.refresh_agents();
            }
            CommandResult::LoggedIn(state, Err(e)) => {
                self.set_auth(state);
                self.login.submitting = false;
                self.login.password.clear();
                self.login.error = Some(e);
            }
            CommandResult::LoggedOut(state) => {
                self.set_auth(state);
                self.flash_info("Logged out");
            }
            CommandResult::SessionExpired(state) => {
                self.set_auth(state);
                self.login.error = Some("Session expired, please log in again".to_string());
            }

            CommandResult::Agents(Ok(items)) => {
                self.agents.loading = false;
                let len = items.len();
                self.agents.items = items;
                let selected = match self.agents.list_state.selected() {
                    _ if len == 0 => None,
                    Some(i) => Some(i.min(len - 1)),
                    None => Some(0),
                };
                self.agents.list_state.select(selected);
                self.clear_banner_from(BannerSource::Agents);
            }
            CommandResult::Agents(Err(e)) => {
                self.agents.loading = false;
                self.agents.items.clear();
                self.agents.list_state.select(None);
                self.show_banner(BannerSource::Agents, e);
            }
            CommandResult::AgentCreated(Ok(name)) => {
                self.agents.form = None;
                self.flash_success(format!("Agent \"{name}\" created"));
                self.refresh_agents();
            }
            CommandResult::AgentCreated(Err(e)) => {
                self.show_banner(BannerSource::Agents, e);
            }
            CommandResult::AgentDeleted(Ok(name)) => {
                self.flash_success(format!("Agent \"{name}\" deleted"));
                self.refresh_agents();
            }
            CommandResult::AgentDeleted(Err(e)) => {
                self.show_banner(BannerSource::Agents, e);
            }

            CommandResult::Discovered(found) => {
                let summary = found.error_summary();
                let m = &mut self.metrics;
                m.discovering = false;
                m.names = found.metric_names;
                m.jobs = found.jobs;
                m.names_state.select((!m.names.is_empty()).then_some(0));
                m.jobs_state.select(Some(0));
                match summary {
                    Some(msg) => self.show_banner(BannerSource::Discovery, msg),
                    None => self.clear_banner_from(BannerSource::Discovery),
                }
            }
        }
    }

    /// Adopt the controller's state. Losing the session drops everything
    /// that belonged to it.
    fn set_auth(&mut self, state: AuthState) {
        let was_authenticated = self.auth.authenticated;
        self.auth = state;
        if was_authenticated && !self.auth.authenticated {
            self.poll_request = Some(PollRequest::Stop);
            self.agents = AgentsState::default();
            self.metrics = MetricsState::default();
            self.metrics.selection.time_range = self.default_range;
            self.banner = None;
            self.modal = None;
            self.view = View::Agents;
        }
    }

    pub fn user_name(&self) -> &str {
        self.auth
            .user
            .as_ref()
            .map(|u| u.username.as_str())
            .unwrap_or("")
    }

    fn show_banner(&mut self, source: BannerSource, message: impl Into<String>) {
        self.banner = Some(Banner {
            message: message.into(),
            source,
        });
    }

    fn clear_banner_from(&mut self, source: BannerSource) {
        if self.banner.as_ref().is_some_and(|b| b.source == source) {
            self.banner = None;
        }
    }

    pub fn flash_success(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Success));
    }

    pub fn flash_info(&mut self, msg: impl Into<String>) {
        self.flash_message = Some((msg.into(), FlashLevel::Info));
    }
}

fn move_cursor(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        state.select(None);
        return;
    }
    let current = state.selected().unwrap_or(0) as isize;
    let next = (current + delta).clamp(0, len as isize - 1);
    state.select(Some(next as usize));
}
