//! Wire types for the monitoring backend.
//!
//! The backend owns these shapes; this crate only mirrors what the client
//! reads and writes. Unknown fields are ignored on deserialisation.

use serde::{Deserialize, Serialize};

// ─── Endpoints ───────────────────────────────────────────────────────────────

pub mod paths {
    pub const LOGIN: &str = "/login";
    pub const LOGOUT: &str = "/logout";
    pub const AGENTS: &str = "/agent";
    pub const EXPORT: &str = "/vm/export";

    pub fn agent(id: &str) -> String {
        format!("{AGENTS}/{id}")
    }

    pub fn label_values(label: &str) -> String {
        format!("/vm/label/{label}/values")
    }
}

/// Label whose values are the metric names.
pub const METRIC_NAME_LABEL: &str = "__name__";
/// Label whose values are the scrape jobs.
pub const JOB_LABEL: &str = "job";

// ─── Auth ────────────────────────────────────────────────────────────────────

/// Form body of `POST /login`.
#[derive(Serialize)]
pub struct LoginForm<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

impl std::fmt::Debug for LoginForm<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .finish()
    }
}

// ─── Agents ──────────────────────────────────────────────────────────────────

/// A monitored host registered with the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,
    pub name: String,
    pub token: String,
    #[serde(default, alias = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of `POST /agent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateAgentRequest {
    pub name: String,
    pub token: String,
}

// ─── Metrics ─────────────────────────────────────────────────────────────────

/// Label-values answer: either the `{status, data}` envelope or a bare list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LabelValuesResponse {
    Bare(Vec<String>),
    Envelope {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        data: Option<Vec<String>>,
    },
}

impl LabelValuesResponse {
    /// Envelope status other than `success`, if any.
    pub fn failed_status(&self) -> Option<&str> {
        match self {
            Self::Envelope {
                status: Some(status),
                ..
            } if status != "success" => Some(status),
            _ => None,
        }
    }

    /// The values; empty when the envelope reports a failure or carries none.
    pub fn into_values(self) -> Vec<String> {
        if self.failed_status().is_some() {
            return Vec::new();
        }
        match self {
            Self::Bare(values) => values,
            Self::Envelope { data, .. } => data.unwrap_or_default(),
        }
    }
}

/// Form body of `POST /vm/export`.
#[derive(Debug, Serialize)]
pub struct ExportForm<'a> {
    #[serde(rename = "match[]")]
    pub selector: &'a str,
}
