use anyhow::{Context, Result};
use clap::Subcommand;
use vigil_api::CreateAgentRequest;
use vigil_api_client::ApiClient;
use vigil_core::validate;

use crate::output::{self, OutputFormat};

#[derive(Debug, Clone, Subcommand)]
pub enum AgentsAction {
    /// List registered agents
    List {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Register an agent
    Create {
        name: String,
        /// Token the agent authenticates with (generated when omitted)
        #[arg(long)]
        token: Option<String>,
    },
    /// Remove an agent by id
    Delete { id: String },
}

pub async fn run(api: ApiClient, action: AgentsAction) -> Result<()> {
    match action {
        AgentsAction::List { format } => {
            let agents = api.list_agents().await.context("list agents")?;
            output::write_agents(&agents, format, &mut std::io::stdout())
        }
        AgentsAction::Create { name, token } => {
            let name = validate::require("name", &name)?.to_string();
            let token = validate::agent_token_or_generate(token.as_deref().unwrap_or(""));
            let req = CreateAgentRequest {
                name: name.clone(),
                token: token.clone(),
            };
            api.create_agent(&req)
                .await
                .with_context(|| format!("create agent {name:?}"))?;
            println!("Created agent {name} (token: {token})");
            Ok(())
        }
        AgentsAction::Delete { id } => {
            api.delete_agent(&id)
                .await
                .with_context(|| format!("delete agent {id}"))?;
            println!("Deleted agent {id}");
            Ok(())
        }
    }
}
