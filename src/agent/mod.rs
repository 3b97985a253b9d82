//! The automated conversational agent consulted by the router.
//!
//! Each backend implements [`AgentClient`] and is selected by name in
//! [`create_agent_client`].

pub mod dialogflow;
pub mod scripted;
pub mod traits;

pub use dialogflow::DialogflowClient;
pub use scripted::ScriptedAgent;
pub use traits::{
    AgentClient, DetectIntentResponse, EventInput, OutputContext, QueryInput, TextInput,
};

use crate::config::{AgentConfig, ConversationConfig};
use std::sync::Arc;
use std::time::Duration;

const MAX_API_ERROR_CHARS: usize = 200;

/// Truncate API error text so a verbose backend cannot flood the logs.
pub fn sanitize_api_error(input: &str) -> String {
    if input.chars().count() <= MAX_API_ERROR_CHARS {
        return input.to_string();
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &input[..end])
}

/// Build a sanitized agent error from a failed HTTP response.
pub async fn api_error(backend: &str, response: reqwest::Response) -> anyhow::Error {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read agent error body>".to_string());
    let sanitized = sanitize_api_error(&body);
    anyhow::anyhow!("{backend} API error ({status}): {sanitized}")
}

/// Factory: create the agent backend selected by config.
pub fn create_agent_client(
    agent: &AgentConfig,
    conversation: &ConversationConfig,
) -> anyhow::Result<Arc<dyn AgentClient>> {
    match agent.backend.as_str() {
        "dialogflow" => {
            let project_id = agent
                .project_id
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("agent.project_id is required for dialogflow"))?;
            Ok(Arc::new(DialogflowClient::new(
                project_id,
                agent.base_url.as_deref(),
                agent.api_key.as_deref(),
                Duration::from_secs(agent.timeout_secs),
            )))
        }
        "scripted" => Ok(Arc::new(ScriptedAgent::new(
            agent.project_id.as_deref().unwrap_or("local"),
            &conversation.escalation_context,
            &conversation.welcome_event,
        ))),
        other if other.trim().is_empty() => {
            anyhow::bail!("agent.backend cannot be empty. Supported values: dialogflow, scripted")
        }
        other => {
            anyhow::bail!("Unknown agent backend '{other}'. Supported values: dialogflow, scripted")
        }
    }
}
