//! Offline keyword agent for local runs and tests.

use async_trait::async_trait;

use super::traits::{AgentClient, DetectIntentResponse, OutputContext, QueryInput};

const HANDOFF_KEYWORDS: [&str; 4] = ["human", "operator", "person", "agent"];

/// Answers without any network access. Asking for a human (or an operator,
/// a person, an agent) produces the escalation context.
pub struct ScriptedAgent {
    project_id: String,
    escalation_context: String,
    welcome_event: String,
}

impl ScriptedAgent {
    pub fn new(project_id: &str, escalation_context: &str, welcome_event: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            escalation_context: escalation_context.to_string(),
            welcome_event: welcome_event.to_string(),
        }
    }

    fn context_name(&self, session: &str) -> String {
        format!(
            "projects/{}/agent/sessions/{}/contexts/{}",
            self.project_id, session, self.escalation_context
        )
    }

    fn wants_human(text: &str) -> bool {
        let lowered = text.to_lowercase();
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .any(|word| HANDOFF_KEYWORDS.contains(&word))
    }
}

#[async_trait]
impl AgentClient for ScriptedAgent {
    async fn detect_intent(
        &self,
        session: &str,
        input: &QueryInput,
    ) -> anyhow::Result<DetectIntentResponse> {
        let response = match input {
            QueryInput::Event(event) if event.name == self.welcome_event => DetectIntentResponse {
                fulfillment_text: "Hi! I'm the virtual assistant. How can I help you today?"
                    .into(),
                output_contexts: Vec::new(),
            },
            QueryInput::Event(event) => {
                anyhow::bail!("scripted agent has no handler for event '{}'", event.name)
            }
            QueryInput::Text(text) if Self::wants_human(&text.text) => DetectIntentResponse {
                fulfillment_text: "Sure, let me connect you with one of our team.".into(),
                output_contexts: vec![OutputContext::new(self.context_name(session))],
            },
            QueryInput::Text(text) => DetectIntentResponse {
                fulfillment_text: format!(
                    "Thanks, I noted: \"{}\". Ask for a human at any time.",
                    text.text.trim()
                ),
                output_contexts: Vec::new(),
            },
        };
        Ok(response)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> ScriptedAgent {
        ScriptedAgent::new("local", "operator_request", "WELCOME")
    }

    #[tokio::test]
    async fn welcome_event_greets_without_contexts() {
        let response = agent()
            .detect_intent("c1", &QueryInput::event("WELCOME", "en"))
            .await
            .unwrap();
        assert!(!response.fulfillment_text.is_empty());
        assert!(response.output_contexts.is_empty());
    }

    #[tokio::test]
    async fn unknown_event_errors() {
        let result = agent()
            .detect_intent("c1", &QueryInput::event("GOODBYE", "en"))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn asking_for_a_human_adds_escalation_context() {
        let response = agent()
            .detect_intent("c1", &QueryInput::text("I need a Human!", "en"))
            .await
            .unwrap();
        assert_eq!(response.output_contexts.len(), 1);
        assert_eq!(
            response.output_contexts[0].name,
            "projects/local/agent/sessions/c1/contexts/operator_request"
        );
    }

    #[tokio::test]
    async fn keywords_match_whole_words_only() {
        let response = agent()
            .detect_intent("c1", &QueryInput::text("humanity is great", "en"))
            .await
            .unwrap();
        assert!(response.output_contexts.is_empty());
    }
}
