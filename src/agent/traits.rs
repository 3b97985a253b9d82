//! Agent client trait and the request/response shapes it exchanges.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named event sent in place of user text (e.g. `WELCOME`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub name: String,
    pub language_code: String,
}

/// Free text typed by the customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextInput {
    pub text: String,
    pub language_code: String,
}

/// What the agent is asked to respond to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum QueryInput {
    Event(EventInput),
    Text(TextInput),
}

impl QueryInput {
    pub fn event(name: &str, language_code: &str) -> Self {
        Self::Event(EventInput {
            name: name.to_string(),
            language_code: language_code.to_string(),
        })
    }

    pub fn text(text: &str, language_code: &str) -> Self {
        Self::Text(TextInput {
            text: text.to_string(),
            language_code: language_code.to_string(),
        })
    }
}

/// A conversational-state marker attached to an agent response.
///
/// `name` is a slash-delimited qualified identifier such as
/// `projects/p/agent/sessions/s/contexts/operator_request`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutputContext {
    pub name: String,
}

impl OutputContext {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The final path segment of the qualified name.
    pub fn short_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// The part of an agent response the router acts on.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DetectIntentResponse {
    pub fulfillment_text: String,
    pub output_contexts: Vec<OutputContext>,
}

/// Remote conversational agent.
#[async_trait]
pub trait AgentClient: Send + Sync {
    /// Ask the agent to respond to `input` within the conversation `session`.
    async fn detect_intent(&self, session: &str, input: &QueryInput)
        -> Result<DetectIntentResponse>;

    /// The name of this agent backend.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_input_serializes_in_detect_intent_shape() {
        let json = serde_json::to_value(QueryInput::event("WELCOME", "en")).unwrap();
        assert_eq!(json["event"]["name"], "WELCOME");
        assert_eq!(json["event"]["languageCode"], "en");

        let json = serde_json::to_value(QueryInput::text("hello", "en")).unwrap();
        assert_eq!(json["text"]["text"], "hello");
    }

    #[test]
    fn short_name_takes_last_segment() {
        let ctx = OutputContext::new("projects/p/agent/sessions/s/contexts/operator_request");
        assert_eq!(ctx.short_name(), "operator_request");
        assert_eq!(OutputContext::new("bare").short_name(), "bare");
        assert_eq!(OutputContext::new("trailing/").short_name(), "");
    }
}
