//! Dialogflow v2 agent client.
//! Speaks the REST `detectIntent` endpoint; the customer id doubles as the
//! Dialogflow session id.

use crate::agent::traits::{AgentClient, DetectIntentResponse, OutputContext, QueryInput};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://dialogflow.googleapis.com";

/// An agent backed by a Dialogflow ES project.
pub struct DialogflowClient {
    pub(crate) project_id: String,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    client: Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentRequest<'a> {
    query_input: &'a QueryInput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectIntentWire {
    #[serde(default)]
    query_result: QueryResultWire,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResultWire {
    #[serde(default)]
    fulfillment_text: String,
    #[serde(default)]
    output_contexts: Vec<OutputContext>,
}

impl From<DetectIntentWire> for DetectIntentResponse {
    fn from(wire: DetectIntentWire) -> Self {
        Self {
            fulfillment_text: wire.query_result.fulfillment_text,
            output_contexts: wire.query_result.output_contexts,
        }
    }
}

impl DialogflowClient {
    pub fn new(
        project_id: &str,
        base_url: Option<&str>,
        api_key: Option<&str>,
        timeout: Duration,
    ) -> Self {
        Self {
            project_id: project_id.to_string(),
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            api_key: api_key.map(ToString::to_string),
            client: Client::builder()
                .timeout(timeout)
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Fully qualified session resource for a conversation.
    pub fn session_path(&self, session: &str) -> String {
        format!("projects/{}/agent/sessions/{}", self.project_id, session)
    }

    fn detect_intent_url(&self, session: &str) -> String {
        format!(
            "{}/v2/{}:detectIntent",
            self.base_url,
            self.session_path(session)
        )
    }
}

#[async_trait]
impl AgentClient for DialogflowClient {
    async fn detect_intent(
        &self,
        session: &str,
        input: &QueryInput,
    ) -> anyhow::Result<DetectIntentResponse> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            anyhow::anyhow!(
                "Dialogflow API key not set. Set agent.api_key or HANDOFF_API_KEY."
            )
        })?;

        let url = self.detect_intent_url(session);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&DetectIntentRequest { query_input: input })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(super::api_error("Dialogflow", response).await);
        }

        let wire: DetectIntentWire = response.json().await?;
        Ok(wire.into())
    }

    fn name(&self) -> &str {
        "dialogflow"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_client(base_url: Option<&str>, key: Option<&str>) -> DialogflowClient {
        DialogflowClient::new("demo-project", base_url, key, Duration::from_secs(5))
    }

    #[test]
    fn defaults_to_public_endpoint() {
        let c = make_client(None, Some("k"));
        assert_eq!(c.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn strips_trailing_slash() {
        let c = make_client(Some("http://localhost:9000/"), None);
        assert_eq!(c.base_url, "http://localhost:9000");
    }

    #[test]
    fn builds_detect_intent_url_from_session() {
        let c = make_client(Some("http://localhost:9000"), None);
        assert_eq!(
            c.detect_intent_url("c1"),
            "http://localhost:9000/v2/projects/demo-project/agent/sessions/c1:detectIntent"
        );
    }

    #[test]
    fn request_body_wraps_query_input() {
        let input = QueryInput::event("WELCOME", "en");
        let body = serde_json::to_value(DetectIntentRequest {
            query_input: &input,
        })
        .unwrap();
        assert_eq!(body["queryInput"]["event"]["name"], "WELCOME");
    }

    #[test]
    fn response_parses_fulfillment_and_contexts() {
        let raw = r#"{
            "responseId": "r1",
            "queryResult": {
                "fulfillmentText": "Let me get someone.",
                "outputContexts": [
                    {"name": "projects/p/agent/sessions/c1/contexts/operator_request", "lifespanCount": 5}
                ]
            }
        }"#;
        let wire: DetectIntentWire = serde_json::from_str(raw).unwrap();
        let response: DetectIntentResponse = wire.into();
        assert_eq!(response.fulfillment_text, "Let me get someone.");
        assert_eq!(response.output_contexts.len(), 1);
        assert_eq!(response.output_contexts[0].short_name(), "operator_request");
    }

    #[test]
    fn response_tolerates_missing_fields() {
        let wire: DetectIntentWire = serde_json::from_str("{}").unwrap();
        let response: DetectIntentResponse = wire.into();
        assert!(response.fulfillment_text.is_empty());
        assert!(response.output_contexts.is_empty());
    }

    #[tokio::test]
    async fn detect_intent_fails_without_key() {
        let c = make_client(Some("http://127.0.0.1:9"), None);
        let err = c
            .detect_intent("c1", &QueryInput::text("hi", "en"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("API key not set"));
    }
}
