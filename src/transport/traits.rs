//! Transport capability and the event shapes exchanged with clients.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Named broadcast group a connection belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Room {
    Customers,
    Operators,
}

impl Room {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customers => "customers",
            Self::Operators => "operators",
        }
    }
}

/// The normalized shape of every utterance shown to operators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperatorEnvelope {
    pub customer_id: String,
    pub utterance: String,
    pub is_agent_response: bool,
}

/// A reply typed by an operator, addressed to one customer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OperatorMessage {
    pub customer_id: String,
    pub utterance: String,
}

/// Error notice pushed to the party whose flow failed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SystemError {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl SystemError {
    pub fn new(kind: &str, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

/// Payload of a `customer message` event: bare text towards a customer,
/// an envelope towards operators.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CustomerMessage {
    Text(String),
    Envelope(OperatorEnvelope),
}

/// Events pushed from the server to a connection or a room.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "customer connected")]
    CustomerConnected(String),
    #[serde(rename = "customer disconnected")]
    CustomerDisconnected(String),
    #[serde(rename = "operator requested")]
    OperatorRequested(String),
    #[serde(rename = "customer message")]
    CustomerMessage(CustomerMessage),
    #[serde(rename = "operator message")]
    OperatorMessage(OperatorMessage),
    #[serde(rename = "system error")]
    SystemError(SystemError),
}

impl ServerEvent {
    pub fn text(utterance: impl Into<String>) -> Self {
        Self::CustomerMessage(CustomerMessage::Text(utterance.into()))
    }

    pub fn envelope(customer_id: &str, utterance: &str, is_agent_response: bool) -> Self {
        Self::CustomerMessage(CustomerMessage::Envelope(OperatorEnvelope {
            customer_id: customer_id.to_string(),
            utterance: utterance.to_string(),
            is_agent_response,
        }))
    }
}

/// Events received from a client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "customer message")]
    CustomerMessage(String),
    #[serde(rename = "operator message")]
    OperatorMessage(OperatorMessage),
}

impl ClientEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CustomerMessage(_) => "customer message",
            Self::OperatorMessage(_) => "operator message",
        }
    }
}

/// Delivery primitive the router sends through.
///
/// Sends are best-effort and at-most-once; a returned error means the
/// event was not handed to the connection.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send an event to a single connection.
    async fn send(&self, connection_id: &str, event: ServerEvent) -> Result<()>;

    /// Send an event to every connection in a room.
    async fn broadcast(&self, room: Room, event: ServerEvent) -> Result<()>;

    /// Number of live connections in a room.
    fn member_count(&self, room: Room) -> usize;

    fn name(&self) -> &str;
}
