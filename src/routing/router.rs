//! The message router: decides where every customer, agent and operator
//! utterance goes and owns the AGENT → OPERATOR transition.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::error::RouteError;
use super::escalation::response_requests_operator;
use super::registry::{ConnectionRegistry, CustomerLocks};
use crate::agent::{AgentClient, DetectIntentResponse, QueryInput};
use crate::config::{AgentConfig, ConversationConfig};
use crate::connection::Connection;
use crate::customers::{CustomerMode, CustomerRecord, CustomerStore};
use crate::transport::{OperatorMessage, Room, ServerEvent, Transport};

/// Conversation constants the router applies.
#[derive(Debug, Clone)]
pub struct RouterSettings {
    pub operator_greeting: String,
    pub escalation_context: String,
    pub welcome_event: String,
    pub language_code: String,
    pub agent_timeout: Duration,
}

impl RouterSettings {
    pub fn from_config(conversation: &ConversationConfig, agent: &AgentConfig) -> Self {
        Self {
            operator_greeting: conversation.operator_greeting.clone(),
            escalation_context: conversation.escalation_context.clone(),
            welcome_event: conversation.welcome_event.clone(),
            language_code: conversation.language_code.clone(),
            agent_timeout: Duration::from_secs(agent.timeout_secs),
        }
    }
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self::from_config(&ConversationConfig::default(), &AgentConfig::default())
    }
}

/// What the router wants said back to a customer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerReply {
    Text(String),
    /// Sent in order, one event per message.
    Sequence(Vec<String>),
}

impl CustomerReply {
    pub fn messages(&self) -> &[String] {
        match self {
            Self::Text(text) => std::slice::from_ref(text),
            Self::Sequence(messages) => messages,
        }
    }
}

/// Presence change reported to operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Routes messages between customers, operators and the agent.
///
/// Sole writer of [`CustomerMode`]. Every read-check-mutate on a customer
/// record runs under that customer's lock.
pub struct MessageRouter {
    store: Arc<dyn CustomerStore>,
    agent: Arc<dyn AgentClient>,
    transport: Arc<dyn Transport>,
    settings: RouterSettings,
    customer_connections: ConnectionRegistry,
    operator_connections: ConnectionRegistry,
    locks: CustomerLocks,
}

impl MessageRouter {
    pub fn new(
        store: Arc<dyn CustomerStore>,
        agent: Arc<dyn AgentClient>,
        transport: Arc<dyn Transport>,
        settings: RouterSettings,
    ) -> Self {
        Self {
            store,
            agent,
            transport,
            settings,
            customer_connections: ConnectionRegistry::new(),
            operator_connections: ConnectionRegistry::new(),
            locks: CustomerLocks::new(),
        }
    }

    pub fn store(&self) -> &dyn CustomerStore {
        self.store.as_ref()
    }

    pub fn agent(&self) -> &dyn AgentClient {
        self.agent.as_ref()
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    // ── Registries ───────────────────────────────────────────────

    fn registry(&self, room: Room) -> &ConnectionRegistry {
        match room {
            Room::Customers => &self.customer_connections,
            Room::Operators => &self.operator_connections,
        }
    }

    /// Register a live connection under its own role.
    pub fn attach(&self, connection: Arc<Connection>) {
        self.registry(connection.room()).insert(connection);
    }

    /// Release a connection's registry slot.
    pub fn release(&self, room: Room, connection_id: &str) {
        self.registry(room).remove(connection_id);
        if room == Room::Customers {
            self.locks.prune(connection_id);
        }
    }

    pub fn customer_connection(&self, customer_id: &str) -> Option<Arc<Connection>> {
        self.customer_connections.get(customer_id)
    }

    /// `(customers, operators)` currently attached.
    pub fn connection_counts(&self) -> (usize, usize) {
        (
            self.customer_connections.len(),
            self.operator_connections.len(),
        )
    }

    // ── Operator fan-out ─────────────────────────────────────────

    async fn broadcast_to_operators(&self, event: ServerEvent) -> Result<(), RouteError> {
        self.transport
            .broadcast(Room::Operators, event)
            .await
            .map_err(RouteError::Transport)
    }

    /// Tell every operator a customer came or went.
    pub async fn notify_connection_status(
        &self,
        customer_id: &str,
        status: ConnectionStatus,
    ) -> Result<(), RouteError> {
        debug!(customer_id, ?status, "Sending customer presence to operators");
        let event = match status {
            ConnectionStatus::Connected => ServerEvent::CustomerConnected(customer_id.to_string()),
            ConnectionStatus::Disconnected => {
                ServerEvent::CustomerDisconnected(customer_id.to_string())
            }
        };
        self.broadcast_to_operators(event).await
    }

    /// Show utterances to every operator, tagged with who said them.
    pub async fn send_utterances_to_operators(
        &self,
        customer_id: &str,
        utterances: &[String],
        is_agent_response: bool,
    ) -> Result<(), RouteError> {
        for utterance in utterances {
            self.broadcast_to_operators(ServerEvent::envelope(
                customer_id,
                utterance,
                is_agent_response,
            ))
            .await?;
        }
        Ok(())
    }

    /// Share one operator's reply with all operators.
    pub async fn relay_operator_message(&self, message: &OperatorMessage) -> Result<(), RouteError> {
        self.broadcast_to_operators(ServerEvent::OperatorMessage(message.clone()))
            .await
    }

    async fn notify_operator_requested(&self, customer_id: &str) -> Result<(), RouteError> {
        self.broadcast_to_operators(ServerEvent::OperatorRequested(customer_id.to_string()))
            .await
    }

    // ── Agent ────────────────────────────────────────────────────

    async fn ask_agent(
        &self,
        customer: &CustomerRecord,
        input: QueryInput,
    ) -> Result<DetectIntentResponse, RouteError> {
        let call = self.agent.detect_intent(&customer.id, &input);
        match tokio::time::timeout(self.settings.agent_timeout, call).await {
            Ok(result) => result.map_err(RouteError::Agent),
            Err(_) => Err(RouteError::AgentTimeout(self.settings.agent_timeout)),
        }
    }

    /// Start the automated conversation with the welcome event.
    pub async fn send_event_to_agent(
        &self,
        customer: &CustomerRecord,
    ) -> Result<DetectIntentResponse, RouteError> {
        debug!(customer_id = %customer.id, event = %self.settings.welcome_event, "Sending event to agent");
        self.ask_agent(
            customer,
            QueryInput::event(&self.settings.welcome_event, &self.settings.language_code),
        )
        .await
    }

    pub async fn send_utterance_to_agent(
        &self,
        customer: &CustomerRecord,
        utterance: &str,
    ) -> Result<DetectIntentResponse, RouteError> {
        debug!(customer_id = %customer.id, "Sending utterance to agent");
        self.ask_agent(
            customer,
            QueryInput::text(utterance, &self.settings.language_code),
        )
        .await
    }

    // ── Customer flows ───────────────────────────────────────────

    /// First contact for a connecting customer: resolve the record and, if it
    /// was just created, return the agent's welcome text.
    pub async fn open_customer(&self, customer_id: &str) -> Result<Option<String>, RouteError> {
        let _guard = self.locks.acquire(customer_id).await;
        let customer = self.store.get_or_create(customer_id).await?;
        debug!(customer_id, mode = %customer.mode, is_new = customer.is_new, "Customer resolved");

        if !customer.is_new {
            // Returning customer after a network interruption; carry on.
            return Ok(None);
        }

        let response = self.send_event_to_agent(&customer).await?;
        Ok(Some(response.fulfillment_text))
    }

    /// Route one customer utterance and return what the customer should see.
    pub async fn route_customer(
        &self,
        customer_id: &str,
        utterance: &str,
    ) -> Result<Option<CustomerReply>, RouteError> {
        let _guard = self.locks.acquire(customer_id).await;
        let customer = self.store.get_or_create(customer_id).await?;

        if customer.is_new {
            let response = self.send_event_to_agent(&customer).await?;
            return Ok(Some(CustomerReply::Text(response.fulfillment_text)));
        }

        self.send_utterances_to_operators(&customer.id, &[utterance.to_string()], false)
            .await?;

        if customer.is_escalated() {
            debug!(customer_id, "Customer is with an operator; agent not consulted");
            return Ok(None);
        }

        let response = self.send_utterance_to_agent(&customer, utterance).await?;

        if response_requests_operator(&response, &self.settings.escalation_context) {
            let reply = self.switch_to_operator(customer, response).await?;
            return Ok(Some(reply));
        }

        let speech = response.fulfillment_text;
        self.send_utterances_to_operators(&customer.id, std::slice::from_ref(&speech), true)
            .await?;
        Ok(Some(CustomerReply::Text(speech)))
    }

    /// Persist the OPERATOR mode, alert operators and build the hand-off pair.
    async fn switch_to_operator(
        &self,
        mut customer: CustomerRecord,
        response: DetectIntentResponse,
    ) -> Result<CustomerReply, RouteError> {
        info!(customer_id = %customer.id, "Switching customer to operator mode");
        customer.mode = CustomerMode::Operator;
        let customer_id = customer.id.clone();
        let customer = self.store.set(&customer_id, customer).await?;

        self.notify_operator_requested(&customer.id).await?;

        let output = vec![
            response.fulfillment_text,
            self.settings.operator_greeting.clone(),
        ];
        self.send_utterances_to_operators(&customer.id, &output, true)
            .await?;
        Ok(CustomerReply::Sequence(output))
    }

    // ── Operator flow ────────────────────────────────────────────

    /// Deliver an operator's reply to an escalated customer.
    pub async fn handle_operator_message(&self, message: OperatorMessage) -> Result<(), RouteError> {
        let customer_id = message.customer_id.clone();
        let _guard = self.locks.acquire(&customer_id).await;
        let customer = self.store.get_or_create(&customer_id).await?;

        if !customer.is_escalated() {
            return Err(RouteError::CustomerNotEscalated { customer_id });
        }

        self.relay_operator_message(&message).await?;

        let Some(connection) = self.customer_connection(&customer_id) else {
            warn!(customer_id = %customer_id, "Operator reply has no live customer connection");
            return Err(RouteError::DeliveryFailed { customer_id });
        };

        connection
            .respond(&CustomerReply::Text(message.utterance))
            .await
            .map_err(RouteError::Transport)
    }
}
