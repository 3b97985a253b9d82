use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::traits::{Connection, ConnectionPolicy};
use crate::routing::{MessageRouter, RouteError};
use crate::transport::{ClientEvent, Room, SystemError};

/// Operator protocol: no greeting, replies are routed to customers.
pub struct OperatorPolicy {
    router: Arc<MessageRouter>,
}

impl OperatorPolicy {
    pub fn new(router: Arc<MessageRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl ConnectionPolicy for OperatorPolicy {
    fn room(&self) -> Room {
        Room::Operators
    }

    async fn on_connect(&self, connection: &Connection) -> Result<(), RouteError> {
        info!(operator_id = %connection.id(), "An operator joined");
        Ok(())
    }

    async fn on_event(
        &self,
        connection: &Connection,
        event: ClientEvent,
    ) -> Result<(), RouteError> {
        let event_name = event.name();
        let ClientEvent::OperatorMessage(message) = event else {
            return Err(RouteError::UnexpectedEvent {
                event: event_name,
                room: Room::Operators.as_str(),
            });
        };
        debug!(
            operator_id = %connection.id(),
            customer_id = %message.customer_id,
            "Received operator message"
        );
        self.router.handle_operator_message(message).await
    }

    async fn on_disconnect(&self, connection: &Connection) -> Result<(), RouteError> {
        info!(operator_id = %connection.id(), "Operator disconnected");
        Ok(())
    }

    fn error_notice(&self, error: &RouteError) -> SystemError {
        error.operator_notice()
    }
}
