use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

use super::traits::{Connection, ConnectionPolicy};
use crate::routing::{ConnectionStatus, CustomerReply, MessageRouter, RouteError};
use crate::transport::{ClientEvent, Room, SystemError};

/// Customer protocol. The connection id doubles as the customer id.
pub struct CustomerPolicy {
    router: Arc<MessageRouter>,
}

impl CustomerPolicy {
    pub fn new(router: Arc<MessageRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl ConnectionPolicy for CustomerPolicy {
    fn room(&self) -> Room {
        Room::Customers
    }

    async fn on_connect(&self, connection: &Connection) -> Result<(), RouteError> {
        info!(customer_id = %connection.id(), "A customer joined");
        self.router
            .notify_connection_status(connection.id(), ConnectionStatus::Connected)
            .await?;

        if let Some(welcome) = self.router.open_customer(connection.id()).await? {
            connection
                .respond(&CustomerReply::Text(welcome))
                .await
                .map_err(RouteError::Transport)?;
        }
        Ok(())
    }

    async fn on_event(
        &self,
        connection: &Connection,
        event: ClientEvent,
    ) -> Result<(), RouteError> {
        let event_name = event.name();
        let ClientEvent::CustomerMessage(utterance) = event else {
            return Err(RouteError::UnexpectedEvent {
                event: event_name,
                room: Room::Customers.as_str(),
            });
        };
        debug!(customer_id = %connection.id(), "Received customer message");

        if let Some(reply) = self
            .router
            .route_customer(connection.id(), &utterance)
            .await?
        {
            debug!(customer_id = %connection.id(), messages = reply.messages().len(), "Sending response to customer");
            connection
                .respond(&reply)
                .await
                .map_err(RouteError::Transport)?;
        }
        Ok(())
    }

    async fn on_disconnect(&self, connection: &Connection) -> Result<(), RouteError> {
        info!(customer_id = %connection.id(), "Customer disconnected");
        self.router
            .notify_connection_status(connection.id(), ConnectionStatus::Disconnected)
            .await
    }

    fn error_notice(&self, _error: &RouteError) -> SystemError {
        RouteError::customer_notice()
    }
}
