//! The shared connection helper and the per-role policy trait.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

use crate::routing::{CustomerReply, RouteError};
use crate::transport::{ClientEvent, Room, ServerEvent, SystemError, Transport};

/// One live transport connection: its id, its room, and a way to reach it.
pub struct Connection {
    id: String,
    room: Room,
    transport: Arc<dyn Transport>,
}

impl Connection {
    pub fn new(id: &str, room: Room, transport: Arc<dyn Transport>) -> Self {
        Self {
            id: id.to_string(),
            room,
            transport,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn room(&self) -> Room {
        self.room
    }

    /// Send a reply to this connection, one event per message, in order.
    pub async fn respond(&self, reply: &CustomerReply) -> Result<()> {
        for message in reply.messages() {
            self.transport
                .send(&self.id, ServerEvent::text(message.as_str()))
                .await?;
        }
        Ok(())
    }

    /// Best-effort error notice; a failure here is only logged.
    pub async fn send_error(&self, notice: SystemError) {
        if let Err(e) = self
            .transport
            .send(&self.id, ServerEvent::SystemError(notice))
            .await
        {
            tracing::warn!(connection_id = %self.id, "Failed to send error notice: {e}");
        }
    }
}

/// Role-specific protocol run by a [`super::ConnectionHandler`].
#[async_trait]
pub trait ConnectionPolicy: Send + Sync {
    fn room(&self) -> Room;

    /// Runs once, right after the connection is registered.
    async fn on_connect(&self, connection: &Connection) -> Result<(), RouteError>;

    /// Runs for every inbound client event.
    async fn on_event(&self, connection: &Connection, event: ClientEvent)
        -> Result<(), RouteError>;

    /// Runs once when the transport reports the connection closed.
    async fn on_disconnect(&self, connection: &Connection) -> Result<(), RouteError>;

    /// Notice pushed back to this connection when a flow fails.
    fn error_notice(&self, error: &RouteError) -> SystemError;
}
