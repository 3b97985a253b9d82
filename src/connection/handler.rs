use std::sync::Arc;
use tracing::warn;

use super::customer::CustomerPolicy;
use super::operator::OperatorPolicy;
use super::traits::{Connection, ConnectionPolicy};
use crate::routing::{MessageRouter, RouteError};
use crate::transport::{ClientEvent, Room, Transport};

/// Binds one live connection to the router for its whole lifetime.
///
/// Every flow ends here: a failed flow is logged and turned into a notice
/// for this connection only.
pub struct ConnectionHandler {
    connection: Arc<Connection>,
    policy: Box<dyn ConnectionPolicy>,
    router: Arc<MessageRouter>,
}

impl ConnectionHandler {
    pub fn new(
        router: Arc<MessageRouter>,
        connection: Arc<Connection>,
        policy: Box<dyn ConnectionPolicy>,
    ) -> Self {
        Self {
            connection,
            policy,
            router,
        }
    }

    /// Build the handler variant for `room`.
    pub fn for_room(
        router: Arc<MessageRouter>,
        room: Room,
        connection_id: &str,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let connection = Arc::new(Connection::new(connection_id, room, transport));
        let policy: Box<dyn ConnectionPolicy> = match room {
            Room::Customers => Box::new(CustomerPolicy::new(Arc::clone(&router))),
            Room::Operators => Box::new(OperatorPolicy::new(Arc::clone(&router))),
        };
        Self::new(router, connection, policy)
    }

    /// Register with the router and run the role's connect protocol.
    pub async fn open(&self) {
        self.router.attach(Arc::clone(&self.connection));
        let result = self.policy.on_connect(&self.connection).await;
        self.settle("connect", result).await;
    }

    pub async fn handle(&self, event: ClientEvent) {
        let result = self.policy.on_event(&self.connection, event).await;
        self.settle("message", result).await;
    }

    /// Report a frame that could not be turned into a [`ClientEvent`].
    pub async fn reject(&self, reason: String) {
        self.settle("message", Err(RouteError::MalformedMessage(reason)))
            .await;
    }

    /// Run the role's disconnect protocol and free the registry slot.
    pub async fn close(&self) {
        if let Err(e) = self.policy.on_disconnect(&self.connection).await {
            warn!(connection_id = %self.connection.id(), "Error during disconnect: {e}");
        }
        self.router
            .release(self.policy.room(), self.connection.id());
    }

    async fn settle(&self, stage: &str, result: Result<(), RouteError>) {
        let Err(error) = result else {
            return;
        };
        warn!(
            connection_id = %self.connection.id(),
            room = self.policy.room().as_str(),
            kind = error.kind(),
            "Error after {stage}: {error}"
        );
        self.connection
            .send_error(self.policy.error_notice(&error))
            .await;
    }
}
