//! In-process transport: one unbounded channel per live connection.

use anyhow::{bail, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tokio::sync::mpsc;

use super::traits::{Room, ServerEvent, Transport};

struct Member {
    room: Room,
    outbound: mpsc::UnboundedSender<ServerEvent>,
}

/// Connection hub shared by the gateway and the router.
///
/// The gateway joins each socket and drains the returned receiver into it;
/// the router only ever sees the [`Transport`] side.
pub struct ChannelHub {
    members: Mutex<HashMap<String, Member>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self {
            members: Mutex::new(HashMap::new()),
        }
    }

    /// Add a connection to `room` under a fresh identifier.
    pub fn join(&self, room: Room) -> (String, mpsc::UnboundedReceiver<ServerEvent>) {
        let id = uuid::Uuid::new_v4().to_string();
        let rx = self.join_as(&id, room);
        (id, rx)
    }

    /// Add a connection under a caller-chosen identifier, replacing any
    /// previous member with the same id.
    pub fn join_as(&self, id: &str, room: Room) -> mpsc::UnboundedReceiver<ServerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.members.lock().insert(
            id.to_string(),
            Member {
                room,
                outbound: tx,
            },
        );
        rx
    }

    /// Drop a connection; its receiver sees the channel close.
    pub fn leave(&self, id: &str) {
        self.members.lock().remove(id);
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ChannelHub {
    async fn send(&self, connection_id: &str, event: ServerEvent) -> Result<()> {
        let members = self.members.lock();
        let Some(member) = members.get(connection_id) else {
            bail!("connection not found: {connection_id}");
        };
        if member.outbound.send(event).is_err() {
            bail!("connection closed: {connection_id}");
        }
        Ok(())
    }

    async fn broadcast(&self, room: Room, event: ServerEvent) -> Result<()> {
        let members = self.members.lock();
        for member in members.values().filter(|m| m.room == room) {
            // A closed receiver means the socket is already going away.
            let _ = member.outbound.send(event.clone());
        }
        Ok(())
    }

    fn member_count(&self, room: Room) -> usize {
        self.members
            .lock()
            .values()
            .filter(|m| m.room == room)
            .count()
    }

    fn name(&self) -> &str {
        "channel_hub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn send_reaches_only_the_target() {
        let hub = ChannelHub::new();
        let mut a = hub.join_as("a", Room::Customers);
        let mut b = hub.join_as("b", Room::Customers);

        hub.send("a", ServerEvent::text("hello")).await.unwrap();

        assert_eq!(a.try_recv().unwrap(), ServerEvent::text("hello"));
        assert!(b.try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_unknown_connection_errors() {
        let hub = ChannelHub::new();
        let err = hub.send("ghost", ServerEvent::text("x")).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn broadcast_is_scoped_to_room() {
        let hub = ChannelHub::new();
        let mut op1 = hub.join_as("op1", Room::Operators);
        let mut op2 = hub.join_as("op2", Room::Operators);
        let mut customer = hub.join_as("c1", Room::Customers);

        hub.broadcast(
            Room::Operators,
            ServerEvent::OperatorRequested("c1".into()),
        )
        .await
        .unwrap();

        assert!(op1.try_recv().is_ok());
        assert!(op2.try_recv().is_ok());
        assert!(customer.try_recv().is_err());
    }

    #[tokio::test]
    async fn leave_closes_receiver_and_updates_counts() {
        let hub = ChannelHub::new();
        let (id, mut rx) = hub.join(Room::Operators);
        assert_eq!(hub.member_count(Room::Operators), 1);
        assert_eq!(hub.member_count(Room::Customers), 0);

        hub.leave(&id);
        assert_eq!(hub.member_count(Room::Operators), 0);
        assert!(rx.recv().await.is_none());
    }
}
