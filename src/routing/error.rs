use std::time::Duration;

use crate::customers::StoreError;
use crate::transport::SystemError;

/// Everything that can end a routing flow early.
#[derive(Debug, thiserror::Error)]
pub enum RouteError {
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An operator addressed a customer the agent is still handling.
    #[error("Cannot respond to customer until they have been escalated.")]
    CustomerNotEscalated { customer_id: String },

    #[error("No live connection for customer {customer_id}; the message was not delivered.")]
    DeliveryFailed { customer_id: String },

    #[error("'{event}' is not accepted on a {room} connection")]
    UnexpectedEvent { event: &'static str, room: &'static str },

    #[error("Malformed message: {0}")]
    MalformedMessage(String),

    #[error("agent did not respond within {0:?}")]
    AgentTimeout(Duration),

    #[error("agent request failed: {0:#}")]
    Agent(anyhow::Error),

    #[error("transport send failed: {0:#}")]
    Transport(anyhow::Error),
}

impl RouteError {
    /// Stable kind name shown to operators as the notice `type`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Store(StoreError::InvalidArgument(_))
            | Self::UnexpectedEvent { .. }
            | Self::MalformedMessage(_) => "InvalidArgument",
            Self::CustomerNotEscalated { .. } => "CustomerModeError",
            Self::DeliveryFailed { .. } => "DeliveryError",
            Self::Store(_) | Self::AgentTimeout(_) | Self::Agent(_) | Self::Transport(_) => {
                "Error"
            }
        }
    }

    /// Notice for the operator whose message failed.
    pub fn operator_notice(&self) -> SystemError {
        SystemError::new(self.kind(), self.to_string())
    }

    /// Customers only ever see a generic notice.
    pub fn customer_notice() -> SystemError {
        SystemError::new("Error", "There was a problem.")
    }
}
