//! How events reach connected customers and operators.

pub mod hub;
pub mod traits;

pub use hub::ChannelHub;
pub use traits::{
    ClientEvent, CustomerMessage, OperatorEnvelope, OperatorMessage, Room, ServerEvent,
    SystemError, Transport,
};
