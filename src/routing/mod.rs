//! Message routing. Decides who sees each message and when a customer is
//! handed from the automated agent to a human operator.

pub mod error;
pub mod escalation;
pub mod registry;
pub mod router;

pub use error::RouteError;
pub use escalation::{requests_operator, response_requests_operator};
pub use registry::{ConnectionRegistry, CustomerLocks};
pub use router::{ConnectionStatus, CustomerReply, MessageRouter, RouterSettings};
