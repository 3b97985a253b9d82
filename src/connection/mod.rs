//! Per-connection protocol for customers and operators.

pub mod customer;
pub mod handler;
pub mod operator;
pub mod traits;

pub use customer::CustomerPolicy;
pub use handler::ConnectionHandler;
pub use operator::OperatorPolicy;
pub use traits::{Connection, ConnectionPolicy};
