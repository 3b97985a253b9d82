pub mod schema;

pub use schema::{AgentConfig, Config, ConversationConfig, GatewayConfig, StoreConfig};
