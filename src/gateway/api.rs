//! Plain HTTP handlers served next to the WebSocket endpoints.

use super::GatewayState;
use crate::transport::{Room, Transport};
use axum::{
    extract::State,
    response::{IntoResponse, Json},
};

/// Snapshot of the router's live state.
///
/// `customers`/`operators` count registered handlers; `sockets` counts the
/// hub's open channels, which can briefly differ while a socket opens or closes.
pub fn health_snapshot(state: &GatewayState) -> serde_json::Value {
    let (customers, operators) = state.router.connection_counts();
    serde_json::json!({
        "status": "ok",
        "customers": customers,
        "operators": operators,
        "sockets": {
            "customers": state.hub.member_count(Room::Customers),
            "operators": state.hub.member_count(Room::Operators),
        },
        "store": state.router.store().name(),
        "agent": state.router.agent().name(),
    })
}

/// GET /health
pub async fn handle_health(State(state): State<GatewayState>) -> impl IntoResponse {
    Json(health_snapshot(&state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::connection::Connection;
    use crate::transport::Room;
    use std::sync::Arc;

    #[tokio::test]
    async fn health_reports_backends_and_counts() {
        let state = GatewayState::from_config(&Config::default()).unwrap();
        let _rx = state.hub.join_as("op1", Room::Operators);
        state.router.attach(Arc::new(Connection::new(
            "op1",
            Room::Operators,
            state.hub.clone(),
        )));

        let body = health_snapshot(&state);

        assert_eq!(body["status"], "ok");
        assert_eq!(body["customers"], 0);
        assert_eq!(body["operators"], 1);
        assert_eq!(body["sockets"]["operators"], 1);
        assert_eq!(body["sockets"]["customers"], 0);
        assert_eq!(body["store"], "in_memory");
        assert_eq!(body["agent"], "scripted");
    }

    #[tokio::test]
    async fn health_handler_returns_json() {
        let state = GatewayState::from_config(&Config::default()).unwrap();

        let response = handle_health(State(state)).await.into_response();

        assert_eq!(response.status(), axum::http::StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), 4096)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
    }
}
