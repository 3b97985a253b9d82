//! HTTP/WebSocket gateway: one socket per customer or operator, bridged to
//! the router through the [`ChannelHub`].

pub mod api;

use anyhow::{Context, Result};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, info, warn};

use crate::agent::create_agent_client;
use crate::config::Config;
use crate::connection::ConnectionHandler;
use crate::customers::create_customer_store;
use crate::routing::{MessageRouter, RouterSettings};
use crate::transport::{ChannelHub, ClientEvent, Room};

/// Maximum request body size for plain HTTP routes.
const MAX_BODY_SIZE: usize = 64 * 1024;
/// Request timeout for plain HTTP routes. Upgraded sockets are not affected.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Shared state for every gateway handler.
#[derive(Clone)]
pub struct GatewayState {
    pub router: Arc<MessageRouter>,
    pub hub: Arc<ChannelHub>,
}

impl GatewayState {
    /// Wire store, agent, hub and router from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = create_customer_store(&config.store)?;
        let agent = create_agent_client(&config.agent, &config.conversation)?;
        let hub = Arc::new(ChannelHub::new());
        let router = Arc::new(MessageRouter::new(
            store,
            agent,
            hub.clone(),
            RouterSettings::from_config(&config.conversation, &config.agent),
        ));
        Ok(Self { router, hub })
    }
}

pub fn build_app(state: GatewayState) -> Router {
    Router::new()
        .route("/customer", get(handle_customer_ws))
        .route("/operator", get(handle_operator_ws))
        .route("/health", get(api::handle_health))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        ))
        .with_state(state)
}

/// Run the gateway until Ctrl-C.
pub async fn run_gateway(host: &str, port: u16, config: Config) -> Result<()> {
    let state = GatewayState::from_config(&config)?;
    info!(
        store = state.router.store().name(),
        agent = state.router.agent().name(),
        "Router ready"
    );

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind gateway listener on {addr}"))?;
    let local_addr = listener.local_addr()?;
    info!("Gateway listening on http://{local_addr}");
    info!("  GET  /customer  (WebSocket)");
    info!("  GET  /operator  (WebSocket)");
    info!("  GET  /health");

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Gateway server failed")?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
    }
}

async fn handle_customer_ws(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Room::Customers))
}

async fn handle_operator_ws(
    ws: WebSocketUpgrade,
    State(state): State<GatewayState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, Room::Operators))
}

async fn handle_socket(socket: WebSocket, state: GatewayState, room: Room) {
    let (connection_id, mut outbound) = state.hub.join(room);
    let (mut sender, mut receiver) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(event) = outbound.recv().await {
            let payload = match serde_json::to_string(&event) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!("Failed to encode outbound event: {e}");
                    continue;
                }
            };
            if sender.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    let handler = ConnectionHandler::for_room(
        Arc::clone(&state.router),
        room,
        &connection_id,
        state.hub.clone(),
    );
    handler.open().await;

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                debug!(connection_id = %connection_id, "Socket read failed: {e}");
                break;
            }
        };

        match serde_json::from_str::<ClientEvent>(text.as_str()) {
            Ok(event) => handler.handle(event).await,
            Err(e) => handler.reject(e.to_string()).await,
        }
    }

    handler.close().await;
    state.hub.leave(&connection_id);
    // Leaving drops the hub's sender, so the writer drains and exits.
    let _ = writer.await;
}
