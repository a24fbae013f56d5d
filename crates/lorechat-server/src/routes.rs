use axum::{
    Json, Router,
    extract::{Query, State, WebSocketUpgrade},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use lorechat_gateway::connection;
use lorechat_gateway::{Dispatcher, Services};
use lorechat_types::api::GatewayQuery;

use crate::auth;

#[derive(Clone)]
pub struct ServerState {
    pub dispatcher: Dispatcher,
    pub services: Services,
    pub jwt_secret: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub connections: usize,
    pub channels: usize,
}

pub fn app(state: ServerState) -> Router {
    Router::new()
        .route("/gateway", get(ws_upgrade))
        .route("/channels", get(list_channels))
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// The token is checked before the upgrade; a bad one never gets a socket.
async fn ws_upgrade(
    State(state): State<ServerState>,
    Query(query): Query<GatewayQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let token = auth::handshake_token(query.token.as_deref(), &headers);
    let ctx = match auth::authenticate(token, &state.jwt_secret) {
        Ok(ctx) => ctx,
        Err(e) => {
            debug!("Refusing gateway upgrade: {}", e);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher, state.services, ctx)
    })
}

async fn list_channels(State(state): State<ServerState>) -> Result<impl IntoResponse, StatusCode> {
    let channels = state
        .services
        .channel_directory(&state.dispatcher)
        .await
        .map_err(|e| {
            error!("Channel directory unavailable: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    Ok(Json(channels))
}

async fn health(State(state): State<ServerState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        connections: state.dispatcher.connection_count(),
        channels: state.dispatcher.channel_count(),
    })
}
