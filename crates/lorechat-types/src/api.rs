use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::AuthContext;

// -- JWT Claims --

/// Claims of the token presented at the WebSocket handshake. Tokens are
/// issued by the surrounding platform; the gateway only verifies them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

impl From<Claims> for AuthContext {
    fn from(claims: Claims) -> Self {
        AuthContext::new(claims.sub, claims.username)
    }
}

// -- Handshake --

#[derive(Debug, Deserialize)]
pub struct GatewayQuery {
    pub token: Option<String>,
}
