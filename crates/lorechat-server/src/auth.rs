use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use lorechat_types::api::Claims;
use lorechat_types::error::ChatError;
use lorechat_types::models::AuthContext;

/// Token from `?token=` if present, otherwise from `Authorization: Bearer`.
pub fn handshake_token<'a>(query_token: Option<&'a str>, headers: &'a HeaderMap) -> Option<&'a str> {
    query_token.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    })
}

/// Verify a handshake JWT and turn its claims into the identity the chat
/// core will trust for the lifetime of the connection.
pub fn authenticate(token: Option<&str>, secret: &str) -> Result<AuthContext, ChatError> {
    let token = token.ok_or(ChatError::NotAuthenticated)?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        debug!("Rejected handshake token: {}", e);
        ChatError::NotAuthenticated
    })?;

    Ok(token_data.claims.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use uuid::Uuid;

    fn issue(secret: &str, user_id: Uuid, username: &str, exp: usize) -> String {
        let claims = Claims {
            sub: user_id,
            username: username.to_string(),
            exp,
        };
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> usize {
        4_102_444_800 // 2100-01-01
    }

    #[test]
    fn valid_token_yields_context() {
        let user_id = Uuid::new_v4();
        let token = issue("s3cret", user_id, "alice", far_future());

        let ctx = authenticate(Some(&token), "s3cret").unwrap();
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.user_name, "alice");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue("s3cret", Uuid::new_v4(), "alice", far_future());
        assert!(matches!(
            authenticate(Some(&token), "other"),
            Err(ChatError::NotAuthenticated)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue("s3cret", Uuid::new_v4(), "alice", 1_000);
        assert!(authenticate(Some(&token), "s3cret").is_err());
    }

    #[test]
    fn missing_token_is_rejected() {
        assert!(matches!(
            authenticate(None, "s3cret"),
            Err(ChatError::NotAuthenticated)
        ));
    }

    #[test]
    fn query_token_wins_over_header() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));

        assert_eq!(handshake_token(Some("from-query"), &headers), Some("from-query"));
        assert_eq!(handshake_token(None, &headers), Some("from-header"));
        assert_eq!(handshake_token(None, &HeaderMap::new()), None);
    }
}
