//! Session gate in front of every pipeline route.
//!
//! Sign-in itself happens elsewhere; this service only checks that the bearer
//! token maps to a live session and hands the subject to handlers.

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use redis::AsyncCommands;
use tracing::debug;

use crate::clients::ClientError;
use crate::errors::AppError;
use crate::state::AppState;

const SESSION_KEY_PREFIX: &str = "session:";

/// The authenticated caller, inserted into request extensions by `require_session`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub subject: String,
}

#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Option<Session>, ClientError>;
}

/// Looks sessions up under `session:<token>`; the value is the subject id.
pub struct RedisSessionVerifier {
    client: redis::Client,
}

impl RedisSessionVerifier {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SessionVerifier for RedisSessionVerifier {
    async fn verify(&self, token: &str) -> Result<Option<Session>, ClientError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let subject: Option<String> = conn.get(format!("{SESSION_KEY_PREFIX}{token}")).await?;
        Ok(subject.map(|subject| Session { subject }))
    }
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or(AppError::Unauthorized)?
        .to_string();
    let session = state
        .sessions
        .verify(&token)
        .await
        .map_err(|e| AppError::Upstream(format!("session lookup failed: {e}")))?
        .ok_or(AppError::Unauthorized)?;

    debug!("Authenticated request for {}", session.subject);
    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
