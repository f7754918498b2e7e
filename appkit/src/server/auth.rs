use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Response},
    Json,
};
use http::{header, request::Parts, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_state::AppState as AS;

/// An API token presented as `Authorization: Token <key>`.
///
/// Tokens are issued outside this service; we only resolve them to a user.
#[derive(Debug, Clone, Deserialize, Serialize, sqlx::FromRow)]
pub struct ApiToken {
    pub token: String,
    pub user_id: uuid::Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Error)]
pub enum AuthRejection {
    #[error("Authentication credentials were not provided.")]
    MissingCredentials,
    #[error("Invalid token.")]
    InvalidToken,
    #[error("Failed to look up token: {0}")]
    Database(#[from] sqlx::Error),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            Self::MissingCredentials | Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Token")],
                Json(serde_json::json!({ "detail": self.to_string() })),
            )
                .into_response(),
            Self::Database(e) => {
                tracing::error!(error = %e, "Failed to authenticate request");

                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// Pulls the raw key out of the `Authorization` header.
///
/// `Ok(None)` means the header is absent; a present but malformed header is
/// rejected rather than treated as anonymous.
pub fn token_from_parts(parts: &Parts) -> Result<Option<&str>, AuthRejection> {
    let Some(value) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let value = value.to_str().map_err(|_| AuthRejection::InvalidToken)?;

    let key = value
        .strip_prefix("Token ")
        .or_else(|| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or(AuthRejection::InvalidToken)?;

    Ok(Some(key))
}

impl ApiToken {
    #[tracing::instrument(name = "ApiToken::find", skip_all, err)]
    pub async fn find(pool: &sqlx::PgPool, token: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ApiToken>(
            r"
        SELECT token, user_id, created_at
        FROM api_tokens
        WHERE token = $1
        ",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    async fn resolve<AppState: AS>(
        parts: &Parts,
        state: &AppState,
    ) -> Result<Option<Self>, AuthRejection> {
        let Some(key) = token_from_parts(parts)? else {
            return Ok(None);
        };

        let token = Self::find(state.db(), key)
            .await?
            .ok_or(AuthRejection::InvalidToken)?;

        Ok(Some(token))
    }
}

impl<AppState: AS> FromRequestParts<AppState> for ApiToken {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Self::resolve(parts, state)
            .await?
            .ok_or(AuthRejection::MissingCredentials)
    }
}

impl<AppState: AS> OptionalFromRequestParts<AppState> for ApiToken {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Self::resolve(parts, state).await
    }
}
