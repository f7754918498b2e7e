use std::fmt::{Debug, Display};

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use axum_macros::FromRequest;
use color_eyre::eyre::eyre;
use db::{cooking::ValidationErrors, StoreError};

/// A handler failure: the report plus the status it should be answered with.
pub struct ServerError(pub(crate) color_eyre::Report, pub(crate) StatusCode);

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

impl Debug for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("Status Code: {}\n", self.1))?;

        Debug::fmt(&self.0, f)
    }
}

impl std::error::Error for ServerError {}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if self.1.is_server_error() {
            sentry::capture_error(&self);

            tracing::error!(error = ?self, "ServerError");

            return (
                self.1,
                Json(serde_json::json!({ "detail": "Internal server error" })),
            )
                .into_response();
        }

        tracing::info!(status = %self.1, error = %self.0, "Request rejected");

        if let Some(errors) = self.0.downcast_ref::<ValidationErrors>() {
            return (self.1, Json(errors)).into_response();
        }

        (
            self.1,
            Json(serde_json::json!({ "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

impl From<color_eyre::Report> for ServerError {
    fn from(err: color_eyre::Report) -> Self {
        ServerError(err, StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ValidationErrors> for ServerError {
    fn from(errors: ValidationErrors) -> Self {
        ServerError(errors.into(), StatusCode::BAD_REQUEST)
    }
}

impl From<StoreError> for ServerError {
    fn from(err: StoreError) -> Self {
        let status = match &err {
            StoreError::NotFound(_) | StoreError::TargetNotFound(_) => StatusCode::NOT_FOUND,
            StoreError::AlreadyExists(_)
            | StoreError::SelfReference(_)
            | StoreError::Invalid(_) => StatusCode::BAD_REQUEST,
            StoreError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ServerError(err.into(), status)
    }
}

/// Malformed bodies are answered like any other invalid input.
impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        let status = match rejection.status() {
            StatusCode::UNPROCESSABLE_ENTITY => StatusCode::BAD_REQUEST,
            status => status,
        };

        ServerError(eyre!(rejection.body_text()), status)
    }
}

/// `Json` whose rejection is a [`ServerError`].
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ServerError))]
pub struct ApiJson<T>(pub T);

pub(crate) trait WithStatus<T> {
    fn with_status(self, status: StatusCode) -> Result<T, ServerError>;
}

impl<T, E> WithStatus<T> for Result<T, E>
where
    E: Into<color_eyre::Report>,
{
    fn with_status(self, status: StatusCode) -> Result<T, ServerError> {
        self.map_err(|e| ServerError(e.into(), status))
    }
}

pub(crate) fn not_found(what: &str) -> ServerError {
    ServerError(eyre!("{what} not found"), StatusCode::NOT_FOUND)
}
