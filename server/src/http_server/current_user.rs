use appkit::{
    app_state::AppState as _,
    server::auth::{ApiToken, AuthRejection},
};
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use db::users::User;

use crate::AppState;

/// The user behind the request's API token.
///
/// Take `Option<CurrentUser>` on routes that anonymous callers may also use;
/// an unknown token is rejected either way.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
}

impl CurrentUser {
    pub fn id(&self) -> uuid::Uuid {
        self.user.user_id
    }
}

#[derive(Debug)]
pub enum CurrentUserError {
    Auth(AuthRejection),
    DBError(color_eyre::Report),
}

impl From<AuthRejection> for CurrentUserError {
    fn from(value: AuthRejection) -> Self {
        Self::Auth(value)
    }
}

impl From<color_eyre::Report> for CurrentUserError {
    fn from(e: color_eyre::Report) -> Self {
        Self::DBError(e)
    }
}

async fn user_for(token: ApiToken, state: &AppState) -> Result<CurrentUser, CurrentUserError> {
    let user = User::get_by_id(state.db(), token.user_id)
        .await?
        .ok_or(AuthRejection::InvalidToken)?;

    Ok(CurrentUser { user })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = CurrentUserError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token =
            <ApiToken as FromRequestParts<AppState>>::from_request_parts(parts, state).await?;

        user_for(token, state).await
    }
}

impl OptionalFromRequestParts<AppState> for CurrentUser {
    type Rejection = CurrentUserError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        let token =
            <ApiToken as OptionalFromRequestParts<AppState>>::from_request_parts(parts, state)
                .await?;

        match token {
            Some(token) => Ok(Some(user_for(token, state).await?)),
            None => Ok(None),
        }
    }
}

impl IntoResponse for CurrentUserError {
    fn into_response(self) -> Response {
        match self {
            Self::Auth(rejection) => rejection.into_response(),
            Self::DBError(e) => {
                tracing::error!(error = ?e, "Failed to load the current user");

                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}
