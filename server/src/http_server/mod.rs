use appkit::app_state::AppState as _;
use axum::{extract::State, response::Response, Json};
use serde::{Deserialize, Serialize};

use crate::AppState;
use errors::ServerError;

pub(crate) mod cmd;

pub(crate) mod api;

pub mod current_user;
pub mod errors;
pub mod pagination;
pub(crate) mod routes;

#[cfg(test)]
pub(crate) mod test_helpers;

#[cfg(test)]
mod tests;

pub(crate) type ResponseResult<T = Response> = Result<T, ServerError>;

#[derive(Debug, Serialize, Deserialize)]
pub struct Versions {
    pub version: String,
}

pub(crate) async fn versions(State(state): State<AppState>) -> Json<Versions> {
    Json(Versions {
        version: state.version().to_string(),
    })
}
