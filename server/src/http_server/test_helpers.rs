use axum::{
    body::Body,
    http::{header, Method, Request, Response},
    Router,
};
use db::{
    cooking::{Ingredient, Tag},
    users::{NewUser, User},
};
use serde::de::DeserializeOwned;
use sqlx::PgPool;
use tower::ServiceExt as _;
use url::Url;

use crate::{
    http_server::routes::make_router,
    state::{AppConfig, VersionInfo},
    AppState,
};

pub fn create_test_app(pool: PgPool) -> Router {
    let state = AppState {
        app: AppConfig {
            base_url: Url::parse("http://localhost:3000").unwrap(),
        },
        versions: VersionInfo {
            package_version: "test-version",
        },
        db: pool,
    };

    make_router().with_state(state)
}

/// A user plus the API token that authenticates as them.
pub async fn create_user(pool: &PgPool, username: &str) -> (User, String) {
    let user = User::create(
        pool,
        &NewUser {
            email: format!("{username}@example.com"),
            username: username.to_string(),
            first_name: username.to_string(),
            last_name: "Tester".to_string(),
        },
    )
    .await
    .unwrap();

    let token = format!("token-{username}");
    sqlx::query("INSERT INTO api_tokens (token, user_id) VALUES ($1, $2)")
        .bind(&token)
        .bind(user.user_id)
        .execute(pool)
        .await
        .unwrap();

    (user, token)
}

pub async fn create_ingredient(pool: &PgPool, name: &str, unit: &str) -> Ingredient {
    Ingredient::create_if_missing(pool, name, unit)
        .await
        .unwrap()
        .unwrap()
}

pub async fn create_tag(pool: &PgPool, name: &str) -> Tag {
    Tag::create(pool, name, None).await.unwrap()
}

pub fn request(
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Token {token}"));
    }

    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn response_body_json<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body_bytes).unwrap()
}

pub async fn response_body_text(response: Response<Body>) -> String {
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body_bytes.to_vec()).unwrap()
}
