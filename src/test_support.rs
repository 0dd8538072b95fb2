//! Router-level helpers shared by the handler tests.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use crate::{
    app::build_app,
    memory::MemoryStores,
    state::AppState,
    users::{dto::RegisterRequest, repo_types::User, services},
};

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub stores: MemoryStores,
}

impl TestApp {
    pub fn new() -> Self {
        let (state, stores) = AppState::fake_with_stores();
        Self {
            router: build_app(state.clone()),
            state,
            stores,
        }
    }
}

pub async fn send_raw(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    content_type: &str,
    body: Vec<u8>,
) -> Response {
    let mut req = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Token {token}"));
    }
    router
        .clone()
        .oneshot(req.body(Body::from(body)).unwrap())
        .await
        .unwrap()
}

/// Response body as JSON; `Value::Null` when empty.
pub async fn json_body(res: Response) -> Value {
    let bytes = res.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let bytes = body.map(|b| serde_json::to_vec(&b).unwrap()).unwrap_or_default();
    let res = send_raw(router, method, uri, token, "application/json", bytes).await;
    let status = res.status();
    (status, json_body(res).await)
}

pub async fn create_user(state: &AppState, email: &str, password: &str) -> User {
    services::register(
        state,
        RegisterRequest {
            email: Some(email.into()),
            password: Some(password.into()),
            name: Some("Test User".into()),
        },
    )
    .await
    .unwrap()
}

/// Registers a user and issues its token.
pub async fn login(state: &AppState, email: &str, password: &str) -> (User, String) {
    let user = create_user(state, email, password).await;
    let token = state.tokens.get_or_create(user.id).await.unwrap();
    (user, token)
}

/// A single-file `multipart/form-data` body. Returns (content type, body).
pub fn multipart_body(field: &str, file_name: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----recipe-api-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\n").as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

/// Pool on `DATABASE_URL` with migrations applied, for the `#[ignore]`d
/// Postgres store tests (`cargo test -- --ignored`).
pub async fn pg_pool() -> sqlx::PgPool {
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must point at a Postgres database");
    let db = sqlx::postgres::PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL");
    crate::db::run_migrations(&db).await.expect("migrations");
    db
}

/// Fresh address per call so runs against a shared database do not collide.
pub fn unique_email() -> String {
    format!("{}@pg.test", uuid::Uuid::new_v4().simple())
}
