use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreatedUser, Profile, ProfileRequest, RegisterRequest},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::{method_not_allowed, AppError, AppJson},
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(create_user).fallback(method_not_allowed))
        .route(
            "/user/me",
            get(get_me)
                .put(put_me)
                .patch(patch_me)
                .fallback(method_not_allowed),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<CreatedUser>), AppError> {
    let user = services::register(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip_all)]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<Profile> {
    Json(user.into())
}

#[instrument(skip_all)]
pub async fn put_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<ProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let updated = services::update_profile(&state, &user, payload, false).await?;
    Ok(Json(updated.into()))
}

#[instrument(skip_all)]
pub async fn patch_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    AppJson(payload): AppJson<ProfileRequest>,
) -> Result<Json<Profile>, AppError> {
    let updated = services::update_profile(&state, &user, payload, true).await?;
    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{login, send, TestApp};
    use crate::users::password::verify_password;

    #[tokio::test]
    async fn create_valid_user_success() {
        let app = TestApp::new();
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/user/create",
            None,
            Some(json!({ "email": "test@foobar.com", "password": "testpass", "name": "test Name" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["email"], "test@foobar.com");
        assert_eq!(body["name"], "test Name");
        assert!(body.get("password").is_none());

        let user = app
            .state
            .users
            .find_by_email("test@foobar.com")
            .await
            .unwrap()
            .expect("user persisted");
        assert_eq!(body["id"], user.id);
        assert!(verify_password("testpass", &user.password_hash).unwrap());
    }

    #[tokio::test]
    async fn create_duplicate_user_fails() {
        let app = TestApp::new();
        let payload = json!({ "email": "test@foobar.com", "password": "testpass", "name": "n" });
        let (first, _) = send(&app.router, Method::POST, "/user/create", None, Some(payload.clone())).await;
        assert_eq!(first, StatusCode::CREATED);

        let (status, body) = send(&app.router, Method::POST, "/user/create", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["email"][0], "user with this email already exists.");
    }

    #[tokio::test]
    async fn short_password_is_rejected_and_nothing_persisted() {
        let app = TestApp::new();
        let (status, body) = send(
            &app.router,
            Method::POST,
            "/user/create",
            None,
            Some(json!({ "email": "test@foobar.com", "password": "fo", "name": "your name" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["password"].is_array());
        assert!(app
            .state
            .users
            .find_by_email("test@foobar.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn malformed_json_is_a_bad_request() {
        let app = TestApp::new();
        let res = crate::test_support::send_raw(
            &app.router,
            Method::POST,
            "/user/create",
            None,
            "application/json",
            b"{not json".to_vec(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_requires_token() {
        let app = TestApp::new();
        let (status, body) = send(&app.router, Method::GET, "/user/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body.get("email").is_none());
    }

    #[tokio::test]
    async fn me_returns_profile() {
        let app = TestApp::new();
        let (_, token) = login(&app.state, "me@x.com", "pass123").await;
        let (status, body) = send(&app.router, Method::GET, "/user/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "email": "me@x.com", "name": "Test User" }));
    }

    #[tokio::test]
    async fn patch_me_updates_name_and_rehashes_password() {
        let app = TestApp::new();
        let (user, token) = login(&app.state, "me@x.com", "pass123").await;
        let (status, body) = send(
            &app.router,
            Method::PATCH,
            "/user/me",
            Some(&token),
            Some(json!({ "name": "New Name", "password": "newpass" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "email": "me@x.com", "name": "New Name" }));

        let stored = app.state.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_ne!(stored.password_hash, user.password_hash);
        assert!(verify_password("newpass", &stored.password_hash).unwrap());
    }

    #[tokio::test]
    async fn patch_me_leaves_unsupplied_fields() {
        let app = TestApp::new();
        let (user, token) = login(&app.state, "me@x.com", "pass123").await;
        let (status, _) = send(
            &app.router,
            Method::PATCH,
            "/user/me",
            Some(&token),
            Some(json!({ "name": "Only Name" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let stored = app.state.users.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, user.password_hash);
        assert_eq!(stored.email, "me@x.com");
    }

    #[tokio::test]
    async fn put_me_requires_all_fields() {
        let app = TestApp::new();
        let (_, token) = login(&app.state, "me@x.com", "pass123").await;
        let (status, body) = send(
            &app.router,
            Method::PUT,
            "/user/me",
            Some(&token),
            Some(json!({ "name": "Only Name" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["email"].is_array());
        assert!(body["password"].is_array());
    }

    #[tokio::test]
    async fn unsupported_verb_is_405() {
        let app = TestApp::new();
        let (_, token) = login(&app.state, "me@x.com", "pass123").await;
        let (status, body) = send(&app.router, Method::DELETE, "/user/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["detail"], "Method \"DELETE\" not allowed.");
    }
}
