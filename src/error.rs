use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Field name -> messages, rendered as-is in 400 responses.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// Ok when nothing was collected.
    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("Not found.")]
    NotFound,

    #[error("Method \"{0}\" not allowed.")]
    MethodNotAllowed(Method),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation(FieldErrors::single(field, message))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            AppError::Unauthorized(detail) => {
                let mut res =
                    (StatusCode::UNAUTHORIZED, Json(json!({ "detail": detail }))).into_response();
                res.headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Token"));
                res
            }
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "detail": "Not found." })),
            )
                .into_response(),
            AppError::MethodNotAllowed(_) => (
                StatusCode::METHOD_NOT_ALLOWED,
                Json(json!({ "detail": self.to_string() })),
            )
                .into_response(),
            AppError::Internal(e) => {
                error!(error = ?e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error." })),
                )
                    .into_response()
            }
        }
    }
}

/// `Json` whose rejections come back as 400 field errors instead of plain text.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AppError::field(NON_FIELD_ERRORS, json_rejection_message(&rejection))),
        }
    }
}

fn json_rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Unsupported media type, expected application/json.".to_string()
        }
        other => format!("JSON parse error - {}", other.body_text()),
    }
}

/// Fallback for verbs a route does not serve.
pub async fn method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed(method)
}

/// Router fallback for paths no route matches.
pub async fn not_found() -> AppError {
    AppError::NotFound
}
