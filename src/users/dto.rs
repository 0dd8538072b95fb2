use serde::{Deserialize, Serialize};

use super::repo_types::User;

/// Request body for `POST /user/create`. Every field is optional here so
/// that missing ones come back as field errors rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Request body for `PUT`/`PATCH /user/me`.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Response to a successful registration.
#[derive(Debug, Serialize)]
pub struct CreatedUser {
    pub id: i64,
    pub email: String,
    pub name: String,
}

impl From<User> for CreatedUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            name: u.name,
        }
    }
}

/// What `/user/me` returns.
#[derive(Debug, Serialize)]
pub struct Profile {
    pub email: String,
    pub name: String,
}

impl From<User> for Profile {
    fn from(u: User) -> Self {
        Self {
            email: u.email,
            name: u.name,
        }
    }
}
