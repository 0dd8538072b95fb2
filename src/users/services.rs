use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{ProfileRequest, RegisterRequest},
    password::{hash_password, verify_password, MIN_PASSWORD_LEN},
    repo::UserStoreError,
    repo_types::{NewUser, User, UserChanges},
};
use crate::{
    error::{AppError, FieldErrors, NON_FIELD_ERRORS},
    state::AppState,
    validation::{self, MAX_TEXT_LEN},
};

pub const EMAIL_TAKEN: &str = "user with this email already exists.";
pub const INVALID_CREDENTIALS: &str = "Unable to authenticate with provided credentials";

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims and lowercases the domain part; the local part is kept as typed.
pub(crate) fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// A unique-constraint hit is the same answer as the up-front email check.
impl From<UserStoreError> for AppError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::EmailTaken => {
                warn!("email taken by a concurrent write");
                AppError::field("email", EMAIL_TAKEN)
            }
            UserStoreError::Other(e) => AppError::Internal(e),
        }
    }
}

fn validate_email(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let email = validation::required_text(errors, "email", value, MAX_TEXT_LEN)?;
    let email = normalize_email(&email);
    if !is_valid_email(&email) {
        errors.add("email", validation::INVALID_EMAIL);
        return None;
    }
    Some(email)
}

fn validate_password(errors: &mut FieldErrors, value: Option<&str>) -> Option<String> {
    let Some(password) = value else {
        errors.add("password", validation::REQUIRED);
        return None;
    };
    if password.is_empty() {
        errors.add("password", validation::BLANK);
        return None;
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add("password", validation::min_length_message(MIN_PASSWORD_LEN));
        return None;
    }
    Some(password.to_string())
}

async fn check_email_free(
    state: &AppState,
    errors: &mut FieldErrors,
    email: &str,
    current_user: Option<i64>,
) -> anyhow::Result<()> {
    if let Some(existing) = state.users.find_by_email(email).await? {
        if Some(existing.id) != current_user {
            warn!(email = %email, "email already registered");
            errors.add("email", EMAIL_TAKEN);
        }
    }
    Ok(())
}

pub async fn register(state: &AppState, req: RegisterRequest) -> Result<User, AppError> {
    let mut errors = FieldErrors::new();
    let email = validate_email(&mut errors, req.email.as_deref());
    let password = validate_password(&mut errors, req.password.as_deref());
    let name = validation::required_text(&mut errors, "name", req.name.as_deref(), MAX_TEXT_LEN);
    if let Some(email) = &email {
        check_email_free(state, &mut errors, email, None).await?;
    }

    let (Some(email), Some(password), Some(name), true) = (email, password, name, errors.is_empty())
    else {
        return Err(AppError::Validation(errors));
    };

    let user = state
        .users
        .create(NewUser {
            email,
            name,
            password_hash: hash_password(&password)?,
            is_staff: false,
            is_superuser: false,
        })
        .await?;
    info!(user_id = user.id, email = %user.email, "user registered");
    Ok(user)
}

/// Looks the user up by normalized email and checks the password.
pub async fn authenticate(state: &AppState, email: &str, password: &str) -> Result<User, AppError> {
    let email = normalize_email(email);
    let invalid = || AppError::field(NON_FIELD_ERRORS, INVALID_CREDENTIALS);

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(invalid());
    };
    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = user.id, "login invalid password");
        return Err(invalid());
    }
    if !user.is_active {
        warn!(user_id = user.id, "login inactive user");
        return Err(invalid());
    }
    Ok(user)
}

/// PATCH when `partial`, otherwise PUT: email, name and password all required.
pub async fn update_profile(
    state: &AppState,
    user: &User,
    req: ProfileRequest,
    partial: bool,
) -> Result<User, AppError> {
    let mut errors = FieldErrors::new();
    let mut changes = UserChanges::default();

    if req.email.is_some() || !partial {
        changes.email = validate_email(&mut errors, req.email.as_deref());
        if let Some(email) = &changes.email {
            check_email_free(state, &mut errors, email, Some(user.id)).await?;
        }
    }
    if req.name.is_some() || !partial {
        changes.name =
            validation::required_text(&mut errors, "name", req.name.as_deref(), MAX_TEXT_LEN);
    }
    if req.password.is_some() || !partial {
        if let Some(password) = validate_password(&mut errors, req.password.as_deref()) {
            changes.password_hash = Some(hash_password(&password)?);
        }
    }
    errors.into_result()?;

    let password_changed = changes.password_hash.is_some();
    let updated = state
        .users
        .update(user.id, changes)
        .await?
        .ok_or(AppError::NotFound)?;
    info!(user_id = updated.id, password_changed, "profile updated");
    Ok(updated)
}

/// Creates the configured staff superuser unless the email is already taken.
pub async fn ensure_superuser(state: &AppState, email: &str, password: &str) -> anyhow::Result<()> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        anyhow::bail!("ADMIN_EMAIL {email:?} is not a valid email address");
    }
    if state.users.find_by_email(&email).await?.is_some() {
        return Ok(());
    }
    let created = state
        .users
        .create(NewUser {
            name: email.clone(),
            email,
            password_hash: hash_password(password)?,
            is_staff: true,
            is_superuser: true,
        })
        .await;
    match created {
        Ok(user) => info!(user_id = user.id, "superuser created"),
        Err(UserStoreError::EmailTaken) => info!("superuser created by another instance"),
        Err(UserStoreError::Other(e)) => return Err(e),
    }
    Ok(())
}
