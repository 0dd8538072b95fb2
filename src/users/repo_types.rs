use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String, // argon2 PHC string, never exposed
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub created_at: OffsetDateTime,
}

/// Insert payload; the hash is computed before it gets here.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Columns a profile update may touch. `None` leaves the column alone.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password_hash: Option<String>,
}
