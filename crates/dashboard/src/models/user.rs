//! Staff user domain types.

use chrono::{DateTime, Utc};

use pharmship_core::{Email, UserId, UserRole};

/// A staff user (domain type).
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login email address.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Permission level.
    pub role: UserRole,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
