//! User domain types.

use chrono::{DateTime, Utc};

use food_order_core::{Email, UserId};

/// A login identity.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID (shared with the profile).
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
