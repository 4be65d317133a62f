//! Profile domain type.

use chrono::{DateTime, Utc};
use serde::Serialize;

use food_order_core::{ProfileGroup, UserId};

/// Per-user profile.
///
/// The payment customer ID is kept server-side and never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Profile {
    pub id: UserId,
    pub group: ProfileGroup,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub expo_push_token: Option<String>,
    #[serde(skip)]
    pub stripe_customer_id: Option<String>,
    pub updated_at: DateTime<Utc>,
}
