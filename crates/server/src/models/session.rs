//! Session-related types.
//!
//! Types stored in the session for authentication state.

use serde::{Deserialize, Serialize};

use food_order_core::{Email, ProfileGroup, UserId};

/// Session-stored user identity.
///
/// Minimal data stored in the session to identify the logged-in user and
/// decide which mode (customer or admin) they may use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    /// User's database ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Role group, refreshed from the profile on each authenticated request.
    pub group: ProfileGroup,
}

impl CurrentUser {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.group.is_admin()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the customer's cart.
    pub const CART: &str = "cart";
}
