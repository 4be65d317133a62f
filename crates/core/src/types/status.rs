//! Order status and profile role enums.

use serde::{Deserialize, Serialize};

use crate::OrderId;

/// Stage of an order, in the order it progresses through the kitchen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "order_status"))]
pub enum OrderStatus {
    #[default]
    New,
    Cooking,
    Delivering,
    Delivered,
}

impl OrderStatus {
    /// All stages in progression order.
    pub const ALL: [Self; 4] = [Self::New, Self::Cooking, Self::Delivering, Self::Delivered];

    /// Database / wire label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Cooking => "Cooking",
            Self::Delivering => "Delivering",
            Self::Delivered => "Delivered",
        }
    }

    /// Whether the order has left the active queue.
    #[must_use]
    pub const fn is_archived(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Push notification title and body telling a customer their order moved
    /// to this stage.
    #[must_use]
    pub fn customer_message(self, order_id: OrderId) -> (&'static str, String) {
        match self {
            Self::New => (
                "Order has been marked as New",
                format!("Your order #{order_id} has been received!"),
            ),
            Self::Cooking => (
                "Order is Cooking",
                format!("Your order #{order_id} is now being prepared!"),
            ),
            Self::Delivering => (
                "Order is Delivering",
                format!("Your order #{order_id} is on its way!"),
            ),
            Self::Delivered => (
                "Order has been Delivered",
                format!("Your order #{order_id} has been delivered!"),
            ),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("invalid order status: {s}"))
    }
}

/// Role group stored on a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "profile_group", rename_all = "UPPERCASE")
)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProfileGroup {
    /// Customer mode.
    #[default]
    User,
    /// Admin mode: menu management and the order queue.
    Admin,
}

impl ProfileGroup {
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl std::fmt::Display for ProfileGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "USER"),
            Self::Admin => write!(f, "ADMIN"),
        }
    }
}

impl std::str::FromStr for ProfileGroup {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(format!("invalid profile group: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_delivered_is_archived() {
        let archived: Vec<_> = OrderStatus::ALL
            .into_iter()
            .filter(|s| s.is_archived())
            .collect();
        assert_eq!(archived, [OrderStatus::Delivered]);
    }

    #[test]
    fn test_status_progression_order() {
        assert!(OrderStatus::New < OrderStatus::Cooking);
        assert!(OrderStatus::Delivering < OrderStatus::Delivered);
    }

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_string(&OrderStatus::Cooking).unwrap(), "\"Cooking\"");
        assert_eq!("Delivering".parse::<OrderStatus>().unwrap(), OrderStatus::Delivering);
        assert!("cooking".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_customer_message() {
        let (title, body) = OrderStatus::Cooking.customer_message(OrderId::new(42));
        assert_eq!(title, "Order is Cooking");
        assert_eq!(body, "Your order #42 is now being prepared!");
    }

    #[test]
    fn test_profile_group() {
        assert_eq!(serde_json::to_string(&ProfileGroup::Admin).unwrap(), "\"ADMIN\"");
        assert_eq!("admin".parse::<ProfileGroup>().unwrap(), ProfileGroup::Admin);
        assert!(ProfileGroup::Admin.is_admin());
        assert!(!ProfileGroup::User.is_admin());
    }
}
