//! Product size variants.

use serde::{Deserialize, Serialize};

/// Size variant chosen when adding a product to the cart.
///
/// Sizes do not change the unit price; they distinguish cart lines and are
/// recorded on each order item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(type_name = "pizza_size"))]
pub enum PizzaSize {
    #[serde(rename = "S")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "S"))]
    Small,
    #[default]
    #[serde(rename = "M")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "M"))]
    Medium,
    #[serde(rename = "L")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "L"))]
    Large,
    #[serde(rename = "XL")]
    #[cfg_attr(feature = "postgres", sqlx(rename = "XL"))]
    ExtraLarge,
}

impl PizzaSize {
    /// Every size, smallest first.
    pub const ALL: [Self; 4] = [Self::Small, Self::Medium, Self::Large, Self::ExtraLarge];

    /// Short label used on the wire and in the database.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Small => "S",
            Self::Medium => "M",
            Self::Large => "L",
            Self::ExtraLarge => "XL",
        }
    }
}

impl std::fmt::Display for PizzaSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PizzaSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .ok_or_else(|| format!("invalid size: {s}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_medium() {
        assert_eq!(PizzaSize::default(), PizzaSize::Medium);
    }

    #[test]
    fn test_wire_labels() {
        assert_eq!(serde_json::to_string(&PizzaSize::ExtraLarge).unwrap(), "\"XL\"");
        assert_eq!("S".parse::<PizzaSize>().unwrap(), PizzaSize::Small);
        assert!("XXL".parse::<PizzaSize>().is_err());
    }
}
