//! Core types for Food Order.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod size;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{MoneyError, format_usd, to_minor_units};
pub use size::PizzaSize;
pub use status::*;
