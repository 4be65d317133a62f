//! Food Order Core - Domain types and the cart state machine.
//!
//! This crate provides the types shared by every Food Order component:
//! - `server` - JSON API for the customer and admin apps
//! - `cli` - Command-line tools for migrations and management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. Database encoding is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money helpers, statuses and sizes
//! - [`cart`] - Client cart: line merging, quantity changes, totals

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartError, CartItem, CartProduct, OrderLine, QuantityChange};
pub use types::*;
