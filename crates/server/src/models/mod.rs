//! Domain models for the food ordering API.
//!
//! These types are what handlers and services pass around and what the JSON
//! API returns. Database row types live next to their queries in `db`.

pub mod order;
pub mod product;
pub mod profile;
pub mod session;
pub mod user;

pub use order::{Order, OrderDetail, OrderItemDetail};
pub use product::Product;
pub use profile::Profile;
pub use session::CurrentUser;
pub use user::User;
