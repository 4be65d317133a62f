//! Business logic services.

pub mod auth;
pub mod checkout;
pub mod email;
pub mod menu;
pub mod notifications;
pub mod payments;
pub mod realtime;
pub mod storage;

pub use auth::{AuthError, AuthService};
pub use checkout::{CheckoutError, CheckoutService};
pub use email::EmailService;
pub use menu::{MenuCache, MenuError, MenuService};
pub use notifications::PushNotifier;
pub use payments::{PaymentError, StripeClient};
pub use realtime::{EventFilter, OrderEvent, OrderEvents};
pub use storage::{ImageStore, StorageError};
