//! Caller-facing handles. Every public method takes the caller's
//! [`Identity`](crate::domain::Identity) and consults the
//! [`AccessGate`](crate::policy::AccessGate) before anything reaches an
//! actor or the store.

#[macro_use]
mod macros;

mod analytics_client;
mod stock_client;
mod user_client;

pub use analytics_client::*;
pub use stock_client::*;
pub use user_client::*;
