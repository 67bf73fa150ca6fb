//! Transactional stock ledger for a point-of-sale inventory.
//!
//! Every sale atomically appends its sale rows and takes the units out of
//! stock; a reversal puts them back and removes the rows. Analytics are
//! derived from consistent snapshots of the committed ledger, and every
//! entry point is gated by a configurable role policy.
//!
//! Start a [`LedgerSystem`](app_system::LedgerSystem) from an
//! [`AppConfig`](app_system::AppConfig) and use its clients:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use rust_decimal::Decimal;
//! use stock_ledger::app_system::{AppConfig, LedgerSystem};
//! use stock_ledger::domain::{Identity, ProductCreate, Role, SaleItem, UserId};
//!
//! let system = LedgerSystem::start(&AppConfig::default()).await?;
//! let manager = Identity::new(UserId(2), Role::Manager);
//!
//! let product = ProductCreate::new("SNK-001", "Potato Chips", "Snacks", 10, Decimal::from(45), 5);
//! let id = system.stock_client.create_product(&manager, product).await?;
//! system
//!     .stock_client
//!     .record_sale(&manager, vec![SaleItem::new(id, 2, Decimal::from(45))], None)
//!     .await?;
//!
//! system.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod actor_framework;
pub mod analytics;
pub mod app_system;
pub mod clients;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod policy;
pub mod stock_actor;
pub mod user_actor;

#[cfg(test)]
mod integration_tests;
#[cfg(test)]
mod mock_framework;
