//! # till-core
//!
//! Core types and checkout state machine for the till sales terminal.
//!
//! This crate provides:
//! - `CatalogCache`: the session's read-only product and customer snapshot
//! - `Cart`: the cashier's local selection for the current sale
//! - `OrderSession`: the cart-to-order-to-payment state machine
//! - `PaymentDispatcher` / `PaymentMethod`: settling an order, one request
//!   per attempt
//! - `BackendGateway`: the store backend REST boundary as a trait
//! - `TerminalError`: typed error handling for every operation
//!
//! ## Example
//!
//! ```rust,ignore
//! use till_core::{Cart, CatalogCache, OrderSession, PaymentDispatcher, PaymentMethod};
//!
//! let catalog = CatalogCache::load(gateway.as_ref()).await?;
//! let mut cart = Cart::new();
//! cart.add(catalog.product(1).unwrap());
//!
//! let mut session = OrderSession::new();
//! let order = session.submit(&cart, gateway.as_ref()).await?;
//! let receipt = session
//!     .pay(&mut cart, PaymentMethod::Card, &dispatcher)
//!     .await?;
//! println!("ticket {} settled for {}", receipt.folio, receipt.total);
//! ```

pub mod cart;
pub mod catalog;
pub mod error;
pub mod gateway;
pub mod money;
pub mod payment;
pub mod session;

// Re-export commonly used types
pub use cart::{Cart, CartLine};
pub use catalog::{CatalogCache, Customer, CustomerId, Product, ProductId};
pub use error::{TerminalError, TerminalResult};
pub use gateway::{BackendGateway, DraftLine, OrderAck, OrderDraft, OrderId, SharedGateway};
pub use money::Money;
pub use payment::{PaymentDispatcher, PaymentMethod};
pub use session::{OpenOrder, OrderSession, Receipt, Stage};
