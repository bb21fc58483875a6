//! # Backend Gateway
//!
//! The REST boundary of the store backend, expressed as a trait so the
//! terminal core stays testable without a network. The production
//! implementation lives in `till-http`.

use crate::catalog::{Customer, CustomerId, Product, ProductId};
use crate::error::TerminalResult;
use crate::money::Money;
use crate::payment::PaymentMethod;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Order identifier assigned by the backend on creation
pub type OrderId = i64;

/// One submitted cart line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Immutable snapshot of a cart, submitted for order creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Customer association; `None` is a walk-in sale
    pub customer: Option<CustomerId>,
    pub lines: Vec<DraftLine>,
    /// Client-generated key carried on the create request, so a resubmitted
    /// attempt cannot double-create the order
    pub idempotency_key: String,
}

impl OrderDraft {
    pub fn new(customer: Option<CustomerId>, lines: Vec<DraftLine>) -> Self {
        Self {
            customer,
            lines,
            idempotency_key: Uuid::new_v4().to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines
    pub fn unit_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }
}

/// What the backend reports for a freshly created order.
#[derive(Debug, Clone)]
pub struct OrderAck {
    pub order_id: OrderId,
    /// Short human-readable ticket reference printed on receipts
    pub folio: String,
    /// The authoritative total, taxes and promotions included. Payment
    /// sufficiency is checked against this and nothing else.
    pub total: Money,
}

/// REST operations of the store backend consumed by the terminal.
///
/// Implementations perform exactly one request per call and never retry on
/// their own; retry is always a cashier decision.
#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Fetch the sellable product records
    async fn list_products(&self) -> TerminalResult<Vec<Product>>;

    /// Fetch the customer records available for cart association
    async fn list_customers(&self) -> TerminalResult<Vec<Customer>>;

    /// Create a provisional order from a cart snapshot
    async fn create_order(&self, draft: &OrderDraft) -> TerminalResult<OrderAck>;

    /// Settle an existing order with the chosen payment method
    async fn pay_order(&self, order_id: OrderId, method: &PaymentMethod) -> TerminalResult<()>;
}

/// Shared gateway handle for dynamic dispatch
pub type SharedGateway = Arc<dyn BackendGateway>;
