//! # Payment Methods and Dispatch
//!
//! The payment methods the terminal can settle with, and the dispatcher
//! that turns a cashier's choice into exactly one backend request.

use crate::error::TerminalResult;
use crate::gateway::SharedGateway;
use crate::money::Money;
use crate::session::OpenOrder;
use tracing::{info, instrument};

/// How the cashier settles an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentMethod {
    /// Physical cash. `tendered` stays on the terminal for the change
    /// computation; the backend only ever sees the method tag.
    Cash { tendered: Money },
    Card,
    StoreCredit,
}

impl PaymentMethod {
    /// Wire tag understood by the backend.
    pub fn tag(&self) -> &'static str {
        match self {
            PaymentMethod::Cash { .. } => "CASH",
            PaymentMethod::Card => "CARD",
            PaymentMethod::StoreCredit => "STORE_CREDIT",
        }
    }

    /// Cashier-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::Cash { .. } => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::StoreCredit => "store credit",
        }
    }

    /// Tendered amount for cash, `None` for everything else.
    pub fn tendered(&self) -> Option<Money> {
        match self {
            PaymentMethod::Cash { tendered } => Some(*tendered),
            _ => None,
        }
    }
}

/// Issues payment requests on behalf of the order session.
///
/// One `dispatch` call performs exactly one backend request. Outcomes are
/// reported to the caller as-is; a failed payment is never retried here.
pub struct PaymentDispatcher {
    gateway: SharedGateway,
}

impl PaymentDispatcher {
    pub fn new(gateway: SharedGateway) -> Self {
        Self { gateway }
    }

    #[instrument(skip(self, order, method), fields(order_id = order.id, method = method.label()))]
    pub async fn dispatch(&self, order: &OpenOrder, method: &PaymentMethod) -> TerminalResult<()> {
        info!(folio = %order.folio, total = %order.total, "submitting payment");
        self.gateway.pay_order(order.id, method).await
    }
}
