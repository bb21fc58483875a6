//! # Order Session
//!
//! The state machine for one checkout attempt: cart snapshot in, provisional
//! order out, payment settled against the backend's authoritative total.
//!
//! A terminal owns exactly one session. Every transition is guarded, so a
//! second checkout cannot start while one is under way, an already-created
//! order cannot be created twice, and payment is unreachable without an
//! order id in hand. The only suspension points are the two backend calls;
//! between them the session is plain synchronous state.

use crate::cart::Cart;
use crate::error::{TerminalError, TerminalResult};
use crate::gateway::{BackendGateway, OrderDraft, OrderId};
use crate::money::Money;
use crate::payment::{PaymentDispatcher, PaymentMethod};
use chrono::{DateTime, Utc};
use tracing::{info, warn};

/// A provisional order created on the backend, awaiting payment.
#[derive(Debug, Clone)]
pub struct OpenOrder {
    pub id: OrderId,
    /// Ticket reference shown to the cashier and printed on the receipt
    pub folio: String,
    /// The backend-computed total. Sufficiency checks use this and only
    /// this; the cart estimate is display data.
    pub total: Money,
    /// The snapshot the order was created from
    pub draft: OrderDraft,
}

/// Proof of a settled sale, handed to the cashier once payment clears.
#[derive(Debug, Clone)]
pub struct Receipt {
    pub order_id: OrderId,
    pub folio: String,
    pub total: Money,
    pub method: PaymentMethod,
    /// Cash only: tendered minus the backend total. Terminal-side arithmetic
    /// that is never sent anywhere.
    pub change_due: Option<Money>,
    pub units: u32,
    pub issued_at: DateTime<Utc>,
}

/// Where the session stands in the checkout lifecycle.
#[derive(Debug, Clone)]
pub enum Stage {
    /// No checkout active; the cashier is still building the cart
    Idle,
    /// Order creation request in flight
    Submitting { draft: OrderDraft },
    /// The order exists server-side; a payment method must be chosen
    AwaitingPayment { order: OpenOrder },
    /// Payment request in flight
    ProcessingPayment {
        order: OpenOrder,
        method: PaymentMethod,
    },
}

impl Stage {
    /// Short name used in guard errors and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::Submitting { .. } => "submitting",
            Stage::AwaitingPayment { .. } => "awaiting-payment",
            Stage::ProcessingPayment { .. } => "processing-payment",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, Stage::Idle)
    }

    /// True while a backend call for this checkout is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(self, Stage::Submitting { .. } | Stage::ProcessingPayment { .. })
    }
}

/// The single in-flight checkout attempt of a terminal.
pub struct OrderSession {
    stage: Stage,
    last_failure: Option<TerminalError>,
}

impl OrderSession {
    pub fn new() -> Self {
        Self {
            stage: Stage::Idle,
            last_failure: None,
        }
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// The most recent failure, kept for the screen until the next
    /// transition attempt.
    pub fn last_failure(&self) -> Option<&TerminalError> {
        self.last_failure.as_ref()
    }

    /// The order currently awaiting or processing payment, if any.
    pub fn open_order(&self) -> Option<&OpenOrder> {
        match &self.stage {
            Stage::AwaitingPayment { order } | Stage::ProcessingPayment { order, .. } => {
                Some(order)
            }
            _ => None,
        }
    }

    /// Submit the cart as a provisional order.
    ///
    /// Guards: the session must be idle (an order awaiting payment counts as
    /// in progress) and the cart must have lines. On success the session
    /// holds the created order awaiting payment. On failure it returns to
    /// idle with the cart untouched, so the cashier can correct and retry;
    /// the retry submits a fresh draft with a fresh idempotency key.
    pub async fn submit(
        &mut self,
        cart: &Cart,
        gateway: &dyn BackendGateway,
    ) -> TerminalResult<OpenOrder> {
        self.last_failure = None;
        if !self.stage.is_idle() {
            return Err(TerminalError::CheckoutInProgress {
                stage: self.stage.name(),
            });
        }
        if cart.is_empty() {
            return Err(TerminalError::EmptyCart);
        }

        let draft = cart.snapshot();
        info!(
            units = draft.unit_count(),
            customer = ?draft.customer,
            "submitting order"
        );
        self.stage = Stage::Submitting {
            draft: draft.clone(),
        };

        match gateway.create_order(&draft).await {
            Ok(ack) => {
                let order = OpenOrder {
                    id: ack.order_id,
                    folio: ack.folio,
                    total: ack.total,
                    draft,
                };
                info!(order_id = order.id, folio = %order.folio, total = %order.total, "order created");
                self.stage = Stage::AwaitingPayment {
                    order: order.clone(),
                };
                Ok(order)
            }
            Err(err) => {
                warn!("order creation failed: {err}");
                self.stage = Stage::Idle;
                self.last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Settle the open order with `method`.
    ///
    /// Cash is guarded here: the tendered amount must be positive and cover
    /// the backend total, or the attempt is refused before any request goes
    /// out. On success the cart is cleared (customer association included)
    /// and the session returns to idle. On failure the order is kept
    /// awaiting payment, so the cashier retries a method against the same
    /// order instead of creating a duplicate.
    pub async fn pay(
        &mut self,
        cart: &mut Cart,
        method: PaymentMethod,
        dispatcher: &PaymentDispatcher,
    ) -> TerminalResult<Receipt> {
        self.last_failure = None;
        let order = match &self.stage {
            Stage::AwaitingPayment { order } => order.clone(),
            Stage::Idle => return Err(TerminalError::NoOrderToPay),
            other => {
                return Err(TerminalError::CheckoutInProgress {
                    stage: other.name(),
                })
            }
        };

        let change_due = match &method {
            PaymentMethod::Cash { tendered } => {
                if !tendered.is_positive() || *tendered < order.total {
                    let err = TerminalError::InsufficientTendered {
                        tendered: *tendered,
                        total: order.total,
                    };
                    self.last_failure = Some(err.clone());
                    return Err(err);
                }
                Some(tendered.saturating_sub(order.total))
            }
            _ => None,
        };

        self.stage = Stage::ProcessingPayment {
            order: order.clone(),
            method: method.clone(),
        };

        match dispatcher.dispatch(&order, &method).await {
            Ok(()) => {
                let receipt = Receipt {
                    order_id: order.id,
                    folio: order.folio.clone(),
                    total: order.total,
                    units: order.draft.unit_count(),
                    method,
                    change_due,
                    issued_at: Utc::now(),
                };
                cart.clear();
                self.stage = Stage::Idle;
                info!(folio = %receipt.folio, total = %receipt.total, "sale completed");
                Ok(receipt)
            }
            Err(err) => {
                warn!(order_id = order.id, "payment failed: {err}");
                self.stage = Stage::AwaitingPayment { order };
                self.last_failure = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Abandon the current checkout.
    ///
    /// From `AwaitingPayment` this returns to idle and hands back the
    /// abandoned order; it stays unpaid server-side for backend-side
    /// reconciliation. While a request is in flight there is nothing safe to
    /// abandon, so cancelling is refused. Cancelling an idle session is a
    /// no-op.
    pub fn cancel(&mut self) -> TerminalResult<Option<OpenOrder>> {
        self.last_failure = None;
        match std::mem::replace(&mut self.stage, Stage::Idle) {
            Stage::Idle => Ok(None),
            Stage::AwaitingPayment { order } => {
                warn!(order_id = order.id, folio = %order.folio, "checkout abandoned; order left unpaid");
                Ok(Some(order))
            }
            other => {
                let stage = other.name();
                self.stage = other;
                Err(TerminalError::CheckoutInProgress { stage })
            }
        }
    }
}

impl Default for OrderSession {
    fn default() -> Self {
        Self::new()
    }
}
