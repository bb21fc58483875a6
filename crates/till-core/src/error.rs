//! # Terminal Error Types
//!
//! Typed error handling for the sales terminal.
//! All fallible terminal operations return `Result<T, TerminalError>`.

use crate::money::Money;
use thiserror::Error;

/// Core error type for all terminal operations.
///
/// `Clone` so the session can keep the most recent failure around for the
/// screen while still returning it to the caller.
#[derive(Debug, Clone, Error)]
pub enum TerminalError {
    /// Missing or invalid environment configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Checkout attempted with nothing in the cart
    #[error("Cart is empty")]
    EmptyCart,

    /// Cash guard: the tendered amount does not cover the backend total
    #[error("Insufficient amount tendered: {tendered} against a total of {total}")]
    InsufficientTendered { tendered: Money, total: Money },

    /// A checkout attempt is already under way; only one may exist at a time
    #[error("Checkout already in progress ({stage})")]
    CheckoutInProgress { stage: &'static str },

    /// Payment requested while no order is awaiting one
    #[error("No order is awaiting payment")]
    NoOrderToPay,

    /// Transport-level failure reaching the backend (DNS, refused, timeout)
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a body the terminal cannot decode
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    /// The backend understood the request and declined it
    #[error("Rejected by backend: {reason}")]
    Rejected { reason: String },

    /// The credential was rejected (HTTP 401/403)
    #[error("Authentication failed: {0}")]
    Auth(String),
}

impl TerminalError {
    /// True for failures caught locally, before any network traffic.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TerminalError::EmptyCart
                | TerminalError::InsufficientTendered { .. }
                | TerminalError::CheckoutInProgress { .. }
                | TerminalError::NoOrderToPay
        )
    }

    /// True if repeating the same request could plausibly succeed.
    ///
    /// Nothing in the terminal retries automatically; this only drives the
    /// hint shown to the cashier.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TerminalError::Network(_) | TerminalError::Rejected { .. }
        )
    }

    /// True if the session credential was refused and the terminal needs to
    /// be restarted with a fresh token.
    pub fn is_auth(&self) -> bool {
        matches!(self, TerminalError::Auth(_))
    }
}

/// Convenience alias used throughout the terminal crates
pub type TerminalResult<T> = Result<T, TerminalError>;
