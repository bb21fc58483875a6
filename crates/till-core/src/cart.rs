//! # Cart
//!
//! The cashier's working selection for the current sale. Purely local state;
//! nothing in this module touches the network, and cart edits never fail.

use crate::catalog::{CatalogCache, CustomerId, Product, ProductId};
use crate::gateway::{DraftLine, OrderDraft};
use crate::money::Money;

/// One product selection in the cart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// The current sale's selection: at most one line per product, lines kept in
/// insertion order for display.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    customer: Option<CustomerId>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `product`, creating the line when the product is not
    /// in the cart yet.
    pub fn add(&mut self, product: &Product) {
        match self.line_mut(product.id) {
            Some(line) => line.quantity = line.quantity.saturating_add(1),
            None => self.lines.push(CartLine {
                product_id: product.id,
                quantity: 1,
            }),
        }
    }

    /// Drop the whole line, whatever its quantity. Absent ids are ignored.
    pub fn remove(&mut self, product_id: ProductId) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Adjust a line's quantity by `delta`, clamping between one unit and
    /// `u32::MAX`. Emptying a line is `remove`'s job; a decrement can never
    /// do it. Absent ids are ignored.
    pub fn change_quantity(&mut self, product_id: ProductId, delta: i64) {
        if let Some(line) = self.line_mut(product_id) {
            let next = i64::from(line.quantity).saturating_add(delta);
            line.quantity = next.clamp(1, i64::from(u32::MAX)) as u32;
        }
    }

    /// Advisory display total: unit sell price times quantity, recomputed
    /// from the catalog on every call.
    ///
    /// Never used for payment sufficiency (the backend total is). Lines
    /// whose product has vanished from the catalog contribute nothing.
    pub fn estimated_total(&self, catalog: &CatalogCache) -> Money {
        self.lines
            .iter()
            .filter_map(|line| {
                catalog
                    .product(line.product_id)
                    .map(|p| p.sell_price().times(line.quantity))
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total number of units across all lines
    pub fn unit_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn set_customer(&mut self, customer: Option<CustomerId>) {
        self.customer = customer;
    }

    pub fn customer(&self) -> Option<CustomerId> {
        self.customer
    }

    /// Snapshot submitted at checkout. Carries a fresh idempotency key.
    pub fn snapshot(&self) -> OrderDraft {
        OrderDraft::new(
            self.customer,
            self.lines
                .iter()
                .map(|l| DraftLine {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect(),
        )
    }

    /// Empty the cart and drop the customer association.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer = None;
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|l| l.product_id == product_id)
    }
}
