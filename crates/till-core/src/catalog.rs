//! # Catalog Cache
//!
//! Sellable products and registered customers, fetched once when the
//! terminal opens. Read-only: the terminal never mutates stock or loyalty
//! points locally, it only displays what the backend last reported.

use crate::error::TerminalResult;
use crate::gateway::BackendGateway;
use crate::money::Money;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Product identifier assigned by the backend
pub type ProductId = i64;

/// Customer identifier assigned by the backend
pub type CustomerId = i64;

/// A sellable product as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub sku: String,
    /// Base unit price
    pub price: Money,
    /// Tax-inclusive unit price, when the backend precomputes one
    #[serde(default)]
    pub final_price: Option<Money>,
    /// Units sellable right now (stock minus reservations). Advisory display
    /// data; the backend re-checks at order creation.
    #[serde(default)]
    pub available_to_sell: i64,
}

impl Product {
    /// The price a cart line is valued at: tax-inclusive when known,
    /// base price otherwise.
    pub fn sell_price(&self) -> Money {
        self.final_price.unwrap_or(self.price)
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle) || self.sku.to_lowercase().contains(needle)
    }
}

/// A registered customer. Walk-in sales carry no customer at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    /// Loyalty balance shown at the terminal; accrual happens server-side
    #[serde(default)]
    pub current_points: i64,
}

impl Customer {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Catalog snapshot backing one terminal session.
#[derive(Debug, Clone, Default)]
pub struct CatalogCache {
    products: Vec<Product>,
    customers: Vec<Customer>,
}

impl CatalogCache {
    /// Build from records already in hand (tests, offline tooling).
    pub fn from_parts(products: Vec<Product>, customers: Vec<Customer>) -> Self {
        Self {
            products,
            customers,
        }
    }

    /// Fetch products and customers through the gateway.
    ///
    /// Products are what the terminal sells from, so a failed product fetch
    /// is fatal and propagates. A failed customer fetch only disables
    /// customer association; the session continues walk-in only.
    pub async fn load(gateway: &dyn BackendGateway) -> TerminalResult<Self> {
        let products = gateway.list_products().await?;
        let customers = match gateway.list_customers().await {
            Ok(customers) => customers,
            Err(err) => {
                warn!("customer list unavailable, continuing walk-in only: {err}");
                Vec::new()
            }
        };
        info!(
            products = products.len(),
            customers = customers.len(),
            "catalog loaded"
        );
        Ok(Self {
            products,
            customers,
        })
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == id)
    }

    pub fn customer(&self, id: CustomerId) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == id)
    }

    /// Case-insensitive substring filter over product name and SKU.
    ///
    /// A lazily evaluated view over the cache; a blank term yields every
    /// product. The cache itself is never modified by filtering.
    pub fn filter_products<'a>(&'a self, term: &str) -> impl Iterator<Item = &'a Product> {
        let needle = term.trim().to_lowercase();
        self.products
            .iter()
            .filter(move |p| needle.is_empty() || p.matches(&needle))
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }
}
