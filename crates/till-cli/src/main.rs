//! # till
//!
//! Interactive sales terminal against the store backend.
//!
//! Configuration comes from the environment (or a `.env` file):
//! - `TILL_BACKEND_URL`: base URL of the store backend
//! - `TILL_API_TOKEN`: bearer token for the signed-in cashier
//! - `TILL_HTTP_TIMEOUT_SECS`: optional request timeout (default 30)

use anyhow::Context;
use std::sync::Arc;
use till_cli::Terminal;
use till_core::{CatalogCache, SharedGateway};
use till_http::HttpGateway;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // log output stays on stderr; stdout belongs to the prompt
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(Level::WARN.into())
                .from_env_lossy(),
        )
        .init();

    println!("till {} (sales terminal)", env!("CARGO_PKG_VERSION"));

    let gateway: SharedGateway =
        Arc::new(HttpGateway::from_env().context("backend configuration")?);

    let catalog = CatalogCache::load(gateway.as_ref())
        .await
        .context("catalog load failed; the terminal cannot open without products")?;
    println!(
        "{} products, {} customers loaded. Type `help` for commands.",
        catalog.products().len(),
        catalog.customers().len()
    );

    let mut terminal = Terminal::new(catalog, gateway);
    terminal.run().await
}
