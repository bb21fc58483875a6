//! # Cashier Terminal
//!
//! Line-oriented front end over the order session. The terminal owns one
//! catalog snapshot, one cart and one session; commands map one-to-one onto
//! the operations the core exposes, so every screen state the cashier can
//! see is a projection of `Stage`.

use std::io::{self, Write as _};
use till_core::{
    Cart, CatalogCache, CustomerId, Money, OrderSession, PaymentDispatcher, PaymentMethod,
    Product, ProductId, Receipt, SharedGateway, Stage, TerminalError,
};
use tokio::io::{AsyncBufReadExt, BufReader};

const SEARCH_LIMIT: usize = 25;

/// One parsed input line.
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Help,
    Search(String),
    Customers,
    Customer(Option<CustomerId>),
    Add(String),
    Remove(ProductId),
    Quantity(ProductId, i64),
    ShowCart,
    Checkout,
    Pay(PayArg),
    Cancel,
    Reload,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
enum PayArg {
    /// Raw amount as typed; parsed (and judged) when the payment runs
    Cash(String),
    Card,
    Credit,
}

impl Command {
    fn parse(line: &str) -> Result<Command, String> {
        let mut tokens = line.split_whitespace();
        let head = match tokens.next() {
            Some(head) => head.to_lowercase(),
            None => return Err("empty command".to_string()),
        };
        let rest: Vec<&str> = tokens.collect();

        match head.as_str() {
            "help" | "?" => Ok(Command::Help),
            "list" | "search" => Ok(Command::Search(rest.join(" "))),
            "customers" => Ok(Command::Customers),
            "customer" => match rest.first() {
                None => Err("usage: customer <id> | customer none".to_string()),
                Some(token) if token.eq_ignore_ascii_case("none") => Ok(Command::Customer(None)),
                Some(token) => token
                    .parse()
                    .map(|id| Command::Customer(Some(id)))
                    .map_err(|_| format!("not a customer id: {token}")),
            },
            "add" => rest
                .first()
                .map(|token| Command::Add(token.to_string()))
                .ok_or_else(|| "usage: add <product-id | sku>".to_string()),
            "rm" | "remove" => match rest.first() {
                Some(token) => token
                    .parse()
                    .map(Command::Remove)
                    .map_err(|_| format!("not a product id: {token}")),
                None => Err("usage: rm <product-id>".to_string()),
            },
            "qty" => match rest.as_slice() {
                [id, delta] => {
                    let id = id.parse().map_err(|_| format!("not a product id: {id}"))?;
                    let delta = delta
                        .parse()
                        .map_err(|_| format!("not a quantity delta: {delta}"))?;
                    Ok(Command::Quantity(id, delta))
                }
                _ => Err("usage: qty <product-id> <delta>".to_string()),
            },
            "cart" | "total" => Ok(Command::ShowCart),
            "checkout" => Ok(Command::Checkout),
            "pay" => {
                let sub = rest.first().map(|token| token.to_lowercase());
                match sub.as_deref() {
                    Some("cash") => rest
                        .get(1)
                        .map(|amount| Command::Pay(PayArg::Cash(amount.to_string())))
                        .ok_or_else(|| "usage: pay cash <amount>".to_string()),
                    Some("card") => Ok(Command::Pay(PayArg::Card)),
                    Some("credit") => Ok(Command::Pay(PayArg::Credit)),
                    Some(other) => {
                        Err(format!("unknown payment method: {other}; try cash, card or credit"))
                    }
                    None => Err("usage: pay cash <amount> | pay card | pay credit".to_string()),
                }
            }
            "cancel" => Ok(Command::Cancel),
            "reload" => Ok(Command::Reload),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command: {other}; type `help`")),
        }
    }
}

/// The interactive cashier terminal.
pub struct Terminal {
    catalog: CatalogCache,
    cart: Cart,
    session: OrderSession,
    gateway: SharedGateway,
    dispatcher: PaymentDispatcher,
}

impl Terminal {
    pub fn new(catalog: CatalogCache, gateway: SharedGateway) -> Self {
        let dispatcher = PaymentDispatcher::new(gateway.clone());
        Self {
            catalog,
            cart: Cart::new(),
            session: OrderSession::new(),
            gateway,
            dispatcher,
        }
    }

    /// Stage-aware prompt: while an order is open its folio and amount due
    /// stay in front of the cashier.
    pub fn prompt(&self) -> String {
        match self.session.stage() {
            Stage::AwaitingPayment { order } => {
                format!("till [{} due {}]> ", order.folio, order.total)
            }
            _ => "till> ".to_string(),
        }
    }

    /// Read commands from stdin until `quit` or end of input.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();

        loop {
            print!("{}", self.prompt());
            io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if !self.handle(&line).await {
                break;
            }
        }
        Ok(())
    }

    /// Process one input line. Returns `false` once the terminal should
    /// close.
    pub async fn handle(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }
        match Command::parse(line) {
            Err(message) => {
                println!("{message}");
                true
            }
            Ok(Command::Quit) => false,
            Ok(command) => {
                self.execute(command).await;
                true
            }
        }
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Help => print_help(),
            Command::Search(term) => self.search(&term),
            Command::Customers => self.list_customers(),
            Command::Customer(choice) => self.assign_customer(choice),
            Command::Add(token) => self.add_product(&token),
            Command::Remove(id) => self.remove_product(id),
            Command::Quantity(id, delta) => self.change_quantity(id, delta),
            Command::ShowCart => self.show_cart(),
            Command::Checkout => self.checkout().await,
            Command::Pay(arg) => self.pay(arg).await,
            Command::Cancel => self.cancel(),
            Command::Reload => self.reload().await,
            Command::Quit => {}
        }
    }

    fn search(&self, term: &str) {
        let mut shown = 0;
        for product in self.catalog.filter_products(term) {
            if shown == SEARCH_LIMIT {
                println!("  ... refine the search to see more");
                break;
            }
            println!(
                "  {:>5}  {:<12} {:<28} {:>10}  {:>4} left",
                product.id,
                product.sku,
                product.name,
                product.sell_price().to_string(),
                product.available_to_sell
            );
            shown += 1;
        }
        if shown == 0 {
            println!("no products match {term:?}");
        }
    }

    fn list_customers(&self) {
        if self.catalog.customers().is_empty() {
            println!("no customers available; sales are walk-in only");
            return;
        }
        for customer in self.catalog.customers() {
            println!(
                "  {:>5}  {:<30} {:>6} pts",
                customer.id,
                customer.display_name(),
                customer.current_points
            );
        }
    }

    fn assign_customer(&mut self, choice: Option<CustomerId>) {
        match choice {
            None => {
                self.cart.set_customer(None);
                println!("customer cleared; sale is walk-in");
            }
            Some(id) => match self.catalog.customer(id) {
                Some(customer) => {
                    println!(
                        "customer: {} ({} pts)",
                        customer.display_name(),
                        customer.current_points
                    );
                    self.cart.set_customer(Some(id));
                }
                None => println!("no customer with id {id}"),
            },
        }
    }

    fn add_product(&mut self, token: &str) {
        let Some(found) = self.resolve_product(token) else {
            println!("no product with id or SKU {token:?}; try `search {token}`");
            return;
        };
        let product = found.clone();
        self.cart.add(&product);
        println!("added {}; {}", product.name, self.cart_summary());
    }

    /// A numeric token is tried as an id first, otherwise the token is an
    /// exact (case-insensitive) SKU.
    fn resolve_product(&self, token: &str) -> Option<&Product> {
        if let Ok(id) = token.parse::<ProductId>() {
            if let Some(product) = self.catalog.product(id) {
                return Some(product);
            }
        }
        self.catalog
            .products()
            .iter()
            .find(|p| p.sku.eq_ignore_ascii_case(token))
    }

    fn remove_product(&mut self, id: ProductId) {
        if self.cart.lines().iter().all(|l| l.product_id != id) {
            println!("product {id} is not in the cart");
            return;
        }
        self.cart.remove(id);
        println!("removed product {id}; {}", self.cart_summary());
    }

    fn change_quantity(&mut self, id: ProductId, delta: i64) {
        self.cart.change_quantity(id, delta);
        match self.cart.lines().iter().find(|l| l.product_id == id) {
            Some(line) => {
                let quantity = line.quantity;
                println!("product {id} now at {quantity} units; {}", self.cart_summary());
            }
            None => println!("product {id} is not in the cart"),
        }
    }

    fn show_cart(&self) {
        if self.cart.is_empty() {
            println!("cart is empty");
        } else {
            for line in self.cart.lines() {
                match self.catalog.product(line.product_id) {
                    Some(product) => println!(
                        "  {:>5}  {:<28} x{:<4} {:>10}",
                        product.id,
                        product.name,
                        line.quantity,
                        product.sell_price().times(line.quantity).to_string()
                    ),
                    None => println!(
                        "  {:>5}  (no longer in catalog)        x{}",
                        line.product_id, line.quantity
                    ),
                }
            }
            println!(
                "estimated total: {}",
                self.cart.estimated_total(&self.catalog)
            );
        }

        match self.cart.customer().and_then(|id| self.catalog.customer(id)) {
            Some(customer) => println!("customer: {}", customer.display_name()),
            None => println!("customer: walk-in"),
        }

        if let Some(order) = self.session.open_order() {
            println!(
                "order {} open, due {}; pay cash <amount> | pay card | pay credit | cancel",
                order.folio, order.total
            );
        }
        if let Some(failure) = self.session.last_failure() {
            println!("last failure: {failure}");
        }
    }

    async fn checkout(&mut self) {
        let estimate = self.cart.estimated_total(&self.catalog);
        match self.session.submit(&self.cart, self.gateway.as_ref()).await {
            Ok(order) => {
                println!("order {} created, amount due {}", order.folio, order.total);
                if order.total != estimate {
                    println!("(estimated {estimate}; the due amount is the backend total)");
                }
                println!("next: pay cash <amount> | pay card | pay credit | cancel");
            }
            Err(err) => self.report(&err),
        }
    }

    async fn pay(&mut self, arg: PayArg) {
        let method = match arg {
            // anything unparseable counts as tendering nothing
            PayArg::Cash(raw) => PaymentMethod::Cash {
                tendered: Money::parse(&raw).unwrap_or(Money::ZERO),
            },
            PayArg::Card => PaymentMethod::Card,
            PayArg::Credit => PaymentMethod::StoreCredit,
        };

        match self
            .session
            .pay(&mut self.cart, method, &self.dispatcher)
            .await
        {
            Ok(receipt) => print_receipt(&receipt),
            Err(err) => self.report(&err),
        }
    }

    fn cancel(&mut self) {
        match self.session.cancel() {
            Ok(Some(order)) => println!(
                "checkout abandoned; order {} stays unpaid on the backend",
                order.folio
            ),
            Ok(None) => println!("nothing to cancel"),
            Err(err) => self.report(&err),
        }
    }

    async fn reload(&mut self) {
        match CatalogCache::load(self.gateway.as_ref()).await {
            Ok(catalog) => {
                println!(
                    "catalog reloaded: {} products, {} customers",
                    catalog.products().len(),
                    catalog.customers().len()
                );
                self.catalog = catalog;
            }
            Err(err) => {
                println!("reload failed, keeping the current catalog");
                self.report(&err);
            }
        }
    }

    fn report(&self, err: &TerminalError) {
        println!("cannot complete: {err}");
        if err.is_auth() {
            println!("restart the terminal with a fresh TILL_API_TOKEN");
        } else if err.is_retryable() {
            println!("the cart and any open order are intact; you can retry");
        }
    }

    fn cart_summary(&self) -> String {
        format!(
            "cart has {} units, estimated {}",
            self.cart.unit_count(),
            self.cart.estimated_total(&self.catalog)
        )
    }
}

fn print_receipt(receipt: &Receipt) {
    println!("=== SALE COMPLETE ===");
    println!("ticket   {}  (order {})", receipt.folio, receipt.order_id);
    println!("items    {}", receipt.units);
    println!("total    {}", receipt.total);
    println!("paid     {}", receipt.method.label());
    if let Some(tendered) = receipt.method.tendered() {
        println!("tendered {tendered}");
    }
    if let Some(change) = receipt.change_due {
        println!("change   {change}");
    }
    println!("time     {}", receipt.issued_at.format("%Y-%m-%d %H:%M:%S UTC"));
    println!("=====================");
}

fn print_help() {
    println!("commands:");
    println!("  search [term]        list products, filtered by name or SKU");
    println!("  customers            list registered customers");
    println!("  customer <id>|none   attach a customer to the sale");
    println!("  add <id|sku>         add one unit to the cart");
    println!("  rm <id>              drop a product from the cart");
    println!("  qty <id> <delta>     adjust a line's quantity (floor is 1)");
    println!("  cart                 show the cart and session status");
    println!("  checkout             create the order on the backend");
    println!("  pay cash <amount>    settle the open order with cash");
    println!("  pay card             settle the open order by card");
    println!("  pay credit           settle the open order with store credit");
    println!("  cancel               abandon the open order");
    println!("  reload               refresh the product and customer lists");
    println!("  quit                 close the terminal");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Arc;
    use till_core::{
        BackendGateway, Customer, OrderAck, OrderDraft, OrderId, TerminalResult,
    };

    #[test]
    fn test_parse_catalog_commands() {
        assert_eq!(
            Command::parse("search manzana roja"),
            Ok(Command::Search("manzana roja".to_string()))
        );
        assert_eq!(Command::parse("list"), Ok(Command::Search(String::new())));
        assert_eq!(Command::parse("customers"), Ok(Command::Customers));
        assert_eq!(Command::parse("customer 7"), Ok(Command::Customer(Some(7))));
        assert_eq!(Command::parse("customer none"), Ok(Command::Customer(None)));
        assert_eq!(Command::parse("reload"), Ok(Command::Reload));
    }

    #[test]
    fn test_parse_cart_commands() {
        assert_eq!(
            Command::parse("add FRU-001"),
            Ok(Command::Add("FRU-001".to_string()))
        );
        assert_eq!(Command::parse("rm 3"), Ok(Command::Remove(3)));
        assert_eq!(Command::parse("qty 3 -2"), Ok(Command::Quantity(3, -2)));
        assert_eq!(Command::parse("cart"), Ok(Command::ShowCart));
    }

    #[test]
    fn test_parse_payment_commands() {
        assert_eq!(
            Command::parse("pay cash 50.00"),
            Ok(Command::Pay(PayArg::Cash("50.00".to_string())))
        );
        assert_eq!(Command::parse("pay card"), Ok(Command::Pay(PayArg::Card)));
        assert_eq!(Command::parse("pay credit"), Ok(Command::Pay(PayArg::Credit)));
        assert_eq!(Command::parse("PAY Card"), Ok(Command::Pay(PayArg::Card)));
    }

    #[test]
    fn test_parse_rejects_malformed_input() {
        assert!(Command::parse("pay").is_err());
        assert!(Command::parse("pay cash").is_err());
        assert!(Command::parse("pay bitcoin").is_err());
        assert!(Command::parse("qty 1").is_err());
        assert!(Command::parse("qty one 2").is_err());
        assert!(Command::parse("add").is_err());
        assert!(Command::parse("customer x").is_err());
        assert!(Command::parse("frobnicate").is_err());
    }

    #[test]
    fn test_parse_quit_aliases() {
        assert_eq!(Command::parse("quit"), Ok(Command::Quit));
        assert_eq!(Command::parse("exit"), Ok(Command::Quit));
    }

    struct HappyGateway;

    #[async_trait]
    impl BackendGateway for HappyGateway {
        async fn list_products(&self) -> TerminalResult<Vec<Product>> {
            Ok(vec![sample_product()])
        }

        async fn list_customers(&self) -> TerminalResult<Vec<Customer>> {
            Ok(Vec::new())
        }

        async fn create_order(&self, _draft: &OrderDraft) -> TerminalResult<OrderAck> {
            Ok(OrderAck {
                order_id: 91,
                folio: "A1B2C3D4".to_string(),
                total: Money::from_cents(4250),
            })
        }

        async fn pay_order(
            &self,
            _order_id: OrderId,
            _method: &PaymentMethod,
        ) -> TerminalResult<()> {
            Ok(())
        }
    }

    fn sample_product() -> Product {
        Product {
            id: 1,
            name: "Manzana Roja".to_string(),
            sku: "FRU-001".to_string(),
            price: Money::from_cents(1500),
            final_price: None,
            available_to_sell: 12,
        }
    }

    fn terminal() -> Terminal {
        let catalog = CatalogCache::from_parts(vec![sample_product()], Vec::new());
        Terminal::new(catalog, Arc::new(HappyGateway))
    }

    #[tokio::test]
    async fn test_full_sale_flow() {
        let mut terminal = terminal();

        assert!(terminal.handle("add FRU-001").await);
        assert!(terminal.handle("qty 1 2").await);
        assert_eq!(terminal.cart.unit_count(), 3);
        assert_eq!(terminal.prompt(), "till> ");

        assert!(terminal.handle("checkout").await);
        assert_eq!(terminal.prompt(), "till [A1B2C3D4 due $42.50]> ");

        // short tender is refused locally; the order stays open
        assert!(terminal.handle("pay cash 40").await);
        assert_eq!(terminal.prompt(), "till [A1B2C3D4 due $42.50]> ");
        assert!(terminal.session.last_failure().is_some());

        assert!(terminal.handle("pay cash 50").await);
        assert_eq!(terminal.prompt(), "till> ");
        assert!(terminal.cart.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_tender_is_treated_as_insufficient() {
        let mut terminal = terminal();
        terminal.handle("add 1").await;
        terminal.handle("checkout").await;

        terminal.handle("pay cash lots").await;
        assert!(matches!(
            terminal.session.last_failure(),
            Some(TerminalError::InsufficientTendered { .. })
        ));
    }

    #[tokio::test]
    async fn test_quit_and_blank_lines() {
        let mut terminal = terminal();
        assert!(terminal.handle("   ").await);
        assert!(terminal.handle("nonsense input").await);
        assert!(!terminal.handle("quit").await);
    }

    #[tokio::test]
    async fn test_cancel_frees_the_terminal_for_a_new_checkout() {
        let mut terminal = terminal();
        terminal.handle("add FRU-001").await;
        terminal.handle("checkout").await;
        assert!(terminal.session.open_order().is_some());

        terminal.handle("cancel").await;
        assert!(terminal.session.open_order().is_none());
        assert!(!terminal.cart.is_empty());
    }
}
