//! # HTTP Backend Gateway
//!
//! `reqwest` implementation of `BackendGateway` against the store backend's
//! REST API. Every call performs exactly one request and reports the outcome
//! as-is; whether to retry is always the cashier's decision.

use crate::config::{AuthContext, BackendConfig};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use till_core::{
    BackendGateway, Customer, CustomerId, Money, OrderAck, OrderDraft, OrderId, PaymentMethod,
    Product, ProductId, TerminalError, TerminalResult,
};
use tracing::{debug, error, info, instrument};

/// Gateway to the store backend over HTTP.
///
/// One instance serves a whole terminal session; it holds the bearer
/// credential and the request timeout.
pub struct HttpGateway {
    config: BackendConfig,
    auth: AuthContext,
    client: Client,
}

impl HttpGateway {
    pub fn new(config: BackendConfig, auth: AuthContext) -> TerminalResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                TerminalError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            auth,
            client,
        })
    }

    /// Construct entirely from environment variables.
    pub fn from_env() -> TerminalResult<Self> {
        Self::new(BackendConfig::from_env()?, AuthContext::from_env()?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url, path)
    }

    async fn get_json<T>(&self, path: &str) -> TerminalResult<T>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(self.url(path))
            .header("Authorization", self.auth.authorization_header())
            .send()
            .await
            .map_err(|e| TerminalError::Network(e.to_string()))?;

        decode(response).await
    }
}

/// Check the status, then parse the success body.
async fn decode<T>(response: Response) -> TerminalResult<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| TerminalError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(error_from_status(status, &body));
    }

    serde_json::from_str(&body)
        .map_err(|e| TerminalError::MalformedResponse(format!("failed to parse backend response: {e}")))
}

/// Map a non-success status onto the terminal error taxonomy.
fn error_from_status(status: StatusCode, body: &str) -> TerminalError {
    let reason = extract_reason(body).unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => TerminalError::Auth(reason),
        _ => TerminalError::Rejected { reason },
    }
}

/// Pull a human-readable reason out of an error body.
///
/// The backend answers either `{"detail": "..."}` or a per-field error map
/// such as `{"items": ["Stock insuficiente para Manzana"]}`.
fn extract_reason(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;

    if let Some(detail) = value.get("detail").and_then(|d| d.as_str()) {
        return Some(detail.to_string());
    }

    let map = value.as_object()?;
    let mut parts = Vec::new();
    for (field, errors) in map {
        match errors {
            serde_json::Value::String(message) => parts.push(format!("{field}: {message}")),
            serde_json::Value::Array(messages) => {
                for message in messages.iter().filter_map(|m| m.as_str()) {
                    parts.push(format!("{field}: {message}"));
                }
            }
            _ => {}
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("; "))
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderRequest {
    customer: Option<CustomerId>,
    items: Vec<OrderItemPayload>,
}

#[derive(Debug, Serialize)]
struct OrderItemPayload {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug, Deserialize)]
struct OrderCreatedResponse {
    id: OrderId,
    ticket_folio: String,
    final_amount: Money,
}

#[derive(Debug, Serialize)]
struct PayOrderRequest<'a> {
    payment_method: &'a str,
}

#[async_trait]
impl BackendGateway for HttpGateway {
    #[instrument(skip(self))]
    async fn list_products(&self) -> TerminalResult<Vec<Product>> {
        let products: Vec<Product> = self.get_json("/api/products/").await?;
        debug!(count = products.len(), "fetched products");
        Ok(products)
    }

    #[instrument(skip(self))]
    async fn list_customers(&self) -> TerminalResult<Vec<Customer>> {
        let customers: Vec<Customer> = self.get_json("/api/customers/").await?;
        debug!(count = customers.len(), "fetched customers");
        Ok(customers)
    }

    #[instrument(skip(self, draft), fields(units = draft.unit_count()))]
    async fn create_order(&self, draft: &OrderDraft) -> TerminalResult<OrderAck> {
        let request = CreateOrderRequest {
            customer: draft.customer,
            items: draft
                .lines
                .iter()
                .map(|l| OrderItemPayload {
                    product_id: l.product_id,
                    quantity: l.quantity,
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.url("/api/orders/"))
            .header("Authorization", self.auth.authorization_header())
            .header("Idempotency-Key", &draft.idempotency_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| TerminalError::Network(e.to_string()))?;

        let created: OrderCreatedResponse = decode(response).await?;
        info!(order_id = created.id, folio = %created.ticket_folio, "order created");

        Ok(OrderAck {
            order_id: created.id,
            folio: created.ticket_folio,
            total: created.final_amount,
        })
    }

    #[instrument(skip(self, method), fields(method = method.tag()))]
    async fn pay_order(&self, order_id: OrderId, method: &PaymentMethod) -> TerminalResult<()> {
        let response = self
            .client
            .post(self.url(&format!("/api/orders/{order_id}/pay/")))
            .header("Authorization", self.auth.authorization_header())
            .json(&PayOrderRequest {
                payment_method: method.tag(),
            })
            .send()
            .await
            .map_err(|e| TerminalError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .map_err(|e| TerminalError::Network(e.to_string()))?;
            error!(order_id, status = status.as_u16(), "payment rejected");
            return Err(error_from_status(status, &body));
        }

        info!(order_id, "payment accepted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use till_core::DraftLine;
    use wiremock::matchers::{body_json, header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway(server: &MockServer) -> HttpGateway {
        HttpGateway::new(
            BackendConfig::new(server.uri()).with_timeout_secs(5),
            AuthContext::new("test-token"),
        )
        .unwrap()
    }

    fn draft() -> OrderDraft {
        OrderDraft::new(
            Some(7),
            vec![DraftLine {
                product_id: 1,
                quantity: 2,
            }],
        )
    }

    #[tokio::test]
    async fn test_list_products_parses_decimal_prices() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 1,
                    "name": "Manzana Roja",
                    "sku": "FRU-001",
                    "price": "15.00",
                    "final_price": "17.40",
                    "available_to_sell": 12
                },
                {
                    "id": 2,
                    "name": "Pera",
                    "sku": "FRU-002",
                    "price": "12.50"
                }
            ])))
            .mount(&server)
            .await;

        let products = gateway(&server).list_products().await.unwrap();

        assert_eq!(products.len(), 2);
        assert_eq!(products[0].price, Money::from_cents(1500));
        assert_eq!(products[0].final_price, Some(Money::from_cents(1740)));
        assert_eq!(products[0].available_to_sell, 12);
        assert_eq!(products[1].final_price, None);
        assert_eq!(products[1].available_to_sell, 0);
    }

    #[tokio::test]
    async fn test_list_customers_parses_points() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/customers/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "id": 7,
                    "first_name": "Ana",
                    "last_name": "Lopez",
                    "current_points": 120
                }
            ])))
            .mount(&server)
            .await;

        let customers = gateway(&server).list_customers().await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].display_name(), "Ana Lopez");
        assert_eq!(customers[0].current_points, 120);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"detail": "Invalid token."})),
            )
            .mount(&server)
            .await;

        let result = gateway(&server).list_products().await;
        match result {
            Err(TerminalError::Auth(reason)) => assert_eq!(reason, "Invalid token."),
            other => panic!("expected auth error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_malformed_body_maps_to_malformed_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/products/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
            .mount(&server)
            .await;

        let result = gateway(&server).list_products().await;
        assert!(matches!(result, Err(TerminalError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_create_order_sends_snapshot_and_parses_ack() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders/"))
            .and(header("Authorization", "Bearer test-token"))
            .and(header_exists("Idempotency-Key"))
            .and(body_json(json!({
                "customer": 7,
                "items": [{"product_id": 1, "quantity": 2}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 91,
                "ticket_folio": "A1B2C3D4",
                "final_amount": "42.50"
            })))
            .mount(&server)
            .await;

        let ack = gateway(&server).create_order(&draft()).await.unwrap();
        assert_eq!(ack.order_id, 91);
        assert_eq!(ack.folio, "A1B2C3D4");
        assert_eq!(ack.total, Money::from_cents(4250));
    }

    #[tokio::test]
    async fn test_create_order_rejection_surfaces_reason() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "items": ["Stock insuficiente para Manzana Roja. Disponible: 1"]
            })))
            .mount(&server)
            .await;

        let result = gateway(&server).create_order(&draft()).await;
        match result {
            Err(TerminalError::Rejected { reason }) => {
                assert!(reason.contains("Stock insuficiente"));
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pay_order_sends_only_the_method_tag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders/91/pay/"))
            .and(body_json(json!({"payment_method": "CASH"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "PAID"})))
            .mount(&server)
            .await;

        // the tendered amount stays on the terminal
        let method = PaymentMethod::Cash {
            tendered: Money::from_cents(5000),
        };
        gateway(&server).pay_order(91, &method).await.unwrap();
    }

    #[tokio::test]
    async fn test_pay_order_decline_maps_to_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/orders/91/pay/"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "detail": "La orden ya fue pagada."
            })))
            .mount(&server)
            .await;

        let result = gateway(&server).pay_order(91, &PaymentMethod::Card).await;
        match result {
            Err(TerminalError::Rejected { reason }) => {
                assert_eq!(reason, "La orden ya fue pagada.");
            }
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_a_network_error() {
        let gateway = HttpGateway::new(
            BackendConfig::new("http://127.0.0.1:9").with_timeout_secs(1),
            AuthContext::new("test-token"),
        )
        .unwrap();

        let result = gateway.list_products().await;
        assert!(matches!(result, Err(TerminalError::Network(_))));
    }

    #[test]
    fn test_extract_reason_prefers_detail() {
        assert_eq!(
            extract_reason(r#"{"detail": "Invalid token."}"#),
            Some("Invalid token.".to_string())
        );
    }

    #[test]
    fn test_extract_reason_flattens_field_errors() {
        let reason = extract_reason(r#"{"items": ["one", "two"], "customer": "bad"}"#).unwrap();
        assert!(reason.contains("items: one"));
        assert!(reason.contains("items: two"));
        assert!(reason.contains("customer: bad"));
    }

    #[test]
    fn test_extract_reason_gives_up_on_non_json() {
        assert_eq!(extract_reason("<html>error</html>"), None);
        let err = error_from_status(StatusCode::BAD_GATEWAY, "<html>error</html>");
        assert!(matches!(
            err,
            TerminalError::Rejected { reason } if reason == "HTTP 502"
        ));
    }
}
