//! # Sales API Client
//!
//! The register's only view of the server.
//!
//! ## Endpoints
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  GET  /api/search_products?q=<query>                                   │
//! │       200 → [Product, ...]  (server caps the list at 20)               │
//! │                                                                         │
//! │  GET  /api/get_product_by_barcode/<barcode>                            │
//! │       200 → Product                                                    │
//! │       200 → {"error": "..."}        ──► Ok(None)                       │
//! │       404 → {"error": "..."}        ──► Ok(None)                       │
//! │                                                                         │
//! │  POST /api/process_sale             body: SaleRequest                  │
//! │       200 → {"success": true, "sale_id", "invoice_number",             │
//! │              "total_amount"}                                           │
//! │       400/403/500 → {"error": "..."} ──► ServerRejected                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No request carries a timeout and none is retried. A sale that fails in
//! transit is surfaced to the cashier as is.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Instant;
use tracing::{debug, info, warn};
use url::Url;

use dukan_core::{Money, Product, SaleConfirmation, SaleRequest};

use crate::config::ApiSettings;
use crate::error::{ClientError, ClientResult};

// =============================================================================
// API Trait
// =============================================================================

/// The three calls a register makes.
#[async_trait]
pub trait PosApi: Send + Sync {
    /// Free-text product search.
    async fn search_products(&self, query: &str) -> ClientResult<Vec<Product>>;

    /// Exact barcode lookup. `Ok(None)` when no product has this barcode.
    async fn product_by_barcode(&self, barcode: &str) -> ClientResult<Option<Product>>;

    /// Submits a sale. Never retried.
    async fn process_sale(&self, request: &SaleRequest) -> ClientResult<SaleConfirmation>;
}

// =============================================================================
// Wire Shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
}

/// `process_sale` answers with one object for both outcomes.
#[derive(Debug, Deserialize)]
struct SaleResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    sale_id: Option<i64>,
    #[serde(default)]
    invoice_number: Option<String>,
    #[serde(default)]
    total_amount: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

impl SaleResponse {
    fn into_confirmation(self, status: StatusCode) -> ClientResult<SaleConfirmation> {
        if !self.success {
            return Err(ClientError::ServerRejected {
                status: status.as_u16(),
                message: self
                    .error
                    .unwrap_or_else(|| "Sale was not accepted".to_string()),
            });
        }

        match (self.sale_id, self.invoice_number, self.total_amount) {
            (Some(sale_id), Some(invoice_number), Some(total)) => {
                let total_amount = Money::from_major_f64(total).ok_or_else(|| {
                    ClientError::InvalidResponse(format!("total_amount is not a number: {}", total))
                })?;
                Ok(SaleConfirmation {
                    sale_id,
                    invoice_number,
                    total_amount,
                })
            }
            _ => Err(ClientError::InvalidResponse(
                "successful sale response is missing sale_id, invoice_number or total_amount"
                    .to_string(),
            )),
        }
    }
}

/// Builds a rejection from an error status and whatever body came with it.
fn rejection(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });

    ClientError::ServerRejected {
        status: status.as_u16(),
        message,
    }
}

/// The `{error}` message of a 2xx body, if the body is one.
fn not_found_message(body: &[u8]) -> Option<String> {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(body).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

// =============================================================================
// HTTP Implementation
// =============================================================================

/// [`PosApi`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpPosApi {
    client: Client,
    base_url: Url,
}

impl HttpPosApi {
    /// Creates a client for the configured API.
    pub fn new(settings: &ApiSettings) -> ClientResult<Self> {
        Ok(Self::with_client(Client::new(), settings.url()?))
    }

    /// Creates a client around an existing reqwest client.
    pub fn with_client(client: Client, base_url: Url) -> Self {
        HttpPosApi { client, base_url }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends path segments to the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> ClientResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                ClientError::InvalidUrl(format!("{} cannot be a base URL", self.base_url))
            })?;
            path.pop_if_empty().extend(segments);
        }
        Ok(url)
    }
}

#[async_trait]
impl PosApi for HttpPosApi {
    async fn search_products(&self, query: &str) -> ClientResult<Vec<Product>> {
        let start = Instant::now();
        let mut url = self.endpoint(&["api", "search_products"])?;
        url.query_pairs_mut().append_pair("q", query);

        debug!(query = %query, "search_products request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "Product search rejected");
            return Err(rejection(status, &body));
        }

        let products: Vec<Product> = decode(&body)?;

        info!(
            query = %query,
            results = products.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Product search complete"
        );

        Ok(products)
    }

    async fn product_by_barcode(&self, barcode: &str) -> ClientResult<Option<Product>> {
        let url = self.endpoint(&["api", "get_product_by_barcode", barcode])?;

        debug!(barcode = %barcode, "get_product_by_barcode request");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if status == StatusCode::NOT_FOUND {
            debug!(barcode = %barcode, "Barcode not found");
            return Ok(None);
        }

        if !status.is_success() {
            warn!(barcode = %barcode, status = status.as_u16(), "Barcode lookup rejected");
            return Err(rejection(status, &body));
        }

        if let Some(message) = not_found_message(&body) {
            debug!(barcode = %barcode, message = %message, "Barcode not found");
            return Ok(None);
        }

        let product: Product = decode(&body)?;
        debug!(barcode = %barcode, product_id = product.id, "Barcode resolved");
        Ok(Some(product))
    }

    async fn process_sale(&self, request: &SaleRequest) -> ClientResult<SaleConfirmation> {
        let start = Instant::now();
        let url = self.endpoint(&["api", "process_sale"])?;

        info!(
            items = request.items.len(),
            discount = %request.discount_amount,
            payment_method = %request.payment_method,
            "Submitting sale"
        );

        let response = self.client.post(url).json(request).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let err = rejection(status, &body);
            warn!(status = status.as_u16(), error = %err, "Sale rejected");
            return Err(err);
        }

        let parsed: SaleResponse = decode(&body)?;
        let confirmation = parsed.into_confirmation(status)?;

        info!(
            sale_id = confirmation.sale_id,
            invoice = %confirmation.invoice_number,
            total = %confirmation.total_amount,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Sale accepted"
        );

        Ok(confirmation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpPosApi {
        HttpPosApi::with_client(Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn test_endpoint_joins_and_encodes() {
        let api = api("http://127.0.0.1:5000");
        let url = api
            .endpoint(&["api", "get_product_by_barcode", "12 34/5"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:5000/api/get_product_by_barcode/12%2034%2F5"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let api = api("https://pos.example.com/shop/");
        let url = api.endpoint(&["api", "process_sale"]).unwrap();
        assert_eq!(url.as_str(), "https://pos.example.com/shop/api/process_sale");
    }

    #[test]
    fn test_rejection_message() {
        let err = rejection(StatusCode::BAD_REQUEST, br#"{"error": "Insufficient stock"}"#);
        assert!(matches!(
            err,
            ClientError::ServerRejected { status: 400, ref message } if message == "Insufficient stock"
        ));

        let err = rejection(StatusCode::FORBIDDEN, b"<html>denied</html>");
        assert!(matches!(
            err,
            ClientError::ServerRejected { status: 403, ref message } if message == "Forbidden"
        ));
    }

    #[test]
    fn test_not_found_message() {
        assert_eq!(
            not_found_message(br#"{"error": "Product not found"}"#).as_deref(),
            Some("Product not found")
        );
        assert!(not_found_message(br#"{"id": 7, "name": "Cola", "price": 10.5, "quantity": 3}"#).is_none());
        assert!(not_found_message(b"[]").is_none());
    }

    #[test]
    fn test_sale_response_shapes() {
        let ok: SaleResponse = serde_json::from_str(
            r#"{"success": true, "sale_id": 42, "invoice_number": "INV-20240315143022-A1B2", "total_amount": 25.0}"#,
        )
        .unwrap();
        let confirmation = ok.into_confirmation(StatusCode::OK).unwrap();
        assert_eq!(confirmation.sale_id, 42);
        assert_eq!(confirmation.total_amount, Money::from_cents(2500));

        let refused: SaleResponse =
            serde_json::from_str(r#"{"success": false, "error": "Cart is empty"}"#).unwrap();
        assert!(refused
            .into_confirmation(StatusCode::OK)
            .unwrap_err()
            .is_server_rejection());

        let partial: SaleResponse = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(matches!(
            partial.into_confirmation(StatusCode::OK),
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
