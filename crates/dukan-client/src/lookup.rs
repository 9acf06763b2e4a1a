//! # Product Lookup
//!
//! Search and barcode lookup on top of [`PosApi`].
//!
//! ## Stale Responses
//! ```text
//!   ticket 1: "co"   ─────────────────────────────────► response (dropped)
//!   ticket 2: "col"  ──────────► response (dropped)
//!   ticket 3: "cola" ────────────────► response (shown)
//!
//!   Only the response carrying the newest ticket reaches the result list.
//!   Older requests are allowed to finish; their answers are ignored.
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use dukan_core::validation::{validate_barcode, validate_search_query};
use dukan_core::{Product, MIN_SEARCH_QUERY_LEN};

use crate::api::PosApi;
use crate::error::ClientResult;

/// Identifies one issued search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

/// Outcome of a barcode lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    Found(Product),
    NotFound { barcode: String },
}

pub struct ProductLookup {
    api: Arc<dyn PosApi>,
    latest: AtomicU64,
    min_query_len: usize,
}

impl ProductLookup {
    pub fn new(api: Arc<dyn PosApi>) -> Self {
        Self::with_min_query_len(api, MIN_SEARCH_QUERY_LEN)
    }

    pub fn with_min_query_len(api: Arc<dyn PosApi>, min_query_len: usize) -> Self {
        ProductLookup {
            api,
            latest: AtomicU64::new(0),
            min_query_len,
        }
    }

    /// Issues a ticket that supersedes every earlier one.
    pub fn issue_ticket(&self) -> SearchTicket {
        SearchTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Returns true if no newer ticket has been issued.
    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Searches products by free text.
    ///
    /// A query that is too short or too long returns an empty list
    /// without touching the network.
    pub async fn search(&self, query: &str) -> ClientResult<Vec<Product>> {
        match validate_search_query(query, self.min_query_len) {
            Ok(query) => self.api.search_products(query).await,
            Err(err) => {
                debug!(error = %err, "Query not searchable, clearing results");
                Ok(Vec::new())
            }
        }
    }

    /// Searches and returns the outcome only if it is still the latest.
    ///
    /// `None` means a newer search was issued while this one was in
    /// flight. Its result (or error) is dropped.
    pub async fn search_latest(&self, query: &str) -> Option<ClientResult<Vec<Product>>> {
        let ticket = self.issue_ticket();
        let result = self.search(query).await;

        if self.is_current(ticket) {
            Some(result)
        } else {
            debug!(query = %query, ?ticket, "Discarding stale search response");
            None
        }
    }

    /// Resolves a scanned or typed barcode to a product.
    pub async fn lookup_by_barcode(&self, barcode: &str) -> ClientResult<LookupResult> {
        let code = match validate_barcode(barcode) {
            Ok(code) => code,
            Err(err) => {
                warn!(error = %err, "Barcode rejected before lookup");
                return Ok(LookupResult::NotFound {
                    barcode: barcode.trim().to_string(),
                });
            }
        };

        Ok(match self.api.product_by_barcode(code).await? {
            Some(product) => LookupResult::Found(product),
            None => LookupResult::NotFound {
                barcode: code.to_string(),
            },
        })
    }
}
