//! # Register Session
//!
//! One cashier's register: the cart, the checkout flow, product lookup and
//! the event sink, wired together.
//!
//! ## Barcode Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  AcquiredBarcode (any source)                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  on_barcode_acquired ──► "Looking up product..."                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  GET /api/get_product_by_barcode/<code>                                │
//! │       │                                                                 │
//! │       ├── Found    ──► "Found X" ──► add_product ──► "Added X ..."     │
//! │       ├── NotFound ──► warning notice, cart untouched                  │
//! │       └── Error    ──► danger notice, cart untouched                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Checkout Flow
//! ```text
//!   checkout() ──► CheckoutFlow::begin (guards) ──► POST /api/process_sale
//!                                                        │
//!                        ┌───────────────────────────────┤
//!                        ▼                               ▼
//!                 complete: cart cleared          fail: cart kept
//!                 sale_completed event            danger notice
//! ```

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use dukan_core::validation::parse_discount;
use dukan_core::{
    AcquiredBarcode, AddOutcome, CartLine, CartStore, CartView, CheckoutFailure, CheckoutFlow,
    CheckoutState, CoreError, Money, Notice, PaymentMethod, Product, ProductId, QuantityUpdate,
    SaleConfirmation, Shortcut, ShortcutContext,
};

use crate::api::PosApi;
use crate::config::SearchSettings;
use crate::debounce::SearchDebouncer;
use crate::error::{PosError, PosResult};
use crate::events::{PosEventSink, SinkObserver};
use crate::lookup::{LookupResult, ProductLookup};

/// What a resolved shortcut did.
#[derive(Debug, Clone, PartialEq)]
pub enum ShortcutAction {
    /// The presentation should focus the search field.
    FocusSearch,
    /// The presentation should open the scanner dialog.
    OpenScanner,
    SaleCompleted(SaleConfirmation),
    CartCleared,
}

pub struct Register {
    session_id: Uuid,
    cart: CartStore,
    checkout: CheckoutFlow,
    lookup: Arc<ProductLookup>,
    api: Arc<dyn PosApi>,
    sink: Arc<dyn PosEventSink>,
    debouncer: SearchDebouncer,
}

impl Register {
    /// Creates a register with an empty cart.
    pub fn new(api: Arc<dyn PosApi>, sink: Arc<dyn PosEventSink>, search: &SearchSettings) -> Self {
        let session_id = Uuid::new_v4();
        info!(%session_id, "Register session opened");

        Register {
            session_id,
            cart: CartStore::with_observer(Arc::new(SinkObserver(sink.clone()))),
            checkout: CheckoutFlow::new(),
            lookup: Arc::new(ProductLookup::with_min_query_len(
                api.clone(),
                search.min_query_len,
            )),
            api,
            sink,
            debouncer: SearchDebouncer::new(search.debounce()),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn view(&self) -> CartView {
        self.cart.view()
    }

    pub fn checkout_state(&self) -> CheckoutState {
        self.checkout.state()
    }

    /// True while the checkout control should be enabled.
    pub fn can_checkout(&self) -> bool {
        self.checkout.can_submit(&self.cart)
    }

    // =========================================================================
    // Barcodes
    // =========================================================================

    /// Looks a barcode up and adds the product to the cart.
    ///
    /// Returns `Ok(None)` when no product matches or a sale is being
    /// submitted.
    pub async fn on_barcode_acquired(
        &mut self,
        barcode: AcquiredBarcode,
    ) -> PosResult<Option<AddOutcome>> {
        if self.checkout.state() == CheckoutState::Submitting {
            debug!(barcode = %barcode.code, "Barcode ignored while a sale is submitting");
            return Ok(None);
        }

        info!(
            session_id = %self.session_id,
            barcode = %barcode.code,
            origin = ?barcode.origin,
            "Barcode acquired"
        );
        self.sink.barcode_acquired(&barcode);
        self.sink.notice(&Notice::info("Looking up product..."));

        match self.lookup.lookup_by_barcode(&barcode.code).await {
            Ok(LookupResult::Found(product)) => {
                self.sink
                    .notice(&Notice::info(format!("Found {}", product.name)));
                self.add_product(&product).map(Some)
            }
            Ok(LookupResult::NotFound { barcode }) => {
                self.sink
                    .notice(&Notice::warning(format!("No product found for barcode {}", barcode)));
                Ok(None)
            }
            Err(err) => Err(self.report(PosError::LookupFailed(err))),
        }
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Adds one unit of `product` and clears the search field.
    pub fn add_product(&mut self, product: &Product) -> PosResult<AddOutcome> {
        match self.cart.add_product(product) {
            Ok(outcome) => {
                self.sink
                    .notice(&Notice::success(format!("Added {} to cart", product.name)));
                self.debouncer.cancel();
                self.lookup.issue_ticket();
                self.sink.search_cleared();
                self.sink.search_results("", &[]);
                Ok(outcome)
            }
            Err(err) => Err(self.report(err.into())),
        }
    }

    pub fn remove_product(&mut self, product_id: ProductId) -> Option<CartLine> {
        let removed = self.cart.remove_product(product_id);
        if let Some(line) = &removed {
            self.sink
                .notice(&Notice::info(format!("Removed {} from cart", line.name)));
        }
        removed
    }

    /// Sets a line's quantity. Zero or less removes the line.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> PosResult<QuantityUpdate> {
        let name = self.cart.line(product_id).map(|line| line.name.clone());
        match self.cart.set_quantity(product_id, quantity) {
            Ok(QuantityUpdate::Removed) => {
                if let Some(name) = name {
                    self.sink
                        .notice(&Notice::info(format!("Removed {} from cart", name)));
                }
                Ok(QuantityUpdate::Removed)
            }
            Ok(update) => Ok(update),
            Err(err) => Err(self.report(err.into())),
        }
    }

    /// Parses and applies the discount field.
    pub fn set_discount(&mut self, input: &str) -> PosResult<Money> {
        let discount = parse_discount(input)
            .map_err(CoreError::from)
            .map_err(|err| self.report(err.into()))?;

        self.cart
            .set_discount(discount)
            .map_err(|err| self.report(err.into()))?;

        let totals = self.cart.totals();
        if !totals.discount_is_covered() {
            self.sink.notice(&Notice::warning(format!(
                "Discount exceeds the subtotal by {}",
                totals.excess_discount()
            )));
        }
        Ok(discount)
    }

    pub fn set_customer_name(&mut self, name: &str) {
        self.cart.set_customer_name(name);
    }

    pub fn set_customer_phone(&mut self, phone: &str) {
        self.cart.set_customer_phone(phone);
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.cart.set_payment_method(method);
    }

    /// Empties the cart. The caller has already asked the cashier.
    pub fn clear_cart(&mut self) {
        self.cart.clear();
        self.sink.notice(&Notice::info("Cart cleared"));
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// The search field changed. The query runs once input goes quiet.
    pub fn search_input_changed(&mut self, query: &str) {
        let lookup = self.lookup.clone();
        let sink = self.sink.clone();
        let query = query.to_string();

        self.debouncer.schedule(async move {
            let _ = run_search(&lookup, sink.as_ref(), &query).await;
        });
    }

    /// Runs a search immediately, skipping the debounce.
    ///
    /// Returns `Ok(None)` if a newer search superseded this one.
    pub async fn search_now(&mut self, query: &str) -> PosResult<Option<Vec<Product>>> {
        self.debouncer.cancel();
        run_search(&self.lookup, self.sink.as_ref(), query).await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Submits the cart as a sale.
    ///
    /// Guards run before any request. On success the cart is cleared; on
    /// failure it is kept so the cashier can retry.
    pub async fn checkout(&mut self) -> PosResult<SaleConfirmation> {
        let request = self
            .checkout
            .begin(&self.cart)
            .map_err(|err| self.report(err.into()))?;
        self.sink.checkout_state_changed(self.checkout.state());

        match self.api.process_sale(&request).await {
            Ok(confirmation) => {
                self.checkout.complete(&confirmation, &mut self.cart);
                self.sink.checkout_state_changed(self.checkout.state());
                self.sink.notice(&Notice::success(format!(
                    "Sale completed. Invoice {}",
                    confirmation.invoice_number
                )));
                self.sink.sale_completed(&confirmation);
                Ok(confirmation)
            }
            Err(err) => {
                let failure = CheckoutFailure::from(&err);
                self.checkout.fail(failure.clone());
                self.sink.checkout_state_changed(self.checkout.state());
                Err(self.report(failure.into()))
            }
        }
    }

    // =========================================================================
    // Shortcuts
    // =========================================================================

    /// Runs a keyboard shortcut if its precondition holds.
    ///
    /// `clear_confirmed` is the cashier's answer to the clear-cart prompt.
    /// It is ignored for every other shortcut.
    pub async fn handle_shortcut(
        &mut self,
        shortcut: Shortcut,
        clear_confirmed: bool,
    ) -> PosResult<Option<ShortcutAction>> {
        let context = ShortcutContext {
            checkout_enabled: self.can_checkout(),
            clear_confirmed,
        };

        let Some(shortcut) = shortcut.resolve(context) else {
            debug!(key = shortcut.key(), "Shortcut precondition not met");
            return Ok(None);
        };

        match shortcut {
            Shortcut::FocusSearch => Ok(Some(ShortcutAction::FocusSearch)),
            Shortcut::OpenScanner => Ok(Some(ShortcutAction::OpenScanner)),
            Shortcut::SubmitCheckout => self
                .checkout()
                .await
                .map(|confirmation| Some(ShortcutAction::SaleCompleted(confirmation))),
            Shortcut::ClearCart => {
                self.clear_cart();
                Ok(Some(ShortcutAction::CartCleared))
            }
        }
    }

    /// Logs an error, shows it to the cashier, and hands it back.
    fn report(&self, err: PosError) -> PosError {
        match &err {
            PosError::Core(_) => debug!(code = ?err.code(), error = %err, "Register action refused"),
            _ => warn!(code = ?err.code(), error = %err, "Register action failed"),
        }
        self.sink.notice(&err.notice());
        err
    }
}

/// Runs one search and publishes its results if they are still current.
///
/// A failed search clears the result list.
async fn run_search(
    lookup: &ProductLookup,
    sink: &dyn PosEventSink,
    query: &str,
) -> PosResult<Option<Vec<Product>>> {
    match lookup.search_latest(query).await {
        None => Ok(None),
        Some(Ok(products)) => {
            sink.search_results(query, &products);
            Ok(Some(products))
        }
        Some(Err(err)) => {
            let err = PosError::SearchFailed(err);
            warn!(query = %query, error = %err, "Search failed");
            sink.notice(&err.notice());
            sink.search_results(query, &[]);
            Err(err)
        }
    }
}
