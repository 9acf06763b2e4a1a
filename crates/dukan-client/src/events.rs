//! # Register Events
//!
//! The presentation layer learns about state changes through a
//! [`PosEventSink`]. A browser bridge turns these into DOM updates, the
//! terminal front end prints them.

use std::sync::Arc;

use dukan_core::{AcquiredBarcode, CartObserver, CartView, CheckoutState, Notice, Product, SaleConfirmation};

/// Receives everything the register wants the cashier to see.
pub trait PosEventSink: Send + Sync {
    /// The cart changed. `view` is the full post-change snapshot.
    fn cart_changed(&self, view: &CartView);

    /// Results for the latest search. An empty slice clears the list.
    fn search_results(&self, query: &str, products: &[Product]);

    /// A transient notification.
    fn notice(&self, notice: &Notice);

    fn checkout_state_changed(&self, state: CheckoutState);

    /// The server confirmed a sale. Receipt links derive from it.
    fn sale_completed(&self, confirmation: &SaleConfirmation);

    /// A barcode arrived from any source, before lookup.
    fn barcode_acquired(&self, _barcode: &AcquiredBarcode) {}

    /// The search field should be emptied.
    fn search_cleared(&self) {}
}

/// No-op event sink for testing.
pub struct NoOpSink;

impl PosEventSink for NoOpSink {
    fn cart_changed(&self, _view: &CartView) {}
    fn search_results(&self, _query: &str, _products: &[Product]) {}
    fn notice(&self, _notice: &Notice) {}
    fn checkout_state_changed(&self, _state: CheckoutState) {}
    fn sale_completed(&self, _confirmation: &SaleConfirmation) {}
}

/// Forwards cart notifications to a sink.
pub(crate) struct SinkObserver(pub(crate) Arc<dyn PosEventSink>);

impl CartObserver for SinkObserver {
    fn cart_changed(&self, view: &CartView) {
        self.0.cart_changed(view);
    }
}
