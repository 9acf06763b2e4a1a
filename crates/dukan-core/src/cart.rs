//! # Cart Store
//!
//! The authoritative in-memory state of one sale in progress: lines,
//! customer, payment method and discount.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  Cashier Action           CartStore Method        State Change          │
//! │  ──────────────           ────────────────        ────────────          │
//! │                                                                         │
//! │  Scan / click product ───► add_product() ───────► insert or qty += 1   │
//! │                                                                         │
//! │  Edit quantity ──────────► set_quantity() ──────► qty = n (≤0 removes) │
//! │                                                                         │
//! │  Click remove ───────────► remove_product() ────► line dropped         │
//! │                                                                         │
//! │  Clear / sale completed ─► clear() ─────────────► back to defaults     │
//! │                                                                         │
//! │  Every successful change ──► CartObserver::cart_changed(&CartView)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per `product_id`
//! - Every line has `1 ≤ quantity ≤ max_quantity`
//! - Line totals and cart totals are always derived, never stored
//!
//! Mutations take `&mut self` and run to completion, so a store never needs
//! a lock of its own. The register owns exactly one.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, PaymentMethod, Product, ProductId};

// =============================================================================
// Observer
// =============================================================================

/// Receives the cart after every successful mutation.
///
/// Implementations must be cheap: they run synchronously inside the
/// mutation call.
pub trait CartObserver: Send + Sync {
    fn cart_changed(&self, view: &CartView);
}

/// Observer that ignores every change. Used when nothing is rendering.
pub struct NoOpObserver;

impl CartObserver for NoOpObserver {
    fn cart_changed(&self, _view: &CartView) {}
}

// =============================================================================
// Cart Line
// =============================================================================

/// One product's aggregated entry in the cart.
///
/// ## Snapshot Semantics
/// Name, price and image are frozen when the product is first added.
/// `max_quantity` starts as the stock figure at that moment and is only
/// refreshed when the same product is added again with a newer stock
/// figure.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub name_en: Option<String>,
    pub unit_price: Money,
    pub image_url: Option<String>,
    pub added_at: DateTime<Utc>,
    quantity: i64,
    max_quantity: i64,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        CartLine {
            product_id: product.id,
            name: product.name.clone(),
            name_en: product.name_en.clone(),
            unit_price: product.price,
            image_url: product.image_url.clone(),
            added_at: Utc::now(),
            quantity: 1,
            max_quantity: product.quantity,
        }
    }

    pub fn quantity(&self) -> i64 {
        self.quantity
    }

    /// Stock ceiling for this line.
    pub fn max_quantity(&self) -> i64 {
        self.max_quantity
    }

    /// `unit_price × quantity`, computed on every call.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Derived money figures for the cart.
///
/// `total` never goes below zero. When the discount is larger than the
/// subtotal the excess is reported by [`Totals::excess_discount`] so the
/// presentation can flag it; checkout refuses such a cart outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal: Money,
    pub discount: Money,
    pub total: Money,
}

impl Totals {
    /// Computes totals from a set of lines and a discount.
    pub fn compute(lines: &[CartLine], discount: Money) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::line_total).sum();
        Totals {
            subtotal,
            discount,
            total: (subtotal - discount).floor_at_zero(),
        }
    }

    /// Portion of the discount that the subtotal cannot absorb.
    pub fn excess_discount(&self) -> Money {
        (self.discount - self.subtotal).floor_at_zero()
    }

    /// True when the discount fits within the subtotal.
    pub fn discount_is_covered(&self) -> bool {
        self.discount <= self.subtotal
    }
}

// =============================================================================
// Views
// =============================================================================

/// A rendered cart line, including its derived total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLineView {
    pub product_id: ProductId,
    pub name: String,
    pub name_en: Option<String>,
    pub unit_price: Money,
    pub quantity: i64,
    pub max_quantity: i64,
    pub line_total: Money,
    pub image_url: Option<String>,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        CartLineView {
            product_id: line.product_id,
            name: line.name.clone(),
            name_en: line.name_en.clone(),
            unit_price: line.unit_price,
            quantity: line.quantity,
            max_quantity: line.max_quantity,
            line_total: line.line_total(),
            image_url: line.image_url.clone(),
        }
    }
}

/// Everything the presentation needs to draw the cart panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub totals: Totals,
    pub item_count: usize,
    pub total_quantity: i64,
    pub customer: Customer,
    pub payment_method: PaymentMethod,
}

// =============================================================================
// Operation Outcomes
// =============================================================================

/// Result of a successful [`CartStore::add_product`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was created with quantity 1.
    Inserted,
    /// An existing line was incremented to `quantity`.
    Incremented { quantity: i64 },
}

/// Result of a successful [`CartStore::set_quantity`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityUpdate {
    Updated { quantity: i64 },
    Removed,
    /// No line for that product. Nothing changed.
    NotInCart,
}

// =============================================================================
// Cart Store
// =============================================================================

/// Session-scoped cart state.
pub struct CartStore {
    lines: Vec<CartLine>,
    customer: Customer,
    payment_method: PaymentMethod,
    discount: Money,
    opened_at: DateTime<Utc>,
    observer: Arc<dyn CartObserver>,
}

impl CartStore {
    /// Creates an empty cart with no observer.
    pub fn new() -> Self {
        Self::with_observer(Arc::new(NoOpObserver))
    }

    /// Creates an empty cart that reports every change to `observer`.
    pub fn with_observer(observer: Arc<dyn CartObserver>) -> Self {
        CartStore {
            lines: Vec::new(),
            customer: Customer::default(),
            payment_method: PaymentMethod::default(),
            discount: Money::zero(),
            opened_at: Utc::now(),
            observer,
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Adds one unit of `product`.
    ///
    /// ## Rules
    /// ```text
    /// product.quantity ≤ 0 ───────────────────────────► OutOfStock
    /// line exists, line.qty ≥ product.quantity ───────► StockExceeded
    /// line exists ────────────────────────────────────► qty += 1
    /// no line ────────────────────────────────────────► insert qty 1,
    ///                                                    max = product.quantity
    /// ```
    /// `product.quantity` is the live stock figure from the latest lookup.
    /// On increment it also becomes the line's new ceiling, so the line
    /// never ends up above its own `max_quantity`.
    pub fn add_product(&mut self, product: &Product) -> CoreResult<AddOutcome> {
        if !product.in_stock() {
            return Err(CoreError::OutOfStock {
                product_id: product.id,
                name: product.name.clone(),
            });
        }

        let outcome = match self.lines.iter_mut().find(|l| l.product_id == product.id) {
            Some(line) => {
                if line.quantity >= product.quantity {
                    return Err(CoreError::StockExceeded {
                        product_id: product.id,
                        name: line.name.clone(),
                        available: product.quantity,
                        requested: line.quantity + 1,
                    });
                }
                line.quantity += 1;
                line.max_quantity = product.quantity;
                AddOutcome::Incremented {
                    quantity: line.quantity,
                }
            }
            None => {
                self.lines.push(CartLine::from_product(product));
                AddOutcome::Inserted
            }
        };

        debug!(product_id = product.id, ?outcome, "Product added to cart");
        self.notify();
        Ok(outcome)
    }

    /// Removes the line for `product_id`. Absent lines are a no-op.
    pub fn remove_product(&mut self, product_id: ProductId) -> Option<CartLine> {
        let index = self.lines.iter().position(|l| l.product_id == product_id)?;
        let removed = self.lines.remove(index);
        debug!(product_id, "Product removed from cart");
        self.notify();
        Some(removed)
    }

    /// Sets a line's quantity.
    ///
    /// `quantity ≤ 0` behaves exactly like [`remove_product`](Self::remove_product).
    /// Anything above the line's `max_quantity` fails with `StockExceeded`
    /// and leaves the line untouched.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: i64) -> CoreResult<QuantityUpdate> {
        if quantity <= 0 {
            return Ok(match self.remove_product(product_id) {
                Some(_) => QuantityUpdate::Removed,
                None => QuantityUpdate::NotInCart,
            });
        }

        let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) else {
            return Ok(QuantityUpdate::NotInCart);
        };

        if quantity > line.max_quantity {
            return Err(CoreError::StockExceeded {
                product_id,
                name: line.name.clone(),
                available: line.max_quantity,
                requested: quantity,
            });
        }

        line.quantity = quantity;
        debug!(product_id, quantity, "Cart quantity updated");
        self.notify();
        Ok(QuantityUpdate::Updated { quantity })
    }

    /// Empties the cart and resets customer, discount and payment method.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.customer = Customer::default();
        self.payment_method = PaymentMethod::default();
        self.discount = Money::zero();
        self.opened_at = Utc::now();
        debug!("Cart cleared");
        self.notify();
    }

    /// Sets the sale-level discount. Negative amounts are rejected.
    ///
    /// A discount above the subtotal is accepted here (the total shows
    /// zero) and refused at checkout.
    pub fn set_discount(&mut self, discount: Money) -> CoreResult<()> {
        if discount.is_negative() {
            return Err(CoreError::InvalidDiscount {
                discount,
                subtotal: self.totals().subtotal,
            });
        }
        self.discount = discount;
        self.notify();
        Ok(())
    }

    pub fn set_customer_name(&mut self, name: &str) {
        self.customer.set_name(name);
        self.notify();
    }

    pub fn set_customer_phone(&mut self, phone: &str) {
        self.customer.set_phone(phone);
        self.notify();
    }

    pub fn set_payment_method(&mut self, method: PaymentMethod) {
        self.payment_method = method;
        self.notify();
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Pure function of the current state.
    pub fn totals(&self) -> Totals {
        Totals::compute(&self.lines, self.discount)
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, product_id: ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.product_id == product_id)
    }

    pub fn customer(&self) -> &Customer {
        &self.customer
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn discount(&self) -> Money {
        self.discount
    }

    /// When the cart was created or last cleared.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// Number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.lines.len()
    }

    /// Sum of all line quantities.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Snapshot for rendering.
    pub fn view(&self) -> CartView {
        CartView {
            lines: self.lines.iter().map(CartLineView::from).collect(),
            totals: self.totals(),
            item_count: self.item_count(),
            total_quantity: self.total_quantity(),
            customer: self.customer.clone(),
            payment_method: self.payment_method,
        }
    }

    fn notify(&self) {
        self.observer.cart_changed(&self.view());
    }
}

impl Default for CartStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CartStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartStore")
            .field("lines", &self.lines)
            .field("customer", &self.customer)
            .field("payment_method", &self.payment_method)
            .field("discount", &self.discount)
            .field("opened_at", &self.opened_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn test_product(id: ProductId, price_cents: i64, stock: i64) -> Product {
        Product::new(id, format!("Product {}", id), Money::from_cents(price_cents), stock)
    }

    #[derive(Default)]
    struct RecordingObserver {
        views: Mutex<Vec<CartView>>,
    }

    impl CartObserver for RecordingObserver {
        fn cart_changed(&self, view: &CartView) {
            self.views.lock().unwrap().push(view.clone());
        }
    }

    #[test]
    fn test_add_inserts_then_increments() {
        let mut cart = CartStore::new();
        let product = test_product(1, 999, 5);

        assert_eq!(cart.add_product(&product).unwrap(), AddOutcome::Inserted);
        assert_eq!(
            cart.add_product(&product).unwrap(),
            AddOutcome::Incremented { quantity: 2 }
        );

        assert_eq!(cart.item_count(), 1);
        let line = cart.line(1).unwrap();
        assert_eq!(line.quantity(), 2);
        assert_eq!(line.max_quantity(), 5);
        assert_eq!(line.line_total().cents(), 1998);
    }

    #[test]
    fn test_add_out_of_stock_leaves_cart_unchanged() {
        let mut cart = CartStore::new();
        cart.add_product(&test_product(1, 100, 3)).unwrap();

        let err = cart.add_product(&test_product(2, 100, 0)).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { product_id: 2, .. }));
        assert_eq!(cart.item_count(), 1);
        assert!(cart.line(2).is_none());

        // Negative stock is treated the same
        let err = cart.add_product(&test_product(1, 100, -4)).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert_eq!(cart.line(1).unwrap().quantity(), 1);
    }

    #[test]
    fn test_add_stops_at_live_stock() {
        let mut cart = CartStore::new();
        let product = test_product(1, 500, 2);

        cart.add_product(&product).unwrap();
        cart.add_product(&product).unwrap();
        let err = cart.add_product(&product).unwrap_err();

        assert_eq!(
            err,
            CoreError::StockExceeded {
                product_id: 1,
                name: "Product 1".to_string(),
                available: 2,
                requested: 3,
            }
        );
        assert_eq!(cart.line(1).unwrap().quantity(), 2);
    }

    #[test]
    fn test_add_refreshes_ceiling_from_live_stock() {
        let mut cart = CartStore::new();
        cart.add_product(&test_product(1, 500, 1)).unwrap();

        // Restocked since the first scan
        cart.add_product(&test_product(1, 500, 4)).unwrap();
        let line = cart.line(1).unwrap();
        assert_eq!(line.quantity(), 2);
        assert_eq!(line.max_quantity(), 4);
        assert!(cart.set_quantity(1, 4).is_ok());
    }

    #[test]
    fn test_add_sequences_keep_invariants() {
        let mut cart = CartStore::new();
        let products: Vec<Product> = (1..=4).map(|id| test_product(id, 100 * id, id)).collect();

        for round in 0..40 {
            let product = &products[(round * 7 + round / 3) % products.len()];
            let _ = cart.add_product(product);

            let mut ids: Vec<_> = cart.lines().iter().map(|l| l.product_id).collect();
            ids.sort_unstable();
            ids.dedup();
            assert_eq!(ids.len(), cart.item_count());
            for line in cart.lines() {
                assert!(line.quantity() >= 1);
                assert!(line.quantity() <= line.max_quantity());
            }
        }
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut cart = CartStore::new();
        cart.add_product(&test_product(1, 100, 3)).unwrap();

        assert!(cart.remove_product(99).is_none());
        assert_eq!(cart.item_count(), 1);

        let removed = cart.remove_product(1).unwrap();
        assert_eq!(removed.product_id, 1);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_rules() {
        let mut cart = CartStore::new();
        cart.add_product(&test_product(1, 250, 5)).unwrap();

        assert_eq!(
            cart.set_quantity(1, 4).unwrap(),
            QuantityUpdate::Updated { quantity: 4 }
        );
        assert_eq!(cart.line(1).unwrap().line_total().cents(), 1000);

        let err = cart.set_quantity(1, 6).unwrap_err();
        assert!(matches!(err, CoreError::StockExceeded { available: 5, requested: 6, .. }));
        assert_eq!(cart.line(1).unwrap().quantity(), 4);

        assert_eq!(cart.set_quantity(2, 1).unwrap(), QuantityUpdate::NotInCart);
    }

    #[test]
    fn test_set_quantity_zero_equals_remove() {
        let build = || {
            let mut cart = CartStore::new();
            cart.add_product(&test_product(1, 100, 3)).unwrap();
            cart.add_product(&test_product(2, 200, 3)).unwrap();
            cart
        };

        let mut via_set = build();
        let mut via_remove = build();
        assert_eq!(via_set.set_quantity(1, 0).unwrap(), QuantityUpdate::Removed);
        via_remove.remove_product(1);
        assert_eq!(via_set.view(), via_remove.view());

        // Also for an absent product, and for negative input
        assert_eq!(via_set.set_quantity(1, -3).unwrap(), QuantityUpdate::NotInCart);
        via_remove.remove_product(1);
        assert_eq!(via_set.view(), via_remove.view());
    }

    #[test]
    fn test_totals_examples() {
        let mut cart = CartStore::new();
        let product = test_product(1, 1000, 10);
        for _ in 0..3 {
            cart.add_product(&product).unwrap();
        }

        cart.set_discount(Money::from_cents(500)).unwrap();
        let totals = cart.totals();
        assert_eq!(totals.subtotal.cents(), 3000);
        assert_eq!(totals.total.cents(), 2500);
        assert!(totals.discount_is_covered());

        cart.set_discount(Money::from_cents(5000)).unwrap();
        let totals = cart.totals();
        assert_eq!(totals.total, Money::zero());
        assert_eq!(totals.excess_discount().cents(), 2000);
        assert!(!totals.discount_is_covered());

        // Pure: no mutation, same answer
        assert_eq!(cart.totals(), cart.totals());
    }

    #[test]
    fn test_negative_discount_rejected() {
        let mut cart = CartStore::new();
        let err = cart.set_discount(Money::from_cents(-1)).unwrap_err();
        assert!(matches!(err, CoreError::InvalidDiscount { .. }));
        assert_eq!(cart.discount(), Money::zero());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cart = CartStore::new();
        cart.add_product(&test_product(1, 100, 3)).unwrap();
        cart.set_customer_name("Mona");
        cart.set_customer_phone("0100");
        cart.set_payment_method(PaymentMethod::Card);
        cart.set_discount(Money::from_cents(50)).unwrap();

        cart.clear();

        assert!(cart.is_empty());
        assert!(cart.customer().is_empty());
        assert_eq!(cart.payment_method(), PaymentMethod::Cash);
        assert_eq!(cart.discount(), Money::zero());
    }

    #[test]
    fn test_observer_sees_successful_changes_only() {
        let observer = Arc::new(RecordingObserver::default());
        let mut cart = CartStore::with_observer(observer.clone());

        cart.add_product(&test_product(1, 100, 1)).unwrap();
        let _ = cart.add_product(&test_product(1, 100, 1)); // StockExceeded
        let _ = cart.add_product(&test_product(2, 100, 0)); // OutOfStock
        cart.remove_product(42); // absent
        cart.set_quantity(1, 0).unwrap();

        let views = observer.views.lock().unwrap();
        assert_eq!(views.len(), 2);
        assert_eq!(views[0].item_count, 1);
        assert_eq!(views[0].totals.subtotal.cents(), 100);
        assert!(views[1].lines.is_empty());
    }
}
