//! # Checkout State Machine
//!
//! Validates the cart, builds the sale request, and applies the server's
//! answer. The network call itself lives in `dukan-client`; this module
//! only owns the transitions around it.
//!
//! ## State Transitions
//! ```text
//!                begin() guards pass
//!   ┌──────┐ ───────────────────────► ┌────────────┐
//!   │ Idle │                          │ Submitting │
//!   └──────┘ ◄─┐                      └─────┬──────┘
//!      ▲       │ next begin()               │
//!      │       │                   ┌────────┴────────┐
//!      │       │          complete()│                 │fail()
//!      │       │                   ▼                 ▼
//!      │    ┌──┴────────┐     ┌───────────┐    ┌──────────┐
//!      └────┤ (any of)  │◄────┤ Completed │    │  Failed  │
//!           └───────────┘     └───────────┘    └──────────┘
//!                              cart cleared     cart kept
//! ```
//!
//! Completed and Failed accept a new `begin()` just like Idle. Only
//! Submitting blocks it, which is what keeps one sale in flight per cart.
//!
//! ## Discount Policy
//! The same [`Totals`](crate::cart::Totals) that the cart displays decides
//! here: a discount that the subtotal does not cover is shown as a zero
//! total with an excess, and is refused at submission with
//! `InvalidDiscount`. A clamped total is never submitted.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::cart::CartStore;
use crate::error::{CoreError, CoreResult};
use crate::types::{SaleConfirmation, SaleItemRequest, SaleRequest};

// =============================================================================
// Checkout State
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum CheckoutState {
    #[default]
    Idle,

    /// Request in flight. Submission controls must be disabled.
    Submitting,

    /// Last sale succeeded and the cart was cleared.
    Completed,

    /// Last sale failed. The cart is as it was.
    Failed,
}

impl CheckoutState {
    /// Returns true if a new submission may start from this state.
    pub fn accepts_submission(&self) -> bool {
        !matches!(self, CheckoutState::Submitting)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Idle => "idle",
            CheckoutState::Submitting => "submitting",
            CheckoutState::Completed => "completed",
            CheckoutState::Failed => "failed",
        }
    }
}

impl fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Checkout Failure
// =============================================================================

/// Why a submitted sale did not go through.
///
/// A server rejection carries the server's own message. A transport
/// failure carries a diagnostic detail that is never shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutFailure {
    /// The server answered with `{error}` or `{success: false}`.
    ServerRejected { message: String },

    /// The request never got a usable answer.
    Transport { detail: String },
}

impl CheckoutFailure {
    /// Message suitable for the cashier.
    pub fn user_message(&self) -> String {
        match self {
            CheckoutFailure::ServerRejected { message } => {
                format!("Sale could not be processed: {}", message)
            }
            CheckoutFailure::Transport { .. } => {
                "Sale could not be processed: the sales service is unreachable".to_string()
            }
        }
    }
}

// =============================================================================
// Checkout Flow
// =============================================================================

/// One register's checkout state machine.
#[derive(Debug, Default)]
pub struct CheckoutFlow {
    state: CheckoutState,
    last_failure: Option<CheckoutFailure>,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CheckoutState {
        self.state
    }

    pub fn last_failure(&self) -> Option<&CheckoutFailure> {
        self.last_failure.as_ref()
    }

    /// Returns true if the checkout control should be enabled.
    pub fn can_submit(&self, cart: &CartStore) -> bool {
        self.state.accepts_submission() && !cart.is_empty()
    }

    /// Runs the guards and moves to Submitting.
    ///
    /// ## Guards (in order)
    /// 1. already Submitting → `CheckoutInProgress`
    /// 2. no lines → `EmptyCart`
    /// 3. discount above subtotal → `InvalidDiscount`
    ///
    /// A failed guard leaves the state untouched, so the caller never
    /// issues a request.
    pub fn begin(&mut self, cart: &CartStore) -> CoreResult<SaleRequest> {
        if !self.state.accepts_submission() {
            return Err(CoreError::CheckoutInProgress);
        }
        if cart.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        let totals = cart.totals();
        if !totals.discount_is_covered() {
            return Err(CoreError::InvalidDiscount {
                discount: totals.discount,
                subtotal: totals.subtotal,
            });
        }

        let request = build_sale_request(cart);
        self.state = CheckoutState::Submitting;
        self.last_failure = None;
        debug!(
            lines = request.items.len(),
            subtotal = %totals.subtotal,
            discount = %totals.discount,
            "Checkout submitting"
        );
        Ok(request)
    }

    /// Applies a successful response: Completed, and the cart is cleared.
    pub fn complete(&mut self, confirmation: &SaleConfirmation, cart: &mut CartStore) {
        if self.state != CheckoutState::Submitting {
            warn!(state = %self.state, "Sale confirmation received outside of a submission");
        }
        self.state = CheckoutState::Completed;
        cart.clear();
        info!(
            invoice = %confirmation.invoice_number,
            sale_id = confirmation.sale_id,
            total = %confirmation.total_amount,
            "Sale completed"
        );
    }

    /// Applies a failed response: Failed, and the cart is left alone.
    pub fn fail(&mut self, failure: CheckoutFailure) {
        if self.state != CheckoutState::Submitting {
            warn!(state = %self.state, "Sale failure received outside of a submission");
        }
        warn!(?failure, "Sale failed");
        self.state = CheckoutState::Failed;
        self.last_failure = Some(failure);
    }
}

/// Derives the wire request from the cart. Deterministic for a given cart.
pub fn build_sale_request(cart: &CartStore) -> SaleRequest {
    let customer = cart.customer();
    SaleRequest {
        items: cart
            .lines()
            .iter()
            .map(|line| SaleItemRequest {
                product_id: line.product_id,
                quantity: line.quantity(),
                price: line.unit_price,
            })
            .collect(),
        customer_name: customer.name.clone().unwrap_or_default(),
        customer_phone: customer.phone.clone().unwrap_or_default(),
        payment_method: cart.payment_method(),
        discount_amount: cart.discount(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::{PaymentMethod, Product};

    fn cart_with_line(price_cents: i64, quantity: i64) -> CartStore {
        let mut cart = CartStore::new();
        let product = Product::new(7, "Cola", Money::from_cents(price_cents), 10);
        for _ in 0..quantity {
            cart.add_product(&product).unwrap();
        }
        cart
    }

    fn confirmation() -> SaleConfirmation {
        SaleConfirmation {
            sale_id: 1,
            invoice_number: "INV-20240315143022-A1B2".to_string(),
            total_amount: Money::from_cents(2500),
        }
    }

    #[test]
    fn test_empty_cart_is_refused() {
        let mut flow = CheckoutFlow::new();
        let cart = CartStore::new();

        assert_eq!(flow.begin(&cart).unwrap_err(), CoreError::EmptyCart);
        assert_eq!(flow.state(), CheckoutState::Idle);
        assert!(!flow.can_submit(&cart));
    }

    #[test]
    fn test_uncovered_discount_is_refused() {
        let mut flow = CheckoutFlow::new();
        let mut cart = cart_with_line(1000, 3);
        cart.set_discount(Money::from_cents(5000)).unwrap();

        let err = flow.begin(&cart).unwrap_err();
        assert_eq!(
            err,
            CoreError::InvalidDiscount {
                discount: Money::from_cents(5000),
                subtotal: Money::from_cents(3000),
            }
        );
        assert_eq!(flow.state(), CheckoutState::Idle);
    }

    #[test]
    fn test_discount_equal_to_subtotal_is_allowed() {
        let mut flow = CheckoutFlow::new();
        let mut cart = cart_with_line(1000, 1);
        cart.set_discount(Money::from_cents(1000)).unwrap();
        assert!(flow.begin(&cart).is_ok());
    }

    #[test]
    fn test_begin_builds_request_and_blocks_second_submission() {
        let mut flow = CheckoutFlow::new();
        let mut cart = cart_with_line(1000, 3);
        cart.set_discount(Money::from_cents(500)).unwrap();
        cart.set_customer_name("Mona");
        cart.set_payment_method(PaymentMethod::Card);

        let request = flow.begin(&cart).unwrap();
        assert_eq!(flow.state(), CheckoutState::Submitting);
        assert_eq!(request.items.len(), 1);
        assert_eq!(request.items[0].product_id, 7);
        assert_eq!(request.items[0].quantity, 3);
        assert_eq!(request.items[0].price.cents(), 1000);
        assert_eq!(request.customer_name, "Mona");
        assert_eq!(request.customer_phone, "");
        assert_eq!(request.payment_method, PaymentMethod::Card);
        assert_eq!(request.discount_amount.cents(), 500);

        assert_eq!(flow.begin(&cart).unwrap_err(), CoreError::CheckoutInProgress);
        assert!(!flow.can_submit(&cart));
    }

    #[test]
    fn test_request_is_deterministic() {
        let cart = cart_with_line(1000, 2);
        assert_eq!(build_sale_request(&cart), build_sale_request(&cart));
    }

    #[test]
    fn test_success_clears_cart() {
        let mut flow = CheckoutFlow::new();
        let mut cart = cart_with_line(1000, 3);
        cart.set_customer_phone("0100");

        flow.begin(&cart).unwrap();
        flow.complete(&confirmation(), &mut cart);

        assert_eq!(flow.state(), CheckoutState::Completed);
        assert!(cart.is_empty());
        assert!(cart.customer().is_empty());
    }

    #[test]
    fn test_failure_keeps_cart_and_allows_retry() {
        let mut flow = CheckoutFlow::new();
        let mut cart = cart_with_line(1000, 3);
        cart.set_customer_name("Mona");
        let before = cart.view();

        flow.begin(&cart).unwrap();
        flow.fail(CheckoutFailure::ServerRejected {
            message: "insufficient stock".to_string(),
        });

        assert_eq!(flow.state(), CheckoutState::Failed);
        assert_eq!(cart.view(), before);
        assert!(flow.can_submit(&cart));
        assert!(flow.begin(&cart).is_ok());
    }

    #[test]
    fn test_failure_messages_are_distinct() {
        let rejected = CheckoutFailure::ServerRejected {
            message: "no permission".to_string(),
        };
        let transport = CheckoutFailure::Transport {
            detail: "connection refused".to_string(),
        };
        assert!(rejected.user_message().contains("no permission"));
        assert!(!transport.user_message().contains("connection refused"));
        assert_ne!(rejected, transport);
    }
}
