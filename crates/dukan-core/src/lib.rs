//! # dukan-core: Pure Business Logic for Dukan POS
//!
//! This crate is the **heart** of the register. It holds the cart state
//! machine, the checkout protocol, and the barcode input heuristics as pure
//! code with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Dukan POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 Presentation (browser / terminal)               │   │
//! │  │    Search box ──► Cart table ──► Checkout ──► Receipt links     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ events / commands                      │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 dukan-client (Register session)                 │   │
//! │  │    HTTP API, debounced search, barcode channel                  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ dukan-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐  │   │
//! │  │   │  money  │ │  cart   │ │ checkout │ │ barcode │ │shortcut│  │   │
//! │  │   │  Money  │ │CartStore│ │   Flow   │ │ Detector│ │  F1-F4 │  │   │
//! │  │   └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO TIMERS • PURE STATE MACHINES        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Wire and domain types (Product, SaleRequest, Notice, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`cart`] - The cart store, its lines and totals
//! - [`checkout`] - Checkout state machine
//! - [`barcode`] - Keystroke detector, camera scan session, manual entry
//! - [`shortcuts`] - Keyboard shortcut resolution
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use dukan_core::{CartStore, Money, Product};
//!
//! let mut cart = CartStore::new();
//! let cola = Product::new(7, "Cola", Money::from_cents(1000), 3);
//!
//! cart.add_product(&cola).unwrap();
//! cart.add_product(&cola).unwrap();
//! cart.set_discount(Money::from_cents(500)).unwrap();
//!
//! let totals = cart.totals();
//! assert_eq!(totals.subtotal, Money::from_cents(2000));
//! assert_eq!(totals.total, Money::from_cents(1500));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod barcode;
pub mod cart;
pub mod checkout;
pub mod error;
pub mod money;
pub mod shortcuts;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use barcode::{AcquiredBarcode, BarcodeOrigin};
pub use cart::{AddOutcome, CartLine, CartObserver, CartStore, CartView, QuantityUpdate, Totals};
pub use checkout::{CheckoutFailure, CheckoutFlow, CheckoutState};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use shortcuts::{Shortcut, ShortcutContext};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum gap between two scanner keystrokes, in milliseconds.
///
/// ## Business Reason
/// Hardware scanners type a whole code in a burst of a few milliseconds per
/// character. A human cannot type that fast, so any gap above this resets
/// the keystroke buffer.
pub const SCANNER_KEYSTROKE_GAP_MS: u64 = 100;

/// Minimum number of characters (Enter excluded) in a keystroke burst for
/// it to count as a scan.
pub const SCANNER_MIN_LENGTH: usize = 4;

/// The keystroke buffer is dropped once it grows past this many characters.
pub const SCANNER_MAX_BUFFER: usize = 50;

/// Queries shorter than this never reach the server.
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

/// Input inactivity before a search request is issued, in milliseconds.
pub const SEARCH_DEBOUNCE_MS: u64 = 300;
