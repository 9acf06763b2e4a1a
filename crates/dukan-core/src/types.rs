//! # Domain Types
//!
//! Core domain types for the register front end.
//!
//! ## Type Relationships
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Domain Model                                     │
//! │                                                                         │
//! │  ┌──────────────┐   add_product()  ┌──────────────┐                     │
//! │  │   Product    │─────────────────►│   CartLine   │ (cart.rs)          │
//! │  │ (from API)   │  price, stock    │ qty ≤ max    │                     │
//! │  └──────────────┘   snapshot       └──────┬───────┘                     │
//! │                                           │ many                        │
//! │  ┌──────────────┐                  ┌──────▼───────┐    POST            │
//! │  │   Customer   │─────────────────►│ SaleRequest  │──────────► server  │
//! │  └──────────────┘                  └──────────────┘                     │
//! │  ┌──────────────┐                  ┌──────────────────┐                 │
//! │  │PaymentMethod │─────────────────►│ SaleConfirmation │◄──── response  │
//! │  └──────────────┘                  └──────────────────┘                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Product`, `SaleRequest` and `SaleConfirmation` mirror the JSON of the
//! sales API, so their money fields travel as decimals.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

/// Server-assigned product identifier.
pub type ProductId = i64;

// =============================================================================
// Product
// =============================================================================

/// A product as returned by the search and barcode endpoints.
///
/// Read-only to the register: the server owns stock and pricing. The
/// `quantity` here is the live stock figure at the time of the response.
///
/// ## Wire Format
/// ```json
/// {
///   "id": 7, "name": "Cola 330ml", "name_en": "Cola",
///   "barcode": "6221031490019", "sku": "COLA-330",
///   "price": 10.5, "quantity": 24, "image_url": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    pub id: ProductId,

    /// Display name (primary language)
    pub name: String,

    /// Secondary-language name
    #[serde(default)]
    pub name_en: Option<String>,

    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub price: Money,

    /// Live stock figure
    pub quantity: i64,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default)]
    pub sku: Option<String>,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    /// Creates a product with only the fields the cart needs.
    pub fn new(id: ProductId, name: impl Into<String>, price: Money, quantity: i64) -> Self {
        Product {
            id,
            name: name.into(),
            name_en: None,
            price,
            quantity,
            barcode: None,
            sku: None,
            image_url: None,
        }
    }

    /// Sets the barcode.
    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    /// Returns true if at least one unit is available.
    pub fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer pays. Cash is the register default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            _ => Err(ValidationError::NotAllowed {
                field: "payment_method".to_string(),
                allowed: vec!["cash".to_string(), "card".to_string()],
            }),
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// Optional customer details attached to a sale. Free-form, never required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Customer {
    pub name: Option<String>,
    pub phone: Option<String>,
}

impl Customer {
    /// Sets the name. Blank input clears it.
    pub fn set_name(&mut self, name: &str) {
        self.name = non_blank(name);
    }

    /// Sets the phone number. Blank input clears it.
    pub fn set_phone(&mut self, phone: &str) {
        self.phone = non_blank(phone);
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none()
    }
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

// =============================================================================
// Sale Request / Response
// =============================================================================

/// One line of a sale submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleItemRequest {
    pub product_id: ProductId,
    pub quantity: i64,
    #[serde(with = "crate::money::decimal")]
    pub price: Money,
}

/// Body of `POST /api/process_sale`.
///
/// Built by [`CheckoutFlow::begin`](crate::checkout::CheckoutFlow::begin)
/// from the cart at submission time and never stored anywhere else.
/// Absent customer fields are sent as empty strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleRequest {
    pub items: Vec<SaleItemRequest>,
    pub customer_name: String,
    pub customer_phone: String,
    pub payment_method: PaymentMethod,
    #[serde(with = "crate::money::decimal")]
    pub discount_amount: Money,
}

/// Successful sale as confirmed by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleConfirmation {
    pub sale_id: i64,

    /// e.g. `INV-20240315143022-A1B2`
    pub invoice_number: String,

    #[serde(with = "crate::money::decimal")]
    #[ts(type = "number")]
    pub total_amount: Money,
}

impl SaleConfirmation {
    /// Path of the invoice view for this sale.
    pub fn invoice_path(&self) -> String {
        format!("/invoice/{}", self.sale_id)
    }

    /// Path of the printable invoice for this sale.
    pub fn print_path(&self) -> String {
        format!("/print_invoice/{}", self.sale_id)
    }
}

// =============================================================================
// Notices
// =============================================================================

/// Severity of a transient notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Danger,
}

/// A transient, user-visible notification (a toast in the browser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Notice {
            level,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Notice::new(NoticeLevel::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Notice::new(NoticeLevel::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Notice::new(NoticeLevel::Warning, message)
    }

    pub fn danger(message: impl Into<String>) -> Self {
        Notice::new(NoticeLevel::Danger, message)
    }
}
