//! # Client Error Types
//!
//! Two layers of errors live here.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Client Error Categories                           │
//! │                                                                         │
//! │  ClientError (one HTTP call or config file)                            │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Transport     │  │     Protocol            │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  Transport      │  │  ServerRejected         │ │
//! │  │  InvalidUrl     │  │                 │  │  InvalidResponse        │ │
//! │  │  ConfigLoad/Save│  │                 │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  PosError (one register operation, what the cashier sees)              │
//! │  ┌───────────────────────────────────────────────────────────────────┐ │
//! │  │  Core(CoreError)  SearchFailed  LookupFailed                      │ │
//! │  │  ServerRejected   Transport                                       │ │
//! │  └───────────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use thiserror::Error;

use dukan_core::{CheckoutFailure, CoreError, Notice};

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for register operations.
pub type PosResult<T> = Result<T, PosError>;

// =============================================================================
// Client Error
// =============================================================================

/// Failure of a single HTTP call or config file operation.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid client configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid API base URL.
    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// The request did not produce an HTTP response.
    #[error("Request failed: {0}")]
    Transport(String),

    // =========================================================================
    // Protocol Errors
    // =========================================================================
    /// The server answered with an error status or `{success: false}`.
    #[error("Server rejected request ({status}): {message}")]
    ServerRejected { status: u16, message: String },

    /// The response body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::InvalidResponse(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        ClientError::InvalidUrl(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::ConfigSaveFailed(err.to_string())
    }
}

impl ClientError {
    /// Returns true if no usable answer came back from the server.
    ///
    /// An unreadable body counts: the cashier cannot tell it apart from a
    /// dropped connection.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            ClientError::Transport(_) | ClientError::InvalidResponse(_)
        )
    }

    /// Returns true if the server understood the request and refused it.
    pub fn is_server_rejection(&self) -> bool {
        matches!(self, ClientError::ServerRejected { .. })
    }

    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidConfig(_)
                | ClientError::InvalidUrl(_)
                | ClientError::ConfigLoadFailed(_)
                | ClientError::ConfigSaveFailed(_)
        )
    }
}

/// Maps a failed `process_sale` call onto the checkout failure shapes.
impl From<&ClientError> for CheckoutFailure {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::ServerRejected { message, .. } => CheckoutFailure::ServerRejected {
                message: message.clone(),
            },
            other => CheckoutFailure::Transport {
                detail: other.to_string(),
            },
        }
    }
}

// =============================================================================
// Register Error
// =============================================================================

/// Error codes for the presentation layer.
///
/// ## Usage in Frontend
/// ```typescript
/// switch (e.code) {
///   case 'STOCK_EXCEEDED':
///     showToast(e.message, 'warning');
///     break;
///   case 'TRANSPORT_ERROR':
///     showToast('Connection problem', 'danger');
///     break;
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    OutOfStock,
    StockExceeded,
    EmptyCart,
    InvalidDiscount,
    CheckoutInProgress,
    CameraUnavailable,
    EmptyBarcode,
    ValidationError,
    SearchFailed,
    LookupFailed,
    ServerRejected,
    TransportError,
}

/// Failure of a register operation.
#[derive(Debug, Error)]
pub enum PosError {
    /// A cart, checkout or scanner rule refused the action.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Product search failed: {0}")]
    SearchFailed(#[source] ClientError),

    #[error("Product lookup failed: {0}")]
    LookupFailed(#[source] ClientError),

    /// The sales API refused the sale.
    #[error("Sale rejected: {message}")]
    ServerRejected { message: String },

    /// The sale never got a usable answer.
    #[error("Sales service unreachable: {detail}")]
    Transport { detail: String },
}

impl From<CheckoutFailure> for PosError {
    fn from(failure: CheckoutFailure) -> Self {
        match failure {
            CheckoutFailure::ServerRejected { message } => PosError::ServerRejected { message },
            CheckoutFailure::Transport { detail } => PosError::Transport { detail },
        }
    }
}

impl PosError {
    pub fn code(&self) -> ErrorCode {
        match self {
            PosError::Core(err) => match err {
                CoreError::OutOfStock { .. } => ErrorCode::OutOfStock,
                CoreError::StockExceeded { .. } => ErrorCode::StockExceeded,
                CoreError::EmptyCart => ErrorCode::EmptyCart,
                CoreError::InvalidDiscount { .. } => ErrorCode::InvalidDiscount,
                CoreError::CheckoutInProgress => ErrorCode::CheckoutInProgress,
                CoreError::CameraUnavailable { .. } => ErrorCode::CameraUnavailable,
                CoreError::EmptyBarcode => ErrorCode::EmptyBarcode,
                CoreError::Validation(_) => ErrorCode::ValidationError,
            },
            PosError::SearchFailed(_) => ErrorCode::SearchFailed,
            PosError::LookupFailed(_) => ErrorCode::LookupFailed,
            PosError::ServerRejected { .. } => ErrorCode::ServerRejected,
            PosError::Transport { .. } => ErrorCode::TransportError,
        }
    }

    /// Renders the error as a cashier-facing notice.
    ///
    /// Rule violations are warnings. Anything that went wrong on the wire
    /// is danger. Transport details stay in the logs.
    pub fn notice(&self) -> Notice {
        match self {
            PosError::Core(CoreError::CameraUnavailable { .. }) => {
                Notice::warning("Camera unavailable. Enter the barcode manually.")
            }
            PosError::Core(err) => Notice::warning(err.to_string()),
            PosError::SearchFailed(_) => Notice::danger("Product search failed"),
            PosError::LookupFailed(_) => Notice::danger("Barcode lookup failed"),
            PosError::ServerRejected { message } => Notice::danger(
                CheckoutFailure::ServerRejected {
                    message: message.clone(),
                }
                .user_message(),
            ),
            PosError::Transport { detail } => Notice::danger(
                CheckoutFailure::Transport {
                    detail: detail.clone(),
                }
                .user_message(),
            ),
        }
    }
}
