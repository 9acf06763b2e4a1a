//! # dukan-client: Sales API Client and Register Session
//!
//! Everything in the register that touches the network, a timer, or a
//! channel. The rules themselves live in `dukan-core`.
//!
//! ## Module Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         dukan-client                                    │
//! │                                                                         │
//! │   scanner ──► BarcodeStream ──┐                                        │
//! │                               ▼                                        │
//! │   events ◄──────────────── register ──► lookup ──► api (reqwest)       │
//! │                               │           ▲                            │
//! │                               └─► debounce┘                            │
//! │                                                                         │
//! │   config (TOML + env)        telemetry (tracing-subscriber)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use std::sync::Arc;
//! use dukan_client::{ClientConfig, HttpPosApi, NoOpSink, Register};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::load_or_default(None);
//! let api = Arc::new(HttpPosApi::new(&config.api)?);
//! let mut register = Register::new(api, Arc::new(NoOpSink), &config.search);
//!
//! register.search_input_changed("cola");
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod debounce;
pub mod error;
pub mod events;
pub mod lookup;
pub mod register;
pub mod scanner;
pub mod telemetry;

pub use api::{HttpPosApi, PosApi};
pub use config::ClientConfig;
pub use debounce::SearchDebouncer;
pub use error::{ClientError, ClientResult, ErrorCode, PosError, PosResult};
pub use events::{NoOpSink, PosEventSink};
pub use lookup::{LookupResult, ProductLookup, SearchTicket};
pub use register::{Register, ShortcutAction};
pub use scanner::{
    barcode_channel, BarcodeSink, BarcodeStream, CameraChannel, CameraDecoder,
    HardwareScannerInput, UnavailableCamera,
};
pub use telemetry::init_tracing;
