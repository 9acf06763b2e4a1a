//! Tracing setup shared by every register front end.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "info,dukan=debug,reqwest=warn";

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` wins over [`DEFAULT_FILTER`]. Calling this twice is harmless:
/// the second subscriber is dropped.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .is_err()
    {
        debug!("Tracing subscriber already installed");
    }
}
