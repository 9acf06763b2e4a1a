//! # Barcode Acquisition
//!
//! Three producers, one event.
//!
//! ## Channels
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Camera decoder ──► ScanSession (camera.rs) ──────┐                     │
//! │   (frames)          one emit per session          │                     │
//! │                                                   │                     │
//! │  Global keys ─────► KeystrokeDetector ────────────┼──► AcquiredBarcode  │
//! │   (bursts)          (keystroke.rs)                │    ──► on_barcode_  │
//! │                                                   │        acquired()   │
//! │  Manual field ────► ScanSession::submit_manual ───┘                     │
//! │   (camera failed)                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The producers share no state. Each one is a plain state machine that
//! returns the barcode it acquired; the client crate pushes those into a
//! single channel.

pub mod camera;
pub mod keystroke;

pub use camera::{DecodeOutcome, ScanSession, ScanSessionState, SessionCommand};
pub use keystroke::{Key, KeyTarget, Keystroke, KeystrokeDetector, ScannerTuning};

use serde::{Deserialize, Serialize};

/// Which producer a barcode came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarcodeOrigin {
    Camera,
    HardwareScanner,
    Manual,
}

/// A barcode ready for lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquiredBarcode {
    pub code: String,
    pub origin: BarcodeOrigin,
}

impl AcquiredBarcode {
    pub fn new(code: impl Into<String>, origin: BarcodeOrigin) -> Self {
        AcquiredBarcode {
            code: code.into(),
            origin,
        }
    }
}
