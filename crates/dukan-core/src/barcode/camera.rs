//! # Camera Scan Session
//!
//! Lifecycle of one camera scan, bound to the scanner dialog.
//!
//! ## Session States
//! ```text
//!              dialog_shown()                camera_started()
//!   ┌────────┐ ─────────────► ┌──────────┐ ────────────────► ┌──────────┐
//!   │ Closed │  StartCamera   │ Starting │                   │ Scanning │
//!   └────────┘                └────┬─────┘                   └────┬─────┘
//!     ▲  ▲  ▲                      │ camera_failed()              │
//!     │  │  │                      ▼                              │ frame:
//!     │  │  │               ┌─────────────┐                       │ Decoded
//!     │  │  └───────────────┤ ManualEntry │                       │
//!     │  │  submit_manual() └─────────────┘                       │
//!     │  │  / dialog_hidden()                                     │
//!     │  └────────────────────────────────────────────────────────┘
//!     │           emit (once), StopCamera
//!     └── dialog_hidden() or submit_manual() from any state
//!         (StopCamera if the camera runs)
//! ```
//!
//! A decoded frame closes the session before the barcode is handed out, so
//! frames still queued behind it find the session Closed and are dropped.

use tracing::{debug, info, trace, warn};

use super::{AcquiredBarcode, BarcodeOrigin};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanSessionState {
    #[default]
    Closed,
    Starting,
    Scanning,
    /// Camera could not start. The dialog shows a text field instead.
    ManualEntry,
}

/// What the decoder reported for one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Decoded(String),
    /// Nothing readable in this frame. Normal while the cashier aims.
    NoBarcode,
    /// The decoder choked on a frame. Logged, never surfaced.
    Error(String),
}

/// Instruction for whoever drives the physical camera.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionCommand {
    StartCamera,
    StopCamera,
}

#[derive(Debug, Default)]
pub struct ScanSession {
    state: ScanSessionState,
}

impl ScanSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ScanSessionState {
        self.state
    }

    pub fn is_manual_entry(&self) -> bool {
        self.state == ScanSessionState::ManualEntry
    }

    /// The scanner dialog became visible.
    pub fn dialog_shown(&mut self) -> Option<SessionCommand> {
        if self.state != ScanSessionState::Closed {
            return None;
        }
        self.state = ScanSessionState::Starting;
        Some(SessionCommand::StartCamera)
    }

    /// The camera reported that it is streaming.
    ///
    /// If the dialog was closed while the camera was still starting, the
    /// camera must be stopped straight away.
    pub fn camera_started(&mut self) -> Option<SessionCommand> {
        if self.state == ScanSessionState::Starting {
            self.state = ScanSessionState::Scanning;
            info!("Camera scan session started");
            None
        } else {
            debug!(state = ?self.state, "Camera started after the dialog closed");
            Some(SessionCommand::StopCamera)
        }
    }

    /// The camera could not start. Switches the dialog to manual entry.
    pub fn camera_failed(&mut self, reason: impl Into<String>) -> CoreError {
        let reason = reason.into();
        warn!(%reason, "Camera unavailable, falling back to manual entry");
        if self.state == ScanSessionState::Starting {
            self.state = ScanSessionState::ManualEntry;
        }
        CoreError::CameraUnavailable { reason }
    }

    /// Handles one decoder result.
    ///
    /// Returns the barcode only for the first successful decode of a
    /// session. The session is Closed by the time it returns, and the
    /// caller still has to stop the camera.
    pub fn on_frame(&mut self, outcome: DecodeOutcome) -> Option<AcquiredBarcode> {
        if self.state != ScanSessionState::Scanning {
            return None;
        }

        match outcome {
            DecodeOutcome::Decoded(text) => {
                let code = text.trim();
                if code.is_empty() {
                    return None;
                }
                self.state = ScanSessionState::Closed;
                debug!(barcode = %code, "Camera decoded barcode");
                Some(AcquiredBarcode::new(code, BarcodeOrigin::Camera))
            }
            DecodeOutcome::NoBarcode => None,
            DecodeOutcome::Error(detail) => {
                trace!(%detail, "Frame decode error ignored");
                None
            }
        }
    }

    /// The dialog was hidden. Safe to call in any state.
    pub fn dialog_hidden(&mut self) -> Option<SessionCommand> {
        let previous = std::mem::take(&mut self.state);
        match previous {
            ScanSessionState::Starting | ScanSessionState::Scanning => {
                debug!("Scanner dialog hidden, stopping camera");
                Some(SessionCommand::StopCamera)
            }
            ScanSessionState::Closed | ScanSessionState::ManualEntry => None,
        }
    }

    /// Submits the manual entry field.
    ///
    /// The value is trimmed. A blank value fails with `EmptyBarcode` and
    /// keeps the field open. Otherwise the session closes, and a camera that
    /// is still starting or scanning must be stopped.
    pub fn submit_manual(
        &mut self,
        input: &str,
    ) -> CoreResult<(AcquiredBarcode, Option<SessionCommand>)> {
        let code = input.trim();
        if code.is_empty() {
            warn!("Manual barcode entry was blank");
            return Err(CoreError::EmptyBarcode);
        }
        let command = self.dialog_hidden();
        Ok((AcquiredBarcode::new(code, BarcodeOrigin::Manual), command))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanning() -> ScanSession {
        let mut session = ScanSession::new();
        assert_eq!(session.dialog_shown(), Some(SessionCommand::StartCamera));
        assert_eq!(session.camera_started(), None);
        assert_eq!(session.state(), ScanSessionState::Scanning);
        session
    }

    #[test]
    fn test_first_decode_wins() {
        let mut session = scanning();

        assert!(session.on_frame(DecodeOutcome::NoBarcode).is_none());
        let barcode = session
            .on_frame(DecodeOutcome::Decoded("6221031490019".to_string()))
            .unwrap();
        assert_eq!(barcode.code, "6221031490019");
        assert_eq!(barcode.origin, BarcodeOrigin::Camera);
        assert_eq!(session.state(), ScanSessionState::Closed);

        // Frames already queued behind the first decode
        assert!(session
            .on_frame(DecodeOutcome::Decoded("6221031490019".to_string()))
            .is_none());
    }

    #[test]
    fn test_noise_does_not_stop_session() {
        let mut session = scanning();
        for _ in 0..20 {
            assert!(session.on_frame(DecodeOutcome::NoBarcode).is_none());
        }
        assert!(session
            .on_frame(DecodeOutcome::Error("bad frame".to_string()))
            .is_none());
        assert_eq!(session.state(), ScanSessionState::Scanning);
    }

    #[test]
    fn test_hide_is_idempotent() {
        let mut session = scanning();
        assert_eq!(session.dialog_hidden(), Some(SessionCommand::StopCamera));
        assert_eq!(session.dialog_hidden(), None);
        assert_eq!(session.dialog_hidden(), None);
        assert_eq!(session.state(), ScanSessionState::Closed);
    }

    #[test]
    fn test_hidden_while_starting_stops_late_camera() {
        let mut session = ScanSession::new();
        session.dialog_shown();
        assert_eq!(session.dialog_hidden(), Some(SessionCommand::StopCamera));
        assert_eq!(session.camera_started(), Some(SessionCommand::StopCamera));
        assert_eq!(session.state(), ScanSessionState::Closed);
    }

    #[test]
    fn test_camera_failure_falls_back_to_manual() {
        let mut session = ScanSession::new();
        session.dialog_shown();
        let err = session.camera_failed("permission denied");

        assert!(matches!(err, CoreError::CameraUnavailable { ref reason } if reason == "permission denied"));
        assert!(session.is_manual_entry());
        assert_eq!(session.dialog_hidden(), None);
    }

    #[test]
    fn test_manual_entry() {
        let mut session = ScanSession::new();
        session.dialog_shown();
        session.camera_failed("no camera");

        assert_eq!(session.submit_manual("   ").unwrap_err(), CoreError::EmptyBarcode);
        assert!(session.is_manual_entry());

        let (barcode, command) = session.submit_manual("  12345 ").unwrap();
        assert_eq!(barcode.code, "12345");
        assert_eq!(barcode.origin, BarcodeOrigin::Manual);
        assert_eq!(command, None);
        assert_eq!(session.state(), ScanSessionState::Closed);
    }

    #[test]
    fn test_manual_entry_while_scanning_stops_camera() {
        let mut session = scanning();

        let (barcode, command) = session.submit_manual("12345").unwrap();
        assert_eq!(barcode.code, "12345");
        assert_eq!(command, Some(SessionCommand::StopCamera));
        assert_eq!(session.state(), ScanSessionState::Closed);
        assert_eq!(session.dialog_hidden(), None);
    }

    #[test]
    fn test_reopen_after_decode() {
        let mut session = scanning();
        session.on_frame(DecodeOutcome::Decoded("111".to_string()));
        assert_eq!(session.dialog_hidden(), None);
        assert_eq!(session.dialog_shown(), Some(SessionCommand::StartCamera));
    }
}
