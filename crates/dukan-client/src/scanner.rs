//! # Barcode Channel
//!
//! Every barcode producer feeds the same channel. The register consumes it.
//!
//! ```text
//! ┌──────────────────────┐
//! │ HardwareScannerInput │──┐
//! │ (KeystrokeDetector)  │  │
//! └──────────────────────┘  │     ┌─────────────┐      ┌────────────────────┐
//! ┌──────────────────────┐  ├────►│ BarcodeSink │─────►│ BarcodeStream      │
//! │ CameraChannel        │──┤     │ (mpsc tx)   │      │ → Register::       │
//! │ (ScanSession+camera) │  │     └─────────────┘      │   on_barcode_      │
//! └──────────────────────┘  │                          │   acquired         │
//! ┌──────────────────────┐  │                          └────────────────────┘
//! │ Manual entry         │──┘
//! └──────────────────────┘
//! ```
//!
//! The camera itself sits behind [`CameraDecoder`] so the session logic can
//! run against a real device, a browser bridge, or a test double.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use dukan_core::barcode::{
    DecodeOutcome, KeystrokeDetector, Keystroke, ScanSession, ScanSessionState, ScannerTuning,
    SessionCommand,
};
use dukan_core::{AcquiredBarcode, CoreResult};

// =============================================================================
// Channel
// =============================================================================

/// Creates the barcode channel.
pub fn barcode_channel() -> (BarcodeSink, BarcodeStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (BarcodeSink { tx }, BarcodeStream { rx })
}

/// Producer half. Cheap to clone, one per input source.
#[derive(Debug, Clone)]
pub struct BarcodeSink {
    tx: mpsc::UnboundedSender<AcquiredBarcode>,
}

impl BarcodeSink {
    /// Forwards a barcode. Returns false once the register is gone.
    pub fn emit(&self, barcode: AcquiredBarcode) -> bool {
        debug!(barcode = %barcode.code, origin = ?barcode.origin, "Barcode acquired");
        if self.tx.send(barcode).is_err() {
            warn!("Barcode dropped, no register is listening");
            return false;
        }
        true
    }
}

/// Consumer half.
#[derive(Debug)]
pub struct BarcodeStream {
    rx: mpsc::UnboundedReceiver<AcquiredBarcode>,
}

impl BarcodeStream {
    /// Waits for the next barcode. `None` once every sink is dropped.
    pub async fn next(&mut self) -> Option<AcquiredBarcode> {
        self.rx.recv().await
    }

    pub fn try_next(&mut self) -> Option<AcquiredBarcode> {
        self.rx.try_recv().ok()
    }
}

// =============================================================================
// Hardware Scanner
// =============================================================================

/// Keyboard-wedge scanner input.
#[derive(Debug)]
pub struct HardwareScannerInput {
    detector: KeystrokeDetector,
    sink: BarcodeSink,
}

impl HardwareScannerInput {
    pub fn new(tuning: ScannerTuning, sink: BarcodeSink) -> Self {
        HardwareScannerInput {
            detector: KeystrokeDetector::with_tuning(tuning),
            sink,
        }
    }

    /// Feeds one keystroke. Returns true if it completed a scan.
    pub fn on_keystroke(&mut self, keystroke: Keystroke) -> bool {
        match self.detector.on_keystroke(keystroke) {
            Some(barcode) => self.sink.emit(barcode),
            None => false,
        }
    }
}

// =============================================================================
// Camera
// =============================================================================

/// A camera that turns frames into decode results.
#[async_trait]
pub trait CameraDecoder: Send {
    /// Starts the camera. Decode results arrive on the returned receiver.
    async fn start(&mut self) -> Result<mpsc::Receiver<DecodeOutcome>, String>;

    /// Stops the camera. Called at most once per successful start.
    async fn stop(&mut self);
}

/// A camera that never starts. Drives the dialog straight to manual entry.
#[derive(Debug, Clone)]
pub struct UnavailableCamera {
    reason: String,
}

impl UnavailableCamera {
    pub fn new(reason: impl Into<String>) -> Self {
        UnavailableCamera {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl CameraDecoder for UnavailableCamera {
    async fn start(&mut self) -> Result<mpsc::Receiver<DecodeOutcome>, String> {
        Err(self.reason.clone())
    }

    async fn stop(&mut self) {}
}

/// The scanner dialog: one [`ScanSession`] driving one camera.
pub struct CameraChannel<C: CameraDecoder> {
    session: ScanSession,
    camera: C,
    frames: Option<mpsc::Receiver<DecodeOutcome>>,
    sink: BarcodeSink,
}

impl<C: CameraDecoder> CameraChannel<C> {
    pub fn new(camera: C, sink: BarcodeSink) -> Self {
        CameraChannel {
            session: ScanSession::new(),
            camera,
            frames: None,
            sink,
        }
    }

    pub fn state(&self) -> ScanSessionState {
        self.session.state()
    }

    pub fn is_manual_entry(&self) -> bool {
        self.session.is_manual_entry()
    }

    /// Shows the dialog and starts the camera.
    ///
    /// A camera failure leaves the dialog in manual entry and returns
    /// `CameraUnavailable`.
    pub async fn open(&mut self) -> CoreResult<()> {
        if self.session.dialog_shown() != Some(SessionCommand::StartCamera) {
            return Ok(());
        }

        match self.camera.start().await {
            Ok(frames) => {
                if self.session.camera_started() == Some(SessionCommand::StopCamera) {
                    self.camera.stop().await;
                } else {
                    self.frames = Some(frames);
                }
                Ok(())
            }
            Err(reason) => Err(self.session.camera_failed(reason)),
        }
    }

    /// Reads frames until one decodes, emits it, then stops the camera.
    ///
    /// Returns `None` if the camera is not running or its stream ended.
    pub async fn scan(&mut self) -> Option<AcquiredBarcode> {
        loop {
            let outcome = match self.frames.as_mut() {
                Some(frames) => frames.recv().await,
                None => return None,
            };

            let Some(outcome) = outcome else {
                debug!("Camera stream ended");
                self.frames = None;
                self.close().await;
                return None;
            };

            if let Some(barcode) = self.session.on_frame(outcome) {
                self.frames = None;
                self.sink.emit(barcode.clone());
                self.camera.stop().await;
                return Some(barcode);
            }
        }
    }

    /// Hides the dialog. Safe to call repeatedly.
    pub async fn close(&mut self) {
        if self.session.dialog_hidden() == Some(SessionCommand::StopCamera) {
            self.frames = None;
            self.camera.stop().await;
        }
    }

    /// Submits the manual entry field and emits the barcode. A running
    /// camera is stopped.
    pub async fn submit_manual(&mut self, input: &str) -> CoreResult<AcquiredBarcode> {
        let (barcode, command) = self.session.submit_manual(input)?;
        self.sink.emit(barcode.clone());
        if command == Some(SessionCommand::StopCamera) {
            self.frames = None;
            self.camera.stop().await;
        }
        Ok(barcode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dukan_core::barcode::{Key, KeyTarget};
    use dukan_core::{BarcodeOrigin, CoreError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    /// Camera fed by the test through a channel.
    struct FakeCamera {
        frames: Option<mpsc::Receiver<DecodeOutcome>>,
        stops: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CameraDecoder for FakeCamera {
        async fn start(&mut self) -> Result<mpsc::Receiver<DecodeOutcome>, String> {
            self.frames.take().ok_or_else(|| "already started".to_string())
        }

        async fn stop(&mut self) {
            self.stops.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn fake_camera() -> (FakeCamera, mpsc::Sender<DecodeOutcome>, Arc<AtomicUsize>) {
        let (tx, rx) = mpsc::channel(16);
        let stops = Arc::new(AtomicUsize::new(0));
        let camera = FakeCamera {
            frames: Some(rx),
            stops: stops.clone(),
        };
        (camera, tx, stops)
    }

    #[test]
    fn test_hardware_scanner_emits() {
        let (sink, mut stream) = barcode_channel();
        let mut input = HardwareScannerInput::new(ScannerTuning::default(), sink);

        let mut now = Instant::now();
        for c in "12345".chars() {
            assert!(!input.on_keystroke(Keystroke::new(Key::Char(c), KeyTarget::Other, now)));
            now += Duration::from_millis(10);
        }
        assert!(input.on_keystroke(Keystroke::new(Key::Enter, KeyTarget::Other, now)));

        let barcode = stream.try_next().unwrap();
        assert_eq!(barcode.code, "12345");
        assert_eq!(barcode.origin, BarcodeOrigin::HardwareScanner);
    }

    #[tokio::test]
    async fn test_camera_emits_once_and_stops() {
        let (camera, frames, stops) = fake_camera();
        let (sink, mut stream) = barcode_channel();
        let mut channel = CameraChannel::new(camera, sink);

        channel.open().await.unwrap();
        assert_eq!(channel.state(), ScanSessionState::Scanning);

        frames.send(DecodeOutcome::NoBarcode).await.unwrap();
        frames.send(DecodeOutcome::Decoded("5000".into())).await.unwrap();
        frames.send(DecodeOutcome::Decoded("5000".into())).await.unwrap();

        let barcode = channel.scan().await.unwrap();
        assert_eq!(barcode.code, "5000");
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(channel.state(), ScanSessionState::Closed);

        // The queued duplicate frame never surfaces
        assert!(channel.scan().await.is_none());
        channel.close().await;
        assert_eq!(stops.load(Ordering::SeqCst), 1);

        assert_eq!(stream.try_next().unwrap().code, "5000");
        assert!(stream.try_next().is_none());
    }

    #[tokio::test]
    async fn test_close_stops_running_camera() {
        let (camera, _frames, stops) = fake_camera();
        let (sink, _stream) = barcode_channel();
        let mut channel = CameraChannel::new(camera, sink);

        channel.open().await.unwrap();
        channel.close().await;
        channel.close().await;
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(channel.state(), ScanSessionState::Closed);
    }

    #[tokio::test]
    async fn test_unavailable_camera_falls_back_to_manual() {
        let (sink, mut stream) = barcode_channel();
        let mut channel = CameraChannel::new(UnavailableCamera::new("no camera"), sink);

        let err = channel.open().await.unwrap_err();
        assert!(matches!(err, CoreError::CameraUnavailable { .. }));
        assert!(channel.is_manual_entry());

        assert_eq!(
            channel.submit_manual("  ").await.unwrap_err(),
            CoreError::EmptyBarcode
        );
        assert!(stream.try_next().is_none());

        channel.submit_manual(" 777 ").await.unwrap();
        let barcode = stream.try_next().unwrap();
        assert_eq!(barcode.code, "777");
        assert_eq!(barcode.origin, BarcodeOrigin::Manual);
    }

    #[tokio::test]
    async fn test_manual_entry_while_scanning_stops_camera() {
        let (camera, _frames, stops) = fake_camera();
        let (sink, mut stream) = barcode_channel();
        let mut channel = CameraChannel::new(camera, sink);

        channel.open().await.unwrap();
        let barcode = channel.submit_manual("12345").await.unwrap();
        assert_eq!(barcode.code, "12345");
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(channel.state(), ScanSessionState::Closed);
        assert!(channel.scan().await.is_none());

        channel.close().await;
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert_eq!(stream.try_next().unwrap().origin, BarcodeOrigin::Manual);
    }
}
