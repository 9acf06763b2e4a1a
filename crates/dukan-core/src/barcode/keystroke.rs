//! # Hardware Scanner Detection
//!
//! USB and Bluetooth scanners present themselves as keyboards: a scan is
//! the code typed in a burst, then Enter. This detector tells those bursts
//! apart from a person typing.
//!
//! ## Timing Heuristic
//! ```text
//!  scanner:  6 2 2 1 0 3 1 ⏎      gaps ≈ 5-20ms   ──► emit "6221031"
//!  person:   1   2     3   4 ⏎    gaps > 100ms    ──► buffer keeps resetting
//!
//!  key arrives
//!      │
//!      ├── gap since previous key > max_gap ──► buffer cleared
//!      │
//!      ├── Enter ──► len ≥ min_length AND target not a text field?
//!      │                 yes ──► emit buffer
//!      │             buffer cleared either way
//!      │
//!      └── char ──► appended; buffer over max_buffer ──► cleared
//! ```
//!
//! Time comes in with each keystroke, so the detector never reads a clock.

use std::time::{Duration, Instant};

use tracing::{debug, trace};

use super::{AcquiredBarcode, BarcodeOrigin};
use crate::{SCANNER_KEYSTROKE_GAP_MS, SCANNER_MAX_BUFFER, SCANNER_MIN_LENGTH};

/// A key as delivered by a keypress listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
}

/// Where the keystroke landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTarget {
    TextInput,
    TextArea,
    /// Anything else: the page body, a button, the terminal prompt.
    Other,
}

impl KeyTarget {
    pub fn is_text_field(&self) -> bool {
        matches!(self, KeyTarget::TextInput | KeyTarget::TextArea)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keystroke {
    pub key: Key,
    pub target: KeyTarget,
    pub at: Instant,
}

impl Keystroke {
    pub fn new(key: Key, target: KeyTarget, at: Instant) -> Self {
        Keystroke { key, target, at }
    }
}

/// Thresholds for the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerTuning {
    /// Longest gap between keys that still counts as one burst.
    pub max_gap: Duration,
    /// Fewest characters that make a scan.
    pub min_length: usize,
    /// The buffer is dropped once it holds more than this.
    pub max_buffer: usize,
}

impl Default for ScannerTuning {
    fn default() -> Self {
        ScannerTuning {
            max_gap: Duration::from_millis(SCANNER_KEYSTROKE_GAP_MS),
            min_length: SCANNER_MIN_LENGTH,
            max_buffer: SCANNER_MAX_BUFFER,
        }
    }
}

#[derive(Debug, Default)]
pub struct KeystrokeDetector {
    tuning: ScannerTuning,
    buffer: String,
    buffered_chars: usize,
    last_key_at: Option<Instant>,
}

impl KeystrokeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tuning(tuning: ScannerTuning) -> Self {
        KeystrokeDetector {
            tuning,
            ..Self::default()
        }
    }

    /// Feeds one keystroke. Returns a barcode when a burst completes.
    pub fn on_keystroke(&mut self, keystroke: Keystroke) -> Option<AcquiredBarcode> {
        if let Some(last) = self.last_key_at {
            if keystroke.at.saturating_duration_since(last) > self.tuning.max_gap {
                if !self.buffer.is_empty() {
                    trace!(discarded = self.buffered_chars, "Keystroke gap, buffer reset");
                }
                self.clear();
            }
        }
        self.last_key_at = Some(keystroke.at);

        match keystroke.key {
            Key::Enter => {
                let qualifies = self.buffered_chars >= self.tuning.min_length
                    && !keystroke.target.is_text_field();
                let code = std::mem::take(&mut self.buffer);
                self.buffered_chars = 0;

                if qualifies {
                    debug!(barcode = %code, "Hardware scanner burst detected");
                    Some(AcquiredBarcode::new(code, BarcodeOrigin::HardwareScanner))
                } else {
                    None
                }
            }
            Key::Char(c) => {
                self.buffer.push(c);
                self.buffered_chars += 1;
                if self.buffered_chars > self.tuning.max_buffer {
                    trace!("Keystroke buffer overflow, cleared");
                    self.clear();
                }
                None
            }
        }
    }

    /// Characters accumulated so far.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.buffered_chars = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Typist {
        detector: KeystrokeDetector,
        now: Instant,
    }

    impl Typist {
        fn new() -> Self {
            Typist {
                detector: KeystrokeDetector::new(),
                now: Instant::now(),
            }
        }

        fn key(&mut self, key: Key, after_ms: u64, target: KeyTarget) -> Option<AcquiredBarcode> {
            self.now += Duration::from_millis(after_ms);
            self.detector.on_keystroke(Keystroke::new(key, target, self.now))
        }

        fn burst(&mut self, text: &str, gap_ms: u64) {
            for c in text.chars() {
                assert!(self.key(Key::Char(c), gap_ms, KeyTarget::Other).is_none());
            }
        }
    }

    #[test]
    fn test_fast_burst_emits() {
        let mut typist = Typist::new();
        typist.burst("1234", 20);
        let barcode = typist.key(Key::Enter, 20, KeyTarget::Other).unwrap();
        assert_eq!(barcode.code, "1234");
        assert_eq!(barcode.origin, BarcodeOrigin::HardwareScanner);
        assert_eq!(typist.detector.buffer(), "");
    }

    #[test]
    fn test_slow_gap_resets() {
        let mut typist = Typist::new();
        typist.burst("12", 20);
        typist.key(Key::Char('3'), 150, KeyTarget::Other);
        typist.key(Key::Char('4'), 20, KeyTarget::Other);
        assert_eq!(typist.detector.buffer(), "34");
        assert!(typist.key(Key::Enter, 20, KeyTarget::Other).is_none());
    }

    #[test]
    fn test_gap_of_exactly_max_does_not_reset() {
        let mut typist = Typist::new();
        typist.burst("1234", 100);
        assert!(typist.key(Key::Enter, 100, KeyTarget::Other).is_some());
    }

    #[test]
    fn test_slow_enter_resets() {
        let mut typist = Typist::new();
        typist.burst("123456", 10);
        assert!(typist.key(Key::Enter, 250, KeyTarget::Other).is_none());
    }

    #[test]
    fn test_short_burst_ignored() {
        let mut typist = Typist::new();
        typist.burst("123", 10);
        assert!(typist.key(Key::Enter, 10, KeyTarget::Other).is_none());
        assert_eq!(typist.detector.buffer(), "");
    }

    #[test]
    fn test_text_field_enter_never_scans() {
        let mut typist = Typist::new();
        typist.burst("12345678", 10);
        assert!(typist.key(Key::Enter, 10, KeyTarget::TextInput).is_none());

        typist.burst("12345678", 10);
        assert!(typist.key(Key::Enter, 10, KeyTarget::TextArea).is_none());
    }

    #[test]
    fn test_overflow_clears_buffer() {
        let mut typist = Typist::new();
        typist.burst(&"7".repeat(51), 5);
        assert_eq!(typist.detector.buffer(), "");

        typist.burst("1234", 5);
        assert_eq!(typist.key(Key::Enter, 5, KeyTarget::Other).unwrap().code, "1234");
    }

    #[test]
    fn test_custom_tuning() {
        let mut detector = KeystrokeDetector::with_tuning(ScannerTuning {
            max_gap: Duration::from_millis(30),
            min_length: 2,
            max_buffer: 10,
        });
        let t0 = Instant::now();
        detector.on_keystroke(Keystroke::new(Key::Char('9'), KeyTarget::Other, t0));
        detector.on_keystroke(Keystroke::new(
            Key::Char('8'),
            KeyTarget::Other,
            t0 + Duration::from_millis(20),
        ));
        let barcode = detector.on_keystroke(Keystroke::new(
            Key::Enter,
            KeyTarget::Other,
            t0 + Duration::from_millis(40),
        ));
        assert_eq!(barcode.unwrap().code, "98");
    }
}
