//! # Keyboard Shortcuts
//!
//! ```text
//!   F1 ──► focus product search
//!   F2 ──► open the barcode scanner dialog
//!   F3 ──► submit checkout      (only while checkout is enabled)
//!   F4 ──► clear cart           (only after the cashier confirms)
//! ```
//!
//! Resolution is separate from execution: [`Shortcut::resolve`] drops a
//! shortcut whose precondition does not hold, and the register runs what
//! is left.

use std::str::FromStr;

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    FocusSearch,
    OpenScanner,
    SubmitCheckout,
    ClearCart,
}

/// What the register knows at the moment a shortcut key is pressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortcutContext {
    /// Cart has lines and no sale is being submitted.
    pub checkout_enabled: bool,
    /// The cashier answered yes to "clear the cart?".
    pub clear_confirmed: bool,
}

impl Shortcut {
    /// Maps a key name (`"F1"`..`"F4"`, case-insensitive) to a shortcut.
    pub fn from_key(key: &str) -> Option<Self> {
        match key.trim().to_ascii_uppercase().as_str() {
            "F1" => Some(Shortcut::FocusSearch),
            "F2" => Some(Shortcut::OpenScanner),
            "F3" => Some(Shortcut::SubmitCheckout),
            "F4" => Some(Shortcut::ClearCart),
            _ => None,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            Shortcut::FocusSearch => "F1",
            Shortcut::OpenScanner => "F2",
            Shortcut::SubmitCheckout => "F3",
            Shortcut::ClearCart => "F4",
        }
    }

    /// Returns the shortcut if its precondition holds, `None` otherwise.
    pub fn resolve(self, context: ShortcutContext) -> Option<Self> {
        let allowed = match self {
            Shortcut::FocusSearch | Shortcut::OpenScanner => true,
            Shortcut::SubmitCheckout => context.checkout_enabled,
            Shortcut::ClearCart => context.clear_confirmed,
        };
        allowed.then_some(self)
    }
}

impl FromStr for Shortcut {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Shortcut::from_key(s).ok_or_else(|| ValidationError::NotAllowed {
            field: "shortcut".to_string(),
            allowed: ["F1", "F2", "F3", "F4"].iter().map(|k| k.to_string()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(Shortcut::from_key("F1"), Some(Shortcut::FocusSearch));
        assert_eq!(Shortcut::from_key("f2"), Some(Shortcut::OpenScanner));
        assert_eq!("F3".parse::<Shortcut>().unwrap(), Shortcut::SubmitCheckout);
        assert_eq!(Shortcut::from_key("F4"), Some(Shortcut::ClearCart));
        assert!(Shortcut::from_key("F5").is_none());
        assert_eq!(Shortcut::ClearCart.key(), "F4");
    }

    #[test]
    fn test_preconditions() {
        let idle = ShortcutContext::default();
        assert_eq!(Shortcut::FocusSearch.resolve(idle), Some(Shortcut::FocusSearch));
        assert_eq!(Shortcut::OpenScanner.resolve(idle), Some(Shortcut::OpenScanner));
        assert_eq!(Shortcut::SubmitCheckout.resolve(idle), None);
        assert_eq!(Shortcut::ClearCart.resolve(idle), None);

        let ready = ShortcutContext {
            checkout_enabled: true,
            clear_confirmed: true,
        };
        assert_eq!(Shortcut::SubmitCheckout.resolve(ready), Some(Shortcut::SubmitCheckout));
        assert_eq!(Shortcut::ClearCart.resolve(ready), Some(Shortcut::ClearCart));
    }
}
