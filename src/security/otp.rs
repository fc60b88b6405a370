//! One-time password handling
//!
//! The OTP is held in a [`SecretString`] so it never ends up in `Debug`
//! output, logs, or the dry-run command preview.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

/// Mask shown wherever the OTP would otherwise be printed
pub const OTP_MASK: &str = "******";

/// A two-factor one-time password passed through to the registry CLI
#[derive(Clone)]
pub struct Otp(SecretString);

impl Otp {
    /// Wrap a code, returning `None` for blank input
    ///
    /// ```
    /// use release_publisher::security::Otp;
    ///
    /// assert!(Otp::new("123456").is_some());
    /// assert!(Otp::new("  ").is_none());
    /// ```
    pub fn new(code: impl Into<String>) -> Option<Self> {
        let code = code.into();
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        Some(Self(SecretString::new(code.into())))
    }

    /// The raw code, for handing to the child process only
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Otp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Otp({})", OTP_MASK)
    }
}
