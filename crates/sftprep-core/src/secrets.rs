//! Redacting wrapper for credentials such as Hub access tokens.

use std::fmt;

/// A string whose `Debug` and `Display` output never shows the value.
///
/// ```
/// use sftprep_core::SecretString;
///
/// let token = SecretString::new("hf_abcdef");
/// assert_eq!(format!("{token:?}"), "SecretString([REDACTED])");
/// assert_eq!(token.expose_secret(), "hf_abcdef");
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Wrap a secret value.
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Wrap an optional value, treating empty strings as absent.
    pub fn from_option(secret: Option<impl Into<String>>) -> Option<Self> {
        secret.map(Self::new).filter(|s| !s.0.is_empty())
    }

    /// Access the secret value. Do not log the result.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
