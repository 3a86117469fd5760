//! Secure secret types with automatic memory zeroing
//!
//! - [`SecureSecret`]: a wrapper around `secrecy::SecretString` that auto-zeros on drop
//! - [`SecretHandle`]: a named secret handed to downstream consumers

use secrecy::{ExposeSecret, SecretString};

/// A secret value with automatic memory zeroing on drop.
///
/// This type wraps `secrecy::SecretString` to ensure:
/// - Secret values are zeroed from memory when dropped
/// - Debug and Display output show `[REDACTED]` instead of the actual value
/// - Explicit `.expose()` call required to access the value
#[derive(Clone)]
pub struct SecureSecret {
    inner: SecretString,
}

impl SecureSecret {
    /// Create a new secure secret from a string.
    ///
    /// The string value is moved into secure storage and will be
    /// automatically zeroed when this `SecureSecret` is dropped.
    #[must_use]
    pub fn new(value: String) -> Self {
        Self {
            inner: SecretString::from(value),
        }
    }

    /// Expose the secret value for use.
    ///
    /// The caller must ensure the exposed value is not logged, not persisted,
    /// and only used for the immediate operation (e.g. setting a child
    /// process environment variable).
    #[must_use]
    pub fn expose(&self) -> &str {
        self.inner.expose_secret()
    }

    /// Get the length of the secret value without exposing it.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.expose_secret().len()
    }

    /// Check if the secret value is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.expose_secret().is_empty()
    }
}

impl std::fmt::Debug for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl std::fmt::Display for SecureSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// An opaque secret reference tagged with a name.
///
/// Lookups return a handle instead of a bare string so the value travels
/// with its name (the field title, or `rotationSpecs`) and cannot end up in
/// logs by accident.
#[derive(Clone)]
pub struct SecretHandle {
    name: String,
    secret: SecureSecret,
}

impl SecretHandle {
    /// Wrap a plaintext value under the given name.
    #[must_use]
    pub fn new(name: impl Into<String>, plaintext: String) -> Self {
        Self {
            name: name.into(),
            secret: SecureSecret::new(plaintext),
        }
    }

    /// Name the secret was registered under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expose the plaintext value. See [`SecureSecret::expose`].
    #[must_use]
    pub fn expose(&self) -> &str {
        self.secret.expose()
    }

    /// Consume the handle, keeping only the secret.
    #[must_use]
    pub fn into_secret(self) -> SecureSecret {
        self.secret
    }
}

impl std::fmt::Debug for SecretHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretHandle")
            .field("name", &self.name)
            .field("len", &self.secret.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secure_secret_debug_is_redacted() {
        let secret = SecureSecret::new("my-super-secret-password".to_string());
        let debug_output = format!("{secret:?}");
        assert_eq!(debug_output, "[REDACTED]");
        assert!(!debug_output.contains("password"));
    }

    #[test]
    fn secure_secret_display_is_redacted() {
        let secret = SecureSecret::new("my-super-secret-password".to_string());
        assert_eq!(format!("{secret}"), "[REDACTED]");
    }

    #[test]
    fn secure_secret_expose_returns_value() {
        let secret = SecureSecret::new("test-value".to_string());
        assert_eq!(secret.expose(), "test-value");
    }

    #[test]
    fn secure_secret_len_works() {
        let secret = SecureSecret::new("12345".to_string());
        assert_eq!(secret.len(), 5);
        assert!(!secret.is_empty());
        assert!(SecureSecret::new(String::new()).is_empty());
    }

    #[test]
    fn secret_handle_keeps_name_and_value() {
        let handle = SecretHandle::new("password", "xyz".to_string());
        assert_eq!(handle.name(), "password");
        assert_eq!(handle.expose(), "xyz");
        assert_eq!(handle.into_secret().expose(), "xyz");
    }

    #[test]
    fn secret_handle_debug_hides_value() {
        let handle = SecretHandle::new("password", "hunter2-hunter2".to_string());
        let debug_output = format!("{handle:?}");
        assert!(debug_output.contains("password"));
        assert!(debug_output.contains("len"));
        assert!(!debug_output.contains("hunter2"));
    }
}
