//! Access to the webhook secret.
//!
//! The secret is read through [`SecretProvider`] on every request rather than
//! captured at start-up, so it can be swapped without restarting the server and
//! stubbed per test.

use std::sync::{Arc, RwLock};

/// Supplies the shared webhook secret.
pub trait SecretProvider: Send + Sync {
    /// Returns the current webhook secret.
    fn webhook_secret(&self) -> Arc<[u8]>;
}

/// A secret held in memory that can be replaced at runtime.
#[derive(Debug)]
pub struct RotatingSecret {
    current: RwLock<Arc<[u8]>>,
}

impl RotatingSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        RotatingSecret {
            current: RwLock::new(Arc::from(secret.into())),
        }
    }

    /// Replaces the secret. Requests already past authentication are unaffected.
    pub fn rotate(&self, secret: impl Into<Vec<u8>>) {
        let mut current = self
            .current
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *current = Arc::from(secret.into());
    }
}

impl SecretProvider for RotatingSecret {
    fn webhook_secret(&self) -> Arc<[u8]> {
        self.current
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_initial_secret() {
        let secret = RotatingSecret::new("initial");
        assert_eq!(&*secret.webhook_secret(), b"initial");
    }

    #[test]
    fn rotate_replaces_secret() {
        let secret = RotatingSecret::new("initial");
        let before = secret.webhook_secret();

        secret.rotate("rotated");

        assert_eq!(&*secret.webhook_secret(), b"rotated");
        // Handles taken before the rotation keep the old value.
        assert_eq!(&*before, b"initial");
    }

    #[test]
    fn usable_as_trait_object() {
        let provider: Arc<dyn SecretProvider> = Arc::new(RotatingSecret::new(vec![0u8, 1, 2]));
        assert_eq!(&*provider.webhook_secret(), &[0u8, 1, 2]);
    }
}
