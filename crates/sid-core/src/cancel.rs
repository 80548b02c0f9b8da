use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{SidError, SidResult};

/// Jeton d'annulation coopératif partagé entre threads.
///
/// Les boucles longues (évaluation par lots, parcours du store) appellent
/// [`CancelToken::check`] entre deux unités de travail. Clonable, `Send + Sync`.
///
/// # Example
/// ```
/// use sid_core::cancel::CancelToken;
/// let token = CancelToken::new();
/// let handle = token.clone();
/// assert!(token.check().is_ok());
/// handle.cancel();
/// assert!(token.is_cancelled());
/// assert!(token.check().is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    /// Jeton non annulé.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Demande l'arrêt. Idempotent.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// `true` une fois `cancel()` appelé.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    /// Returns `Err(Cancelled)` once the token has been cancelled.
    ///
    /// # Errors
    /// `SidError::Cancelled` after [`CancelToken::cancel`].
    #[inline]
    pub fn check(&self) -> SidResult<()> {
        if self.is_cancelled() {
            Err(SidError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_is_visible_across_threads() {
        let token = CancelToken::new();
        let remote = token.clone();
        std::thread::spawn(move || remote.cancel())
            .join()
            .unwrap();
        assert!(matches!(token.check(), Err(SidError::Cancelled)));
    }
}
