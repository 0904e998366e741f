//! Cooperative cancellation between A names (spec.md §5): the matcher
//! never cancels mid-query, only checks a shared flag between
//! consecutive entries in [`crate::Matcher::match_all_cancellable`].
//!
//! Grounded on `ploke-embed::cancel_token::CancellationToken`: a
//! `tokio::sync::watch`-backed flag with a cheap, cloneable listener
//! handle, trimmed to the one operation the matcher actually needs
//! (`is_cancelled`) since nothing here awaits a cancellation signal the
//! way the teacher's indexer does.
use std::sync::Arc;
use tokio::sync::watch;

/// A cloneable handle that tasks hold to check for cancellation.
#[derive(Clone)]
pub struct CancellationListener {
    receiver: Arc<watch::Receiver<bool>>,
}

/// The handle a caller holds to request cancellation.
pub struct CancellationHandle {
    sender: watch::Sender<bool>,
}

/// Create a fresh, not-yet-cancelled token pair.
pub fn cancellation_token() -> (CancellationListener, CancellationHandle) {
    let (tx, rx) = watch::channel(false);
    (
        CancellationListener {
            receiver: Arc::new(rx),
        },
        CancellationHandle { sender: tx },
    )
}

impl CancellationListener {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

impl CancellationHandle {
    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_is_not_cancelled() {
        let (listener, _handle) = cancellation_token();
        assert!(!listener.is_cancelled());
    }

    #[test]
    fn handle_cancel_is_observed_by_every_clone() {
        let (listener, handle) = cancellation_token();
        let cloned = listener.clone();
        handle.cancel();
        assert!(listener.is_cancelled());
        assert!(cloned.is_cancelled());
    }
}
