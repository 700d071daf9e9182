//! Cooperative cancellation token.
//!
//! A [`Cancel`] is cloned into whatever delivers the stop request (a signal
//! handler, a test) and passed by reference to every blocking session
//! operation, which races its own future against [`Cancel::cancelled`].

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::error::{Error, Result};

/// Cloneable cancellation flag with async notification.
#[derive(Debug, Clone)]
pub struct Cancel {
    /// Shared flag; `true` once cancelled.
    tx: Arc<watch::Sender<bool>>,
}

impl Default for Cancel {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancel {
    /// Creates an untriggered token.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Completes once cancellation has been requested.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives as long as `self`, so this only returns on `true`.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Runs `fut` to completion unless cancellation wins the race.
    pub async fn run<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            () = self.cancelled() => Err(Error::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Sleeps for `delay`, returning early with [`Error::Cancelled`].
    pub async fn sleep(&self, delay: Duration) -> Result<()> {
        self.run(tokio::time::sleep(delay)).await
    }
}
