//! Cancellation for sync operations.

use crate::error::{VaultError, VaultResult};
use std::future::Future;
use tokio::sync::watch;

/// Creates a linked handle and token.
pub fn cancellation() -> (CancelHandle, Cancellation) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, Cancellation { rx: Some(rx) })
}

/// Cancels every [`Cancellation`] cloned from its pair.
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

/// Token threaded through async sync calls.
///
/// Dropping the [`CancelHandle`] without cancelling leaves the token live.
#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    rx: Option<watch::Receiver<bool>>,
}

impl Cancellation {
    /// A token that is never cancelled.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_cancelled(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Fails with [`VaultError::Cancelled`] once cancelled.
    pub fn check(&self) -> VaultResult<()> {
        if self.is_cancelled() {
            return Err(VaultError::Cancelled);
        }
        Ok(())
    }

    /// Resolves when cancelled.
    pub async fn cancelled(&self) {
        let Some(rx) = &self.rx else {
            return std::future::pending().await;
        };
        let mut rx = rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }

    /// Runs `fut` unless cancelled first.
    pub async fn run<F: Future>(&self, fut: F) -> VaultResult<F::Output> {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(VaultError::Cancelled),
            out = fut => Ok(out),
        }
    }
}
