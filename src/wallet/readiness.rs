// src/wallet/readiness.rs
//! One-shot readiness broadcast.
//!
//! The signal starts pending and settles exactly once, either ready or failed.
//! Waiters that subscribe before or after it settles all observe the same
//! outcome; a later attempt to settle it again is ignored.

use crate::error::WalletError;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq)]
pub enum Readiness {
    Pending,
    Ready,
    Failed(WalletError),
}

pub struct ReadySignal {
    tx: watch::Sender<Readiness>,
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadySignal {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Readiness::Pending);
        Self { tx }
    }

    /// Settles the signal. Returns `false` if it had already settled.
    pub fn settle(&self, outcome: Result<(), WalletError>) -> bool {
        self.tx.send_if_modified(|state| {
            if *state != Readiness::Pending {
                return false;
            }
            *state = match &outcome {
                Ok(()) => Readiness::Ready,
                Err(e) => Readiness::Failed(e.clone()),
            };
            true
        })
    }

    pub fn state(&self) -> Readiness {
        self.tx.borrow().clone()
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow() == Readiness::Ready
    }

    /// Waits until the signal settles and returns its outcome.
    pub async fn wait(&self) -> Result<(), WalletError> {
        let mut rx = self.tx.subscribe();
        let settled = rx
            .wait_for(|state| *state != Readiness::Pending)
            .await
            .map(|state| (*state).clone());

        match settled {
            Ok(Readiness::Failed(e)) => Err(e),
            Ok(_) => Ok(()),
            // Unreachable while `self` holds the sender.
            Err(_) => Err(WalletError::IdentityLoad("readiness signal dropped".into())),
        }
    }
}
