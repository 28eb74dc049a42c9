//! Cooperative stop signal
//!
//! A thin wrapper over a `watch` channel carrying "stop requested". Used for
//! process shutdown of the recurring loops and for per-worker stop
//! requests from the supervisor.

use std::future;
use std::time::Duration;
use tokio::sync::watch;

/// Receiving side of a stop request
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

/// Sending side of a stop request
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

/// Creates a connected handle/signal pair
pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

impl StopSignal {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once a stop is requested; never resolves if the sender is gone
    pub async fn stopped(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                future::pending::<()>().await;
            }
        }
    }

    /// Sleeps for `duration`; returns `true` if woken early by a stop request
    pub async fn sleep(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(duration) => self.is_stopped(),
            _ = self.stopped() => true,
        }
    }
}
