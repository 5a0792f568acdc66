use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Shutdown flag for graceful termination.
///
/// The runner polls it between repositories and pages, and every sleep
/// (page pacing, rate limit backoff) wakes up early once it is set.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    requested: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if shutdown has been requested.
    #[inline]
    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Request shutdown and wake every pending sleep.
    pub fn request(&self) {
        self.requested.store(true, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Sleep for `duration` unless shutdown is requested first.
    ///
    /// Returns `false` when the sleep was cut short.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a request in between is not lost
        notified.as_mut().enable();

        if self.is_requested() {
            return false;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = notified => false,
        }
    }

    /// Set up the Ctrl+C handler. A second Ctrl+C exits immediately.
    pub fn install_ctrl_c_handler(&self) {
        let signal = self.clone();

        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_err() {
                tracing::warn!("Failed to install Ctrl+C handler");
                return;
            }

            eprintln!("\nShutdown requested, stopping after the current request...");
            eprintln!("Press Ctrl+C again to force quit.");
            signal.request();

            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("Force quit!");
                std::process::exit(130);
            }
        });
    }
}
