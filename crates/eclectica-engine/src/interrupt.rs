use log::{debug, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancels its token when the process receives Ctrl+C. Dropping the guard
/// stops listening.
#[derive(Debug)]
pub struct InterruptGuard {
    token: CancellationToken,
    listener: JoinHandle<()>,
}

impl InterruptGuard {
    /// Start listening. Must be called inside a tokio runtime.
    #[must_use]
    pub fn arm() -> Self {
        let token = CancellationToken::new();
        let cancel = token.clone();
        let listener = tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    warn!("Interrupt received, rolling back");
                    cancel.cancel();
                }
                Err(error) => warn!("Failed to listen for interrupts: {error}"),
            }
        });
        debug!("Interrupt listener armed");
        Self { token, listener }
    }

    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        self.listener.abort();
        debug!("Interrupt listener disarmed");
    }
}
