use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::AlgorithmError;

/// Shared cancel flag for one invocation. Cloning shares the flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// What an algorithm can see of the invocation it runs in.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    cancel: CancelToken,
}

impl CallContext {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Cancelled)` once the invocation has been cancelled. Long-running
    /// algorithms call this between iterations.
    pub fn check_cancelled(&self) -> Result<(), AlgorithmError> {
        if self.is_cancelled() {
            Err(AlgorithmError::Cancelled)
        } else {
            Ok(())
        }
    }
}
