use std::io;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::debug;

use crate::array::NdArray;
use crate::consts::INVOKE_THREAD_NAME;
use crate::invoke::{invoke, InvocationError};
use crate::loader::ValidatedAlgorithm;
use crate::provider::{CallContext, CancelToken};

pub type InvocationResult = Result<NdArray, InvocationError>;

/// An invocation running on its own thread.
///
/// Cancelling only sets a flag: the algorithm stops at its next check, and
/// a result that arrives after cancellation is reported as `Cancelled`.
pub struct InvocationHandle {
    algorithm: String,
    cancel: CancelToken,
    rx: mpsc::Receiver<InvocationResult>,
    thread: Option<JoinHandle<()>>,
    finished: bool,
}

/// Spawn a thread that runs `algorithm` on `image` with the given parameter
/// texts and sends back the outcome.
pub fn spawn_invocation(
    algorithm: ValidatedAlgorithm,
    image: NdArray,
    texts: Vec<Option<String>>,
) -> io::Result<InvocationHandle> {
    let (tx, rx) = mpsc::channel::<InvocationResult>();
    let cancel = CancelToken::new();
    let ctx = CallContext::new(cancel.clone());
    let name = algorithm.name.clone();

    let thread = std::thread::Builder::new()
        .name(INVOKE_THREAD_NAME.into())
        .spawn(move || {
            let _ = tx.send(invoke(&algorithm, &image, &texts, &ctx));
        })?;

    debug!(algorithm = %name, "Invocation thread started");
    Ok(InvocationHandle {
        algorithm: name,
        cancel,
        rx,
        thread: Some(thread),
        finished: false,
    })
}

impl InvocationHandle {
    pub fn algorithm_name(&self) -> &str {
        &self.algorithm
    }

    pub fn cancel(&self) {
        debug!(algorithm = %self.algorithm, "Cancelling invocation");
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
            || self
                .thread
                .as_ref()
                .map_or(true, |thread| thread.is_finished())
    }

    /// Non-blocking poll. Returns the outcome once, then `None`.
    pub fn try_result(&mut self) -> Option<InvocationResult> {
        if self.finished {
            return None;
        }
        let result = match self.rx.try_recv() {
            Ok(result) => result,
            Err(mpsc::TryRecvError::Empty) => return None,
            Err(mpsc::TryRecvError::Disconnected) => self.lost(),
        };
        Some(self.finish(result))
    }

    /// Block until the invocation ends.
    pub fn wait(mut self) -> InvocationResult {
        if self.finished {
            return self.lost();
        }
        let result = self.rx.recv().unwrap_or_else(|_| self.lost());
        self.finish(result)
    }

    /// Block for at most `timeout`. `None` if the invocation is still running.
    pub fn wait_timeout(&mut self, timeout: Duration) -> Option<InvocationResult> {
        if self.finished {
            return None;
        }
        let result = match self.rx.recv_timeout(timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => return None,
            Err(mpsc::RecvTimeoutError::Disconnected) => self.lost(),
        };
        Some(self.finish(result))
    }

    fn finish(&mut self, result: InvocationResult) -> InvocationResult {
        self.finished = true;
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        result
    }

    fn lost(&self) -> InvocationResult {
        Err(InvocationError::WorkerLost(self.algorithm.clone()))
    }
}
