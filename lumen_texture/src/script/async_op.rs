/// Scripting-side wrapper over a pending GPU readback
///
/// Scripts poll `is_complete()` once per frame and read `return_value()`
/// after completion, or call `block_until_complete()`.

use std::sync::{Condvar, Mutex, MutexGuard, OnceLock};

use crate::error::Result;
use crate::pixel::Surface;
use crate::transfer::{PendingReadback, ReadbackState};
use crate::{engine_bail, engine_err, engine_warn};

const SOURCE: &str = "lumen::AsyncOp";

/// Asynchronous operation returned by `ScriptTexture::get_gpu_pixels`
#[derive(Debug)]
pub struct AsyncOp {
    /// None while a thread is blocked in `block_until_complete`
    readback: Mutex<Option<PendingReadback>>,
    outcome: OnceLock<Result<Surface>>,
    settled: Condvar,
}

impl AsyncOp {
    pub(crate) fn new(readback: PendingReadback) -> Self {
        Self {
            readback: Mutex::new(Some(readback)),
            outcome: OnceLock::new(),
            settled: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Option<PendingReadback>>> {
        self.readback.lock()
            .map_err(|_| engine_err!(SOURCE, "Readback lock poisoned"))
    }

    fn outcome_state(&self) -> Option<ReadbackState> {
        self.outcome.get().map(|outcome| match outcome {
            Ok(_) => ReadbackState::Completed,
            Err(_) => ReadbackState::Failed,
        })
    }

    /// Record the outcome and wake threads waiting on it
    fn settle(&self, outcome: Result<Surface>) -> Result<Surface> {
        let _ = self.outcome.set(outcome.clone());
        // Taking the lock orders the wakeup after any waiter's predicate check
        drop(self.lock()?);
        self.settled.notify_all();
        outcome
    }

    /// Current state, without blocking
    pub fn state(&self) -> Result<ReadbackState> {
        if let Some(state) = self.outcome_state() {
            return Ok(state);
        }
        let mut guard = self.lock()?;
        let Some(readback) = guard.as_mut() else {
            // Another thread is blocked on the readback
            return Ok(self.outcome_state().unwrap_or(ReadbackState::Pending));
        };
        if let Some(outcome) = readback.try_result() {
            let _ = self.outcome.set(outcome);
        }
        Ok(self.outcome_state().unwrap_or(ReadbackState::Pending))
    }

    /// True once the readback has completed or failed
    ///
    /// An unreadable state counts as complete so polling loops terminate;
    /// `return_value()` then reports the error.
    pub fn is_complete(&self) -> bool {
        match self.state() {
            Ok(state) => state != ReadbackState::Pending,
            Err(e) => {
                engine_warn!(SOURCE, "Treating readback as complete after error: {}", e);
                true
            }
        }
    }

    /// The read surface, or the readback's failure
    ///
    /// # Errors
    ///
    /// * `UsageError` - the operation is still pending
    /// * `SynchronizationFailure` - the readback failed
    pub fn return_value(&self) -> Result<Surface> {
        self.state()?;
        match self.outcome.get() {
            Some(outcome) => outcome.clone(),
            None => engine_bail!(SOURCE, UsageError,
                "return value requested before the operation completed"),
        }
    }

    /// Block the calling thread until the readback settles
    ///
    /// Other threads can keep polling `is_complete()` meanwhile.
    pub fn block_until_complete(&self) -> Result<Surface> {
        let mut guard = self.lock()?;
        loop {
            if let Some(outcome) = self.outcome.get() {
                return outcome.clone();
            }
            if let Some(mut readback) = guard.take() {
                drop(guard);
                return self.settle(readback.wait());
            }
            guard = self.settled
                .wait_while(guard, |readback| readback.is_none() && self.outcome.get().is_none())
                .map_err(|_| engine_err!(SOURCE, "Readback lock poisoned"))?;
        }
    }
}

impl From<PendingReadback> for AsyncOp {
    fn from(readback: PendingReadback) -> Self {
        Self::new(readback)
    }
}

#[cfg(test)]
#[path = "async_op_tests.rs"]
mod tests;
