/// Pending GPU readback - the future side of an asynchronous pixel read
///
/// A readback is created pending and settles exactly once, either with the
/// surface contents or with a `SynchronizationFailure`. Callers poll it
/// (`poll_state`, `try_result`), block on it (`wait`), or `.await` it.
/// Dropping it discards the result; the GPU copy still runs to completion.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::channel::oneshot;
use futures::FutureExt;

use crate::engine_err;
use crate::error::{Error, Result};
use crate::pixel::Surface;

/// Observable state of a readback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadbackState {
    Pending,
    Completed,
    Failed,
}

/// Backend half of a readback. Consuming it is the one terminal transition.
pub(crate) struct ReadbackSender {
    sender: oneshot::Sender<Result<Surface>>,
}

impl ReadbackSender {
    pub(crate) fn complete(self, surface: Surface) {
        // Receiver gone means the caller discarded the future
        let _ = self.sender.send(Ok(surface));
    }

    pub(crate) fn fail(self, error: Error) {
        let _ = self.sender.send(Err(error));
    }
}

/// In-flight asynchronous GPU pixel read
pub struct PendingReadback {
    receiver: Option<oneshot::Receiver<Result<Surface>>>,
    outcome: Option<Result<Surface>>,
}

impl PendingReadback {
    /// Create a connected sender/readback pair
    pub(crate) fn channel() -> (ReadbackSender, PendingReadback) {
        let (sender, receiver) = oneshot::channel();
        (
            ReadbackSender { sender },
            PendingReadback { receiver: Some(receiver), outcome: None },
        )
    }

    fn settle(&mut self, outcome: Result<Surface>) {
        self.receiver = None;
        self.outcome = Some(outcome);
    }

    fn abandoned() -> Error {
        engine_err!("lumen::PendingReadback", SynchronizationFailure,
            "readback was dropped by the GPU queue before completing")
    }

    fn state(&self) -> ReadbackState {
        match &self.outcome {
            None => ReadbackState::Pending,
            Some(Ok(_)) => ReadbackState::Completed,
            Some(Err(_)) => ReadbackState::Failed,
        }
    }

    /// Check for completion without blocking
    pub fn poll_state(&mut self) -> ReadbackState {
        if self.outcome.is_none() {
            if let Some(receiver) = self.receiver.as_mut() {
                match receiver.try_recv() {
                    Ok(Some(outcome)) => self.settle(outcome),
                    Ok(None) => {}
                    Err(oneshot::Canceled) => self.settle(Err(Self::abandoned())),
                }
            }
        }
        self.state()
    }

    pub fn is_pending(&mut self) -> bool {
        self.poll_state() == ReadbackState::Pending
    }

    /// The outcome if settled, None while pending
    pub fn try_result(&mut self) -> Option<Result<Surface>> {
        self.poll_state();
        self.outcome.clone()
    }

    /// Block the calling thread until the readback settles
    pub fn wait(&mut self) -> Result<Surface> {
        futures::executor::block_on(self)
    }
}

impl Future for PendingReadback {
    type Output = Result<Surface>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if let Some(outcome) = &this.outcome {
            return Poll::Ready(outcome.clone());
        }
        let Some(receiver) = this.receiver.as_mut() else {
            return Poll::Ready(Err(Self::abandoned()));
        };
        let outcome = match receiver.poll_unpin(cx) {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(outcome)) => outcome,
            Poll::Ready(Err(oneshot::Canceled)) => Err(Self::abandoned()),
        };
        this.settle(outcome.clone());
        Poll::Ready(outcome)
    }
}

impl std::fmt::Debug for PendingReadback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingReadback")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
#[path = "readback_tests.rs"]
mod tests;
