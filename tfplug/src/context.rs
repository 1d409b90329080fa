//! Request-scoped cancellation and deadlines
//!
//! Every async trait method takes a `Context` first. Remote calls race against
//! `cancelled()` so an operation aborted by Terraform stops promptly.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time;

#[derive(Clone)]
pub struct Context {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    deadline: Option<Instant>,
    done: Arc<watch::Sender<bool>>,
}

impl Context {
    pub fn new() -> Self {
        let (done, _) = watch::channel(false);
        Self {
            inner: Arc::new(ContextInner {
                deadline: None,
                done: Arc::new(done),
            }),
        }
    }

    /// Derives a context that is cancelled once `timeout` elapses.
    /// The derived context shares its cancellation signal with `self`.
    /// Must be called inside a tokio runtime.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        let deadline = Instant::now() + timeout;
        let deadline = match self.inner.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };

        let done = Arc::clone(&self.inner.done);
        let timer = Arc::clone(&done);
        tokio::spawn(async move {
            time::sleep_until(time::Instant::from_std(deadline)).await;
            timer.send_replace(true);
        });

        Self {
            inner: Arc::new(ContextInner {
                deadline: Some(deadline),
                done,
            }),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.inner.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        *self.inner.done.borrow()
    }

    pub fn cancel(&self) {
        self.inner.done.send_replace(true);
    }

    /// Receiver that flips to `true` on cancellation
    pub fn done(&self) -> watch::Receiver<bool> {
        self.inner.done.subscribe()
    }

    /// Resolves once the context is cancelled
    pub async fn cancelled(&self) {
        let mut done = self.done();
        // The sender lives as long as `self`, so this only returns on cancel.
        let _ = done.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
