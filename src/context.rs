//! A small cancellation/deadline token threaded through every component call, playing the role a
//! `ctx` parameter plays on the node store. The core here is blocking and synchronous, so this is
//! a pollable flag rather than an async-cancellation future.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::Error;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

/// Carries cancellation and/or a deadline across a call chain into the chunk store and pointer
/// service. Cheap to clone; all clones observe the same cancellation flag.
#[derive(Debug, Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    /// A context with no deadline that is never cancelled unless [`Context::cancel`] is called.
    pub fn background() -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline: None,
            }),
        }
    }

    /// A context that is considered done once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                cancelled: AtomicBool::new(false),
                deadline: Some(Instant::now() + timeout),
            }),
        }
    }

    /// Marks this context (and all its clones) cancelled.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
    }

    /// True if the context has been explicitly cancelled or its deadline has elapsed.
    pub fn is_done(&self) -> bool {
        if self.inner.cancelled.load(Ordering::SeqCst) {
            return true;
        }
        matches!(self.inner.deadline, Some(d) if Instant::now() >= d)
    }

    /// Returns `Err(Error::Cancelled)` if the context is done, `Ok(())` otherwise. Components
    /// call this at each suspension point before blocking on collaborator I/O.
    pub fn check(&self) -> Result<(), Error> {
        if self.is_done() {
            Err(Error::Cancelled)
        } else {
            Ok(())
        }
    }
}
