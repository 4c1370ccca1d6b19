//! Thin adapter over `std::thread`.
//!
//! Forwards the handful of native-thread properties the worker exposes
//! (name, id, unpark) without adding behavior of its own.

use std::thread::{self, JoinHandle, ThreadId};

use crate::error::Result;

/// The native thread backing one worker run.
#[derive(Debug)]
pub struct NativeThread {
    handle: JoinHandle<()>,
}

impl NativeThread {
    /// Spawn `f` on a new thread with optional name and stack size.
    pub(crate) fn spawn<F>(name: Option<&str>, stack_size: Option<usize>, f: F) -> Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut builder = thread::Builder::new();
        if let Some(name) = name {
            builder = builder.name(name.to_string());
        }
        if let Some(size) = stack_size {
            builder = builder.stack_size(size);
        }
        Ok(Self {
            handle: builder.spawn(f)?,
        })
    }

    pub fn id(&self) -> ThreadId {
        self.handle.thread().id()
    }

    pub fn name(&self) -> Option<&str> {
        self.handle.thread().name()
    }

    /// Wake the thread if it is parked.
    pub fn unpark(&self) {
        self.handle.thread().unpark();
    }

    /// Wait for the thread to exit. Returns `false` if it panicked.
    pub(crate) fn join(self) -> bool {
        self.handle.join().is_ok()
    }
}
