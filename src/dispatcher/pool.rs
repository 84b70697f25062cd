//! Anonymous reuse pool for request contexts.
//!
//! Contexts are boxed so that moving them in and out of the free list is a
//! pointer copy. The pool is bounded: once `capacity` idle contexts are held,
//! further releases simply drop the context.

use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use http::Request;
use parking_lot::Mutex;

use super::context::Context;

/// Default number of idle contexts kept for reuse
pub const DEFAULT_POOL_CAPACITY: usize = 1024;

/// Snapshot of pool counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolMetrics {
    /// Contexts created because the free list was empty
    pub allocated: u64,
    /// Acquisitions served from the free list
    pub reused: u64,
    /// Contexts dropped on release because the pool was full
    pub discarded: u64,
    /// Contexts currently idle in the pool
    pub idle: usize,
}

#[derive(Debug)]
pub struct ContextPool {
    free: Mutex<Vec<Box<Context>>>,
    capacity: usize,
    allocated: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

impl Default for ContextPool {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_CAPACITY)
    }
}

impl ContextPool {
    /// Pool holding at most `capacity` idle contexts; `0` disables reuse
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            capacity,
            allocated: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// A context reset for `request`
    pub fn acquire(&self, request: Request<Bytes>) -> Box<Context> {
        let pooled = self.free.lock().pop();
        match pooled {
            Some(mut ctx) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                ctx.reset(request);
                ctx
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                Box::new(Context::new(request))
            }
        }
    }

    /// Return a finished context
    ///
    /// The context is cleared immediately so that the previous request's
    /// body and annotations are not kept alive while idle.
    pub fn release(&self, mut ctx: Box<Context>) {
        ctx.reset(Request::default());
        let mut free = self.free.lock();
        if free.len() < self.capacity {
            free.push(ctx);
        } else {
            drop(free);
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        PoolMetrics {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            idle: self.free.lock().len(),
        }
    }
}
