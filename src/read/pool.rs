//! Free-list of reader buffers shared across decode calls.

use std::io::Read;
use std::sync::{Mutex, PoisonError};

use super::{DEFAULT_CAPACITY, Reader};

/// Idle buffers kept by the global pool.
pub const POOL_LIMIT: usize = 64;

/// Buffers that grew beyond this size are released instead of pooled.
pub const MAX_POOLED_CAPACITY: usize = 1 << 20;

/// Thread-safe pool recycling the backing storage of [`Reader`]s.
///
/// Checkout hands out a reader with an empty window and no sticky error,
/// built on a recycled buffer when one is idle. Checkin takes the reader
/// back, keeps its buffer for the next checkout and returns the source.
pub struct ReaderPool {
    free: Mutex<Vec<Vec<u8>>>,
    limit: usize,
}

impl ReaderPool {
    pub const fn new(limit: usize) -> Self {
        Self {
            free: Mutex::new(Vec::new()),
            limit,
        }
    }

    /// Process-wide pool used by [`crate::decode`] and the JSON bridge.
    pub fn global() -> &'static ReaderPool {
        static GLOBAL: ReaderPool = ReaderPool::new(POOL_LIMIT);
        &GLOBAL
    }

    pub fn checkout<R: Read>(&self, source: R) -> Reader<'static, R> {
        let recycled = self.lock().pop();
        let buf = match recycled {
            Some(buf) => {
                tracing::trace!(capacity = buf.len(), "reusing pooled reader buffer");
                buf
            }
            None => {
                tracing::trace!(capacity = DEFAULT_CAPACITY, "allocating reader buffer");
                vec![0; DEFAULT_CAPACITY]
            }
        };
        Reader::from_buffer(source, buf)
    }

    /// Returns `reader`'s buffer to the pool and hands back its source.
    /// The reader cannot be used afterwards. Readers over a borrowed slice
    /// have no buffer to return.
    pub fn checkin<R: Read>(&self, reader: Reader<'_, R>) -> R {
        let (source, buf) = reader.into_parts();
        let Some(buf) = buf else {
            return source;
        };
        if buf.len() > MAX_POOLED_CAPACITY {
            tracing::trace!(capacity = buf.len(), "dropping oversized reader buffer");
            return source;
        }

        let mut free = self.lock();
        if free.len() < self.limit {
            free.push(buf);
        } else {
            tracing::trace!(limit = self.limit, "reader pool full, dropping buffer");
        }
        source
    }

    /// Number of idle buffers.
    pub fn idle(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<u8>>> {
        // The free-list stays consistent even if a holder panicked.
        self.free.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
