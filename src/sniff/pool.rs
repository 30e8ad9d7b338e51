//! Reassembly buffers shared across connections.
//!
//! A buffer is only checked out when a single read did not deliver a whole
//! record, and goes back the moment sniffing concludes or the connection
//! goes away. Returned buffers are cleared, so a checkout is always empty.

use std::{
    ops::Deref,
    sync::{Arc, Mutex, OnceLock, PoisonError},
};

use super::parser::MAX_RECORD_BUFFER_LEN;

/// Initial capacity of a reassembly buffer, sized to typical ClientHello
/// records plus a little slack.
pub const DEFAULT_BUFFER_CAPACITY: usize = 512 + 32;

/// A bounded stack of reusable reassembly buffers.
#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    max_buffers: usize,
    buffer_capacity: usize,
}

impl BufferPool {
    /// Creates a pool that keeps at most `max_buffers` idle buffers.
    #[must_use]
    pub fn new(max_buffers: usize) -> Self {
        Self::with_buffer_capacity(max_buffers, DEFAULT_BUFFER_CAPACITY)
    }

    /// Creates a pool whose fresh buffers start with `buffer_capacity` bytes.
    /// The capacity is clamped to the largest record that can be buffered.
    #[must_use]
    pub fn with_buffer_capacity(max_buffers: usize, buffer_capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::with_capacity(max_buffers)),
            max_buffers,
            buffer_capacity: buffer_capacity.min(MAX_RECORD_BUFFER_LEN),
        }
    }

    /// The process-wide pool used when no pool is supplied explicitly.
    pub fn shared() -> Arc<BufferPool> {
        static SHARED: OnceLock<Arc<BufferPool>> = OnceLock::new();
        SHARED.get_or_init(|| Arc::new(BufferPool::default())).clone()
    }

    /// Checks out an empty buffer, allocating one if the pool is empty.
    #[must_use]
    pub fn acquire(self: &Arc<Self>) -> PooledBuffer {
        let buf = self
            .buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(self.buffer_capacity));

        PooledBuffer {
            buf,
            pool: Arc::clone(self),
        }
    }

    fn release(&self, mut buf: Vec<u8>) {
        buf.clear();
        let mut buffers = self.buffers.lock().unwrap_or_else(PoisonError::into_inner);
        if buffers.len() < self.max_buffers {
            buffers.push(buf);
        }
    }

    /// Number of idle buffers currently held.
    #[must_use]
    pub fn available(&self) -> usize {
        self.buffers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn max_buffers(&self) -> usize {
        self.max_buffers
    }

    #[must_use]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        let max_buffers = std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self::new(max_buffers)
    }
}

/// A buffer checked out of a [`BufferPool`]; returned on drop.
#[derive(Debug)]
pub struct PooledBuffer {
    buf: Vec<u8>,
    pool: Arc<BufferPool>,
}

impl PooledBuffer {
    /// Appends as much of `data` as fits under the record ceiling and
    /// returns the number of bytes taken.
    pub fn extend_bounded(&mut self, data: &[u8]) -> usize {
        let room = MAX_RECORD_BUFFER_LEN.saturating_sub(self.buf.len());
        let take = data.len().min(room);
        self.buf.extend_from_slice(&data[..take]);
        take
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }
}

impl Deref for PooledBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.buf
    }
}

impl Drop for PooledBuffer {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buf));
    }
}
