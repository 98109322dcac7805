//! Fixed-capacity frame accumulation buffers and the buffer pool.
//!
//! A [`FrameBuffer`] owns a pre-sized byte array and a fill cursor; codecs
//! accumulate one frame's bytes into it without reallocating per call. A
//! [`BufferPool`] keeps a fixed set of such buffers and hands them out by
//! handle, so high-throughput deserialization avoids a large allocation per
//! message. Pooled backing arrays never escape to callers: frames are copied
//! out at their exact size before the buffer is released for reuse.

use log::debug;

/// A growable-once byte buffer for accumulating a single frame.
///
/// Invariant: bytes `[0, len)` are valid accumulated frame data; bytes
/// `[len, capacity)` are undefined. A buffer is never shared between two
/// in-flight deserialize calls.
#[derive(Debug)]
pub struct FrameBuffer {
    data: Box<[u8]>,
    cursor: usize,
}

impl FrameBuffer {
    /// Allocates a buffer able to hold `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity].into_boxed_slice(),
            cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of accumulated bytes.
    pub fn len(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.cursor == 0
    }

    pub fn is_full(&self) -> bool {
        self.cursor == self.data.len()
    }

    /// The accumulated frame data so far.
    pub fn filled(&self) -> &[u8] {
        &self.data[..self.cursor]
    }

    /// The unfilled remainder, for bulk reads. Advance the cursor with
    /// [`advance`](Self::advance) after writing into it.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.cursor..]
    }

    /// Marks `n` more bytes as accumulated.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.data.len() - self.cursor);
        self.cursor += n;
    }

    /// Appends one byte. Returns `false` if the buffer is full.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.cursor == self.data.len() {
            return false;
        }
        self.data[self.cursor] = byte;
        self.cursor += 1;
        true
    }

    /// Rewinds the cursor so the buffer can accumulate a new frame.
    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Copies the accumulated bytes into an exactly-sized vector.
    pub fn to_frame(&self) -> Vec<u8> {
        self.filled().to_vec()
    }

    /// Consumes the buffer, yielding the accumulated bytes. Avoids the copy
    /// when the frame fills the whole backing array.
    pub fn into_frame(self) -> Vec<u8> {
        if self.cursor == self.data.len() {
            self.data.into_vec()
        } else {
            self.filled().to_vec()
        }
    }
}

/// Handle to a checked-out pool buffer. Returned by
/// [`BufferPool::checkout`] and consumed by [`BufferPool::release`].
#[derive(Debug)]
pub struct BufferHandle {
    slot: usize,
}

/// A fixed-capacity pool of pre-sized [`FrameBuffer`]s.
///
/// The pool is an explicit free list over an arena of slots: `checkout`
/// returns a handle (allocating a new slot lazily, up to `limit`), and the
/// buffer goes back with an explicit `release`. When every slot is in use,
/// `checkout` returns `None` and the caller falls back to an unpooled
/// allocation; under the single-reader model, blocking for a free buffer
/// could never be satisfied.
///
/// The free list is not synchronized: a pool belongs to one codec instance,
/// driven by one logical reader at a time.
#[derive(Debug)]
pub struct BufferPool {
    slots: Vec<FrameBuffer>,
    free: Vec<usize>,
    buffer_capacity: usize,
    limit: usize,
}

impl BufferPool {
    /// Creates a pool of up to `limit` buffers of `buffer_capacity` bytes
    /// each. No buffer is allocated until first checked out.
    pub fn new(buffer_capacity: usize, limit: usize) -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            buffer_capacity,
            limit,
        }
    }

    /// Checks out a free buffer, growing the arena if below the limit.
    /// Returns `None` when the pool is exhausted.
    pub fn checkout(&mut self) -> Option<BufferHandle> {
        if let Some(slot) = self.free.pop() {
            return Some(BufferHandle { slot });
        }
        if self.slots.len() < self.limit {
            let slot = self.slots.len();
            self.slots.push(FrameBuffer::with_capacity(self.buffer_capacity));
            debug!("buffer pool grew to {} of {}", self.slots.len(), self.limit);
            return Some(BufferHandle { slot });
        }
        None
    }

    /// The buffer behind a handle issued by this pool.
    pub fn buffer_mut(&mut self, handle: &BufferHandle) -> &mut FrameBuffer {
        &mut self.slots[handle.slot]
    }

    pub fn buffer(&self, handle: &BufferHandle) -> &FrameBuffer {
        &self.slots[handle.slot]
    }

    /// Returns a buffer to the free list, resetting its cursor.
    pub fn release(&mut self, handle: BufferHandle) {
        self.slots[handle.slot].reset();
        self.free.push(handle.slot);
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Buffers allocated so far (free or in use).
    pub fn allocated(&self) -> usize {
        self.slots.len()
    }

    /// Buffers currently checked out.
    pub fn in_use(&self) -> usize {
        self.slots.len() - self.free.len()
    }
}

/// A checked-out accumulation buffer: either a pool slot or a one-off
/// allocation when no pool is configured (or the pool is exhausted).
#[derive(Debug)]
pub(crate) enum Lease {
    Pooled(BufferHandle),
    Owned(FrameBuffer),
}

/// Where a codec gets its accumulation buffers from. A pool limit of zero
/// means every acquire is a fresh allocation.
#[derive(Debug)]
pub(crate) struct BufferSource {
    pool: BufferPool,
    capacity: usize,
}

impl BufferSource {
    pub(crate) fn new(capacity: usize, pool_size: usize) -> Self {
        Self {
            pool: BufferPool::new(capacity, pool_size),
            capacity,
        }
    }

    pub(crate) fn pool_size(&self) -> usize {
        self.pool.limit()
    }

    /// Acquires a buffer of the full configured capacity.
    pub(crate) fn acquire(&mut self) -> Lease {
        match self.pool.checkout() {
            Some(handle) => Lease::Pooled(handle),
            None => Lease::Owned(FrameBuffer::with_capacity(self.capacity)),
        }
    }

    /// Acquires a buffer able to hold `len` bytes. A pooled buffer is used
    /// when available (its capacity is always sufficient, the caller having
    /// already enforced the size limit); otherwise the allocation is sized
    /// to `len` exactly.
    pub(crate) fn acquire_sized(&mut self, len: usize) -> Lease {
        match self.pool.checkout() {
            Some(handle) => Lease::Pooled(handle),
            None => Lease::Owned(FrameBuffer::with_capacity(len)),
        }
    }

    pub(crate) fn buffer_mut<'a>(&'a mut self, lease: &'a mut Lease) -> &'a mut FrameBuffer {
        match lease {
            Lease::Pooled(handle) => self.pool.buffer_mut(handle),
            Lease::Owned(buffer) => buffer,
        }
    }

    /// Takes the accumulated frame out of the lease and returns the buffer
    /// to the pool. Pooled frames are copied at their exact size so the
    /// backing array never aliases a future frame.
    pub(crate) fn extract(&mut self, lease: Lease) -> Vec<u8> {
        match lease {
            Lease::Pooled(handle) => {
                let frame = self.pool.buffer(&handle).to_frame();
                self.pool.release(handle);
                frame
            }
            Lease::Owned(buffer) => buffer.into_frame(),
        }
    }

    /// Returns the buffer unused (error and soft end-of-stream paths).
    pub(crate) fn release(&mut self, lease: Lease) {
        if let Lease::Pooled(handle) = lease {
            self.pool.release(handle);
        }
    }
}
