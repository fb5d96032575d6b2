//! Fixed-capacity single-producer/single-consumer byte ring
//!
//! Head and tail are free-running counters; the number of buffered bytes
//! is `tail - head` (wrapping) and the slot index is the counter masked by
//! `N - 1`, which is why `N` must be a power of two.
//!
//! ```text
//!            head (consumer)          tail (producer)
//!              |                        |
//! [ free ... ][ b0 ][ b1 ][ ... ][ bn ][ free ... ]
//! ```
//!
//! The producer context only ever stores `tail`, the consumer context only
//! ever stores `head`. Storage for a slot is written before `tail` is
//! published (release) and read after `tail` is observed (acquire), so the
//! two sides can run in different interrupt/task contexts without a lock.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Byte ring buffer with room for exactly `N` bytes.
pub struct RingBuffer<const N: usize> {
    storage: UnsafeCell<[u8; N]>,
    head: AtomicUsize,
    tail: AtomicUsize,
}

// SAFETY: mutation through `&self` only happens via `Producer` (tail side)
// and `Consumer` (head side). `split` takes `&mut self`, so at most one of
// each exists at a time and they never write the same slot concurrently.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    const MASK: usize = {
        assert!(N.is_power_of_two(), "ring buffer capacity must be a power of two");
        N - 1
    };

    /// Create an empty buffer.
    pub const fn new() -> Self {
        let _ = Self::MASK;
        Self {
            storage: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Total number of bytes the buffer can hold.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Number of bytes currently buffered.
    #[inline]
    pub fn count(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.count() >= N
    }

    /// Append a byte at the tail.
    ///
    /// Returns `false` and leaves the buffer untouched when it is full.
    pub fn try_insert(&mut self, byte: u8) -> bool {
        self.push(byte)
    }

    /// Remove the byte at the head, or `None` when empty.
    pub fn try_remove(&mut self) -> Option<u8> {
        self.pop()
    }

    /// Look at the byte at the head without removing it.
    pub fn peek(&self) -> Option<u8> {
        self.front().map(|(_, byte)| byte)
    }

    /// Split into producer and consumer halves.
    ///
    /// The halves borrow the buffer, so a buffer kept in a `static` (via
    /// `StaticCell`) yields `'static` handles that can move into separate
    /// tasks or interrupt handlers.
    pub fn split(&mut self) -> (Producer<'_, N>, Consumer<'_, N>) {
        (Producer { ring: &*self }, Consumer { ring: &*self })
    }

    fn push(&self, byte: u8) -> bool {
        let tail = self.tail.load(Ordering::Relaxed);
        let head = self.head.load(Ordering::Acquire);
        if tail.wrapping_sub(head) >= N {
            return false;
        }

        // SAFETY: the slot at `tail` is outside the readable region, so the
        // consumer does not touch it until `tail` is published below.
        unsafe {
            self.storage
                .get()
                .cast::<u8>()
                .add(tail & Self::MASK)
                .write(byte);
        }
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        true
    }

    fn front(&self) -> Option<(usize, u8)> {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Acquire);
        if head == tail {
            return None;
        }

        // SAFETY: `head != tail`, so the slot was published by the producer
        // and will not be rewritten until `head` moves past it.
        let byte = unsafe {
            self.storage
                .get()
                .cast::<u8>()
                .add(head & Self::MASK)
                .read()
        };
        Some((head, byte))
    }

    fn pop(&self) -> Option<u8> {
        let (head, byte) = self.front()?;
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Some(byte)
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert-only half of a split [`RingBuffer`].
pub struct Producer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<'a, const N: usize> Producer<'a, N> {
    /// Append a byte; `false` when the buffer is full.
    #[inline]
    pub fn try_insert(&mut self, byte: u8) -> bool {
        self.ring.push(byte)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.ring.count()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.ring.is_full()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

/// Remove-only half of a split [`RingBuffer`].
pub struct Consumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<'a, const N: usize> Consumer<'a, N> {
    /// Remove the oldest byte.
    #[inline]
    pub fn try_remove(&mut self) -> Option<u8> {
        self.ring.pop()
    }

    /// Oldest byte, left in place.
    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.ring.front().map(|(_, byte)| byte)
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.ring.count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}
