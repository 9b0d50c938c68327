// SPDX-License-Identifier: MIT
// © 2025–2026 Christopher Liu

//! Interrupt-fed byte ring buffer.
//!
//! Fixed-capacity single-producer/single-consumer FIFO between the UART RX interrupt and the
//! polling main loop. The producer only ever advances `head`, the consumer only ever advances
//! `tail`, so neither side needs a lock; cross-side index reads use acquire/release ordering.
//!
//! One slot is always left unused to disambiguate full from empty, so a `RingBuffer<N>` holds at
//! most `N - 1` bytes. Pushing into a full buffer drops the byte and latches a sticky overflow
//! flag that stays visible to diagnostics until [`RingConsumer::clear`].

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Fixed-capacity SPSC byte buffer. Split once into a producer and a consumer handle.
pub struct RingBuffer<const N: usize> {
    buf: UnsafeCell<[u8; N]>,
    /// Next slot the producer writes. Written only by the producer.
    head: AtomicUsize,
    /// Next slot the consumer reads. Written only by the consumer.
    tail: AtomicUsize,
    /// Latched when a push finds the buffer full.
    overflow: AtomicBool,
}

// Safety: the buffer cells are only touched through the split handles, and the
// single-writer-per-index discipline above makes concurrent producer/consumer access sound.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    /// Create an empty buffer. `const` so it can back a `static` shared with the interrupt.
    pub const fn new() -> Self {
        Self {
            buf: UnsafeCell::new([0; N]),
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
            overflow: AtomicBool::new(false),
        }
    }

    /// Split into the interrupt-side producer and the poll-side consumer.
    ///
    /// Taking `&mut self` guarantees exactly one handle pair exists per buffer.
    pub fn split(&mut self) -> (RingProducer<'_, N>, RingConsumer<'_, N>) {
        (RingProducer { ring: self }, RingConsumer { ring: self })
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Interrupt-side handle. The platform layer calls [`push`](Self::push) once per received byte.
pub struct RingProducer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<'a, const N: usize> RingProducer<'a, N> {
    /// Enqueue one byte.
    ///
    /// Returns `false` and latches the overflow flag when the buffer is full; the byte is
    /// dropped. Safe to call from the RX interrupt concurrently with the consumer.
    pub fn push(&mut self, byte: u8) -> bool {
        let head = self.ring.head.load(Ordering::Relaxed);
        let next = (head + 1) % N;
        if next == self.ring.tail.load(Ordering::Acquire) {
            self.ring.overflow.store(true, Ordering::Relaxed);
            return false;
        }
        // Safety: `head` is owned by this producer and the slot is outside the
        // consumer-visible range until the store below publishes it.
        unsafe {
            (*self.ring.buf.get())[head] = byte;
        }
        self.ring.head.store(next, Ordering::Release);
        true
    }
}

/// Poll-side handle, owned by the protocol layer.
pub struct RingConsumer<'a, const N: usize> {
    ring: &'a RingBuffer<N>,
}

impl<'a, const N: usize> RingConsumer<'a, N> {
    /// Dequeue the oldest byte, or `None` when the buffer is empty.
    pub fn pop(&mut self) -> Option<u8> {
        let tail = self.ring.tail.load(Ordering::Relaxed);
        if tail == self.ring.head.load(Ordering::Acquire) {
            return None;
        }
        // Safety: the slot at `tail` was published by the producer's release store and is
        // not rewritten until this consumer advances past it.
        let byte = unsafe { (*self.ring.buf.get())[tail] };
        self.ring.tail.store((tail + 1) % N, Ordering::Release);
        Some(byte)
    }

    /// Number of bytes currently queued.
    pub fn len(&self) -> usize {
        let head = self.ring.head.load(Ordering::Acquire);
        let tail = self.ring.tail.load(Ordering::Relaxed);
        (head + N - tail) % N
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop everything queued so far and clear the sticky overflow flag.
    ///
    /// Bytes the interrupt pushes while this runs survive; only data older than the current
    /// head is discarded.
    pub fn clear(&mut self) {
        let head = self.ring.head.load(Ordering::Acquire);
        self.ring.tail.store(head, Ordering::Release);
        self.ring.overflow.store(false, Ordering::Relaxed);
    }

    /// Whether a push has been dropped since the last [`clear`](Self::clear).
    pub fn overflowed(&self) -> bool {
        self.ring.overflow.load(Ordering::Relaxed)
    }
}
