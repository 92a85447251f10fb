//! Bounded history window for LZ77 match search and replay.
//!
//! The window keeps the most recent `capacity` bytes, evicting the oldest
//! on overflow, and supports 1-based backward indexing: distance 1 is the
//! most recently pushed byte. Because the defish wire format stores
//! distances and lengths in a single byte, capacities are capped at 255;
//! any capacity in `1..=255` is legal (no power-of-two restriction).

use crate::error::{DefishError, Result};
use std::collections::VecDeque;

/// Maximum window capacity representable by the one-byte wire distance.
pub const MAX_WINDOW: usize = 255;

/// A bounded FIFO of recently seen bytes with backward indexing.
#[derive(Debug, Clone)]
pub struct HistoryWindow {
    buf: VecDeque<u8>,
    capacity: usize,
}

impl HistoryWindow {
    /// Create a window holding at most `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or exceeds [`MAX_WINDOW`].
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "window capacity must be greater than 0");
        assert!(
            capacity <= MAX_WINDOW,
            "window capacity must not exceed {}, got {}",
            MAX_WINDOW,
            capacity
        );
        Self {
            buf: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// The configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently held.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the window holds no bytes yet.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Push a byte, evicting the oldest when full.
    pub fn push(&mut self, byte: u8) {
        if self.buf.len() == self.capacity {
            self.buf.pop_front();
        }
        self.buf.push_back(byte);
    }

    /// Read the byte `distance` positions back; distance 1 is the most
    /// recently pushed byte.
    ///
    /// # Errors
    ///
    /// Fails with [`DefishError::InvalidDistance`] when `distance` is zero
    /// or exceeds the current occupancy.
    pub fn at_distance(&self, distance: usize) -> Result<u8> {
        if distance == 0 || distance > self.buf.len() {
            return Err(DefishError::invalid_distance(distance, self.buf.len()));
        }
        Ok(self.buf[self.buf.len() - distance])
    }

    /// Drop all content, keeping the capacity.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}
