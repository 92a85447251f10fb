//! Streaming LZ77 encoder.
//!
//! The encoder holds two bounded windows over a lazy input: a search window
//! of already-emitted bytes (oldest evicted) and a look-ahead window of
//! upcoming bytes, both sized to the configured window width. Each step
//! scans backward offsets in increasing distance order, measuring the
//! longest common run between the search window at that offset and the
//! look-ahead; the measurement may run past the window boundary into the
//! look-ahead itself, which is what makes overlapping copies
//! (distance < length) representable. The first offset achieving a
//! strictly greater length than any seen before wins, so ties go to the
//! nearest distance. A best length of one or less degenerates to a
//! literal.

use crate::record::Lz77Record;
use defish_core::error::{DefishError, Result};
use defish_core::window::{HistoryWindow, MAX_WINDOW};
use std::collections::VecDeque;

/// Pull-based LZ77 match finder over a lazy byte stream.
#[derive(Debug)]
pub struct Lz77Encoder<I> {
    input: I,
    width: usize,
    max_len: usize,
    search: HistoryWindow,
    ahead: VecDeque<u8>,
    primed: bool,
    /// Input error hit while sliding; reported on the next pull.
    pending_err: Option<DefishError>,
    done: bool,
}

impl<I> Lz77Encoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    /// Create an encoder with the given window width and maximum match
    /// length, both in `1..=255` so they fit the one-byte wire fields.
    pub fn new(input: I, width: usize, max_len: usize) -> Result<Self> {
        if width == 0 || width > MAX_WINDOW {
            return Err(DefishError::invalid_config(format!(
                "window width must be in 1..={}, got {}",
                MAX_WINDOW, width
            )));
        }
        if max_len == 0 || max_len > MAX_WINDOW {
            return Err(DefishError::invalid_config(format!(
                "max match length must be in 1..={}, got {}",
                MAX_WINDOW, max_len
            )));
        }
        Ok(Self {
            input,
            width,
            max_len,
            search: HistoryWindow::new(width),
            ahead: VecDeque::with_capacity(width),
            primed: false,
            pending_err: None,
            done: false,
        })
    }

    fn pull(&mut self) -> Result<Option<u8>> {
        self.input.next().transpose()
    }

    fn prime(&mut self) -> Result<()> {
        while self.ahead.len() < self.width {
            match self.pull()? {
                Some(byte) => self.ahead.push_back(byte),
                None => break,
            }
        }
        Ok(())
    }

    /// Length of the common run between the search window at `distance`
    /// and the look-ahead cursor. Once the run crosses the window boundary
    /// it continues against bytes earlier in the look-ahead itself.
    fn common_length(&self, distance: usize) -> Result<usize> {
        let mut length = 0;
        while length < self.max_len && length < self.ahead.len() {
            let candidate = if length < distance {
                self.search.at_distance(distance - length)?
            } else {
                self.ahead[length - distance]
            };
            if candidate != self.ahead[length] {
                break;
            }
            length += 1;
        }
        Ok(length)
    }

    /// Best (distance, length), or distance 0 when nothing beats a
    /// literal. Strict `>` keeps the nearest distance on equal lengths.
    fn find_best(&self) -> Result<(usize, usize)> {
        let mut best_len = 1;
        let mut best_dist = 0;
        for distance in 1..=self.search.len() {
            let length = self.common_length(distance)?;
            if length > best_len {
                best_len = length;
                best_dist = distance;
            }
        }
        Ok((best_dist, best_len))
    }

    /// Slide both windows forward by `count` positions, refilling the
    /// look-ahead from the input.
    fn slide(&mut self, count: usize) -> Result<()> {
        for _ in 0..count {
            let Some(byte) = self.ahead.pop_front() else {
                break;
            };
            self.search.push(byte);
            if let Some(next) = self.pull()? {
                self.ahead.push_back(next);
            }
        }
        Ok(())
    }

    fn step(&mut self) -> Result<Option<Lz77Record>> {
        if !self.primed {
            self.prime()?;
            self.primed = true;
        }
        if self.ahead.is_empty() {
            return Ok(None);
        }
        let (best_dist, best_len) = self.find_best()?;
        let record = if best_dist == 0 {
            Lz77Record::Literal(self.ahead[0])
        } else {
            Lz77Record::copy(best_dist as u8, best_len as u8)?
        };
        // The record is already decided; an input failure while sliding is
        // surfaced on the following pull.
        if let Err(err) = self.slide(record.advance()) {
            self.pending_err = Some(err);
        }
        Ok(Some(record))
    }
}

impl<I> Iterator for Lz77Encoder<I>
where
    I: Iterator<Item = Result<u8>>,
{
    type Item = Result<Lz77Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if let Some(err) = self.pending_err.take() {
            self.done = true;
            return Some(Err(err));
        }
        match self.step() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(err) => {
                self.done = true;
                Some(Err(err))
            }
        }
    }
}
