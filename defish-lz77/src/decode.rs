//! Streaming LZ77 decoder.
//!
//! Replays a record stream against a single bounded history window: a
//! literal emits its byte and records it; a copy reads `length` bytes,
//! each `distance` positions behind the growing write cursor, so a
//! distance smaller than the length correctly repeats a pattern.

use crate::record::Lz77Record;
use defish_core::error::{DefishError, Result};
use defish_core::window::{HistoryWindow, MAX_WINDOW};
use std::collections::VecDeque;

/// Pull-based replayer turning records back into bytes.
#[derive(Debug)]
pub struct Lz77Decoder<I> {
    input: I,
    window: HistoryWindow,
    /// Bytes produced by the current copy, drained one per pull.
    out: VecDeque<u8>,
    done: bool,
}

impl<I> Lz77Decoder<I>
where
    I: Iterator<Item = Result<Lz77Record>>,
{
    /// Create a decoder whose history window matches the encoder's width.
    pub fn new(input: I, width: usize) -> Result<Self> {
        if width == 0 || width > MAX_WINDOW {
            return Err(DefishError::invalid_config(format!(
                "window width must be in 1..={}, got {}",
                MAX_WINDOW, width
            )));
        }
        Ok(Self {
            input,
            window: HistoryWindow::new(width),
            out: VecDeque::new(),
            done: false,
        })
    }

    fn replay(&mut self, record: Lz77Record) -> Result<()> {
        match record {
            Lz77Record::Literal(item) => {
                self.window.push(item);
                self.out.push_back(item);
            }
            Lz77Record::Copy { distance, length } => {
                for _ in 0..length {
                    let byte = self.window.at_distance(distance as usize)?;
                    self.window.push(byte);
                    self.out.push_back(byte);
                }
            }
        }
        Ok(())
    }
}

impl<I> Iterator for Lz77Decoder<I>
where
    I: Iterator<Item = Result<Lz77Record>>,
{
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(byte) = self.out.pop_front() {
                return Some(Ok(byte));
            }
            if self.done {
                return None;
            }
            match self.input.next() {
                Some(Ok(record)) => {
                    if let Err(err) = self.replay(record) {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
                Some(Err(err)) => {
                    self.done = true;
                    return Some(Err(err));
                }
                None => {
                    self.done = true;
                    return None;
                }
            }
        }
    }
}
