/*!
Byte streams with a ready/valid handshake.

A [`ByteSource`] presents at most one byte per tick and only drops it once the consumer
calls [`ByteSource::consume`]. A [`ByteSink`] takes one [`Beat`] per tick while it
reports ready. The transport behind either end is not this crate's concern; the in-memory
queues here are enough to drive the device from a file, a pipe or a test.
*/

use std::collections::VecDeque;

pub trait ByteSource {
    /// The presented byte, if any.
    fn peek(&self) -> Option<u8>;

    /// Drops the presented byte.
    fn consume(&mut self);
}

pub trait ByteSink {
    fn ready(&self) -> bool;

    /// Only called while [`ByteSink::ready`] holds.
    fn push(&mut self, beat: Beat);
}

/// One output byte plus its frame marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Beat {
    pub payload: u8,
    /// First byte of a frame.
    pub first: bool,
    /// Last byte of a frame.
    pub last: bool,
}

impl Beat {
    pub fn new(payload: u8) -> Self {
        Self {
            payload,
            first: false,
            last: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct ByteQueue {
    bytes: VecDeque<u8>,
}

impl ByteQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend(bytes);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl From<Vec<u8>> for ByteQueue {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

impl ByteSource for ByteQueue {
    fn peek(&self) -> Option<u8> {
        self.bytes.front().copied()
    }

    fn consume(&mut self) {
        self.bytes.pop_front();
    }
}

/// Collects output beats, optionally holding back once `capacity` beats are waiting.
#[derive(Clone, Debug, Default)]
pub struct BeatQueue {
    beats: VecDeque<Beat>,
    capacity: Option<usize>,
}

impl BeatQueue {
    /// A queue that is always ready.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// A queue that stops accepting once `capacity` beats are waiting to be taken.
    pub fn bounded(capacity: usize) -> Self {
        Self {
            beats: VecDeque::new(),
            capacity: Some(capacity),
        }
    }

    pub fn pop(&mut self) -> Option<Beat> {
        self.beats.pop_front()
    }

    /// Takes every waiting beat.
    pub fn drain(&mut self) -> Vec<Beat> {
        self.beats.drain(..).collect()
    }

    /// Takes every waiting beat, keeping only the payload.
    pub fn drain_payload(&mut self) -> Vec<u8> {
        self.beats.drain(..).map(|beat| beat.payload).collect()
    }

    pub fn len(&self) -> usize {
        self.beats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beats.is_empty()
    }
}

impl ByteSink for BeatQueue {
    fn ready(&self) -> bool {
        self.capacity
            .map_or(true, |capacity| self.beats.len() < capacity)
    }

    fn push(&mut self, beat: Beat) {
        debug_assert!(self.ready(), "beat pushed into a full queue");
        self.beats.push_back(beat);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_holds_a_byte_until_consumed() {
        let mut queue = ByteQueue::from(vec![1, 2]);
        assert_eq!(queue.peek(), Some(1));
        assert_eq!(queue.peek(), Some(1));
        queue.consume();
        assert_eq!(queue.peek(), Some(2));
        queue.consume();
        assert_eq!(queue.peek(), None);
        queue.consume();
        assert!(queue.is_empty());
    }

    #[test]
    fn bounded_sink_applies_backpressure() {
        let mut queue = BeatQueue::bounded(2);
        queue.push(Beat::new(1));
        assert!(queue.ready());
        queue.push(Beat::new(2));
        assert!(!queue.ready());
        assert_eq!(queue.pop(), Some(Beat::new(1)));
        assert!(queue.ready());
        assert_eq!(queue.drain_payload(), vec![2]);
    }
}
