//! Streams each [`PixelResult`] out as a [`ResultRecord`], one byte per tick.
//!
//! Frame marks ride alongside the payload: the first byte after a sweep opens is marked
//! `first`, and a separator emitted while the sweep is fully drained is marked `last`.

use log::trace;

use crate::{
    pixel::{PixelResult, ResultRecord, RECORD_LEN},
    stream::{Beat, ByteSink},
};

#[derive(Clone, Debug, Default)]
pub struct ResultSerializer {
    record: Option<[u8; RECORD_LEN]>,
    position: usize,
    frame_start_pending: bool,
    emitted: u64,
}

impl ResultSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `true` when no record is being sent.
    pub fn is_idle(&self) -> bool {
        self.record.is_none()
    }

    /// Records fully emitted so far.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Marks the next byte sent as the start of a frame.
    pub fn open_frame(&mut self) {
        self.frame_start_pending = true;
    }

    /// Takes a result to send. Only valid while idle.
    pub fn accept(&mut self, result: PixelResult) {
        debug_assert!(self.is_idle(), "result accepted mid-record");
        let record = ResultRecord::from(result);
        let mut bytes = [0; RECORD_LEN];
        bytes.copy_from_slice(bytemuck::bytes_of(&record));
        self.record = Some(bytes);
        self.position = 0;
    }

    /// Sends the next byte if the sink is ready. `drained` tells whether this record is the
    /// last one of the sweep.
    pub fn tick(&mut self, sink: &mut impl ByteSink, drained: bool) {
        let Some(bytes) = self.record else {
            return;
        };
        if !sink.ready() {
            return;
        }

        let separator = self.position == RECORD_LEN - 1;
        let beat = Beat {
            payload: bytes[self.position],
            first: std::mem::take(&mut self.frame_start_pending),
            last: separator && drained,
        };
        if beat.last {
            trace!("closing frame after {} records", self.emitted + 1);
        }
        sink.push(beat);

        if separator {
            self.record = None;
            self.position = 0;
            self.emitted += 1;
        } else {
            self.position += 1;
        }
    }
}
