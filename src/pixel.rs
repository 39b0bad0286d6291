use bytemuck::{Pod, Zeroable};

use crate::escape_time::Completion;

/// Terminates every result record on the wire.
pub const SEPARATOR: u8 = 0xA5;

/// Length of a [`ResultRecord`] on the wire.
pub const RECORD_LEN: usize = std::mem::size_of::<ResultRecord>();

/// Status bit set when the iteration cap was reached.
pub const MAXED_BIT: u8 = 0x80;

/// Mask for the iteration count bits of the status byte.
pub const ITERATIONS_MASK: u8 = 0x7F;

/// A finished pixel, on its way from an engine slot to the serializer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelResult {
    pub pixel_x: u16,
    pub pixel_y: u16,
    pub iterations: u32,
    pub escaped: bool,
    pub maxed: bool,
}

impl PixelResult {
    pub fn new(pixel_x: u16, pixel_y: u16, completion: Completion) -> Self {
        Self {
            pixel_x,
            pixel_y,
            iterations: completion.iterations,
            escaped: completion.escaped,
            maxed: completion.maxed,
        }
    }

    /// Low seven bits of the iteration count, with the cap flag in bit seven.
    pub fn status(&self) -> u8 {
        let maxed = if self.maxed { MAXED_BIT } else { 0 };
        (self.iterations as u8 & ITERATIONS_MASK) | maxed
    }
}

/// [`bytemuck`]-compatible wire layout of one result.
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResultRecord {
    pub pixel_x: [u8; 2],
    pub pixel_y: [u8; 2],
    pub status: u8,
    pub separator: u8,
}

impl From<PixelResult> for ResultRecord {
    fn from(result: PixelResult) -> Self {
        Self {
            pixel_x: result.pixel_x.to_le_bytes(),
            pixel_y: result.pixel_y.to_le_bytes(),
            status: result.status(),
            separator: SEPARATOR,
        }
    }
}
