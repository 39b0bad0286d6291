/*!
The inbound command record and its byte-at-a-time parser.

Layout, little-endian, `9 + 3 * BYTES` bytes:

| offset          | len     | field                  |
|-----------------|---------|------------------------|
| 0               | 2       | `pixels_x - 1`         |
| 2               | 2       | `pixels_y - 1`         |
| 4               | 4       | `max_iterations`       |
| 8               | `BYTES` | `corner_x`             |
| 8 + `BYTES`     | `BYTES` | `corner_y`             |
| 8 + 2 * `BYTES` | `BYTES` | `step`                 |
| 8 + 3 * `BYTES` | 1       | terminator, [`TERMINATOR`] |

The pixel counts travel minus one and wrap, so `0xFFFF` on the wire asks for an empty grid.
*/

use bytemuck::{Pod, Zeroable};
use log::{debug, warn};

use crate::{
    fixed::{FixedPoint, BYTES},
    stream::ByteSource,
    view::ViewCommand,
};

/// Closes a well-formed command.
pub const TERMINATOR: u8 = 0xA5;

/// Length of a [`CommandRecord`] on the wire.
pub const COMMAND_LEN: usize = std::mem::size_of::<CommandRecord>();

/// [`bytemuck`]-compatible wire layout of a [`ViewCommand`].
#[repr(C)]
#[derive(Pod, Zeroable, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommandRecord {
    pub pixels_x_minus_one: [u8; 2],
    pub pixels_y_minus_one: [u8; 2],
    pub max_iterations: [u8; 4],
    pub corner_x: [u8; BYTES],
    pub corner_y: [u8; BYTES],
    pub step: [u8; BYTES],
    pub terminator: u8,
}

impl CommandRecord {
    /// The view carried by the record, ignoring the terminator.
    pub fn view(&self) -> ViewCommand {
        ViewCommand {
            pixels_x: u16::from_le_bytes(self.pixels_x_minus_one).wrapping_add(1),
            pixels_y: u16::from_le_bytes(self.pixels_y_minus_one).wrapping_add(1),
            max_iterations: u32::from_le_bytes(self.max_iterations),
            corner_x: FixedPoint::from_le_bytes(self.corner_x),
            corner_y: FixedPoint::from_le_bytes(self.corner_y),
            step: FixedPoint::from_le_bytes(self.step),
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator == TERMINATOR
    }
}

impl From<&ViewCommand> for CommandRecord {
    fn from(view: &ViewCommand) -> Self {
        Self {
            pixels_x_minus_one: view.pixels_x.wrapping_sub(1).to_le_bytes(),
            pixels_y_minus_one: view.pixels_y.wrapping_sub(1).to_le_bytes(),
            max_iterations: view.max_iterations.to_le_bytes(),
            corner_x: view.corner_x.to_le_bytes(),
            corner_y: view.corner_y.to_le_bytes(),
            step: view.step.to_le_bytes(),
            terminator: TERMINATOR,
        }
    }
}

impl ViewCommand {
    /// The wire bytes of this command, terminator included.
    pub fn encode(&self) -> Vec<u8> {
        bytemuck::bytes_of(&CommandRecord::from(self)).to_vec()
    }
}

/// What the parser made of a completed record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseEvent {
    Accepted(ViewCommand),
    /// The terminator did not match; the parameters fell back to [`ViewCommand::default`].
    Malformed { terminator: u8 },
}

#[derive(Clone, Debug)]
pub struct CommandParser {
    buffer: [u8; COMMAND_LEN],
    position: usize,
    parameters: ViewCommand,
    malformed: u64,
}

impl CommandParser {
    pub fn new() -> Self {
        Self {
            buffer: [0; COMMAND_LEN],
            position: 0,
            parameters: ViewCommand::default(),
            malformed: 0,
        }
    }

    /// Offset the next byte will be written to.
    pub fn position(&self) -> usize {
        self.position
    }

    /// The parameters of the last completed record, or the fallback after a malformed one.
    pub fn parameters(&self) -> &ViewCommand {
        &self.parameters
    }

    /// Records rejected for a bad terminator so far.
    pub fn malformed(&self) -> u64 {
        self.malformed
    }

    /// Takes one byte from `source` if one is presented and `enabled` holds.
    pub fn tick(&mut self, source: &mut impl ByteSource, enabled: bool) -> Option<ParseEvent> {
        if !enabled {
            return None;
        }
        let byte = source.peek()?;
        source.consume();
        self.push(byte)
    }

    /// Writes `byte` at the current offset; returns an event once the record is complete.
    pub fn push(&mut self, byte: u8) -> Option<ParseEvent> {
        self.buffer[self.position] = byte;
        self.position += 1;
        if self.position < COMMAND_LEN {
            return None;
        }
        self.position = 0;

        let record: CommandRecord = bytemuck::pod_read_unaligned(&self.buffer);
        if record.is_terminated() {
            self.parameters = record.view();
            debug!("accepted command: {:?}", self.parameters);
            Some(ParseEvent::Accepted(self.parameters))
        } else {
            self.parameters = ViewCommand::default();
            self.malformed += 1;
            warn!(
                "discarding command with terminator {:#04x}, expected {:#04x}",
                record.terminator, TERMINATOR
            );
            Some(ParseEvent::Malformed {
                terminator: record.terminator,
            })
        }
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}
