//! Host-side reading of the result stream.

use thiserror::Error;

use crate::pixel::{ResultRecord, ITERATIONS_MASK, MAXED_BIT, RECORD_LEN, SEPARATOR};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("record at byte {offset} ends in {found:#04x} instead of the separator")]
    BadSeparator { offset: usize, found: u8 },

    #[error("stream ends with {count} bytes of an incomplete record")]
    Truncated { count: usize },
}

/// A result as it arrives on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DecodedPixel {
    pub pixel_x: u16,
    pub pixel_y: u16,
    /// Low seven bits of the iteration count.
    pub iterations_low: u8,
    pub maxed: bool,
}

impl From<&ResultRecord> for DecodedPixel {
    fn from(record: &ResultRecord) -> Self {
        Self {
            pixel_x: u16::from_le_bytes(record.pixel_x),
            pixel_y: u16::from_le_bytes(record.pixel_y),
            iterations_low: record.status & ITERATIONS_MASK,
            maxed: record.status & MAXED_BIT != 0,
        }
    }
}

/// Splits a byte stream into records, however it happens to be chunked.
#[derive(Clone, Debug, Default)]
pub struct ResultDecoder {
    pending: Vec<u8>,
    offset: usize,
}

impl ResultDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes of a record that has not completed yet.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Feeds one byte; returns the pixel once its record is complete.
    pub fn feed(&mut self, byte: u8) -> Result<Option<DecodedPixel>, DecodeError> {
        self.pending.push(byte);
        if self.pending.len() < RECORD_LEN {
            return Ok(None);
        }

        let offset = self.offset;
        self.offset += RECORD_LEN;
        let record: ResultRecord = bytemuck::pod_read_unaligned(&self.pending);
        self.pending.clear();
        if record.separator != SEPARATOR {
            return Err(DecodeError::BadSeparator {
                offset,
                found: record.separator,
            });
        }
        Ok(Some(DecodedPixel::from(&record)))
    }

    /// Feeds a chunk, returning every record it completes.
    pub fn feed_all(&mut self, bytes: &[u8]) -> Result<Vec<DecodedPixel>, DecodeError> {
        let mut pixels = Vec::with_capacity(bytes.len() / RECORD_LEN);
        for byte in bytes {
            pixels.extend(self.feed(*byte)?);
        }
        Ok(pixels)
    }

    /// Fails if the stream stopped partway through a record.
    pub fn finish(self) -> Result<(), DecodeError> {
        match self.pending.len() {
            0 => Ok(()),
            count => Err(DecodeError::Truncated { count }),
        }
    }
}

/// Decodes a complete result stream.
pub fn decode_records(bytes: &[u8]) -> Result<Vec<DecodedPixel>, DecodeError> {
    let mut decoder = ResultDecoder::new();
    let pixels = decoder.feed_all(bytes)?;
    decoder.finish()?;
    Ok(pixels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pixel::PixelResult;

    fn record_bytes(pixel_x: u16, iterations: u32, maxed: bool) -> Vec<u8> {
        let record = ResultRecord::from(PixelResult {
            pixel_x,
            pixel_y: 3,
            iterations,
            escaped: !maxed,
            maxed,
        });
        bytemuck::bytes_of(&record).to_vec()
    }

    #[test]
    fn decodes_records_split_across_chunks() {
        let mut bytes = record_bytes(1, 5, false);
        bytes.extend(record_bytes(300, 64, true));

        let mut decoder = ResultDecoder::new();
        let mut pixels = decoder.feed_all(&bytes[..4]).unwrap();
        assert!(pixels.is_empty());
        assert_eq!(decoder.pending(), 4);
        pixels.extend(decoder.feed_all(&bytes[4..]).unwrap());
        decoder.finish().unwrap();

        assert_eq!(
            pixels,
            vec![
                DecodedPixel {
                    pixel_x: 1,
                    pixel_y: 3,
                    iterations_low: 5,
                    maxed: false,
                },
                DecodedPixel {
                    pixel_x: 300,
                    pixel_y: 3,
                    iterations_low: 64,
                    maxed: true,
                },
            ]
        );
    }

    #[test]
    fn rejects_a_missing_separator() {
        let mut bytes = record_bytes(1, 5, false);
        bytes.extend(record_bytes(2, 5, false));
        bytes[2 * RECORD_LEN - 1] = 0;
        assert_eq!(
            decode_records(&bytes),
            Err(DecodeError::BadSeparator {
                offset: RECORD_LEN,
                found: 0,
            })
        );
    }

    #[test]
    fn rejects_a_truncated_stream() {
        let bytes = record_bytes(1, 5, false);
        assert_eq!(
            decode_records(&bytes[..RECORD_LEN - 2]),
            Err(DecodeError::Truncated {
                count: RECORD_LEN - 2,
            })
        );
    }
}
