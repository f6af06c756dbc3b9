use byteorder::{BigEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Forward-only reader over a fixed byte buffer.
///
/// Every read is bounds-checked and failures carry the step that ran dry, so a
/// truncated document reports where in the structure it fell short.
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    data: &'a [u8],
    start: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(data: &'a [u8]) -> ByteCursor<'a> {
        Self {
            data,
            start: data.len(),
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.start - self.data.len()
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_u8(&mut self, step: &'static str) -> Result<u8> {
        let remaining = self.data.len();
        self.data.read_u8().map_err(|_| Error::TruncatedInput {
            step,
            needed: 1,
            remaining,
        })
    }

    pub fn read_u16(&mut self, step: &'static str) -> Result<u16> {
        let remaining = self.data.len();
        self.data
            .read_u16::<BigEndian>()
            .map_err(|_| Error::TruncatedInput {
                step,
                needed: 2,
                remaining,
            })
    }

    pub fn read_u32(&mut self, step: &'static str) -> Result<u32> {
        let remaining = self.data.len();
        self.data
            .read_u32::<BigEndian>()
            .map_err(|_| Error::TruncatedInput {
                step,
                needed: 4,
                remaining,
            })
    }

    pub fn read_u64(&mut self, step: &'static str) -> Result<u64> {
        let remaining = self.data.len();
        self.data
            .read_u64::<BigEndian>()
            .map_err(|_| Error::TruncatedInput {
                step,
                needed: 8,
                remaining,
            })
    }

    /// Take `len` bytes off the front of the buffer.
    pub fn read_bytes(&mut self, len: usize, step: &'static str) -> Result<&'a [u8]> {
        if self.data.len() < len {
            return Err(Error::TruncatedInput {
                step,
                needed: len,
                remaining: self.data.len(),
            });
        }
        let (taken, rem) = self.data.split_at(len);
        self.data = rem;
        Ok(taken)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn position_tracks_reads() {
        let data = [0x01u8, 0x02, 0x03, 0x04, 0x05];
        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.position(), 0);
        assert_eq!(cursor.read_u8("u8").unwrap(), 0x01);
        assert_eq!(cursor.position(), 1);
        assert_eq!(cursor.read_u16("u16").unwrap(), 0x0203);
        assert_eq!(cursor.position(), 3);
        assert_eq!(cursor.read_bytes(2, "bytes").unwrap(), &[0x04, 0x05]);
        assert_eq!(cursor.position(), 5);
        assert!(cursor.is_empty());
    }

    #[test]
    fn big_endian_arguments() {
        let data = [0x00u8, 0x00, 0x0f, 0x42, 0x40];
        let mut cursor = ByteCursor::new(&data[1..]);
        assert_eq!(cursor.read_u32("u32").unwrap(), 1_000_000);
        let mut cursor = ByteCursor::new(&data[3..]);
        assert_eq!(cursor.read_u16("u16").unwrap(), 0x4240);
    }

    #[test]
    fn truncated_reads_fail() {
        let data = [0x01u8, 0x02];
        let mut cursor = ByteCursor::new(&data);
        let err = cursor.read_u32("u32").unwrap_err();
        match err {
            Error::TruncatedInput {
                needed, remaining, ..
            } => {
                assert_eq!(needed, 4);
                assert_eq!(remaining, 2);
            }
            other => panic!("expected TruncatedInput, got {:?}", other),
        }

        let mut cursor = ByteCursor::new(&data);
        assert!(cursor.read_bytes(3, "bytes").is_err());
        // A failed byte-run read consumes nothing
        assert_eq!(cursor.remaining(), 2);
    }
}
