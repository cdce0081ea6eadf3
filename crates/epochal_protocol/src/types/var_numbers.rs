use std::io::{Read, Write};

use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite};
use crate::types::{MAX_VARINT_LEN, MAX_VARLONG_LEN};

const SEGMENT_BITS: u8 = 0x7F;
const CONTINUE_BIT: u8 = 0x80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarInt(pub i32);

impl VarInt {
    /// Number of bytes the canonical encoding of `value` takes.
    pub const fn written_len(value: i32) -> usize {
        let value = value as u32;
        match value {
            0..=0x7F => 1,
            0x80..=0x3FFF => 2,
            0x4000..=0x1F_FFFF => 3,
            0x20_0000..=0x0FFF_FFFF => 4,
            _ => 5,
        }
    }

    pub fn len(&self) -> usize {
        Self::written_len(self.0)
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Canonical encoding of the value.
    pub fn to_bytes(&self) -> ([u8; MAX_VARINT_LEN], usize) {
        let mut buffer = [0u8; MAX_VARINT_LEN];
        let mut value = self.0 as u32;
        let mut size = 0;

        loop {
            let mut byte = (value & u32::from(SEGMENT_BITS)) as u8;
            value >>= 7;
            if value != 0 {
                byte |= CONTINUE_BIT;
            }
            buffer[size] = byte;
            size += 1;
            if value == 0 {
                break;
            }
        }

        (buffer, size)
    }

    /// Decodes a VarInt from the start of `bytes` without consuming anything.
    ///
    /// Returns `Ok(None)` when `bytes` ends before the VarInt does, so framing
    /// code can wait for more input instead of failing.
    pub fn peek(bytes: &[u8]) -> Result<Option<(i32, usize)>> {
        let mut value: u32 = 0;

        for (index, byte) in bytes.iter().take(MAX_VARINT_LEN).enumerate() {
            value |= u32::from(byte & SEGMENT_BITS) << (7 * index);
            if byte & CONTINUE_BIT == 0 {
                return Ok(Some((value as i32, index + 1)));
            }
        }

        if bytes.len() >= MAX_VARINT_LEN {
            return Err(ProtocolError::MalformedVarInt);
        }
        Ok(None)
    }
}

impl From<i32> for VarInt {
    fn from(value: i32) -> Self {
        VarInt(value)
    }
}

impl ProtocolWrite for VarInt {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let (buffer, size) = self.to_bytes();
        writer.write_all(&buffer[..size])?;
        Ok(size)
    }
}

impl ProtocolRead for VarInt {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let mut value: u32 = 0;

        for index in 0..MAX_VARINT_LEN {
            let mut buf = [0u8; 1];
            reader
                .read_exact(&mut buf)
                .map_err(|_| ProtocolError::MalformedVarInt)?;

            value |= u32::from(buf[0] & SEGMENT_BITS) << (7 * index);
            if buf[0] & CONTINUE_BIT == 0 {
                return Ok((VarInt(value as i32), index + 1));
            }
        }

        Err(ProtocolError::MalformedVarInt)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VarLong(pub i64);

impl VarLong {
    pub fn len(&self) -> usize {
        let mut value = self.0 as u64;
        let mut size = 1;
        while value > u64::from(SEGMENT_BITS) {
            value >>= 7;
            size += 1;
        }
        size
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl ProtocolWrite for VarLong {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut buffer = [0u8; MAX_VARLONG_LEN];
        let mut value = self.0 as u64;
        let mut size = 0;

        loop {
            let mut byte = (value & u64::from(SEGMENT_BITS)) as u8;
            value >>= 7;
            if value != 0 {
                byte |= CONTINUE_BIT;
            }
            buffer[size] = byte;
            size += 1;
            if value == 0 {
                break;
            }
        }

        writer.write_all(&buffer[..size])?;
        Ok(size)
    }
}

impl ProtocolRead for VarLong {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let mut value: u64 = 0;

        for index in 0..MAX_VARLONG_LEN {
            let mut buf = [0u8; 1];
            reader
                .read_exact(&mut buf)
                .map_err(|_| ProtocolError::MalformedVarLong)?;

            value |= u64::from(buf[0] & SEGMENT_BITS) << (7 * index);
            if buf[0] & CONTINUE_BIT == 0 {
                return Ok((VarLong(value as i64), index + 1));
            }
        }

        Err(ProtocolError::MalformedVarLong)
    }
}
