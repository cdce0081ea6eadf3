use std::io::{Read, Write};

use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite};
use crate::types::{Short, VarInt, read_exact_vec};

/// Byte array prefixed with its length as a VarInt (1.8 onwards).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ByteArray(pub Vec<u8>);

impl ProtocolWrite for ByteArray {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let len_size = VarInt(self.0.len() as i32).write_to(writer)?;
        writer.write_all(&self.0)?;
        Ok(len_size + self.0.len())
    }
}

impl ProtocolRead for ByteArray {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let (VarInt(len), len_size) = VarInt::read_from(reader)?;
        let len = usize::try_from(len).map_err(|_| ProtocolError::NegativeLength(len.into()))?;
        let data = read_exact_vec(reader, len)?;
        Ok((ByteArray(data), len_size + len))
    }
}

/// Byte array prefixed with a signed 16-bit length, as 1.7 sends them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShortByteArray(pub Vec<u8>);

impl ProtocolWrite for ShortByteArray {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let len = i16::try_from(self.0.len())
            .map_err(|_| ProtocolError::invalid_value("short array length", self.0.len() as i64))?;
        let len_size = Short(len).write_to(writer)?;
        writer.write_all(&self.0)?;
        Ok(len_size + self.0.len())
    }
}

impl ProtocolRead for ShortByteArray {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let (Short(len), len_size) = Short::read_from(reader)?;
        let len = usize::try_from(len).map_err(|_| ProtocolError::NegativeLength(len.into()))?;
        let data = read_exact_vec(reader, len)?;
        Ok((ShortByteArray(data), len_size + len))
    }
}

/// Sequence prefixed with its element count as a VarInt.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PrefixedArray<T>(pub Vec<T>);

impl<T: ProtocolWrite> ProtocolWrite for PrefixedArray<T> {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let mut written = VarInt(self.0.len() as i32).write_to(writer)?;
        for item in &self.0 {
            written += item.write_to(writer)?;
        }
        Ok(written)
    }
}

impl<T: ProtocolRead> ProtocolRead for PrefixedArray<T> {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let (VarInt(len), mut read) = VarInt::read_from(reader)?;
        let len = usize::try_from(len).map_err(|_| ProtocolError::NegativeLength(len.into()))?;

        let mut items = Vec::with_capacity(len.min(256));
        for _ in 0..len {
            let (item, n) = T::read_from(reader)?;
            items.push(item);
            read += n;
        }
        Ok((PrefixedArray(items), read))
    }
}

/// Reads everything left in the packet body.
pub fn read_remaining<R: Read>(reader: &mut R) -> Result<(Vec<u8>, usize)> {
    let mut data = Vec::new();
    let n = reader.read_to_end(&mut data)?;
    Ok((data, n))
}
