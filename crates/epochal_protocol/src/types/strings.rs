use std::io::{Read, Write};

use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite};
use crate::types::{VarInt, read_exact_vec};

/// Largest string length vanilla allows anywhere in the protocol, in UTF-16 units.
pub const MAX_STRING_LENGTH: usize = 32767;

/// VarInt byte-length prefixed UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ProtocolString(pub String);

impl ProtocolString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Reads a string whose length may not exceed `max_len` UTF-16 units.
    ///
    /// The byte length is checked against `max_len * 3` before anything is
    /// allocated, the decoded length afterwards.
    pub fn read_bounded<R: Read>(reader: &mut R, max_len: usize) -> Result<(Self, usize)> {
        let (VarInt(len), prefix) = VarInt::read_from(reader)?;
        let len = usize::try_from(len).map_err(|_| ProtocolError::NegativeLength(len.into()))?;

        if len > max_len.saturating_mul(3) {
            return Err(ProtocolError::StringTooLong {
                length: len,
                max: max_len,
            });
        }

        let bytes = read_exact_vec(reader, len)?;
        let value = String::from_utf8(bytes).map_err(|_| ProtocolError::InvalidUtf8)?;

        let units = utf16_len(&value);
        if units > max_len {
            return Err(ProtocolError::StringTooLong {
                length: units,
                max: max_len,
            });
        }

        Ok((Self(value), prefix + len))
    }

    pub fn write_bounded<W: Write>(&self, writer: &mut W, max_len: usize) -> Result<usize> {
        Self::write_str(writer, &self.0, max_len)
    }

    pub fn write_str<W: Write>(writer: &mut W, value: &str, max_len: usize) -> Result<usize> {
        let units = utf16_len(value);
        if units > max_len {
            return Err(ProtocolError::StringTooLong {
                length: units,
                max: max_len,
            });
        }

        let bytes = value.as_bytes();
        let mut written = VarInt(bytes.len() as i32).write_to(writer)?;
        writer.write_all(bytes)?;
        written += bytes.len();
        Ok(written)
    }
}

fn utf16_len(value: &str) -> usize {
    value.chars().map(char::len_utf16).sum()
}

impl ProtocolWrite for ProtocolString {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        self.write_bounded(writer, MAX_STRING_LENGTH)
    }
}

impl ProtocolRead for ProtocolString {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        Self::read_bounded(reader, MAX_STRING_LENGTH)
    }
}

impl From<&str> for ProtocolString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ProtocolString {
    fn from(value: String) -> Self {
        Self(value)
    }
}
