use std::io::{Read, Write};

use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite};
use crate::types::{Long, VarInt};

/// Bit mask sent as a VarInt word count followed by 64-bit words.
///
/// Bits past the last word read as unset, so a mask longer or shorter than
/// what the reader expects is accepted as is.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitSet(Vec<u64>);

impl BitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_words(words: Vec<u64>) -> Self {
        Self(words)
    }

    pub fn words(&self) -> &[u64] {
        &self.0
    }

    pub fn get(&self, bit: usize) -> bool {
        self.0
            .get(bit / 64)
            .is_some_and(|word| word & (1 << (bit % 64)) != 0)
    }

    pub fn set(&mut self, bit: usize, value: bool) {
        let index = bit / 64;
        if index >= self.0.len() {
            if !value {
                return;
            }
            self.0.resize(index + 1, 0);
        }
        if value {
            self.0[index] |= 1 << (bit % 64);
        } else {
            self.0[index] &= !(1 << (bit % 64));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|word| *word == 0)
    }

    fn significant_words(&self) -> &[u64] {
        let len = self
            .0
            .iter()
            .rposition(|word| *word != 0)
            .map_or(0, |last| last + 1);
        &self.0[..len]
    }
}

impl ProtocolWrite for BitSet {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let words = self.significant_words();
        let mut written = VarInt(words.len() as i32).write_to(writer)?;
        for word in words {
            written += Long(*word as i64).write_to(writer)?;
        }
        Ok(written)
    }
}

impl ProtocolRead for BitSet {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let (VarInt(count), mut read) = VarInt::read_from(reader)?;
        let count =
            usize::try_from(count).map_err(|_| ProtocolError::NegativeLength(count.into()))?;

        let mut words = Vec::with_capacity(count.min(64));
        for _ in 0..count {
            let (Long(word), n) = Long::read_from(reader)?;
            words.push(word as u64);
            read += n;
        }
        Ok((Self(words), read))
    }
}
