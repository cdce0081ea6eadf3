mod arrays;
mod bitset;
mod component;
mod metadata;
mod position;
mod primitives;
mod slot;
mod strings;
mod text;
mod traits;
mod uuid;
mod var_numbers;

use std::io::Read;

pub use arrays::{ByteArray, PrefixedArray, ShortByteArray, read_remaining};
pub use bitset::BitSet;
pub use component::{
    ComponentShape, ComponentShapes, ComponentTable, MAX_COMPONENT_DEPTH, NoComponents,
};
pub use metadata::{
    EntityMetadata, MetadataEntry, MetadataFormat, MetadataType, MetadataValue, VillagerData,
};
pub use position::{GlobalPos, Position, PositionLayout};
pub use primitives::{
    Angle, Boolean, Byte, Double, Float, Int, Long, Short, UnsignedByte, UnsignedShort,
};
pub use slot::{ItemSlot, ItemStack, RawComponent, SlotFormat};
pub use strings::{MAX_STRING_LENGTH, ProtocolString};
pub use text::{MAX_CHAT_LENGTH, TextComponent};
pub use traits::{ProtocolRead, ProtocolWrite, VersionedRead, VersionedWrite, WriteToBytes};
pub use uuid::ProtocolUuid;
pub use var_numbers::{VarInt, VarLong};

use crate::error::{ProtocolError, Result};

pub const MAX_VARINT_LEN: usize = 5;
pub const MAX_VARLONG_LEN: usize = 10;

/// Reads exactly `len` bytes, growing the buffer only as data arrives.
pub(crate) fn read_exact_vec<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    let read = Read::take(&mut *reader, len as u64).read_to_end(&mut data)?;
    if read != len {
        return Err(ProtocolError::TruncatedBuffer);
    }
    Ok(data)
}

/// Discards exactly `len` bytes.
pub(crate) fn skip_exact<R: Read>(reader: &mut R, len: usize) -> Result<usize> {
    let skipped = std::io::copy(&mut Read::take(&mut *reader, len as u64), &mut std::io::sink())?;
    if skipped as usize != len {
        return Err(ProtocolError::TruncatedBuffer);
    }
    Ok(len)
}
