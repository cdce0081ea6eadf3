use std::io::{Read, Write};

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::packet::{Packet, PacketKind};
use crate::types::{
    Byte, ItemSlot, ProtocolRead, ProtocolWrite, Short, VarInt, VersionedRead, VersionedWrite,
};
use crate::version::ProtocolVersion;

pub fn has_varint_window_id(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_21_2
}

pub fn has_state_id(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_17_1
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientBoundSetSlot {
    /// `-1` targets the cursor, `0` the player inventory.
    pub window_id: i32,
    pub state_id: i32,
    pub slot: i16,
    pub item: ItemSlot,
}

impl Packet for ClientBoundSetSlot {
    const KIND: PacketKind = PacketKind::SetSlot;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = if has_varint_window_id(ctx.version) {
            VarInt(self.window_id).write_to(writer)?
        } else {
            let window_id = i8::try_from(self.window_id)
                .map_err(|_| ProtocolError::invalid_value("window id", self.window_id))?;
            Byte(window_id).write_to(writer)?
        };
        if has_state_id(ctx.version) {
            written += VarInt(self.state_id).write_to(writer)?;
        }
        written += Short(self.slot).write_to(writer)?;
        written += self.item.write_versioned(writer, ctx)?;
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let window_id = if has_varint_window_id(ctx.version) {
            VarInt::read_from(reader)?.0.0
        } else {
            Byte::read_from(reader)?.0.0.into()
        };
        let state_id = if has_state_id(ctx.version) {
            VarInt::read_from(reader)?.0.0
        } else {
            0
        };
        let (Short(slot), _) = Short::read_from(reader)?;
        let (item, _) = ItemSlot::read_versioned(reader, ctx)?;
        Ok(Self {
            window_id,
            state_id,
            slot,
            item,
        })
    }
}
