use std::io::{Read, Write};

use crate::codec::CodecContext;
use crate::error::Result;
use crate::packet::{Packet, PacketKind};
use crate::types::{Float, Int, Position, ProtocolRead, ProtocolWrite, VersionedRead, VersionedWrite};
use crate::version::ProtocolVersion;

/// 1.7 sends block locations as three separate ints.
pub(crate) fn has_packed_position(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_8
}

pub fn has_spawn_angle(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_17
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientBoundSpawnPosition {
    pub location: Position,
    pub angle: f32,
}

impl Packet for ClientBoundSpawnPosition {
    const KIND: PacketKind = PacketKind::SpawnPosition;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = if has_packed_position(ctx.version) {
            self.location.write_versioned(writer, ctx)?
        } else {
            Int(self.location.x).write_to(writer)?
                + Int(self.location.y).write_to(writer)?
                + Int(self.location.z).write_to(writer)?
        };
        if has_spawn_angle(ctx.version) {
            written += Float(self.angle).write_to(writer)?;
        }
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let location = if has_packed_position(ctx.version) {
            Position::read_versioned(reader, ctx)?.0
        } else {
            let (Int(x), _) = Int::read_from(reader)?;
            let (Int(y), _) = Int::read_from(reader)?;
            let (Int(z), _) = Int::read_from(reader)?;
            Position::new(x, y, z)
        };
        let angle = if has_spawn_angle(ctx.version) {
            Float::read_from(reader)?.0.0
        } else {
            0.0
        };
        Ok(Self { location, angle })
    }
}
