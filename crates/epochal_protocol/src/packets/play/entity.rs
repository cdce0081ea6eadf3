use std::io::{Read, Write};

use uuid::Uuid;

use crate::codec::CodecContext;
use crate::error::Result;
use crate::packet::{Packet, PacketKind};
use crate::types::{
    Angle, Double, EntityMetadata, Int, MetadataFormat, ProtocolRead, ProtocolUuid, ProtocolWrite,
    Short, VarInt, VersionedRead, VersionedWrite,
};
use crate::version::ProtocolVersion;

/// Entity ids became VarInts in 1.8.
fn has_varint_entity_id(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_8
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientBoundEntityMetadata {
    pub entity_id: i32,
    pub metadata: EntityMetadata,
}

impl Packet for ClientBoundEntityMetadata {
    const KIND: PacketKind = PacketKind::EntityMetadata;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = if has_varint_entity_id(ctx.version) {
            VarInt(self.entity_id).write_to(writer)?
        } else {
            Int(self.entity_id).write_to(writer)?
        };
        written += self.metadata.write_versioned(writer, ctx)?;
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let entity_id = if has_varint_entity_id(ctx.version) {
            VarInt::read_from(reader)?.0.0
        } else {
            Int::read_from(reader)?.0.0
        };
        let (metadata, _) = EntityMetadata::read_versioned(reader, ctx)?;
        Ok(Self {
            entity_id,
            metadata,
        })
    }
}

/// 1.8 sends coordinates as fixed-point integers in 1/32 blocks.
pub fn has_fixed_point_coordinates(version: ProtocolVersion) -> bool {
    version < ProtocolVersion::V1_9
}

/// The held item was dropped in 1.9.
pub fn has_held_item(version: ProtocolVersion) -> bool {
    version < ProtocolVersion::V1_9
}

fn metadata_format(version: ProtocolVersion) -> MetadataFormat {
    MetadataFormat::present_until(version, ProtocolVersion::V1_15)
}

fn to_fixed_point(value: f64) -> i32 {
    (value * 32.0).floor() as i32
}

fn from_fixed_point(value: i32) -> f64 {
    f64::from(value) / 32.0
}

/// Spawns another player in view. Available from 1.8 until 1.20.2, which
/// folded it into the generic entity spawn.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClientBoundSpawnPlayer {
    pub entity_id: i32,
    pub uuid: Uuid,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub yaw: Angle,
    pub pitch: Angle,
    pub held_item: i16,
    /// Ignored from 1.15.
    pub metadata: EntityMetadata,
}

impl Packet for ClientBoundSpawnPlayer {
    const KIND: PacketKind = PacketKind::SpawnPlayer;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = VarInt(self.entity_id).write_to(writer)?;
        written += ProtocolUuid(self.uuid).write_to(writer)?;
        if has_fixed_point_coordinates(ctx.version) {
            for coordinate in [self.x, self.y, self.z] {
                written += Int(to_fixed_point(coordinate)).write_to(writer)?;
            }
        } else {
            for coordinate in [self.x, self.y, self.z] {
                written += Double(coordinate).write_to(writer)?;
            }
        }
        written += self.yaw.write_to(writer)?;
        written += self.pitch.write_to(writer)?;
        if has_held_item(ctx.version) {
            written += Short(self.held_item).write_to(writer)?;
        }
        written += self
            .metadata
            .write_with_format(writer, metadata_format(ctx.version), ctx)?;
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (VarInt(entity_id), _) = VarInt::read_from(reader)?;
        let (ProtocolUuid(uuid), _) = ProtocolUuid::read_from(reader)?;
        let mut coordinates = [0.0; 3];
        for coordinate in &mut coordinates {
            *coordinate = if has_fixed_point_coordinates(ctx.version) {
                from_fixed_point(Int::read_from(reader)?.0.0)
            } else {
                Double::read_from(reader)?.0.0
            };
        }
        let [x, y, z] = coordinates;
        let (yaw, _) = Angle::read_from(reader)?;
        let (pitch, _) = Angle::read_from(reader)?;
        let held_item = if has_held_item(ctx.version) {
            Short::read_from(reader)?.0.0
        } else {
            0
        };
        let (metadata, _) =
            EntityMetadata::read_with_format(reader, metadata_format(ctx.version), ctx)?;
        Ok(Self {
            entity_id,
            uuid,
            x,
            y,
            z,
            yaw,
            pitch,
            held_item,
            metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetadataValue;
    use std::io::Cursor;

    fn encode<P: Packet>(packet: &P, version: ProtocolVersion) -> Vec<u8> {
        let mut buffer = Vec::new();
        packet
            .encode(&mut buffer, &CodecContext::defaults(version))
            .unwrap();
        buffer
    }

    #[test]
    fn test_entity_id_width() {
        let mut metadata = EntityMetadata::new();
        metadata.push(0, MetadataValue::Byte(0x02));
        let packet = ClientBoundEntityMetadata {
            entity_id: 7,
            metadata,
        };

        // 1.7: Int id, byte-packed entry, 0x7F terminator
        assert_eq!(
            encode(&packet, ProtocolVersion::V1_7_6),
            [0x00, 0x00, 0x00, 0x07, 0x00, 0x02, 0x7F]
        );
        // 1.9: VarInt id, typed entry, 0xFF terminator
        let bytes = encode(&packet, ProtocolVersion::V1_9);
        assert_eq!(bytes, [0x07, 0x00, 0x00, 0x02, 0xFF]);

        let ctx = CodecContext::defaults(ProtocolVersion::V1_9);
        let decoded = ClientBoundEntityMetadata::decode(&mut Cursor::new(bytes), &ctx).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_spawn_player_coordinates() {
        let packet = ClientBoundSpawnPlayer {
            entity_id: 1,
            uuid: Uuid::from_u128(0x1234),
            x: 10.5,
            y: 64.0,
            z: -3.25,
            yaw: Angle(64),
            pitch: Angle(0),
            held_item: 0,
            metadata: EntityMetadata::new(),
        };

        let fixed = encode(&packet, ProtocolVersion::V1_8);
        // id, uuid, three ints, two angles, held item, terminator
        assert_eq!(fixed.len(), 1 + 16 + 12 + 2 + 2 + 1);
        assert_eq!(&fixed[17..21], &336i32.to_be_bytes());

        let doubles = encode(&packet, ProtocolVersion::V1_14_4);
        assert_eq!(doubles.len(), 1 + 16 + 24 + 2 + 1);

        let without_metadata = encode(&packet, ProtocolVersion::V1_15);
        assert_eq!(without_metadata.len(), 1 + 16 + 24 + 2);

        for (version, bytes) in [
            (ProtocolVersion::V1_8, fixed),
            (ProtocolVersion::V1_15, without_metadata),
        ] {
            let ctx = CodecContext::defaults(version);
            let decoded = ClientBoundSpawnPlayer::decode(&mut Cursor::new(bytes), &ctx).unwrap();
            assert_eq!(decoded, packet, "on {version}");
        }
    }
}
