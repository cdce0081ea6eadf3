use std::io::{Read, Write};

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::packet::{Packet, PacketKind};
use crate::types::{
    Boolean, Byte, Double, Int, Position, ProtocolRead, ProtocolString, ProtocolWrite,
    UnsignedByte, VarInt, VersionedRead, VersionedWrite,
};
use crate::version::ProtocolVersion;

use super::world::has_packed_position;

/// Confirms a server-initiated teleport, from 1.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerBoundTeleportConfirm {
    pub teleport_id: i32,
}

impl Packet for ServerBoundTeleportConfirm {
    const KIND: PacketKind = PacketKind::TeleportConfirm;

    fn encode<W: Write>(&self, writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
        VarInt(self.teleport_id).write_to(writer)
    }

    fn decode<R: Read>(reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
        let (VarInt(teleport_id), _) = VarInt::read_from(reader)?;
        Ok(Self { teleport_id })
    }
}

/// Longest chat line a client may send.
pub fn max_chat_message_length(version: ProtocolVersion) -> usize {
    if version < ProtocolVersion::V1_11 {
        100
    } else {
        256
    }
}

/// Unsigned chat line, replaced by signed chat in 1.19.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerBoundChatMessage {
    pub message: String,
}

impl Packet for ServerBoundChatMessage {
    const KIND: PacketKind = PacketKind::ChatMessage;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        ProtocolString::write_str(writer, &self.message, max_chat_message_length(ctx.version))
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (message, _) = ctx.read_string_max(reader, max_chat_message_length(ctx.version))?;
        Ok(Self { message })
    }
}

/// Eye height 1.7 clients send alongside the feet position.
pub const LEGACY_EYE_HEIGHT: f64 = 1.62;

/// 1.7 sends the head y after the feet y.
pub fn has_head_y(version: ProtocolVersion) -> bool {
    version < ProtocolVersion::V1_8
}

/// From 1.21.2 the ground flag shares a bit field with horizontal collision.
pub fn has_movement_flags(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_21_2
}

const FLAG_ON_GROUND: u8 = 0x01;
const FLAG_HORIZONTAL_COLLISION: u8 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServerBoundPlayerPosition {
    pub x: f64,
    /// Feet position.
    pub y: f64,
    pub z: f64,
    pub on_ground: bool,
    /// Only carried from 1.21.2.
    pub horizontal_collision: bool,
}

impl Packet for ServerBoundPlayerPosition {
    const KIND: PacketKind = PacketKind::PlayerPosition;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = Double(self.x).write_to(writer)?;
        written += Double(self.y).write_to(writer)?;
        if has_head_y(ctx.version) {
            written += Double(self.y + LEGACY_EYE_HEIGHT).write_to(writer)?;
        }
        written += Double(self.z).write_to(writer)?;
        if has_movement_flags(ctx.version) {
            let mut flags = 0;
            if self.on_ground {
                flags |= FLAG_ON_GROUND;
            }
            if self.horizontal_collision {
                flags |= FLAG_HORIZONTAL_COLLISION;
            }
            written += UnsignedByte(flags).write_to(writer)?;
        } else {
            written += Boolean(self.on_ground).write_to(writer)?;
        }
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (Double(x), _) = Double::read_from(reader)?;
        let (Double(y), _) = Double::read_from(reader)?;
        if has_head_y(ctx.version) {
            Double::read_from(reader)?;
        }
        let (Double(z), _) = Double::read_from(reader)?;
        let (on_ground, horizontal_collision) = if has_movement_flags(ctx.version) {
            let (UnsignedByte(flags), _) = UnsignedByte::read_from(reader)?;
            (
                flags & FLAG_ON_GROUND != 0,
                flags & FLAG_HORIZONTAL_COLLISION != 0,
            )
        } else {
            (Boolean::read_from(reader)?.0.0, false)
        };
        Ok(Self {
            x,
            y,
            z,
            on_ground,
            horizontal_collision,
        })
    }
}

/// Digging status became a VarInt in 1.9.
pub fn has_varint_dig_status(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_9
}

/// Block actions carry a client sequence number from 1.19.
pub fn has_dig_sequence(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_19
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServerBoundPlayerDigging {
    /// 0 started, 1 cancelled, 2 finished, then item actions.
    pub status: i32,
    pub location: Position,
    pub face: i8,
    pub sequence: i32,
}

impl Packet for ServerBoundPlayerDigging {
    const KIND: PacketKind = PacketKind::PlayerDigging;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = if has_varint_dig_status(ctx.version) {
            VarInt(self.status).write_to(writer)?
        } else {
            let status = i8::try_from(self.status)
                .map_err(|_| ProtocolError::invalid_value("dig status", self.status))?;
            Byte(status).write_to(writer)?
        };

        if has_packed_position(ctx.version) {
            written += self.location.write_versioned(writer, ctx)?;
        } else {
            let y = u8::try_from(self.location.y)
                .map_err(|_| ProtocolError::invalid_value("dig y", self.location.y))?;
            written += Int(self.location.x).write_to(writer)?;
            written += UnsignedByte(y).write_to(writer)?;
            written += Int(self.location.z).write_to(writer)?;
        }

        written += Byte(self.face).write_to(writer)?;
        if has_dig_sequence(ctx.version) {
            written += VarInt(self.sequence).write_to(writer)?;
        }
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let status = if has_varint_dig_status(ctx.version) {
            VarInt::read_from(reader)?.0.0
        } else {
            Byte::read_from(reader)?.0.0.into()
        };

        let location = if has_packed_position(ctx.version) {
            Position::read_versioned(reader, ctx)?.0
        } else {
            let (Int(x), _) = Int::read_from(reader)?;
            let (UnsignedByte(y), _) = UnsignedByte::read_from(reader)?;
            let (Int(z), _) = Int::read_from(reader)?;
            Position::new(x, y.into(), z)
        };

        let (Byte(face), _) = Byte::read_from(reader)?;
        let sequence = if has_dig_sequence(ctx.version) {
            VarInt::read_from(reader)?.0.0
        } else {
            0
        };
        Ok(Self {
            status,
            location,
            face,
            sequence,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn encode<P: Packet>(packet: &P, version: ProtocolVersion) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        packet.encode(&mut buffer, &CodecContext::defaults(version))?;
        Ok(buffer)
    }

    fn decode<P: Packet>(bytes: Vec<u8>, version: ProtocolVersion) -> P {
        P::decode(&mut Cursor::new(bytes), &CodecContext::defaults(version)).unwrap()
    }

    #[test]
    fn test_chat_length_limit() {
        let long = ServerBoundChatMessage {
            message: "a".repeat(150),
        };
        assert!(matches!(
            encode(&long, ProtocolVersion::V1_10),
            Err(ProtocolError::StringTooLong { .. })
        ));
        let bytes = encode(&long, ProtocolVersion::V1_11).unwrap();

        let err = ServerBoundChatMessage::decode(
            &mut Cursor::new(bytes.clone()),
            &CodecContext::defaults(ProtocolVersion::V1_10),
        )
        .unwrap_err();
        assert!(matches!(err, ProtocolError::StringTooLong { .. }));
        assert_eq!(decode::<ServerBoundChatMessage>(bytes, ProtocolVersion::V1_11), long);
    }

    #[test]
    fn test_legacy_position_has_head_y() {
        let packet = ServerBoundPlayerPosition {
            x: 1.0,
            y: 70.0,
            z: -1.0,
            on_ground: true,
            horizontal_collision: false,
        };
        let bytes = encode(&packet, ProtocolVersion::V1_7_6).unwrap();
        assert_eq!(bytes.len(), 33);
        assert_eq!(&bytes[16..24], &(70.0 + LEGACY_EYE_HEIGHT).to_be_bytes());
        assert_eq!(decode::<ServerBoundPlayerPosition>(bytes, ProtocolVersion::V1_7_6), packet);

        assert_eq!(encode(&packet, ProtocolVersion::V1_8).unwrap().len(), 25);
    }

    #[test]
    fn test_movement_flags() {
        let packet = ServerBoundPlayerPosition {
            on_ground: true,
            horizontal_collision: true,
            ..Default::default()
        };
        let bytes = encode(&packet, ProtocolVersion::V1_21_2).unwrap();
        assert_eq!(bytes[24], 0x03);
        assert_eq!(decode::<ServerBoundPlayerPosition>(bytes, ProtocolVersion::V1_21_2), packet);

        let bytes = encode(&packet, ProtocolVersion::V1_21).unwrap();
        assert_eq!(bytes[24], 0x01);
        let decoded = decode::<ServerBoundPlayerPosition>(bytes, ProtocolVersion::V1_21);
        assert!(decoded.on_ground);
        assert!(!decoded.horizontal_collision);
    }

    #[test]
    fn test_digging_layouts() {
        let packet = ServerBoundPlayerDigging {
            status: 2,
            location: Position::new(10, 64, -10),
            face: 1,
            sequence: 0,
        };

        for (version, len) in [
            (ProtocolVersion::V1_7_2, 11),
            (ProtocolVersion::V1_8, 10),
            (ProtocolVersion::V1_9, 10),
            (ProtocolVersion::V1_18_2, 10),
            (ProtocolVersion::V1_19, 11),
        ] {
            let bytes = encode(&packet, version).unwrap();
            assert_eq!(bytes.len(), len, "on {version}");
            assert_eq!(decode::<ServerBoundPlayerDigging>(bytes, version), packet);
        }
    }

    #[test]
    fn test_legacy_digging_y_range() {
        let packet = ServerBoundPlayerDigging {
            location: Position::new(0, -5, 0),
            ..Default::default()
        };
        assert!(encode(&packet, ProtocolVersion::V1_7_6).is_err());
        assert!(encode(&packet, ProtocolVersion::V1_18).is_ok());
    }
}
