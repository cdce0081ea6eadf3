use std::io::{Cursor, Read, Write};

use crate::codec::{CodecContext, CodecLimits};
use crate::error::{ProtocolError, Result};
use crate::packet::{Direction, Packet, PacketKind};
use crate::state::{ConnectionPhase, HandshakeIntent};
use crate::types::{NoComponents, ProtocolRead, ProtocolString, ProtocolWrite, UnsignedShort, VarInt};
use crate::version::ProtocolVersion;

pub const SERVERBOUND_HANDSHAKE_ID: i32 = 0x00;

/// Longest host name vanilla accepts in a handshake.
const MAX_ADDRESS_LENGTH: usize = 255;

/// First packet of every connection; its layout never changed.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerBoundHandshake {
    pub protocol_version: i32,
    pub server_address: String,
    pub server_port: u16,
    pub next_state: i32,
}

impl ServerBoundHandshake {
    pub fn new(
        protocol_version: ProtocolVersion,
        server_address: impl Into<String>,
        server_port: u16,
        intent: HandshakeIntent,
    ) -> Self {
        Self {
            protocol_version: protocol_version.protocol_number(),
            server_address: server_address.into(),
            server_port,
            next_state: intent.id(),
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        ProtocolVersion::new(self.protocol_version)
    }

    pub fn intent(&self) -> Result<HandshakeIntent> {
        HandshakeIntent::from_id(self.next_state, self.version())
    }

    /// Decodes a whole handshake frame body, id included.
    ///
    /// Runs before any version is known, so it does not go through the registry.
    pub fn decode_body(body: &[u8], limits: &CodecLimits) -> Result<Self> {
        let mut cursor = Cursor::new(body);
        let (VarInt(id), _) = VarInt::read_from(&mut cursor)?;
        if id != SERVERBOUND_HANDSHAKE_ID {
            return Err(ProtocolError::UnknownPacketId {
                phase: ConnectionPhase::Handshake,
                direction: Direction::ServerBound,
                version: ProtocolVersion::OLDEST,
                id,
            });
        }

        let ctx = CodecContext::new(
            ProtocolVersion::OLDEST,
            limits,
            &NoComponents,
        );
        let handshake = Self::decode(&mut cursor, &ctx)?;
        let trailing = body.len() - cursor.position() as usize;
        if trailing > 0 {
            return Err(ProtocolError::TrailingBytes(trailing));
        }
        Ok(handshake)
    }
}

impl Packet for ServerBoundHandshake {
    const KIND: PacketKind = PacketKind::Handshake;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let mut written = 0;
        written += VarInt(self.protocol_version).write_to(writer)?;
        written += ProtocolString::write_str(
            writer,
            &self.server_address,
            MAX_ADDRESS_LENGTH.min(ctx.limits.max_string_length),
        )?;
        written += UnsignedShort(self.server_port).write_to(writer)?;
        written += VarInt(self.next_state).write_to(writer)?;
        Ok(written)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (VarInt(protocol_version), _) = VarInt::read_from(reader)?;
        let (server_address, _) = ctx.read_string_max(reader, MAX_ADDRESS_LENGTH)?;
        let (UnsignedShort(server_port), _) = UnsignedShort::read_from(reader)?;
        let (VarInt(next_state), _) = VarInt::read_from(reader)?;
        Ok(Self {
            protocol_version,
            server_address,
            server_port,
            next_state,
        })
    }
}
