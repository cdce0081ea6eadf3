use std::io::{Read, Write};

use serde_json::{Value, json};

use crate::codec::CodecContext;
use crate::error::Result;
use crate::packet::{Packet, PacketKind};
use crate::types::{Long, MAX_CHAT_LENGTH, ProtocolRead, ProtocolString, ProtocolWrite, TextComponent};
use crate::version::ProtocolVersion;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerBoundStatusRequest;

impl Packet for ServerBoundStatusRequest {
    const KIND: PacketKind = PacketKind::StatusRequest;

    fn encode<W: Write>(&self, _writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
        Ok(0)
    }

    fn decode<R: Read>(_reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
        Ok(Self)
    }
}

/// Server list response; the JSON document is kept as sent.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientBoundStatusResponse {
    pub json: Value,
}

impl ClientBoundStatusResponse {
    pub fn new(
        version_name: &str,
        protocol: ProtocolVersion,
        max_players: i32,
        online_players: i32,
        description: &TextComponent,
    ) -> Self {
        Self {
            json: json!({
                "version": { "name": version_name, "protocol": protocol.protocol_number() },
                "players": { "max": max_players, "online": online_players },
                "description": description.0,
            }),
        }
    }

    pub fn protocol(&self) -> Option<i64> {
        self.json["version"]["protocol"].as_i64()
    }
}

impl Packet for ClientBoundStatusResponse {
    const KIND: PacketKind = PacketKind::StatusResponse;

    fn encode<W: Write>(&self, writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
        let json = serde_json::to_string(&self.json)?;
        ProtocolString::write_str(writer, &json, MAX_CHAT_LENGTH)
    }

    fn decode<R: Read>(reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
        let (json, _) = ProtocolString::read_bounded(reader, MAX_CHAT_LENGTH)?;
        Ok(Self {
            json: serde_json::from_str(&json.0)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ServerBoundPingRequest {
    pub payload: i64,
}

impl Packet for ServerBoundPingRequest {
    const KIND: PacketKind = PacketKind::PingRequest;

    fn encode<W: Write>(&self, writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
        Long(self.payload).write_to(writer)
    }

    fn decode<R: Read>(reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
        let (Long(payload), _) = Long::read_from(reader)?;
        Ok(Self { payload })
    }
}

/// Echoes the ping payload back.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClientBoundPongResponse {
    pub payload: i64,
}

impl From<ServerBoundPingRequest> for ClientBoundPongResponse {
    fn from(ping: ServerBoundPingRequest) -> Self {
        Self {
            payload: ping.payload,
        }
    }
}

impl Packet for ClientBoundPongResponse {
    const KIND: PacketKind = PacketKind::PongResponse;

    fn encode<W: Write>(&self, writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
        Long(self.payload).write_to(writer)
    }

    fn decode<R: Read>(reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
        let (Long(payload), _) = Long::read_from(reader)?;
        Ok(Self { payload })
    }
}
