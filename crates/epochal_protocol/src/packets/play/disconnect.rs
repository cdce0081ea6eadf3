use std::io::{Read, Write};

use crate::codec::CodecContext;
use crate::error::Result;
use crate::packet::{Packet, PacketKind};
use crate::types::{TextComponent, VersionedRead, VersionedWrite};

/// Play-phase kick; the reason switches from JSON to NBT text in 1.20.3.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientBoundPlayDisconnect {
    pub reason: TextComponent,
}

impl ClientBoundPlayDisconnect {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: TextComponent::plain(reason),
        }
    }
}

impl Packet for ClientBoundPlayDisconnect {
    const KIND: PacketKind = PacketKind::PlayDisconnect;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        self.reason.write_versioned(writer, ctx)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (reason, _) = TextComponent::read_versioned(reader, ctx)?;
        Ok(Self { reason })
    }
}
