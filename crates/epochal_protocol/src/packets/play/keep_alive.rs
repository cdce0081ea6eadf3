use std::io::{Read, Write};

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::packet::{Packet, PacketKind};
use crate::types::{Int, Long, ProtocolRead, ProtocolWrite, VarInt};
use crate::version::ProtocolVersion;

/// Width of the play-phase keep alive id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeepAliveWidth {
    /// 1.7: `i32`.
    Int,
    /// 1.8 to 1.12.1: VarInt.
    VarInt,
    /// 1.12.2 onwards: `i64`.
    Long,
}

impl KeepAliveWidth {
    pub fn for_version(version: ProtocolVersion) -> Self {
        if version < ProtocolVersion::V1_8 {
            KeepAliveWidth::Int
        } else if version < ProtocolVersion::V1_12_2 {
            KeepAliveWidth::VarInt
        } else {
            KeepAliveWidth::Long
        }
    }

    fn write<W: Write>(self, writer: &mut W, id: i64) -> Result<usize> {
        let narrow = || i32::try_from(id).map_err(|_| ProtocolError::invalid_value("keep alive id", id));
        match self {
            KeepAliveWidth::Int => Int(narrow()?).write_to(writer),
            KeepAliveWidth::VarInt => VarInt(narrow()?).write_to(writer),
            KeepAliveWidth::Long => Long(id).write_to(writer),
        }
    }

    fn read<R: Read>(self, reader: &mut R) -> Result<i64> {
        Ok(match self {
            KeepAliveWidth::Int => Int::read_from(reader)?.0.0.into(),
            KeepAliveWidth::VarInt => VarInt::read_from(reader)?.0.0.into(),
            KeepAliveWidth::Long => Long::read_from(reader)?.0.0,
        })
    }
}

macro_rules! play_keep_alive {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            pub id: i64,
        }

        impl Packet for $name {
            const KIND: PacketKind = PacketKind::$kind;

            fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
                KeepAliveWidth::for_version(ctx.version).write(writer, self.id)
            }

            fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
                let id = KeepAliveWidth::for_version(ctx.version).read(reader)?;
                Ok(Self { id })
            }
        }
    };
}

play_keep_alive!(
    /// Sent by the server; the client must echo the id.
    ClientBoundKeepAlive => KeepAliveClientBound
);
play_keep_alive!(ServerBoundKeepAlive => KeepAliveServerBound);

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(id: i64, version: ProtocolVersion) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        ClientBoundKeepAlive { id }.encode(&mut buffer, &CodecContext::defaults(version))?;
        Ok(buffer)
    }

    #[test]
    fn test_id_width_per_version() {
        assert_eq!(encoded(300, ProtocolVersion::V1_7_6).unwrap(), [0, 0, 0x01, 0x2C]);
        assert_eq!(encoded(300, ProtocolVersion::V1_12_1).unwrap(), [0xAC, 0x02]);
        assert_eq!(encoded(300, ProtocolVersion::V1_12_2).unwrap().len(), 8);
    }

    #[test]
    fn test_wide_id_on_narrow_version() {
        assert!(matches!(
            encoded(i64::MAX, ProtocolVersion::V1_8),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }
}
