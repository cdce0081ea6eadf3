//! Packet traits and the tagged-variant dispatch over packet sets.

use std::io::{Read, Write};

use crate::codec::CodecContext;
use crate::error::Result;

mod kind;

pub use kind::{Direction, PacketKind};

/// One logical packet with a single semantic struct across all versions.
///
/// Layout differences between versions are resolved inside `encode` and
/// `decode` from `ctx.version`.
pub trait Packet: Sized {
    const KIND: PacketKind;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize>;

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self>;
}

/// Closed set of packets travelling in one direction.
pub trait PacketSet: Sized {
    const DIRECTION: Direction;

    fn kind(&self) -> PacketKind;

    fn encode_fields<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize>;

    fn decode_fields<R: Read>(kind: PacketKind, reader: &mut R, ctx: &CodecContext<'_>)
    -> Result<Self>;
}

/// Declares a packet set enum with one variant per packet struct.
macro_rules! packet_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident: $direction:ident {
            $($variant:ident($ty:ty)),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        $vis enum $name {
            $($variant($ty)),*
        }

        impl $crate::packet::PacketSet for $name {
            const DIRECTION: $crate::packet::Direction = $crate::packet::Direction::$direction;

            fn kind(&self) -> $crate::packet::PacketKind {
                match self {
                    $($name::$variant(_) => <$ty as $crate::packet::Packet>::KIND),*
                }
            }

            fn encode_fields<W: std::io::Write>(
                &self,
                writer: &mut W,
                ctx: &$crate::codec::CodecContext<'_>,
            ) -> $crate::error::Result<usize> {
                match self {
                    $($name::$variant(packet) => $crate::packet::Packet::encode(packet, writer, ctx)),*
                }
            }

            fn decode_fields<R: std::io::Read>(
                kind: $crate::packet::PacketKind,
                reader: &mut R,
                ctx: &$crate::codec::CodecContext<'_>,
            ) -> $crate::error::Result<Self> {
                $(
                    if kind == <$ty as $crate::packet::Packet>::KIND {
                        return <$ty as $crate::packet::Packet>::decode(reader, ctx).map($name::$variant);
                    }
                )*
                Err($crate::error::ProtocolError::PacketUnavailable {
                    kind,
                    version: ctx.version,
                })
            }
        }

        $(
            impl From<$ty> for $name {
                fn from(packet: $ty) -> Self {
                    $name::$variant(packet)
                }
            }
        )*
    };
}

pub(crate) use packet_set;
