use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};

use crate::codec::CodecContext;
use crate::error::Result;

/// Shape that does not depend on the negotiated version.
pub trait ProtocolWrite {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize>;
}

pub trait ProtocolRead: Sized {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)>;
}

/// Shape selected by `ctx.version`.
pub trait VersionedWrite {
    fn write_versioned<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize>;
}

pub trait VersionedRead: Sized {
    fn read_versioned<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<(Self, usize)>;
}

pub trait WriteToBytes {
    fn write_to_bytes(&self, bytes: &mut BytesMut) -> Result<usize>;
}

impl<T: ProtocolWrite> WriteToBytes for T {
    fn write_to_bytes(&self, bytes: &mut BytesMut) -> Result<usize> {
        let mut writer = bytes.writer();
        self.write_to(&mut writer)
    }
}
