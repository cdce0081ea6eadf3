//! Per-connection settings every versioned codec reads from.

use std::io::{Read, Write};

use epochal_nbt::RootFraming;

use crate::error::Result;
use crate::types::{ComponentTable, NoComponents, ProtocolString};
use crate::version::ProtocolVersion;

pub const MAX_PACKET_LENGTH: usize = 2_097_151;
pub const MAX_UNCOMPRESSED_LENGTH: usize = 8_388_608;

/// Size ceilings applied while decoding untrusted input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecLimits {
    /// Largest accepted `totalLength` of a frame.
    pub max_frame_length: usize,
    /// Largest accepted inflated body of a compressed frame.
    pub max_uncompressed_length: usize,
    /// Ceiling for free-form strings, in UTF-16 units.
    pub max_string_length: usize,
}

impl CodecLimits {
    pub const DEFAULT: CodecLimits = CodecLimits {
        max_frame_length: MAX_PACKET_LENGTH,
        max_uncompressed_length: MAX_UNCOMPRESSED_LENGTH,
        max_string_length: crate::types::MAX_STRING_LENGTH,
    };
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

static DEFAULT_LIMITS: CodecLimits = CodecLimits::DEFAULT;
static NO_COMPONENTS: NoComponents = NoComponents;

/// Everything a versioned codec needs besides the bytes themselves.
#[derive(Clone, Copy)]
pub struct CodecContext<'a> {
    pub version: ProtocolVersion,
    pub limits: &'a CodecLimits,
    pub components: &'a dyn ComponentTable,
}

impl<'a> CodecContext<'a> {
    pub fn new(
        version: ProtocolVersion,
        limits: &'a CodecLimits,
        components: &'a dyn ComponentTable,
    ) -> Self {
        Self {
            version,
            limits,
            components,
        }
    }

    pub fn with_version(&self, version: ProtocolVersion) -> CodecContext<'a> {
        CodecContext { version, ..*self }
    }

    /// Root framing for NBT carried inside packets of this version.
    pub fn nbt_framing(&self) -> RootFraming {
        if self.version >= ProtocolVersion::V1_20_2 {
            RootFraming::Network
        } else {
            RootFraming::Legacy
        }
    }

    pub fn read_string<R: Read>(&self, reader: &mut R) -> Result<(String, usize)> {
        let (value, n) = ProtocolString::read_bounded(reader, self.limits.max_string_length)?;
        Ok((value.0, n))
    }

    pub fn read_string_max<R: Read>(&self, reader: &mut R, max_len: usize) -> Result<(String, usize)> {
        let max_len = max_len.min(self.limits.max_string_length);
        let (value, n) = ProtocolString::read_bounded(reader, max_len)?;
        Ok((value.0, n))
    }

    pub fn write_string<W: Write>(&self, writer: &mut W, value: &str) -> Result<usize> {
        ProtocolString::write_str(writer, value, self.limits.max_string_length)
    }
}

impl CodecContext<'static> {
    /// Context with default limits and no data-component knowledge.
    pub fn defaults(version: ProtocolVersion) -> Self {
        Self::new(version, &DEFAULT_LIMITS, &NO_COMPONENTS)
    }
}

impl std::fmt::Debug for CodecContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecContext")
            .field("version", &self.version)
            .field("limits", self.limits)
            .finish_non_exhaustive()
    }
}
