//! Error type shared by every codec, the registry and the frame layer.

use std::io;

use epochal_nbt::NbtError;
use thiserror::Error;

use crate::packet::{Direction, PacketKind};
use crate::state::ConnectionPhase;
use crate::version::ProtocolVersion;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("IO Error: {0}")]
    Io(io::Error),

    #[error("Malformed VarInt: continuation past 5 bytes or truncated input")]
    MalformedVarInt,

    #[error("Malformed VarLong: continuation past 10 bytes or truncated input")]
    MalformedVarLong,

    #[error("Buffer ended before the value was complete")]
    TruncatedBuffer,

    #[error("String too long: {length} (max: {max})")]
    StringTooLong { length: usize, max: usize },

    #[error("Invalid NBT tag type: {0:#04x}")]
    InvalidTagType(u8),

    #[error("NBT error: {0}")]
    Nbt(NbtError),

    #[error("Unknown packet id {id:#04x} for {phase}/{direction} on protocol {version}")]
    UnknownPacketId {
        phase: ConnectionPhase,
        direction: Direction,
        version: ProtocolVersion,
        id: i32,
    },

    #[error("Unsupported protocol version: {0}")]
    UnsupportedProtocolVersion(i32),

    #[error("Frame too large: {length} (max: {max})")]
    FrameTooLarge { length: usize, max: usize },

    #[error("Malformed compressed frame: {0}")]
    MalformedCompressedFrame(String),

    #[error("Negative length: {0}")]
    NegativeLength(i64),

    #[error("Invalid boolean byte: {0:#04x}")]
    InvalidBoolean(u8),

    #[error("String is not valid UTF-8")]
    InvalidUtf8,

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: i64 },

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Invalid entity metadata type: {0}")]
    InvalidMetadataType(i32),

    #[error("Unknown data component type: {0}")]
    UnknownComponentType(i32),

    #[error("Data components nested deeper than {0} levels")]
    ComponentDepthExceeded(usize),

    #[error("Position out of range: ({x}, {y}, {z})")]
    PositionOutOfRange { x: i32, y: i32, z: i32 },

    #[error("{0} unread bytes left after packet body")]
    TrailingBytes(usize),

    #[error("{kind} does not exist on protocol {version}")]
    PacketUnavailable {
        kind: PacketKind,
        version: ProtocolVersion,
    },

    #[error("{kind} cannot be used during {phase}")]
    WrongPhase {
        kind: PacketKind,
        phase: ConnectionPhase,
    },

    #[error("{kind} value has no encoding on protocol {version}")]
    IncompatibleLayout {
        kind: PacketKind,
        version: ProtocolVersion,
    },

    #[error("Invalid phase transition from {from} to {to}")]
    InvalidTransition {
        from: ConnectionPhase,
        to: ConnectionPhase,
    },

    #[error("Connection is closed")]
    ConnectionClosed,
}

/// Coarse grouping used to tell an unsupported client apart from a broken one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The peer speaks a version or packet we do not know.
    Registry,
    /// A packet body is structurally invalid.
    Payload,
    /// The framing around packets is invalid.
    Frame,
    /// Local misuse of the API, such as sending a packet in the wrong phase.
    Usage,
    Io,
}

impl ProtocolError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProtocolError::Io(_) | ProtocolError::ConnectionClosed => ErrorCategory::Io,
            ProtocolError::UnknownPacketId { .. }
            | ProtocolError::UnsupportedProtocolVersion(_) => ErrorCategory::Registry,
            ProtocolError::FrameTooLarge { .. } | ProtocolError::MalformedCompressedFrame(_) => {
                ErrorCategory::Frame
            }
            ProtocolError::PacketUnavailable { .. }
            | ProtocolError::WrongPhase { .. }
            | ProtocolError::IncompatibleLayout { .. }
            | ProtocolError::InvalidTransition { .. } => ErrorCategory::Usage,
            _ => ErrorCategory::Payload,
        }
    }

    pub fn invalid_value(field: &'static str, value: impl Into<i64>) -> Self {
        ProtocolError::InvalidValue {
            field,
            value: value.into(),
        }
    }
}

impl From<io::Error> for ProtocolError {
    fn from(err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            ProtocolError::TruncatedBuffer
        } else {
            ProtocolError::Io(err)
        }
    }
}

impl From<NbtError> for ProtocolError {
    fn from(err: NbtError) -> Self {
        match err {
            NbtError::TruncatedBuffer => ProtocolError::TruncatedBuffer,
            NbtError::InvalidTagType(id) => ProtocolError::InvalidTagType(id),
            NbtError::NegativeLength(len) => ProtocolError::NegativeLength(i64::from(len)),
            other => ProtocolError::Nbt(other),
        }
    }
}

impl From<ProtocolError> for io::Error {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::Io(e) => e,
            ProtocolError::TruncatedBuffer => io::Error::new(io::ErrorKind::UnexpectedEof, err),
            ProtocolError::UnsupportedProtocolVersion(_) => {
                io::Error::new(io::ErrorKind::Unsupported, err)
            }
            ProtocolError::ConnectionClosed => io::Error::new(io::ErrorKind::NotConnected, err),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}

pub type Result<T> = std::result::Result<T, ProtocolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unexpected_eof_maps_to_truncated() {
        let err: ProtocolError = io::Error::new(io::ErrorKind::UnexpectedEof, "eof").into();
        assert!(matches!(err, ProtocolError::TruncatedBuffer));
    }

    #[test]
    fn test_nbt_errors_map_to_protocol_kinds() {
        assert!(matches!(
            ProtocolError::from(NbtError::InvalidTagType(0x20)),
            ProtocolError::InvalidTagType(0x20)
        ));
        assert!(matches!(
            ProtocolError::from(NbtError::TruncatedBuffer),
            ProtocolError::TruncatedBuffer
        ));
    }

    #[test]
    fn test_categories() {
        assert_eq!(
            ProtocolError::UnsupportedProtocolVersion(1).category(),
            ErrorCategory::Registry
        );
        assert_eq!(
            ProtocolError::FrameTooLarge { length: 1, max: 0 }.category(),
            ErrorCategory::Frame
        );
        assert_eq!(ProtocolError::MalformedVarInt.category(), ErrorCategory::Payload);
    }
}
