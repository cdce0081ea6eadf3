use thiserror::Error;

use crate::packet::{Direction, PacketKind};
use crate::state::ConnectionPhase;
use crate::version::ProtocolVersion;

/// Inconsistency in a packet table, found while building the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Unknown protocol version {0} in the supported set")]
    UnknownVersion(i32),

    #[error("No protocol versions to support")]
    NoVersions,

    #[error("{0} is listed more than once")]
    DuplicateKind(PacketKind),

    #[error("{0} has no id changes")]
    EmptyMappings(PacketKind),

    #[error("Id changes of {kind} are not in version order at {version}")]
    UnorderedChanges {
        kind: PacketKind,
        version: ProtocolVersion,
    },

    #[error(
        "Id {id:#04x} is used by both {first} and {second} ({phase}/{direction}) on protocol {version}"
    )]
    DuplicateId {
        phase: ConnectionPhase,
        direction: Direction,
        version: ProtocolVersion,
        id: i32,
        first: PacketKind,
        second: PacketKind,
    },

    #[error("{kind} has no id on protocol {version}")]
    MissingKind {
        kind: PacketKind,
        version: ProtocolVersion,
    },
}
