//! Built-in packet id table.
//!
//! Each kind lists only the versions where its id changed. A change holds
//! until the next one; `removed` ends the kind's life.

use crate::packet::PacketKind;
use crate::version::ProtocolVersion;

/// One id boundary in a kind's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdChange {
    pub since: ProtocolVersion,
    /// `None` when the packet stops existing at `since`.
    pub id: Option<i32>,
}

impl IdChange {
    pub const fn at(since: ProtocolVersion, id: i32) -> Self {
        Self {
            since,
            id: Some(id),
        }
    }

    pub const fn removed(since: ProtocolVersion) -> Self {
        Self { since, id: None }
    }
}

/// Id history of one packet kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketMappings {
    pub kind: PacketKind,
    pub changes: &'static [IdChange],
}

macro_rules! id_table {
    (@change $version:ident => removed) => {
        IdChange::removed(ProtocolVersion::$version)
    };
    (@change $version:ident => $id:literal) => {
        IdChange::at(ProtocolVersion::$version, $id)
    };
    ($($kind:ident { $($version:ident => $id:tt),* $(,)? })*) => {
        &[$(
            PacketMappings {
                kind: PacketKind::$kind,
                changes: &[$(id_table!(@change $version => $id)),*],
            }
        ),*]
    };
}

pub static BUILTIN: &[PacketMappings] = id_table! {
    Handshake { V1_7_2 => 0x00 }

    StatusRequest { V1_7_2 => 0x00 }
    PingRequest { V1_7_2 => 0x01 }
    StatusResponse { V1_7_2 => 0x00 }
    PongResponse { V1_7_2 => 0x01 }

    LoginStart { V1_7_2 => 0x00 }
    EncryptionResponse { V1_7_2 => 0x01 }
    LoginAcknowledged { V1_20_2 => 0x03 }
    LoginDisconnect { V1_7_2 => 0x00 }
    EncryptionRequest { V1_7_2 => 0x01 }
    LoginSuccess { V1_7_2 => 0x02 }
    SetCompression { V1_8 => 0x03 }

    AcknowledgeFinishConfiguration { V1_20_2 => 0x02, V1_20_5 => 0x03 }
    ConfigKeepAliveServerBound { V1_20_2 => 0x03, V1_20_5 => 0x04 }
    ConfigDisconnect { V1_20_2 => 0x01, V1_20_5 => 0x02 }
    FinishConfiguration { V1_20_2 => 0x02, V1_20_5 => 0x03 }
    ConfigKeepAliveClientBound { V1_20_2 => 0x03, V1_20_5 => 0x04 }
    RegistryData { V1_20_2 => 0x05, V1_20_5 => 0x07 }

    KeepAliveServerBound {
        V1_7_2 => 0x00, V1_9 => 0x0B, V1_12 => 0x0C, V1_12_1 => 0x0B, V1_13 => 0x0E,
        V1_14 => 0x0F, V1_16 => 0x10, V1_17 => 0x0F, V1_19 => 0x11, V1_19_1 => 0x12,
        V1_19_3 => 0x11, V1_19_4 => 0x12, V1_20_2 => 0x14, V1_20_3 => 0x15,
        V1_20_5 => 0x18, V1_21_2 => 0x1A,
    }
    TeleportConfirm { V1_9 => 0x00 }
    ChatMessage {
        V1_7_2 => 0x01, V1_9 => 0x02, V1_12 => 0x03, V1_12_1 => 0x02, V1_14 => 0x03,
        V1_19 => removed,
    }
    PlayerPosition {
        V1_7_2 => 0x04, V1_9 => 0x0C, V1_12 => 0x0E, V1_12_1 => 0x0D, V1_13 => 0x10,
        V1_14 => 0x11, V1_16 => 0x12, V1_17 => 0x11, V1_19 => 0x13, V1_19_1 => 0x14,
        V1_19_3 => 0x13, V1_19_4 => 0x14, V1_20_2 => 0x16, V1_20_3 => 0x17,
        V1_20_5 => 0x1A, V1_21_2 => 0x1C,
    }
    PlayerDigging {
        V1_7_2 => 0x07, V1_9 => 0x13, V1_12 => 0x14, V1_13 => 0x18, V1_14 => 0x1A,
        V1_16 => 0x1B, V1_17 => 0x1A, V1_19 => 0x1C, V1_19_1 => 0x1D, V1_19_3 => 0x1C,
        V1_19_4 => 0x1D, V1_20_2 => 0x20, V1_20_3 => 0x21, V1_20_5 => 0x24,
        V1_21_2 => 0x26,
    }

    KeepAliveClientBound {
        V1_7_2 => 0x00, V1_9 => 0x1F, V1_13 => 0x21, V1_14 => 0x20, V1_15 => 0x21,
        V1_16 => 0x20, V1_16_2 => 0x1F, V1_17 => 0x21, V1_19 => 0x1E, V1_19_1 => 0x20,
        V1_19_3 => 0x1F, V1_19_4 => 0x23, V1_20_2 => 0x24, V1_20_5 => 0x26,
        V1_21_2 => 0x27, V1_21_5 => 0x26,
    }
    JoinGame {
        V1_7_2 => 0x01, V1_9 => 0x23, V1_13 => 0x25, V1_15 => 0x26, V1_16 => 0x25,
        V1_16_2 => 0x24, V1_17 => 0x26, V1_19 => 0x23, V1_19_1 => 0x25, V1_19_3 => 0x24,
        V1_19_4 => 0x28, V1_20_2 => 0x29, V1_20_5 => 0x2B, V1_21_2 => 0x2C,
        V1_21_5 => 0x2B,
    }
    PlayDisconnect {
        V1_7_2 => 0x40, V1_9 => 0x1A, V1_13 => 0x1B, V1_14 => 0x1A, V1_15 => 0x1B,
        V1_16 => 0x1A, V1_16_2 => 0x19, V1_17 => 0x1A, V1_19 => 0x17, V1_19_1 => 0x19,
        V1_19_3 => 0x17, V1_19_4 => 0x1A, V1_20_2 => 0x1B, V1_20_5 => 0x1D,
        V1_21_5 => 0x1C,
    }
    SetSlot {
        V1_7_2 => 0x2F, V1_9 => 0x16, V1_13 => 0x17, V1_14 => 0x16, V1_15 => 0x17,
        V1_16 => 0x16, V1_16_2 => 0x15, V1_17 => 0x16, V1_19 => 0x13, V1_19_3 => 0x12,
        V1_19_4 => 0x14, V1_20_2 => 0x15, V1_21_2 => 0x14,
    }
    EntityMetadata {
        V1_7_2 => 0x1C, V1_9 => 0x39, V1_12 => 0x3B, V1_12_1 => 0x3C, V1_13 => 0x3F,
        V1_14 => 0x43, V1_15 => 0x44, V1_17 => 0x4D, V1_19_1 => 0x50, V1_19_3 => 0x4E,
        V1_19_4 => 0x52, V1_20_2 => 0x54, V1_20_3 => 0x56, V1_20_5 => 0x58,
        V1_21_2 => 0x5D, V1_21_5 => 0x5C,
    }
    SpawnPlayer {
        V1_8 => 0x0C, V1_9 => 0x05, V1_16 => 0x04, V1_19 => 0x02, V1_19_4 => 0x03,
        V1_20_2 => removed,
    }
    SpawnPosition {
        V1_7_2 => 0x05, V1_9 => 0x43, V1_12 => 0x45, V1_12_1 => 0x46, V1_13 => 0x49,
        V1_14 => 0x4D, V1_15 => 0x4E, V1_16 => 0x42, V1_17 => 0x4B, V1_19 => 0x4A,
        V1_19_1 => 0x4D, V1_19_3 => 0x4C, V1_19_4 => 0x50, V1_20_2 => 0x52,
        V1_20_3 => 0x54, V1_20_5 => 0x56, V1_21_2 => 0x5B, V1_21_5 => 0x5A,
    }
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_listed_once() {
        for kind in PacketKind::ALL {
            let count = BUILTIN.iter().filter(|m| m.kind == *kind).count();
            assert_eq!(count, 1, "{kind}");
        }
    }

    #[test]
    fn test_changes_are_ordered() {
        for mappings in BUILTIN {
            assert!(
                mappings.changes.windows(2).all(|w| w[0].since < w[1].since),
                "{}",
                mappings.kind
            );
        }
    }
}
