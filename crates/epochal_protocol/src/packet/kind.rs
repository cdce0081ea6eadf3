use std::fmt;

use crate::state::ConnectionPhase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Direction {
    /// Client to server.
    ServerBound,
    /// Server to client.
    ClientBound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ServerBound => write!(f, "serverbound"),
            Direction::ClientBound => write!(f, "clientbound"),
        }
    }
}

macro_rules! packet_kinds {
    ($($name:ident => ($phase:ident, $direction:ident, $label:literal)),* $(,)?) => {
        /// One logical packet, independent of its numeric id.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PacketKind {
            $($name),*
        }

        impl PacketKind {
            pub const ALL: &'static [PacketKind] = &[$(PacketKind::$name),*];

            pub fn phase(&self) -> ConnectionPhase {
                match self {
                    $(PacketKind::$name => ConnectionPhase::$phase),*
                }
            }

            pub fn direction(&self) -> Direction {
                match self {
                    $(PacketKind::$name => Direction::$direction),*
                }
            }

            pub fn name(&self) -> &'static str {
                match self {
                    $(PacketKind::$name => $label),*
                }
            }
        }
    };
}

packet_kinds! {
    Handshake => (Handshake, ServerBound, "handshake"),

    StatusRequest => (Status, ServerBound, "status request"),
    PingRequest => (Status, ServerBound, "ping request"),
    StatusResponse => (Status, ClientBound, "status response"),
    PongResponse => (Status, ClientBound, "pong response"),

    LoginStart => (Login, ServerBound, "login start"),
    EncryptionResponse => (Login, ServerBound, "encryption response"),
    LoginAcknowledged => (Login, ServerBound, "login acknowledged"),
    LoginDisconnect => (Login, ClientBound, "login disconnect"),
    EncryptionRequest => (Login, ClientBound, "encryption request"),
    LoginSuccess => (Login, ClientBound, "login success"),
    SetCompression => (Login, ClientBound, "set compression"),

    AcknowledgeFinishConfiguration => (Configuration, ServerBound, "acknowledge finish configuration"),
    ConfigKeepAliveServerBound => (Configuration, ServerBound, "configuration keep alive"),
    ConfigDisconnect => (Configuration, ClientBound, "configuration disconnect"),
    FinishConfiguration => (Configuration, ClientBound, "finish configuration"),
    ConfigKeepAliveClientBound => (Configuration, ClientBound, "configuration keep alive"),
    RegistryData => (Configuration, ClientBound, "registry data"),

    KeepAliveServerBound => (Play, ServerBound, "keep alive"),
    TeleportConfirm => (Play, ServerBound, "teleport confirm"),
    ChatMessage => (Play, ServerBound, "chat message"),
    PlayerPosition => (Play, ServerBound, "player position"),
    PlayerDigging => (Play, ServerBound, "player digging"),
    KeepAliveClientBound => (Play, ClientBound, "keep alive"),
    JoinGame => (Play, ClientBound, "join game"),
    PlayDisconnect => (Play, ClientBound, "disconnect"),
    SetSlot => (Play, ClientBound, "set slot"),
    EntityMetadata => (Play, ClientBound, "entity metadata"),
    SpawnPlayer => (Play, ClientBound, "spawn player"),
    SpawnPosition => (Play, ClientBound, "spawn position"),
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.direction(), self.name(), self.phase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_metadata() {
        assert_eq!(PacketKind::JoinGame.phase(), ConnectionPhase::Play);
        assert_eq!(PacketKind::JoinGame.direction(), Direction::ClientBound);
        assert_eq!(PacketKind::LoginAcknowledged.direction(), Direction::ServerBound);
        assert_eq!(
            PacketKind::RegistryData.to_string(),
            "clientbound registry data (configuration)"
        );
    }

    #[test]
    fn test_all_is_complete() {
        assert_eq!(PacketKind::ALL.len(), 30);
        assert!(PacketKind::ALL.windows(2).all(|w| w[0] < w[1]));
    }
}
