//! One struct per logical packet, plus the per-direction packet sets the
//! registry dispatches into.

mod configuration;
mod handshake;
mod login;
mod status;

pub mod play;

pub use configuration::{
    ClientBoundConfigDisconnect, ClientBoundConfigKeepAlive, ClientBoundFinishConfiguration,
    ClientBoundRegistryData, RegistryContent, RegistryDataSet, RegistryEntry, RegistrySource,
    ServerBoundAcknowledgeFinishConfiguration, ServerBoundConfigKeepAlive,
};
pub use handshake::{SERVERBOUND_HANDSHAKE_ID, ServerBoundHandshake};
pub use login::{
    ClientBoundEncryptionRequest, ClientBoundLoginDisconnect, ClientBoundLoginSuccess,
    ClientBoundSetCompression, EncryptionVerification, LoginStartLayout, LoginUuidEncoding,
    PlayerPublicKey, Property, ServerBoundEncryptionResponse, ServerBoundLoginAcknowledged,
    ServerBoundLoginStart,
};
pub use play::{
    ClientBoundEntityMetadata, ClientBoundJoinGame, ClientBoundKeepAlive,
    ClientBoundPlayDisconnect, ClientBoundSetSlot, ClientBoundSpawnPlayer,
    ClientBoundSpawnPosition, ServerBoundChatMessage, ServerBoundKeepAlive,
    ServerBoundPlayerDigging, ServerBoundPlayerPosition, ServerBoundTeleportConfirm,
};
pub use status::{
    ClientBoundPongResponse, ClientBoundStatusResponse, ServerBoundPingRequest,
    ServerBoundStatusRequest,
};

use crate::packet::packet_set;

packet_set! {
    /// Every packet a client may send.
    pub enum ServerBoundPacket: ServerBound {
        Handshake(ServerBoundHandshake),
        StatusRequest(ServerBoundStatusRequest),
        PingRequest(ServerBoundPingRequest),
        LoginStart(ServerBoundLoginStart),
        EncryptionResponse(ServerBoundEncryptionResponse),
        LoginAcknowledged(ServerBoundLoginAcknowledged),
        AcknowledgeFinishConfiguration(ServerBoundAcknowledgeFinishConfiguration),
        ConfigKeepAlive(ServerBoundConfigKeepAlive),
        KeepAlive(ServerBoundKeepAlive),
        TeleportConfirm(ServerBoundTeleportConfirm),
        ChatMessage(ServerBoundChatMessage),
        PlayerPosition(ServerBoundPlayerPosition),
        PlayerDigging(ServerBoundPlayerDigging),
    }
}

packet_set! {
    /// Every packet a server may send.
    pub enum ClientBoundPacket: ClientBound {
        StatusResponse(ClientBoundStatusResponse),
        PongResponse(ClientBoundPongResponse),
        LoginDisconnect(ClientBoundLoginDisconnect),
        EncryptionRequest(ClientBoundEncryptionRequest),
        LoginSuccess(ClientBoundLoginSuccess),
        SetCompression(ClientBoundSetCompression),
        ConfigDisconnect(ClientBoundConfigDisconnect),
        FinishConfiguration(ClientBoundFinishConfiguration),
        ConfigKeepAlive(ClientBoundConfigKeepAlive),
        RegistryData(ClientBoundRegistryData),
        KeepAlive(ClientBoundKeepAlive),
        JoinGame(ClientBoundJoinGame),
        PlayDisconnect(ClientBoundPlayDisconnect),
        SetSlot(ClientBoundSetSlot),
        EntityMetadata(ClientBoundEntityMetadata),
        SpawnPlayer(ClientBoundSpawnPlayer),
        SpawnPosition(ClientBoundSpawnPosition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::{Direction, PacketKind, PacketSet};

    #[test]
    fn test_sets_cover_every_kind() {
        let serverbound = PacketKind::ALL
            .iter()
            .filter(|kind| kind.direction() == Direction::ServerBound)
            .count();
        let clientbound = PacketKind::ALL.len() - serverbound;
        assert_eq!(serverbound, 13);
        assert_eq!(clientbound, 17);
    }

    #[test]
    fn test_kind_of_variant() {
        let packet = ClientBoundPacket::from(ClientBoundKeepAlive { id: 5 });
        assert_eq!(packet.kind(), PacketKind::KeepAliveClientBound);
        assert_eq!(ClientBoundPacket::DIRECTION, Direction::ClientBound);
    }
}
