//! Play-phase packets.

mod disconnect;
mod entity;
mod inventory;
mod join_game;
mod keep_alive;
mod player;
mod world;

pub use disconnect::ClientBoundPlayDisconnect;
pub use entity::{ClientBoundEntityMetadata, ClientBoundSpawnPlayer};
pub use inventory::ClientBoundSetSlot;
pub use join_game::{ClientBoundJoinGame, DeathLocation, JoinGameLayout};
pub use keep_alive::{ClientBoundKeepAlive, KeepAliveWidth, ServerBoundKeepAlive};
pub use player::{
    LEGACY_EYE_HEIGHT, ServerBoundChatMessage, ServerBoundPlayerDigging,
    ServerBoundPlayerPosition, ServerBoundTeleportConfirm, max_chat_message_length,
};
pub use world::ClientBoundSpawnPosition;
