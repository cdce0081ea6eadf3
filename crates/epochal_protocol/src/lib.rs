//! Multi-version Minecraft Java protocol engine.
//!
//! One struct per logical packet, a registry mapping `(phase, direction,
//! version)` to packet ids, and a frame layer that works on in-memory
//! buffers. Sockets stay with the caller.

pub mod codec;
pub mod connection;
pub mod error;
pub mod frame;
pub mod packet;
pub mod packets;
pub mod registry;
pub mod state;
pub mod types;
pub mod version;

// Re-export the most commonly used types
pub use codec::{CodecContext, CodecLimits};
pub use connection::{CompressionSettings, Connection, ConnectionSettings, Inbound, RejectionFrames};
pub use error::{ErrorCategory, ProtocolError, Result};
pub use frame::{CompressionState, FrameCodec};
pub use packet::{Direction, Packet, PacketKind, PacketSet};
pub use packets::{ClientBoundPacket, ServerBoundPacket};
pub use registry::{PacketRegistry, RegistryError};
pub use state::{ConnectionPhase, HandshakeIntent, PhaseTracker};
pub use types::{ProtocolRead, ProtocolWrite, VersionedRead, VersionedWrite};
pub use version::ProtocolVersion;
