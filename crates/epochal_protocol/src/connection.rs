//! Per-connection driver tying the frame codec, registry and phase tracker together.

use std::sync::Arc;

use bytes::{Bytes, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::codec::{CodecContext, CodecLimits};
use crate::error::{ProtocolError, Result};
use crate::frame::FrameCodec;
use crate::packet::{Packet, PacketSet};
use crate::packets::{
    ClientBoundLoginDisconnect, ClientBoundPacket, ClientBoundSetCompression,
    ClientBoundStatusResponse, ServerBoundHandshake, ServerBoundPacket,
};
use crate::registry::PacketRegistry;
use crate::state::{ConnectionPhase, HandshakeIntent, PhaseTracker};
use crate::types::{ComponentTable, ProtocolWrite, VarInt};
use crate::version::ProtocolVersion;

/// Status Response and Login Disconnect kept id 0x00 in every epoch.
const REJECTION_PACKET_ID: i32 = 0x00;

/// Frames answered to clients whose version is not supported.
#[derive(Debug, Clone)]
pub struct RejectionFrames {
    status: Bytes,
    login: Bytes,
}

impl RejectionFrames {
    /// Encodes both frames once, uncompressed, with the layouts these packets
    /// have on every version.
    pub fn build(
        status: &ClientBoundStatusResponse,
        disconnect: &ClientBoundLoginDisconnect,
        limits: &CodecLimits,
    ) -> Result<Self> {
        Ok(Self {
            status: rejection_frame(status, limits)?,
            login: rejection_frame(disconnect, limits)?,
        })
    }

    pub fn for_intent(&self, intent: HandshakeIntent) -> &Bytes {
        match intent.target_phase() {
            ConnectionPhase::Status => &self.status,
            _ => &self.login,
        }
    }
}

fn rejection_frame<P: Packet>(packet: &P, limits: &CodecLimits) -> Result<Bytes> {
    let ctx = CodecContext::defaults(ProtocolVersion::LATEST);
    let mut body = Vec::new();
    VarInt(REJECTION_PACKET_ID).write_to(&mut body)?;
    packet.encode(&mut body, &ctx)?;

    let mut frame = BytesMut::new();
    FrameCodec::new(limits).encode(Bytes::from(body), &mut frame)?;
    Ok(frame.freeze())
}

/// Compression the server asks for once login starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionSettings {
    pub threshold: usize,
    pub level: u32,
}

/// Read-only state shared by every connection.
pub struct ConnectionSettings {
    pub registry: Arc<PacketRegistry>,
    pub limits: CodecLimits,
    pub components: Arc<dyn ComponentTable>,
    pub compression: Option<CompressionSettings>,
    pub rejection: RejectionFrames,
}

impl ConnectionSettings {
    /// Set Compression packet matching these settings, if compression is on.
    pub fn set_compression(&self) -> Option<ClientBoundSetCompression> {
        self.compression.map(|compression| ClientBoundSetCompression {
            threshold: i32::try_from(compression.threshold).unwrap_or(i32::MAX),
        })
    }
}

impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("versions", &self.registry.versions().len())
            .field("limits", &self.limits)
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

/// What one inbound frame turned into.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Packet(ServerBoundPacket),
    /// The handshake named an unsupported version. The frame must be sent
    /// back as is; the connection is already closed.
    Rejected(Bytes),
}

/// Protocol state of one client connection.
///
/// Any error is fatal: the connection closes and drops whatever it buffered.
#[derive(Debug)]
pub struct Connection {
    settings: Arc<ConnectionSettings>,
    codec: FrameCodec,
    buffer: BytesMut,
    tracker: PhaseTracker,
    closed: bool,
}

impl Connection {
    pub fn new(settings: Arc<ConnectionSettings>) -> Self {
        let codec = FrameCodec::new(&settings.limits);
        Self {
            settings,
            codec,
            buffer: BytesMut::new(),
            tracker: PhaseTracker::new(),
            closed: false,
        }
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.tracker.phase()
    }

    /// Version fixed by the handshake.
    pub fn version(&self) -> Option<ProtocolVersion> {
        self.tracker.version()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn is_compressing(&self) -> bool {
        self.codec.is_compressing()
    }

    /// Appends bytes read from the socket.
    pub fn receive(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(ProtocolError::ConnectionClosed);
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    /// Next complete inbound packet, or `None` until more bytes arrive.
    pub fn poll_packet(&mut self) -> Result<Option<Inbound>> {
        if self.closed {
            return Err(ProtocolError::ConnectionClosed);
        }
        let result = self.next_inbound();
        if let Err(err) = &result {
            warn!(phase = %self.phase(), error = %err, "Closing connection after inbound error");
            self.close();
        }
        result
    }

    /// Encodes one packet as a frame into `dst`.
    pub fn send(&mut self, packet: impl Into<ClientBoundPacket>, dst: &mut BytesMut) -> Result<()> {
        if self.closed {
            return Err(ProtocolError::ConnectionClosed);
        }
        let packet = packet.into();
        let result = self.write_packet(&packet, dst);
        if let Err(err) = &result {
            warn!(kind = %packet.kind(), phase = %self.phase(), error = %err, "Closing connection after outbound error");
            self.close();
        }
        result
    }

    pub fn close(&mut self) {
        if !self.closed {
            debug!(phase = %self.phase(), buffered = self.buffer.len(), "Connection closed");
        }
        self.closed = true;
        self.buffer.clear();
    }

    fn next_inbound(&mut self) -> Result<Option<Inbound>> {
        let Some(body) = self.codec.decode(&mut self.buffer)? else {
            return Ok(None);
        };

        let phase = self.tracker.phase();
        if phase == ConnectionPhase::Handshake {
            return self.on_handshake(&body).map(Some);
        }
        let version = self.tracker.version().ok_or(ProtocolError::InvalidTransition {
            from: ConnectionPhase::Handshake,
            to: phase,
        })?;

        let ctx = CodecContext::new(
            version,
            &self.settings.limits,
            self.settings.components.as_ref(),
        );
        let packet: ServerBoundPacket = self.settings.registry.decode(phase, &body, &ctx)?;
        match packet {
            ServerBoundPacket::LoginAcknowledged(_) => {
                self.tracker.on_login_acknowledged()?;
            }
            ServerBoundPacket::AcknowledgeFinishConfiguration(_) => {
                self.tracker.on_configuration_finished()?;
            }
            _ => {}
        }
        Ok(Some(Inbound::Packet(packet)))
    }

    fn on_handshake(&mut self, body: &[u8]) -> Result<Inbound> {
        let handshake = ServerBoundHandshake::decode_body(body, &self.settings.limits)?;
        let version = handshake.version();
        let intent = handshake.intent()?;

        if !self.settings.registry.is_supported(version) {
            warn!(
                protocol = version.protocol_number(),
                address = %handshake.server_address,
                intent = ?intent,
                "Rejecting handshake from unsupported protocol version"
            );
            let frame = self.settings.rejection.for_intent(intent).clone();
            self.close();
            return Ok(Inbound::Rejected(frame));
        }

        self.tracker.on_handshake(version, intent)?;
        Ok(Inbound::Packet(ServerBoundPacket::Handshake(handshake)))
    }

    fn write_packet(&mut self, packet: &ClientBoundPacket, dst: &mut BytesMut) -> Result<()> {
        let phase = self.tracker.phase();
        let version = self.tracker.version().ok_or(ProtocolError::WrongPhase {
            kind: packet.kind(),
            phase,
        })?;

        let ctx = CodecContext::new(
            version,
            &self.settings.limits,
            self.settings.components.as_ref(),
        );
        let mut body = BytesMut::new();
        self.settings.registry.encode(phase, packet, &ctx, &mut body)?;
        self.codec.encode(body.freeze(), dst)?;

        match packet {
            ClientBoundPacket::SetCompression(set) => match set.threshold() {
                Some(threshold) => {
                    let level = self
                        .settings
                        .compression
                        .map_or(flate2::Compression::default().level(), |c| c.level);
                    self.codec.enable_compression(threshold, level);
                    debug!(threshold, level, "Compression enabled");
                }
                None => {
                    self.codec.disable_compression();
                    debug!("Compression disabled");
                }
            },
            ClientBoundPacket::LoginSuccess(_) => {
                self.tracker.on_login_success_sent()?;
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::{ClientBoundKeepAlive, ClientBoundLoginSuccess, ServerBoundLoginStart};
    use crate::types::{NoComponents, TextComponent};
    use uuid::Uuid;

    fn settings(versions: &[ProtocolVersion]) -> Arc<ConnectionSettings> {
        let limits = CodecLimits::default();
        let status = ClientBoundStatusResponse::new(
            "Epochal",
            ProtocolVersion::LATEST,
            20,
            0,
            &TextComponent::plain("hello"),
        );
        let disconnect = ClientBoundLoginDisconnect {
            reason: TextComponent::plain("Unsupported version"),
        };
        Arc::new(ConnectionSettings {
            registry: Arc::new(PacketRegistry::builtin_for(versions).unwrap()),
            limits,
            components: Arc::new(NoComponents),
            compression: Some(CompressionSettings {
                threshold: 256,
                level: 6,
            }),
            rejection: RejectionFrames::build(&status, &disconnect, &limits).unwrap(),
        })
    }

    fn client_frame(body: &[u8]) -> Vec<u8> {
        let mut frame = BytesMut::new();
        FrameCodec::new(&CodecLimits::default())
            .encode(Bytes::copy_from_slice(body), &mut frame)
            .unwrap();
        frame.to_vec()
    }

    fn handshake_frame(version: ProtocolVersion, intent: HandshakeIntent) -> Vec<u8> {
        let mut body = vec![0x00];
        ServerBoundHandshake::new(version, "localhost", 25565, intent)
            .encode(&mut body, &CodecContext::defaults(version))
            .unwrap();
        client_frame(&body)
    }

    #[test]
    fn test_unsupported_version_gets_login_rejection() {
        let settings = settings(&[ProtocolVersion::V1_20_5]);
        let mut connection = Connection::new(settings.clone());
        connection
            .receive(&handshake_frame(ProtocolVersion::V1_8, HandshakeIntent::Login))
            .unwrap();

        let inbound = connection.poll_packet().unwrap().unwrap();
        assert_eq!(
            inbound,
            Inbound::Rejected(settings.rejection.for_intent(HandshakeIntent::Login).clone())
        );
        assert!(connection.is_closed());
        assert!(matches!(
            connection.poll_packet(),
            Err(ProtocolError::ConnectionClosed)
        ));
    }

    #[test]
    fn test_send_before_handshake_fails() {
        let mut connection = Connection::new(settings(&[ProtocolVersion::V1_8]));
        let err = connection
            .send(ClientBoundKeepAlive { id: 1 }, &mut BytesMut::new())
            .unwrap_err();
        assert!(matches!(err, ProtocolError::WrongPhase { .. }));
        assert!(connection.is_closed());
    }

    #[test]
    fn test_legacy_login_enters_play() {
        let version = ProtocolVersion::V1_8;
        let mut connection = Connection::new(settings(&[version]));
        connection
            .receive(&handshake_frame(version, HandshakeIntent::Login))
            .unwrap();
        assert!(matches!(
            connection.poll_packet().unwrap(),
            Some(Inbound::Packet(ServerBoundPacket::Handshake(_)))
        ));
        assert_eq!(connection.phase(), ConnectionPhase::Login);

        let mut body = vec![0x00];
        ServerBoundLoginStart::new("Steve", None)
            .encode(&mut body, &CodecContext::defaults(version))
            .unwrap();
        connection.receive(&client_frame(&body)).unwrap();
        assert!(matches!(
            connection.poll_packet().unwrap(),
            Some(Inbound::Packet(ServerBoundPacket::LoginStart(_)))
        ));

        let mut out = BytesMut::new();
        connection
            .send(ClientBoundLoginSuccess::new(Uuid::nil(), "Steve"), &mut out)
            .unwrap();
        assert_eq!(connection.phase(), ConnectionPhase::Play);
        connection.send(ClientBoundKeepAlive { id: 7 }, &mut out).unwrap();
    }
}
