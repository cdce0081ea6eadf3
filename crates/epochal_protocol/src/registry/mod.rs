//! Version-partitioned packet id registry.
//!
//! Outbound lookups go kind first: the kind's descriptors are searched for
//! the range holding the version. Inbound lookups go version first: the id
//! map for exactly `(phase, direction, version)` is selected, then the id is
//! looked up in it. Ids are reused by unrelated packets across versions, so
//! a single id map would be wrong.

mod error;
mod table;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::io::Cursor;

use bytes::{BufMut, BytesMut};
use tracing::{debug, instrument};

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::packet::{Direction, PacketKind, PacketSet};
use crate::state::ConnectionPhase;
use crate::types::{ProtocolRead, ProtocolWrite, VarInt};
use crate::version::ProtocolVersion;

pub use error::RegistryError;
pub use table::{BUILTIN, IdChange, PacketMappings};

/// Kinds the connection cannot work without on any version.
const ALWAYS_REQUIRED: &[PacketKind] = &[
    PacketKind::StatusResponse,
    PacketKind::PongResponse,
    PacketKind::LoginDisconnect,
    PacketKind::LoginSuccess,
    PacketKind::JoinGame,
    PacketKind::KeepAliveClientBound,
    PacketKind::PlayDisconnect,
];

/// Additional kinds required once the configuration phase exists.
const CONFIGURATION_REQUIRED: &[PacketKind] = &[
    PacketKind::LoginAcknowledged,
    PacketKind::FinishConfiguration,
    PacketKind::AcknowledgeFinishConfiguration,
    PacketKind::RegistryData,
];

/// Half-open range of versions, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionRange {
    pub start: ProtocolVersion,
    /// `None` when the range is still open.
    pub end: Option<ProtocolVersion>,
}

impl VersionRange {
    pub fn contains(&self, version: ProtocolVersion) -> bool {
        version >= self.start && self.end.is_none_or(|end| version < end)
    }
}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) => write!(f, "[{}, {})", self.start, end),
            None => write!(f, "[{}, ..)", self.start),
        }
    }
}

/// Binding of a packet kind to its numeric id over a range of versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketDescriptor {
    pub kind: PacketKind,
    pub phase: ConnectionPhase,
    pub direction: Direction,
    pub range: VersionRange,
    pub id: i32,
}

type PartitionKey = (ConnectionPhase, Direction, ProtocolVersion);

/// Immutable registry built once at startup and shared between connections.
#[derive(Debug, Clone)]
pub struct PacketRegistry {
    versions: Vec<ProtocolVersion>,
    /// Descriptors per kind, ordered by range start.
    outbound: HashMap<PacketKind, Vec<PacketDescriptor>>,
    inbound: HashMap<PartitionKey, HashMap<i32, PacketDescriptor>>,
}

impl PacketRegistry {
    /// Registry of the built-in packets over every known version.
    pub fn builtin() -> std::result::Result<Self, RegistryError> {
        Self::from_table(BUILTIN, ProtocolVersion::SUPPORTED)
    }

    /// Registry of the built-in packets restricted to `versions`.
    pub fn builtin_for(versions: &[ProtocolVersion]) -> std::result::Result<Self, RegistryError> {
        Self::from_table(BUILTIN, versions)
    }

    /// Builds and validates a registry. Every inconsistency in `table` is
    /// reported here rather than at lookup time.
    #[instrument(name = "packet_registry_build", skip_all, fields(
        kinds = table.len(),
        versions = versions.len(),
    ))]
    pub fn from_table(
        table: &[PacketMappings],
        versions: &[ProtocolVersion],
    ) -> std::result::Result<Self, RegistryError> {
        let mut versions = versions.to_vec();
        versions.sort();
        versions.dedup();
        if versions.is_empty() {
            return Err(RegistryError::NoVersions);
        }
        if let Some(unknown) = versions.iter().find(|version| !version.is_known()) {
            return Err(RegistryError::UnknownVersion(unknown.protocol_number()));
        }

        let mut outbound: HashMap<PacketKind, Vec<PacketDescriptor>> = HashMap::new();
        for mappings in table {
            let descriptors = descriptors_of(mappings)?;
            if outbound.insert(mappings.kind, descriptors).is_some() {
                return Err(RegistryError::DuplicateKind(mappings.kind));
            }
        }

        let mut inbound: HashMap<PartitionKey, HashMap<i32, PacketDescriptor>> = HashMap::new();
        for &version in &versions {
            for descriptor in outbound.values().flatten() {
                if !descriptor.range.contains(version) {
                    continue;
                }
                let partition = inbound
                    .entry((descriptor.phase, descriptor.direction, version))
                    .or_default();
                match partition.entry(descriptor.id) {
                    Entry::Occupied(existing) => {
                        return Err(RegistryError::DuplicateId {
                            phase: descriptor.phase,
                            direction: descriptor.direction,
                            version,
                            id: descriptor.id,
                            first: existing.get().kind,
                            second: descriptor.kind,
                        });
                    }
                    Entry::Vacant(slot) => {
                        slot.insert(*descriptor);
                    }
                }
            }
        }

        let registry = Self {
            versions,
            outbound,
            inbound,
        };
        registry.check_coverage()?;

        debug!(
            descriptors = registry.outbound.values().map(Vec::len).sum::<usize>(),
            partitions = registry.inbound.len(),
            "Packet registry ready"
        );
        Ok(registry)
    }

    fn check_coverage(&self) -> std::result::Result<(), RegistryError> {
        for &version in &self.versions {
            let configuration: &[PacketKind] = if version.has_configuration_phase() {
                CONFIGURATION_REQUIRED
            } else {
                &[]
            };
            for &kind in ALWAYS_REQUIRED.iter().chain(configuration) {
                if self.descriptor(kind, version).is_none() {
                    return Err(RegistryError::MissingKind { kind, version });
                }
            }
        }
        Ok(())
    }

    /// Supported versions, oldest first.
    pub fn versions(&self) -> &[ProtocolVersion] {
        &self.versions
    }

    pub fn is_supported(&self, version: ProtocolVersion) -> bool {
        self.versions.binary_search(&version).is_ok()
    }

    /// Descriptor of `kind` on `version`, if the kind exists there.
    pub fn descriptor(&self, kind: PacketKind, version: ProtocolVersion) -> Option<&PacketDescriptor> {
        let descriptors = self.outbound.get(&kind)?;
        let after = descriptors.partition_point(|descriptor| descriptor.range.start <= version);
        let candidate = descriptors.get(after.checked_sub(1)?)?;
        candidate.range.contains(version).then_some(candidate)
    }

    /// Descriptor to send `kind` with during `phase`.
    pub fn resolve_outbound(
        &self,
        phase: ConnectionPhase,
        kind: PacketKind,
        version: ProtocolVersion,
    ) -> Result<&PacketDescriptor> {
        if kind.phase() != phase {
            return Err(ProtocolError::WrongPhase { kind, phase });
        }
        if !self.is_supported(version) {
            return Err(ProtocolError::UnsupportedProtocolVersion(version.protocol_number()));
        }
        self.descriptor(kind, version)
            .ok_or(ProtocolError::PacketUnavailable { kind, version })
    }

    /// Descriptor for a received id, looked up in the partition of exactly
    /// `(phase, direction, version)`.
    pub fn resolve_inbound(
        &self,
        phase: ConnectionPhase,
        direction: Direction,
        version: ProtocolVersion,
        id: i32,
    ) -> Result<&PacketDescriptor> {
        if !self.is_supported(version) {
            return Err(ProtocolError::UnsupportedProtocolVersion(version.protocol_number()));
        }
        self.inbound
            .get(&(phase, direction, version))
            .and_then(|partition| partition.get(&id))
            .ok_or(ProtocolError::UnknownPacketId {
                phase,
                direction,
                version,
                id,
            })
    }

    /// Writes `[VarInt id][fields]` for `packet` into `dst`.
    pub fn encode<S: PacketSet>(
        &self,
        phase: ConnectionPhase,
        packet: &S,
        ctx: &CodecContext<'_>,
        dst: &mut BytesMut,
    ) -> Result<usize> {
        let descriptor = self.resolve_outbound(phase, packet.kind(), ctx.version)?;
        let mut writer = dst.writer();
        let mut written = VarInt(descriptor.id).write_to(&mut writer)?;
        written += packet.encode_fields(&mut writer, ctx)?;
        Ok(written)
    }

    /// Decodes one packet body, id included. Bytes left after the fields
    /// fail the whole packet.
    pub fn decode<S: PacketSet>(
        &self,
        phase: ConnectionPhase,
        body: &[u8],
        ctx: &CodecContext<'_>,
    ) -> Result<S> {
        let mut cursor = Cursor::new(body);
        let (VarInt(id), _) = VarInt::read_from(&mut cursor)?;
        let descriptor = self.resolve_inbound(phase, S::DIRECTION, ctx.version, id)?;
        let packet = S::decode_fields(descriptor.kind, &mut cursor, ctx)?;

        let trailing = body.len() - cursor.position() as usize;
        if trailing > 0 {
            return Err(ProtocolError::TrailingBytes(trailing));
        }
        Ok(packet)
    }
}

fn descriptors_of(mappings: &PacketMappings) -> std::result::Result<Vec<PacketDescriptor>, RegistryError> {
    let kind = mappings.kind;
    if mappings.changes.is_empty() {
        return Err(RegistryError::EmptyMappings(kind));
    }
    if let Some(pair) = mappings
        .changes
        .windows(2)
        .find(|pair| pair[0].since >= pair[1].since)
    {
        return Err(RegistryError::UnorderedChanges {
            kind,
            version: pair[1].since,
        });
    }

    let ends = mappings
        .changes
        .iter()
        .skip(1)
        .map(|change| Some(change.since))
        .chain(std::iter::once(None));

    Ok(mappings
        .changes
        .iter()
        .zip(ends)
        .filter_map(|(change, end)| {
            change.id.map(|id| PacketDescriptor {
                kind,
                phase: kind.phase(),
                direction: kind.direction(),
                range: VersionRange {
                    start: change.since,
                    end,
                },
                id,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::{ClientBoundKeepAlive, ClientBoundPacket, ServerBoundPacket};

    fn registry() -> PacketRegistry {
        PacketRegistry::builtin().unwrap()
    }

    #[test]
    fn test_builtin_covers_every_version() {
        let registry = registry();
        assert_eq!(registry.versions(), ProtocolVersion::SUPPORTED);
        assert!(registry.is_supported(ProtocolVersion::V1_16_4));
        assert!(!registry.is_supported(ProtocolVersion::new(1000)));
    }

    #[test]
    fn test_range_search() {
        let registry = registry();
        let id = |version| registry.descriptor(PacketKind::JoinGame, version).map(|d| d.id);
        assert_eq!(id(ProtocolVersion::V1_8), Some(0x01));
        assert_eq!(id(ProtocolVersion::V1_9), Some(0x23));
        assert_eq!(id(ProtocolVersion::V1_12_2), Some(0x23));
        assert_eq!(id(ProtocolVersion::V1_13), Some(0x25));
        assert_eq!(id(ProtocolVersion::V1_21_5), Some(0x2B));
    }

    #[test]
    fn test_removed_kind() {
        let registry = registry();
        assert!(registry.descriptor(PacketKind::SpawnPlayer, ProtocolVersion::V1_7_6).is_none());
        assert!(registry.descriptor(PacketKind::SpawnPlayer, ProtocolVersion::V1_20).is_some());
        assert!(registry.descriptor(PacketKind::SpawnPlayer, ProtocolVersion::V1_20_2).is_none());

        let err = registry
            .resolve_outbound(ConnectionPhase::Play, PacketKind::ChatMessage, ProtocolVersion::V1_19)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::PacketUnavailable { .. }));
    }

    #[test]
    fn test_wrong_phase() {
        let err = registry()
            .resolve_outbound(ConnectionPhase::Login, PacketKind::JoinGame, ProtocolVersion::V1_8)
            .unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::WrongPhase {
                kind: PacketKind::JoinGame,
                phase: ConnectionPhase::Login
            }
        ));
    }

    #[test]
    fn test_encode_then_decode_clientbound() {
        let registry = registry();
        let ctx = CodecContext::defaults(ProtocolVersion::V1_12_2);
        let packet = ClientBoundPacket::from(ClientBoundKeepAlive { id: 99 });

        let mut dst = BytesMut::new();
        registry.encode(ConnectionPhase::Play, &packet, &ctx, &mut dst).unwrap();
        assert_eq!(dst[0], 0x1F);

        let decoded: ClientBoundPacket = registry.decode(ConnectionPhase::Play, &dst, &ctx).unwrap();
        assert_eq!(decoded, packet);
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let ctx = CodecContext::defaults(ProtocolVersion::V1_8);
        // keep alive id 0x00 with VarInt 5 and one extra byte
        let err = registry()
            .decode::<ServerBoundPacket>(ConnectionPhase::Play, &[0x00, 0x05, 0x00], &ctx)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::TrailingBytes(1)));
    }

    #[test]
    fn test_unsupported_version() {
        let registry = PacketRegistry::builtin_for(&[ProtocolVersion::V1_8]).unwrap();
        let err = registry
            .resolve_inbound(
                ConnectionPhase::Play,
                Direction::ServerBound,
                ProtocolVersion::V1_9,
                0x00,
            )
            .unwrap_err();
        assert!(matches!(err, ProtocolError::UnsupportedProtocolVersion(107)));
    }

    #[test]
    fn test_table_validation() {
        static UNORDERED: &[IdChange] = &[
            IdChange::at(ProtocolVersion::V1_9, 0x01),
            IdChange::at(ProtocolVersion::V1_8, 0x02),
        ];
        let table = [PacketMappings {
            kind: PacketKind::JoinGame,
            changes: UNORDERED,
        }];
        assert_eq!(
            PacketRegistry::from_table(&table, &[ProtocolVersion::V1_9]).unwrap_err(),
            RegistryError::UnorderedChanges {
                kind: PacketKind::JoinGame,
                version: ProtocolVersion::V1_8,
            }
        );

        assert_eq!(
            PacketRegistry::from_table(BUILTIN, &[ProtocolVersion::new(2)]).unwrap_err(),
            RegistryError::UnknownVersion(2)
        );

        let partial: Vec<PacketMappings> = BUILTIN
            .iter()
            .copied()
            .filter(|m| m.kind != PacketKind::PongResponse)
            .collect();
        assert!(matches!(
            PacketRegistry::from_table(&partial, &[ProtocolVersion::V1_8]).unwrap_err(),
            RegistryError::MissingKind {
                kind: PacketKind::PongResponse,
                ..
            }
        ));
    }

    #[test]
    fn test_duplicate_id_detected() {
        static CLASH: &[IdChange] = &[IdChange::at(ProtocolVersion::V1_7_2, 0x01)];
        let mut table: Vec<PacketMappings> = BUILTIN
            .iter()
            .copied()
            .filter(|m| m.kind != PacketKind::SpawnPosition)
            .collect();
        table.push(PacketMappings {
            kind: PacketKind::SpawnPosition,
            changes: CLASH,
        });
        let err = PacketRegistry::from_table(&table, &[ProtocolVersion::V1_7_2]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { id: 0x01, .. }));
    }
}
