use std::io::{Read, Write};

use epochal_nbt::{Compound, List, Tag};

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::packet::{Packet, PacketKind};
use crate::types::{
    Boolean, Long, ProtocolRead, ProtocolWrite, TextComponent, VarInt, VersionedRead,
    VersionedWrite,
};
use crate::version::ProtocolVersion;

/// Configuration-phase kick; JSON on 1.20.2, NBT text from 1.20.3.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientBoundConfigDisconnect {
    pub reason: TextComponent,
}

impl Packet for ClientBoundConfigDisconnect {
    const KIND: PacketKind = PacketKind::ConfigDisconnect;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        self.reason.write_versioned(writer, ctx)
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        let (reason, _) = TextComponent::read_versioned(reader, ctx)?;
        Ok(Self { reason })
    }
}

macro_rules! empty_packet {
    ($(#[$meta:meta])* $name:ident => $kind:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Default)]
        pub struct $name;

        impl Packet for $name {
            const KIND: PacketKind = PacketKind::$kind;

            fn encode<W: Write>(&self, _writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
                Ok(0)
            }

            fn decode<R: Read>(_reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
                Ok(Self)
            }
        }
    };
}

empty_packet!(ClientBoundFinishConfiguration => FinishConfiguration);
empty_packet!(
    /// Moves the connection to play once received.
    ServerBoundAcknowledgeFinishConfiguration => AcknowledgeFinishConfiguration
);

macro_rules! config_keep_alive {
    ($name:ident => $kind:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
        pub struct $name {
            pub id: i64,
        }

        impl Packet for $name {
            const KIND: PacketKind = PacketKind::$kind;

            fn encode<W: Write>(&self, writer: &mut W, _ctx: &CodecContext<'_>) -> Result<usize> {
                Long(self.id).write_to(writer)
            }

            fn decode<R: Read>(reader: &mut R, _ctx: &CodecContext<'_>) -> Result<Self> {
                let (Long(id), _) = Long::read_from(reader)?;
                Ok(Self { id })
            }
        }
    };
}

config_keep_alive!(ClientBoundConfigKeepAlive => ConfigKeepAliveClientBound);
config_keep_alive!(ServerBoundConfigKeepAlive => ConfigKeepAliveServerBound);

/// One entry of a synchronized registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryEntry {
    pub id: String,
    /// `None` lets the client use its built-in copy of the entry.
    pub data: Option<Tag>,
}

impl RegistryEntry {
    pub fn new(id: impl Into<String>, data: Option<Tag>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }
}

/// Content of a Registry Data packet, which changed shape in 1.20.5.
#[derive(Debug, Clone, PartialEq)]
pub enum RegistryContent {
    /// Every registry in one compound, 1.20.2 to 1.20.4.
    Codec(Tag),
    /// A single registry and its entries, 1.20.5 onwards.
    Registry {
        registry_id: String,
        entries: Vec<RegistryEntry>,
    },
}

fn sends_registries_separately(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_20_5
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientBoundRegistryData {
    pub content: RegistryContent,
}

impl Packet for ClientBoundRegistryData {
    const KIND: PacketKind = PacketKind::RegistryData;

    fn encode<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let incompatible = || ProtocolError::IncompatibleLayout {
            kind: Self::KIND,
            version: ctx.version,
        };

        match &self.content {
            RegistryContent::Codec(tag) => {
                if sends_registries_separately(ctx.version) {
                    return Err(incompatible());
                }
                Ok(epochal_nbt::write_root(writer, ctx.nbt_framing(), "", tag)?)
            }
            RegistryContent::Registry {
                registry_id,
                entries,
            } => {
                if !sends_registries_separately(ctx.version) {
                    return Err(incompatible());
                }
                let mut written = ctx.write_string(writer, registry_id)?;
                written += VarInt(entries.len() as i32).write_to(writer)?;
                for entry in entries {
                    written += ctx.write_string(writer, &entry.id)?;
                    written += Boolean(entry.data.is_some()).write_to(writer)?;
                    if let Some(data) = &entry.data {
                        written += epochal_nbt::write_root(writer, ctx.nbt_framing(), "", data)?;
                    }
                }
                Ok(written)
            }
        }
    }

    fn decode<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<Self> {
        if !sends_registries_separately(ctx.version) {
            let (root, _) = epochal_nbt::read_root(reader, ctx.nbt_framing())?;
            return Ok(Self {
                content: RegistryContent::Codec(root.tag),
            });
        }

        let (registry_id, _) = ctx.read_string(reader)?;
        let (VarInt(count), _) = VarInt::read_from(reader)?;
        if count < 0 {
            return Err(ProtocolError::NegativeLength(count.into()));
        }
        let mut entries = Vec::with_capacity((count as usize).min(256));
        for _ in 0..count {
            let (id, _) = ctx.read_string(reader)?;
            let (Boolean(present), _) = Boolean::read_from(reader)?;
            let data = if present {
                Some(epochal_nbt::read_root(reader, ctx.nbt_framing())?.0.tag)
            } else {
                None
            };
            entries.push(RegistryEntry { id, data });
        }
        Ok(Self {
            content: RegistryContent::Registry {
                registry_id,
                entries,
            },
        })
    }
}

/// One registry to synchronize, such as `minecraft:dimension_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySource {
    pub registry_id: String,
    pub entries: Vec<RegistryEntry>,
}

/// Registry contents supplied by the host, rendered in whichever shape the
/// client's version expects.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RegistryDataSet {
    registries: Vec<RegistrySource>,
}

impl RegistryDataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(
        mut self,
        registry_id: impl Into<String>,
        entries: Vec<RegistryEntry>,
    ) -> Self {
        self.registries.push(RegistrySource {
            registry_id: registry_id.into(),
            entries,
        });
        self
    }

    pub fn registries(&self) -> &[RegistrySource] {
        &self.registries
    }

    /// Whole-codec compound as carried by Join Game (1.16 to 1.20.1) and
    /// Registry Data (1.20.2 to 1.20.4).
    ///
    /// Each registry becomes `{type, value: [{name, id, element}]}`; entries
    /// without data get an empty element.
    pub fn codec(&self) -> Tag {
        let mut codec = Compound::with_capacity(self.registries.len());
        for registry in &self.registries {
            let mut values = List::new(epochal_nbt::TagType::Compound);
            for (index, entry) in registry.entries.iter().enumerate() {
                let mut element = Compound::new();
                element.insert("name", entry.id.as_str());
                element.insert("id", index as i32);
                element.insert(
                    "element",
                    entry
                        .data
                        .clone()
                        .unwrap_or_else(|| Tag::Compound(Compound::new())),
                );
                // Every element is a compound, so the push cannot fail.
                let _ = values.push(element);
            }

            let mut wrapper = Compound::new();
            wrapper.insert("type", registry.registry_id.as_str());
            wrapper.insert("value", values);
            codec.insert(registry.registry_id.clone(), wrapper);
        }
        Tag::Compound(codec)
    }

    /// Registry Data packets to send during configuration on `version`.
    pub fn packets(&self, version: ProtocolVersion) -> Result<Vec<ClientBoundRegistryData>> {
        if !version.has_configuration_phase() {
            return Err(ProtocolError::PacketUnavailable {
                kind: PacketKind::RegistryData,
                version,
            });
        }

        if !sends_registries_separately(version) {
            return Ok(vec![ClientBoundRegistryData {
                content: RegistryContent::Codec(self.codec()),
            }]);
        }

        Ok(self
            .registries
            .iter()
            .map(|registry| ClientBoundRegistryData {
                content: RegistryContent::Registry {
                    registry_id: registry.registry_id.clone(),
                    entries: registry.entries.clone(),
                },
            })
            .collect())
    }
}
