use std::io::{Read, Write};

use epochal_nbt::Tag;
use uuid::Uuid;

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite, VersionedRead, VersionedWrite};
use crate::types::{
    Boolean, Byte, Float, GlobalPos, Int, ItemSlot, Position, ProtocolUuid, Short,
    TextComponent, UnsignedByte, VarInt, VarLong,
};
use crate::version::ProtocolVersion;

const LEGACY_TERMINATOR: u8 = 0x7F;
const TYPED_TERMINATOR: u8 = 0xFF;

/// Wire generation of an entity metadata list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataFormat {
    /// `(type << 5) | index` key byte, `0x7F` terminator. Before 1.9.
    BytePacked,
    /// `u8` index, VarInt type, value; `0xFF` terminator. 1.9 onwards.
    Typed,
    /// The packet carries no metadata on this version.
    Absent,
}

impl MetadataFormat {
    pub fn for_version(version: ProtocolVersion) -> Self {
        if version < ProtocolVersion::V1_9 {
            MetadataFormat::BytePacked
        } else {
            MetadataFormat::Typed
        }
    }

    /// Format for a packet that stopped carrying metadata at `dropped_in`.
    pub fn present_until(version: ProtocolVersion, dropped_in: ProtocolVersion) -> Self {
        if version >= dropped_in {
            MetadataFormat::Absent
        } else {
            Self::for_version(version)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataType {
    Byte,
    Short,
    Int,
    VarInt,
    VarLong,
    Float,
    String,
    Chat,
    OptChat,
    Slot,
    Boolean,
    Rotation,
    Position,
    OptPosition,
    Direction,
    OptUuid,
    BlockState,
    OptBlockState,
    Nbt,
    /// Id is reserved in the table but its payload cannot be decoded.
    Particle,
    /// List of particles from 1.20.5. Reserved like `Particle`.
    Particles,
    VillagerData,
    OptVarInt,
    Pose,
    CatVariant,
    CowVariant,
    WolfVariant,
    WolfSoundVariant,
    FrogVariant,
    PigVariant,
    ChickenVariant,
    OptGlobalPos,
    /// Registry id before 1.21; afterwards a holder whose inline form is not decodable.
    PaintingVariant,
    SnifferState,
    ArmadilloState,
    Vector3,
    Quaternion,
    /// Three `i32`, only in the byte-packed format.
    Coords,
}

use MetadataType as T;

const BYTE_PACKED: &[MetadataType] = &[
    T::Byte,
    T::Short,
    T::Int,
    T::Float,
    T::String,
    T::Slot,
    T::Coords,
    T::Rotation,
];

const TYPED_1_9: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::Float,
    T::String,
    T::Chat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::OptBlockState,
];

const TYPED_1_12: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::Float,
    T::String,
    T::Chat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::OptBlockState,
    T::Nbt,
];

const TYPED_1_13: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::Float,
    T::String,
    T::Chat,
    T::OptChat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::OptBlockState,
    T::Nbt,
    T::Particle,
];

const TYPED_1_14: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::Float,
    T::String,
    T::Chat,
    T::OptChat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::OptBlockState,
    T::Nbt,
    T::Particle,
    T::VillagerData,
    T::OptVarInt,
    T::Pose,
];

const TYPED_1_19: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::Float,
    T::String,
    T::Chat,
    T::OptChat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::OptBlockState,
    T::Nbt,
    T::Particle,
    T::VillagerData,
    T::OptVarInt,
    T::Pose,
    T::CatVariant,
    T::FrogVariant,
    T::OptGlobalPos,
    T::PaintingVariant,
];

const TYPED_1_19_3: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::VarLong,
    T::Float,
    T::String,
    T::Chat,
    T::OptChat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::OptBlockState,
    T::Nbt,
    T::Particle,
    T::VillagerData,
    T::OptVarInt,
    T::Pose,
    T::CatVariant,
    T::FrogVariant,
    T::OptGlobalPos,
    T::PaintingVariant,
];

const TYPED_1_19_4: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::VarLong,
    T::Float,
    T::String,
    T::Chat,
    T::OptChat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::BlockState,
    T::OptBlockState,
    T::Nbt,
    T::Particle,
    T::VillagerData,
    T::OptVarInt,
    T::Pose,
    T::CatVariant,
    T::FrogVariant,
    T::OptGlobalPos,
    T::PaintingVariant,
    T::SnifferState,
    T::Vector3,
    T::Quaternion,
];

const TYPED_1_20_5: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::VarLong,
    T::Float,
    T::String,
    T::Chat,
    T::OptChat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::BlockState,
    T::OptBlockState,
    T::Nbt,
    T::Particle,
    T::Particles,
    T::VillagerData,
    T::OptVarInt,
    T::Pose,
    T::CatVariant,
    T::WolfVariant,
    T::FrogVariant,
    T::OptGlobalPos,
    T::PaintingVariant,
    T::SnifferState,
    T::ArmadilloState,
    T::Vector3,
    T::Quaternion,
];

const TYPED_1_21_5: &[MetadataType] = &[
    T::Byte,
    T::VarInt,
    T::VarLong,
    T::Float,
    T::String,
    T::Chat,
    T::OptChat,
    T::Slot,
    T::Boolean,
    T::Rotation,
    T::Position,
    T::OptPosition,
    T::Direction,
    T::OptUuid,
    T::BlockState,
    T::OptBlockState,
    T::Nbt,
    T::Particle,
    T::Particles,
    T::VillagerData,
    T::OptVarInt,
    T::Pose,
    T::CatVariant,
    T::CowVariant,
    T::WolfVariant,
    T::WolfSoundVariant,
    T::FrogVariant,
    T::PigVariant,
    T::ChickenVariant,
    T::OptGlobalPos,
    T::PaintingVariant,
    T::SnifferState,
    T::ArmadilloState,
    T::Vector3,
    T::Quaternion,
];

/// Type id table in effect for `version`, indexed by wire id.
fn type_table(version: ProtocolVersion) -> &'static [MetadataType] {
    if version < ProtocolVersion::V1_9 {
        BYTE_PACKED
    } else if version < ProtocolVersion::V1_12 {
        TYPED_1_9
    } else if version < ProtocolVersion::V1_13 {
        TYPED_1_12
    } else if version < ProtocolVersion::V1_14 {
        TYPED_1_13
    } else if version < ProtocolVersion::V1_19 {
        TYPED_1_14
    } else if version < ProtocolVersion::V1_19_3 {
        TYPED_1_19
    } else if version < ProtocolVersion::V1_19_4 {
        TYPED_1_19_3
    } else if version < ProtocolVersion::V1_20_5 {
        TYPED_1_19_4
    } else if version < ProtocolVersion::V1_21_5 {
        TYPED_1_20_5
    } else {
        TYPED_1_21_5
    }
}

/// Painting variants are holders from 1.21: registry id plus one, zero for inline.
fn painting_is_holder(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_21
}

impl MetadataType {
    /// Resolves a wire type id, failing with `InvalidMetadataType` for unknown ids.
    pub fn from_id(id: i32, version: ProtocolVersion) -> Result<Self> {
        usize::try_from(id)
            .ok()
            .and_then(|index| type_table(version).get(index).copied())
            .ok_or(ProtocolError::InvalidMetadataType(id))
    }

    /// Wire id of this type on `version`, if the type exists there.
    pub fn id(self, version: ProtocolVersion) -> Option<i32> {
        type_table(version)
            .iter()
            .position(|ty| *ty == self)
            .map(|index| index as i32)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VillagerData {
    pub villager_type: i32,
    pub profession: i32,
    pub level: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    VarInt(i32),
    VarLong(i64),
    Float(f32),
    String(String),
    Chat(TextComponent),
    OptChat(Option<TextComponent>),
    Slot(ItemSlot),
    Boolean(bool),
    Rotation([f32; 3]),
    Position(Position),
    OptPosition(Option<Position>),
    Direction(i32),
    OptUuid(Option<Uuid>),
    BlockState(i32),
    /// Zero on the wire means absent.
    OptBlockState(Option<i32>),
    Nbt(Tag),
    VillagerData(VillagerData),
    /// Sent as `value + 1`, zero meaning absent.
    OptVarInt(Option<i32>),
    Pose(i32),
    CatVariant(i32),
    CowVariant(i32),
    WolfVariant(i32),
    WolfSoundVariant(i32),
    FrogVariant(i32),
    PigVariant(i32),
    ChickenVariant(i32),
    OptGlobalPos(Option<GlobalPos>),
    PaintingVariant(i32),
    SnifferState(i32),
    ArmadilloState(i32),
    Vector3([f32; 3]),
    Quaternion([f32; 4]),
    Coords([i32; 3]),
}

impl MetadataValue {
    pub fn metadata_type(&self) -> MetadataType {
        match self {
            MetadataValue::Byte(_) => T::Byte,
            MetadataValue::Short(_) => T::Short,
            MetadataValue::Int(_) => T::Int,
            MetadataValue::VarInt(_) => T::VarInt,
            MetadataValue::VarLong(_) => T::VarLong,
            MetadataValue::Float(_) => T::Float,
            MetadataValue::String(_) => T::String,
            MetadataValue::Chat(_) => T::Chat,
            MetadataValue::OptChat(_) => T::OptChat,
            MetadataValue::Slot(_) => T::Slot,
            MetadataValue::Boolean(_) => T::Boolean,
            MetadataValue::Rotation(_) => T::Rotation,
            MetadataValue::Position(_) => T::Position,
            MetadataValue::OptPosition(_) => T::OptPosition,
            MetadataValue::Direction(_) => T::Direction,
            MetadataValue::OptUuid(_) => T::OptUuid,
            MetadataValue::BlockState(_) => T::BlockState,
            MetadataValue::OptBlockState(_) => T::OptBlockState,
            MetadataValue::Nbt(_) => T::Nbt,
            MetadataValue::VillagerData(_) => T::VillagerData,
            MetadataValue::OptVarInt(_) => T::OptVarInt,
            MetadataValue::Pose(_) => T::Pose,
            MetadataValue::CatVariant(_) => T::CatVariant,
            MetadataValue::CowVariant(_) => T::CowVariant,
            MetadataValue::WolfVariant(_) => T::WolfVariant,
            MetadataValue::WolfSoundVariant(_) => T::WolfSoundVariant,
            MetadataValue::FrogVariant(_) => T::FrogVariant,
            MetadataValue::PigVariant(_) => T::PigVariant,
            MetadataValue::ChickenVariant(_) => T::ChickenVariant,
            MetadataValue::OptGlobalPos(_) => T::OptGlobalPos,
            MetadataValue::PaintingVariant(_) => T::PaintingVariant,
            MetadataValue::SnifferState(_) => T::SnifferState,
            MetadataValue::ArmadilloState(_) => T::ArmadilloState,
            MetadataValue::Vector3(_) => T::Vector3,
            MetadataValue::Quaternion(_) => T::Quaternion,
            MetadataValue::Coords(_) => T::Coords,
        }
    }

    fn write_payload<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let written = match self {
            MetadataValue::Byte(v) => Byte(*v).write_to(writer)?,
            MetadataValue::Short(v) => Short(*v).write_to(writer)?,
            MetadataValue::Int(v) => Int(*v).write_to(writer)?,
            MetadataValue::VarInt(v)
            | MetadataValue::Direction(v)
            | MetadataValue::BlockState(v)
            | MetadataValue::Pose(v)
            | MetadataValue::CatVariant(v)
            | MetadataValue::CowVariant(v)
            | MetadataValue::WolfVariant(v)
            | MetadataValue::WolfSoundVariant(v)
            | MetadataValue::FrogVariant(v)
            | MetadataValue::PigVariant(v)
            | MetadataValue::ChickenVariant(v)
            | MetadataValue::SnifferState(v)
            | MetadataValue::ArmadilloState(v) => VarInt(*v).write_to(writer)?,
            MetadataValue::PaintingVariant(v) if painting_is_holder(ctx.version) => {
                VarInt(encode_opt_varint(Some(*v))?).write_to(writer)?
            }
            MetadataValue::PaintingVariant(v) => VarInt(*v).write_to(writer)?,
            MetadataValue::VarLong(v) => VarLong(*v).write_to(writer)?,
            MetadataValue::Float(v) => Float(*v).write_to(writer)?,
            MetadataValue::String(v) => ctx.write_string(writer, v)?,
            MetadataValue::Chat(v) => v.write_versioned(writer, ctx)?,
            MetadataValue::OptChat(v) => write_optional(writer, v.as_ref(), |w, chat| {
                chat.write_versioned(w, ctx)
            })?,
            MetadataValue::Slot(v) => v.write_versioned(writer, ctx)?,
            MetadataValue::Boolean(v) => Boolean(*v).write_to(writer)?,
            MetadataValue::Rotation(values) | MetadataValue::Vector3(values) => {
                write_floats(writer, values)?
            }
            MetadataValue::Quaternion(values) => write_floats(writer, values)?,
            MetadataValue::Position(v) => v.write_versioned(writer, ctx)?,
            MetadataValue::OptPosition(v) => {
                write_optional(writer, v.as_ref(), |w, pos| pos.write_versioned(w, ctx))?
            }
            MetadataValue::OptUuid(v) => write_optional(writer, v.as_ref(), |w, uuid| {
                ProtocolUuid(*uuid).write_to(w)
            })?,
            MetadataValue::OptBlockState(v) => VarInt(v.unwrap_or(0)).write_to(writer)?,
            MetadataValue::Nbt(tag) => epochal_nbt::write_root(writer, ctx.nbt_framing(), "", tag)?,
            MetadataValue::VillagerData(data) => {
                VarInt(data.villager_type).write_to(writer)?
                    + VarInt(data.profession).write_to(writer)?
                    + VarInt(data.level).write_to(writer)?
            }
            MetadataValue::OptVarInt(v) => VarInt(encode_opt_varint(*v)?).write_to(writer)?,
            MetadataValue::OptGlobalPos(v) => {
                write_optional(writer, v.as_ref(), |w, pos| pos.write_versioned(w, ctx))?
            }
            MetadataValue::Coords(values) => {
                let mut written = 0;
                for v in values {
                    written += Int(*v).write_to(writer)?;
                }
                written
            }
        };
        Ok(written)
    }

    fn read_payload<R: Read>(
        reader: &mut R,
        ty: MetadataType,
        type_id: i32,
        ctx: &CodecContext<'_>,
    ) -> Result<(Self, usize)> {
        let value = match ty {
            T::Byte => Byte::read_from(reader).map(|(v, n)| (MetadataValue::Byte(v.0), n))?,
            T::Short => Short::read_from(reader).map(|(v, n)| (MetadataValue::Short(v.0), n))?,
            T::Int => Int::read_from(reader).map(|(v, n)| (MetadataValue::Int(v.0), n))?,
            T::VarInt => read_varint(reader, MetadataValue::VarInt)?,
            T::Direction => read_varint(reader, MetadataValue::Direction)?,
            T::BlockState => read_varint(reader, MetadataValue::BlockState)?,
            T::Pose => read_varint(reader, MetadataValue::Pose)?,
            T::CatVariant => read_varint(reader, MetadataValue::CatVariant)?,
            T::CowVariant => read_varint(reader, MetadataValue::CowVariant)?,
            T::WolfVariant => read_varint(reader, MetadataValue::WolfVariant)?,
            T::WolfSoundVariant => read_varint(reader, MetadataValue::WolfSoundVariant)?,
            T::FrogVariant => read_varint(reader, MetadataValue::FrogVariant)?,
            T::PigVariant => read_varint(reader, MetadataValue::PigVariant)?,
            T::ChickenVariant => read_varint(reader, MetadataValue::ChickenVariant)?,
            T::SnifferState => read_varint(reader, MetadataValue::SnifferState)?,
            T::ArmadilloState => read_varint(reader, MetadataValue::ArmadilloState)?,
            T::PaintingVariant if painting_is_holder(ctx.version) => {
                let (VarInt(raw), n) = VarInt::read_from(reader)?;
                match decode_opt_varint(raw)? {
                    Some(id) => (MetadataValue::PaintingVariant(id), n),
                    None => return Err(ProtocolError::InvalidMetadataType(type_id)),
                }
            }
            T::PaintingVariant => read_varint(reader, MetadataValue::PaintingVariant)?,
            T::VarLong => {
                VarLong::read_from(reader).map(|(v, n)| (MetadataValue::VarLong(v.0), n))?
            }
            T::Float => Float::read_from(reader).map(|(v, n)| (MetadataValue::Float(v.0), n))?,
            T::String => {
                let (value, n) = ctx.read_string(reader)?;
                (MetadataValue::String(value), n)
            }
            T::Chat => {
                let (chat, n) = TextComponent::read_versioned(reader, ctx)?;
                (MetadataValue::Chat(chat), n)
            }
            T::OptChat => {
                let (chat, n) = read_optional(reader, |r| TextComponent::read_versioned(r, ctx))?;
                (MetadataValue::OptChat(chat), n)
            }
            T::Slot => {
                let (slot, n) = ItemSlot::read_versioned(reader, ctx)?;
                (MetadataValue::Slot(slot), n)
            }
            T::Boolean => {
                Boolean::read_from(reader).map(|(v, n)| (MetadataValue::Boolean(v.0), n))?
            }
            T::Rotation => {
                let (values, n) = read_floats(reader)?;
                (MetadataValue::Rotation(values), n)
            }
            T::Vector3 => {
                let (values, n) = read_floats(reader)?;
                (MetadataValue::Vector3(values), n)
            }
            T::Quaternion => {
                let (values, n) = read_floats(reader)?;
                (MetadataValue::Quaternion(values), n)
            }
            T::Position => {
                let (pos, n) = Position::read_versioned(reader, ctx)?;
                (MetadataValue::Position(pos), n)
            }
            T::OptPosition => {
                let (pos, n) = read_optional(reader, |r| Position::read_versioned(r, ctx))?;
                (MetadataValue::OptPosition(pos), n)
            }
            T::OptUuid => {
                let (uuid, n) = read_optional(reader, |r| ProtocolUuid::read_from(r))?;
                (MetadataValue::OptUuid(uuid.map(|u| u.0)), n)
            }
            T::OptBlockState => {
                let (VarInt(state), n) = VarInt::read_from(reader)?;
                let state = (state != 0).then_some(state);
                (MetadataValue::OptBlockState(state), n)
            }
            T::Nbt => {
                let (root, n) = epochal_nbt::read_root(reader, ctx.nbt_framing())?;
                (MetadataValue::Nbt(root.tag), n)
            }
            T::VillagerData => {
                let (VarInt(villager_type), a) = VarInt::read_from(reader)?;
                let (VarInt(profession), b) = VarInt::read_from(reader)?;
                let (VarInt(level), c) = VarInt::read_from(reader)?;
                let data = VillagerData {
                    villager_type,
                    profession,
                    level,
                };
                (MetadataValue::VillagerData(data), a + b + c)
            }
            T::OptVarInt => {
                let (VarInt(raw), n) = VarInt::read_from(reader)?;
                (MetadataValue::OptVarInt(decode_opt_varint(raw)?), n)
            }
            T::OptGlobalPos => {
                let (pos, n) = read_optional(reader, |r| GlobalPos::read_versioned(r, ctx))?;
                (MetadataValue::OptGlobalPos(pos), n)
            }
            T::Coords => {
                let (Int(x), a) = Int::read_from(reader)?;
                let (Int(y), b) = Int::read_from(reader)?;
                let (Int(z), c) = Int::read_from(reader)?;
                (MetadataValue::Coords([x, y, z]), a + b + c)
            }
            T::Particle | T::Particles => return Err(ProtocolError::InvalidMetadataType(type_id)),
        };
        Ok(value)
    }
}

fn read_varint<R: Read>(reader: &mut R, wrap: fn(i32) -> MetadataValue) -> Result<(MetadataValue, usize)> {
    let (VarInt(value), n) = VarInt::read_from(reader)?;
    Ok((wrap(value), n))
}

/// Zero means absent, anything else is `value + 1`.
fn encode_opt_varint(value: Option<i32>) -> Result<i32> {
    match value {
        None => Ok(0),
        Some(value) => value
            .checked_add(1)
            .ok_or(ProtocolError::invalid_value("optional varint", value)),
    }
}

fn decode_opt_varint(raw: i32) -> Result<Option<i32>> {
    if raw == 0 {
        return Ok(None);
    }
    raw.checked_sub(1)
        .map(Some)
        .ok_or(ProtocolError::invalid_value("optional varint", raw))
}

fn write_floats<W: Write>(writer: &mut W, values: &[f32]) -> Result<usize> {
    let mut written = 0;
    for v in values {
        written += Float(*v).write_to(writer)?;
    }
    Ok(written)
}

fn read_floats<R: Read, const N: usize>(reader: &mut R) -> Result<([f32; N], usize)> {
    let mut values = [0.0; N];
    let mut read = 0;
    for value in &mut values {
        let (Float(v), n) = Float::read_from(reader)?;
        *value = v;
        read += n;
    }
    Ok((values, read))
}

fn write_optional<W: Write, V>(
    writer: &mut W,
    value: Option<&V>,
    write: impl FnOnce(&mut W, &V) -> Result<usize>,
) -> Result<usize> {
    match value {
        Some(value) => Ok(Boolean(true).write_to(writer)? + write(writer, value)?),
        None => Boolean(false).write_to(writer),
    }
}

fn read_optional<R: Read, V>(
    reader: &mut R,
    read: impl FnOnce(&mut R) -> Result<(V, usize)>,
) -> Result<(Option<V>, usize)> {
    let (Boolean(present), flag) = Boolean::read_from(reader)?;
    if !present {
        return Ok((None, flag));
    }
    let (value, n) = read(reader)?;
    Ok((Some(value), flag + n))
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub index: u8,
    pub value: MetadataValue,
}

impl MetadataEntry {
    pub fn new(index: u8, value: MetadataValue) -> Self {
        Self { index, value }
    }
}

/// Entity metadata list, in wire order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityMetadata(pub Vec<MetadataEntry>);

impl EntityMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: u8, value: MetadataValue) -> &mut Self {
        self.0.push(MetadataEntry::new(index, value));
        self
    }

    pub fn get(&self, index: u8) -> Option<&MetadataValue> {
        self.0
            .iter()
            .find(|entry| entry.index == index)
            .map(|entry| &entry.value)
    }

    pub fn write_with_format<W: Write>(
        &self,
        writer: &mut W,
        format: MetadataFormat,
        ctx: &CodecContext<'_>,
    ) -> Result<usize> {
        let mut written = 0;
        match format {
            MetadataFormat::Absent => {}
            MetadataFormat::BytePacked => {
                for entry in &self.0 {
                    let type_id = entry_type_id(entry, ctx.version)?;
                    if entry.index > 0x1F {
                        return Err(ProtocolError::invalid_value("metadata index", entry.index));
                    }
                    let key = ((type_id as u8) << 5) | entry.index;
                    written += UnsignedByte(key).write_to(writer)?;
                    written += entry.value.write_payload(writer, ctx)?;
                }
                written += UnsignedByte(LEGACY_TERMINATOR).write_to(writer)?;
            }
            MetadataFormat::Typed => {
                for entry in &self.0 {
                    if entry.index == TYPED_TERMINATOR {
                        return Err(ProtocolError::invalid_value("metadata index", entry.index));
                    }
                    let type_id = entry_type_id(entry, ctx.version)?;
                    written += UnsignedByte(entry.index).write_to(writer)?;
                    written += VarInt(type_id).write_to(writer)?;
                    written += entry.value.write_payload(writer, ctx)?;
                }
                written += UnsignedByte(TYPED_TERMINATOR).write_to(writer)?;
            }
        }
        Ok(written)
    }

    pub fn read_with_format<R: Read>(
        reader: &mut R,
        format: MetadataFormat,
        ctx: &CodecContext<'_>,
    ) -> Result<(Self, usize)> {
        let mut entries = Vec::new();
        let mut read = 0;
        match format {
            MetadataFormat::Absent => {}
            MetadataFormat::BytePacked => loop {
                let (UnsignedByte(key), n) = UnsignedByte::read_from(reader)?;
                read += n;
                if key == LEGACY_TERMINATOR {
                    break;
                }
                let type_id = i32::from(key >> 5);
                let ty = MetadataType::from_id(type_id, ctx.version)?;
                let (value, n) = MetadataValue::read_payload(reader, ty, type_id, ctx)?;
                read += n;
                entries.push(MetadataEntry::new(key & 0x1F, value));
            },
            MetadataFormat::Typed => loop {
                let (UnsignedByte(index), n) = UnsignedByte::read_from(reader)?;
                read += n;
                if index == TYPED_TERMINATOR {
                    break;
                }
                let (VarInt(type_id), n) = VarInt::read_from(reader)?;
                read += n;
                let ty = MetadataType::from_id(type_id, ctx.version)?;
                let (value, n) = MetadataValue::read_payload(reader, ty, type_id, ctx)?;
                read += n;
                entries.push(MetadataEntry::new(index, value));
            },
        }
        Ok((Self(entries), read))
    }
}

fn entry_type_id(entry: &MetadataEntry, version: ProtocolVersion) -> Result<i32> {
    entry
        .value
        .metadata_type()
        .id(version)
        .ok_or(ProtocolError::invalid_value("metadata value type", entry.index))
}

impl VersionedWrite for EntityMetadata {
    fn write_versioned<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        self.write_with_format(writer, MetadataFormat::for_version(ctx.version), ctx)
    }
}

impl VersionedRead for EntityMetadata {
    fn read_versioned<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<(Self, usize)> {
        Self::read_with_format(reader, MetadataFormat::for_version(ctx.version), ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn roundtrip(metadata: &EntityMetadata, version: ProtocolVersion) -> Vec<u8> {
        let ctx = CodecContext::defaults(version);
        let mut buffer = Vec::new();
        let written = metadata.write_versioned(&mut buffer, &ctx).unwrap();
        assert_eq!(written, buffer.len());
        let (decoded, read) = EntityMetadata::read_versioned(&mut Cursor::new(&buffer), &ctx).unwrap();
        assert_eq!(read, buffer.len());
        assert_eq!(&decoded, metadata, "on {version}");
        buffer
    }

    #[test]
    fn test_byte_packed_keys() {
        let mut metadata = EntityMetadata::new();
        metadata
            .push(0, MetadataValue::Byte(0x02))
            .push(2, MetadataValue::String("Steve".into()))
            .push(6, MetadataValue::Float(20.0));

        let bytes = roundtrip(&metadata, ProtocolVersion::V1_8);
        assert_eq!(&bytes[..2], &[0x00, 0x02]);
        assert_eq!(bytes[2], (4 << 5) | 2);
        assert_eq!(*bytes.last().unwrap(), 0x7F);
    }

    #[test]
    fn test_typed_entries() {
        let mut metadata = EntityMetadata::new();
        metadata
            .push(0, MetadataValue::Byte(0))
            .push(1, MetadataValue::VarInt(300))
            .push(7, MetadataValue::OptVarInt(None))
            .push(8, MetadataValue::OptVarInt(Some(0)));

        let bytes = roundtrip(&metadata, ProtocolVersion::V1_16_4);
        assert_eq!(
            bytes,
            [0x00, 0x00, 0x00, 0x01, 0x01, 0xAC, 0x02, 0x07, 0x11, 0x00, 0x08, 0x11, 0x01, 0xFF]
        );
    }

    #[test]
    fn test_type_ids_shift_between_generations() {
        assert_eq!(MetadataType::Boolean.id(ProtocolVersion::V1_12_2), Some(6));
        assert_eq!(MetadataType::Boolean.id(ProtocolVersion::V1_13), Some(7));
        assert_eq!(MetadataType::Boolean.id(ProtocolVersion::V1_19_3), Some(8));
        assert_eq!(MetadataType::Pose.id(ProtocolVersion::V1_19_4), Some(20));
        assert_eq!(MetadataType::VarLong.id(ProtocolVersion::V1_19_1), None);
    }

    #[test]
    fn test_particles_shift_ids_from_1_20_5() {
        assert_eq!(MetadataType::VillagerData.id(ProtocolVersion::V1_20_3), Some(18));
        assert_eq!(MetadataType::Pose.id(ProtocolVersion::V1_20_3), Some(20));
        assert_eq!(MetadataType::Particles.id(ProtocolVersion::V1_20_3), None);

        assert_eq!(MetadataType::Particles.id(ProtocolVersion::V1_20_5), Some(18));
        assert_eq!(MetadataType::VillagerData.id(ProtocolVersion::V1_21), Some(19));
        assert_eq!(MetadataType::OptVarInt.id(ProtocolVersion::V1_21), Some(20));
        assert_eq!(MetadataType::Pose.id(ProtocolVersion::V1_21), Some(21));
        assert_eq!(MetadataType::Quaternion.id(ProtocolVersion::V1_21_4), Some(30));

        let ctx = CodecContext::defaults(ProtocolVersion::V1_21);
        let err = EntityMetadata::read_versioned(&mut Cursor::new([0x00, 0x12]), &ctx).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMetadataType(18)));
    }

    #[test]
    fn test_variant_ids_complete_the_table() {
        assert_eq!(MetadataType::CatVariant.id(ProtocolVersion::V1_19), Some(19));
        assert_eq!(MetadataType::PaintingVariant.id(ProtocolVersion::V1_19_3), Some(23));
        assert_eq!(MetadataType::Quaternion.id(ProtocolVersion::V1_19_4), Some(27));
        assert_eq!(MetadataType::CowVariant.id(ProtocolVersion::V1_21_4), None);
        assert_eq!(MetadataType::CowVariant.id(ProtocolVersion::V1_21_5), Some(23));
        assert_eq!(MetadataType::OptGlobalPos.id(ProtocolVersion::V1_21_5), Some(29));
        assert_eq!(MetadataType::Quaternion.id(ProtocolVersion::V1_21_5), Some(34));
    }

    #[test]
    fn test_modern_values_roundtrip() {
        let mut metadata = EntityMetadata::new();
        metadata
            .push(6, MetadataValue::Pose(1))
            .push(17, MetadataValue::SnifferState(2))
            .push(
                8,
                MetadataValue::OptGlobalPos(Some(GlobalPos {
                    dimension: "minecraft:overworld".into(),
                    position: Position::new(10, 64, -3),
                })),
            )
            .push(11, MetadataValue::Vector3([0.0, 1.5, -2.0]))
            .push(13, MetadataValue::Quaternion([0.0, 0.0, 0.0, 1.0]));

        for version in [ProtocolVersion::V1_19_4, ProtocolVersion::V1_21, ProtocolVersion::V1_21_5] {
            roundtrip(&metadata, version);
        }

        let mut metadata = EntityMetadata::new();
        metadata.push(6, MetadataValue::Pose(1));
        assert_eq!(roundtrip(&metadata, ProtocolVersion::V1_21), [0x06, 0x15, 0x01, 0xFF]);
    }

    #[test]
    fn test_painting_variant_is_a_holder_from_1_21() {
        let mut metadata = EntityMetadata::new();
        metadata.push(0, MetadataValue::PaintingVariant(7));

        assert_eq!(roundtrip(&metadata, ProtocolVersion::V1_20_5), [0x00, 0x1A, 0x07, 0xFF]);
        assert_eq!(roundtrip(&metadata, ProtocolVersion::V1_21), [0x00, 0x1A, 0x08, 0xFF]);

        let ctx = CodecContext::defaults(ProtocolVersion::V1_21);
        let err = EntityMetadata::read_versioned(&mut Cursor::new([0x00, 0x1A, 0x00]), &ctx)
            .unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMetadataType(26)));
    }

    #[test]
    fn test_opt_varint_overflow_is_rejected() {
        let ctx = CodecContext::defaults(ProtocolVersion::V1_16_4);
        let data = [0x00, 0x11, 0x80, 0x80, 0x80, 0x80, 0x08, 0xFF];
        let err = EntityMetadata::read_versioned(&mut Cursor::new(data), &ctx).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::InvalidValue {
                field: "optional varint",
                ..
            }
        ));

        let mut metadata = EntityMetadata::new();
        metadata.push(0, MetadataValue::OptVarInt(Some(i32::MAX)));
        assert!(matches!(
            metadata.write_versioned(&mut Vec::new(), &ctx),
            Err(ProtocolError::InvalidValue {
                field: "optional varint",
                ..
            })
        ));
    }

    #[test]
    fn test_unknown_type_id_fails() {
        let ctx = CodecContext::defaults(ProtocolVersion::V1_12_2);
        let err = EntityMetadata::read_versioned(&mut Cursor::new([0x00, 0x2A]), &ctx).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMetadataType(42)));

        // Particle id is known but has no decodable payload here.
        let ctx = CodecContext::defaults(ProtocolVersion::V1_14);
        let err = EntityMetadata::read_versioned(&mut Cursor::new([0x00, 0x0F]), &ctx).unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidMetadataType(15)));
    }

    #[test]
    fn test_value_missing_from_generation_is_rejected() {
        let mut metadata = EntityMetadata::new();
        metadata.push(0, MetadataValue::Pose(1));
        let ctx = CodecContext::defaults(ProtocolVersion::V1_9);
        assert!(matches!(
            metadata.write_versioned(&mut Vec::new(), &ctx),
            Err(ProtocolError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_absent_format() {
        assert_eq!(
            MetadataFormat::present_until(ProtocolVersion::V1_15, ProtocolVersion::V1_15),
            MetadataFormat::Absent
        );
        let ctx = CodecContext::defaults(ProtocolVersion::V1_15);
        let mut metadata = EntityMetadata::new();
        metadata.push(0, MetadataValue::Byte(1));
        let written = metadata
            .write_with_format(&mut Vec::new(), MetadataFormat::Absent, &ctx)
            .unwrap();
        assert_eq!(written, 0);
    }
}
