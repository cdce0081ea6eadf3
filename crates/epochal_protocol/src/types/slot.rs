use std::io::{self, Read, Write};

use epochal_nbt::{RootFraming, Tag};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite, VersionedRead, VersionedWrite};
use crate::types::{Boolean, Byte, Short, VarInt, read_exact_vec};
use crate::version::ProtocolVersion;

/// Wire generation of an item slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFormat {
    /// Short id (-1 empty), count, damage, NBT. Before 1.13.
    Legacy,
    /// Short id (-1 empty), count, NBT. 1.13 and 1.13.1.
    Flattened,
    /// Presence flag, VarInt id, count, NBT. 1.13.2 to 1.20.4.
    PresenceFlag,
    /// VarInt count (0 empty), VarInt id, component patch. 1.20.5 onwards.
    DataComponents,
}

impl SlotFormat {
    pub fn for_version(version: ProtocolVersion) -> Self {
        if version < ProtocolVersion::V1_13 {
            SlotFormat::Legacy
        } else if version < ProtocolVersion::V1_13_2 {
            SlotFormat::Flattened
        } else if version < ProtocolVersion::V1_20_5 {
            SlotFormat::PresenceFlag
        } else {
            SlotFormat::DataComponents
        }
    }
}

/// 1.7 wraps item NBT in a length-prefixed gzip blob.
fn nbt_is_gzip_blob(version: ProtocolVersion) -> bool {
    version < ProtocolVersion::V1_8
}

/// One added data component whose payload is kept as raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawComponent {
    pub component_type: i32,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemStack {
    pub item_id: i32,
    pub count: i32,
    /// Only carried before 1.13.
    pub damage: i16,
    /// Carried before 1.20.5.
    pub nbt: Option<Tag>,
    /// Carried from 1.20.5.
    pub added_components: Vec<RawComponent>,
    pub removed_components: Vec<i32>,
}

impl ItemStack {
    pub fn new(item_id: i32, count: i32) -> Self {
        Self {
            item_id,
            count,
            ..Default::default()
        }
    }
}

/// Inventory slot, `None` when empty.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemSlot(pub Option<ItemStack>);

impl ItemSlot {
    pub const EMPTY: ItemSlot = ItemSlot(None);

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }
}

impl From<ItemStack> for ItemSlot {
    fn from(stack: ItemStack) -> Self {
        ItemSlot(Some(stack))
    }
}

fn short_item_id(item_id: i32) -> Result<Short> {
    i16::try_from(item_id)
        .map(Short)
        .map_err(|_| ProtocolError::invalid_value("item id", item_id))
}

fn byte_count(count: i32) -> Result<Byte> {
    i8::try_from(count)
        .map(Byte)
        .map_err(|_| ProtocolError::invalid_value("item count", count))
}

fn write_item_nbt<W: Write>(
    writer: &mut W,
    nbt: Option<&Tag>,
    ctx: &CodecContext<'_>,
) -> Result<usize> {
    if nbt_is_gzip_blob(ctx.version) {
        let Some(tag) = nbt else {
            return Short(-1).write_to(writer);
        };
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        epochal_nbt::write_root(&mut encoder, RootFraming::Legacy, "", tag)?;
        let blob = encoder.finish()?;
        let len = i16::try_from(blob.len())
            .map_err(|_| ProtocolError::invalid_value("item nbt length", blob.len() as i64))?;
        let written = Short(len).write_to(writer)?;
        writer.write_all(&blob)?;
        return Ok(written + blob.len());
    }

    let tag = nbt.unwrap_or(&Tag::End);
    Ok(epochal_nbt::write_root(writer, ctx.nbt_framing(), "", tag)?)
}

fn read_item_nbt<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<(Option<Tag>, usize)> {
    if nbt_is_gzip_blob(ctx.version) {
        let (Short(len), n) = Short::read_from(reader)?;
        let Ok(len) = usize::try_from(len) else {
            return Ok((None, n));
        };
        let blob = read_exact_vec(reader, len)?;
        let (root, _) = epochal_nbt::read_root(&mut GzDecoder::new(&blob[..]), RootFraming::Legacy)?;
        return Ok((Some(root.tag).filter(|tag| !tag.is_end()), n + len));
    }

    let (root, n) = epochal_nbt::read_root(reader, ctx.nbt_framing())?;
    Ok((Some(root.tag).filter(|tag| !tag.is_end()), n))
}

/// Copies every byte read through it, so skipped payloads can be kept verbatim.
struct Recorder<'a, R> {
    inner: &'a mut R,
    recorded: Vec<u8>,
}

impl<R: Read> Read for Recorder<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.recorded.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}

fn read_count<R: Read>(reader: &mut R, field: &'static str) -> Result<(usize, usize)> {
    let (VarInt(count), n) = VarInt::read_from(reader)?;
    let count = usize::try_from(count).map_err(|_| ProtocolError::invalid_value(field, count))?;
    Ok((count, n))
}

impl VersionedWrite for ItemSlot {
    fn write_versioned<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        let format = SlotFormat::for_version(ctx.version);
        let Some(stack) = &self.0 else {
            return match format {
                SlotFormat::Legacy | SlotFormat::Flattened => Short(-1).write_to(writer),
                SlotFormat::PresenceFlag => Boolean(false).write_to(writer),
                SlotFormat::DataComponents => VarInt(0).write_to(writer),
            };
        };

        let mut written = 0;
        match format {
            SlotFormat::Legacy => {
                written += short_item_id(stack.item_id)?.write_to(writer)?;
                written += byte_count(stack.count)?.write_to(writer)?;
                written += Short(stack.damage).write_to(writer)?;
                written += write_item_nbt(writer, stack.nbt.as_ref(), ctx)?;
            }
            SlotFormat::Flattened => {
                written += short_item_id(stack.item_id)?.write_to(writer)?;
                written += byte_count(stack.count)?.write_to(writer)?;
                written += write_item_nbt(writer, stack.nbt.as_ref(), ctx)?;
            }
            SlotFormat::PresenceFlag => {
                written += Boolean(true).write_to(writer)?;
                written += VarInt(stack.item_id).write_to(writer)?;
                written += byte_count(stack.count)?.write_to(writer)?;
                written += write_item_nbt(writer, stack.nbt.as_ref(), ctx)?;
            }
            SlotFormat::DataComponents => {
                if stack.count <= 0 {
                    return VarInt(0).write_to(writer);
                }
                written += VarInt(stack.count).write_to(writer)?;
                written += VarInt(stack.item_id).write_to(writer)?;
                written += VarInt(stack.added_components.len() as i32).write_to(writer)?;
                written += VarInt(stack.removed_components.len() as i32).write_to(writer)?;
                for component in &stack.added_components {
                    written += VarInt(component.component_type).write_to(writer)?;
                    writer.write_all(&component.payload)?;
                    written += component.payload.len();
                }
                for component_type in &stack.removed_components {
                    written += VarInt(*component_type).write_to(writer)?;
                }
            }
        }
        Ok(written)
    }
}

impl VersionedRead for ItemSlot {
    fn read_versioned<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<(Self, usize)> {
        Self::read_nested(reader, ctx, 0)
    }
}

impl ItemSlot {
    /// Reads a slot found `depth` levels inside other component payloads.
    pub(crate) fn read_nested<R: Read>(
        reader: &mut R,
        ctx: &CodecContext<'_>,
        depth: usize,
    ) -> Result<(Self, usize)> {
        match SlotFormat::for_version(ctx.version) {
            SlotFormat::Legacy | SlotFormat::Flattened => {
                let (Short(item_id), mut read) = Short::read_from(reader)?;
                if item_id < 0 {
                    return Ok((ItemSlot::EMPTY, read));
                }

                let (Byte(count), n) = Byte::read_from(reader)?;
                read += n;
                let mut damage = 0;
                if SlotFormat::for_version(ctx.version) == SlotFormat::Legacy {
                    let (Short(value), n) = Short::read_from(reader)?;
                    damage = value;
                    read += n;
                }
                let (nbt, n) = read_item_nbt(reader, ctx)?;
                read += n;

                let stack = ItemStack {
                    item_id: item_id.into(),
                    count: count.into(),
                    damage,
                    nbt,
                    ..Default::default()
                };
                Ok((stack.into(), read))
            }
            SlotFormat::PresenceFlag => {
                let (Boolean(present), mut read) = Boolean::read_from(reader)?;
                if !present {
                    return Ok((ItemSlot::EMPTY, read));
                }

                let (VarInt(item_id), n) = VarInt::read_from(reader)?;
                read += n;
                let (Byte(count), n) = Byte::read_from(reader)?;
                read += n;
                let (nbt, n) = read_item_nbt(reader, ctx)?;
                read += n;

                let stack = ItemStack {
                    item_id,
                    count: count.into(),
                    nbt,
                    ..Default::default()
                };
                Ok((stack.into(), read))
            }
            SlotFormat::DataComponents => {
                let (VarInt(count), mut read) = VarInt::read_from(reader)?;
                if count == 0 {
                    return Ok((ItemSlot::EMPTY, read));
                }
                if count < 0 {
                    return Err(ProtocolError::invalid_value("item count", count));
                }

                let (VarInt(item_id), n) = VarInt::read_from(reader)?;
                read += n;
                let (added, n) = read_count(reader, "added component count")?;
                read += n;
                let (removed, n) = read_count(reader, "removed component count")?;
                read += n;

                let mut added_components = Vec::with_capacity(added.min(64));
                for _ in 0..added {
                    let (VarInt(component_type), n) = VarInt::read_from(reader)?;
                    read += n;
                    let shape = ctx
                        .components
                        .shape(component_type)
                        .ok_or(ProtocolError::UnknownComponentType(component_type))?;

                    let mut recorder = Recorder {
                        inner: &mut *reader,
                        recorded: Vec::new(),
                    };
                    read += shape.skip_nested(&mut recorder, ctx, depth)?;
                    added_components.push(RawComponent {
                        component_type,
                        payload: recorder.recorded,
                    });
                }

                let mut removed_components = Vec::with_capacity(removed.min(64));
                for _ in 0..removed {
                    let (VarInt(component_type), n) = VarInt::read_from(reader)?;
                    read += n;
                    removed_components.push(component_type);
                }

                let stack = ItemStack {
                    item_id,
                    count,
                    added_components,
                    removed_components,
                    ..Default::default()
                };
                Ok((stack.into(), read))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentShape, ComponentShapes, MAX_COMPONENT_DEPTH};
    use crate::codec::CodecLimits;
    use epochal_nbt::Compound;
    use std::io::Cursor;

    fn roundtrip(slot: &ItemSlot, ctx: &CodecContext<'_>) -> (Vec<u8>, ItemSlot) {
        let mut buffer = Vec::new();
        let written = slot.write_versioned(&mut buffer, ctx).unwrap();
        assert_eq!(written, buffer.len());
        let (decoded, read) = ItemSlot::read_versioned(&mut Cursor::new(&buffer), ctx).unwrap();
        assert_eq!(read, buffer.len());
        (buffer, decoded)
    }

    #[test]
    fn test_empty_sentinel_per_generation() {
        let cases: [(ProtocolVersion, &[u8]); 4] = [
            (ProtocolVersion::V1_12_2, &[0xFF, 0xFF]),
            (ProtocolVersion::V1_13, &[0xFF, 0xFF]),
            (ProtocolVersion::V1_16_4, &[0x00]),
            (ProtocolVersion::V1_21, &[0x00]),
        ];

        for (version, expected) in cases {
            let ctx = CodecContext::defaults(version);
            let (bytes, decoded) = roundtrip(&ItemSlot::EMPTY, &ctx);
            assert_eq!(bytes, expected, "empty slot on {version}");
            assert!(decoded.is_empty());
        }
    }

    #[test]
    fn test_format_cutoffs() {
        assert_eq!(SlotFormat::for_version(ProtocolVersion::V1_12_2), SlotFormat::Legacy);
        assert_eq!(SlotFormat::for_version(ProtocolVersion::V1_13_1), SlotFormat::Flattened);
        assert_eq!(SlotFormat::for_version(ProtocolVersion::V1_13_2), SlotFormat::PresenceFlag);
        assert_eq!(SlotFormat::for_version(ProtocolVersion::V1_20_3), SlotFormat::PresenceFlag);
        assert_eq!(SlotFormat::for_version(ProtocolVersion::V1_20_5), SlotFormat::DataComponents);
    }

    #[test]
    fn test_legacy_stack_with_damage_and_nbt() {
        let mut display = Compound::new();
        display.insert("Name", "Excalibur");
        let stack = ItemStack {
            item_id: 276,
            count: 1,
            damage: 12,
            nbt: Some(Tag::Compound(display)),
            ..Default::default()
        };
        let slot = ItemSlot::from(stack);

        for version in [ProtocolVersion::V1_7_6, ProtocolVersion::V1_8, ProtocolVersion::V1_12_2] {
            let (bytes, decoded) = roundtrip(&slot, &CodecContext::defaults(version));
            assert_eq!(&bytes[..5], &[0x01, 0x14, 0x01, 0x00, 0x0C]);
            assert_eq!(decoded, slot, "on {version}");
        }
    }

    #[test]
    fn test_presence_flag_without_nbt() {
        let slot = ItemSlot::from(ItemStack::new(1, 64));
        let (bytes, decoded) = roundtrip(&slot, &CodecContext::defaults(ProtocolVersion::V1_16_4));
        assert_eq!(bytes, [0x01, 0x01, 0x40, 0x00]);
        assert_eq!(decoded, slot);
    }

    #[test]
    fn test_network_nbt_framing_in_slots() {
        let mut tag = Compound::new();
        tag.insert("Damage", 3i32);
        let slot = ItemSlot::from(ItemStack {
            nbt: Some(Tag::Compound(tag)),
            ..ItemStack::new(5, 1)
        });

        let (legacy, _) = roundtrip(&slot, &CodecContext::defaults(ProtocolVersion::V1_20));
        let (network, decoded) = roundtrip(&slot, &CodecContext::defaults(ProtocolVersion::V1_20_2));
        assert_eq!(legacy.len(), network.len() + 2);
        assert_eq!(decoded, slot);
    }

    #[test]
    fn test_data_components_are_relayed_verbatim() {
        let mut shapes = ComponentShapes::default();
        shapes.insert(1, ComponentShape::VarInt);
        shapes.insert(5, ComponentShape::String);
        let limits = CodecLimits::default();
        let ctx = CodecContext::new(ProtocolVersion::V1_21, &limits, &shapes);

        // count 2, item 7, one added (type 5 "ab"), one removed (type 1), trailer
        let data = [0x02, 0x07, 0x01, 0x01, 0x05, 0x02, b'a', b'b', 0x01, 0xEE];
        let mut cursor = Cursor::new(&data[..]);
        let (slot, read) = ItemSlot::read_versioned(&mut cursor, &ctx).unwrap();
        assert_eq!(read, 9);

        let stack = slot.0.clone().unwrap();
        assert_eq!(stack.item_id, 7);
        assert_eq!(stack.count, 2);
        assert_eq!(
            stack.added_components,
            [RawComponent {
                component_type: 5,
                payload: vec![0x02, b'a', b'b'],
            }]
        );
        assert_eq!(stack.removed_components, [1]);

        let mut buffer = Vec::new();
        slot.write_versioned(&mut buffer, &ctx).unwrap();
        assert_eq!(buffer, &data[..9]);
    }

    #[test]
    fn test_nested_slot_components() {
        let mut shapes = ComponentShapes::default();
        shapes.insert(1, ComponentShape::Slot);
        let limits = CodecLimits::default();
        let ctx = CodecContext::new(ProtocolVersion::V1_21, &limits, &shapes);

        // three stacks, each holding the next in component 1, then an empty slot
        let level = [0x01, 0x01, 0x01, 0x00, 0x01];
        let mut data = level.repeat(3);
        data.push(0x00);

        let (slot, read) = ItemSlot::read_versioned(&mut Cursor::new(&data), &ctx).unwrap();
        assert_eq!(read, data.len());
        let stack = slot.0.unwrap();
        assert_eq!(stack.added_components[0].payload, &data[5..]);
    }

    #[test]
    fn test_deeply_nested_slots_rejected() {
        let mut shapes = ComponentShapes::default();
        shapes.insert(1, ComponentShape::Slot);
        let limits = CodecLimits::default();
        let ctx = CodecContext::new(ProtocolVersion::V1_21, &limits, &shapes);

        let data = [0x01, 0x01, 0x01, 0x00, 0x01].repeat(300_000);
        let err = ItemSlot::read_versioned(&mut Cursor::new(&data), &ctx).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ComponentDepthExceeded(MAX_COMPONENT_DEPTH)
        ));
    }

    #[test]
    fn test_unknown_component_type() {
        let ctx = CodecContext::defaults(ProtocolVersion::V1_21);
        let data = [0x01, 0x07, 0x01, 0x00, 0x09, 0x00];
        let err = ItemSlot::read_versioned(&mut Cursor::new(data), &ctx).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownComponentType(9)));
    }
}
