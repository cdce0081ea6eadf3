use std::io::{Read, Write};

use epochal_nbt::{Compound, List, RootFraming, Tag};
use serde_json::{Map, Number, Value, json};

use crate::codec::CodecContext;
use crate::error::Result;
use crate::types::traits::{VersionedRead, VersionedWrite};
use crate::types::ProtocolString;
use crate::version::ProtocolVersion;

/// Vanilla ceiling for serialized chat components.
pub const MAX_CHAT_LENGTH: usize = 262_144;

/// Chat component, held as its JSON tree.
///
/// Sent as a JSON string before 1.20.3 and as network NBT afterwards.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextComponent(pub Value);

fn uses_nbt(version: ProtocolVersion) -> bool {
    version >= ProtocolVersion::V1_20_3
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self(json!({ "text": text.into() }))
    }

    /// Concatenated `text` of the component and its `extra` children.
    pub fn to_plain_text(&self) -> String {
        fn collect(value: &Value, out: &mut String) {
            match value {
                Value::String(s) => out.push_str(s),
                Value::Object(map) => {
                    if let Some(Value::String(text)) = map.get("text") {
                        out.push_str(text);
                    }
                    if let Some(Value::Array(extra)) = map.get("extra") {
                        extra.iter().for_each(|child| collect(child, out));
                    }
                }
                Value::Array(items) => items.iter().for_each(|child| collect(child, out)),
                _ => {}
            }
        }

        let mut out = String::new();
        collect(&self.0, &mut out);
        out
    }

    pub fn write_json<W: Write>(&self, writer: &mut W) -> Result<usize> {
        let json = serde_json::to_string(&self.0)?;
        ProtocolString::write_str(writer, &json, MAX_CHAT_LENGTH)
    }

    pub fn read_json<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let (json, n) = ProtocolString::read_bounded(reader, MAX_CHAT_LENGTH)?;
        Ok((Self(serde_json::from_str(&json.0)?), n))
    }

    pub fn to_nbt(&self) -> Tag {
        json_to_nbt(&self.0)
    }

    pub fn from_nbt(tag: &Tag) -> Self {
        Self(nbt_to_json(tag))
    }
}

impl From<&str> for TextComponent {
    fn from(text: &str) -> Self {
        Self::plain(text)
    }
}

impl VersionedWrite for TextComponent {
    fn write_versioned<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        if uses_nbt(ctx.version) {
            Ok(epochal_nbt::write_root(writer, RootFraming::Network, "", &self.to_nbt())?)
        } else {
            self.write_json(writer)
        }
    }
}

impl VersionedRead for TextComponent {
    fn read_versioned<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<(Self, usize)> {
        if uses_nbt(ctx.version) {
            let (root, n) = epochal_nbt::read_root(reader, RootFraming::Network)?;
            Ok((Self::from_nbt(&root.tag), n))
        } else {
            Self::read_json(reader)
        }
    }
}

fn json_to_nbt(value: &Value) -> Tag {
    match value {
        Value::Null => Tag::String(String::new()),
        Value::Bool(b) => Tag::from(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).map_or(Tag::Long(i), Tag::Int)
            } else {
                Tag::Double(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => Tag::String(s.clone()),
        Value::Array(items) => {
            let tags: Vec<Tag> = items.iter().map(json_to_nbt).collect();
            let homogeneous = tags.windows(2).all(|w| w[0].tag_type() == w[1].tag_type());
            let tags = if homogeneous {
                tags
            } else {
                // Mixed lists are stored as compounds keyed by the empty name.
                tags.into_iter()
                    .map(|tag| match tag {
                        Tag::Compound(c) => Tag::Compound(c),
                        other => Tag::Compound(std::iter::once(("", other)).collect()),
                    })
                    .collect()
            };
            List::from_tags(tags).map_or(Tag::List(List::empty()), Tag::List)
        }
        Value::Object(map) => {
            let mut compound = Compound::with_capacity(map.len());
            for (key, value) in map {
                if !value.is_null() {
                    compound.insert(key.clone(), json_to_nbt(value));
                }
            }
            Tag::Compound(compound)
        }
    }
}

fn nbt_to_json(tag: &Tag) -> Value {
    match tag {
        Tag::End => Value::Null,
        Tag::Byte(v) => json!(v),
        Tag::Short(v) => json!(v),
        Tag::Int(v) => json!(v),
        Tag::Long(v) => json!(v),
        Tag::Float(v) => Number::from_f64(f64::from(*v)).map_or(Value::Null, Value::Number),
        Tag::Double(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
        Tag::ByteArray(v) => json!(v),
        Tag::String(s) => Value::String(s.clone()),
        Tag::List(list) => Value::Array(
            list.iter()
                .map(|item| match item {
                    Tag::Compound(c) if c.len() == 1 && c.contains_key("") => {
                        c.get("").map_or(Value::Null, nbt_to_json)
                    }
                    other => nbt_to_json(other),
                })
                .collect(),
        ),
        Tag::Compound(compound) => Value::Object(
            compound
                .iter()
                .map(|(k, v)| (k.clone(), nbt_to_json(v)))
                .collect::<Map<String, Value>>(),
        ),
        Tag::IntArray(v) => json!(v),
        Tag::LongArray(v) => json!(v),
    }
}
