use std::collections::HashMap;
use std::io::Read;

use epochal_nbt::RootFraming;
use serde::{Deserialize, Serialize};

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::types::traits::ProtocolRead;
use crate::types::{Boolean, ItemSlot, VarInt, VarLong, skip_exact};

/// Structure of a data-component payload, enough to find where it ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentShape {
    /// No payload at all.
    Empty,
    /// A fixed number of bytes.
    Fixed(usize),
    VarInt,
    VarLong,
    /// VarInt length prefixed UTF-8.
    String,
    /// Network-framed NBT.
    Nbt,
    /// Nested item stack.
    Slot,
    /// Boolean flag, payload follows when set.
    Optional(Box<ComponentShape>),
    /// VarInt count, then that many payloads.
    List(Box<ComponentShape>),
    /// Payloads written back to back.
    Sequence(Vec<ComponentShape>),
}

/// Deepest nesting of slots and compound shapes inside one component payload.
pub const MAX_COMPONENT_DEPTH: usize = 64;

impl ComponentShape {
    /// Consumes one payload of this shape and returns how many bytes it took.
    pub fn skip(&self, reader: &mut dyn Read, ctx: &CodecContext<'_>) -> Result<usize> {
        self.skip_nested(reader, ctx, 0)
    }

    pub(crate) fn skip_nested(
        &self,
        mut reader: &mut dyn Read,
        ctx: &CodecContext<'_>,
        depth: usize,
    ) -> Result<usize> {
        if depth > MAX_COMPONENT_DEPTH {
            return Err(ProtocolError::ComponentDepthExceeded(MAX_COMPONENT_DEPTH));
        }
        let next = depth + 1;
        let consumed = match self {
            ComponentShape::Empty => 0,
            ComponentShape::Fixed(len) => skip_exact(&mut reader, *len)?,
            ComponentShape::VarInt => VarInt::read_from(&mut reader)?.1,
            ComponentShape::VarLong => VarLong::read_from(&mut reader)?.1,
            ComponentShape::String => {
                let (VarInt(len), prefix) = VarInt::read_from(&mut reader)?;
                let len =
                    usize::try_from(len).map_err(|_| ProtocolError::NegativeLength(len.into()))?;
                prefix + skip_exact(&mut reader, len)?
            }
            ComponentShape::Nbt => epochal_nbt::skip_root(&mut reader, RootFraming::Network)?,
            ComponentShape::Slot => ItemSlot::read_nested(&mut reader, ctx, next)?.1,
            ComponentShape::Optional(inner) => {
                let (Boolean(present), flag) = Boolean::read_from(&mut reader)?;
                if present {
                    flag + inner.skip_nested(&mut *reader, ctx, next)?
                } else {
                    flag
                }
            }
            ComponentShape::List(inner) => {
                let (VarInt(count), mut consumed) = VarInt::read_from(&mut reader)?;
                if count < 0 {
                    return Err(ProtocolError::NegativeLength(count.into()));
                }
                for _ in 0..count {
                    consumed += inner.skip_nested(&mut *reader, ctx, next)?;
                }
                consumed
            }
            ComponentShape::Sequence(parts) => {
                let mut consumed = 0;
                for part in parts {
                    consumed += part.skip_nested(&mut *reader, ctx, next)?;
                }
                consumed
            }
        };
        Ok(consumed)
    }
}

/// Source of payload shapes for data-component types (1.20.5 onwards).
pub trait ComponentTable: Send + Sync {
    fn shape(&self, component_type: i32) -> Option<&ComponentShape>;
}

/// Table that knows no component types; every component payload fails to decode.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoComponents;

impl ComponentTable for NoComponents {
    fn shape(&self, _component_type: i32) -> Option<&ComponentShape> {
        None
    }
}

/// Component table backed by a map, usually loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentShapes(pub HashMap<i32, ComponentShape>);

impl ComponentShapes {
    pub fn insert(&mut self, component_type: i32, shape: ComponentShape) -> &mut Self {
        self.0.insert(component_type, shape);
        self
    }
}

impl ComponentTable for ComponentShapes {
    fn shape(&self, component_type: i32) -> Option<&ComponentShape> {
        self.0.get(&component_type)
    }
}
