//! Named Binary Tag codec.
//!
//! Two root framings exist on the wire: [`RootFraming::Legacy`] carries the
//! root tag's name, [`RootFraming::Network`] (Minecraft 1.20.2 onwards) drops
//! it. Nested tags are always named inside compounds.

mod error;
mod read;
mod tag;
mod write;

pub use error::{NbtError, Result};
pub use read::{MAX_DEPTH, NamedTag, read_payload, read_root, skip_payload, skip_root};
pub use tag::{Compound, List, Tag, TagType};
pub use write::{write_payload, write_root};

/// How the root tag of an NBT blob is framed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RootFraming {
    /// Type byte, 16-bit length name, payload.
    Legacy,
    /// Type byte, payload.
    Network,
}

/// Encodes `tag` into a new buffer.
pub fn to_vec(framing: RootFraming, name: &str, tag: &Tag) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write_root(&mut buffer, framing, name, tag)?;
    Ok(buffer)
}

/// Decodes a root tag from `bytes`, which must contain nothing else.
pub fn from_slice(framing: RootFraming, bytes: &[u8]) -> Result<NamedTag> {
    let mut cursor = bytes;
    let (root, _) = read_root(&mut cursor, framing)?;
    if !cursor.is_empty() {
        return Err(NbtError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("{} trailing bytes after root tag", cursor.len()),
        )));
    }
    Ok(root)
}
