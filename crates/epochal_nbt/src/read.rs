use std::io::{self, Read};

use crate::RootFraming;
use crate::error::{NbtError, Result};
use crate::tag::{Compound, List, Tag, TagType};

/// Deepest compound/list nesting accepted while decoding or skipping.
pub const MAX_DEPTH: usize = 512;

/// Root tag together with the name it was stored under.
///
/// The name is always empty for [`RootFraming::Network`] data.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTag {
    pub name: String,
    pub tag: Tag,
}

impl NamedTag {
    pub fn new(name: impl Into<String>, tag: impl Into<Tag>) -> Self {
        Self {
            name: name.into(),
            tag: tag.into(),
        }
    }
}

/// Decodes one root tag and returns it with the number of bytes consumed.
pub fn read_root<R: Read>(reader: &mut R, framing: RootFraming) -> Result<(NamedTag, usize)> {
    let mut source = TagReader::new(reader);
    let tag_type = source.read_type()?;
    if tag_type == TagType::End {
        return Ok((NamedTag::new("", Tag::End), source.consumed));
    }

    let name = match framing {
        RootFraming::Legacy => source.read_string()?,
        RootFraming::Network => String::new(),
    };
    let tag = source.read_payload(tag_type, 0)?;
    Ok((NamedTag { name, tag }, source.consumed))
}

/// Consumes one root tag without building it and returns the bytes consumed.
///
/// Accepts and rejects exactly the same inputs as [`read_root`].
pub fn skip_root<R: Read>(reader: &mut R, framing: RootFraming) -> Result<usize> {
    let mut source = TagReader::new(reader);
    let tag_type = source.read_type()?;
    if tag_type == TagType::End {
        return Ok(source.consumed);
    }

    if framing == RootFraming::Legacy {
        source.skip_string()?;
    }
    source.skip_payload(tag_type, 0)?;
    Ok(source.consumed)
}

/// Decodes the payload of a tag whose type byte was already read.
pub fn read_payload<R: Read>(reader: &mut R, tag_type: TagType) -> Result<(Tag, usize)> {
    let mut source = TagReader::new(reader);
    let tag = source.read_payload(tag_type, 0)?;
    Ok((tag, source.consumed))
}

/// Skips the payload of a tag whose type byte was already read.
pub fn skip_payload<R: Read>(reader: &mut R, tag_type: TagType) -> Result<usize> {
    let mut source = TagReader::new(reader);
    source.skip_payload(tag_type, 0)?;
    Ok(source.consumed)
}

struct TagReader<'a, R> {
    reader: &'a mut R,
    consumed: usize,
}

impl<'a, R: Read> TagReader<'a, R> {
    fn new(reader: &'a mut R) -> Self {
        Self {
            reader,
            consumed: 0,
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.reader.read_exact(&mut buf)?;
        self.consumed += N;
        Ok(buf)
    }

    fn read_type(&mut self) -> Result<TagType> {
        let [id] = self.read_array::<1>()?;
        TagType::try_from(id)
    }

    fn read_length(&mut self) -> Result<usize> {
        let len = i32::from_be_bytes(self.read_array()?);
        usize::try_from(len).map_err(|_| NbtError::NegativeLength(len))
    }

    /// Reads `len` bytes without trusting `len` for the allocation size.
    fn read_vec(&mut self, len: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        let read = Read::take(&mut *self.reader, len as u64).read_to_end(&mut buf)?;
        self.consumed += read;
        if read != len {
            return Err(NbtError::TruncatedBuffer);
        }
        Ok(buf)
    }

    fn skip_bytes(&mut self, len: usize) -> Result<()> {
        let skipped = io::copy(&mut Read::take(&mut *self.reader, len as u64), &mut io::sink())?;
        self.consumed += skipped as usize;
        if skipped as usize != len {
            return Err(NbtError::TruncatedBuffer);
        }
        Ok(())
    }

    fn read_string(&mut self) -> Result<String> {
        let len = u16::from_be_bytes(self.read_array()?) as usize;
        let bytes = self.read_vec(len)?;
        cesu8::from_java_cesu8(&bytes)
            .map(|s| s.into_owned())
            .map_err(|_| NbtError::InvalidString)
    }

    fn skip_string(&mut self) -> Result<()> {
        let len = u16::from_be_bytes(self.read_array()?) as usize;
        self.skip_bytes(len)
    }

    fn enter(depth: usize) -> Result<usize> {
        let next = depth + 1;
        if next > MAX_DEPTH {
            return Err(NbtError::DepthLimitExceeded(MAX_DEPTH));
        }
        Ok(next)
    }

    fn read_list_header(&mut self) -> Result<(TagType, usize)> {
        let element_type = self.read_type()?;
        let len = self.read_length()?;
        if element_type == TagType::End && len > 0 {
            return Err(NbtError::InvalidTagType(TagType::End.id()));
        }
        Ok((element_type, len))
    }

    fn read_payload(&mut self, tag_type: TagType, depth: usize) -> Result<Tag> {
        let tag = match tag_type {
            TagType::End => Tag::End,
            TagType::Byte => Tag::Byte(i8::from_be_bytes(self.read_array()?)),
            TagType::Short => Tag::Short(i16::from_be_bytes(self.read_array()?)),
            TagType::Int => Tag::Int(i32::from_be_bytes(self.read_array()?)),
            TagType::Long => Tag::Long(i64::from_be_bytes(self.read_array()?)),
            TagType::Float => Tag::Float(f32::from_be_bytes(self.read_array()?)),
            TagType::Double => Tag::Double(f64::from_be_bytes(self.read_array()?)),
            TagType::ByteArray => {
                let len = self.read_length()?;
                let raw = self.read_vec(len)?;
                Tag::ByteArray(raw.into_iter().map(|b| b as i8).collect())
            }
            TagType::String => Tag::String(self.read_string()?),
            TagType::List => {
                let depth = Self::enter(depth)?;
                let (element_type, len) = self.read_list_header()?;
                let mut items = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    items.push(self.read_payload(element_type, depth)?);
                }
                Tag::List(List::from_raw(element_type, items))
            }
            TagType::Compound => {
                let depth = Self::enter(depth)?;
                let mut compound = Compound::new();
                loop {
                    let child_type = self.read_type()?;
                    if child_type == TagType::End {
                        break;
                    }
                    let name = self.read_string()?;
                    let child = self.read_payload(child_type, depth)?;
                    compound.insert(name, child);
                }
                Tag::Compound(compound)
            }
            TagType::IntArray => {
                let len = self.read_length()?;
                let raw = self.read_vec(len * 4)?;
                Tag::IntArray(
                    raw.chunks_exact(4)
                        .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]]))
                        .collect(),
                )
            }
            TagType::LongArray => {
                let len = self.read_length()?;
                let raw = self.read_vec(len * 8)?;
                Tag::LongArray(
                    raw.chunks_exact(8)
                        .map(|c| {
                            let mut word = [0u8; 8];
                            word.copy_from_slice(c);
                            i64::from_be_bytes(word)
                        })
                        .collect(),
                )
            }
        };
        Ok(tag)
    }

    fn skip_payload(&mut self, tag_type: TagType, depth: usize) -> Result<()> {
        match tag_type {
            TagType::End => {}
            TagType::Byte => self.skip_bytes(1)?,
            TagType::Short => self.skip_bytes(2)?,
            TagType::Int | TagType::Float => self.skip_bytes(4)?,
            TagType::Long | TagType::Double => self.skip_bytes(8)?,
            TagType::ByteArray => {
                let len = self.read_length()?;
                self.skip_bytes(len)?;
            }
            TagType::String => self.skip_string()?,
            TagType::List => {
                let depth = Self::enter(depth)?;
                let (element_type, len) = self.read_list_header()?;
                for _ in 0..len {
                    self.skip_payload(element_type, depth)?;
                }
            }
            TagType::Compound => {
                let depth = Self::enter(depth)?;
                loop {
                    let child_type = self.read_type()?;
                    if child_type == TagType::End {
                        break;
                    }
                    self.skip_string()?;
                    self.skip_payload(child_type, depth)?;
                }
            }
            TagType::IntArray => {
                let len = self.read_length()?;
                self.skip_bytes(len * 4)?;
            }
            TagType::LongArray => {
                let len = self.read_length()?;
                self.skip_bytes(len * 8)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_rejects_unknown_type() {
        let data = [0x0D, 0x00, 0x00];
        let err = read_root(&mut &data[..], RootFraming::Legacy).unwrap_err();
        assert!(matches!(err, NbtError::InvalidTagType(0x0D)));
    }

    #[test]
    fn test_read_rejects_negative_array_length() {
        let data = [0x07, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF];
        let err = read_root(&mut &data[..], RootFraming::Legacy).unwrap_err();
        assert!(matches!(err, NbtError::NegativeLength(-1)));

        let err = skip_root(&mut &data[..], RootFraming::Legacy).unwrap_err();
        assert!(matches!(err, NbtError::NegativeLength(-1)));
    }

    #[test]
    fn test_truncated_string_is_reported() {
        // Network root string claiming 5 bytes with only 2 present.
        let data = [0x08, 0x00, 0x05, b'h', b'i'];
        let err = read_root(&mut &data[..], RootFraming::Network).unwrap_err();
        assert!(matches!(err, NbtError::TruncatedBuffer));
        let err = skip_root(&mut &data[..], RootFraming::Network).unwrap_err();
        assert!(matches!(err, NbtError::TruncatedBuffer));
    }

    #[test]
    fn test_huge_declared_array_does_not_allocate_upfront() {
        let data = [0x0B, 0x7F, 0xFF, 0xFF, 0xFF, 0x00];
        let err = read_root(&mut &data[..], RootFraming::Network).unwrap_err();
        assert!(matches!(err, NbtError::TruncatedBuffer));
    }

    #[test]
    fn test_depth_limit() {
        // Nested unnamed lists of lists, one level deeper than allowed.
        let mut data = vec![0x09];
        for _ in 0..MAX_DEPTH {
            data.extend_from_slice(&[0x09, 0x00, 0x00, 0x00, 0x01]);
        }
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00]);

        let err = read_root(&mut &data[..], RootFraming::Network).unwrap_err();
        assert!(matches!(err, NbtError::DepthLimitExceeded(MAX_DEPTH)));
        let err = skip_root(&mut &data[..], RootFraming::Network).unwrap_err();
        assert!(matches!(err, NbtError::DepthLimitExceeded(MAX_DEPTH)));
    }

    #[test]
    fn test_end_root_means_no_tag() {
        let data = [0x00, 0xAA];
        let mut cursor = &data[..];
        let (root, consumed) = read_root(&mut cursor, RootFraming::Legacy).unwrap();
        assert_eq!(root.tag, Tag::End);
        assert_eq!(consumed, 1);
        assert_eq!(cursor, [0xAA]);
    }
}
