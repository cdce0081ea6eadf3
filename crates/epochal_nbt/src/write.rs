use std::io::Write;

use crate::RootFraming;
use crate::error::{NbtError, Result};
use crate::tag::{Compound, List, Tag, TagType};

/// Writes `tag` as a root tag and returns the number of bytes written.
///
/// `name` is only emitted under [`RootFraming::Legacy`]. A root [`Tag::End`]
/// is written as the single `0x00` byte that stands for "no tag".
pub fn write_root<W: Write>(
    writer: &mut W,
    framing: RootFraming,
    name: &str,
    tag: &Tag,
) -> Result<usize> {
    let mut written = write_type(writer, tag.tag_type())?;
    if tag.is_end() {
        return Ok(written);
    }

    if framing == RootFraming::Legacy {
        written += write_string(writer, name)?;
    }
    written += write_payload(writer, tag)?;
    Ok(written)
}

/// Writes the payload of `tag` without its type byte or name.
pub fn write_payload<W: Write>(writer: &mut W, tag: &Tag) -> Result<usize> {
    let written = match tag {
        Tag::End => 0,
        Tag::Byte(v) => write_bytes(writer, &v.to_be_bytes())?,
        Tag::Short(v) => write_bytes(writer, &v.to_be_bytes())?,
        Tag::Int(v) => write_bytes(writer, &v.to_be_bytes())?,
        Tag::Long(v) => write_bytes(writer, &v.to_be_bytes())?,
        Tag::Float(v) => write_bytes(writer, &v.to_be_bytes())?,
        Tag::Double(v) => write_bytes(writer, &v.to_be_bytes())?,
        Tag::ByteArray(values) => {
            let mut n = write_length(writer, values.len())?;
            let raw: Vec<u8> = values.iter().map(|b| *b as u8).collect();
            n += write_bytes(writer, &raw)?;
            n
        }
        Tag::String(s) => write_string(writer, s)?,
        Tag::List(list) => write_list(writer, list)?,
        Tag::Compound(compound) => write_compound(writer, compound)?,
        Tag::IntArray(values) => {
            let mut n = write_length(writer, values.len())?;
            for v in values {
                n += write_bytes(writer, &v.to_be_bytes())?;
            }
            n
        }
        Tag::LongArray(values) => {
            let mut n = write_length(writer, values.len())?;
            for v in values {
                n += write_bytes(writer, &v.to_be_bytes())?;
            }
            n
        }
    };
    Ok(written)
}

fn write_list<W: Write>(writer: &mut W, list: &List) -> Result<usize> {
    let mut written = write_type(writer, list.element_type())?;
    written += write_length(writer, list.len())?;
    for item in list {
        written += write_payload(writer, item)?;
    }
    Ok(written)
}

fn write_compound<W: Write>(writer: &mut W, compound: &Compound) -> Result<usize> {
    let mut written = 0;
    for (name, tag) in compound.iter() {
        written += write_type(writer, tag.tag_type())?;
        written += write_string(writer, name)?;
        written += write_payload(writer, tag)?;
    }
    written += write_type(writer, TagType::End)?;
    Ok(written)
}

fn write_type<W: Write>(writer: &mut W, tag_type: TagType) -> Result<usize> {
    write_bytes(writer, &[tag_type.id()])
}

fn write_length<W: Write>(writer: &mut W, len: usize) -> Result<usize> {
    let len = i32::try_from(len).map_err(|_| NbtError::NegativeLength(i32::MAX))?;
    write_bytes(writer, &len.to_be_bytes())
}

pub(crate) fn write_string<W: Write>(writer: &mut W, value: &str) -> Result<usize> {
    let encoded = cesu8::to_java_cesu8(value);
    let len = u16::try_from(encoded.len()).map_err(|_| NbtError::StringTooLong(encoded.len()))?;
    let mut written = write_bytes(writer, &len.to_be_bytes())?;
    written += write_bytes(writer, &encoded)?;
    Ok(written)
}

fn write_bytes<W: Write>(writer: &mut W, bytes: &[u8]) -> Result<usize> {
    writer.write_all(bytes)?;
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_compound_root() {
        let mut buffer = Vec::new();
        let written = write_root(
            &mut buffer,
            RootFraming::Legacy,
            "",
            &Tag::Compound(Compound::new()),
        )
        .unwrap();
        assert_eq!(buffer, [0x0A, 0x00, 0x00, 0x00]);
        assert_eq!(written, 4);
    }

    #[test]
    fn test_end_root_is_single_byte() {
        for framing in [RootFraming::Legacy, RootFraming::Network] {
            let mut buffer = Vec::new();
            write_root(&mut buffer, framing, "ignored", &Tag::End).unwrap();
            assert_eq!(buffer, [0x00]);
        }
    }

    #[test]
    fn test_empty_list_keeps_type_byte() {
        let mut buffer = Vec::new();
        write_payload(&mut buffer, &Tag::List(List::new(TagType::Compound))).unwrap();
        assert_eq!(buffer, [0x0A, 0x00, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_string_uses_java_encoding() {
        let mut buffer = Vec::new();
        write_payload(&mut buffer, &Tag::String("a\0".to_string())).unwrap();
        // Java modified UTF-8 encodes NUL as two bytes.
        assert_eq!(buffer, [0x00, 0x03, b'a', 0xC0, 0x80]);
    }
}
