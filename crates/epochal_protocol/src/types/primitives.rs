use std::io::{Read, Write};

use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite};

// Boolean type, strictly 0x00 or 0x01 on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Boolean(pub bool);

impl ProtocolWrite for Boolean {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        writer.write_all(&[u8::from(self.0)])?;
        Ok(1)
    }
}

impl ProtocolRead for Boolean {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf)?;
        match buf[0] {
            0x00 => Ok((Boolean(false), 1)),
            0x01 => Ok((Boolean(true), 1)),
            other => Err(ProtocolError::InvalidBoolean(other)),
        }
    }
}

macro_rules! big_endian {
    ($($(#[$meta:meta])* $name:ident($inner:ty);)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, PartialEq, Default)]
            pub struct $name(pub $inner);

            impl ProtocolWrite for $name {
                fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
                    let bytes = self.0.to_be_bytes();
                    writer.write_all(&bytes)?;
                    Ok(bytes.len())
                }
            }

            impl ProtocolRead for $name {
                fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
                    let mut buf = [0u8; std::mem::size_of::<$inner>()];
                    reader.read_exact(&mut buf)?;
                    Ok(($name(<$inner>::from_be_bytes(buf)), buf.len()))
                }
            }

            impl From<$inner> for $name {
                fn from(value: $inner) -> Self {
                    $name(value)
                }
            }
        )*
    };
}

big_endian! {
    /// Signed 8-bit integer
    Byte(i8);
    /// Unsigned 8-bit integer
    UnsignedByte(u8);
    /// Signed 16-bit integer
    Short(i16);
    /// Unsigned 16-bit integer
    UnsignedShort(u16);
    /// Signed 32-bit integer
    Int(i32);
    /// Signed 64-bit integer
    Long(i64);
    /// IEEE 754 single-precision float
    Float(f32);
    /// IEEE 754 double-precision float
    Double(f64);
}

/// Rotation step of 1/256 of a full turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Angle(pub u8);

impl Angle {
    pub fn from_degrees(degrees: f32) -> Self {
        Angle((degrees.rem_euclid(360.0) * 256.0 / 360.0) as u8)
    }

    pub fn to_degrees(self) -> f32 {
        f32::from(self.0) * 360.0 / 256.0
    }
}

impl ProtocolWrite for Angle {
    fn write_to<W: Write>(&self, writer: &mut W) -> Result<usize> {
        UnsignedByte(self.0).write_to(writer)
    }
}

impl ProtocolRead for Angle {
    fn read_from<R: Read>(reader: &mut R) -> Result<(Self, usize)> {
        let (byte, n) = UnsignedByte::read_from(reader)?;
        Ok((Angle(byte.0), n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_boolean_is_strict() {
        assert!(Boolean::read_from(&mut Cursor::new([0x01])).unwrap().0.0);
        assert!(!Boolean::read_from(&mut Cursor::new([0x00])).unwrap().0.0);
        assert!(matches!(
            Boolean::read_from(&mut Cursor::new([0x02])),
            Err(ProtocolError::InvalidBoolean(0x02))
        ));
    }

    #[test]
    fn test_big_endian_layout() {
        let mut buffer = Vec::new();
        Int(0x0102_0304).write_to(&mut buffer).unwrap();
        Short(-2).write_to(&mut buffer).unwrap();
        UnsignedShort(25565).write_to(&mut buffer).unwrap();
        assert_eq!(buffer, [0x01, 0x02, 0x03, 0x04, 0xFF, 0xFE, 0x63, 0xDD]);

        let mut cursor = Cursor::new(buffer);
        assert_eq!(Int::read_from(&mut cursor).unwrap(), (Int(0x0102_0304), 4));
        assert_eq!(Short::read_from(&mut cursor).unwrap(), (Short(-2), 2));
        assert_eq!(
            UnsignedShort::read_from(&mut cursor).unwrap(),
            (UnsignedShort(25565), 2)
        );
    }

    #[test]
    fn test_truncated_primitive() {
        let err = Long::read_from(&mut Cursor::new([0u8; 7])).unwrap_err();
        assert!(matches!(err, ProtocolError::TruncatedBuffer));
    }

    #[test]
    fn test_angle_conversion() {
        assert_eq!(Angle::from_degrees(90.0), Angle(64));
        assert_eq!(Angle::from_degrees(-90.0), Angle(192));
        assert_eq!(Angle(128).to_degrees(), 180.0);
    }
}
