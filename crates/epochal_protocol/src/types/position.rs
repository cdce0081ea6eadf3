use std::io::{Read, Write};

use crate::codec::CodecContext;
use crate::error::{ProtocolError, Result};
use crate::types::traits::{ProtocolRead, ProtocolWrite, VersionedRead, VersionedWrite};
use crate::types::Long;
use crate::version::ProtocolVersion;

const XZ_MASK: i64 = 0x3FF_FFFF;
const Y_MASK: i64 = 0xFFF;

/// Bit order of a block position packed into one 64-bit word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionLayout {
    /// `x:26 | y:12 | z:26`, used before 1.14.
    XYZ,
    /// `x:26 | z:26 | y:12`, used from 1.14.
    XZY,
}

impl PositionLayout {
    pub fn for_version(version: ProtocolVersion) -> Self {
        if version >= ProtocolVersion::V1_14 {
            PositionLayout::XZY
        } else {
            PositionLayout::XYZ
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const MIN_XZ: i32 = -(1 << 25);
    pub const MAX_XZ: i32 = (1 << 25) - 1;
    pub const MIN_Y: i32 = -(1 << 11);
    pub const MAX_Y: i32 = (1 << 11) - 1;

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn fits(&self) -> bool {
        (Self::MIN_XZ..=Self::MAX_XZ).contains(&self.x)
            && (Self::MIN_XZ..=Self::MAX_XZ).contains(&self.z)
            && (Self::MIN_Y..=Self::MAX_Y).contains(&self.y)
    }

    /// Packs the position, truncating each coordinate to its field width.
    ///
    /// Coordinates outside the legal range wrap around in two's complement,
    /// so they come back with a different value from [`Position::unpack`].
    pub fn pack(&self, layout: PositionLayout) -> i64 {
        let x = i64::from(self.x) & XZ_MASK;
        let y = i64::from(self.y) & Y_MASK;
        let z = i64::from(self.z) & XZ_MASK;

        match layout {
            PositionLayout::XYZ => (x << 38) | (y << 26) | z,
            PositionLayout::XZY => (x << 38) | (z << 12) | y,
        }
    }

    /// Packs the position or fails with `PositionOutOfRange`.
    pub fn try_pack(&self, layout: PositionLayout) -> Result<i64> {
        if !self.fits() {
            return Err(ProtocolError::PositionOutOfRange {
                x: self.x,
                y: self.y,
                z: self.z,
            });
        }
        Ok(self.pack(layout))
    }

    pub fn unpack(value: i64, layout: PositionLayout) -> Self {
        match layout {
            PositionLayout::XYZ => Self {
                x: (value >> 38) as i32,
                y: ((value << 26) >> 52) as i32,
                z: ((value << 38) >> 38) as i32,
            },
            PositionLayout::XZY => Self {
                x: (value >> 38) as i32,
                y: ((value << 52) >> 52) as i32,
                z: ((value << 26) >> 38) as i32,
            },
        }
    }
}

impl VersionedWrite for Position {
    fn write_versioned<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        Long(self.pack(PositionLayout::for_version(ctx.version))).write_to(writer)
    }
}

impl VersionedRead for Position {
    fn read_versioned<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<(Self, usize)> {
        let (Long(value), n) = Long::read_from(reader)?;
        Ok((Self::unpack(value, PositionLayout::for_version(ctx.version)), n))
    }
}

/// Block position qualified by a dimension identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalPos {
    pub dimension: String,
    pub position: Position,
}

impl VersionedWrite for GlobalPos {
    fn write_versioned<W: Write>(&self, writer: &mut W, ctx: &CodecContext<'_>) -> Result<usize> {
        Ok(ctx.write_string(writer, &self.dimension)? + self.position.write_versioned(writer, ctx)?)
    }
}

impl VersionedRead for GlobalPos {
    fn read_versioned<R: Read>(reader: &mut R, ctx: &CodecContext<'_>) -> Result<(Self, usize)> {
        let (dimension, a) = ctx.read_string(reader)?;
        let (position, b) = Position::read_versioned(reader, ctx)?;
        Ok((Self { dimension, position }, a + b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYOUTS: [PositionLayout; 2] = [PositionLayout::XYZ, PositionLayout::XZY];

    #[test]
    fn test_known_packing() {
        let position = Position::new(18357644, 831, -20882616);
        assert_eq!(
            position.pack(PositionLayout::XZY),
            0b01000110000001110110001100_10110000010101101101001000_001100111111
        );
        assert_eq!(
            Position::unpack(position.pack(PositionLayout::XZY), PositionLayout::XZY),
            position
        );
    }

    #[test]
    fn test_extremes_roundtrip() {
        for layout in LAYOUTS {
            for x in [Position::MIN_XZ, -1, 0, Position::MAX_XZ] {
                for y in [Position::MIN_Y, -1, 0, Position::MAX_Y] {
                    for z in [Position::MIN_XZ, -1, 0, Position::MAX_XZ] {
                        let position = Position::new(x, y, z);
                        assert_eq!(Position::unpack(position.pack(layout), layout), position);
                    }
                }
            }
        }
    }

    #[test]
    fn test_layouts_differ() {
        let position = Position::new(1, 2, 3);
        assert_ne!(
            position.pack(PositionLayout::XYZ),
            position.pack(PositionLayout::XZY)
        );
    }

    #[test]
    fn test_out_of_range_truncates() {
        let position = Position::new(Position::MAX_XZ + 1, Position::MAX_Y + 1, -1);
        for layout in LAYOUTS {
            let unpacked = Position::unpack(position.pack(layout), layout);
            assert_eq!(unpacked, Position::new(Position::MIN_XZ, Position::MIN_Y, -1));
        }
    }

    #[test]
    fn test_try_pack_rejects_out_of_range() {
        let position = Position::new(0, 2048, 0);
        assert!(matches!(
            position.try_pack(PositionLayout::XZY),
            Err(ProtocolError::PositionOutOfRange { y: 2048, .. })
        ));
        assert!(Position::new(0, 2047, 0).try_pack(PositionLayout::XZY).is_ok());
    }

    #[test]
    fn test_layout_cutoff() {
        assert_eq!(
            PositionLayout::for_version(ProtocolVersion::V1_13_2),
            PositionLayout::XYZ
        );
        assert_eq!(
            PositionLayout::for_version(ProtocolVersion::V1_14),
            PositionLayout::XZY
        );
    }
}
