#![allow(clippy::unwrap_used)]

use std::io::Cursor;

use epochal_protocol::types::{
    ItemSlot, Position, PositionLayout, ProtocolString, VarInt, VarLong,
};
use epochal_protocol::{CodecContext, ProtocolError, ProtocolRead, ProtocolVersion, ProtocolWrite};
use epochal_protocol::{VersionedRead, VersionedWrite};
use proptest::prelude::*;

fn encode<T: ProtocolWrite>(value: &T) -> Vec<u8> {
    let mut buffer = Vec::new();
    value.write_to(&mut buffer).unwrap();
    buffer
}

proptest! {
    #[test]
    fn varint_roundtrip_is_canonical(value in any::<i32>()) {
        let bytes = encode(&VarInt(value));
        prop_assert_eq!(bytes.len(), VarInt(value).len());
        prop_assert!(bytes.len() <= 5);
        prop_assert_eq!(bytes.last().copied().unwrap() & 0x80, 0);

        let (decoded, read) = VarInt::read_from(&mut Cursor::new(&bytes)).unwrap();
        prop_assert_eq!(decoded, VarInt(value));
        prop_assert_eq!(read, bytes.len());
        prop_assert_eq!(VarInt::peek(&bytes).unwrap(), Some((value, bytes.len())));
    }

    #[test]
    fn varlong_roundtrip(value in any::<i64>()) {
        let bytes = encode(&VarLong(value));
        prop_assert!(bytes.len() <= 10);
        let (decoded, _) = VarLong::read_from(&mut Cursor::new(&bytes)).unwrap();
        prop_assert_eq!(decoded, VarLong(value));
    }

    #[test]
    fn position_roundtrip_in_range(
        x in Position::MIN_XZ..=Position::MAX_XZ,
        y in Position::MIN_Y..=Position::MAX_Y,
        z in Position::MIN_XZ..=Position::MAX_XZ,
    ) {
        let position = Position::new(x, y, z);
        for layout in [PositionLayout::XYZ, PositionLayout::XZY] {
            let packed = position.try_pack(layout).unwrap();
            prop_assert_eq!(Position::unpack(packed, layout), position);
        }
    }

    #[test]
    fn string_roundtrip(value in "\\PC{0,64}") {
        let mut bytes = Vec::new();
        ProtocolString::write_str(&mut bytes, &value, 128).unwrap();
        let (decoded, read) = ProtocolString::read_bounded(&mut Cursor::new(&bytes), 128).unwrap();
        prop_assert_eq!(decoded.0, value);
        prop_assert_eq!(read, bytes.len());
    }
}

#[test]
fn varint_rejects_six_byte_run() {
    let bytes = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
    assert!(matches!(
        VarInt::read_from(&mut Cursor::new(&bytes)),
        Err(ProtocolError::MalformedVarInt)
    ));
    assert!(matches!(VarInt::peek(&bytes), Err(ProtocolError::MalformedVarInt)));
}

#[test]
fn position_layouts_differ() {
    let position = Position::new(1, 2, 3);
    assert_ne!(
        position.pack(PositionLayout::XYZ),
        position.pack(PositionLayout::XZY)
    );
}

#[test]
fn position_out_of_range_truncates_or_fails() {
    let position = Position::new(Position::MAX_XZ + 1, 0, 0);
    assert!(matches!(
        position.try_pack(PositionLayout::XZY),
        Err(ProtocolError::PositionOutOfRange { .. })
    ));
    let wrapped = Position::unpack(position.pack(PositionLayout::XZY), PositionLayout::XZY);
    assert_eq!(wrapped.x, Position::MIN_XZ);
}

#[test]
fn empty_slot_per_generation() {
    for (version, expected) in [
        (ProtocolVersion::V1_12_2, &[0xFF, 0xFF][..]),
        (ProtocolVersion::V1_13, &[0xFF, 0xFF][..]),
        (ProtocolVersion::V1_16_4, &[0x00][..]),
        (ProtocolVersion::V1_21, &[0x00][..]),
    ] {
        let ctx = CodecContext::defaults(version);
        let mut bytes = Vec::new();
        ItemSlot::EMPTY.write_versioned(&mut bytes, &ctx).unwrap();
        assert_eq!(bytes, expected, "on {version}");

        let (decoded, read) = ItemSlot::read_versioned(&mut Cursor::new(&bytes), &ctx).unwrap();
        assert!(decoded.is_empty());
        assert_eq!(read, expected.len());
    }
}
