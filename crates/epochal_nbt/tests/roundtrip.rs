#![allow(clippy::unwrap_used)]

use epochal_nbt::{
    Compound, List, NamedTag, RootFraming, Tag, TagType, from_slice, skip_root, to_vec,
};
use proptest::prelude::*;

fn every_kind() -> Compound {
    let mut inner = Compound::new();
    inner.insert("name", "stone");
    inner.insert("count", 64i8);

    let mut list_of_compounds = List::new(TagType::Compound);
    list_of_compounds.push(inner.clone()).unwrap();
    list_of_compounds.push(Compound::new()).unwrap();

    let mut root = Compound::new();
    root.insert("byte", 0x7Fi8);
    root.insert("short", -12345i16);
    root.insert("int", 0x1234_5678i32);
    root.insert("long", i64::MIN);
    root.insert("float", 1.5f32);
    root.insert("double", -0.125f64);
    root.insert("bytes", vec![1i8, -2, 3]);
    root.insert("string", "héllo wörld");
    root.insert("list", list_of_compounds);
    root.insert("compound", inner);
    root.insert("ints", vec![1i32, -1, i32::MAX]);
    root.insert("longs", vec![0i64, i64::MAX]);
    root.insert("empty_list", List::new(TagType::Int));
    root
}

#[test]
fn test_roundtrip_all_tag_kinds() {
    let root = Tag::Compound(every_kind());
    for framing in [RootFraming::Legacy, RootFraming::Network] {
        let bytes = to_vec(framing, "", &root).unwrap();
        let decoded = from_slice(framing, &bytes).unwrap();
        assert_eq!(decoded.tag, root);
    }
}

#[test]
fn test_roundtrip_keeps_root_name_under_legacy_framing() {
    let root = Tag::Compound(every_kind());
    let bytes = to_vec(RootFraming::Legacy, "Level", &root).unwrap();
    let decoded = from_slice(RootFraming::Legacy, &bytes).unwrap();
    assert_eq!(decoded, NamedTag::new("Level", root));
}

#[test]
fn test_framings_differ_only_by_root_name() {
    let root = Tag::Compound(every_kind());
    let legacy = to_vec(RootFraming::Legacy, "", &root).unwrap();
    let network = to_vec(RootFraming::Network, "", &root).unwrap();

    // An empty legacy name is the two length bytes after the type byte.
    assert_eq!(legacy.len(), network.len() + 2);
    assert_eq!(legacy[0], network[0]);
    assert_eq!(&legacy[1..3], &[0x00, 0x00]);
    assert_eq!(&legacy[3..], &network[1..]);

    assert_ne!(
        from_slice(RootFraming::Network, &legacy).ok().map(|t| t.tag),
        Some(root.clone())
    );
    assert_ne!(
        from_slice(RootFraming::Legacy, &network).ok().map(|t| t.tag),
        Some(root)
    );
}

#[test]
fn test_skip_consumes_exactly_one_root() {
    let root = Tag::Compound(every_kind());
    for framing in [RootFraming::Legacy, RootFraming::Network] {
        let mut bytes = to_vec(framing, "x", &root).unwrap();
        let encoded_len = bytes.len();
        bytes.extend_from_slice(&[0xDE, 0xAD]);

        let mut cursor = &bytes[..];
        let skipped = skip_root(&mut cursor, framing).unwrap();
        assert_eq!(skipped, encoded_len);
        assert_eq!(cursor, [0xDE, 0xAD]);
    }
}

fn arb_tag() -> impl Strategy<Value = Tag> {
    let leaf = prop_oneof![
        any::<i8>().prop_map(Tag::Byte),
        any::<i16>().prop_map(Tag::Short),
        any::<i32>().prop_map(Tag::Int),
        any::<i64>().prop_map(Tag::Long),
        any::<i32>().prop_map(|v| Tag::Float(v as f32)),
        any::<i32>().prop_map(|v| Tag::Double(f64::from(v) / 8.0)),
        proptest::collection::vec(any::<i8>(), 0..16).prop_map(Tag::ByteArray),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Tag::String),
        proptest::collection::vec(any::<i32>(), 0..8).prop_map(Tag::IntArray),
        proptest::collection::vec(any::<i64>(), 0..8).prop_map(Tag::LongArray),
    ];

    leaf.prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(|mut items| {
                let element_type = items.first().map(Tag::tag_type);
                items.retain(|item| Some(item.tag_type()) == element_type);
                Tag::List(List::from_tags(items).unwrap())
            }),
            proptest::collection::vec(("[a-z]{1,6}", inner), 0..6)
                .prop_map(|entries| Tag::Compound(entries.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_tree_roundtrip(tag in arb_tag(), name in "[a-z]{0,8}") {
        let mut root = Compound::new();
        root.insert("value", tag);
        let root = Tag::Compound(root);

        for framing in [RootFraming::Legacy, RootFraming::Network] {
            let bytes = to_vec(framing, &name, &root).unwrap();
            let decoded = from_slice(framing, &bytes).unwrap();
            prop_assert_eq!(&decoded.tag, &root);

            let mut cursor = &bytes[..];
            prop_assert_eq!(skip_root(&mut cursor, framing).unwrap(), bytes.len());
        }
    }
}
