use facetry_facets::{
    FacetLabel,
    ordinals::{dedup_and_encode, decode_ordinal_set},
    path_codec::{self, decode_path, encode_path},
};
use facetry_testkit::data_gen;

/// The generators salt components with the codec's own reserved characters.
#[test]
fn test_generator_reserved_chars_match_codec() {
    assert_eq!(data_gen::DELIM_CHAR, path_codec::DELIM_CHAR);
    assert_eq!(data_gen::ESCAPE_CHAR, path_codec::ESCAPE_CHAR);
}

/// Random paths, with a good share of delimiter and escape characters inside
/// components, must decode to exactly what was encoded.
#[test]
fn test_path_round_trip_random() {
    let mut rng = data_gen::test_rng(0x5eed_0001);
    for _ in 0..2000 {
        let path = data_gen::generate_path(&mut rng, 6, 8, 0.25);
        let encoded = encode_path(&path);
        assert_eq!(decode_path(&encoded), path, "encoded: {encoded:?}");

        let label = FacetLabel::from_components(path.clone()).unwrap();
        assert_eq!(FacetLabel::decode(&label.encode()).unwrap(), label);
    }
}

/// Distinct paths never collide once encoded.
#[test]
fn test_path_encoding_is_injective() {
    let cases: Vec<Vec<&str>> = vec![
        vec!["a", "b"],
        vec!["a\u{1F}b"],
        vec!["a\u{1E}", "b"],
        vec!["a\u{1E}\u{1F}b"],
        vec!["a", "", "b"],
    ];
    let encoded: Vec<String> = cases.iter().map(|c| encode_path(c)).collect();
    for i in 0..encoded.len() {
        for j in (i + 1)..encoded.len() {
            assert_ne!(encoded[i], encoded[j], "{:?} vs {:?}", cases[i], cases[j]);
        }
    }
}

/// Decoding an encoded ordinal multiset yields its sorted, deduplicated values.
#[test]
fn test_ordinal_set_random() {
    let mut rng = data_gen::test_rng(0x5eed_0002);
    for round in 0..500 {
        let max = if round % 2 == 0 { 1_000 } else { i32::MAX };
        let count = rng.usize(0..64);
        let ordinals = data_gen::generate_ordinals(&mut rng, count, max);

        let mut expected = ordinals.clone();
        expected.sort_unstable();
        expected.dedup();

        let encoded = dedup_and_encode(&mut ordinals.clone()).unwrap();
        assert!(encoded.len() <= expected.len() * 5);
        assert_eq!(decode_ordinal_set(&encoded).unwrap(), expected);
    }
}

/// Clustered ordinals take about one byte each.
#[test]
fn test_ordinal_set_compactness() {
    let mut ordinals: Vec<i32> = (100_000..100_100).collect();
    let encoded = dedup_and_encode(&mut ordinals).unwrap();
    // 3 bytes for the first absolute value, 1 byte per subsequent delta.
    assert_eq!(encoded.len(), 3 + 99);
}
