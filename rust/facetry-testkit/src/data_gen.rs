//! Data generation utilities for testing.
//!
//! All generators take an explicit [`fastrand::Rng`] so that a failing case can
//! be reproduced from its seed (see [`test_rng`]).

// Mirrors `facetry_facets::path_codec::{DELIM_CHAR, ESCAPE_CHAR}`; this crate
// cannot depend on facetry-facets. Kept in sync by a test in facetry-facets.

/// Path delimiter used by the facet path codec.
pub const DELIM_CHAR: char = '\u{1F}';

/// Escape character used by the facet path codec.
pub const ESCAPE_CHAR: char = '\u{1E}';

const PLAIN_CHARS: &[char] = &[
    'a', 'b', 'c', 'x', 'y', 'z', '0', '7', ' ', '/', '\\', '-', 'é', 'ß', '日', '本', '🎉',
];

/// Returns a generator seeded from `FACETRY_TEST_SEED` if set, or from `default_seed`.
///
/// The seed in use is printed so that failures can be replayed.
pub fn test_rng(default_seed: u64) -> fastrand::Rng {
    let seed = std::env::var("FACETRY_TEST_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default_seed);
    println!("test seed: {seed}");
    fastrand::Rng::with_seed(seed)
}

/// Generates a non-empty label component of up to `max_len` characters.
///
/// With `reserved_ratio > 0`, roughly that fraction of the characters are the
/// codec's delimiter or escape character.
pub fn generate_component(rng: &mut fastrand::Rng, max_len: usize, reserved_ratio: f64) -> String {
    assert_ne!(max_len, 0);
    let len = rng.usize(1..=max_len);
    (0..len)
        .map(|_| {
            if rng.f64() < reserved_ratio {
                if rng.bool() { DELIM_CHAR } else { ESCAPE_CHAR }
            } else {
                PLAIN_CHARS[rng.usize(..PLAIN_CHARS.len())]
            }
        })
        .collect()
}

/// Generates a path of `1..=max_depth` components (dimension first).
pub fn generate_path(
    rng: &mut fastrand::Rng,
    max_depth: usize,
    max_component_len: usize,
    reserved_ratio: f64,
) -> Vec<String> {
    assert_ne!(max_depth, 0);
    let depth = rng.usize(1..=max_depth);
    (0..depth)
        .map(|_| generate_component(rng, max_component_len, reserved_ratio))
        .collect()
}

/// Generates `count` non-negative ordinals, clustered the way one document's
/// ordinals usually are, with duplicates.
///
/// About half of the values are drawn close to a random base, the rest spread
/// over `0..=max`.
pub fn generate_ordinals(rng: &mut fastrand::Rng, count: usize, max: i32) -> Vec<i32> {
    assert!(max >= 0);
    let base = rng.i32(0..=max);
    let mut ordinals: Vec<i32> = (0..count)
        .map(|_| {
            if rng.bool() {
                base.saturating_add(rng.i32(0..64)).min(max)
            } else {
                rng.i32(0..=max)
            }
        })
        .collect();
    if count > 1 {
        // Force at least one duplicate.
        let dup = ordinals[rng.usize(..count)];
        ordinals[rng.usize(..count)] = dup;
    }
    ordinals
}

/// Generates a set of dimension names `dim0..dimN`.
pub fn generate_dims(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("dim{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generators_respect_bounds() {
        let mut rng = test_rng(7);
        for _ in 0..100 {
            let path = generate_path(&mut rng, 4, 6, 0.3);
            assert!((1..=4).contains(&path.len()));
            assert!(path.iter().all(|c| !c.is_empty() && c.chars().count() <= 6));

            let ordinals = generate_ordinals(&mut rng, 20, 1000);
            assert_eq!(ordinals.len(), 20);
            assert!(ordinals.iter().all(|&o| (0..=1000).contains(&o)));
        }
    }

    #[test]
    fn test_reserved_chars_generated() {
        let mut rng = test_rng(11);
        let component = generate_component(&mut rng, 1, 1.0);
        assert!(component == DELIM_CHAR.to_string() || component == ESCAPE_CHAR.to_string());
    }

    #[test]
    fn test_generate_dims() {
        assert_eq!(generate_dims(3), ["dim0", "dim1", "dim2"]);
    }

    #[test]
    fn test_same_seed_same_data() {
        let a = generate_path(&mut fastrand::Rng::with_seed(3), 5, 5, 0.2);
        let b = generate_path(&mut fastrand::Rng::with_seed(3), 5, 5, 0.2);
        assert_eq!(a, b);
    }
}
