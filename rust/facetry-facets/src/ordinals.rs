//! Ordinal sets: deduplicated, delta-encoded, variable-length integer blobs.
//!
//! The encoded form of a set is the concatenation, in ascending order, of the
//! deltas between consecutive distinct ordinals (the first delta being the
//! first ordinal itself). Each delta is written as big-endian base-128 groups:
//! the most significant 7-bit group first, the continuation bit `0x80` set on
//! every group but the last. A 32-bit delta takes at most 5 groups.
//!
//! There is no length prefix and no terminator: readers scan to the end of the
//! buffer (see [`OrdinalSetDecoder`]).
//!
//! Deltas between the ordinals of one document are small in practice (a
//! category and its ancestors are created close to each other in the taxonomy),
//! so most deltas fit into one or two bytes.

use facetry_common::{Result, error::Error, try_or_ret_some_err, verify_arg};
use itertools::Itertools;

/// Taxonomy-assigned identity of one distinct label path.
pub type Ordinal = i32;

/// Ordinal of the taxonomy root. Never part of an encoded set produced by the
/// document builder.
pub const ROOT_ORDINAL: Ordinal = 0;

/// Returned by parent lookups for the root and for unknown ordinals.
pub const INVALID_ORDINAL: Ordinal = -1;

/// Maximum number of bytes a single encoded delta may occupy.
pub const MAX_GROUPS_PER_DELTA: usize = 5;

/// Sorts `ordinals` in place, drops duplicates and returns the encoded set.
///
/// # Errors
///
/// Returns an invalid-argument error if any ordinal is negative.
pub fn dedup_and_encode(ordinals: &mut [Ordinal]) -> Result<Vec<u8>> {
    ordinals.sort_unstable();
    if let Some(&min) = ordinals.first() {
        verify_arg!(ordinals, min >= 0);
    }

    let mut target = Vec::with_capacity(ordinals.len() * 2);
    let mut last: Option<u32> = None;
    for ord in ordinals.iter().copied().dedup() {
        let ord = ord as u32;
        let delta = match last {
            Some(prev) => ord - prev,
            None => ord,
        };
        write_delta(delta, &mut target);
        last = Some(ord);
    }
    Ok(target)
}

/// Appends one delta as big-endian 7-bit groups.
fn write_delta(delta: u32, target: &mut Vec<u8>) {
    let mut shift = 28;
    while shift > 0 && (delta >> shift) == 0 {
        shift -= 7;
    }
    while shift > 0 {
        target.push(0x80 | ((delta >> shift) & 0x7F) as u8);
        shift -= 7;
    }
    target.push((delta & 0x7F) as u8);
}

/// Decodes a whole ordinal set into a vector of ascending, distinct ordinals.
pub fn decode_ordinal_set(bytes: &[u8]) -> Result<Vec<Ordinal>> {
    OrdinalSetDecoder::new(bytes).collect()
}

/// Iterator over the ordinals of an encoded set.
///
/// Yields an `InvalidFormat` error (and then stops) if the buffer ends in the
/// middle of a delta, a delta spans more than [`MAX_GROUPS_PER_DELTA`] bytes, or
/// the running ordinal overflows `i32`.
pub struct OrdinalSetDecoder<'a> {
    bytes: &'a [u8],
    pos: usize,
    last: Option<u64>,
    failed: bool,
}

impl<'a> OrdinalSetDecoder<'a> {
    pub fn new(bytes: &'a [u8]) -> OrdinalSetDecoder<'a> {
        OrdinalSetDecoder {
            bytes,
            pos: 0,
            last: None,
            failed: false,
        }
    }

    fn read_delta(&mut self) -> Result<u64> {
        let mut value = 0u64;
        for group in 0..MAX_GROUPS_PER_DELTA {
            let Some(&b) = self.bytes.get(self.pos) else {
                return Err(Error::invalid_format(
                    "ordinal set",
                    format!("truncated delta at byte {} (group {group})", self.pos),
                ));
            };
            self.pos += 1;
            value = (value << 7) | (b & 0x7F) as u64;
            if b & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(Error::invalid_format(
            "ordinal set",
            format!(
                "delta ending at byte {} exceeds {MAX_GROUPS_PER_DELTA} groups",
                self.pos
            ),
        ))
    }

    fn next_ordinal(&mut self) -> Result<Ordinal> {
        let delta = self.read_delta()?;
        let value = match self.last {
            Some(prev) => {
                if delta == 0 {
                    return Err(Error::invalid_format(
                        "ordinal set",
                        format!("zero delta at byte {}", self.pos - 1),
                    ));
                }
                prev + delta
            }
            None => delta,
        };
        if value > Ordinal::MAX as u64 {
            return Err(Error::invalid_format(
                "ordinal set",
                format!("ordinal {value} overflows"),
            ));
        }
        self.last = Some(value);
        Ok(value as Ordinal)
    }
}

impl Iterator for OrdinalSetDecoder<'_> {
    type Item = Result<Ordinal>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.bytes.len() {
            return None;
        }
        self.failed = true;
        let ordinal = try_or_ret_some_err!(self.next_ordinal());
        self.failed = false;
        Some(Ok(ordinal))
    }
}
