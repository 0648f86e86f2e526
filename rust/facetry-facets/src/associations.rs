//! Association payloads: a scalar value attached to a facet label.
//!
//! Association records are packed per target index field as
//! `[ordinal: 4 bytes big-endian][payload]`. Integer and float payloads take
//! exactly 4 bytes (floats by their IEEE-754 bit pattern, big-endian); byte
//! payloads are written verbatim and carry no length, so only the application
//! that wrote them can split a bytes-valued blob back into records.

use std::fmt;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use facetry_common::{Result, error::Error};
use serde::{Deserialize, Serialize};

use crate::ordinals::Ordinal;

/// Size of one `[ordinal][i32|f32]` record.
pub const FIXED_RECORD_SIZE: usize = 8;

/// The value kind of an association payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssociationKind {
    Int,
    Float,
    Bytes,
}

impl AssociationKind {
    pub const fn name(&self) -> &'static str {
        match self {
            AssociationKind::Int => "int",
            AssociationKind::Float => "float",
            AssociationKind::Bytes => "bytes",
        }
    }
}

impl fmt::Display for AssociationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed association payload.
#[derive(Debug, Clone, PartialEq)]
pub enum AssociationValue {
    Int(i32),
    Float(f32),
    Bytes(Vec<u8>),
}

impl AssociationValue {
    pub fn kind(&self) -> AssociationKind {
        match self {
            AssociationValue::Int(_) => AssociationKind::Int,
            AssociationValue::Float(_) => AssociationKind::Float,
            AssociationValue::Bytes(_) => AssociationKind::Bytes,
        }
    }

    /// Number of payload bytes appended after the ordinal.
    pub fn encoded_len(&self) -> usize {
        match self {
            AssociationValue::Int(_) | AssociationValue::Float(_) => 4,
            AssociationValue::Bytes(bytes) => bytes.len(),
        }
    }

    /// Appends the payload bytes to `target`.
    pub fn write_to(&self, target: &mut Vec<u8>) {
        match self {
            AssociationValue::Int(v) => target.write_i32::<BigEndian>(*v).expect("vec write"),
            AssociationValue::Float(v) => target
                .write_u32::<BigEndian>(v.to_bits())
                .expect("vec write"),
            AssociationValue::Bytes(bytes) => target.extend_from_slice(bytes),
        }
    }
}

/// Appends one association record to a per-field buffer.
pub(crate) fn write_record(ordinal: Ordinal, value: &AssociationValue, target: &mut Vec<u8>) {
    target.reserve(4 + value.encoded_len());
    target
        .write_i32::<BigEndian>(ordinal)
        .expect("vec write");
    value.write_to(target);
}

/// Reader over a packed blob of fixed-width (`int` or `float`) association records.
#[derive(Debug, Clone, Copy)]
pub struct AssociationRecords<'a> {
    bytes: &'a [u8],
}

impl<'a> AssociationRecords<'a> {
    /// Wraps a blob produced for an index field whose associations are all
    /// `int` or all `float`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidFormat` error if the blob length is not a multiple of
    /// [`FIXED_RECORD_SIZE`].
    pub fn new(bytes: &'a [u8]) -> Result<AssociationRecords<'a>> {
        if bytes.len() % FIXED_RECORD_SIZE != 0 {
            return Err(Error::invalid_format(
                "association records",
                format!(
                    "length {} is not a multiple of {FIXED_RECORD_SIZE}",
                    bytes.len()
                ),
            ));
        }
        Ok(AssociationRecords { bytes })
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / FIXED_RECORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn records(self) -> impl Iterator<Item = (Ordinal, u32)> + 'a {
        self.bytes.chunks_exact(FIXED_RECORD_SIZE).map(|chunk| {
            (
                BigEndian::read_i32(&chunk[..4]),
                BigEndian::read_u32(&chunk[4..]),
            )
        })
    }

    /// Interprets every record as `(ordinal, i32)`.
    pub fn int_records(self) -> impl Iterator<Item = (Ordinal, i32)> + 'a {
        self.records().map(|(ord, bits)| (ord, bits as i32))
    }

    /// Interprets every record as `(ordinal, f32)`.
    pub fn float_records(self) -> impl Iterator<Item = (Ordinal, f32)> + 'a {
        self.records().map(|(ord, bits)| (ord, f32::from_bits(bits)))
    }
}
