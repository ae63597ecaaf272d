use std::{fmt, str::FromStr};

use serde::de::{Error as DeError, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use sha3::{Digest, Sha3_512};
use thiserror::Error;

/// Number of bytes in a SHA3-512 digest.
pub const CHECKSUM_BYTES: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChecksumError {
    #[error("hex string does not decode to {CHECKSUM_BYTES} bytes")]
    InvalidLength,

    #[error("malformed hex string")]
    InvalidHex,
}

/// A SHA3-512 digest, used as the content address of a block.
///
/// Equality is plain byte-equality. The hex encoding is always lower-case
/// with no separators, and round-trips: `Checksum::from_hex(x.to_hex()) ==
/// Ok(x)`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum([u8; CHECKSUM_BYTES]);

impl Checksum {
    #[inline]
    pub const fn new(bytes: [u8; CHECKSUM_BYTES]) -> Self {
        Self(bytes)
    }

    /// Computes the SHA3-512 checksum of `data`.
    pub fn compute(data: &[u8]) -> Self {
        let mut hasher = Sha3_512::new();
        hasher.update(data);
        let digest = hasher.finalize();

        let mut bytes = [0u8; CHECKSUM_BYTES];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self, ChecksumError> {
        let mut bytes = [0u8; CHECKSUM_BYTES];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| {
            if s.len() != CHECKSUM_BYTES * 2 {
                ChecksumError::InvalidLength
            } else {
                ChecksumError::InvalidHex
            }
        })?;
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    #[inline]
    pub fn equals(&self, other: &Self) -> bool {
        self == other
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; CHECKSUM_BYTES] {
        &self.0
    }
}

impl AsRef<[u8]> for Checksum {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; CHECKSUM_BYTES]> for Checksum {
    #[inline]
    fn from(bytes: [u8; CHECKSUM_BYTES]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for Checksum {
    type Error = ChecksumError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        let bytes: [u8; CHECKSUM_BYTES] =
            value.try_into().map_err(|_| ChecksumError::InvalidLength)?;
        Ok(Self(bytes))
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Checksum").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Checksum {
    type Err = ChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for Checksum {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

struct ChecksumVisitor;

impl Visitor<'_> for ChecksumVisitor {
    type Value = Checksum;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "a hex string representing {CHECKSUM_BYTES} bytes")
    }

    fn visit_str<E>(self, s: &str) -> Result<Self::Value, E>
    where
        E: DeError,
    {
        Checksum::from_str(s).map_err(|_| DeError::invalid_value(Unexpected::Str(s), &self))
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_str(ChecksumVisitor)
    }
}
