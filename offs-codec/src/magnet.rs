use std::fmt;
use std::str::FromStr;

use offs_crypto::Checksum;
use thiserror::Error;

/// An opaque locator carrying enough CBL metadata to find and reconstruct a
/// file: the pool the CBL block lives in, the CBL's own checksum, its tuple
/// size, and the original payload length (§10.5). Delivery — HTTP, DHT,
/// whatever resolves a magnet into bytes — stays out of scope; this is
/// strictly the encode/decode of the locator string itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Magnet {
    pub pool_id: String,
    pub cbl_checksum: Checksum,
    pub tuple_size: u8,
    pub original_data_length: u64,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MagnetError {
    #[error("magnet URL is missing the 'offs:' scheme")]
    MissingScheme,

    #[error("magnet URL is missing the pool id or checksum segment")]
    MissingSegment,

    #[error("magnet URL pool id is empty")]
    EmptyPoolId,

    #[error("magnet URL checksum is invalid: {0}")]
    InvalidChecksum(#[from] offs_crypto::ChecksumError),

    #[error("magnet URL is missing required query parameter {0}")]
    MissingParam(&'static str),

    #[error("magnet URL query parameter {0} is not a valid integer")]
    InvalidParam(&'static str),
}

const SCHEME: &str = "offs";

impl fmt::Display for Magnet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{SCHEME}:{}/{}?tuple={}&len={}",
            self.pool_id,
            self.cbl_checksum.to_hex(),
            self.tuple_size,
            self.original_data_length,
        )
    }
}

impl FromStr for Magnet {
    type Err = MagnetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s.strip_prefix(&format!("{SCHEME}:")).ok_or(MagnetError::MissingScheme)?;

        let (path, query) = match rest.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (rest, None),
        };

        let (pool_id, checksum_hex) = path.split_once('/').ok_or(MagnetError::MissingSegment)?;
        if pool_id.is_empty() {
            return Err(MagnetError::EmptyPoolId);
        }

        let cbl_checksum = Checksum::from_hex(checksum_hex)?;

        let query = query.unwrap_or("");
        let tuple_size = parse_param::<u8>(query, "tuple")?;
        let original_data_length = parse_param::<u64>(query, "len")?;

        Ok(Self {
            pool_id: pool_id.to_owned(),
            cbl_checksum,
            tuple_size,
            original_data_length,
        })
    }
}

fn parse_param<T: FromStr>(query: &str, name: &'static str) -> Result<T, MagnetError> {
    query
        .split('&')
        .find_map(|pair| pair.strip_prefix(name).and_then(|rest| rest.strip_prefix('=')))
        .ok_or(MagnetError::MissingParam(name))?
        .parse::<T>()
        .map_err(|_| MagnetError::InvalidParam(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from_str() {
        let magnet = Magnet {
            pool_id: "default".to_owned(),
            cbl_checksum: Checksum::compute(b"cbl body"),
            tuple_size: 3,
            original_data_length: 4096,
        };

        let encoded = magnet.to_string();
        let parsed: Magnet = encoded.parse().unwrap();
        assert_eq!(parsed, magnet);
    }

    #[test]
    fn rejects_missing_scheme() {
        assert_eq!(
            "default/abc?tuple=3&len=1".parse::<Magnet>(),
            Err(MagnetError::MissingScheme)
        );
    }

    #[test]
    fn rejects_empty_pool_id() {
        let checksum = Checksum::compute(b"x").to_hex();
        let s = format!("offs:/{checksum}?tuple=3&len=1");
        assert_eq!(s.parse::<Magnet>(), Err(MagnetError::EmptyPoolId));
    }

    #[test]
    fn rejects_missing_query_param() {
        let checksum = Checksum::compute(b"x").to_hex();
        let s = format!("offs:default/{checksum}?len=1");
        assert_eq!(
            s.parse::<Magnet>(),
            Err(MagnetError::MissingParam("tuple"))
        );
    }
}
