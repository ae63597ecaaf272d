//! Binary encode/decode for Constituent Block Lists (CBLs) and the magnet
//! locators that point at them.

mod cbl;
mod crc8;
mod header;
mod magnet;

pub use cbl::{is_encrypted, is_super_cbl, CblExtendedHeader, CblRecord};
pub use crc8::crc8;
pub use header::{
    addresses_from_bytes, addresses_to_bytes, make_cbl_header, parse_header, CblHeader,
    ExtendedHeader, HeaderError, StructuredType, ADDRESS_BYTES, CREATOR_ID_BYTES, ECIES_MULTI_MARKER,
    ECIES_SINGLE_MARKER, HEADER_VERSION, MAGIC_PREFIX, SIGNATURE_BYTES,
};
pub use magnet::{Magnet, MagnetError};
