use byteorder::{BigEndian, ByteOrder};
use offs_crypto::{Checksum, CHECKSUM_BYTES};
use thiserror::Error;

use crate::crc8::crc8;

pub const MAGIC_PREFIX: u8 = 0xBC;
pub const HEADER_VERSION: u8 = 1;
pub const CREATOR_ID_BYTES: usize = 16;
pub const SIGNATURE_BYTES: usize = 64;
pub const ADDRESS_BYTES: usize = CHECKSUM_BYTES;

/// First byte of an ECIES single-recipient envelope, standing in for the
/// external encryption collaborator's wire marker (§1 — out of scope here).
pub const ECIES_SINGLE_MARKER: u8 = 0xE1;
/// First byte of an ECIES multi-recipient envelope.
pub const ECIES_MULTI_MARKER: u8 = 0xE2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("header does not start with the CBL magic prefix")]
    InvalidMagic,

    #[error("unrecognized structured type byte {0:#x}")]
    InvalidStructuredType(u8),

    #[error("unsupported CBL header version {0}")]
    UnsupportedVersion(u8),

    #[error("header CRC8 mismatch: expected {expected:#x}, computed {computed:#x}")]
    CrcMismatch { expected: u8, computed: u8 },

    #[error("address count {address_count} is not a multiple of tuple size {tuple_size}")]
    AddressCountNotTupleMultiple { address_count: u32, tuple_size: u8 },

    #[error("header is truncated: need at least {needed} bytes, have {have}")]
    TruncatedHeader { needed: usize, have: usize },

    #[error("extended header string is not valid utf8")]
    InvalidUtf8,
}

/// The structured-type byte discriminating between CBL sub-kinds (§4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredType {
    Cbl,
    ExtendedCbl,
    MessageCbl,
    SuperCbl,
    VaultCbl,
}

impl StructuredType {
    const CBL: u8 = 2;
    const EXTENDED_CBL: u8 = 3;
    const MESSAGE_CBL: u8 = 4;
    const SUPER_CBL: u8 = 5;
    const VAULT_CBL: u8 = 6;

    pub fn as_byte(self) -> u8 {
        match self {
            StructuredType::Cbl => Self::CBL,
            StructuredType::ExtendedCbl => Self::EXTENDED_CBL,
            StructuredType::MessageCbl => Self::MESSAGE_CBL,
            StructuredType::SuperCbl => Self::SUPER_CBL,
            StructuredType::VaultCbl => Self::VAULT_CBL,
        }
    }

    pub fn from_byte(b: u8) -> Result<Self, HeaderError> {
        match b {
            Self::CBL => Ok(StructuredType::Cbl),
            Self::EXTENDED_CBL => Ok(StructuredType::ExtendedCbl),
            Self::MESSAGE_CBL => Ok(StructuredType::MessageCbl),
            Self::SUPER_CBL => Ok(StructuredType::SuperCbl),
            Self::VAULT_CBL => Ok(StructuredType::VaultCbl),
            other => Err(HeaderError::InvalidStructuredType(other)),
        }
    }

    pub fn is_extended(self) -> bool {
        matches!(self, StructuredType::ExtendedCbl)
    }

    pub fn is_super(self) -> bool {
        matches!(self, StructuredType::SuperCbl)
    }
}

/// The `mimeType`/`fileName` pair carried by an extended CBL header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedHeader {
    pub mime_type: String,
    pub file_name: String,
}

impl ExtendedHeader {
    fn encode(&self, out: &mut Vec<u8>) {
        encode_len_prefixed_str(&self.mime_type, out);
        encode_len_prefixed_str(&self.file_name, out);
    }

    fn decode(data: &[u8], offset: &mut usize) -> Result<Self, HeaderError> {
        let mime_type = decode_len_prefixed_str(data, offset)?;
        let file_name = decode_len_prefixed_str(data, offset)?;
        Ok(Self {
            mime_type,
            file_name,
        })
    }
}

fn encode_len_prefixed_str(s: &str, out: &mut Vec<u8>) {
    let bytes = s.as_bytes();
    let mut len_buf = [0u8; 2];
    BigEndian::write_u16(&mut len_buf, bytes.len() as u16);
    out.extend_from_slice(&len_buf);
    out.extend_from_slice(bytes);
}

fn decode_len_prefixed_str(data: &[u8], offset: &mut usize) -> Result<String, HeaderError> {
    require_len(data, *offset + 2)?;
    let len = BigEndian::read_u16(&data[*offset..*offset + 2]) as usize;
    *offset += 2;

    require_len(data, *offset + len)?;
    let s = std::str::from_utf8(&data[*offset..*offset + len])
        .map_err(|_| HeaderError::InvalidUtf8)?
        .to_owned();
    *offset += len;

    Ok(s)
}

fn require_len(data: &[u8], needed: usize) -> Result<(), HeaderError> {
    if data.len() < needed {
        Err(HeaderError::TruncatedHeader {
            needed,
            have: data.len(),
        })
    } else {
        Ok(())
    }
}

/// The parsed view of a CBL header, as described by §4.7's binary layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CblHeader {
    pub structured_type: StructuredType,
    pub version: u8,
    pub creator_id: [u8; CREATOR_ID_BYTES],
    pub date_created: u64,
    pub address_count: u32,
    pub tuple_size: u8,
    pub original_data_length: u64,
    pub original_data_checksum: Checksum,
    pub extended: Option<ExtendedHeader>,
    pub signature: [u8; SIGNATURE_BYTES],
}

impl CblHeader {
    /// Byte offset where the address list begins, immediately after the
    /// fixed/extended header and the signature.
    pub fn address_list_offset(&self) -> usize {
        fixed_header_len(self.extended.as_ref())
    }
}

fn fixed_header_len(extended: Option<&ExtendedHeader>) -> usize {
    let mut len = 1 // magic
        + 1 // structured_type
        + 1 // version
        + 1 // crc8
        + CREATOR_ID_BYTES
        + 8 // date_created
        + 4 // address_count
        + 1 // tuple_size
        + 8 // original_data_length
        + CHECKSUM_BYTES // original_data_checksum
        + 1; // is_extended_header flag

    if let Some(extended) = extended {
        len += 2 + extended.mime_type.len();
        len += 2 + extended.file_name.len();
    }

    len + SIGNATURE_BYTES
}

/// Builds the exact header bytes that must precede the address list,
/// with the signature slot zeroed (signing is a separate, external step;
/// §4.7).
#[allow(clippy::too_many_arguments)]
pub fn make_cbl_header(
    creator_id: [u8; CREATOR_ID_BYTES],
    date_created: u64,
    address_count: u32,
    tuple_size: u8,
    original_data_length: u64,
    original_data_checksum: Checksum,
    structured_type: StructuredType,
    extended: Option<ExtendedHeader>,
) -> Result<Vec<u8>, HeaderError> {
    if tuple_size == 0 || address_count % tuple_size as u32 != 0 {
        return Err(HeaderError::AddressCountNotTupleMultiple {
            address_count,
            tuple_size,
        });
    }

    let mut out = Vec::with_capacity(fixed_header_len(extended.as_ref()));

    out.push(MAGIC_PREFIX);
    out.push(structured_type.as_byte());
    out.push(HEADER_VERSION);
    out.push(0); // crc8 placeholder, patched below
    out.extend_from_slice(&creator_id);

    let mut buf8 = [0u8; 8];
    BigEndian::write_u64(&mut buf8, date_created);
    out.extend_from_slice(&buf8);

    let mut buf4 = [0u8; 4];
    BigEndian::write_u32(&mut buf4, address_count);
    out.extend_from_slice(&buf4);

    out.push(tuple_size);

    BigEndian::write_u64(&mut buf8, original_data_length);
    out.extend_from_slice(&buf8);

    out.extend_from_slice(original_data_checksum.as_bytes());

    match &extended {
        Some(ext) => {
            out.push(1);
            ext.encode(&mut out);
        }
        None => out.push(0),
    }

    let crc = crc8(&out[4..]);
    out[3] = crc;

    out.extend_from_slice(&[0u8; SIGNATURE_BYTES]);

    Ok(out)
}

/// Parses a CBL header from `data`, validating magic, structured type,
/// version, CRC8, and the tuple-multiple invariant on the address count.
pub fn parse_header(data: &[u8]) -> Result<CblHeader, HeaderError> {
    require_len(data, 4)?;

    if data[0] != MAGIC_PREFIX {
        return Err(HeaderError::InvalidMagic);
    }

    let structured_type = StructuredType::from_byte(data[1])?;
    let version = data[2];
    if version != HEADER_VERSION {
        return Err(HeaderError::UnsupportedVersion(version));
    }
    let expected_crc = data[3];

    let mut offset = 4usize;

    require_len(data, offset + CREATOR_ID_BYTES)?;
    let mut creator_id = [0u8; CREATOR_ID_BYTES];
    creator_id.copy_from_slice(&data[offset..offset + CREATOR_ID_BYTES]);
    offset += CREATOR_ID_BYTES;

    require_len(data, offset + 8)?;
    let date_created = BigEndian::read_u64(&data[offset..offset + 8]);
    offset += 8;

    require_len(data, offset + 4)?;
    let address_count = BigEndian::read_u32(&data[offset..offset + 4]);
    offset += 4;

    require_len(data, offset + 1)?;
    let tuple_size = data[offset];
    offset += 1;

    require_len(data, offset + 8)?;
    let original_data_length = BigEndian::read_u64(&data[offset..offset + 8]);
    offset += 8;

    require_len(data, offset + CHECKSUM_BYTES)?;
    let original_data_checksum = Checksum::try_from(&data[offset..offset + CHECKSUM_BYTES])
        .map_err(|_| HeaderError::TruncatedHeader {
            needed: offset + CHECKSUM_BYTES,
            have: data.len(),
        })?;
    offset += CHECKSUM_BYTES;

    require_len(data, offset + 1)?;
    let is_extended = data[offset] != 0;
    offset += 1;

    let extended = if is_extended {
        Some(ExtendedHeader::decode(data, &mut offset)?)
    } else {
        None
    };

    if tuple_size == 0 || address_count % tuple_size as u32 != 0 {
        return Err(HeaderError::AddressCountNotTupleMultiple {
            address_count,
            tuple_size,
        });
    }

    let computed_crc = crc8(&data[4..offset]);
    if computed_crc != expected_crc {
        return Err(HeaderError::CrcMismatch {
            expected: expected_crc,
            computed: computed_crc,
        });
    }

    require_len(data, offset + SIGNATURE_BYTES)?;
    let mut signature = [0u8; SIGNATURE_BYTES];
    signature.copy_from_slice(&data[offset..offset + SIGNATURE_BYTES]);

    Ok(CblHeader {
        structured_type,
        version,
        creator_id,
        date_created,
        address_count,
        tuple_size,
        original_data_length,
        original_data_checksum,
        extended,
        signature,
    })
}

/// Parses the tightly packed, fixed-width address list that follows a CBL
/// header.
pub fn addresses_from_bytes(data: &[u8], address_count: u32) -> Result<Vec<Checksum>, HeaderError> {
    let needed = address_count as usize * ADDRESS_BYTES;
    require_len(data, needed)?;

    let mut out = Vec::with_capacity(address_count as usize);
    for chunk in data[..needed].chunks_exact(ADDRESS_BYTES) {
        out.push(Checksum::try_from(chunk).expect("chunk is exactly ADDRESS_BYTES long"));
    }
    Ok(out)
}

/// Encodes an address list back into its tightly packed wire form.
pub fn addresses_to_bytes(addresses: &[Checksum]) -> Vec<u8> {
    let mut out = Vec::with_capacity(addresses.len() * ADDRESS_BYTES);
    for address in addresses {
        out.extend_from_slice(address.as_bytes());
    }
    out
}

/// True iff `data` does not start with the CBL magic prefix and instead
/// carries the stand-in ECIES envelope marker (§1 — real classification is
/// delegated to the external encryption collaborator).
pub fn is_encrypted(data: &[u8]) -> bool {
    match data.first().copied() {
        Some(b) if b != MAGIC_PREFIX => b == ECIES_SINGLE_MARKER || b == ECIES_MULTI_MARKER,
        _ => false,
    }
}

/// True iff `data` parses as a header with structured type `SuperCBL`.
pub fn is_super_cbl(data: &[u8]) -> bool {
    data.len() > 1 && data[0] == MAGIC_PREFIX && data[1] == StructuredType::SuperCbl.as_byte()
}
