use offs_crypto::Checksum;

use crate::header::{
    addresses_from_bytes, addresses_to_bytes, is_super_cbl as header_is_super_cbl, make_cbl_header,
    parse_header, CblHeader, ExtendedHeader, HeaderError, StructuredType,
};

/// A fully decoded Constituent Block List: header fields plus the address
/// list it points at (§4.7).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CblRecord {
    pub header: CblHeader,
    pub addresses: Vec<Checksum>,
}

impl CblRecord {
    /// Decodes a complete CBL block body (header followed by packed
    /// addresses).
    pub fn decode(data: &[u8]) -> Result<Self, HeaderError> {
        let header = parse_header(data)?;
        let address_bytes = &data[header.address_list_offset()..];
        let addresses = addresses_from_bytes(address_bytes, header.address_count)?;
        Ok(Self { header, addresses })
    }

    /// Re-encodes this record into its wire form. The header's signature
    /// bytes are carried through unchanged; callers that need a freshly
    /// signed record should build one with [`make_cbl_header`] instead.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = encode_header_with_signature(&self.header);
        out.extend_from_slice(&addresses_to_bytes(&self.addresses));
        out
    }

    /// True iff this CBL's tuple count implies whitened (non-plaintext)
    /// storage, i.e. more than one address per tuple.
    pub fn is_whitened(&self) -> bool {
        self.header.tuple_size > 1
    }

    /// True iff this CBL is itself a super-CBL: an index whose "addresses"
    /// are the checksums of other CBL blocks rather than data blocks.
    pub fn is_super_cbl(&self) -> bool {
        self.header.structured_type == StructuredType::SuperCbl
    }

    pub fn is_extended(&self) -> bool {
        self.header.structured_type == StructuredType::ExtendedCbl
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.header.extended.as_ref().map(|e| e.mime_type.as_str())
    }

    pub fn file_name(&self) -> Option<&str> {
        self.header.extended.as_ref().map(|e| e.file_name.as_str())
    }
}

fn encode_header_with_signature(header: &CblHeader) -> Vec<u8> {
    let mut out = make_cbl_header(
        header.creator_id,
        header.date_created,
        header.address_count,
        header.tuple_size,
        header.original_data_length,
        header.original_data_checksum,
        header.structured_type,
        header.extended.clone(),
    )
    .expect("a previously-parsed header always satisfies the tuple-multiple invariant");

    let sig_offset = out.len() - crate::header::SIGNATURE_BYTES;
    out[sig_offset..].copy_from_slice(&header.signature);
    out
}

/// Cheap pre-parse classifier used by callers (e.g. pool dependency
/// analysis) that only need to know whether a block is a super-CBL without
/// paying for full validation.
pub fn is_super_cbl(data: &[u8]) -> bool {
    header_is_super_cbl(data)
}

pub use crate::header::{is_encrypted, ExtendedHeader as CblExtendedHeader};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::CREATOR_ID_BYTES;

    fn sample_header(structured_type: StructuredType, tuple_size: u8) -> CblHeader {
        let bytes = make_cbl_header(
            [9u8; CREATOR_ID_BYTES],
            1,
            tuple_size as u32 * 2,
            tuple_size,
            1024,
            Checksum::compute(b"payload"),
            structured_type,
            None,
        )
        .unwrap();
        parse_header(&bytes).unwrap()
    }

    fn sample_record(structured_type: StructuredType, tuple_size: u8) -> CblRecord {
        let header = sample_header(structured_type, tuple_size);
        let addresses: Vec<Checksum> = (0..header.address_count)
            .map(|i| Checksum::compute(&[i as u8]))
            .collect();
        CblRecord { header, addresses }
    }

    #[test]
    fn decode_encode_round_trips() {
        let record = sample_record(StructuredType::Cbl, 3);
        let bytes = record.encode();
        let decoded = CblRecord::decode(&bytes).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn classifies_super_cbl() {
        let record = sample_record(StructuredType::SuperCbl, 3);
        assert!(record.is_super_cbl());
        assert!(is_super_cbl(&record.encode()));
    }

    #[test]
    fn classifies_whitened_vs_plain() {
        let whitened = sample_record(StructuredType::Cbl, 3);
        assert!(whitened.is_whitened());

        let plain = sample_record(StructuredType::Cbl, 1);
        assert!(!plain.is_whitened());
    }

    #[test]
    fn extended_header_exposes_mime_and_name() {
        let header_bytes = make_cbl_header(
            [0u8; CREATOR_ID_BYTES],
            1,
            3,
            3,
            10,
            Checksum::compute(b"x"),
            StructuredType::ExtendedCbl,
            Some(ExtendedHeader {
                mime_type: "application/octet-stream".to_owned(),
                file_name: "blob.bin".to_owned(),
            }),
        )
        .unwrap();
        let header = parse_header(&header_bytes).unwrap();
        let addresses = (0..header.address_count)
            .map(|i| Checksum::compute(&[i as u8]))
            .collect();
        let record = CblRecord { header, addresses };

        assert!(record.is_extended());
        assert_eq!(record.mime_type(), Some("application/octet-stream"));
        assert_eq!(record.file_name(), Some("blob.bin"));
    }
}
