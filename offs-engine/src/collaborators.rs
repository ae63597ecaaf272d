use offs_codec::{make_cbl_header, CblRecord, SIGNATURE_BYTES};

use crate::error::Error;

/// Bytes an ECIES envelope adds on top of the plaintext it wraps (ephemeral
/// public key plus authentication tag). `processFileInChunks`/`ingestFile`
/// shrink each payload by this much before encrypting, so the ciphertext
/// still fits the block's declared size exactly.
pub const ECIES_OVERHEAD: usize = 65;

/// Collaborator contracts the engine consumes but never implements (§6):
/// public-key identity, ECIES encryption, and signature verification all
/// live outside the core per §1.
pub trait EciesEncryptor: Send + Sync {
    fn encrypt(&self, payload: &[u8], recipient: &[u8]) -> Result<Vec<u8>, Error>;
}

pub trait EciesDecryptor: Send + Sync {
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>, Error>;
}

pub trait SignatureSigner: Send + Sync {
    fn sign(&self, header_bytes_without_signature: &[u8]) -> [u8; SIGNATURE_BYTES];
}

pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, header_bytes_without_signature: &[u8], signature: &[u8; SIGNATURE_BYTES], creator: &[u8]) -> bool;
}

/// Reproduces the exact header bytes (signature zeroed) that were signed,
/// so a verifier can be handed the same input the signer saw.
pub fn header_bytes_for_signing(header: &offs_codec::CblHeader) -> Vec<u8> {
    let mut bytes = make_cbl_header(
        header.creator_id,
        header.date_created,
        header.address_count,
        header.tuple_size,
        header.original_data_length,
        header.original_data_checksum,
        header.structured_type,
        header.extended.clone(),
    )
    .expect("a previously-parsed header satisfies make_cbl_header's own preconditions");

    let sig_offset = bytes.len() - SIGNATURE_BYTES;
    bytes.truncate(sig_offset);
    bytes
}

/// `validateSignature` (§4.7): delegates to the verifier collaborator,
/// never throws — a verification failure surfaces as `false`, not an
/// error.
pub fn validate_signature(verifier: &dyn SignatureVerifier, record: &CblRecord, creator: &[u8]) -> bool {
    let header_bytes = header_bytes_for_signing(&record.header);
    verifier.verify(&header_bytes, &record.header.signature, creator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use offs_codec::{make_cbl_header, parse_header, StructuredType, CREATOR_ID_BYTES};
    use offs_crypto::Checksum;

    struct AlwaysTrue;
    impl SignatureVerifier for AlwaysTrue {
        fn verify(&self, _: &[u8], _: &[u8; SIGNATURE_BYTES], _: &[u8]) -> bool {
            true
        }
    }

    struct AlwaysFalse;
    impl SignatureVerifier for AlwaysFalse {
        fn verify(&self, _: &[u8], _: &[u8; SIGNATURE_BYTES], _: &[u8]) -> bool {
            false
        }
    }

    fn sample_record() -> CblRecord {
        let bytes = make_cbl_header(
            [1u8; CREATOR_ID_BYTES],
            1,
            3,
            3,
            1,
            Checksum::compute(b"x"),
            StructuredType::Cbl,
            None,
        )
        .unwrap();
        let header = parse_header(&bytes).unwrap();
        CblRecord {
            header,
            addresses: (0..3).map(|i| Checksum::compute(&[i as u8])).collect(),
        }
    }

    #[test]
    fn delegates_to_verifier() {
        let record = sample_record();
        assert!(validate_signature(&AlwaysTrue, &record, b"creator"));
        assert!(!validate_signature(&AlwaysFalse, &record, b"creator"));
    }
}
