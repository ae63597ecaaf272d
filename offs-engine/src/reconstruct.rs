use offs_codec::CblRecord;
use offs_crypto::Checksum;
use offs_store::PooledBlockStore;
use tracing::{debug, trace};

use crate::collaborators::{validate_signature, EciesDecryptor, SignatureVerifier};
use crate::error::Error;
use crate::xor::xor_block_with_whiteners;

/// `ReconstructFile` (§4.9): parses the CBL, groups its addresses into
/// tuples of `header.tuple_size` (whiteners first, prime last), fetches
/// and integrity-checks every referenced block, XORs each tuple back to
/// its original payload, concatenates, and truncates to
/// `original_data_length`.
pub async fn reconstruct_file<S: PooledBlockStore>(store: &S, pool: &str, cbl_bytes: &[u8]) -> Result<Vec<u8>, Error> {
    reconstruct_file_with(store, pool, cbl_bytes, None, None).await
}

pub async fn reconstruct_file_with<S: PooledBlockStore>(
    store: &S,
    pool: &str,
    cbl_bytes: &[u8],
    decryptor: Option<&dyn EciesDecryptor>,
    verifier: Option<&dyn SignatureVerifier>,
) -> Result<Vec<u8>, Error> {
    let plain_bytes;
    let cbl_bytes = if offs_codec::is_encrypted(cbl_bytes) {
        let decryptor = decryptor.ok_or_else(|| Error::IntegrityViolation {
            expected: "an ECIES decryptor for an encrypted CBL".to_owned(),
            actual: "none provided".to_owned(),
        })?;
        plain_bytes = decryptor.decrypt(cbl_bytes)?;
        &plain_bytes
    } else {
        cbl_bytes
    };

    let record = CblRecord::decode(cbl_bytes)?;

    if let Some(verifier) = verifier {
        if !validate_signature(verifier, &record, &record.header.creator_id) {
            return Err(Error::IntegrityViolation {
                expected: "valid creator signature".to_owned(),
                actual: "signature verification failed".to_owned(),
            });
        }
    }

    let tuple_size = record.header.tuple_size as usize;
    let mut recovered = Vec::with_capacity(record.header.original_data_length as usize);

    for tuple in record.addresses.chunks(tuple_size) {
        let mut tuple_data = Vec::with_capacity(tuple.len());
        for address in tuple {
            let hex = address.to_hex();
            let data = store.get_from_pool(pool, &hex).await?;
            let actual = Checksum::compute(&data);
            if actual != *address {
                return Err(Error::IntegrityViolation {
                    expected: address.to_hex(),
                    actual: actual.to_hex(),
                });
            }
            trace!(pool, hex = %hex, "fetched and verified tuple block");
            tuple_data.push(data);
        }

        let (whiteners, prime) = tuple_data.split_at(tuple_data.len() - 1);
        let whitener_refs: Vec<&[u8]> = whiteners.iter().map(|w| w.as_slice()).collect();
        let payload = xor_block_with_whiteners(&prime[0], &whitener_refs)?;
        recovered.extend_from_slice(&payload);
    }

    recovered.truncate(record.header.original_data_length as usize);

    let actual_checksum = Checksum::compute(&recovered);
    if actual_checksum != record.header.original_data_checksum {
        return Err(Error::IntegrityViolation {
            expected: record.header.original_data_checksum.to_hex(),
            actual: actual_checksum.to_hex(),
        });
    }

    debug!(pool, bytes = recovered.len(), "reconstruct complete");
    Ok(recovered)
}
