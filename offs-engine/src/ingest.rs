use std::sync::Arc;

use offs_codec::{CblRecord, ExtendedHeader, StructuredType, CREATOR_ID_BYTES};
use offs_crypto::{Checksum, RandomizerSource};
use offs_store::{PooledBlockStore, WhitenerSourcer};
use tracing::{debug, warn};

use crate::chunker::split_into_payloads;
use crate::collaborators::{EciesEncryptor, ECIES_OVERHEAD};
use crate::error::Error;
use crate::source::Source;

/// Inputs to [`ingest_file`] (§4.8). `mime_type`/`file_name` are resolved by
/// the external MIME/stat collaborator before the call; the core only
/// enforces that both are present when `create_extended` is requested.
pub struct IngestOptions {
    pub create_extended: bool,
    pub encrypt: bool,
    pub creator: [u8; CREATOR_ID_BYTES],
    pub recipient: Option<Vec<u8>>,
    pub mime_type: Option<String>,
    pub file_name: Option<String>,
    pub date_created: Option<u64>,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            create_extended: false,
            encrypt: false,
            creator: [0u8; CREATOR_ID_BYTES],
            recipient: None,
            mime_type: None,
            file_name: None,
            date_created: None,
        }
    }
}

/// `ingestFile` (§4.8): chunks `source`, whitens every payload with
/// `tuple_size - 1` randomizers drawn from `pool`, persists the XORed
/// prime, and returns the assembled CBL payload. On any failure the
/// rollback log is replayed in reverse and the original error is
/// re-raised; on success, no block is ever deleted.
#[allow(clippy::too_many_arguments)]
pub async fn ingest_file<S: PooledBlockStore>(
    store: &S,
    pool: &str,
    source: &Source,
    options: IngestOptions,
    randomizer: Arc<dyn RandomizerSource>,
    cache_fraction: f64,
    tuple_size: u8,
    encryptor: Option<&dyn EciesEncryptor>,
    now: u64,
) -> Result<Vec<u8>, Error> {
    if options.create_extended {
        if options.mime_type.is_none() {
            return Err(Error::CannotDetermineMimeType);
        }
        if options.file_name.is_none() {
            return Err(Error::CannotDetermineFileName);
        }
    }
    if options.encrypt && options.recipient.is_none() {
        return Err(Error::RecipientRequiredForEncryption);
    }

    let date_created = options.date_created.unwrap_or(now);

    let bytes = source.read_all().await?;
    if bytes.is_empty() {
        return Err(Error::CannotDetermineLength);
    }
    let original_length = bytes.len() as u64;
    let original_checksum = Checksum::compute(&bytes);

    let block_size = offs_store::BlockSize::next_size_above(original_length)
        .map_err(|_| Error::CannotDetermineBlockSize)?;

    let payload_per_block = block_size.bytes() as usize - if options.encrypt { ECIES_OVERHEAD } else { 0 };
    let mut payloads = split_into_payloads(&bytes, payload_per_block, randomizer.as_ref());
    if options.encrypt {
        let encryptor = encryptor.ok_or(Error::RecipientRequiredForEncryption)?;
        let recipient = options.recipient.as_deref().expect("checked above");
        for payload in payloads.iter_mut() {
            *payload = encryptor.encrypt(payload, recipient)?;
        }
    }

    let sourcer = WhitenerSourcer::new(store, pool, cache_fraction, randomizer.clone());
    let mut rollback: Vec<String> = Vec::new();
    let mut addresses: Vec<Checksum> = Vec::new();

    let result = ingest_payloads(
        store,
        pool,
        &sourcer,
        &payloads,
        block_size,
        tuple_size,
        date_created,
        &mut rollback,
        &mut addresses,
    )
    .await;

    if let Err(err) = result {
        warn!(pool, error = %err, "ingest failed, replaying rollback log");
        for hex in rollback.into_iter().rev() {
            let _ = store.delete_from_pool(pool, &hex).await;
        }
        return Err(err);
    }

    let structured_type = if options.create_extended {
        StructuredType::ExtendedCbl
    } else {
        StructuredType::Cbl
    };
    let extended = if options.create_extended {
        Some(ExtendedHeader {
            mime_type: options.mime_type.unwrap(),
            file_name: options.file_name.unwrap(),
        })
    } else {
        None
    };

    let header_bytes = offs_codec::make_cbl_header(
        options.creator,
        date_created,
        addresses.len() as u32,
        tuple_size,
        original_length,
        original_checksum,
        structured_type,
        extended,
    )?;

    let mut cbl_bytes = header_bytes;
    cbl_bytes.extend_from_slice(&offs_codec::addresses_to_bytes(&addresses));

    debug!(pool, addresses = addresses.len(), "ingest complete");
    let _ = CblRecord::decode(&cbl_bytes).expect("just-assembled CBL must parse");
    Ok(cbl_bytes)
}

#[allow(clippy::too_many_arguments)]
async fn ingest_payloads<S: PooledBlockStore>(
    store: &S,
    pool: &str,
    sourcer: &WhitenerSourcer<'_, S>,
    payloads: &[Vec<u8>],
    block_size: offs_store::BlockSize,
    tuple_size: u8,
    date_created: u64,
    rollback: &mut Vec<String>,
    addresses: &mut Vec<Checksum>,
) -> Result<(), Error> {
    for payload in payloads {
        let whiteners = sourcer.gather(block_size, tuple_size as usize - 1, date_created).await?;
        for whitener in &whiteners {
            if !whitener.is_cached() {
                rollback.push(whitener.checksum().to_hex());
            }
        }

        let whitener_refs: Vec<&[u8]> = whiteners.iter().map(|w| w.data()).collect();
        let prime = crate::xor::xor_block_with_whiteners(payload, &whitener_refs)?;

        let prime_hex = store.put_in_pool(pool, prime, date_created).await?;
        rollback.push(prime_hex.clone());

        for whitener in &whiteners {
            addresses.push(whitener.checksum());
        }
        addresses.push(Checksum::from_hex(&prime_hex).expect("put_in_pool returns a valid hex checksum"));
    }

    Ok(())
}
