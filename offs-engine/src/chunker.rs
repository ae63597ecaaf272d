use std::future::Future;

use offs_crypto::{Checksum, RandomizerSource};
use offs_store::BlockSize;

use crate::collaborators::{EciesEncryptor, ECIES_OVERHEAD};
use crate::error::Error;
use crate::source::Source;

/// `processFileInChunks` (§4.6): determines the source length and block
/// size, splits it into exactly-`payloadPerBlock`-byte payloads (the last
/// CSPRNG-padded, never zero-filled), optionally hands each payload to the
/// ECIES collaborator, and flushes batches of `chunk_size` payloads to
/// `for_each` — awaited sequentially, one batch at a time (§5). Returns the
/// number of real bytes consumed (excluding synthetic padding) and the
/// checksum of the untouched original content.
pub async fn process_file_in_chunks<F, Fut>(
    source: &Source,
    chunk_size: usize,
    randomizer: &dyn RandomizerSource,
    encrypt: bool,
    recipient: Option<&[u8]>,
    encryptor: Option<&dyn EciesEncryptor>,
    mut for_each: F,
) -> Result<(u64, Checksum), Error>
where
    F: FnMut(Vec<Vec<u8>>) -> Fut,
    Fut: Future<Output = Result<(), Error>>,
{
    if encrypt && recipient.is_none() {
        return Err(Error::RecipientRequiredForEncryption);
    }

    let bytes = source.read_all().await?;
    if bytes.is_empty() {
        return Err(Error::CannotDetermineLength);
    }
    let original_checksum = Checksum::compute(&bytes);

    let block_size = BlockSize::next_size_above(bytes.len() as u64)
        .map_err(|_| Error::CannotDetermineBlockSize)?;
    let payload_per_block = block_size.bytes() as usize - if encrypt { ECIES_OVERHEAD } else { 0 };
    let payloads = split_into_payloads(&bytes, payload_per_block, randomizer);

    let mut batch = Vec::with_capacity(chunk_size);
    for payload in payloads {
        let payload = if encrypt {
            let encryptor = encryptor.ok_or(Error::RecipientRequiredForEncryption)?;
            encryptor.encrypt(&payload, recipient.expect("checked above"))?
        } else {
            payload
        };

        batch.push(payload);

        if batch.len() == chunk_size {
            for_each(std::mem::take(&mut batch)).await?;
        }
    }

    if !batch.is_empty() {
        for_each(batch).await?;
    }

    Ok((bytes.len() as u64, original_checksum))
}

/// Splits `bytes` into exactly-`payload_per_block`-byte payloads, right
/// padding the final one with CSPRNG bytes (never zero-fill). Shared by
/// [`process_file_in_chunks`] and the ingestion pipeline, which needs
/// per-payload control that a batching callback can't give it without
/// fighting the borrow checker over the rollback log.
pub fn split_into_payloads(bytes: &[u8], payload_per_block: usize, randomizer: &dyn RandomizerSource) -> Vec<Vec<u8>> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    while offset < bytes.len() {
        let end = (offset + payload_per_block).min(bytes.len());
        let mut payload = bytes[offset..end].to_vec();
        offset = end;

        if payload.len() < payload_per_block {
            let pad_len = payload_per_block - payload.len();
            payload.extend(randomizer.generate(pad_len));
        }

        out.push(payload);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use offs_crypto::OsRandomizer;

    #[tokio::test]
    async fn splits_into_padded_payloads_and_flushes_in_chunks() {
        let data = vec![1u8; 10];
        let source = Source::Buffer(data.clone());
        let randomizer = OsRandomizer;

        let mut batches = Vec::new();
        let (consumed, checksum) = process_file_in_chunks(
            &source,
            16,
            &randomizer,
            false,
            None,
            None,
            |batch| {
                batches.push(batch);
                std::future::ready(Ok(()))
            },
        )
        .await
        .unwrap();

        assert_eq!(consumed, 10);
        assert_eq!(checksum, offs_crypto::Checksum::compute(&data));
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0][0].len(), offs_store::BlockSize::Message.bytes() as usize);
        assert_eq!(&batches[0][0][..10], data.as_slice());
    }

    #[tokio::test]
    async fn encrypt_without_recipient_fails() {
        let source = Source::Buffer(vec![1u8; 4]);
        let randomizer = OsRandomizer;
        let result = process_file_in_chunks(&source, 4, &randomizer, true, None, None, |_| {
            std::future::ready(Ok(()))
        })
        .await;
        assert!(matches!(result, Err(Error::RecipientRequiredForEncryption)));
    }
}
