use offs_codec::{addresses_to_bytes, make_cbl_header, ExtendedHeader, StructuredType, CREATOR_ID_BYTES};
use offs_crypto::Checksum;
use offs_store::Block;

use crate::error::Error;

/// `createCBL` (§4.7): assembles a CBL directly from already-stored blocks.
/// Preconditions: non-empty, all the same size; `dateCreated` defaults to
/// the first block's. The emitted CBL's own size is independent of the
/// constituent blocks' size — callers choose it when they persist the
/// result, not here.
#[allow(clippy::too_many_arguments)]
pub fn create_cbl(
    blocks: &[Block],
    creator: [u8; CREATOR_ID_BYTES],
    tuple_size: u8,
    original_data_length: u64,
    original_data_checksum: Checksum,
    date_created: Option<u64>,
    structured_type: StructuredType,
    extended: Option<ExtendedHeader>,
) -> Result<Vec<u8>, Error> {
    let Some(first) = blocks.first() else {
        return Err(Error::EmptyBlocksArray);
    };
    if blocks.iter().any(|b| b.size().bytes() != first.size().bytes()) {
        return Err(Error::BlockSizeMismatch);
    }

    let date_created = date_created.unwrap_or_else(|| first.created());
    let addresses: Vec<Checksum> = blocks.iter().map(|b| b.checksum()).collect();

    let mut out = make_cbl_header(
        creator,
        date_created,
        addresses.len() as u32,
        tuple_size,
        original_data_length,
        original_data_checksum,
        structured_type,
        extended,
    )?;
    out.extend_from_slice(&addresses_to_bytes(&addresses));
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use offs_store::{BlockType, DataType};

    fn block(byte: u8) -> Block {
        Block::new(
            offs_store::BlockSize::Message,
            BlockType::RawData,
            DataType::Raw,
            vec![byte; offs_store::BlockSize::Message.bytes() as usize],
            0,
        )
        .unwrap()
    }

    #[test]
    fn rejects_empty_block_list() {
        let err = create_cbl(
            &[],
            [0u8; CREATOR_ID_BYTES],
            3,
            10,
            Checksum::compute(b"x"),
            None,
            StructuredType::Cbl,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::EmptyBlocksArray));
    }

    #[test]
    fn rejects_mixed_sizes() {
        let small = block(1);
        let mut big_data = vec![2u8; offs_store::BlockSize::Tiny.bytes() as usize];
        let big = Block::new(
            offs_store::BlockSize::Tiny,
            BlockType::RawData,
            DataType::Raw,
            std::mem::take(&mut big_data),
            0,
        )
        .unwrap();

        let err = create_cbl(
            &[small, big],
            [0u8; CREATOR_ID_BYTES],
            3,
            10,
            Checksum::compute(b"x"),
            None,
            StructuredType::Cbl,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, Error::BlockSizeMismatch));
    }

    #[test]
    fn assembles_addresses_in_input_order() {
        let blocks = vec![block(1), block(2), block(3)];
        let expected: Vec<_> = blocks.iter().map(|b| b.checksum()).collect();

        let bytes = create_cbl(
            &blocks,
            [9u8; CREATOR_ID_BYTES],
            3,
            10,
            Checksum::compute(b"x"),
            Some(42),
            StructuredType::Cbl,
            None,
        )
        .unwrap();

        let record = offs_codec::CblRecord::decode(&bytes).unwrap();
        assert_eq!(record.addresses, expected);
        assert_eq!(record.header.date_created, 42);
    }
}
