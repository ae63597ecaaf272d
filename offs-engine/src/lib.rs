//! The XOR/OFFS engine: chunking, whitening, CBL assembly, ingestion, and
//! reconstruction built atop `offs-store`'s pooled block storage.

mod assembly;
mod chunker;
mod collaborators;
mod error;
mod ingest;
mod reconstruct;
mod source;
mod xor;

pub use assembly::create_cbl;
pub use chunker::{process_file_in_chunks, split_into_payloads};
pub use collaborators::{
    header_bytes_for_signing, validate_signature, EciesDecryptor, EciesEncryptor, SignatureSigner, SignatureVerifier,
};
pub use error::Error;
pub use ingest::{ingest_file, IngestOptions};
pub use reconstruct::{reconstruct_file, reconstruct_file_with};
pub use source::Source;
pub use xor::{xor_block_with_whiteners, xor_blocks_with_whiteners_round_robin};
