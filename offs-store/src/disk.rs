use std::collections::HashSet;
use std::path::{Path, PathBuf};

use offs_crypto::Checksum;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::{trace, warn};

use crate::block::{Block, BlockSize, BlockType, DataType};
use crate::error::Error;

const METADATA_SIDECAR_SUFFIX: &str = ".m.json";

/// On-disk realization of the block store contracts under a two-nibble
/// directory tree: `<root>/<size_tag>/<hex[0]>/<hex[1]>/<hex>` (§4.4).
pub struct DiskBlockStore {
    root: PathBuf,
    size: BlockSize,
}

impl DiskBlockStore {
    pub fn new(root: impl Into<PathBuf>, size: BlockSize) -> Self {
        Self {
            root: root.into(),
            size,
        }
    }

    pub fn path_for(&self, hex: &str) -> PathBuf {
        let h0 = &hex[0..1];
        let h1 = &hex[1..2];
        self.root.join(self.size.size_tag()).join(h0).join(h1).join(hex)
    }

    pub async fn has(&self, hex: &str) -> bool {
        tokio::fs::metadata(self.path_for(hex)).await.is_ok()
    }

    pub async fn get_data(&self, hex: &str) -> Result<Block, Error> {
        let path = self.path_for(hex);
        let data = tokio::fs::read(&path).await.map_err(|_| Error::KeyNotFound {
            pool: String::new(),
            hex: hex.to_owned(),
        })?;

        if data.len() as u32 != self.size.bytes() {
            return Err(Error::BlockFileSizeMismatch {
                hex: hex.to_owned(),
                expected: self.size.bytes(),
                found: data.len() as u64,
            });
        }

        let created = file_created_millis(&path).await.unwrap_or(0);
        trace!(hex, "read block from disk");
        Block::new(self.size, BlockType::RawData, DataType::Raw, data, created)
            .map_err(Error::BlockValidationFailed)
    }

    pub async fn set_data(&self, block: &Block) -> Result<(), Error> {
        if block.size().bytes() != self.size.bytes() {
            return Err(Error::BlockSizeMismatch {
                store_size: self.size.bytes(),
                got: block.size().bytes(),
            });
        }
        if !block.validate() {
            return Err(Error::BlockValidationFailed(
                crate::block::BlockValidationError::SizeMismatch {
                    got: block.data().len(),
                    declared: self.size.bytes(),
                },
            ));
        }

        let hex = block.checksum().to_hex();
        let path = self.path_for(&hex);
        if tokio::fs::metadata(&path).await.is_ok() {
            return Err(Error::BlockPathAlreadyExists(hex));
        }

        let dir = path.parent().expect("path always has a parent under root");
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| Error::BlockDirectoryCreationFailed {
                path: dir.display().to_string(),
                source,
            })?;

        tokio::fs::write(&path, block.data()).await?;
        trace!(hex, "wrote block to disk");
        Ok(())
    }

    pub async fn delete_data(&self, hex: &str) -> Result<(), Error> {
        let path = self.path_for(hex);
        if tokio::fs::metadata(&path).await.is_err() {
            return Err(Error::KeyNotFound {
                pool: String::new(),
                hex: hex.to_owned(),
            });
        }
        tokio::fs::remove_file(&path)
            .await
            .map_err(|source| Error::BlockDeletionFailed {
                hex: hex.to_owned(),
                source,
            })
    }

    /// Multi-way XOR over raw byte buffers, producing a new `RawData` block
    /// stamped with `dest_created`.
    pub fn xor(&self, buffers: &[Vec<u8>], dest_created: u64) -> Result<Block, Error> {
        if buffers.is_empty() {
            return Err(Error::NoBlocksProvided);
        }
        let len = buffers[0].len();
        let mut out = vec![0u8; len];
        for buf in buffers {
            for (o, b) in out.iter_mut().zip(buf.iter()) {
                *o ^= b;
            }
        }
        Block::new(self.size, BlockType::RawData, DataType::Raw, out, dest_created)
            .map_err(Error::BlockValidationFailed)
    }

    /// Two-level uniform-with-replacement directory sampling down to a
    /// uniform file pick, rejecting `.m.json` sidecars; returns up to `n`
    /// distinct checksums. Empty or stale directories are pruned from the
    /// working list as they're found.
    pub async fn get_random_blocks(&self, n: usize) -> Result<Vec<Checksum>, Error> {
        if n == 0 {
            return Ok(Vec::new());
        }

        let size_root = self.root.join(self.size.size_tag());
        let mut rng = rand::thread_rng();
        let mut found: HashSet<Checksum> = HashSet::new();

        let mut level0 = list_dirs(&size_root).await;
        let mut attempts = 0usize;
        let max_attempts = n.saturating_mul(32).max(64);

        while found.len() < n && !level0.is_empty() && attempts < max_attempts {
            attempts += 1;
            let idx0 = rng.gen_range(0..level0.len());
            let dir0 = level0[idx0].clone();

            let mut level1 = list_dirs(&dir0).await;
            if level1.is_empty() {
                level0.remove(idx0);
                continue;
            }
            let idx1 = rng.gen_range(0..level1.len());
            let dir1 = level1[idx1].clone();

            let files = list_files(&dir1).await;
            let candidates: Vec<&PathBuf> = files
                .iter()
                .filter(|p| {
                    !p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.ends_with(METADATA_SIDECAR_SUFFIX))
                        .unwrap_or(false)
                })
                .collect();

            if candidates.is_empty() {
                level1.remove(idx1);
                if level1.is_empty() {
                    level0.remove(idx0);
                }
                continue;
            }

            let file = candidates.choose(&mut rng).expect("non-empty");
            if let Some(hex) = file.file_name().and_then(|n| n.to_str()) {
                if let Ok(checksum) = Checksum::from_hex(hex) {
                    found.insert(checksum);
                }
            }
        }

        if level0.is_empty() {
            warn!(requested = n, found = found.len(), "ran out of directories while sampling");
        }

        Ok(found.into_iter().collect())
    }
}

async fn list_dirs(path: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(path).await else {
        return out;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Ok(file_type) = entry.file_type().await {
            if file_type.is_dir() {
                out.push(entry.path());
            }
        }
    }
    out
}

async fn list_files(path: &Path) -> Vec<PathBuf> {
    let mut out = Vec::new();
    let Ok(mut entries) = tokio::fs::read_dir(path).await else {
        return out;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        if let Ok(file_type) = entry.file_type().await {
            if file_type.is_file() {
                out.push(entry.path());
            }
        }
    }
    out
}

async fn file_created_millis(path: &Path) -> Option<u64> {
    let metadata = tokio::fs::metadata(path).await.ok()?;
    let created = metadata.created().ok()?;
    let millis = created
        .duration_since(std::time::UNIX_EPOCH)
        .ok()?
        .as_millis();
    Some(millis as u64)
}
