use std::path::PathBuf;

use crate::error::Error;

/// Where `processFileInChunks` reads bytes from (§4.6). A streaming network
/// or socket source is a frontend concern (out of scope per §1); both
/// variants here resolve their full length before chunking, matching the
/// "byte buffer: its length; stream with known path: stat.size" contract.
pub enum Source {
    Buffer(Vec<u8>),
    File(PathBuf),
}

impl Source {
    pub async fn len(&self) -> Result<u64, Error> {
        match self {
            Source::Buffer(bytes) => Ok(bytes.len() as u64),
            Source::File(path) => tokio::fs::metadata(path)
                .await
                .map(|m| m.len())
                .map_err(|_| Error::CannotDetermineLength),
        }
    }

    pub async fn read_all(&self) -> Result<Vec<u8>, Error> {
        match self {
            Source::Buffer(bytes) => Ok(bytes.clone()),
            Source::File(path) => tokio::fs::read(path).await.map_err(|_| Error::CannotDetermineLength),
        }
    }
}
