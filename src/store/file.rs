use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::store::Destination;

const DEFAULT_BUFFER_BYTES: usize = 256 * 1024;

/// Buffered text file destination.
pub struct FileDestination {
    path: PathBuf,
    out: BufWriter<File>,
}

impl FileDestination {
    /// Create or truncate `path`.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref()).await?;
        Ok(Self::wrap(path.as_ref(), file))
    }

    /// Open `path` for appending, creating it if missing.
    pub async fn append_to(path: impl AsRef<Path>) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path.as_ref())
            .await?;
        Ok(Self::wrap(path.as_ref(), file))
    }

    fn wrap(path: &Path, file: File) -> Self {
        Self {
            path: path.to_path_buf(),
            out: BufWriter::with_capacity(DEFAULT_BUFFER_BYTES, file),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Destination for FileDestination {
    async fn append(&mut self, record: &str) -> Result<()> {
        self.out.write_all(record.as_bytes()).await?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        self.out.flush().await?;
        self.out.get_mut().sync_data().await?;
        Ok(())
    }
}
