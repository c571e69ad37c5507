//! Destinations: append-only sinks owned by the single writer.

pub mod file;
pub mod memory;

use async_trait::async_trait;

use crate::error::Result;

/// Append-only record sink. Only the writer ever holds one.
#[async_trait]
pub trait Destination: Send {
    /// Append one serialized record, terminator included.
    async fn append(&mut self, record: &str) -> Result<()>;

    /// Push buffered records to durable storage.
    async fn flush(&mut self) -> Result<()>;
}

#[async_trait]
impl<D: Destination + ?Sized> Destination for Box<D> {
    async fn append(&mut self, record: &str) -> Result<()> {
        (**self).append(record).await
    }

    async fn flush(&mut self) -> Result<()> {
        (**self).flush().await
    }
}
