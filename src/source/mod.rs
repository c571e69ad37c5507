//! Document sources.
//!
//! A source is a single-pass, lazy stream of documents. The executor pulls
//! one document at a time and only as fast as the intake queue accepts them,
//! so a source never has to hold the corpus in memory.

pub mod lines;
#[cfg(feature = "ndjson")]
pub mod ndjson;

use async_trait::async_trait;

use crate::error::Result;
use crate::Document;

#[async_trait]
pub trait DocumentSource: Send {
    /// Next document, or `None` once the source is exhausted.
    async fn next_document(&mut self) -> Result<Option<Document>>;

    fn source_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Wraps any iterator of documents.
pub struct IterSource<I> {
    iter: I,
}

impl<I> IterSource<I>
where
    I: Iterator<Item = Document> + Send,
{
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            iter: iter.into_iter(),
        }
    }
}

#[async_trait]
impl<I> DocumentSource for IterSource<I>
where
    I: Iterator<Item = Document> + Send,
{
    async fn next_document(&mut self) -> Result<Option<Document>> {
        Ok(self.iter.next())
    }

    fn source_name(&self) -> &'static str {
        "iter_source"
    }
}

#[async_trait]
impl<S: DocumentSource + ?Sized> DocumentSource for Box<S> {
    async fn next_document(&mut self) -> Result<Option<Document>> {
        (**self).next_document().await
    }

    fn source_name(&self) -> &'static str {
        (**self).source_name()
    }
}
