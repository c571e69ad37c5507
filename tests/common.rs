#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use corpuspipe::error::{Error, Result};
use corpuspipe::source::DocumentSource;
use corpuspipe::stage::convert::{ConverterFactory, ScriptConverter};
use corpuspipe::stage::{StageError, StageResult};
use corpuspipe::store::Destination;
use corpuspipe::Document;

pub fn doc(tokens: &[&str]) -> Document {
    tokens.iter().map(|s| s.to_string()).collect()
}

pub fn docs(items: &[&[&str]]) -> Vec<Document> {
    items.iter().map(|d| doc(d)).collect()
}

/// `n` distinct documents: `["d{i}", "the", "t{i}"]`.
pub fn numbered(n: usize) -> Vec<Document> {
    (0..n)
        .map(|i| vec![format!("d{i}"), "the".to_string(), format!("t{i}")])
        .collect()
}

pub fn sorted(mut v: Vec<String>) -> Vec<String> {
    v.sort();
    v
}

/// Source over a vector that counts how many documents were pulled.
pub struct CountingSource {
    items: std::vec::IntoIter<Document>,
    pulled: Arc<AtomicUsize>,
}

impl CountingSource {
    pub fn new(items: Vec<Document>) -> (Self, Arc<AtomicUsize>) {
        let pulled = Arc::new(AtomicUsize::new(0));
        (
            Self {
                items: items.into_iter(),
                pulled: pulled.clone(),
            },
            pulled,
        )
    }
}

#[async_trait]
impl DocumentSource for CountingSource {
    async fn next_document(&mut self) -> Result<Option<Document>> {
        let next = self.items.next();
        if next.is_some() {
            self.pulled.fetch_add(1, Ordering::SeqCst);
        }
        Ok(next)
    }
}

/// Yields `ok` documents, then an I/O error.
pub struct BrokenSource {
    ok: usize,
}

impl BrokenSource {
    pub fn new(ok: usize) -> Self {
        Self { ok }
    }
}

#[async_trait]
impl DocumentSource for BrokenSource {
    async fn next_document(&mut self) -> Result<Option<Document>> {
        if self.ok == 0 {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "truncated archive",
            )));
        }
        self.ok -= 1;
        Ok(Some(doc(&["x"])))
    }
}

/// In-memory destination that sleeps on every append.
#[derive(Clone)]
pub struct SlowDestination {
    delay: Duration,
    pub records: Arc<Mutex<Vec<String>>>,
    pub written: Arc<AtomicUsize>,
}

impl SlowDestination {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            records: Arc::new(Mutex::new(Vec::new())),
            written: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl Destination for SlowDestination {
    async fn append(&mut self, record: &str) -> Result<()> {
        tokio::time::sleep(self.delay).await;
        self.records
            .lock()
            .expect("mutex poisoned")
            .push(record.trim_end_matches('\n').to_string());
        self.written.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Accepts `limit` records, then fails every append.
pub struct FailingDestination {
    limit: usize,
    seen: usize,
}

impl FailingDestination {
    pub fn after(limit: usize) -> Self {
        Self { limit, seen: 0 }
    }
}

#[async_trait]
impl Destination for FailingDestination {
    async fn append(&mut self, _record: &str) -> Result<()> {
        if self.seen >= self.limit {
            return Err(Error::Io(std::io::Error::other("disk full")));
        }
        self.seen += 1;
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Converter that upper-cases tokens and rejects the token `"bad"`.
pub struct PickyConverter;

impl ScriptConverter for PickyConverter {
    fn convert(&mut self, token: &str) -> StageResult<String> {
        if token == "bad" {
            return Err(StageError::new("cannot convert `bad`"));
        }
        Ok(token.to_uppercase())
    }
}

pub fn picky_factory() -> ConverterFactory {
    ConverterFactory::new(|| Ok(PickyConverter))
}

/// Factory that counts how many converters it built.
pub fn counting_factory() -> (ConverterFactory, Arc<AtomicUsize>) {
    let built = Arc::new(AtomicUsize::new(0));
    let factory = {
        let built = built.clone();
        ConverterFactory::new(move || {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(PickyConverter)
        })
    };
    (factory, built)
}
