use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::error::Result;
use crate::store::Destination;

/// Collects records in memory, terminators stripped.
///
/// Clones share the same buffer, so a caller can keep one handle and hand
/// the other to the executor.
#[derive(Clone, Default)]
pub struct MemoryDestination {
    records: Arc<Mutex<Vec<String>>>,
    flushes: Arc<Mutex<usize>>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<String> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn flush_count(&self) -> usize {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Destination for MemoryDestination {
    async fn append(&mut self, record: &str) -> Result<()> {
        let record = record.strip_suffix('\n').unwrap_or(record);
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.to_owned());
        Ok(())
    }

    async fn flush(&mut self) -> Result<()> {
        *self.flushes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }
}
