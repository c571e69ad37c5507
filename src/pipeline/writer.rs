use std::sync::Arc;

use crate::error::{Error, Result};
use crate::pipeline::queue::{Message, QueueReceiver, Work};
use crate::store::Destination;

/// Progress callback; receives the running count of written documents.
pub type ProgressFn = Arc<dyn Fn(u64) + Send + Sync>;

/// Serializes documents into a destination and keeps the running count.
///
/// The count lives only here, so progress is reported by whoever owns the
/// destination and nobody else.
pub(crate) struct RecordWriter<D> {
    destination: D,
    separator: String,
    progress_interval: u64,
    progress: Option<ProgressFn>,
    written: u64,
    line: String,
}

impl<D: Destination> RecordWriter<D> {
    pub(crate) fn new(
        destination: D,
        separator: impl Into<String>,
        progress_interval: u64,
        progress: Option<ProgressFn>,
    ) -> Self {
        Self {
            destination,
            separator: separator.into(),
            progress_interval: progress_interval.max(1),
            progress,
            written: 0,
            line: String::new(),
        }
    }

    /// Append one record: tokens joined by the separator, then `'\n'`.
    pub(crate) async fn write(&mut self, tokens: &[String]) -> Result<()> {
        self.line.clear();
        for (i, token) in tokens.iter().enumerate() {
            if i > 0 {
                self.line.push_str(&self.separator);
            }
            self.line.push_str(token);
        }
        self.line.push('\n');
        self.destination.append(&self.line).await?;

        self.written += 1;
        if self.written % self.progress_interval == 0 {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::INFO, event = "corpuspipe.writer.progress", written = self.written, "corpuspipe.writer.progress");
            if let Some(progress) = &self.progress {
                progress(self.written);
            }
        }
        Ok(())
    }

    /// Flush the destination and return the final count.
    pub(crate) async fn finish(mut self) -> Result<u64> {
        self.destination.flush().await?;
        Ok(self.written)
    }
}

/// The single consumer of the outtake queue.
pub(crate) struct Writer<D> {
    pub outtake: QueueReceiver<Work>,
    pub records: RecordWriter<D>,
}

impl<D: Destination> Writer<D> {
    /// Drain until the stop signal, then flush.
    ///
    /// The writer does not watch the cancel token: everything a worker
    /// forwarded is written before the executor's stop signal arrives.
    pub(crate) async fn run(mut self) -> Result<u64> {
        loop {
            match self.outtake.get().await {
                Some(Message::Item(work)) => self.records.write(&work.tokens).await?,
                Some(Message::Stop) => break,
                None => {
                    return Err(Error::QueueClosed {
                        queue: self.outtake.name(),
                    })
                }
            }
        }
        self.records.finish().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::queue;
    use crate::store::memory::MemoryDestination;
    use std::sync::Mutex;

    fn doc(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn joins_with_separator_and_keeps_empty_records() {
        let dest = MemoryDestination::new();
        let mut w = RecordWriter::new(dest.clone(), "|", 10, None);
        w.write(&doc(&["a", "dog"])).await.unwrap();
        w.write(&[]).await.unwrap();
        w.write(&doc(&["x"])).await.unwrap();
        assert_eq!(w.finish().await.unwrap(), 3);
        assert_eq!(dest.records(), vec!["a|dog", "", "x"]);
        assert_eq!(dest.flush_count(), 1);
    }

    #[tokio::test]
    async fn progress_fires_every_interval() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let progress: ProgressFn = {
            let seen = seen.clone();
            Arc::new(move |n| seen.lock().unwrap().push(n))
        };
        let mut w = RecordWriter::new(MemoryDestination::new(), " ", 2, Some(progress));
        for _ in 0..5 {
            w.write(&doc(&["t"])).await.unwrap();
        }
        assert_eq!(*seen.lock().unwrap(), vec![2, 4]);
    }

    #[tokio::test]
    async fn writer_drains_until_stop() {
        let dest = MemoryDestination::new();
        let (tx, rx) = queue::bounded("outtake", 4);
        let writer = Writer {
            outtake: rx,
            records: RecordWriter::new(dest.clone(), " ", 100, None),
        };
        let handle = tokio::spawn(writer.run());

        for seq in 0..3 {
            tx.put_item(Work {
                seq,
                tokens: doc(&["w", "x"]),
            })
            .await
            .unwrap();
        }
        tx.put_stop().await.unwrap();

        assert_eq!(handle.await.unwrap().unwrap(), 3);
        assert_eq!(dest.len(), 3);
    }

    #[tokio::test]
    async fn writer_reports_missing_stop_signal() {
        let (tx, rx) = queue::bounded::<Work>("outtake", 4);
        let writer = Writer {
            outtake: rx,
            records: RecordWriter::new(MemoryDestination::new(), " ", 100, None),
        };
        drop(tx);
        let err = writer.run().await.unwrap_err();
        assert!(matches!(err, Error::QueueClosed { queue: "outtake" }));
    }
}
