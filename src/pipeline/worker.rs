use crate::error::{Error, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::chain::Pipeline;
use crate::pipeline::config::StageErrorPolicy;
use crate::pipeline::queue::{Message, QueueReceiver, QueueSender, Work};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WorkerStats {
    pub processed: u64,
    pub skipped: u64,
}

/// Pulls documents off the intake queue, runs its private pipeline over them
/// and forwards the results to the outtake queue.
pub(crate) struct Worker {
    pub id: usize,
    pub pipeline: Pipeline,
    pub intake: QueueReceiver<Work>,
    pub outtake: QueueSender<Work>,
    pub policy: StageErrorPolicy,
    pub cancel: CancelToken,
}

impl Worker {
    pub(crate) async fn run(mut self) -> Result<WorkerStats> {
        let mut stats = WorkerStats::default();

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::DEBUG, event = "corpuspipe.worker.started", worker = self.id, stages = ?self.pipeline.names(), "corpuspipe.worker.started");

        loop {
            let msg = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "corpuspipe.cancelled", worker = self.id, where_ = "get", "corpuspipe.cancelled");
                    break;
                },
                msg = self.intake.get() => msg,
            };

            let Work { seq, tokens } = match msg {
                Some(Message::Item(work)) => work,
                Some(Message::Stop) => break,
                None => {
                    return Err(Error::QueueClosed {
                        queue: self.intake.name(),
                    })
                }
            };

            // Eager: a failing stage is seen here, before anything is forwarded.
            match self.pipeline.apply(seq, tokens) {
                Ok(tokens) => {
                    self.outtake.put_item(Work { seq, tokens }).await?;
                    stats.processed += 1;
                }
                Err(err) if self.policy == StageErrorPolicy::Skip => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::WARN, event = "corpuspipe.worker.skipped", worker = self.id, seq = seq, error = %err, "corpuspipe.worker.skipped");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                    stats.skipped += 1;
                }
                Err(err) => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::ERROR, event = "corpuspipe.worker.failed", worker = self.id, seq = seq, error = %err, "corpuspipe.worker.failed");
                    return Err(err);
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::DEBUG, event = "corpuspipe.worker.stopped", worker = self.id, processed = stats.processed, skipped = stats.skipped, "corpuspipe.worker.stopped");

        Ok(stats)
    }
}
