//! The executor: owns the pipeline spec, the queues, the worker pool, the
//! writer and the termination protocol.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::watch;

use crate::error::{Error, Phase, Result};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::chain::{Pipeline, PipelineSpec};
use crate::pipeline::config::{ProcessorConfig, StageErrorPolicy};
use crate::pipeline::queue::{self, QueueSender, Work};
use crate::pipeline::state::ProcessorState;
use crate::pipeline::worker::{Worker, WorkerStats};
use crate::pipeline::writer::{ProgressFn, RecordWriter, Writer};
use crate::source::DocumentSource;
use crate::stage::registry::StageRegistry;
use crate::store::Destination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Sequential,
    Parallel,
}

/// Totals reported at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mode: RunMode,
    /// Workers actually started (after clamping).
    pub workers: usize,
    /// Documents pulled from the source.
    pub submitted: u64,
    /// Records appended to the destination.
    pub written: u64,
    /// Documents dropped under [`StageErrorPolicy::Skip`].
    pub skipped: u64,
    pub cancelled: bool,
    pub elapsed: Duration,
}

/// Applies a pipeline to every document of a source and writes the results.
///
/// A processor runs once. In parallel mode it starts one writer task and
/// `workers` worker tasks connected by two bounded queues; use a multi-thread
/// tokio runtime for the workers to actually run side by side.
pub struct Processor {
    config: ProcessorConfig,
    spec: PipelineSpec,
    progress: Option<ProgressFn>,
    cancel: CancelToken,
    state: watch::Sender<ProcessorState>,
    started: AtomicBool,
}

impl Processor {
    pub fn new(spec: PipelineSpec) -> Self {
        let (state, _) = watch::channel(ProcessorState::Idle);
        Self {
            config: ProcessorConfig::default(),
            spec,
            progress: None,
            cancel: CancelToken::new(),
            state,
            started: AtomicBool::new(false),
        }
    }

    /// Build a processor whose stages come from `config.stages`.
    pub fn from_config(config: ProcessorConfig, registry: &StageRegistry) -> Result<Self> {
        let spec = registry.resolve(&config.stages)?;
        Ok(Self::new(spec).with_config(config))
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// Called from the writer every `progress_interval` documents.
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(u64) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(f));
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Token that stops the run early; already-forwarded documents are still
    /// written.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> ProcessorState {
        *self.state.borrow()
    }

    /// Watch lifecycle transitions.
    pub fn subscribe(&self) -> watch::Receiver<ProcessorState> {
        self.state.subscribe()
    }

    /// Process every document from `source` into `destination`.
    pub async fn run<S, D>(&self, source: S, destination: D) -> Result<RunReport>
    where
        S: DocumentSource,
        D: Destination + 'static,
    {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyRan);
        }
        let abandon = AbandonGuard {
            processor: Some(self),
        };

        #[cfg(feature = "tracing")]
        tracing::event!(
            tracing::Level::INFO,
            event = "corpuspipe.run.started",
            source = source.source_name(),
            parallel = self.config.parallel,
            workers = self.config.effective_workers(),
            queue_capacity = self.config.effective_queue_capacity(),
            stages = ?self.spec.kinds(),
            "corpuspipe.run.started"
        );

        let started = Instant::now();
        let result = if self.config.parallel {
            self.run_parallel(source, destination).await
        } else {
            self.run_sequential(source, destination).await
        };
        abandon.disarm();

        match result {
            Ok(mut report) => {
                report.elapsed = started.elapsed();
                self.advance(ProcessorState::Done);

                #[cfg(feature = "tracing")]
                tracing::event!(
                    tracing::Level::INFO,
                    event = "corpuspipe.run.finished",
                    submitted = report.submitted,
                    written = report.written,
                    skipped = report.skipped,
                    cancelled = report.cancelled,
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    "corpuspipe.run.finished"
                );
                Ok(report)
            }
            Err(err) => {
                self.advance(ProcessorState::Failed);

                #[cfg(feature = "tracing")]
                tracing::event!(tracing::Level::ERROR, event = "corpuspipe.run.failed", error = %err, "corpuspipe.run.failed");
                Err(err)
            }
        }
    }

    fn advance(&self, to: ProcessorState) {
        self.state.send_modify(|state| {
            debug_assert!(state.can_advance_to(to), "illegal transition {state} -> {to}");
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "corpuspipe.state", from = %state, to = %to, "corpuspipe.state");
            *state = to;
        });
    }

    /// One pipeline, no queues, strict input order.
    async fn run_sequential<S, D>(&self, mut source: S, destination: D) -> Result<RunReport>
    where
        S: DocumentSource,
        D: Destination,
    {
        self.advance(ProcessorState::QueuesReady);
        let mut pipeline = self.spec.build();
        let mut records = RecordWriter::new(
            destination,
            self.config.separator.clone(),
            self.config.effective_progress_interval(),
            self.progress.clone(),
        );
        self.advance(ProcessorState::WorkersRunning);

        let drained = self
            .drain_sequential(&mut source, &mut pipeline, &mut records)
            .await;

        self.advance(ProcessorState::Draining);
        // Flush on every path: records already counted must reach the destination.
        let flushed = records.finish().await.map_err(|e| e.in_phase(Phase::Writer));

        let (submitted, skipped) = match drained {
            Ok(counts) => counts,
            Err(err) => {
                if let Err(flush_err) = flushed {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::WARN, event = "corpuspipe.writer.flush_failed", error = %flush_err, "corpuspipe.writer.flush_failed");
                    #[cfg(not(feature = "tracing"))]
                    let _ = flush_err;
                }
                return Err(err);
            }
        };

        Ok(RunReport {
            mode: RunMode::Sequential,
            workers: 1,
            submitted,
            written: flushed?,
            skipped,
            cancelled: self.cancel.is_cancelled(),
            elapsed: Duration::ZERO,
        })
    }

    /// Pull, transform and write until the source is exhausted or the run is
    /// cancelled. Returns `(submitted, skipped)`.
    async fn drain_sequential<S, D>(
        &self,
        source: &mut S,
        pipeline: &mut Pipeline,
        records: &mut RecordWriter<D>,
    ) -> Result<(u64, u64)>
    where
        S: DocumentSource,
        D: Destination,
    {
        let mut seq = 0u64;
        let mut skipped = 0u64;
        while !self.cancel.is_cancelled() {
            let Some(tokens) = source
                .next_document()
                .await
                .map_err(|e| e.in_phase(Phase::Intake))?
            else {
                break;
            };

            match pipeline.apply(seq, tokens) {
                Ok(tokens) => records
                    .write(&tokens)
                    .await
                    .map_err(|e| e.in_phase(Phase::Writer))?,
                Err(err) if self.config.on_stage_error == StageErrorPolicy::Skip => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::WARN, event = "corpuspipe.worker.skipped", worker = 0, seq = seq, error = %err, "corpuspipe.worker.skipped");
                    #[cfg(not(feature = "tracing"))]
                    let _ = err;
                    skipped += 1;
                }
                Err(err) => return Err(err.in_phase(Phase::Worker(0))),
            }
            seq += 1;
        }
        Ok((seq, skipped))
    }

    async fn run_parallel<S, D>(&self, mut source: S, destination: D) -> Result<RunReport>
    where
        S: DocumentSource,
        D: Destination + 'static,
    {
        let workers = self.config.effective_workers();
        if workers != self.config.workers {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::WARN, event = "corpuspipe.config.clamped", requested = self.config.workers, workers = workers, "corpuspipe.config.clamped");
        }
        let capacity = self.config.effective_queue_capacity();

        let (intake_tx, intake_rx) = queue::bounded::<Work>("intake", capacity);
        let (outtake_tx, outtake_rx) = queue::bounded::<Work>("outtake", capacity);
        self.advance(ProcessorState::QueuesReady);

        let writer = {
            let writer = Writer {
                outtake: outtake_rx,
                records: RecordWriter::new(
                    destination,
                    self.config.separator.clone(),
                    self.config.effective_progress_interval(),
                    self.progress.clone(),
                ),
            };
            let guard = self.cancel.cancel_on_drop();
            tokio::spawn(async move {
                let written = writer.run().await?;
                guard.disarm();
                Ok::<u64, Error>(written)
            })
        };

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let spec = self.spec.clone();
            let intake = intake_rx.clone();
            let outtake = outtake_tx.clone();
            let policy = self.config.on_stage_error;
            let cancel = self.cancel.clone();
            handles.push(tokio::spawn(async move {
                let guard = cancel.cancel_on_drop();
                let worker = Worker {
                    id,
                    // Built here so non-shareable stages stay inside this task.
                    pipeline: spec.build(),
                    intake,
                    outtake,
                    policy,
                    cancel,
                };
                let stats = worker.run().await?;
                guard.disarm();
                Ok::<WorkerStats, Error>(stats)
            }));
        }
        drop(intake_rx);
        self.advance(ProcessorState::WorkersRunning);

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::INFO, event = "corpuspipe.workers.started", workers = workers, "corpuspipe.workers.started");

        let mut errors = Vec::new();
        let submitted = match self.feed(&mut source, &intake_tx, workers).await {
            Ok(n) => n,
            Err((n, err)) => {
                self.cancel.cancel();
                errors.push(err.in_phase(Phase::Intake));
                n
            }
        };
        drop(intake_tx);

        let mut processed = 0u64;
        let mut skipped = 0u64;
        for (id, handle) in handles.into_iter().enumerate() {
            match handle.await {
                Ok(Ok(stats)) => {
                    processed += stats.processed;
                    skipped += stats.skipped;
                }
                Ok(Err(err)) => errors.push(err.in_phase(Phase::Worker(id))),
                Err(join) => errors.push(Error::from(join).in_phase(Phase::Worker(id))),
            }
        }
        self.advance(ProcessorState::Draining);

        // Every worker is gone, so exactly one consumer is left to stop. If the
        // writer already died its own error below explains why this fails.
        if outtake_tx.put_stop().await.is_err() {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::DEBUG, event = "corpuspipe.writer.gone", "corpuspipe.writer.gone");
        }
        drop(outtake_tx);

        let written = match writer.await {
            Ok(Ok(n)) => n,
            Ok(Err(err)) => {
                errors.push(err.in_phase(Phase::Writer));
                0
            }
            Err(join) => {
                errors.push(Error::from(join).in_phase(Phase::Writer));
                0
            }
        };

        if let Some(err) = pick_root_cause(errors) {
            return Err(err);
        }

        if written != processed {
            #[cfg(feature = "tracing")]
            tracing::event!(tracing::Level::ERROR, event = "corpuspipe.count_mismatch", processed = processed, written = written, "corpuspipe.count_mismatch");
        }

        Ok(RunReport {
            mode: RunMode::Parallel,
            workers,
            submitted,
            written,
            skipped,
            cancelled: self.cancel.is_cancelled(),
            elapsed: Duration::ZERO,
        })
    }

    /// Push every document onto the intake queue, then one stop signal per
    /// worker. On failure, returns how many documents made it in.
    async fn feed<S: DocumentSource>(
        &self,
        source: &mut S,
        intake: &QueueSender<Work>,
        workers: usize,
    ) -> std::result::Result<u64, (u64, Error)> {
        let mut seq = 0u64;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "corpuspipe.cancelled", where_ = "source", "corpuspipe.cancelled");
                    return Ok(seq);
                },
                next = source.next_document() => next.map_err(|e| (seq, e))?,
            };
            let Some(tokens) = next else { break };

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    #[cfg(feature = "tracing")]
                    tracing::event!(tracing::Level::DEBUG, event = "corpuspipe.cancelled", where_ = "put", "corpuspipe.cancelled");
                    return Ok(seq);
                },
                sent = intake.put_item(Work { seq, tokens }) => sent.map_err(|e| (seq, e))?,
            }
            seq += 1;
        }

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::INFO, event = "corpuspipe.source.exhausted", submitted = seq, "corpuspipe.source.exhausted");

        // One per worker: they all compete for this queue, and each must see
        // its own stop signal.
        for _ in 0..workers {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(seq),
                sent = intake.put_stop() => sent.map_err(|e| (seq, e))?,
            }
        }
        Ok(seq)
    }
}

/// Cancels the run and marks it failed when the `run` future is dropped
/// before it completes, so spawned workers and the writer wind down.
struct AbandonGuard<'a> {
    processor: Option<&'a Processor>,
}

impl AbandonGuard<'_> {
    fn disarm(mut self) {
        self.processor = None;
    }
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        let Some(processor) = self.processor.take() else {
            return;
        };
        processor.cancel.cancel();
        processor.state.send_if_modified(|state| {
            if state.is_terminal() {
                return false;
            }
            *state = ProcessorState::Failed;
            true
        });

        #[cfg(feature = "tracing")]
        tracing::event!(tracing::Level::WARN, event = "corpuspipe.run.abandoned", "corpuspipe.run.abandoned");
    }
}

/// Prefer an error that explains the failure over one that only reports a
/// peer going away.
fn pick_root_cause(errors: Vec<Error>) -> Option<Error> {
    let mut fallback = None;
    for err in errors {
        if !err.is_consequential() {
            return Some(err);
        }
        fallback.get_or_insert(err);
    }
    fallback
}
