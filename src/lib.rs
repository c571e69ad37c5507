//! # corpuspipe
//!
//! **Bounded, parallel token pipelines for cleaning large text corpora.**
//!
//! `corpuspipe` takes a stream of documents (each one a sequence of tokens),
//! runs an ordered chain of stages over every document on a pool of workers,
//! and appends the results to a single destination, one record per line.
//!
//! It is built for corpora that do not fit in memory:
//!
//! - documents are pulled lazily from the source
//! - two bounded queues cap how far the producer and the workers can run ahead
//! - one writer owns the destination, so records never interleave
//! - shutdown is explicit: one stop signal per worker, then one for the writer
//!
//! ---
//!
//! ## Core Model
//!
//! ```text
//! Source → intake queue → [worker₁ … workerₙ] → outtake queue → Writer → Destination
//! ```
//!
//! Each worker owns a private [`Pipeline`] built from a shared [`PipelineSpec`].
//! Stages that wrap non-thread-safe state (script conversion) are constructed
//! inside the worker that uses them and never shared.
//!
//! ---
//!
//! ## Example
//!
//! ```no_run
//! use corpuspipe::pipeline::chain::PipelineSpec;
//! use corpuspipe::pipeline::config::ProcessorConfig;
//! use corpuspipe::pipeline::processor::Processor;
//! use corpuspipe::source::lines::LineSource;
//! use corpuspipe::stage::segment::CjkUnigramSegmenter;
//! use corpuspipe::stage::stopwords::StopwordSet;
//! use corpuspipe::stage::StageSpec;
//! use corpuspipe::store::file::FileDestination;
//!
//! #[tokio::main]
//! async fn main() -> corpuspipe::error::Result<()> {
//!     let spec = PipelineSpec::default()
//!         .then(StageSpec::segment(CjkUnigramSegmenter))
//!         .then(StageSpec::RemoveNonChinese)
//!         .then(StageSpec::remove_stopwords(StopwordSet::from_list(["的", "了"])));
//!
//!     let processor = Processor::new(spec)
//!         .with_config(ProcessorConfig::new().workers(8).queue_capacity(1000));
//!
//!     let report = processor
//!         .run(
//!             LineSource::new("corpus.txt").whole_line(true),
//!             FileDestination::create("cleaned.txt").await?,
//!         )
//!         .await?;
//!
//!     println!("wrote {} documents", report.written);
//!     Ok(())
//! }
//! ```
//!
//! ---
//!
//! ## Ordering
//!
//! Each queue is FIFO, but with more than one worker two documents may be
//! written in either order. Set `parallel(false)` for a single-task run that
//! preserves input order exactly; its output has the same content.
//!
//! ---
//!
//! ## Error Handling Contract
//!
//! - A stage failure stops its worker and fails the run, unless
//!   [`StageErrorPolicy::Skip`] is configured, in which case the document is
//!   logged by position, counted in [`RunReport::skipped`] and dropped.
//! - The first fatal error in any phase cancels the rest of the run.
//! - The error returned names the phase that failed: intake, worker *n*,
//!   or writer.
//! - A full queue is backpressure, never an error.
//!
//! ---
//!
//! ## Cancellation
//!
//! [`Processor::cancel_token`] stops the producer and the workers at their
//! next queue operation. Documents already handed to the writer are still
//! written, and the run returns a report with `cancelled = true`. Dropping
//! the `run` future before it completes cancels the run the same way and
//! leaves the processor in the `Failed` state.
//!
//! ---
//!
//! ## Observability
//!
//! With the default `tracing` feature the executor emits structured events:
//! `corpuspipe.run.started`, `corpuspipe.workers.started`,
//! `corpuspipe.writer.progress` (every `progress_interval` documents),
//! `corpuspipe.worker.skipped`, `corpuspipe.worker.failed`,
//! `corpuspipe.cancelled` and `corpuspipe.run.finished`. Installing a
//! subscriber is up to the binary:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("corpuspipe=info")
//!     .init();
//! ```
//!
//! ---
//!
//! ## Feature Flags
//!
//! - `tracing` *(default)*: structured logging through `tracing`.
//! - `ndjson`: [`source::ndjson::NdjsonSource`] for JSON-lines corpora.
//!
//! [`Pipeline`]: pipeline::chain::Pipeline
//! [`PipelineSpec`]: pipeline::chain::PipelineSpec
//! [`Processor::cancel_token`]: pipeline::processor::Processor::cancel_token
//! [`RunReport::skipped`]: pipeline::processor::RunReport::skipped
//! [`StageErrorPolicy::Skip`]: pipeline::config::StageErrorPolicy::Skip

pub mod error;
pub mod pipeline;
pub mod source;
pub mod stage;
pub mod store;

/// One unit of input text as an ordered sequence of tokens.
pub type Document = Vec<String>;

pub mod prelude {
    //! Convenient imports for most `corpuspipe` users.

    pub use crate::pipeline::cancel::CancelToken;
    pub use crate::pipeline::chain::{Pipeline, PipelineSpec};
    pub use crate::pipeline::config::{ProcessorConfig, StageErrorPolicy};
    pub use crate::pipeline::processor::{Processor, RunMode, RunReport};
    pub use crate::pipeline::state::ProcessorState;
    pub use crate::source::{DocumentSource, IterSource};
    pub use crate::stage::registry::StageRegistry;
    pub use crate::stage::{Stage, StageKind, StageSpec};
    pub use crate::store::Destination;
    pub use crate::Document;
}
