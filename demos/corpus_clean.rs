//! Corpus cleaning from the command line
//!
//! Run with:
//!   cargo run --example corpus_clean -- <input> <output> [config.json] [stopwords.txt]
//!   cargo run --example corpus_clean --features ndjson -- news.ndjson cleaned.txt
//!
//! Every line of `<input>` is segmented into single Han characters, stripped
//! of non-Chinese tokens and stopwords, and written to `<output>` with tokens
//! separated by spaces. Set `RUST_LOG=corpuspipe=debug` for per-worker events.

use std::time::Instant;

use corpuspipe::error::{Error, Result};
use corpuspipe::pipeline::config::ProcessorConfig;
use corpuspipe::pipeline::processor::Processor;
use corpuspipe::source::lines::LineSource;
use corpuspipe::source::DocumentSource;
use corpuspipe::stage::registry::StageRegistry;
use corpuspipe::stage::segment::CjkUnigramSegmenter;
use corpuspipe::stage::stopwords::StopwordSet;
use corpuspipe::stage::StageKind;
use corpuspipe::store::file::FileDestination;
use tracing_subscriber::EnvFilter;

const BUILTIN_STOPWORDS: &[&str] = &["的", "了", "和", "是", "在", "也", "就", "都", "而", "及"];

fn open_source(path: &str) -> Box<dyn DocumentSource> {
    #[cfg(feature = "ndjson")]
    if path.ends_with(".ndjson") || path.ends_with(".jsonl") {
        return Box::new(
            corpuspipe::source::ndjson::NdjsonSource::from_file(path).allow_empty_lines(true),
        );
    }
    Box::new(LineSource::new(path).whole_line(true))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("corpuspipe=info")),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (input, output) = match (args.first(), args.get(1)) {
        (Some(input), Some(output)) => (input.as_str(), output.as_str()),
        _ => {
            return Err(Error::config(
                "usage: corpus_clean <input> <output> [config.json] [stopwords.txt]",
            ))
        }
    };

    let mut config = match args.get(2) {
        Some(path) => ProcessorConfig::from_json_file(path).await?,
        None => ProcessorConfig::new(),
    };
    if config.stages.is_empty() {
        config.stages = vec![
            StageKind::Segment,
            StageKind::RemoveNonChinese,
            StageKind::RemoveStopwords,
        ];
    }

    let stopwords = match args.get(3) {
        Some(path) => StopwordSet::from_lines_file(path).await?,
        None => StopwordSet::from_list(BUILTIN_STOPWORDS.iter().copied()),
    };
    let registry = StageRegistry::new()
        .segmenter(CjkUnigramSegmenter)
        .stopwords(stopwords);

    let processor = Processor::from_config(config, &registry)?
        .on_progress(|n| println!("  ... {n} documents written"));

    let cancel = processor.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("interrupted, draining");
            cancel.cancel();
        }
    });

    let started = Instant::now();
    let report = processor
        .run(open_source(input), FileDestination::create(output).await?)
        .await?;

    println!(
        "{} -> {}: {} written, {} skipped{} in {:.2?} ({:?}, {} workers)",
        input,
        output,
        report.written,
        report.skipped,
        if report.cancelled { " (cancelled)" } else { "" },
        started.elapsed(),
        report.mode,
        report.workers,
    );
    Ok(())
}
