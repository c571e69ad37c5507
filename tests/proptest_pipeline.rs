use proptest::prelude::*;

use corpuspipe::pipeline::chain::PipelineSpec;
use corpuspipe::pipeline::config::ProcessorConfig;
use corpuspipe::pipeline::processor::Processor;
use corpuspipe::source::IterSource;
use corpuspipe::stage::script::RemoveNonChinese;
use corpuspipe::stage::stopwords::{RemoveStopwords, StopwordSet};
use corpuspipe::stage::{Stage, StageSpec};
use corpuspipe::store::memory::MemoryDestination;
use corpuspipe::Document;

mod common;
use common::sorted;

const VOCAB: &[&str] = &["the", "a", "dog", "的", "了", "书", "中国", "x1", ""];

fn stopwords() -> StopwordSet {
    StopwordSet::from_list(["the", "的", "了"])
}

fn spec() -> PipelineSpec {
    PipelineSpec::default()
        .then(StageSpec::remove_stopwords(stopwords()))
        .then(StageSpec::RemoveNonChinese)
}

fn corpus() -> impl Strategy<Value = Vec<Document>> {
    let token = proptest::sample::select(VOCAB).prop_map(str::to_string);
    proptest::collection::vec(proptest::collection::vec(token, 0..8), 0..64)
}

fn run(input: Vec<Document>, config: ProcessorConfig) -> (Vec<String>, u64) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("tokio runtime");

    rt.block_on(async move {
        let out = MemoryDestination::new();
        let report = Processor::new(spec())
            .with_config(config)
            .run(IterSource::new(input), out.clone())
            .await
            .expect("pipeline failed");
        (out.records(), report.written)
    })
}

fn expected(input: &[Document]) -> Vec<String> {
    let words = stopwords();
    input
        .iter()
        .map(|doc| {
            doc.iter()
                .filter(|t| !words.contains(t))
                .filter(|t| corpuspipe::stage::script::is_chinese_token(t))
                .cloned()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn every_document_is_written_exactly_once(
        input in corpus(),
        workers in 0usize..6,
        capacity in 1usize..5
    ) {
        let k = input.len() as u64;
        let want = sorted(expected(&input));
        let (records, written) = run(
            input,
            ProcessorConfig::new().workers(workers).queue_capacity(capacity),
        );

        prop_assert_eq!(written, k);
        prop_assert_eq!(sorted(records), want);
    }

    #[test]
    fn sequential_output_follows_input_order(input in corpus()) {
        let want = expected(&input);
        let (records, _) = run(input, ProcessorConfig::new().parallel(false));
        prop_assert_eq!(records, want);
    }

    #[test]
    fn filtering_stages_are_idempotent(
        doc in proptest::collection::vec(proptest::sample::select(VOCAB).prop_map(str::to_string), 0..16)
    ) {
        let mut stopwords = RemoveStopwords::new(std::sync::Arc::new(stopwords()));
        let once = stopwords.apply(doc).unwrap();
        let twice = stopwords.apply(once.clone()).unwrap();
        prop_assert_eq!(&once, &twice);

        let mut chinese = RemoveNonChinese;
        let once = chinese.apply(once).unwrap();
        let twice = chinese.apply(once.clone()).unwrap();
        prop_assert_eq!(once, twice);
    }
}
