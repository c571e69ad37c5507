#[test]
fn tracing_feature_gating_compiles() {
    #[cfg(feature = "tracing")]
    {
        tracing::event!(
            tracing::Level::DEBUG,
            event = "corpuspipe.test.feature_gating",
            "corpuspipe.test.feature_gating"
        );
    }

    #[cfg(not(feature = "tracing"))]
    {
        let marker = "tracing-disabled";
        assert_eq!(marker, "tracing-disabled");
    }
}

#[cfg(feature = "tracing")]
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn runs_under_a_subscriber() -> corpuspipe::error::Result<()> {
    use corpuspipe::prelude::*;
    use corpuspipe::store::memory::MemoryDestination;

    let _ = tracing_subscriber::fmt()
        .with_env_filter("corpuspipe=debug")
        .with_test_writer()
        .try_init();

    let out = MemoryDestination::new();
    let report = Processor::new(PipelineSpec::default())
        .with_config(ProcessorConfig::new().workers(2).progress_interval(2))
        .run(
            IterSource::new((0..5).map(|i| vec![format!("t{i}")])),
            out.clone(),
        )
        .await?;
    assert_eq!(report.written, 5);
    Ok(())
}
