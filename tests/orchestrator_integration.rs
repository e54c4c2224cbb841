//! Integration tests for the full orchestration loop.
//!
//! These exercise the end-to-end flow against deterministic mocks:
//! fan-out under a concurrency bound, collection with timeouts and
//! cancellation, and the merge step with its schema gate.

use std::time::Duration;

use serde_json::json;
use tokio_util::sync::CancellationToken;

use multisource::{
    FailureKind, FieldKind, MergeConfig, MergeError, MockPipeline, MockSynthesizer, Orchestrator,
    OrchestratorError, RunOptions, Schema, Source, SourceStatus, Task, TestScenario,
};

fn urls(n: usize) -> Vec<Source> {
    (0..n)
        .map(|i| Source::url(format!("https://site-{}.example/page", i)))
        .collect()
}

#[tokio::test]
async fn test_run_produces_one_outcome_per_source() {
    for n in [1, 3, 7] {
        let pipeline = MockPipeline::new();
        let orchestrator = Orchestrator::new(pipeline, MockSynthesizer::new());

        let result = orchestrator
            .run(&Task::new("extract everything"), &urls(n))
            .await
            .unwrap();

        assert_eq!(result.report.sources.len(), n);
        assert_eq!(result.succeeded(), n);
    }
}

#[tokio::test]
async fn test_all_sources_failing_yields_no_viable_sources() {
    let sources = urls(3);
    let mut pipeline = MockPipeline::new();
    for source in &sources {
        pipeline = pipeline.fail_fetch(&source.value, "unreachable");
    }
    let synthesizer = MockSynthesizer::new();
    let orchestrator = Orchestrator::new(pipeline, synthesizer);

    let err = orchestrator
        .run(&Task::new("extract everything"), &sources)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Merge(MergeError::NoViableSources { failed: 3 })
    ));
    // No synthesis call may happen when nothing survived
    assert_eq!(orchestrator.synthesizer().calls().len(), 0);
}

#[tokio::test]
async fn test_partial_failure_merges_surviving_payloads() {
    let (pipeline, synthesizer, sources) = TestScenario::new()
        .with_source("https://a.example", json!({"price": 10}))
        .with_unreachable_source("https://b.example")
        .with_source("https://c.example", json!({"price": 12}))
        .with_unreachable_source("https://d.example")
        .build();
    let orchestrator = Orchestrator::new(pipeline, synthesizer);

    let result = orchestrator
        .run(&Task::new("what is the price?"), &sources)
        .await
        .unwrap();

    assert_eq!(result.succeeded(), 2);
    assert_eq!(result.failed(), 2);

    let calls = orchestrator.synthesizer().calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].payload_count, 2);
    assert_eq!(calls[0].failed_count, 2);
    assert_eq!(
        calls[0].labels,
        vec!["https://a.example", "https://c.example"]
    );
}

#[tokio::test]
async fn test_mixed_failure_kinds_scenario() {
    // One valid payload, one fetch error, one schema-failing payload.
    let task = Task::new("what is the price?")
        .with_schema(Schema::new().required("price", FieldKind::Number));
    let sources = vec![
        Source::url("https://good.example"),
        Source::url("https://down.example"),
        Source::url("https://weird.example"),
    ];
    let pipeline = MockPipeline::new()
        .with_payload("https://good.example", json!({"price": 10}))
        .fail_fetch("https://down.example", "connection refused")
        .with_payload("https://weird.example", json!({"price": "call us"}));
    let synthesizer = MockSynthesizer::new().with_answer(json!({"price": 10}));
    let orchestrator = Orchestrator::new(pipeline, synthesizer);

    let result = orchestrator.run(&task, &sources).await.unwrap();

    assert_eq!(result.succeeded(), 1);
    assert_eq!(result.failed(), 2);

    let reasons = result.report.failure_reasons();
    assert_eq!(reasons.len(), 2);
    assert_eq!(reasons[0].1, FailureKind::Fetch);
    assert_eq!(reasons[1].1, FailureKind::Schema);

    let calls = orchestrator.synthesizer().calls();
    assert_eq!(calls[0].payload_count, 1);
    assert_eq!(calls[0].labels, vec!["https://good.example"]);
}

#[tokio::test(start_paused = true)]
async fn test_run_timeout_times_out_every_slow_source() {
    let sources = urls(3);
    let pipeline = MockPipeline::new().with_default_delay(Duration::from_millis(500));
    let orchestrator = Orchestrator::new(pipeline, MockSynthesizer::new())
        .with_options(RunOptions::new().with_run_timeout(Duration::from_millis(100)));

    let err = orchestrator
        .run(&Task::new("extract everything"), &sources)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Merge(MergeError::NoViableSources { failed: 3 })
    ));
}

#[tokio::test]
async fn test_cancellation_keeps_completed_outcomes() {
    let sources = vec![
        Source::url("https://fast.example"),
        Source::url("https://slow.example"),
    ];
    let pipeline = MockPipeline::new()
        .with_payload("https://fast.example", json!({"price": 10}))
        .with_delay("https://slow.example", Duration::from_secs(60));
    let orchestrator = Orchestrator::new(pipeline, MockSynthesizer::new());

    let cancel = CancellationToken::new();
    let canceller = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        canceller.cancel();
    });

    let result = orchestrator
        .run_with_cancel(&Task::new("price"), &sources, cancel)
        .await
        .unwrap();

    assert_eq!(result.report.sources.len(), 2);
    assert!(matches!(
        result.report.sources[0].status,
        SourceStatus::Succeeded
    ));
    assert!(matches!(
        result.report.sources[1].status,
        SourceStatus::Failed {
            kind: FailureKind::Cancelled,
            ..
        }
    ));
    assert_eq!(result.answer, json!({"price": 10}));
}

#[tokio::test]
async fn test_concurrency_limit_holds_across_run() {
    let sources = urls(20);
    let pipeline = MockPipeline::new().with_default_delay(Duration::from_millis(10));
    let orchestrator = Orchestrator::new(pipeline, MockSynthesizer::new())
        .with_options(RunOptions::new().with_concurrency_limit(5));

    orchestrator
        .run(&Task::new("extract everything"), &sources)
        .await
        .unwrap();

    let observed = orchestrator.pipeline().max_in_flight();
    assert!(observed <= 5, "observed {} concurrent invocations", observed);
    assert_eq!(orchestrator.pipeline().calls().len(), 20);
}

#[tokio::test]
async fn test_rerun_with_deterministic_stubs_is_identical() {
    let task = Task::new("what is the price?");
    let sources = vec![
        Source::url("https://a.example"),
        Source::url("https://b.example"),
    ];

    let mut answers = Vec::new();
    for _ in 0..2 {
        let pipeline = MockPipeline::new()
            .with_payload("https://a.example", json!({"price": 10, "name": "Widget"}))
            .with_payload("https://b.example", json!({"price": 12, "color": "red"}));
        let orchestrator = Orchestrator::new(pipeline, MockSynthesizer::new());
        let result = orchestrator.run(&task, &sources).await.unwrap();
        answers.push(result.answer);
    }

    assert_eq!(answers[0], answers[1]);
}

#[tokio::test]
async fn test_concat_mode_skips_synthesis_for_small_success_sets() {
    let (pipeline, synthesizer, sources) = TestScenario::new()
        .with_source("https://a.example", json!({"price": 10}))
        .with_unreachable_source("https://b.example")
        .build();
    let orchestrator = Orchestrator::new(pipeline, synthesizer).with_options(
        RunOptions::new().with_merge(MergeConfig::new().with_concat_threshold(2)),
    );

    let result = orchestrator
        .run(&Task::new("price"), &sources)
        .await
        .unwrap();

    assert_eq!(result.answer, json!({"price": 10}));
    assert_eq!(orchestrator.synthesizer().calls().len(), 0);
}

#[tokio::test]
async fn test_synthesis_failure_surfaces_as_merge_error() {
    let pipeline = MockPipeline::new().with_payload("https://a.example", json!({"x": 1}));
    let synthesizer = MockSynthesizer::new().failing("model unavailable");
    let orchestrator = Orchestrator::new(pipeline, synthesizer);

    let err = orchestrator
        .run(&Task::new("anything"), &[Source::url("https://a.example")])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Merge(MergeError::Synthesis(_))
    ));
}

#[tokio::test]
async fn test_schema_gate_on_merged_answer() {
    let task =
        Task::new("price").with_schema(Schema::new().required("price", FieldKind::Number));
    let pipeline = MockPipeline::new().with_payload("https://a.example", json!({"price": 10}));
    // Synthesizer returns something that drops the required field.
    let synthesizer = MockSynthesizer::new().with_answer(json!({"cost": 10}));
    let orchestrator = Orchestrator::new(pipeline, synthesizer);

    let err = orchestrator
        .run(&task, &[Source::url("https://a.example")])
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrchestratorError::Merge(MergeError::SchemaViolation(_))
    ));
}
