//! Concurrency, timeout and failure-isolation behavior of the field extractor.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use ctp_extract::{ChunkInferer, ExtractorConfig, FieldExtractor, InferenceFailure, RuleInferer};
use ctp_ingest::{Chunk, ChunkConfig, chunk_text};
use ctp_model::{ClinicalTrialRecord, Outcome};

/// What the scripted inferer does for one chunk.
#[derive(Clone)]
enum Step {
    Reply { delay_ms: u64, record: ClinicalTrialRecord },
    Fail,
    Panic,
}

/// Replays a fixed script keyed by chunk index.
struct ScriptedInferer {
    steps: HashMap<usize, Step>,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedInferer {
    fn new(steps: impl IntoIterator<Item = (usize, Step)>) -> Self {
        Self {
            steps: steps.into_iter().collect(),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

impl ChunkInferer for ScriptedInferer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn infer(&self, chunk: &Chunk) -> Result<ClinicalTrialRecord, InferenceFailure> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let result = match self.steps.get(&chunk.index).cloned() {
            Some(Step::Reply { delay_ms, record }) => {
                thread::sleep(Duration::from_millis(delay_ms));
                Ok(record)
            }
            Some(Step::Fail) => Err(InferenceFailure::backend("scripted failure")),
            Some(Step::Panic) => {
                self.in_flight.fetch_sub(1, Ordering::SeqCst);
                panic!("scripted panic");
            }
            None => Ok(ClinicalTrialRecord::default()),
        };
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn chunks(count: usize) -> Vec<Chunk> {
    (0..count)
        .map(|index| Chunk {
            index,
            start: index * 10,
            text: format!("chunk {index}"),
        })
        .collect()
}

fn reply(delay_ms: u64, record: ClinicalTrialRecord) -> Step {
    Step::Reply { delay_ms, record }
}

fn titled(title: &str) -> ClinicalTrialRecord {
    ClinicalTrialRecord {
        brief_title: title.to_string(),
        ..Default::default()
    }
}

fn extractor(inferer: Arc<ScriptedInferer>, timeout_ms: u64, concurrency: usize) -> FieldExtractor {
    FieldExtractor::new(
        inferer,
        ExtractorConfig {
            timeout: Duration::from_millis(timeout_ms),
            concurrency,
        },
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn earlier_chunk_wins_even_when_it_finishes_last() {
    let inferer = Arc::new(ScriptedInferer::new([
        (0, reply(150, titled("Trial A"))),
        (1, reply(0, titled("Trial B"))),
    ]));
    let outcome = extractor(inferer, 5_000, 4).extract(chunks(2)).await;
    assert_eq!(outcome.record.brief_title, "Trial A");
    assert!(outcome.warnings.is_empty());
    assert_eq!(outcome.succeeded_chunks(), 2);
}

#[tokio::test]
async fn failed_chunk_is_reported_and_others_survive() {
    let second = ClinicalTrialRecord {
        acronym: "TA".to_string(),
        ..Default::default()
    };
    let inferer = Arc::new(ScriptedInferer::new([
        (0, reply(0, titled("Trial A"))),
        (1, Step::Fail),
        (2, reply(0, second)),
    ]));
    let outcome = extractor(inferer, 5_000, 2).extract(chunks(3)).await;
    assert_eq!(outcome.record.brief_title, "Trial A");
    assert_eq!(outcome.record.acronym, "TA");
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].chunk_index, 1);
    assert_eq!(
        outcome.warnings[0].failure,
        InferenceFailure::backend("scripted failure")
    );
}

#[tokio::test]
async fn panicking_chunk_becomes_a_warning() {
    let inferer = Arc::new(ScriptedInferer::new([
        (0, Step::Panic),
        (1, reply(0, titled("Trial B"))),
    ]));
    let outcome = extractor(inferer, 5_000, 2).extract(chunks(2)).await;
    assert_eq!(outcome.record.brief_title, "Trial B");
    assert_eq!(outcome.warnings.len(), 1);
    match &outcome.warnings[0].failure {
        InferenceFailure::Panicked { message } => assert_eq!(message, "scripted panic"),
        other => panic!("unexpected failure: {other:?}"),
    }
}

#[tokio::test]
async fn slow_chunk_times_out() {
    let inferer = Arc::new(ScriptedInferer::new([
        (0, reply(500, titled("Too Late"))),
        (1, reply(0, titled("Trial B"))),
    ]));
    let outcome = extractor(inferer, 50, 2).extract(chunks(2)).await;
    assert_eq!(outcome.record.brief_title, "Trial B");
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(outcome.warnings[0].chunk_index, 0);
    assert_eq!(
        outcome.warnings[0].failure,
        InferenceFailure::TimedOut { timeout_ms: 50 }
    );
    assert_eq!(outcome.warnings[0].failure.kind(), "timeout");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn hung_chunk_frees_its_slot_after_timeout() {
    let inferer = Arc::new(ScriptedInferer::new([
        (0, reply(1_500, titled("Too Late"))),
        (1, reply(0, titled("Trial B"))),
    ]));
    let started = Instant::now();
    let outcome = tokio::time::timeout(
        Duration::from_secs(1),
        extractor(inferer, 100, 1).extract(chunks(2)),
    )
    .await
    .expect("extraction waited on the hung chunk");
    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(outcome.record.brief_title, "Trial B");
    assert_eq!(outcome.warnings.len(), 1);
    assert_eq!(
        outcome.warnings[0].failure,
        InferenceFailure::TimedOut { timeout_ms: 100 }
    );
}

#[tokio::test]
async fn all_chunks_failing_yields_default_record() {
    let inferer = Arc::new(ScriptedInferer::new((0..3).map(|i| (i, Step::Fail))));
    let outcome = extractor(inferer, 5_000, 4).extract(chunks(3)).await;
    assert!(outcome.record.is_empty());
    assert_eq!(outcome.warnings.len(), 3);
    assert_eq!(outcome.succeeded_chunks(), 0);
}

#[tokio::test]
async fn no_chunks_yields_default_record() {
    let inferer = Arc::new(ScriptedInferer::new([]));
    let outcome = extractor(inferer, 5_000, 4).extract(Vec::new()).await;
    assert_eq!(outcome.record, ClinicalTrialRecord::default());
    assert!(!outcome.has_warnings());
    assert_eq!(outcome.chunk_count, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrency_is_bounded() {
    let inferer = Arc::new(ScriptedInferer::new(
        (0..8).map(|i| (i, reply(40, ClinicalTrialRecord::default()))),
    ));
    let outcome = extractor(Arc::clone(&inferer), 5_000, 2)
        .extract(chunks(8))
        .await;
    assert!(outcome.warnings.is_empty());
    let peak = inferer.peak.load(Ordering::SeqCst);
    assert!(peak <= 2, "peak concurrency was {peak}");
    assert!(peak >= 1);
}

#[tokio::test]
async fn repeated_groups_are_deduplicated_across_chunks() {
    let outcome = |measure: &str| Outcome {
        measure: measure.to_string(),
        ..Default::default()
    };
    let first = ClinicalTrialRecord {
        primary_outcomes: vec![outcome("Overall survival")],
        ..Default::default()
    };
    let second = ClinicalTrialRecord {
        primary_outcomes: vec![outcome("OVERALL SURVIVAL"), outcome("Response rate")],
        ..Default::default()
    };
    let inferer = Arc::new(ScriptedInferer::new([
        (0, reply(30, first)),
        (1, reply(0, second)),
    ]));
    let outcome = extractor(inferer, 5_000, 2).extract(chunks(2)).await;
    let measures: Vec<_> = outcome
        .record
        .primary_outcomes
        .iter()
        .map(|o| o.measure.as_str())
        .collect();
    assert_eq!(measures, ["Overall survival", "Response rate"]);
}

#[tokio::test]
async fn rule_inferer_over_real_chunks() {
    let text = "Brief Title: Trial A\nConditions: Asthma\n\n\
                Phase: Phase 2\nBrief Title: Trial B\nConditions: asthma, COPD\n";
    let chunks = chunk_text(text, ChunkConfig::new(40, 5).unwrap());
    assert!(chunks.len() > 1);
    let outcome = FieldExtractor::new(Arc::new(RuleInferer::new()), ExtractorConfig::default())
        .extract(chunks)
        .await;
    assert_eq!(outcome.record.brief_title, "Trial A");
    assert_eq!(outcome.record.conditions, ["Asthma", "COPD"]);
    assert!(outcome.warnings.is_empty());
}
