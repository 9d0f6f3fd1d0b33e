//! End-to-end pipeline runs over generated PDFs.

use std::io::Write;
use std::sync::Arc;

use ctp_core::{Backend, ConfigError, Pipeline, PipelineConfig, PipelineError};
use ctp_extract::{ChunkInferer, InferenceFailure};
use ctp_ingest::{Chunk, ExtractionError, UploadedPdf};
use ctp_model::{ClinicalTrialRecord, StudyType};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// One page; each line is its own text object so extraction keeps line breaks.
fn build_pdf(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut operations = Vec::new();
    for (row, line) in lines.iter().enumerate() {
        let y = 740 - 14 * row as i64;
        operations.push(Operation::new("BT", vec![]));
        operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
        operations.push(Operation::new("Td", vec![40.into(), y.into()]));
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        operations.push(Operation::new("ET", vec![]));
    }
    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

fn synopsis() -> Vec<u8> {
    build_pdf(&[
        "Brief Title: Aspirin in Asthma",
        "Protocol Number: ASP-001",
        "Study Type: Interventional",
        "Phase: Phase 2",
        "Allocation: Randomized",
        "Conditions: Asthma",
        "Sponsor: Acme Pharma",
    ])
}

struct FailingInferer;

impl ChunkInferer for FailingInferer {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn infer(&self, _chunk: &Chunk) -> Result<ClinicalTrialRecord, InferenceFailure> {
        Err(InferenceFailure::Status {
            status: 503,
            body: "unavailable".to_string(),
        })
    }
}

#[tokio::test]
async fn pdf_to_record_and_xml() {
    let pipeline = Pipeline::new(&PipelineConfig::default()).unwrap();
    let document = pipeline.process_bytes(synopsis(), None).await.unwrap();

    let record = &document.record;
    assert_eq!(record.brief_title, "Aspirin in Asthma");
    assert_eq!(record.org_study_id, "ASP-001");
    assert_eq!(record.study_design.study_type(), StudyType::Interventional);
    assert_eq!(record.conditions, ["Asthma"]);
    assert_eq!(record.sponsors.lead_sponsor, "Acme Pharma");
    assert!(document.warnings.is_empty());
    assert_eq!(document.stats.page_count, 1);
    assert_eq!(document.stats.chunk_count, 1);

    let xml = document.to_xml().unwrap();
    assert!(xml.contains("<brief_title>Aspirin in Asthma</brief_title>"));
    assert!(xml.contains("<phase>Phase 2</phase>"));
}

#[tokio::test]
async fn invalid_pdf_halts_the_pipeline() {
    let pipeline = Pipeline::new(&PipelineConfig::default()).unwrap();
    let err = pipeline
        .process_bytes(b"not a pdf".to_vec(), None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extraction(ExtractionError::InvalidPdf { .. })
    ));
    assert!(err.suggestion().is_some());
}

#[tokio::test]
async fn document_without_text_yields_default_record() {
    let pipeline = Pipeline::new(&PipelineConfig::default()).unwrap();
    let document = pipeline.process_bytes(build_pdf(&[]), None).await.unwrap();
    assert!(document.record.is_empty());
    assert_eq!(document.stats.chunk_count, 0);
    assert!(document.to_xml().unwrap().contains("<clinical_study schema_version=\"1.0\">"));
}

#[tokio::test]
async fn failing_backend_degrades_to_default_record() {
    let pipeline =
        Pipeline::with_inferer(&PipelineConfig::default(), Arc::new(FailingInferer)).unwrap();
    let document = pipeline.process_text("Brief Title: Trial A").await;
    assert!(document.record.is_empty());
    assert_eq!(document.warnings.len(), 1);
    assert_eq!(document.stats.failed_chunks, 1);
    assert_eq!(pipeline.backend(), "failing");
}

#[tokio::test]
async fn small_chunks_merge_in_document_order() {
    let mut config = PipelineConfig::default();
    config.chunking.max_chars = 40;
    config.chunking.overlap = 20;
    let pipeline = Pipeline::new(&config).unwrap();
    let document = pipeline
        .process_text("Brief Title: Trial A\nAcronym: TA\nBrief Title: Trial B\n")
        .await;
    assert_eq!(document.stats.chunk_count, 2);
    assert_eq!(document.record.brief_title, "Trial A");
    assert_eq!(document.record.acronym, "TA");
}

#[tokio::test]
async fn uploaded_bytes_are_processed_from_a_temp_file() {
    let pipeline = Pipeline::new(&PipelineConfig::default()).unwrap();
    let upload = UploadedPdf::from_bytes(&synopsis()).unwrap();
    let path = upload.path().to_path_buf();
    let document = pipeline.process_path(upload.path(), None).await.unwrap();
    assert_eq!(document.record.brief_title, "Aspirin in Asthma");
    drop(upload);
    assert!(!path.exists());
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let mut config = PipelineConfig::default();
    config.inference.concurrency = 0;
    assert!(matches!(
        Pipeline::new(&config),
        Err(ConfigError::Invalid { .. })
    ));
}

#[test]
fn llm_backend_is_selected_from_config() {
    let mut config = PipelineConfig::default();
    config.inference.backend = Backend::Llm;
    config.llm.endpoint = "http://127.0.0.1:9/v1".to_string();
    config.llm.api_key_env = "CTP_TEST_UNSET_API_KEY".to_string();
    let pipeline = Pipeline::new(&config).unwrap();
    assert_eq!(pipeline.backend(), "llm");
}

#[test]
fn loads_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "[chunking]\nmax_chars = 1000\noverlap = 100\n\n[inference]\nconcurrency = 2"
    )
    .unwrap();
    let config = PipelineConfig::load(file.path()).unwrap();
    assert_eq!(config.chunking.max_chars, 1000);
    assert_eq!(config.inference.concurrency, 2);
    assert_eq!(config.inference.timeout_secs, 60);
}

#[test]
fn config_file_errors_are_typed() {
    let missing = PipelineConfig::load(std::path::Path::new("/nonexistent/ctp.toml"));
    assert!(matches!(missing, Err(ConfigError::Read { .. })));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[chunking\nmax_chars = ").unwrap();
    let malformed = PipelineConfig::load(file.path());
    assert!(matches!(malformed, Err(ConfigError::Parse { .. })));

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[chunking]\nmax_chars = 10\noverlap = 10").unwrap();
    let invalid = PipelineConfig::load(file.path());
    assert!(matches!(invalid, Err(ConfigError::Chunk(_))));
}
