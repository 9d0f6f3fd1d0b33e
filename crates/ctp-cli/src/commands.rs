use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use ctp_cli::settings::{default_output_path, is_stdin, resolve_config};
use ctp_core::Pipeline;
use ctp_ingest::UploadedPdf;
use ctp_model::ClinicalTrialRecord;
use ctp_output::{SerializationError, to_xml, write_xml_file};

use crate::cli::{ExtractArgs, RenderArgs};
use crate::summary::print_field_catalog;
use crate::types::ExtractResult;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

pub fn run_extract(args: &ExtractArgs) -> Result<ExtractResult> {
    let config = resolve_config(args.config.as_deref(), &args.overrides())
        .context("resolve pipeline configuration")?;

    // The LLM backend holds a blocking HTTP client: create and drop the
    // pipeline outside the runtime.
    let pipeline = Pipeline::new(&config).context("set up inference backend")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    let password = args.password.clone();
    let (source, document) = if is_stdin(&args.input) {
        let upload =
            UploadedPdf::from_reader(io::stdin().lock()).context("read PDF from stdin")?;
        info!(bytes = upload.len(), "spooled PDF from stdin");
        let document = runtime
            .block_on(pipeline.process_path(upload.path(), password))
            .context("process PDF from stdin")?;
        ("<stdin>".to_string(), document)
    } else {
        let document = runtime
            .block_on(pipeline.process_path(&args.input, password))
            .with_context(|| format!("process {}", args.input.display()))?;
        (args.input.display().to_string(), document)
    };
    // Abandoned inferences may still be running; do not wait on them.
    runtime.shutdown_timeout(SHUTDOWN_GRACE);

    let _span = info_span!("write_outputs").entered();
    let xml_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    write_xml_file(&document.record, &xml_path)
        .with_context(|| format!("write {}", xml_path.display()))?;
    if let Some(path) = &args.record_out {
        write_record(&document.record, path)?;
    }
    info!(path = %xml_path.display(), "wrote XML");

    Ok(ExtractResult {
        source,
        backend: pipeline.backend(),
        xml_path,
        record_path: args.record_out.clone(),
        document,
    })
}

pub fn run_render(args: &RenderArgs) -> Result<()> {
    let json = fs::read_to_string(&args.record)
        .with_context(|| format!("read {}", args.record.display()))?;
    let record = ClinicalTrialRecord::from_json_str(&json)
        .map_err(SerializationError::from)
        .with_context(|| format!("parse record {}", args.record.display()))?;
    match &args.output {
        Some(path) => {
            write_xml_file(&record, path)
                .with_context(|| format!("write {}", path.display()))?;
            println!("XML: {}", path.display());
        }
        None => {
            let xml = to_xml(&record).context("render XML")?;
            io::stdout()
                .lock()
                .write_all(xml.as_bytes())
                .context("write XML to stdout")?;
        }
    }
    Ok(())
}

pub fn run_fields() -> Result<()> {
    print_field_catalog();
    Ok(())
}

fn write_record(record: &ClinicalTrialRecord, path: &Path) -> Result<()> {
    let json = record.to_json_pretty().context("encode record")?;
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::write(path, json).with_context(|| format!("write {}", path.display()))?;
    info!(path = %path.display(), "wrote record");
    Ok(())
}
