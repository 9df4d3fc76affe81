use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::Utc;
use tracing::{info, warn};

use crate::cli::ExtractArgs;
use crate::config::PipelineConfig;
use crate::extract::{apply_document_fields, extract_with, infer_dtmnfr, prepare_lines, renumber};
use crate::ledger::Ledger;
use crate::model::{ExtractSummary, RunRecord};
use crate::quality::flag_suspects;
use crate::table::{serialize_rows, serialize_suspects};
use crate::util::{
    now_utc_string, print_json, read_text, sha256_file, sibling_with_suffix, utc_compact_string,
    write_bytes,
};

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let operator = args.operator.as_str();

    if !args.input.is_file() {
        bail!("input file not found: {}", args.input.display());
    }
    let config = PipelineConfig::load(args.config.as_deref())?;

    let text = read_text(&args.input)?;
    let lines = prepare_lines(&text);
    info!(
        input = %args.input.display(),
        operator,
        lines = lines.len(),
        repair = !args.no_repair,
        "extraction started"
    );

    let mut extraction = extract_with(&lines, &config.extract_options(!args.no_repair));
    if extraction.rows.is_empty() && !args.no_repair {
        warn!("no rows extracted with line repair; retrying without it");
        extraction = extract_with(&lines, &config.extract_options(false));
    }

    let dtmnfr = args
        .dtmnfr
        .clone()
        .unwrap_or_else(|| infer_dtmnfr(&args.input));
    apply_document_fields(&mut extraction.rows, &dtmnfr, args.orgao.as_deref());
    if !args.no_ord_reset {
        renumber(&mut extraction.rows);
    }

    let suspects = flag_suspects(&extraction.rows, &extraction.metadata);
    if extraction.metadata.needs_review {
        warn!(
            input = %args.input.display(),
            "coalition lists without a proposing party; review partido_proponente"
        );
    }

    if args.strict && (extraction.rows.is_empty() || !suspects.is_empty()) {
        bail!(
            "strict mode rejected {}: {} rows extracted, {} flagged for review",
            args.input.display(),
            extraction.rows.len(),
            suspects.len()
        );
    }

    let run_id = format!(
        "run-{}-{}-{:06}",
        operator,
        utc_compact_string(started_ts),
        started_ts.timestamp_subsec_micros()
    );
    let output_csv = args.out.clone().unwrap_or_else(|| default_output(&args));

    let independence = Some(args.independente);
    write_bytes(
        &output_csv,
        &serialize_rows(&extraction.rows, args.encoding, independence)?,
    )?;

    let qa_csv = if args.qa {
        let qa_path = sibling_with_suffix(&output_csv, "qa", "csv");
        write_bytes(
            &qa_path,
            &serialize_suspects(&suspects, args.encoding, independence)?,
        )?;
        Some(qa_path)
    } else {
        None
    };

    let record = RunRecord {
        run_id: run_id.clone(),
        operator: operator.to_string(),
        input_path: args.input.display().to_string(),
        input_sha256: sha256_file(&args.input)?,
        output_csv: output_csv.display().to_string(),
        qa_csv: qa_csv.as_ref().map(|path| path.display().to_string()),
        rows: extraction.rows.len(),
        suspects: suspects.len(),
        needs_review: extraction.metadata.needs_review,
        created_at: now_utc_string(),
    };
    Ledger::open(&args.cache_root)?.record_run(&record)?;

    let orgaos = extraction
        .rows
        .iter()
        .map(|row| row.orgao.clone())
        .collect::<BTreeSet<String>>();
    let siglas = extraction
        .rows
        .iter()
        .map(|row| row.sigla.clone())
        .filter(|sigla| !sigla.is_empty())
        .collect::<BTreeSet<String>>();

    info!(
        run_id = %run_id,
        output_csv = %output_csv.display(),
        rows = extraction.rows.len(),
        suspects = suspects.len(),
        needs_review = extraction.metadata.needs_review,
        "extraction finished"
    );

    print_json(&ExtractSummary {
        run_id,
        input: record.input_path,
        output_csv: record.output_csv,
        qa_csv: record.qa_csv,
        rows: record.rows,
        orgaos: orgaos.into_iter().collect(),
        siglas: siglas.into_iter().collect(),
        suspects: record.suspects,
        needs_review: record.needs_review,
    })
}

fn default_output(args: &ExtractArgs) -> PathBuf {
    let stem = args
        .input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or("input");
    args.cache_root
        .join("out")
        .join(format!("{}_{}.csv", args.operator.as_str(), stem))
}
