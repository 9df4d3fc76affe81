use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{MergeArgs, Operator};
use crate::ledger::Ledger;
use crate::model::MergeSummary;
use crate::reconcile::{normalize, reconcile};
use crate::table::{read_table, serialize_rows};
use crate::util::{print_json, sibling_with_suffix, write_bytes, write_json_pretty};

pub fn run(args: MergeArgs) -> Result<()> {
    let csv_a = resolve_input(args.csv_a.clone(), Operator::A, &args.cache_root)?;
    let csv_b = resolve_input(args.csv_b.clone(), Operator::B, &args.cache_root)?;

    let rows_a = normalize(&read_table(&csv_a)?);
    let rows_b = normalize(&read_table(&csv_b)?);
    info!(
        csv_a = %csv_a.display(),
        csv_b = %csv_b.display(),
        rows_a = rows_a.len(),
        rows_b = rows_b.len(),
        "merge started"
    );

    let (diffs, merged) = reconcile(&rows_a, &rows_b);
    if !diffs.equal {
        warn!(
            only_in_a = diffs.only_in_a.len(),
            only_in_b = diffs.only_in_b.len(),
            "operator extractions disagree"
        );
    }

    let final_csv = args
        .out
        .clone()
        .unwrap_or_else(|| args.cache_root.join("out").join("final.csv"));
    write_bytes(&final_csv, &serialize_rows(&merged, args.encoding, None)?)?;

    let diff_path = sibling_with_suffix(&final_csv, "diff", "json");
    write_json_pretty(&diff_path, &diffs)?;

    info!(
        final_csv = %final_csv.display(),
        diff_report = %diff_path.display(),
        rows = merged.len(),
        "merge finished"
    );

    print_json(&MergeSummary {
        diffs,
        final_csv: final_csv.display().to_string(),
        rows: merged.len(),
    })
}

fn resolve_input(explicit: Option<PathBuf>, operator: Operator, cache_root: &Path) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path,
        None => {
            let Some(ledger) = Ledger::open_existing(cache_root)? else {
                bail!(
                    "no csv given for operator {} and no run ledger under {}",
                    operator.as_str(),
                    cache_root.display()
                );
            };
            let run = ledger.latest_run(operator.as_str())?.with_context(|| {
                format!("no extraction run recorded for operator {}", operator.as_str())
            })?;
            PathBuf::from(run.output_csv)
        }
    };

    if !path.is_file() {
        bail!(
            "csv for operator {} not found: {}",
            operator.as_str(),
            path.display()
        );
    }
    Ok(path)
}
