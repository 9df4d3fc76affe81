use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::ValidateArgs;
use crate::config::PipelineConfig;
use crate::reconcile::validate_schema;
use crate::table::read_table;
use crate::util::print_json;

pub fn run(args: ValidateArgs) -> Result<()> {
    if !args.csv.is_file() {
        bail!("csv not found: {}", args.csv.display());
    }
    let config = PipelineConfig::load(args.config.as_deref())?;

    let table = read_table(&args.csv)?;
    let report = validate_schema(&table, &config.allowed_orgaos);

    if report.ok {
        info!(csv = %args.csv.display(), rows = report.rows, "schema valid");
    } else {
        warn!(
            csv = %args.csv.display(),
            rows = report.rows,
            issues = report.issues.len(),
            "schema issues found"
        );
    }

    print_json(&report)
}
