use anyhow::Result;
use tracing::{info, warn};

use crate::cli::{Operator, StatusArgs};
use crate::ledger::{Ledger, ledger_path};
use crate::util::print_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let db_path = ledger_path(&args.cache_root);
    info!(cache_root = %args.cache_root.display(), "status requested");

    let Some(ledger) = Ledger::open_existing(&args.cache_root)? else {
        warn!(path = %db_path.display(), "run ledger missing");
        return Ok(());
    };

    for operator in [Operator::A, Operator::B] {
        let runs = ledger.count_runs(operator.as_str())?;
        match ledger.latest_run(operator.as_str())? {
            Some(latest) => info!(
                operator = operator.as_str(),
                runs,
                run_id = %latest.run_id,
                output_csv = %latest.output_csv,
                rows = latest.rows,
                suspects = latest.suspects,
                needs_review = latest.needs_review,
                created_at = %latest.created_at,
                "latest run"
            ),
            None => warn!(operator = operator.as_str(), "no runs recorded"),
        }
    }

    print_json(&ledger.list_runs(args.limit)?)
}
