use anyhow::{Result, bail};
use tracing::info;

use crate::cli::RepairArgs;
use crate::model::{Column, RepairSummary};
use crate::table::{read_table, serialize_table};
use crate::text_repair::repair;
use crate::util::{print_json, write_bytes};

/// Free-text columns that pick up mojibake in already exported files.
const REPAIRED_COLUMNS: [Column; 4] = [
    Column::NomeCandidato,
    Column::NomeLista,
    Column::PartidoProponente,
    Column::Sigla,
];

pub fn run(args: RepairArgs) -> Result<()> {
    if !args.input.is_file() {
        bail!("csv not found: {}", args.input.display());
    }

    let mut table = read_table(&args.input)?;
    let mut changed_cells = 0_usize;

    for row in &mut table.rows {
        for column in REPAIRED_COLUMNS {
            if let Some(value) = row.get_mut(column.as_str()) {
                let repaired = repair(value);
                if repaired != *value {
                    *value = repaired;
                    changed_cells += 1;
                }
            }
        }
    }

    write_bytes(&args.output, &serialize_table(&table, args.encoding)?)?;
    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        rows = table.rows.len(),
        changed_cells,
        "csv repaired"
    );

    print_json(&RepairSummary {
        input: args.input.display().to_string(),
        output: args.output.display().to_string(),
        rows: table.rows.len(),
        changed_cells,
    })
}
