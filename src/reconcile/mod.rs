//! Reconciliation of two independently produced extractions.
//!
//! Rows are matched on [`ReconciliationKey`]. `merge` is a keyed union with
//! first-seen precedence, so operator A wins any conflict on the same key.

use std::collections::HashSet;

use tracing::debug;

use crate::model::{CandidateRow, Column, DiffReport, ReconciliationKey};
use crate::table::Table;

mod schema;

pub use schema::{DEFAULT_ALLOWED_ORGAOS, validate_schema};

/// Builds rows from a raw table: absent columns become empty, values trimmed.
pub fn normalize(table: &Table) -> Vec<CandidateRow> {
    table
        .rows
        .iter()
        .map(|raw| {
            let mut row = CandidateRow::default();
            for column in Column::ALL {
                if let Some(value) = raw.get(column.as_str()) {
                    *row.value_mut(column) = value.trim().to_string();
                }
            }
            row
        })
        .collect()
}

pub fn diff(a: &[CandidateRow], b: &[CandidateRow]) -> DiffReport {
    let keys_a = unique_keys(a);
    let keys_b = unique_keys(b);

    let set_a = keys_a.iter().collect::<HashSet<&ReconciliationKey>>();
    let set_b = keys_b.iter().collect::<HashSet<&ReconciliationKey>>();

    let only_in_a = keys_a
        .iter()
        .filter(|key| !set_b.contains(key))
        .cloned()
        .collect::<Vec<ReconciliationKey>>();
    let only_in_b = keys_b
        .iter()
        .filter(|key| !set_a.contains(key))
        .cloned()
        .collect::<Vec<ReconciliationKey>>();

    DiffReport {
        equal: only_in_a.is_empty() && only_in_b.is_empty(),
        only_in_a,
        only_in_b,
        rows_a: a.len(),
        rows_b: b.len(),
    }
}

pub fn merge(a: &[CandidateRow], b: &[CandidateRow]) -> Vec<CandidateRow> {
    let mut seen = HashSet::<ReconciliationKey>::new();
    let mut merged = a
        .iter()
        .chain(b.iter())
        .filter(|row| seen.insert(row.key()))
        .cloned()
        .collect::<Vec<CandidateRow>>();

    merged.sort_by(|left, right| sort_key(left).cmp(&sort_key(right)));

    debug!(
        rows_a = a.len(),
        rows_b = b.len(),
        merged = merged.len(),
        "merged datasets"
    );

    merged
}

pub fn reconcile(a: &[CandidateRow], b: &[CandidateRow]) -> (DiffReport, Vec<CandidateRow>) {
    (diff(a, b), merge(a, b))
}

fn unique_keys(rows: &[CandidateRow]) -> Vec<ReconciliationKey> {
    let mut seen = HashSet::new();
    rows.iter()
        .map(CandidateRow::key)
        .filter(|key| seen.insert(key.clone()))
        .collect()
}

fn sort_key(row: &CandidateRow) -> (&str, &str, &str, &str, &str, &str) {
    (
        row.orgao.as_str(),
        row.sigla.as_str(),
        row.tipo.as_str(),
        row.nome_lista.as_str(),
        row.num_ordem.as_str(),
        row.nome_candidato.as_str(),
    )
}
