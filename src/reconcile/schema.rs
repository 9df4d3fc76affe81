use crate::model::{Column, ValidationIssue, ValidationReport};
use crate::table::Table;

pub const DEFAULT_ALLOWED_ORGAOS: [&str; 3] = ["AM", "CM", "AF"];
/// Offending row indices reported per issue.
pub const ROW_INDEX_CAP: usize = 50;

const ALLOWED_TIPOS: [&str; 2] = ["2", "3"];
const ALLOWED_INDEP: [&str; 2] = ["S", "N"];

/// Checks a raw table against the canonical schema. Categories are
/// independent; a missing column only suppresses its own value check.
pub fn validate_schema<S: AsRef<str>>(table: &Table, allowed_orgaos: &[S]) -> ValidationReport {
    let mut issues = Vec::new();

    let missing = Column::ALL
        .iter()
        .map(|column| column.as_str())
        .filter(|name| !table.has_column(name))
        .map(str::to_string)
        .collect::<Vec<String>>();
    if !missing.is_empty() {
        issues.push(ValidationIssue::MissingColumns { detail: missing });
    }

    if let Some(rows) = invalid_rows(table, Column::Orgao, |value| {
        allowed_orgaos.iter().any(|allowed| allowed.as_ref() == value)
    }) {
        issues.push(ValidationIssue::InvalidOrgao { rows });
    }
    if let Some(rows) = invalid_rows(table, Column::Tipo, |value| ALLOWED_TIPOS.contains(&value)) {
        issues.push(ValidationIssue::InvalidTipo { rows });
    }
    if let Some(rows) = invalid_rows(table, Column::Independente, |value| {
        ALLOWED_INDEP.contains(&value)
    }) {
        issues.push(ValidationIssue::InvalidIndep { rows });
    }

    ValidationReport {
        ok: issues.is_empty(),
        rows: table.rows.len(),
        issues,
    }
}

/// `None` when the column is absent or every value is accepted.
fn invalid_rows<F>(table: &Table, column: Column, accepts: F) -> Option<Vec<usize>>
where
    F: Fn(&str) -> bool,
{
    if !table.has_column(column.as_str()) {
        return None;
    }

    let rows = (0..table.rows.len())
        .filter(|index| {
            let value = table.value(*index, column.as_str()).map(str::trim);
            !value.is_some_and(&accepts)
        })
        .take(ROW_INDEX_CAP)
        .collect::<Vec<usize>>();

    (!rows.is_empty()).then_some(rows)
}
