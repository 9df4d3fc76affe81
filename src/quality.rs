use std::collections::BTreeSet;

use crate::model::{CandidateRow, Column, ExtractionMetadata, SuspectRow};
use crate::text_repair::is_corrupted;

pub const NEEDS_REVIEW_REASON: &str = "context:needs_review";

/// Every column except `SIMBOLO` must be filled.
const CRITICAL_COLUMNS: [Column; 9] = [
    Column::Dtmnfr,
    Column::Orgao,
    Column::Tipo,
    Column::Sigla,
    Column::NomeLista,
    Column::NumOrdem,
    Column::NomeCandidato,
    Column::PartidoProponente,
    Column::Independente,
];

/// Returns rows that need a human look, each with its 1-based position and
/// reason tags. The document-level review flag is reported exactly once.
pub fn flag_suspects(rows: &[CandidateRow], metadata: &ExtractionMetadata) -> Vec<SuspectRow> {
    let mut suspects = rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| {
            let reasons = row_reasons(row);
            (!reasons.is_empty()).then(|| SuspectRow {
                row: row.clone(),
                qa_index: index + 1,
                qa_reason: reasons,
            })
        })
        .collect::<Vec<SuspectRow>>();

    if metadata.needs_review {
        attach_review_flag(&mut suspects, rows);
    }

    suspects
}

fn row_reasons(row: &CandidateRow) -> BTreeSet<String> {
    let mut reasons = BTreeSet::new();

    for column in CRITICAL_COLUMNS {
        if row.value(column).trim().is_empty() {
            reasons.insert(format!("missing:{}", column.as_str()));
        }
    }
    for column in Column::ALL {
        if is_corrupted(row.value(column)) {
            reasons.insert(format!("mojibake:{}", column.as_str()));
        }
    }

    reasons
}

fn attach_review_flag(suspects: &mut Vec<SuspectRow>, rows: &[CandidateRow]) {
    if let Some(first) = suspects.first_mut() {
        first.qa_reason.insert(NEEDS_REVIEW_REASON.to_string());
        return;
    }

    let (row, qa_index) = match rows.first() {
        Some(row) => (row.clone(), 1),
        None => (CandidateRow::default(), 0),
    };
    suspects.push(SuspectRow {
        row,
        qa_index,
        qa_reason: BTreeSet::from([NEEDS_REVIEW_REASON.to_string()]),
    });
}
