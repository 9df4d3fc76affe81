use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum Column {
    Dtmnfr,
    Orgao,
    Tipo,
    Sigla,
    Simbolo,
    NomeLista,
    NumOrdem,
    NomeCandidato,
    PartidoProponente,
    Independente,
}

impl Column {
    /// Canonical export order.
    pub const ALL: [Column; 10] = [
        Column::Dtmnfr,
        Column::Orgao,
        Column::Tipo,
        Column::Sigla,
        Column::Simbolo,
        Column::NomeLista,
        Column::NumOrdem,
        Column::NomeCandidato,
        Column::PartidoProponente,
        Column::Independente,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dtmnfr => "DTMNFR",
            Self::Orgao => "ORGAO",
            Self::Tipo => "TIPO",
            Self::Sigla => "SIGLA",
            Self::Simbolo => "SIMBOLO",
            Self::NomeLista => "NOME_LISTA",
            Self::NumOrdem => "NUM_ORDEM",
            Self::NomeCandidato => "NOME_CANDIDATO",
            Self::PartidoProponente => "PARTIDO_PROPONENTE",
            Self::Independente => "INDEPENDENTE",
        }
    }

    pub fn header() -> Vec<&'static str> {
        Self::ALL.iter().map(|column| column.as_str()).collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", default)]
pub struct CandidateRow {
    pub dtmnfr: String,
    pub orgao: String,
    pub tipo: String,
    pub sigla: String,
    pub simbolo: String,
    pub nome_lista: String,
    pub num_ordem: String,
    pub nome_candidato: String,
    pub partido_proponente: String,
    pub independente: String,
}

impl CandidateRow {
    pub fn value(&self, column: Column) -> &str {
        match column {
            Column::Dtmnfr => &self.dtmnfr,
            Column::Orgao => &self.orgao,
            Column::Tipo => &self.tipo,
            Column::Sigla => &self.sigla,
            Column::Simbolo => &self.simbolo,
            Column::NomeLista => &self.nome_lista,
            Column::NumOrdem => &self.num_ordem,
            Column::NomeCandidato => &self.nome_candidato,
            Column::PartidoProponente => &self.partido_proponente,
            Column::Independente => &self.independente,
        }
    }

    pub fn value_mut(&mut self, column: Column) -> &mut String {
        match column {
            Column::Dtmnfr => &mut self.dtmnfr,
            Column::Orgao => &mut self.orgao,
            Column::Tipo => &mut self.tipo,
            Column::Sigla => &mut self.sigla,
            Column::Simbolo => &mut self.simbolo,
            Column::NomeLista => &mut self.nome_lista,
            Column::NumOrdem => &mut self.num_ordem,
            Column::NomeCandidato => &mut self.nome_candidato,
            Column::PartidoProponente => &mut self.partido_proponente,
            Column::Independente => &mut self.independente,
        }
    }

    pub fn key(&self) -> ReconciliationKey {
        ReconciliationKey {
            orgao: self.orgao.clone(),
            sigla: self.sigla.clone(),
            tipo: self.tipo.clone(),
            num_ordem: self.num_ordem.clone(),
            nome_candidato: self.nome_candidato.clone(),
        }
    }
}

/// Identifies "the same candidate entry" across two datasets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ReconciliationKey {
    pub orgao: String,
    pub sigla: String,
    pub tipo: String,
    pub num_ordem: String,
    pub nome_candidato: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionMetadata {
    pub needs_review: bool,
    pub lines_seen: usize,
    pub lines_skipped: usize,
    pub list_headings: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspectRow {
    pub row: CandidateRow,
    pub qa_index: usize,
    pub qa_reason: BTreeSet<String>,
}

impl SuspectRow {
    /// Tags joined with `,` so the value never collides with the `;` delimiter.
    pub fn reason_text(&self) -> String {
        self.qa_reason
            .iter()
            .map(String::as_str)
            .collect::<Vec<&str>>()
            .join(",")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DiffReport {
    #[serde(rename = "only_in_A")]
    pub only_in_a: Vec<ReconciliationKey>,
    #[serde(rename = "only_in_B")]
    pub only_in_b: Vec<ReconciliationKey>,
    pub equal: bool,
    #[serde(rename = "rows_A")]
    pub rows_a: usize,
    #[serde(rename = "rows_B")]
    pub rows_b: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidationIssue {
    MissingColumns { detail: Vec<String> },
    InvalidOrgao { rows: Vec<usize> },
    InvalidTipo { rows: Vec<usize> },
    InvalidIndep { rows: Vec<usize> },
}

#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    pub ok: bool,
    pub rows: usize,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExtractSummary {
    pub run_id: String,
    pub input: String,
    pub output_csv: String,
    pub qa_csv: Option<String>,
    pub rows: usize,
    pub orgaos: Vec<String>,
    pub siglas: Vec<String>,
    pub suspects: usize,
    pub needs_review: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeSummary {
    pub diffs: DiffReport,
    pub final_csv: String,
    pub rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RepairSummary {
    pub input: String,
    pub output: String,
    pub rows: usize,
    pub changed_cells: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub run_id: String,
    pub operator: String,
    pub input_path: String,
    pub input_sha256: String,
    pub output_csv: String,
    pub qa_csv: Option<String>,
    pub rows: usize,
    pub suspects: usize,
    pub needs_review: bool,
    pub created_at: String,
}
