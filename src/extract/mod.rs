use std::collections::HashMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::model::{CandidateRow, ExtractionMetadata};
use crate::text_repair::repair;

mod context;
mod ner;
mod patterns;

#[cfg_attr(not(test), allow(unused_imports))]
pub use ner::{EntityRecognizer, EntitySpan, LazyRecognizer, PERSON_LABEL, extract_with_recognizer};

use context::ExtractionContext;
use patterns::{PATTERNS, Patterns, is_coalition, is_coalition_member};

pub const DEFAULT_ORGAO: &str = "CM";
pub const INDEPENDENT_SIGLA: &str = "ICA";
const UNKNOWN_DTMNFR: &str = "0000000000";

static DTMNFR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d{4})_").expect("valid dtmnfr regex"));
static BULLET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[\-–—•*]+\s*").expect("valid bullet regex"));

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Applied at row emission when no organ heading has been seen yet.
    pub default_orgao: String,
    pub independent_sigla: String,
    pub repair: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            default_orgao: DEFAULT_ORGAO.to_string(),
            independent_sigla: INDEPENDENT_SIGLA.to_string(),
            repair: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub rows: Vec<CandidateRow>,
    pub metadata: ExtractionMetadata,
}

enum LineOutcome {
    Row(Box<CandidateRow>),
    Heading,
    Consumed,
    Skipped,
}

#[cfg_attr(not(test), allow(dead_code))]
pub fn extract<S: AsRef<str>>(lines: &[S]) -> Extraction {
    extract_with(lines, &ExtractOptions::default())
}

pub fn extract_with<S: AsRef<str>>(lines: &[S], options: &ExtractOptions) -> Extraction {
    scan(lines, options, repair)
}

/// Runs the context state machine; `name_of` turns the text after the
/// ordinal into the candidate name.
fn scan<S, F>(lines: &[S], options: &ExtractOptions, name_of: F) -> Extraction
where
    S: AsRef<str>,
    F: Fn(&str) -> String,
{
    let patterns: &Patterns = &PATTERNS;
    let mut context = ExtractionContext::new();
    let mut extraction = Extraction::default();

    for raw in lines {
        extraction.metadata.lines_seen += 1;

        let line = if options.repair {
            repair(raw.as_ref())
        } else {
            raw.as_ref().trim().to_string()
        };
        if line.is_empty() {
            extraction.metadata.lines_skipped += 1;
            continue;
        }

        match step(&line, &mut context, options, patterns, &name_of) {
            LineOutcome::Row(row) => extraction.rows.push(*row),
            LineOutcome::Heading => extraction.metadata.list_headings += 1,
            LineOutcome::Consumed => {}
            LineOutcome::Skipped => extraction.metadata.lines_skipped += 1,
        }
    }

    extraction.metadata.needs_review = context.needs_review;

    debug!(
        lines = extraction.metadata.lines_seen,
        rows = extraction.rows.len(),
        skipped = extraction.metadata.lines_skipped,
        headings = extraction.metadata.list_headings,
        needs_review = extraction.metadata.needs_review,
        "scan finished"
    );

    extraction
}

fn step<F>(
    line: &str,
    context: &mut ExtractionContext,
    options: &ExtractOptions,
    patterns: &Patterns,
    name_of: &F,
) -> LineOutcome
where
    F: Fn(&str) -> String,
{
    if let Some(orgao) = patterns.detect_orgao(line) {
        context.set_orgao(orgao);
        if patterns.is_organ_heading(line) {
            return LineOutcome::Consumed;
        }
    }

    if let Some(tipo) = patterns.section_tipo(line) {
        context.section_tipo = Some(tipo);
        return LineOutcome::Consumed;
    }

    if patterns.is_new_list_heading(line) {
        let sigla = patterns.find_sigla(line, &options.independent_sigla);
        let nome_lista = patterns
            .heading_nome_lista(line, sigla.as_deref().or(context.sigla.as_deref()))
            .map(|name| repair(&name));
        context.start_list(sigla, nome_lista);
        return LineOutcome::Heading;
    }

    if let Some(nome_lista) = patterns.find_nome_lista(line) {
        context.nome_lista = Some(repair(&nome_lista));
        return LineOutcome::Consumed;
    }

    if let Some(sigla) = patterns.find_sigla(line, &options.independent_sigla) {
        match context.sigla.as_deref() {
            Some(current) if is_coalition_member(current, &sigla) => {
                context.remember_proposing_party(sigla);
            }
            _ => context.sigla = Some(sigla),
        }
    }
    if let Some(proponente) = patterns.find_proponente(line, context.sigla.as_deref()) {
        context.remember_proposing_party(proponente);
    }

    let Some((num_ordem, remainder)) = patterns.match_ordinal(line) else {
        return LineOutcome::Skipped;
    };
    let remainder = remainder.trim();
    if remainder.is_empty() {
        return LineOutcome::Skipped;
    }
    let nome_candidato = name_of(remainder);
    if nome_candidato.is_empty() {
        return LineOutcome::Skipped;
    }

    let sigla = context.sigla.clone().unwrap_or_default();
    let nome_lista = context.nome_lista.clone().unwrap_or_default();
    let orgao = context
        .orgao
        .clone()
        .unwrap_or_else(|| options.default_orgao.clone());

    let substitute =
        remainder.to_lowercase().contains("suplente") || context.section_tipo == Some("3");
    let tipo = if substitute { "3" } else { "2" };

    let partido_proponente = if is_coalition(&sigla) {
        match context.proposing_party() {
            Some(proponente) => proponente.to_string(),
            None => {
                context.needs_review = true;
                sigla.clone()
            }
        }
    } else {
        sigla.clone()
    };

    let independente = if !sigla.is_empty() && sigla == options.independent_sigla {
        "1"
    } else {
        "0"
    };

    context.reinforce(&sigla, &nome_lista);

    LineOutcome::Row(Box::new(CandidateRow {
        dtmnfr: String::new(),
        orgao,
        tipo: tipo.to_string(),
        sigla,
        simbolo: String::new(),
        nome_lista,
        num_ordem: num_ordem.to_string(),
        nome_candidato,
        partido_proponente,
        independente: independente.to_string(),
    }))
}

/// Splits raw document text into scan-ready lines: whitespace collapsed,
/// bullets stripped, blank and "Nota" lines dropped.
pub fn prepare_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let spaced = line.replace(['\r', '\t', '\u{00A0}'], " ");
            let collapsed = spaced.split_whitespace().collect::<Vec<&str>>().join(" ");
            BULLET_RE.replace(&collapsed, "").trim().to_string()
        })
        .filter(|line| !line.is_empty() && !line.to_lowercase().starts_with("nota"))
        .collect()
}

/// `..._2025_...` in the file name yields `2025000000`.
pub fn infer_dtmnfr(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| DTMNFR_RE.captures(name))
        .and_then(|captures| captures.get(1))
        .map(|year| format!("{}000000", year.as_str()))
        .unwrap_or_else(|| UNKNOWN_DTMNFR.to_string())
}

/// Fills document-level fields the scan cannot know.
pub fn apply_document_fields(rows: &mut [CandidateRow], dtmnfr: &str, orgao: Option<&str>) {
    for row in rows.iter_mut() {
        if row.dtmnfr.is_empty() {
            row.dtmnfr = dtmnfr.to_string();
        }
        if let Some(orgao) = orgao.filter(|value| !value.is_empty()) {
            row.orgao = orgao.to_string();
        }
    }
}

/// Renumbers `num_ordem` 1.. within each `(dtmnfr, orgao, sigla, nome_lista, tipo)` group.
pub fn renumber(rows: &mut [CandidateRow]) {
    let mut counters = HashMap::<(String, String, String, String, String), usize>::new();

    for row in rows.iter_mut() {
        let tipo = row.tipo.trim();
        if tipo != "2" && tipo != "3" {
            continue;
        }

        let key = (
            row.dtmnfr.clone(),
            row.orgao.clone(),
            row.sigla.clone(),
            row.nome_lista.clone(),
            tipo.to_string(),
        );
        let counter = counters.entry(key).or_insert(0);
        *counter += 1;
        row.num_ordem = counter.to_string();
    }
}
