//! Semicolon-delimited CSV reading and writing for candidate datasets.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use encoding_rs::{EncoderResult, WINDOWS_1252};
use tracing::warn;

use crate::model::{CandidateRow, Column, SuspectRow};
use crate::util::read_text;

pub const DELIMITER: u8 = b';';
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const QA_INDEX_COLUMN: &str = "_qa_index";
const QA_REASON_COLUMN: &str = "_qa_reason";
/// Stands in for characters Windows-1252 cannot represent.
const UNMAPPABLE_PLACEHOLDER: u8 = b'?';

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CsvEncoding {
    /// UTF-8 with a byte-order mark so spreadsheet tools pick the right charset.
    #[value(name = "utf8-bom")]
    Utf8Bom,
    Cp1252,
}

/// How `INDEPENDENTE` is written: `0`/`1` as extracted, or `N`/`S`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum IndependenceFormat {
    Numeric,
    Letter,
}

impl IndependenceFormat {
    pub fn apply(self, value: &str) -> String {
        match (self, value.trim()) {
            (Self::Letter, "1") => "S".to_string(),
            (Self::Letter, "0") => "N".to_string(),
            (Self::Numeric, "S") => "1".to_string(),
            (Self::Numeric, "N") => "0".to_string(),
            (_, other) => other.to_string(),
        }
    }
}

/// A dataset exactly as read: header order plus rows keyed by header name.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<HashMap<String, String>>,
}

impl Table {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    pub fn value(&self, index: usize, name: &str) -> Option<&str> {
        self.rows
            .get(index)
            .and_then(|row| row.get(name))
            .map(String::as_str)
    }
}

pub fn read_table(path: &Path) -> Result<Table> {
    let text = read_text(path)?;
    parse_table(&text).with_context(|| format!("failed to parse csv: {}", path.display()))
}

pub fn parse_table(text: &str) -> Result<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .flexible(true)
        .from_reader(text.trim_start_matches('\u{feff}').as_bytes());

    let columns = reader
        .headers()
        .context("failed to read csv header")?
        .iter()
        .map(|name| name.trim().to_string())
        .collect::<Vec<String>>();

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("failed to read csv record {index}"))?;
        let row = columns
            .iter()
            .zip(record.iter())
            .map(|(name, value)| (name.clone(), value.to_string()))
            .collect::<HashMap<String, String>>();
        rows.push(row);
    }

    Ok(Table { columns, rows })
}

pub fn serialize_rows(
    rows: &[CandidateRow],
    encoding: CsvEncoding,
    independence: Option<IndependenceFormat>,
) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(Vec::new());

    writer
        .write_record(Column::header())
        .context("failed to write csv header")?;
    for row in rows {
        writer
            .write_record(export_record(row, independence))
            .context("failed to write csv row")?;
    }

    let data = writer.into_inner().context("failed to flush csv writer")?;
    encode(data, encoding)
}

/// Writes a raw table back in its own header order.
pub fn serialize_table(table: &Table, encoding: CsvEncoding) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(Vec::new());

    writer
        .write_record(&table.columns)
        .context("failed to write csv header")?;
    for row in &table.rows {
        let record = table
            .columns
            .iter()
            .map(|name| row.get(name).map(String::as_str).unwrap_or(""));
        writer
            .write_record(record)
            .context("failed to write csv row")?;
    }

    let data = writer.into_inner().context("failed to flush csv writer")?;
    encode(data, encoding)
}

/// QA side file: canonical columns plus `_qa_index` and `_qa_reason`.
pub fn serialize_suspects(
    suspects: &[SuspectRow],
    encoding: CsvEncoding,
    independence: Option<IndependenceFormat>,
) -> Result<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(Vec::new());

    let mut header = Column::header();
    header.extend([QA_INDEX_COLUMN, QA_REASON_COLUMN]);
    writer
        .write_record(header)
        .context("failed to write qa header")?;

    for suspect in suspects {
        let mut record = export_record(&suspect.row, independence);
        record.push(suspect.qa_index.to_string());
        record.push(suspect.reason_text());
        writer
            .write_record(record)
            .context("failed to write qa row")?;
    }

    let data = writer.into_inner().context("failed to flush qa writer")?;
    encode(data, encoding)
}

/// `None` writes `INDEPENDENTE` exactly as stored.
fn export_record(row: &CandidateRow, independence: Option<IndependenceFormat>) -> Vec<String> {
    Column::ALL
        .iter()
        .map(|column| {
            let value = row.value(*column);
            match (column, independence) {
                (Column::Independente, Some(format)) => format.apply(value),
                _ => value.to_string(),
            }
        })
        .collect()
}

fn encode(data: Vec<u8>, encoding: CsvEncoding) -> Result<Vec<u8>> {
    match encoding {
        CsvEncoding::Utf8Bom => {
            let mut bytes = Vec::with_capacity(UTF8_BOM.len() + data.len());
            bytes.extend_from_slice(UTF8_BOM);
            bytes.extend_from_slice(&data);
            Ok(bytes)
        }
        CsvEncoding::Cp1252 => {
            let text = String::from_utf8(data).context("csv writer produced invalid utf-8")?;
            Ok(encode_cp1252(&text))
        }
    }
}

/// Single-byte encode without `&#NNN;` references, which contain the field
/// delimiter.
fn encode_cp1252(text: &str) -> Vec<u8> {
    let mut encoder = WINDOWS_1252.new_encoder();
    let mut encoded = Vec::with_capacity(text.len());
    let mut buffer = [0_u8; 4096];
    let mut rest = text;
    let mut replaced = 0_usize;

    loop {
        let (result, read, written) =
            encoder.encode_from_utf8_without_replacement(rest, &mut buffer, true);
        encoded.extend_from_slice(&buffer[..written]);
        rest = &rest[read..];
        match result {
            EncoderResult::InputEmpty => break,
            EncoderResult::OutputFull => {}
            EncoderResult::Unmappable(_) => {
                encoded.push(UNMAPPABLE_PLACEHOLDER);
                replaced += 1;
            }
        }
    }

    if replaced > 0 {
        warn!(replaced, "characters outside windows-1252 were replaced in cp1252 export");
    }
    encoded
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn row(nome: &str) -> CandidateRow {
        CandidateRow {
            dtmnfr: "2025000000".to_string(),
            orgao: "CM".to_string(),
            tipo: "2".to_string(),
            sigla: "PS".to_string(),
            nome_lista: "Lista A".to_string(),
            num_ordem: "1".to_string(),
            nome_candidato: nome.to_string(),
            partido_proponente: "PS".to_string(),
            independente: "0".to_string(),
            ..CandidateRow::default()
        }
    }

    #[test]
    fn utf8_export_starts_with_bom_and_header() {
        let bytes = serialize_rows(&[row("João")], CsvEncoding::Utf8Bom, None)
            .expect("serialize rows");

        assert!(bytes.starts_with(UTF8_BOM));
        let text = String::from_utf8(bytes[UTF8_BOM.len()..].to_vec()).expect("utf-8 body");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("DTMNFR;ORGAO;TIPO;SIGLA;SIMBOLO;NOME_LISTA;NUM_ORDEM;NOME_CANDIDATO;PARTIDO_PROPONENTE;INDEPENDENTE")
        );
        assert_eq!(lines.next(), Some("2025000000;CM;2;PS;;Lista A;1;João;PS;0"));
    }

    #[test]
    fn cp1252_export_uses_single_byte_accents() {
        let bytes = serialize_rows(&[row("João")], CsvEncoding::Cp1252, Some(IndependenceFormat::Letter))
            .expect("serialize rows");

        assert!(!bytes.starts_with(UTF8_BOM));
        assert!(bytes.windows(4).any(|window| window == [b'J', b'o', 0xE3, b'o']));
        assert!(bytes.ends_with(b";PS;N\n"));
    }

    #[test]
    fn cp1252_export_keeps_columns_for_unmappable_names() {
        let bytes = serialize_rows(&[row("Łukasz Nowak")], CsvEncoding::Cp1252, None)
            .expect("serialize rows");
        let (text, _) = WINDOWS_1252.decode_without_bom_handling(&bytes);
        let table = parse_table(&text).expect("parse cp1252 export");

        assert_eq!(table.columns.len(), Column::ALL.len());
        assert_eq!(table.rows[0].len(), Column::ALL.len());
        assert_eq!(table.value(0, "NOME_CANDIDATO"), Some("?ukasz Nowak"));
        assert_eq!(table.value(0, "PARTIDO_PROPONENTE"), Some("PS"));
        assert_eq!(table.value(0, "INDEPENDENTE"), Some("0"));
    }

    #[test]
    fn encode_cp1252_replaces_each_unmappable_character() {
        assert_eq!(encode_cp1252("Şerban Ő;é"), b"?erban ?;\xE9".to_vec());
    }

    #[test]
    fn independence_format_converts_both_ways() {
        assert_eq!(IndependenceFormat::Letter.apply("1"), "S");
        assert_eq!(IndependenceFormat::Letter.apply("0"), "N");
        assert_eq!(IndependenceFormat::Letter.apply("S"), "S");
        assert_eq!(IndependenceFormat::Numeric.apply("N"), "0");
        assert_eq!(IndependenceFormat::Numeric.apply(""), "");
    }

    #[test]
    fn suspects_file_carries_qa_columns() {
        let suspect = SuspectRow {
            row: row(""),
            qa_index: 3,
            qa_reason: BTreeSet::from([
                "missing:NOME_CANDIDATO".to_string(),
                "context:needs_review".to_string(),
            ]),
        };

        let bytes = serialize_suspects(&[suspect], CsvEncoding::Utf8Bom, None)
            .expect("serialize suspects");
        let table = parse_table(&String::from_utf8(bytes).expect("utf-8")).expect("parse qa file");

        assert!(table.has_column(QA_INDEX_COLUMN));
        assert_eq!(table.value(0, QA_INDEX_COLUMN), Some("3"));
        assert_eq!(
            table.value(0, QA_REASON_COLUMN),
            Some("context:needs_review,missing:NOME_CANDIDATO")
        );
    }

    #[test]
    fn parse_table_keeps_header_order_and_short_rows() {
        let table = parse_table("\u{feff}ORGAO;SIGLA;TIPO\nCM;PS;2\nAM;BE\n").expect("parse table");

        assert_eq!(table.columns, vec!["ORGAO", "SIGLA", "TIPO"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.value(1, "SIGLA"), Some("BE"));
        assert_eq!(table.value(1, "TIPO"), None);
    }

    #[test]
    fn read_table_accepts_cp1252_files() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("legacy.csv");
        let bytes = serialize_rows(&[row("Conceição")], CsvEncoding::Cp1252, Some(IndependenceFormat::Letter))
            .expect("serialize rows");
        std::fs::write(&path, bytes).expect("write csv");

        let table = read_table(&path).expect("read table");
        assert_eq!(table.value(0, "NOME_CANDIDATO"), Some("Conceição"));
        assert_eq!(table.value(0, "INDEPENDENTE"), Some("N"));
    }

    #[test]
    fn serialize_table_keeps_foreign_header_order() {
        let table = parse_table("SIGLA;EXTRA;ORGAO\nPS;x;CM\nBE\n").expect("parse table");
        let bytes = serialize_table(&table, CsvEncoding::Cp1252).expect("serialize table");

        assert_eq!(
            String::from_utf8(bytes).expect("ascii output"),
            "SIGLA;EXTRA;ORGAO\nPS;x;CM\nBE;;\n"
        );
    }
}
