//! SQLite ledger of extraction runs, used by `merge` to find each operator's
//! latest output and by `status` to report history.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::model::RunRecord;
use crate::util::ensure_directory;

pub const LEDGER_FILE: &str = "cne_runs.sqlite";

pub fn ledger_path(cache_root: &Path) -> PathBuf {
    cache_root.join(LEDGER_FILE)
}

pub struct Ledger {
    connection: Connection,
}

impl Ledger {
    /// Opens (creating if needed) the ledger under `cache_root`.
    pub fn open(cache_root: &Path) -> Result<Self> {
        ensure_directory(cache_root)?;
        let path = ledger_path(cache_root);
        let connection = Connection::open(&path)
            .with_context(|| format!("failed to open ledger: {}", path.display()))?;
        configure_connection(&connection)?;
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    /// Opens an existing ledger without creating anything; `None` when absent.
    pub fn open_existing(cache_root: &Path) -> Result<Option<Self>> {
        let path = ledger_path(cache_root);
        if !path.exists() {
            return Ok(None);
        }
        let connection = Connection::open(&path)
            .with_context(|| format!("failed to open ledger: {}", path.display()))?;
        ensure_schema(&connection)?;
        Ok(Some(Self { connection }))
    }

    pub fn record_run(&self, record: &RunRecord) -> Result<()> {
        self.connection
            .execute(
                "INSERT INTO runs (
                   run_id, operator, input_path, input_sha256, output_csv, qa_csv,
                   rows, suspects, needs_review, created_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.run_id,
                    record.operator,
                    record.input_path,
                    record.input_sha256,
                    record.output_csv,
                    record.qa_csv,
                    record.rows,
                    record.suspects,
                    record.needs_review,
                    record.created_at,
                ],
            )
            .with_context(|| format!("failed to record run {}", record.run_id))?;
        Ok(())
    }

    pub fn latest_run(&self, operator: &str) -> Result<Option<RunRecord>> {
        self.connection
            .query_row(
                "SELECT run_id, operator, input_path, input_sha256, output_csv, qa_csv,
                        rows, suspects, needs_review, created_at
                 FROM runs
                 WHERE operator = ?1
                 ORDER BY created_at DESC, seq DESC
                 LIMIT 1",
                params![operator],
                read_record,
            )
            .optional()
            .with_context(|| format!("failed to query latest run for operator {operator}"))
    }

    /// Most recent first.
    pub fn list_runs(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let mut statement = self
            .connection
            .prepare(
                "SELECT run_id, operator, input_path, input_sha256, output_csv, qa_csv,
                        rows, suspects, needs_review, created_at
                 FROM runs
                 ORDER BY created_at DESC, seq DESC
                 LIMIT ?1",
            )
            .context("failed to prepare run listing")?;

        let records = statement
            .query_map(params![limit], read_record)
            .context("failed to list runs")?
            .collect::<rusqlite::Result<Vec<RunRecord>>>()
            .context("failed to decode run rows")?;
        Ok(records)
    }

    pub fn count_runs(&self, operator: &str) -> Result<i64> {
        let count = self.connection.query_row(
            "SELECT COUNT(*) FROM runs WHERE operator = ?1",
            params![operator],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS runs (
              seq INTEGER PRIMARY KEY AUTOINCREMENT,
              run_id TEXT NOT NULL UNIQUE,
              operator TEXT NOT NULL,
              input_path TEXT NOT NULL,
              input_sha256 TEXT NOT NULL,
              output_csv TEXT NOT NULL,
              qa_csv TEXT,
              rows INTEGER NOT NULL,
              suspects INTEGER NOT NULL,
              needs_review INTEGER NOT NULL,
              created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_runs_operator_created
              ON runs(operator, created_at);
            ",
        )
        .context("failed to ensure ledger schema")?;
    Ok(())
}

fn read_record(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        run_id: row.get(0)?,
        operator: row.get(1)?,
        input_path: row.get(2)?,
        input_sha256: row.get(3)?,
        output_csv: row.get(4)?,
        qa_csv: row.get(5)?,
        rows: row.get(6)?,
        suspects: row.get(7)?,
        needs_review: row.get(8)?,
        created_at: row.get(9)?,
    })
}
