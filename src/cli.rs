use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::table::{CsvEncoding, IndependenceFormat};

#[derive(Parser, Debug)]
#[command(
    name = "cne-extract",
    version,
    about = "Candidate-list extraction, reconciliation and validation tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Extract(ExtractArgs),
    Merge(MergeArgs),
    Validate(ValidateArgs),
    Repair(RepairArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum Operator {
    #[value(name = "A")]
    A,
    #[value(name = "B")]
    B,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Linearized document: one text line per source line.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, value_enum, ignore_case = true)]
    pub operator: Operator,

    /// Defaults to `<cache-root>/out/<operator>_<input stem>.csv`.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Forces ORGAO on every row.
    #[arg(long)]
    pub orgao: Option<String>,

    /// Overrides the DTMNFR inferred from the input file name.
    #[arg(long)]
    pub dtmnfr: Option<String>,

    #[arg(long, default_value_t = false)]
    pub no_ord_reset: bool,

    #[arg(long, default_value_t = false)]
    pub no_repair: bool,

    #[arg(long, value_enum, default_value_t = CsvEncoding::Utf8Bom)]
    pub encoding: CsvEncoding,

    #[arg(long, value_enum, default_value_t = IndependenceFormat::Letter)]
    pub independente: IndependenceFormat,

    /// Also write `<stem>_qa.csv` with flagged rows.
    #[arg(long, default_value_t = false)]
    pub qa: bool,

    /// Fail when nothing was extracted or any row is flagged.
    #[arg(long, default_value_t = false)]
    pub strict: bool,

    #[arg(long, default_value = ".cache/cne")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct MergeArgs {
    /// Defaults to the latest operator A run in the ledger.
    #[arg(long)]
    pub csv_a: Option<PathBuf>,

    /// Defaults to the latest operator B run in the ledger.
    #[arg(long)]
    pub csv_b: Option<PathBuf>,

    #[arg(long)]
    pub out: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = CsvEncoding::Utf8Bom)]
    pub encoding: CsvEncoding,

    #[arg(long, default_value = ".cache/cne")]
    pub cache_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub csv: PathBuf,

    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct RepairArgs {
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, value_enum, default_value_t = CsvEncoding::Utf8Bom)]
    pub encoding: CsvEncoding,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/cne")]
    pub cache_root: PathBuf,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}
