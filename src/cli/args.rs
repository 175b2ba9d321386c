//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    cal::CalCommands, cons::ConsCommands, est::EstCommands, init::InitArgs, inst::InstCommands,
    nc::NcCommands, qc::QcCommands, txn::TxnCommands,
};

#[derive(Parser)]
#[command(name = "ldt")]
#[command(author, version, about = "Lab Data Toolkit")]
#[command(long_about = "A Unix-style toolkit for managing laboratory records as plain text files under git version control.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .ldt/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new LDT project
    Init(InitArgs),

    /// Instrument management (lab equipment registry)
    #[command(subcommand)]
    Inst(InstCommands),

    /// Consumable management (stock items with derived availability)
    #[command(subcommand)]
    Cons(ConsCommands),

    /// Calibration management (instrument due-date tracking)
    #[command(subcommand)]
    Cal(CalCommands),

    /// QC check management (acceptance ranges and trend logs)
    #[command(subcommand)]
    Qc(QcCommands),

    /// Estimation management (RFQ costing with derived totals)
    #[command(subcommand)]
    Est(EstCommands),

    /// Stock movement journal (usage, additions, wastage)
    #[command(subcommand)]
    Txn(TxnCommands),

    /// Nonconformance / CAPA management
    #[command(subcommand)]
    Nc(NcCommands),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Just IDs, one per line
    Id,
}
