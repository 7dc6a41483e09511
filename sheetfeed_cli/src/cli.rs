use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetfeed")]
#[command(about = "Sheetfeed - OneDrive/SharePoint Excel worksheets as data streams")]
#[command(version)]
#[command(after_help = "\x1b[1;36mExamples:\x1b[0m
  sheetfeed spec                                        Print the config specification
  sheetfeed check --config config.json                  Validate config and connectivity
  sheetfeed discover --config config.json               List worksheets as streams
  sheetfeed read --config config.json --catalog cat.json  Stream worksheet rows

All output is line-delimited JSON on stdout; logs go to stderr.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the connector configuration specification as a SPEC message
    Spec,

    /// Validate the config and connectivity to the workbook
    Check {
        /// Path to the JSON config file
        #[arg(long)]
        config: PathBuf,
    },

    /// Enumerate visible worksheets as a CATALOG message
    Discover {
        /// Path to the JSON config file
        #[arg(long)]
        config: PathBuf,
    },

    /// Stream worksheet rows as RECORD messages
    Read {
        /// Path to the JSON config file
        #[arg(long)]
        config: PathBuf,

        /// Path to the configured catalog JSON file
        #[arg(long)]
        catalog: PathBuf,
    },
}
