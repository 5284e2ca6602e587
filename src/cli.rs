use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cslens",
    version,
    about = "C# codebase indexer and declaration patcher",
    after_help = r#"Examples:
  cslens index --root ./src
  cslens index --root . --query "why does OrderService.Checkout fail?"
  cslens index --root . --format json
  cslens apply --changes changes.json --base-dir .
"#
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Index every project below a directory and print the report.
    Index {
        #[arg(long, default_value = ".")]
        root: PathBuf,
        /// Free text; types and methods named in it are printed in full.
        #[arg(long, default_value = "")]
        query: String,
        /// Read the query text from a file instead.
        #[arg(long, value_name = "PATH", conflicts_with = "query")]
        query_file: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Include files ignored by .gitignore.
        #[arg(long)]
        no_ignore: bool,
    },
    /// Apply a JSON array of edit requests and print one outcome per request.
    Apply {
        /// JSON file with the requests, `-` for stdin.
        #[arg(long, value_name = "PATH")]
        changes: PathBuf,
        /// Directory relative file names resolve against.
        #[arg(long, default_value = ".")]
        base_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}
