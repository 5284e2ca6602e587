use anyhow::{Context, Result};
use clap::Parser;
use cslens::cli::{self, OutputFormat};
use cslens::indexer::{IndexOptions, Indexer};
use cslens::model::EditRequest;
use cslens::patch::ChangeApplier;
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("cslens=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_changes(path: &Path) -> Result<Vec<EditRequest>> {
    let raw = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        cslens::util::read_to_string(path)?
    };
    serde_json::from_str(&raw).with_context(|| format!("parse edit requests from {}", path.display()))
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let args = cli::Args::parse();

    match args.command {
        cli::Command::Index {
            root,
            query,
            query_file,
            format,
            no_ignore,
        } => {
            let query = match query_file {
                Some(path) => cslens::util::read_to_string(&path)?,
                None => query,
            };
            let index = Indexer::new(root, IndexOptions::new(query, no_ignore)).run()?;
            match format {
                OutputFormat::Text => print!("{index}"),
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&index.to_report())?)
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        cli::Command::Apply { changes, base_dir } => {
            let requests = read_changes(&changes)?;
            let mut applier = ChangeApplier::new(base_dir)?;
            let outcomes = applier.apply_changes(&requests)?;
            println!("{}", serde_json::to_string_pretty(&outcomes)?);
            if outcomes.iter().all(|outcome| outcome.is_applied()) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
