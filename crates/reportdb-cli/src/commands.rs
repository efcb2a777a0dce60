use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::CommandFactory;
use serde::Serialize;
use tracing::info;

use reportdb_core::{StagedWriter, TestRun, normalize, persist, schema};

use crate::cli::Cli;

pub(crate) fn run(cli: &Cli) -> Result<()> {
    let report = TestRun::from_file(&cli.file)
        .with_context(|| format!("failed to read report {}", cli.file.display()))?;
    let mapping = normalize::run(&report);
    print_json(&mapping)?;

    let mut writer = StagedWriter::new(&cli.db);
    schema::initialize(&mut writer).context("failed to initialize database schema")?;
    let run_id = persist::store_run(&mut writer, &mapping).context("failed to store run")?;
    info!(run_id, db = %cli.db.display(), "report imported");
    Ok(())
}

pub(crate) fn exit_with_help(message: Option<&str>) -> ExitCode {
    if let Some(message) = message {
        eprintln!("Error: {message}\n");
    }
    let help = Cli::command().render_help();
    eprintln!("{help}");
    ExitCode::FAILURE
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
